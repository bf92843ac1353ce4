//! The four filesystem component calls the loader needs.

use crate::{
    channel::Channel,
    codec::{Handle, Item, Tag, WireRead},
    error::{bail, Error, ErrorKind, Result},
    rpc::Client
};
use log::warn;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Whence {
    Set,
    Cur,
    End
}

impl Whence {
    pub fn as_str(self) -> &'static str {
        match self {
            Whence::Set => "set",
            Whence::Cur => "cur",
            Whence::End => "end"
        }
    }
}

/// A refusal here is [`ErrorKind::Remote`], so callers can go on probing.
pub fn open<C: Channel>(client: &mut Client<C>, target: &[u8], path: &str) -> Result<Handle> {
    return client.invoke(target, "open", &[Item::Bytes(path.as_bytes())], |ch| ch.expect_value());
}

/// Closes the file, then disposes of its handle even if the close was refused.
pub fn close<C: Channel>(client: &mut Client<C>, target: &[u8], handle: Handle) -> Result<()> {
    match client.invoke(target, "close", &[Item::Value(handle)], |_| Ok(())) {
        Err(e) if e.is_remote() => warn!("close of {handle:?} refused"),
        Err(e) => return Err(e),
        Ok(()) => {}
    }
    return client.dispose(handle);
}

/// Reads up to `buf.len()` bytes; 0 means end of file. A reply longer than
/// asked for is [`ErrorKind::Overrun`].
pub fn read<C: Channel>(client: &mut Client<C>, target: &[u8], handle: Handle, buf: &mut [u8]) -> Result<usize> {
    let args = [Item::Value(handle), Item::Int32(buf.len() as u32)];
    return client.invoke(target, "read", &args, |ch| {
        match ch.next_tag()? {
            Tag::Null => Ok(0),
            Tag::Bytes => ch.recv_bytes_within(buf),
            other => bail(ErrorKind::Protocol { expected: Tag::Bytes, found: other as u8 })
        }
    }).map_err(|e| if e.is_remote() { Error::new(ErrorKind::ReadFailed) } else { e });
}

/// Moves the file cursor and returns the new absolute position.
pub fn seek<C: Channel>(client: &mut Client<C>, target: &[u8], handle: Handle, whence: Whence, pos: u32) -> Result<u64> {
    let args = [Item::Value(handle), Item::Bytes(whence.as_str().as_bytes()), Item::Int32(pos)];
    return client.invoke(target, "seek", &args, |ch| ch.expect_int64())
        .map_err(|e| if e.is_remote() { Error::new(ErrorKind::SeekFailed) } else { e });
}
