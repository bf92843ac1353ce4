use crate::{
    channel::Channel,
    codec::{Handle, Item, Tag, WireRead, WireWrite},
    error::{bail, ErrorKind, Result}
};
use arrayvec::ArrayVec;
use core::fmt;
use log::debug;

pub const OP_INVOKE: u8 = 0x00;
pub const OP_LIST: u8 = 0x01;
pub const OP_DESTROY_VALUE: u8 = 0x02;

/// Room for a component identifier, terminator included.
pub const COMPONENT_ID_LEN: usize = 38;
/// Candidates kept from one `list` call; further entries are drained and dropped.
pub const MAX_COMPONENTS: usize = 8;

#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ComponentId {
    bytes: [u8; COMPONENT_ID_LEN],
    len: usize
}

pub type ComponentList = ArrayVec<ComponentId, MAX_COMPONENTS>;

impl ComponentId {
    /// Takes `raw` up to its first NUL, cut to fit with a terminator.
    pub fn new(raw: &[u8]) -> Self {
        let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
        let len = end.min(COMPONENT_ID_LEN - 1);
        let mut bytes = [0u8; COMPONENT_ID_LEN];
        bytes[..len].copy_from_slice(&raw[..len]);
        return ComponentId { bytes, len };
    }

    /// Decodes a `Bytes` item, cut the same way as [`ComponentId::new`].
    pub fn recv<C: Channel + ?Sized>(channel: &mut C) -> Result<Self> {
        let mut raw = [0u8; COMPONENT_ID_LEN];
        let len = channel.expect_bytes(&mut raw)?;
        return Ok(ComponentId::new(&raw[..len]));
    }

    pub fn as_bytes(&self) -> &[u8] { &self.bytes[..self.len] }
    pub fn is_empty(&self) -> bool { self.len == 0 }
}

impl fmt::Debug for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match core::str::from_utf8(self.as_bytes()) {
            Ok(s) => write!(f, "{s:?}"),
            Err(_) => write!(f, "{:02x?}", self.as_bytes())
        }
    }
}

/// Caller side of the component protocol. Strictly one call at a time:
/// every method drains its whole reply before returning.
pub struct Client<C: Channel> {
    channel: C
}

impl<C: Channel> Client<C> {
    pub fn new(channel: C) -> Self { Client { channel } }

    pub fn channel(&mut self) -> &mut C { &mut self.channel }

    /// Calls `method` on the component `target`.
    ///
    /// On success `payload` decodes the call specific reply items. A raised
    /// error flag comes back as [`ErrorKind::Remote`] with the peer's message
    /// drained; every other error means the framing is lost.
    pub fn invoke<R>(
        &mut self, target: &[u8], method: &str, args: &[Item],
        payload: impl FnOnce(&mut C) -> Result<R>
    ) -> Result<R> {
        let ch = &mut self.channel;
        ch.put_int8(OP_INVOKE);
        ch.put_bytes(target);
        ch.put_bytes(method.as_bytes());
        for arg in args { ch.put_item(arg); }
        ch.put_end();
        ch.ready();

        ch.expect_int8()?;
        if ch.expect_int8()? != 0 {
            let mut message = [0u8; 64];
            let n = ch.expect_bytes(&mut message)?;
            ch.expect_end()?;
            debug!("{method} failed: {}", core::str::from_utf8(&message[..n]).unwrap_or("<binary>"));
            return bail(ErrorKind::Remote);
        }

        let out = payload(&mut *ch)?;
        ch.expect_end()?;
        return Ok(out);
    }

    /// Enumerates components of `category`, keeping the first [`MAX_COMPONENTS`].
    pub fn list(&mut self, category: &str) -> Result<ComponentList> {
        let ch = &mut self.channel;
        ch.put_int8(OP_LIST);
        ch.put_bytes(category.as_bytes());
        ch.put_end();
        ch.ready();

        let mut found = ComponentList::new();
        loop {
            match ch.next_tag()? {
                Tag::End => break,
                Tag::Bytes => { ch.recv_bytes(&mut []); }
                other => return bail(ErrorKind::Protocol { expected: Tag::Bytes, found: other as u8 })
            }
            let id = ComponentId::recv(ch)?;
            if let Err(overflow) = found.try_push(id) {
                debug!("list {category}: dropping {:?}", overflow.element());
            }
        }
        return Ok(found);
    }

    /// Releases a remote value. The peer's status byte is not checked.
    pub fn dispose(&mut self, handle: Handle) -> Result<()> {
        let ch = &mut self.channel;
        ch.put_int8(OP_DESTROY_VALUE);
        ch.put_value(handle);
        ch.put_end();
        ch.ready();

        ch.expect_int8()?;
        ch.expect_int8()?;
        return ch.expect_end();
    }
}
