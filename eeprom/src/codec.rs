//! Tagged binary items, the wire format spoken with components.
//!
//! Every item is a one byte [`Tag`] followed by its payload. Integers are
//! fixed width little endian, byte strings carry a `u32` length prefix and
//! no terminator. Readers state the tag they expect; anything else means the
//! stream is misframed and nothing after it can be trusted.

use crate::{channel::Channel, error::{bail, ErrorKind, Result}};

#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tag {
    Null = 0x00,
    Int8 = 0x01,
    Int16 = 0x02,
    Int32 = 0x03,
    Int64 = 0x04,
    Int128 = 0x05,
    Bytes = 0x06,
    Object = 0x07,
    Value = 0x08,
    End = 0xFF
}

impl Tag {
    pub fn from_byte(byte: u8) -> Option<Tag> {
        return Some(match byte {
            0x00 => Tag::Null,
            0x01 => Tag::Int8,
            0x02 => Tag::Int16,
            0x03 => Tag::Int32,
            0x04 => Tag::Int64,
            0x05 => Tag::Int128,
            0x06 => Tag::Bytes,
            0x07 => Tag::Object,
            0x08 => Tag::Value,
            0xFF => Tag::End,
            _ => return None
        });
    }
}

/// Reference to a resource living in a component, e.g. an open file.
/// Must be given back with a dispose call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Handle(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Item<'a> {
    Null,
    Int8(u8),
    Int16(u16),
    Int32(u32),
    Int64(u64),
    Int128(u128),
    Bytes(&'a [u8]),
    Object,
    Value(Handle),
    End
}

impl Item<'_> {
    pub fn tag(&self) -> Tag {
        match self {
            Item::Null => Tag::Null,
            Item::Int8(_) => Tag::Int8,
            Item::Int16(_) => Tag::Int16,
            Item::Int32(_) => Tag::Int32,
            Item::Int64(_) => Tag::Int64,
            Item::Int128(_) => Tag::Int128,
            Item::Bytes(_) => Tag::Bytes,
            Item::Object => Tag::Object,
            Item::Value(_) => Tag::Value,
            Item::End => Tag::End
        }
    }
}

pub trait WireWrite: Channel {
    fn send_all(&mut self, bytes: &[u8]) {
        for &b in bytes { self.send(b); }
    }

    fn put_tag(&mut self, tag: Tag) { self.send(tag as u8); }
    fn put_null(&mut self) { self.put_tag(Tag::Null); }
    fn put_end(&mut self) { self.put_tag(Tag::End); }

    fn put_int8(&mut self, v: u8) {
        self.put_tag(Tag::Int8);
        self.send(v);
    }
    fn put_int16(&mut self, v: u16) {
        self.put_tag(Tag::Int16);
        self.send_all(&v.to_le_bytes());
    }
    fn put_int32(&mut self, v: u32) {
        self.put_tag(Tag::Int32);
        self.send_all(&v.to_le_bytes());
    }
    fn put_int64(&mut self, v: u64) {
        self.put_tag(Tag::Int64);
        self.send_all(&v.to_le_bytes());
    }
    fn put_int128(&mut self, v: u128) {
        self.put_tag(Tag::Int128);
        self.send_all(&v.to_le_bytes());
    }
    fn put_bytes(&mut self, data: &[u8]) {
        self.put_tag(Tag::Bytes);
        self.send_all(&(data.len() as u32).to_le_bytes());
        self.send_all(data);
    }
    fn put_value(&mut self, handle: Handle) {
        self.put_tag(Tag::Value);
        self.send_all(&handle.0.to_le_bytes());
    }

    fn put_item(&mut self, item: &Item) {
        match *item {
            Item::Null => self.put_null(),
            Item::Int8(v) => self.put_int8(v),
            Item::Int16(v) => self.put_int16(v),
            Item::Int32(v) => self.put_int32(v),
            Item::Int64(v) => self.put_int64(v),
            Item::Int128(v) => self.put_int128(v),
            Item::Bytes(data) => self.put_bytes(data),
            Item::Object => self.put_tag(Tag::Object),
            Item::Value(handle) => self.put_value(handle),
            Item::End => self.put_end()
        }
    }
}

impl<C: Channel + ?Sized> WireWrite for C {}

pub trait WireRead: Channel {
    fn recv_array<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        for b in out.iter_mut() { *b = self.recv(); }
        return out;
    }

    fn next_tag(&mut self) -> Result<Tag> {
        let byte = self.recv();
        match Tag::from_byte(byte) {
            Some(tag) => Ok(tag),
            None => bail(ErrorKind::UnknownTag(byte))
        }
    }

    fn expect(&mut self, expected: Tag) -> Result<()> {
        let found = self.recv();
        if found != expected as u8 { return bail(ErrorKind::Protocol { expected, found }); }
        return Ok(());
    }

    /// Length-prefixed payload of a `Bytes` item whose tag is already consumed.
    ///
    /// Always drains the full declared length. When it does not fit, `buf`
    /// receives `buf.len() - 1` bytes and a NUL in its last slot; a short
    /// payload is NUL terminated when room is left. An empty `buf` only
    /// discards. Returns how many payload bytes were stored.
    fn recv_bytes(&mut self, buf: &mut [u8]) -> usize {
        let len = u32::from_le_bytes(self.recv_array()) as usize;
        let cap = buf.len();
        let keep = if len > cap { cap.saturating_sub(1) } else { len };
        for slot in &mut buf[..keep] { *slot = self.recv(); }
        for _ in keep..len { self.recv(); }
        if keep < cap { buf[keep] = 0; }
        return keep;
    }

    /// Length-prefixed payload that must fit `buf` whole. An overlong one is
    /// drained and refused rather than cut.
    fn recv_bytes_within(&mut self, buf: &mut [u8]) -> Result<usize> {
        let len = u32::from_le_bytes(self.recv_array()) as usize;
        if len > buf.len() {
            for _ in 0..len { self.recv(); }
            return bail(ErrorKind::Overrun { room: buf.len(), sent: len });
        }
        for slot in &mut buf[..len] { *slot = self.recv(); }
        return Ok(len);
    }

    fn expect_int8(&mut self) -> Result<u8> {
        self.expect(Tag::Int8)?;
        return Ok(self.recv());
    }
    fn expect_int32(&mut self) -> Result<u32> {
        self.expect(Tag::Int32)?;
        return Ok(u32::from_le_bytes(self.recv_array()));
    }
    fn expect_int64(&mut self) -> Result<u64> {
        self.expect(Tag::Int64)?;
        return Ok(u64::from_le_bytes(self.recv_array()));
    }
    fn expect_bytes(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.expect(Tag::Bytes)?;
        return Ok(self.recv_bytes(buf));
    }
    fn expect_value(&mut self) -> Result<Handle> {
        self.expect(Tag::Value)?;
        return Ok(Handle(u32::from_le_bytes(self.recv_array())));
    }
    fn expect_end(&mut self) -> Result<()> { self.expect(Tag::End) }

    /// Decodes whatever item comes next; `Bytes` land in `scratch`.
    fn read_item<'s>(&mut self, scratch: &'s mut [u8]) -> Result<Item<'s>> {
        return Ok(match self.next_tag()? {
            Tag::Null => Item::Null,
            Tag::Int8 => Item::Int8(self.recv()),
            Tag::Int16 => Item::Int16(u16::from_le_bytes(self.recv_array())),
            Tag::Int32 => Item::Int32(u32::from_le_bytes(self.recv_array())),
            Tag::Int64 => Item::Int64(u64::from_le_bytes(self.recv_array())),
            Tag::Int128 => Item::Int128(u128::from_le_bytes(self.recv_array())),
            Tag::Bytes => {
                let n = self.recv_bytes(scratch);
                Item::Bytes(&scratch[..n])
            }
            Tag::Object => Item::Object,
            Tag::Value => Item::Value(Handle(u32::from_le_bytes(self.recv_array()))),
            Tag::End => Item::End
        });
    }
}

impl<C: Channel + ?Sized> WireRead for C {}
