//! Stand-ins for the service processor and physical memory.

use crate::{
    channel::Channel,
    codec::{Handle, WireWrite},
    loader::PhysicalMemory,
    rpc::{OP_DESTROY_VALUE, OP_INVOKE}
};
use std::collections::{BTreeMap, VecDeque};

/// Scripted service processor. Every `ready()` files the queued request and
/// makes the next canned reply readable.
#[derive(Default)]
pub struct Peer {
    outbound: Vec<u8>,
    inbound: VecDeque<u8>,
    replies: VecDeque<Vec<u8>>,
    consumed: usize,
    pub requests: Vec<Vec<u8>>,
    pub readies: usize
}

impl Peer {
    pub fn new() -> Self { Self::default() }

    pub fn reply(&mut self, frame: Frame) -> &mut Self {
        self.replies.push_back(frame.0);
        return self;
    }

    /// Makes bytes readable right away, without a request.
    pub fn load(&mut self, bytes: &[u8]) { self.inbound.extend(bytes); }

    /// Bytes sent since the last `ready()`.
    pub fn pending(&self) -> &[u8] { &self.outbound }
    pub fn remaining(&self) -> usize { self.inbound.len() }
    pub fn consumed(&self) -> usize { self.consumed }
    pub fn unanswered(&self) -> usize { self.replies.len() }
}

impl Channel for Peer {
    fn send(&mut self, byte: u8) { self.outbound.push(byte); }

    fn recv(&mut self) -> u8 {
        self.consumed += 1;
        return self.inbound.pop_front().expect("read past the end of the reply");
    }

    fn ready(&mut self) {
        self.readies += 1;
        assert!(self.inbound.is_empty(), "request issued before the last reply was drained");
        self.requests.push(std::mem::take(&mut self.outbound));
        if let Some(reply) = self.replies.pop_front() { self.inbound.extend(reply); }
    }
}

/// Encode-only channel for building expected frames and replies.
#[derive(Default)]
pub struct Frame(pub Vec<u8>);

impl Frame {
    pub fn new() -> Self { Self::default() }
}

impl Channel for Frame {
    fn send(&mut self, byte: u8) { self.0.push(byte); }
    fn recv(&mut self) -> u8 { panic!("frames are write-only") }
    fn ready(&mut self) {}
}

pub fn invoke_ok(payload: impl FnOnce(&mut Frame)) -> Frame {
    let mut f = Frame::new();
    f.put_int8(OP_INVOKE);
    f.put_int8(0);
    payload(&mut f);
    f.put_end();
    return f;
}

pub fn invoke_err(message: &str) -> Frame {
    let mut f = Frame::new();
    f.put_int8(OP_INVOKE);
    f.put_int8(1);
    f.put_bytes(message.as_bytes());
    f.put_end();
    return f;
}

pub fn opened(handle: u32) -> Frame { invoke_ok(|f| f.put_value(Handle(handle))) }
pub fn closed() -> Frame { invoke_ok(|_| {}) }
pub fn sought(pos: u64) -> Frame { invoke_ok(|f| f.put_int64(pos)) }
pub fn read_data(data: &[u8]) -> Frame { invoke_ok(|f| f.put_bytes(data)) }
pub fn read_eof() -> Frame { invoke_ok(|f| f.put_null()) }

pub fn disposed() -> Frame {
    let mut f = Frame::new();
    f.put_int8(OP_DESTROY_VALUE);
    f.put_int8(0);
    f.put_end();
    return f;
}

pub fn listed(ids: &[&str]) -> Frame {
    let mut f = Frame::new();
    for id in ids {
        f.put_bytes(b"filesystem");
        f.put_bytes(id.as_bytes());
    }
    f.put_end();
    return f;
}

/// Expected request frame for an invoke call.
pub fn invoke_request(target: &str, method: &str, args: impl FnOnce(&mut Frame)) -> Vec<u8> {
    let mut f = Frame::new();
    f.put_int8(OP_INVOKE);
    f.put_bytes(target.as_bytes());
    f.put_bytes(method.as_bytes());
    args(&mut f);
    f.put_end();
    return f.0;
}

/// Sparse memory recording every write it receives.
#[derive(Default)]
pub struct RecordingMemory {
    pub bytes: BTreeMap<u32, u8>,
    pub writes: Vec<(u32, usize)>,
    pub zeroed: Vec<(u32, usize)>
}

impl RecordingMemory {
    pub fn new() -> Self { Self::default() }

    pub fn slice(&self, addr: u32, len: usize) -> Vec<u8> {
        return (0..len as u32).map(|i| self.bytes.get(&(addr + i)).copied().unwrap_or(0xEE)).collect();
    }
}

impl PhysicalMemory for RecordingMemory {
    fn write(&mut self, addr: u32, data: &[u8]) {
        self.writes.push((addr, data.len()));
        for (i, b) in data.iter().enumerate() { self.bytes.insert(addr + i as u32, *b); }
    }

    fn zero(&mut self, addr: u32, len: usize) {
        self.zeroed.push((addr, len));
        for i in 0..len as u32 { self.bytes.insert(addr + i, 0); }
    }
}

/// 32-bit little-endian RISC-V executable header.
pub fn elf_header(entry: u32, ph_offset: u32, ph_count: u16) -> Vec<u8> {
    let mut h = vec![0x7f, b'E', b'L', b'F', 1, 1, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0];
    h.extend(2u16.to_le_bytes());
    h.extend(crate::config::EM_RISCV.to_le_bytes());
    h.extend(1u32.to_le_bytes());
    h.extend(entry.to_le_bytes());
    h.extend(ph_offset.to_le_bytes());
    h.extend(0u32.to_le_bytes());
    h.extend(0u32.to_le_bytes());
    h.extend(52u16.to_le_bytes());
    h.extend(32u16.to_le_bytes());
    h.extend(ph_count.to_le_bytes());
    h.extend([0u8; 6]);
    assert_eq!(h.len(), crate::loader::HEADER_LEN);
    return h;
}

pub const PT_LOAD: u32 = 1;

pub fn program_header(kind: u32, offset: u32, vaddr: u32, file_size: u32, mem_size: u32) -> Vec<u8> {
    let mut p = Vec::new();
    for word in [kind, offset, vaddr, vaddr, file_size, mem_size, 0b101, 0x1000] {
        p.extend(word.to_le_bytes());
    }
    return p;
}
