use crate::arch;
use core::fmt;
use tock_registers::{
    interfaces::{Readable, Writeable},
    register_structs, registers::ReadWrite
};

/// Byte pipe to the service processor.
///
/// Requests are queued with [`send`](Channel::send) and handed over by
/// [`ready`](Channel::ready), which does not return until the peer has put
/// its whole reply in place; the reply is then drained with
/// [`recv`](Channel::recv). Only one call may be in flight, and its reply
/// must be drained completely before the next request is queued.
pub trait Channel {
    fn send(&mut self, byte: u8);
    fn recv(&mut self) -> u8;
    fn ready(&mut self);
}

impl<C: Channel + ?Sized> Channel for &mut C {
    fn send(&mut self, byte: u8) { (**self).send(byte) }
    fn recv(&mut self) -> u8 { (**self).recv() }
    fn ready(&mut self) { (**self).ready() }
}

register_structs! {
    ChannelRegisters {
        (0x0 => data: ReadWrite<u8>),
        (0x1 => _reserved0),
        (0x2 => ready: ReadWrite<u8>),
        (0x3 => @END),
    }
}

pub struct MmioChannel {
    regs: &'static ChannelRegisters
}

impl MmioChannel {
    /// # Safety
    /// `base` must be the address of a channel register block that stays
    /// mapped for the life of the program, and nothing else may drive it.
    pub unsafe fn new(base: usize) -> Self {
        return MmioChannel { regs: unsafe { &*(base as *const ChannelRegisters) } };
    }
}

impl Channel for MmioChannel {
    fn send(&mut self, byte: u8) { self.regs.data.set(byte); }
    fn recv(&mut self) -> u8 { self.regs.data.get() }

    fn ready(&mut self) {
        self.regs.ready.set(1);
        arch::trap();
    }
}

/// `core::fmt` sink over a channel, for text-only channels.
pub struct ChannelWriter<'a, C: Channel>(pub &'a mut C);

impl<C: Channel> fmt::Write for ChannelWriter<'_, C> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for byte in s.bytes() { self.0.send(byte); }
        Ok(())
    }
}
