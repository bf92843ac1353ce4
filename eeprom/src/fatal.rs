use crate::{
    arch,
    channel::{Channel, ChannelWriter},
    error::Error
};
use core::fmt::{Display, Write};

/// Writes one `EEPROM PANIC line <N> - <message>` announcement to `sink`.
pub fn announce<C: Channel>(sink: &mut C, line: u32, message: impl Display) {
    let _ = write!(ChannelWriter(&mut *sink), "EEPROM PANIC line {line} - {message}");
    sink.ready();
}

pub fn report<C: Channel>(sink: &mut C, err: &Error) {
    announce(sink, err.line, err.kind);
}

/// Terminal state: keeps re-announcing `err` for whoever attaches late.
pub fn halt<C: Channel>(sink: &mut C, err: &Error) -> ! {
    loop {
        report(sink, err);
        arch::halt();
    }
}
