use crate::codec::Tag;
use core::{fmt, panic::Location};
use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum ErrorKind {
    #[error("expected {expected:?} item, got tag {found:#04x}")]
    Protocol { expected: Tag, found: u8 },
    #[error("unknown item tag {0:#04x}")]
    UnknownTag(u8),
    /// The peer raised its error flag. Only this kind is recoverable.
    #[error("remote call failed")]
    Remote,
    #[error("reply of {sent} bytes overruns a {room} byte buffer")]
    Overrun { room: usize, sent: usize },
    #[error("read from kernel image failed")]
    ReadFailed,
    #[error("seek in kernel image failed")]
    SeekFailed,
    #[error("no bootable filesystem found")]
    NoBootDevice,
    #[error("invalid kernel image: {0}")]
    BadImage(&'static str),
    #[error("kernel image truncated")]
    Truncated,
    #[error("kernel returned to the loader")]
    KernelReturned,
}

/// An [`ErrorKind`] stamped with the source line that raised it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Error {
    pub kind: ErrorKind,
    pub line: u32,
}

impl Error {
    #[track_caller]
    pub fn new(kind: ErrorKind) -> Self {
        return Error { kind, line: Location::caller().line() };
    }

    pub fn is_remote(&self) -> bool { self.kind == ErrorKind::Remote }
}

impl From<ErrorKind> for Error {
    #[track_caller]
    fn from(kind: ErrorKind) -> Self { Error::new(kind) }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {} - {}", self.line, self.kind)
    }
}

impl core::error::Error for Error {}

#[track_caller]
pub fn bail<T>(kind: ErrorKind) -> Result<T> {
    return Err(Error::new(kind));
}
