//!                          EEPROM Boot Firmware                          !//
//!
//! Crafted by HaמuL in 2025
//! Description: First stage loader that fetches the kernel from a filesystem component
//! Licence: Public Domain

#![cfg_attr(not(test), no_std)]

macro_rules! arch {
    ($arch:literal, $modname:ident) => {
        #[cfg(target_arch = $arch)] pub mod $modname;
        #[cfg(target_arch = $arch)] pub use $modname as arch;
    };
}

arch!("riscv32", riscv32);
#[cfg(not(target_arch = "riscv32"))] pub mod host;
#[cfg(not(target_arch = "riscv32"))] pub use host as arch;

pub mod boot;
pub mod channel;
pub mod codec;
pub mod config;
pub mod discovery;
pub mod error;
pub mod fatal;
pub mod fs;
pub mod loader;
pub mod rpc;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use error::{Error, ErrorKind, Result};
