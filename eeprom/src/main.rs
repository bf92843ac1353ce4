//!                          EEPROM Boot Firmware                          !//
//!
//! Crafted by HaמuL in 2025
//! Description: Firmware entry of the EEPROM loader of Research UNIX Version 11
//! Licence: Public Domain

#![cfg_attr(target_os = "none", no_std)]
#![cfg_attr(target_os = "none", no_main)]

#[cfg(target_os = "none")]
mod firmware {
    use core::panic::PanicInfo;
    use eeprom::{
        arch, boot, channel::MmioChannel, discovery, fatal,
        loader::RawMemory, rpc::Client, Config
    };

    /// Called by the reset trampoline with a stack and nothing else.
    #[unsafe(no_mangle)]
    pub extern "C" fn ignite() -> ! {
        let config = Config::DEFAULT;
        let mut client = Client::new(unsafe { MmioChannel::new(config.component_channel) });
        let mut sink = unsafe { MmioChannel::new(config.diagnostic_channel) };

        let boot_id = unsafe { discovery::read_boot_id(config.boot_id_region) };
        let err = unsafe { boot::boot(&mut client, &boot_id, &config, &mut RawMemory::new()) };
        fatal::halt(&mut sink, &err);
    }

    #[panic_handler]
    fn panic(info: &PanicInfo) -> ! {
        let mut sink = unsafe { MmioChannel::new(Config::DEFAULT.diagnostic_channel) };
        let line = info.location().map_or(0, |l| l.line());
        loop {
            fatal::announce(&mut sink, line, info.message());
            arch::halt();
        }
    }
}

#[cfg(not(target_os = "none"))]
fn main() {
    let config = eeprom::Config::DEFAULT;
    println!("unix-v11-eeprom runs on bare metal; build it for a riscv32 none target.");
    println!(
        "component channel {:#x}, diagnostics {:#x}, boot id at {:#x}, kernel {}",
        config.component_channel, config.diagnostic_channel, config.boot_id_region, config.kernel_path
    );
}
