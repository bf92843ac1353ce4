//! The boot sequence, from finding the kernel to jumping into it.
//!
//! Stages run strictly in order and never repeat; the first error ends the
//! attempt and travels back to the caller, whose only move left is the
//! fatal halt.

use crate::{
    channel::Channel,
    config::Config,
    discovery, fs,
    error::{Error, ErrorKind, Result},
    loader::{self, PhysicalMemory},
    rpc::{Client, ComponentId}
};
use log::info;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Discover,
    ValidateHeader,
    LoadSegments,
    Cleanup,
    Jump
}

fn enter(stage: Stage) { info!("stage {stage:?}"); }

/// A kernel sitting in memory, ready to be entered.
#[derive(Clone, Copy, Debug)]
pub struct Loaded {
    pub source: ComponentId,
    pub entry: u32
}

/// Runs every stage up to, but not including, the jump.
pub fn load_kernel<C: Channel, M: PhysicalMemory>(
    client: &mut Client<C>, boot_id: &ComponentId, config: &Config, mem: &mut M
) -> Result<Loaded> {
    enter(Stage::Discover);
    let (source, handle) = discovery::find_kernel(client, boot_id, config.filesystem_category, config.kernel_path)?;
    let target = source.as_bytes();

    enter(Stage::ValidateHeader);
    let image = loader::read_header(client, target, handle, config.machine)?;

    enter(Stage::LoadSegments);
    loader::load_segments(client, target, handle, &image, mem)?;

    enter(Stage::Cleanup);
    fs::close(client, target, handle)?;

    return Ok(Loaded { source, entry: image.entry });
}

/// Enters the kernel. Coming back is itself a failure.
///
/// # Safety
/// `entry` must be the entry point of a kernel already placed in memory.
pub unsafe fn jump(entry: u32) -> Error {
    enter(Stage::Jump);
    let kernel: extern "C" fn() = unsafe { core::mem::transmute(entry as usize) };
    kernel();
    return Error::new(ErrorKind::KernelReturned);
}

/// Boots the kernel. Only returns with the error that stopped it.
///
/// # Safety
/// As for [`jump`] and [`loader::RawMemory::new`]: whatever the image says
/// gets written and executed.
pub unsafe fn boot<C: Channel, M: PhysicalMemory>(
    client: &mut Client<C>, boot_id: &ComponentId, config: &Config, mem: &mut M
) -> Error {
    return match load_kernel(client, boot_id, config, mem) {
        Ok(loaded) => unsafe { jump(loaded.entry) },
        Err(e) => e
    };
}
