use crate::{
    channel::Channel,
    codec::Handle,
    error::{bail, ErrorKind, Result},
    fs,
    rpc::{Client, ComponentId, COMPONENT_ID_LEN}
};
use log::{debug, info};

/// Reads the boot filesystem identifier provisioning left at `addr`.
///
/// # Safety
/// `addr` must point to [`COMPONENT_ID_LEN`] readable bytes.
pub unsafe fn read_boot_id(addr: usize) -> ComponentId {
    let mut raw = [0u8; COMPONENT_ID_LEN];
    for (i, b) in raw.iter_mut().enumerate() {
        *b = unsafe { core::ptr::read_volatile((addr + i) as *const u8) };
    }
    return ComponentId::new(&raw);
}

fn probe<C: Channel>(client: &mut Client<C>, id: &ComponentId, path: &str) -> Result<Option<Handle>> {
    match fs::open(client, id.as_bytes(), path) {
        Ok(handle) => Ok(Some(handle)),
        Err(e) if e.is_remote() => {
            debug!("{id:?}: no {path}");
            Ok(None)
        }
        Err(e) => Err(e)
    }
}

/// Finds a filesystem holding `path`, trying `boot_id` first and then every
/// listed component of `category` in the order the peer reported them.
pub fn find_kernel<C: Channel>(
    client: &mut Client<C>, boot_id: &ComponentId, category: &str, path: &str
) -> Result<(ComponentId, Handle)> {
    if let Some(handle) = probe(client, boot_id, path)? {
        info!("booting from provisioned {boot_id:?}");
        return Ok((*boot_id, handle));
    }

    for candidate in client.list(category)? {
        if let Some(handle) = probe(client, &candidate, path)? {
            info!("booting from {candidate:?}");
            return Ok((candidate, handle));
        }
    }
    return bail(ErrorKind::NoBootDevice);
}
