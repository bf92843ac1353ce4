use crate::{
    channel::Channel,
    codec::Handle,
    error::{bail, Error, ErrorKind, Result},
    fs::{self, Whence},
    rpc::Client
};
use core::ptr::{copy_nonoverlapping, write_bytes};
use log::{debug, info};
use xmas_elf::{
    header::{self, Class, Data},
    program::{self, ProgramHeader32}
};

pub const HEADER_LEN: usize = 52;
pub const PHDR_LEN: usize = 32;
pub const CHUNK_LEN: usize = 512;

/// Destination of loaded segments.
pub trait PhysicalMemory {
    fn write(&mut self, addr: u32, data: &[u8]);
    fn zero(&mut self, addr: u32, len: usize);
}

/// Writes straight to physical addresses.
pub struct RawMemory(());

impl RawMemory {
    /// # Safety
    /// Every segment the kernel image asks for must be writable RAM that
    /// does not overlap the loader's own code, data or stack.
    pub unsafe fn new() -> Self { RawMemory(()) }
}

impl PhysicalMemory for RawMemory {
    fn write(&mut self, addr: u32, data: &[u8]) {
        unsafe { copy_nonoverlapping(data.as_ptr(), addr as usize as *mut u8, data.len()); }
    }

    fn zero(&mut self, addr: u32, len: usize) {
        unsafe { write_bytes(addr as usize as *mut u8, 0, len); }
    }
}

/// What the loader keeps from a validated ELF header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Image {
    pub entry: u32,
    pub ph_offset: u32,
    pub ph_count: u16,
    pub ph_entry_size: u16
}

impl Image {
    /// File offset of program header `index`, `None` past 4 GiB.
    pub fn ph_at(&self, index: u32) -> Option<u32> {
        return index.checked_mul(self.ph_entry_size as u32).and_then(|off| self.ph_offset.checked_add(off));
    }
}

// xmas-elf reads header fields in place, so the buffers have to be aligned
// for them. Sized for a 64-bit header so a wrong class parses far enough
// to be reported as such.
#[repr(C, align(8))]
struct HeaderBuf([u8; 64]);

#[repr(C, align(8))]
struct PhdrBuf([u8; PHDR_LEN]);

fn read_exact<C: Channel>(client: &mut Client<C>, target: &[u8], handle: Handle, buf: &mut [u8]) -> Result<()> {
    let mut done = 0;
    while done < buf.len() {
        let n = fs::read(client, target, handle, &mut buf[done..])?;
        if n == 0 { return bail(ErrorKind::Truncated); }
        done += n;
    }
    return Ok(());
}

#[track_caller]
fn bad(reason: &'static str) -> Result<Image> { Err(Error::new(ErrorKind::BadImage(reason))) }

fn validate(buf: &HeaderBuf, machine: u16) -> Result<Image> {
    let header = match header::parse_header(&buf.0) {
        Ok(header) => header,
        Err(reason) => return bad(reason)
    };
    if !matches!(header.pt1.class(), Class::ThirtyTwo) { return bad("not a 32-bit image"); }
    if !matches!(header.pt1.data(), Data::LittleEndian) { return bad("not little-endian"); }
    if !matches!(header.pt2.type_().as_type(), header::Type::Executable) { return bad("not an executable"); }
    // e_machine, compared raw so any configured machine number works.
    if u16::from_le_bytes([buf.0[18], buf.0[19]]) != machine { return bad("built for another machine"); }
    if (header.pt2.ph_entry_size() as usize) < PHDR_LEN { return bad("program header entries too small"); }

    let image = Image {
        entry: header.pt2.entry_point() as u32,
        ph_offset: header.pt2.ph_offset() as u32,
        ph_count: header.pt2.ph_count(),
        ph_entry_size: header.pt2.ph_entry_size()
    };
    if image.ph_at(image.ph_count as u32).is_none() { return bad("program header table out of range"); }
    return Ok(image);
}

/// Reads and checks the ELF header at the start of a freshly opened file.
pub fn read_header<C: Channel>(client: &mut Client<C>, target: &[u8], handle: Handle, machine: u16) -> Result<Image> {
    let mut buf = HeaderBuf([0; 64]);
    read_exact(client, target, handle, &mut buf.0[..HEADER_LEN])?;
    let image = validate(&buf, machine)?;
    debug!("entry {:#x}, {} program headers at {:#x}", image.entry, image.ph_count, image.ph_offset);
    return Ok(image);
}

/// Seeks from the start and insists the peer actually moved there.
fn seek_to<C: Channel>(client: &mut Client<C>, target: &[u8], handle: Handle, pos: u32) -> Result<()> {
    let landed = fs::seek(client, target, handle, Whence::Set, pos)?;
    if landed != pos as u64 {
        debug!("seek to {pos:#x} landed at {landed:#x}");
        return bail(ErrorKind::SeekFailed);
    }
    return Ok(());
}

fn load_segment<C: Channel, M: PhysicalMemory>(
    client: &mut Client<C>, target: &[u8], handle: Handle, ph: &ProgramHeader32, mem: &mut M
) -> Result<()> {
    // Bounds every address written below.
    if ph.virtual_addr.checked_add(ph.file_size.max(ph.mem_size)).is_none() {
        return bail(ErrorKind::BadImage("segment outside address space"));
    }
    seek_to(client, target, handle, ph.offset)?;

    let mut chunk = [0u8; CHUNK_LEN];
    let mut done = 0u32;
    while done < ph.file_size {
        let want = (ph.file_size - done).min(CHUNK_LEN as u32) as usize;
        let n = fs::read(client, target, handle, &mut chunk[..want])?;
        if n == 0 { return bail(ErrorKind::Truncated); }
        mem.write(ph.virtual_addr + done, &chunk[..n]);
        done += n as u32;
    }
    if ph.mem_size > ph.file_size {
        mem.zero(ph.virtual_addr + ph.file_size, (ph.mem_size - ph.file_size) as usize);
    }
    return Ok(());
}

/// Copies every `PT_LOAD` segment to its virtual address. Segment flags are
/// left for the kernel to enforce.
pub fn load_segments<C: Channel, M: PhysicalMemory>(
    client: &mut Client<C>, target: &[u8], handle: Handle, image: &Image, mem: &mut M
) -> Result<()> {
    for i in 0..image.ph_count as u32 {
        let Some(at) = image.ph_at(i) else { return bail(ErrorKind::BadImage("program header table out of range")); };
        seek_to(client, target, handle, at)?;
        let mut raw = PhdrBuf([0; PHDR_LEN]);
        read_exact(client, target, handle, &mut raw.0)?;

        let ph: &ProgramHeader32 = zero::read(&raw.0);
        if ph.get_type() != Ok(program::Type::Load) {
            debug!("segment {i}: {:?}, skipped", ph.get_type());
            continue;
        }
        info!("segment {i}: {:#x} bytes at {:#010x}", ph.file_size, ph.virtual_addr);
        load_segment(client, target, handle, ph, mem)?;
    }
    return Ok(());
}
