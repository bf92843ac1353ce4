use riscv::{asm::{ebreak, wfi}, register::mstatus};

/// Hands a queued frame to the service processor; resumes once the reply is in place.
#[inline(always)]
#[allow(unused_unsafe)]
pub fn trap() {
    unsafe { ebreak(); }
}

#[allow(unused_unsafe)]
pub fn halt() {
    unsafe { mstatus::clear_mie(); }
    wfi();
}
