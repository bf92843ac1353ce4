use core::sync::atomic::{compiler_fence, Ordering};

#[inline(always)]
pub fn trap() {
    compiler_fence(Ordering::SeqCst);
}

pub fn halt() {
    core::hint::spin_loop();
}
