//! The ABI exposed to generated kernel-dispatch code (C8).
//!
//! `#[repr(C)]` where the layout must be predictable across an FFI boundary
//! to a dispatcher that is not itself Rust (the original crosses this
//! boundary with `extern "C"` structs; we use `repr(C)` plus raw function
//! pointers for the same reason).

use std::os::raw::c_void;

/// Describes one kernel invocation: which buffers it touches and how many
/// work-groups to launch.
#[repr(C)]
pub struct DispatchInfo {
    pub kernel_id: u64,
    pub read_write_tensors: *const u64,
    pub read_write_count: u32,
    pub read_only_tensors: *const u64,
    pub read_only_count: u32,
    pub uniforms: *const u32,
    pub uniform_count: u32,
    pub work_group_count: [u32; 3],
}

pub type AllocateFn = unsafe extern "C" fn(user_data: *mut c_void, size: u64) -> u64;
pub type DeallocateFn = unsafe extern "C" fn(user_data: *mut c_void, buffer: u64);
pub type ReadbackFn = unsafe extern "C" fn(user_data: *mut c_void, buffer: u64, out: *mut u8, len: u64);
pub type WritebackFn =
    unsafe extern "C" fn(user_data: *mut c_void, buffer: u64, data: *const u8, len: u64);
pub type DispatchFn = unsafe extern "C" fn(user_data: *mut c_void, info: *const DispatchInfo);

/// A bundle of function pointers the dispatcher fills in and the generated
/// code calls through; the core never calls these itself, it only produces
/// `DispatchInfo` values for the dispatcher to consume.
#[repr(C)]
pub struct RuntimeRecord {
    pub user_data: *mut c_void,
    pub allocate: AllocateFn,
    pub deallocate: DeallocateFn,
    pub readback: ReadbackFn,
    pub writeback: WritebackFn,
    pub dispatch: DispatchFn,
}
