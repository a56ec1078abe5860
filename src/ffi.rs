use std::ffi::CStr;
use std::os::raw::{c_char, c_int, c_void};
use std::ptr;
use std::time::Duration;

use crate::SPSC::Buffer::{RingBuffer, Role};

// Error codes
pub const SHMEM_LIST_SUCCESS: c_int = 0;
pub const SHMEM_LIST_ERROR_NULL_POINTER: c_int = -1;
pub const SHMEM_LIST_ERROR_INVALID_ARG: c_int = -2;
pub const SHMEM_LIST_ERROR_COMMIT_FAILED: c_int = -3;
pub const SHMEM_LIST_ERROR_CLOSE_FAILED: c_int = -4;

// List roles
pub const SHMEM_LIST_TYPE_SOURCE: u32 = 0;
pub const SHMEM_LIST_TYPE_SINK: u32 = 1;

/// Handle to an open list (opaque pointer)
pub struct ListHandle {
    inner: RingBuffer,
}

/// Open a list of packets in shared memory.
///
/// # Arguments
/// * `name` - shared memory name where the list is allocated
/// * `list_type` - `SHMEM_LIST_TYPE_SOURCE` writes into the list,
///   `SHMEM_LIST_TYPE_SINK` reads from it
/// * `packet_size` - size of one packet in bytes
/// * `number_of_packets` - number of packets in the list
/// * `reserved` - reserved packet location, pass NULL
///
/// # Returns
/// * Pointer to an opaque `ListHandle`, or NULL on failure.
///
/// # Safety
/// `name` must be a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn shmem_list_open(
    name: *const c_char,
    list_type: u32,
    packet_size: u32,
    number_of_packets: u32,
    _reserved: *mut c_void,
) -> *mut ListHandle {
    if name.is_null() {
        return ptr::null_mut();
    }
    let name = match CStr::from_ptr(name).to_str() {
        Ok(name) => name,
        Err(_) => return ptr::null_mut(),
    };
    let role = match list_type {
        SHMEM_LIST_TYPE_SOURCE => Role::Source,
        SHMEM_LIST_TYPE_SINK => Role::Sink,
        _ => return ptr::null_mut(),
    };

    match RingBuffer::open(name, role, packet_size, number_of_packets, None) {
        Ok(list) => Box::into_raw(Box::new(ListHandle { inner: list })),
        Err(_) => ptr::null_mut(),
    }
}

/// Acquire a pointer to the next packet to write.
///
/// Blocks up to `timeout_ms` milliseconds for a free packet.
///
/// # Returns
/// * Pointer to `packet_size` writable bytes, or NULL on timeout or error.
///
/// # Safety
/// `handle` must be a pointer returned by `shmem_list_open` that has not
/// been closed.
#[no_mangle]
pub unsafe extern "C" fn shmem_list_acquire_write_packet(
    handle: *mut ListHandle,
    timeout_ms: u64,
) -> *mut u8 {
    if handle.is_null() {
        return ptr::null_mut();
    }
    let handle = &mut *handle;

    match handle.inner.acquire_write(Duration::from_millis(timeout_ms)) {
        Ok(Some(slot)) => slot.as_mut_ptr(),
        Ok(None) | Err(_) => ptr::null_mut(),
    }
}

/// Commit the write of one packet with `size` valid bytes.
///
/// # Safety
/// See `shmem_list_acquire_write_packet`.
#[no_mangle]
pub unsafe extern "C" fn shmem_list_write(handle: *mut ListHandle, size: u32) -> c_int {
    if handle.is_null() {
        return SHMEM_LIST_ERROR_NULL_POINTER;
    }
    let handle = &mut *handle;

    match handle.inner.commit_write(size as usize) {
        Ok(()) => SHMEM_LIST_SUCCESS,
        Err(_) => SHMEM_LIST_ERROR_COMMIT_FAILED,
    }
}

/// Acquire a pointer to the next packet to read.
///
/// Blocks up to `timeout_ms` milliseconds for a filled packet. On success
/// the packet's payload size is stored through `size`.
///
/// # Returns
/// * Pointer to the payload bytes, or NULL on timeout or error.
///
/// # Safety
/// `handle` must be a live handle from `shmem_list_open`; `size` must be a
/// valid pointer.
#[no_mangle]
pub unsafe extern "C" fn shmem_list_acquire_read_packet(
    handle: *mut ListHandle,
    size: *mut u32,
    timeout_ms: u64,
) -> *const u8 {
    if handle.is_null() || size.is_null() {
        return ptr::null_mut();
    }
    let handle = &mut *handle;

    match handle.inner.acquire_read(Duration::from_millis(timeout_ms)) {
        Ok(Some(packet)) => {
            *size = packet.len() as u32;
            packet.as_ptr()
        }
        Ok(None) | Err(_) => ptr::null_mut(),
    }
}

/// Commit the read of one packet. Non-blocking.
///
/// # Safety
/// See `shmem_list_acquire_read_packet`.
#[no_mangle]
pub unsafe extern "C" fn shmem_list_read(handle: *mut ListHandle) -> c_int {
    if handle.is_null() {
        return SHMEM_LIST_ERROR_NULL_POINTER;
    }
    let handle = &mut *handle;

    match handle.inner.commit_read() {
        Ok(()) => SHMEM_LIST_SUCCESS,
        Err(_) => SHMEM_LIST_ERROR_COMMIT_FAILED,
    }
}

/// Close the list and free the handle.
///
/// Both attached processes must eventually close their handles.
///
/// # Safety
/// `handle` must be a pointer returned by `shmem_list_open`; it is invalid
/// after this call.
#[no_mangle]
pub unsafe extern "C" fn shmem_list_close(handle: *mut ListHandle) -> c_int {
    if handle.is_null() {
        return SHMEM_LIST_ERROR_NULL_POINTER;
    }
    let handle = Box::from_raw(handle);

    match handle.inner.close() {
        Ok(()) => SHMEM_LIST_SUCCESS,
        Err(_) => SHMEM_LIST_ERROR_CLOSE_FAILED,
    }
}
