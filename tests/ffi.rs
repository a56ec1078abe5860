// C ABI round trip through the opaque list handle.

#![cfg(target_os = "linux")]

use serial_test::serial;
use shmem_list::ffi::{
    shmem_list_acquire_read_packet, shmem_list_acquire_write_packet, shmem_list_close,
    shmem_list_open, shmem_list_read, shmem_list_write, SHMEM_LIST_ERROR_NULL_POINTER,
    SHMEM_LIST_SUCCESS, SHMEM_LIST_TYPE_SINK, SHMEM_LIST_TYPE_SOURCE,
};
use std::ffi::CString;
use std::ptr;

#[test]
#[serial]
fn c_abi_round_trip() {
    let name = CString::new(format!("shmem_list_{}_ffi", std::process::id())).unwrap();

    let source = unsafe {
        shmem_list_open(
            name.as_ptr(),
            SHMEM_LIST_TYPE_SOURCE,
            128,
            4,
            ptr::null_mut(),
        )
    };
    assert!(!source.is_null());

    let sink = unsafe {
        shmem_list_open(
            name.as_ptr(),
            SHMEM_LIST_TYPE_SINK,
            128,
            4,
            ptr::null_mut(),
        )
    };
    assert!(!sink.is_null());

    let payload = b"ffi packet";
    unsafe {
        let slot = shmem_list_acquire_write_packet(source, 200);
        assert!(!slot.is_null());
        ptr::copy_nonoverlapping(payload.as_ptr(), slot, payload.len());
        assert_eq!(
            shmem_list_write(source, payload.len() as u32),
            SHMEM_LIST_SUCCESS
        );

        let mut size = 0u32;
        let packet = shmem_list_acquire_read_packet(sink, &mut size, 200);
        assert!(!packet.is_null());
        assert_eq!(size as usize, payload.len());
        assert_eq!(std::slice::from_raw_parts(packet, size as usize), payload);
        assert_eq!(shmem_list_read(sink), SHMEM_LIST_SUCCESS);

        assert_eq!(shmem_list_close(sink), SHMEM_LIST_SUCCESS);
        assert_eq!(shmem_list_close(source), SHMEM_LIST_SUCCESS);
    }
}

#[test]
fn null_arguments_rejected() {
    unsafe {
        assert!(shmem_list_open(
            ptr::null(),
            SHMEM_LIST_TYPE_SOURCE,
            16,
            2,
            ptr::null_mut()
        )
        .is_null());
        assert!(shmem_list_acquire_write_packet(ptr::null_mut(), 0).is_null());
        assert_eq!(
            shmem_list_write(ptr::null_mut(), 0),
            SHMEM_LIST_ERROR_NULL_POINTER
        );
        assert_eq!(
            shmem_list_read(ptr::null_mut()),
            SHMEM_LIST_ERROR_NULL_POINTER
        );
        assert_eq!(
            shmem_list_close(ptr::null_mut()),
            SHMEM_LIST_ERROR_NULL_POINTER
        );
    }
}

#[test]
fn unknown_role_rejected() {
    let name = CString::new("shmem_list_badrole").unwrap();
    let handle = unsafe { shmem_list_open(name.as_ptr(), 99, 16, 2, ptr::null_mut()) };
    assert!(handle.is_null());
}
