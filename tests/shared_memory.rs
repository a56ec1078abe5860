// Shared memory allocator tests for Linux
// Run with: cargo test --test shared_memory -- --nocapture

#![cfg(target_os = "linux")]

use serial_test::serial;
use shmem_list::Core::{allocate_shared_memory, RawHandle};

fn unique_name(label: &str) -> String {
    format!("shmem_list_shm_{}_{}", std::process::id(), label)
}

#[test]
#[serial]
fn test_allocate_write_read() {
    let name = unique_name("create");
    let shm = allocate_shared_memory(&name, 4096).unwrap();

    assert_eq!(shm.size(), 4096);
    assert!(!shm.as_ptr().is_null());

    unsafe {
        let slice = std::slice::from_raw_parts_mut(shm.as_ptr(), 4096);
        for i in 0..100 {
            slice[i] = (i % 256) as u8;
        }
        for i in 0..100 {
            assert_eq!(slice[i], (i % 256) as u8);
        }
    }

    shm.unlink().unwrap();
}

#[test]
#[serial]
fn test_fresh_region_is_zeroed() {
    // ftruncate semantics: a newly created region reads back as zeros,
    // which the ring's initialization sentinel depends on
    let name = unique_name("zeroed");
    let shm = allocate_shared_memory(&name, 1024).unwrap();

    unsafe {
        let slice = std::slice::from_raw_parts(shm.as_ptr(), 1024);
        for (i, byte) in slice.iter().enumerate() {
            assert_eq!(*byte, 0, "byte {} not zero-initialized", i);
        }
    }

    shm.unlink().unwrap();
}

#[test]
#[serial]
fn test_reattach_sees_previous_writes() {
    let name = unique_name("attach");
    let first = allocate_shared_memory(&name, 1024).unwrap();
    unsafe {
        *first.as_ptr() = 0xAB;
        *first.as_ptr().add(1000) = 0xCD;
    }

    // Open-or-create: the second allocation attaches to the same object
    let second = allocate_shared_memory(&name, 1024).unwrap();
    unsafe {
        assert_eq!(*second.as_ptr(), 0xAB);
        assert_eq!(*second.as_ptr().add(1000), 0xCD);
    }

    second.unlink().unwrap();
    // The name is already gone; a second unlink is tolerated
    first.unlink().unwrap();
}

#[test]
#[serial]
fn test_unlink_frees_the_name() {
    let name = unique_name("unlink");
    let first = allocate_shared_memory(&name, 512).unwrap();
    unsafe { *first.as_ptr() = 0x77 };
    first.unlink().unwrap();

    // Same name, fresh object: contents start from zero again
    let second = allocate_shared_memory(&name, 512).unwrap();
    unsafe { assert_eq!(*second.as_ptr(), 0) };
    second.unlink().unwrap();
}

#[test]
#[serial]
fn test_raw_handle() {
    let name = unique_name("handle");
    let shm = allocate_shared_memory(&name, 4096).unwrap();

    let RawHandle::Fd(fd) = shm.raw_handle();
    assert!(fd > 0, "File descriptor should be positive");

    shm.unlink().unwrap();
}
