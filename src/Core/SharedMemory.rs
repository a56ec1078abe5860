// Shared memory backend abstraction for Linux
// Uses shm_open + mmap + mlock so the region is shared and pinned

use std::fmt::Debug;
use std::io;
use std::ptr::NonNull;

/// Shared memory backend trait for memory-mapped packet regions
pub trait SharedMemoryBackend: Send + Sync + Debug {
    /// Get a pointer to the mapped memory region
    fn as_ptr(&self) -> *mut u8;

    /// Get the size of the mapped region in bytes
    fn size(&self) -> usize;

    /// Get the underlying file descriptor
    fn raw_handle(&self) -> RawHandle;

    /// Remove the named backing object.
    ///
    /// The mapping itself stays valid until the backend is dropped, so a
    /// peer that is still attached keeps working. A name that is already
    /// gone (the peer unlinked first) is not an error.
    fn unlink(&self) -> io::Result<()>;
}

/// Platform-specific handle type
#[derive(Debug, Clone, Copy)]
pub enum RawHandle {
    /// Unix file descriptor (Linux)
    Fd(i32),
}

/// Open-or-create a named shared memory region of the specified size.
///
/// Both roles call this with the same name and size; whichever process
/// arrives first creates the backing object, the other one attaches to it.
/// The region is zero-filled on creation (`ftruncate` semantics), which is
/// what the ring's initialization sentinel relies on.
///
/// # Arguments
/// * `name` - Name of the shared memory object (a `/dev/shm` entry on Linux)
/// * `size` - Size of the region in bytes
///
/// # Returns
/// A boxed trait object implementing SharedMemoryBackend
#[cfg(target_os = "linux")]
pub fn allocate_shared_memory(name: &str, size: usize) -> io::Result<Box<dyn SharedMemoryBackend>> {
    Ok(Box::new(LinuxSharedMemory::allocate(name, size)?))
}

#[cfg(not(target_os = "linux"))]
pub fn allocate_shared_memory(_name: &str, _size: usize) -> io::Result<Box<dyn SharedMemoryBackend>> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "Shared memory only supported on Linux",
    ))
}

#[cfg(target_os = "linux")]
use std::ffi::CString;

#[cfg(target_os = "linux")]
#[derive(Debug)]
pub struct LinuxSharedMemory {
    ptr: NonNull<u8>,
    size: usize,
    fd: i32,
    name: CString,
}

#[cfg(target_os = "linux")]
unsafe impl Send for LinuxSharedMemory {}
#[cfg(target_os = "linux")]
unsafe impl Sync for LinuxSharedMemory {}

#[cfg(target_os = "linux")]
impl LinuxSharedMemory {
    /// Open or create the named region, size it, map it, and pin it.
    pub fn allocate(name: &str, size: usize) -> io::Result<Self> {
        let c_name = CString::new(name).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                "shared memory name contains an interior NUL byte",
            )
        })?;

        let fd = unsafe {
            libc::shm_open(
                c_name.as_ptr(),
                libc::O_RDWR | libc::O_CREAT,
                0o666 as libc::mode_t,
            )
        };
        if fd < 0 {
            let err = io::Error::last_os_error();
            return Err(io::Error::new(
                err.kind(),
                format!("Failed to open shared memory object {}: {}", name, err),
            ));
        }

        // Open permissions, every attaching process must be able to map RW
        if unsafe { libc::fchmod(fd, libc::S_IRWXU | libc::S_IRWXG | libc::S_IRWXO) } != 0 {
            let err = io::Error::last_os_error();
            unsafe { libc::close(fd) };
            return Err(err);
        }

        if unsafe { libc::ftruncate(fd, size as libc::off_t) } != 0 {
            let err = io::Error::last_os_error();
            unsafe { libc::close(fd) };
            return Err(err);
        }

        let ptr = unsafe {
            let ptr = libc::mmap(
                std::ptr::null_mut(),
                size,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                fd,
                0,
            );

            if ptr == libc::MAP_FAILED {
                let err = io::Error::last_os_error();
                libc::close(fd);
                return Err(err);
            }
            ptr as *mut u8
        };

        // Pin the pages so packet transfers never fault
        if unsafe { libc::mlock(ptr as *const libc::c_void, size) } != 0 {
            let err = io::Error::last_os_error();
            unsafe {
                libc::munmap(ptr as *mut libc::c_void, size);
                libc::close(fd);
            }
            return Err(io::Error::new(
                err.kind(),
                format!("Failed to lock shared memory ({} bytes): {}", size, err),
            ));
        }

        tracing::debug!(name, size, "mapped shared memory region");

        Ok(Self {
            ptr: NonNull::new(ptr).unwrap(),
            size,
            fd,
            name: c_name,
        })
    }
}

#[cfg(target_os = "linux")]
impl Drop for LinuxSharedMemory {
    fn drop(&mut self) {
        unsafe {
            libc::munlock(self.ptr.as_ptr() as *const libc::c_void, self.size);
            if libc::munmap(self.ptr.as_ptr() as *mut libc::c_void, self.size) != 0 {
                tracing::warn!(
                    error = %io::Error::last_os_error(),
                    "munmap failed while releasing shared memory"
                );
            }
            libc::close(self.fd);
        }
    }
}

#[cfg(target_os = "linux")]
impl SharedMemoryBackend for LinuxSharedMemory {
    fn as_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    fn size(&self) -> usize {
        self.size
    }

    fn raw_handle(&self) -> RawHandle {
        RawHandle::Fd(self.fd)
    }

    fn unlink(&self) -> io::Result<()> {
        if unsafe { libc::shm_unlink(self.name.as_ptr()) } != 0 {
            let err = io::Error::last_os_error();
            // The peer may have unlinked first; both sides are required to close
            if err.raw_os_error() == Some(libc::ENOENT) {
                return Ok(());
            }
            return Err(err);
        }
        Ok(())
    }
}
