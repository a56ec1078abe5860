use std::io;
use std::sync::atomic::AtomicU32;
use std::time::Duration;

/// Bitset argument selecting every waiter (FUTEX_BITSET_MATCH_ANY).
#[cfg(target_os = "linux")]
const FUTEX_BITSET_MATCH_ANY: u32 = !0;

/// Result of a blocking futex wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The word may have changed (wake, interruption, or value mismatch);
    /// the caller must re-check its condition and decide whether to wait again.
    Woken,
    /// The absolute deadline elapsed.
    TimedOut,
}

/// Compute an absolute CLOCK_REALTIME deadline `timeout` from now.
///
/// The deadline is computed exactly once per blocking call and handed to the
/// kernel as-is, so retries after an interruption keep honoring the original
/// wall-clock bound.
pub fn deadline_after(timeout: Duration) -> io::Result<libc::timespec> {
    let mut ts = libc::timespec {
        tv_sec: 0,
        tv_nsec: 0,
    };
    if unsafe { libc::clock_gettime(libc::CLOCK_REALTIME, &mut ts) } != 0 {
        return Err(io::Error::last_os_error());
    }
    ts.tv_sec += timeout.as_secs() as libc::time_t;
    ts.tv_nsec += timeout.subsec_nanos() as libc::c_long;
    ts.tv_sec += (ts.tv_nsec / 1_000_000_000) as libc::time_t;
    ts.tv_nsec %= 1_000_000_000;
    Ok(ts)
}

/// Block until the futex word is no longer `expected`, the deadline passes,
/// or the kernel wakes us.
///
/// The waiters live in another process, so the wait is a shared one (no
/// `FUTEX_PRIVATE_FLAG`), and the timeout is an absolute CLOCK_REALTIME
/// deadline (`FUTEX_WAIT_BITSET | FUTEX_CLOCK_REALTIME`). `None` blocks
/// indefinitely.
#[cfg(target_os = "linux")]
pub fn wait_until(
    atomic: &AtomicU32,
    expected: u32,
    deadline: Option<&libc::timespec>,
) -> io::Result<WaitOutcome> {
    let ts_ptr = deadline.map_or(std::ptr::null(), |ts| ts as *const libc::timespec);

    let rc = unsafe {
        libc::syscall(
            libc::SYS_futex,
            atomic as *const AtomicU32 as *const u32,
            libc::FUTEX_WAIT_BITSET | libc::FUTEX_CLOCK_REALTIME,
            expected,
            ts_ptr,
            std::ptr::null::<u32>(),
            FUTEX_BITSET_MATCH_ANY,
        )
    };

    if rc == 0 {
        return Ok(WaitOutcome::Woken);
    }

    let err = io::Error::last_os_error();
    match err.raw_os_error() {
        Some(libc::ETIMEDOUT) => Ok(WaitOutcome::TimedOut),
        // Interrupted, or the word changed before we slept: re-check and retry
        Some(libc::EINTR) | Some(libc::EAGAIN) => Ok(WaitOutcome::Woken),
        _ => Err(err),
    }
}

/// Wake one waiter blocked on the futex word.
#[cfg(target_os = "linux")]
pub fn wake_one(atomic: &AtomicU32) {
    unsafe {
        libc::syscall(
            libc::SYS_futex,
            atomic as *const AtomicU32 as *const u32,
            libc::FUTEX_WAKE,
            1, // Wake 1 waiter
            std::ptr::null::<libc::timespec>(),
            std::ptr::null::<u32>(),
            0u32,
        );
    }
}

#[cfg(not(target_os = "linux"))]
pub fn wait_until(
    atomic: &AtomicU32,
    expected: u32,
    deadline: Option<&libc::timespec>,
) -> io::Result<WaitOutcome> {
    use std::sync::atomic::Ordering;

    // Polling fallback for platforms without a futex syscall
    if atomic.load(Ordering::Acquire) != expected {
        return Ok(WaitOutcome::Woken);
    }
    if let Some(deadline) = deadline {
        let mut now = libc::timespec {
            tv_sec: 0,
            tv_nsec: 0,
        };
        if unsafe { libc::clock_gettime(libc::CLOCK_REALTIME, &mut now) } != 0 {
            return Err(io::Error::last_os_error());
        }
        if (now.tv_sec, now.tv_nsec) >= (deadline.tv_sec, deadline.tv_nsec) {
            return Ok(WaitOutcome::TimedOut);
        }
    }
    std::thread::sleep(Duration::from_millis(1));
    Ok(WaitOutcome::Woken)
}

#[cfg(not(target_os = "linux"))]
pub fn wake_one(_atomic: &AtomicU32) {
    // No-op: the polling wait re-checks the word on its own
}
