use std::io;
use std::sync::atomic::AtomicU32;
use std::sync::atomic::Ordering::{AcqRel, Acquire, Release};

use super::futex;
use super::futex::WaitOutcome;

/// A counting semaphore that lives inside a shared memory region.
///
/// The count is a single futex word, so every process that maps the region
/// shares the same wait queue. `#[repr(C)]` keeps the layout identical in
/// every attaching process.
///
/// A `post` releases one permit and wakes one waiter; a `wait_until` consumes
/// one permit, sleeping on the futex while the count is zero. Interruptions
/// are retried against the caller's original deadline, so a wait only returns
/// early on a genuine wake.
#[repr(C)]
pub struct Semaphore {
    count: AtomicU32,
}

impl Semaphore {
    /// Create a semaphore with the given number of permits.
    pub const fn new(value: u32) -> Self {
        Self {
            count: AtomicU32::new(value),
        }
    }

    /// Reset the permit count in place.
    ///
    /// Only the process that claimed region initialization (or teardown) may
    /// call this; resetting under a live waiter loses permits.
    pub fn init(&self, value: u32) {
        self.count.store(value, Release);
    }

    /// Current permit count. Monitoring only; the value may be stale by the
    /// time the caller looks at it.
    pub fn value(&self) -> u32 {
        self.count.load(Acquire)
    }

    /// Release one permit and wake one waiter.
    ///
    /// The post is unconditional: the paired wait on the other side already
    /// bounds the count, so no capacity re-check happens here.
    pub fn post(&self) {
        self.count.fetch_add(1, Release);
        futex::wake_one(&self.count);
    }

    /// Consume one permit, blocking until one is available or the deadline
    /// passes.
    ///
    /// # Returns
    /// * `Ok(true)` - a permit was consumed
    /// * `Ok(false)` - the deadline elapsed with no permit available
    /// * `Err(e)` - the underlying wait failed for a non-timeout reason
    pub fn wait_until(&self, deadline: Option<&libc::timespec>) -> io::Result<bool> {
        loop {
            let mut current = self.count.load(Acquire);
            while current > 0 {
                match self
                    .count
                    .compare_exchange_weak(current, current - 1, AcqRel, Acquire)
                {
                    Ok(_) => return Ok(true),
                    Err(observed) => current = observed,
                }
            }

            match futex::wait_until(&self.count, 0, deadline)? {
                WaitOutcome::TimedOut => return Ok(false),
                WaitOutcome::Woken => continue,
            }
        }
    }
}
