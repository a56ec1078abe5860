// Counting-semaphore behavior: permits, timeouts, cross-thread wakes.

use shmem_list::Core::futex::deadline_after;
use shmem_list::Core::sem::Semaphore;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[test]
fn permits_count_down_then_wait_times_out() {
    let sem = Semaphore::new(2);

    let deadline = deadline_after(Duration::from_millis(100)).unwrap();
    assert!(sem.wait_until(Some(&deadline)).unwrap());
    assert!(sem.wait_until(Some(&deadline)).unwrap());
    assert_eq!(sem.value(), 0);

    let start = Instant::now();
    let deadline = deadline_after(Duration::from_millis(100)).unwrap();
    assert!(!sem.wait_until(Some(&deadline)).unwrap());
    assert!(start.elapsed() >= Duration::from_millis(100));
}

#[test]
fn post_releases_a_permit() {
    let sem = Semaphore::new(0);
    sem.post();
    assert_eq!(sem.value(), 1);

    let deadline = deadline_after(Duration::from_millis(50)).unwrap();
    assert!(sem.wait_until(Some(&deadline)).unwrap());
    assert_eq!(sem.value(), 0);
}

#[test]
fn post_wakes_a_sleeping_waiter() {
    let sem = Arc::new(Semaphore::new(0));

    let poster = sem.clone();
    let handle = thread::spawn(move || {
        thread::sleep(Duration::from_millis(100));
        poster.post();
    });

    let start = Instant::now();
    let deadline = deadline_after(Duration::from_secs(2)).unwrap();
    assert!(sem.wait_until(Some(&deadline)).unwrap());
    let elapsed = start.elapsed();

    // Woken by the post, not by the deadline
    assert!(elapsed >= Duration::from_millis(50));
    assert!(elapsed < Duration::from_secs(2));

    handle.join().unwrap();
}

#[test]
fn init_resets_the_count() {
    let sem = Semaphore::new(5);
    sem.init(1);
    assert_eq!(sem.value(), 1);
    sem.init(0);
    assert_eq!(sem.value(), 0);
}

#[test]
fn elapsed_deadline_degenerates_to_poll() {
    // A deadline in the past still consumes an available permit
    let sem = Semaphore::new(1);
    let deadline = deadline_after(Duration::ZERO).unwrap();
    assert!(sem.wait_until(Some(&deadline)).unwrap());
    // ...and reports timeout immediately once none are left
    assert!(!sem.wait_until(Some(&deadline)).unwrap());
}
