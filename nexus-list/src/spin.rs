//! Pooled spin locks for lazy-allocation races.
//!
//! An [`AtomicList`](crate::AtomicList) needs a lock only for the instant
//! between seeing a null reference and publishing fresh storage. Giving
//! every handle its own lock would cost a word per handle for a path that
//! runs once, so handles share a fixed pool keyed by their address:
//!
//! ```text
//! handle address ──hash──► POOL[i]   (SPIN_POOL_SIZE cache-padded locks)
//! ```
//!
//! Two handles may map to the same lock. That only serializes their
//! allocation paths; it never affects correctness. Holding a pool lock while
//! taking another pool lock is not allowed.

use core::sync::atomic::{AtomicBool, Ordering};

use crossbeam_utils::{Backoff, CachePadded};

/// Number of spin locks in the shared pool. Must be a power of two.
pub const SPIN_POOL_SIZE: usize = 64;

const _: () = assert!(SPIN_POOL_SIZE.is_power_of_two());

const SLOT_SHIFT: u32 = usize::BITS - SPIN_POOL_SIZE.trailing_zeros();

static POOL: [CachePadded<SpinLock>; SPIN_POOL_SIZE] =
    [const { CachePadded::new(SpinLock::new()) }; SPIN_POOL_SIZE];

/// Test-and-test-and-set spin lock.
///
/// Waiters spin with [`Backoff::snooze`], which yields to the scheduler
/// once spinning stops paying off.
#[derive(Debug)]
pub struct SpinLock {
    locked: AtomicBool,
}

impl SpinLock {
    /// Creates an unlocked spin lock.
    #[inline]
    pub const fn new() -> Self {
        Self {
            locked: AtomicBool::new(false),
        }
    }

    /// Spins until the lock is acquired.
    pub fn lock(&self) -> SpinGuard<'_> {
        let backoff = Backoff::new();
        loop {
            if let Some(guard) = self.try_lock() {
                return guard;
            }
            while self.locked.load(Ordering::Relaxed) {
                backoff.snooze();
            }
        }
    }

    /// Acquires the lock if it is free.
    #[inline]
    pub fn try_lock(&self) -> Option<SpinGuard<'_>> {
        self.locked
            .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| SpinGuard { lock: self })
    }

    /// Returns `true` if some guard currently holds the lock.
    #[inline]
    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Relaxed)
    }
}

impl Default for SpinLock {
    fn default() -> Self {
        Self::new()
    }
}

/// Held [`SpinLock`]. Unlocks on drop.
#[derive(Debug)]
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct SpinGuard<'a> {
    lock: &'a SpinLock,
}

impl Drop for SpinGuard<'_> {
    #[inline]
    fn drop(&mut self) {
        self.lock.locked.store(false, Ordering::Release);
    }
}

/// Pool slot for `addr` (Fibonacci hashing on the top bits).
#[inline]
fn slot(addr: usize) -> usize {
    addr.wrapping_mul(0x9E37_79B9_7F4A_7C15_u64 as usize) >> SLOT_SHIFT
}

/// The pool lock guarding objects at `addr`.
///
/// The same address always maps to the same lock.
#[inline]
pub fn pool_lock_for(addr: usize) -> &'static SpinLock {
    &POOL[slot(addr)]
}
