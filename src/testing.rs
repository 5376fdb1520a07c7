//! Test-only synchronization, exported so that both this crate's own
//! `#[cfg(test)]` unit tests and its external `tests/` integration tests can
//! serialize access to the process-wide allocator state.
//!
//! `cargo test` runs on multiple OS threads within one process by default,
//! and integration tests link against an ordinary (non-`--cfg test`) build
//! of the library, so the lock itself can't live behind `#[cfg(test)]` the
//! way [`crate::state`]'s internals do — it has to be real, always-compiled
//! crate surface. It's marked `#[doc(hidden)]` because it's not part of the
//! allocator's actual contract, only a seam for its own test suite.

use std::ptr;
use std::sync::atomic::Ordering;
use std::sync::{Mutex, MutexGuard};

use crate::state::{ARENA_PREALLOCATED, HEAD};

static LOCK: Mutex<()> = Mutex::new(());

/// Acquires the test serialization lock and resets the registry.
///
/// `ARENA_START`/`ARENA_END` are deliberately left alone: the real arena
/// never shrinks (spec non-goal), so each test still sees a monotonically
/// growing break, the same way a fresh process would after its first
/// allocation.
#[doc(hidden)]
pub fn lock_for_test() -> MutexGuard<'static, ()> {
    let guard = LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    HEAD.store(ptr::null_mut(), Ordering::Relaxed);
    ARENA_PREALLOCATED.store(false, Ordering::Relaxed);
    guard
}
