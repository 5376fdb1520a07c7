//! Process-wide allocator state.
//!
//! Lifecycle: initialized to zero at process start, never torn down (spec
//! §3). Rust's 2024 edition forbids references to `static mut`, so the
//! historical "global variables" design here is expressed as plain atomic
//! cells rather than a mutex-guarded struct — there is still no locking and
//! no synchronization guarantee beyond what's needed to satisfy `Sync`; see
//! the crate-root docs for the single-threaded caveat this preserves.
//! Grounded in `koute-bytehound/preload/src/global.rs`, which keeps its own
//! process-wide allocator/tracer state as bare `static AtomicUsize` /
//! `AtomicBool` pairs for the same reason.

use std::ptr;
use std::sync::atomic::{AtomicBool, AtomicPtr, Ordering};

use crate::block::Header;

/// Registry head pointer. Null when the registry is empty.
pub(crate) static HEAD: AtomicPtr<Header> = AtomicPtr::new(ptr::null_mut());

/// Set true the first time the arena is ever extended.
pub(crate) static ARENA_PREALLOCATED: AtomicBool = AtomicBool::new(false);

/// Low end of the arena (first `sbrk` return value). Null until the arena
/// exists. Not part of spec.md's data model proper — an ambient addition so
/// status-coherence (`Mapped` blocks lie outside the arena) is testable
/// without intercepting syscalls.
pub(crate) static ARENA_START: AtomicPtr<u8> = AtomicPtr::new(ptr::null_mut());

/// Current program break, as last observed by this allocator.
pub(crate) static ARENA_END: AtomicPtr<u8> = AtomicPtr::new(ptr::null_mut());

/// Records a fresh `[start, start + len)` extension of the arena.
pub(crate) fn record_arena_extension(start: *mut u8, len: usize) {
    if ARENA_START.load(Ordering::Relaxed).is_null() {
        ARENA_START.store(start, Ordering::Relaxed);
    }
    let new_end = unsafe { start.add(len) };
    ARENA_END.store(new_end, Ordering::Relaxed);
}

/// Whether `ptr` lies within the current arena bounds.
pub(crate) fn in_arena(ptr: *mut u8) -> bool {
    let start = ARENA_START.load(Ordering::Relaxed);
    let end = ARENA_END.load(Ordering::Relaxed);
    !start.is_null() && ptr >= start && ptr < end
}
