//! The four public entry points (spec §4.4 / §6), and the internal
//! allocation pipeline they're built from.
//!
//! The `os_*` functions are the thin, C-ABI-compatible shell the test
//! harness links against. All of the actual branching lives in the
//! `*_internal` functions below them, which take an explicit
//! [`AllocIntent`] instead of reading a process-wide mode flag — spec §9's
//! own design note recommends exactly this redesign over the source's
//! ambient `calloc_mode`/`realloc_mode` booleans.

use std::ptr;
use std::sync::atomic::Ordering;

use crate::align::align;
use crate::arena::{self, ARENA_PREALLOC, MMAP_THRESHOLD};
use crate::block::{HEADER_SIZE, Header, Status};
use crate::primitives::{mmap_bytes, munmap_bytes, page_size, sbrk_bytes};
use crate::registry;
use crate::state;

/// Which threshold (and, for realloc's benefit, which downstream policy)
/// the current allocation pipeline call should use.
///
/// This is the explicit stand-in for the source's ambient `calloc_mode`:
/// `ZeroInit` swaps the arena/mapping cutover from [`MMAP_THRESHOLD`] to the
/// page size, since kernel-supplied anonymous pages already arrive
/// zeroed and a `memset` over them would be wasted work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AllocIntent {
    Normal,
    ZeroInit,
}

/// The shared allocation pipeline behind `os_malloc` and `os_calloc` (spec
/// §4.4.1).
pub(crate) fn alloc_internal(user_size: usize, intent: AllocIntent) -> *mut u8 {
    if user_size == 0 {
        return ptr::null_mut();
    }

    let total = align(user_size) + HEADER_SIZE;
    let threshold = match intent {
        AllocIntent::Normal => MMAP_THRESHOLD,
        AllocIntent::ZeroInit => page_size(),
    };

    if total >= threshold {
        let mapped = mmap_bytes(total);
        let header = unsafe { Header::new_mapped(mapped, total) };
        unsafe { registry::insert_tail(header) };
        return unsafe { Header::user_ptr(header) };
    }

    // First-ever arena use hands back the *entire* prealloc slab,
    // ignoring the requested size — an observable quirk of the reference
    // policy (spec §9) that callers and tests depend on.
    if !state::ARENA_PREALLOCATED.swap(true, Ordering::Relaxed) {
        let slab = sbrk_bytes(ARENA_PREALLOC);
        state::record_arena_extension(slab, ARENA_PREALLOC);
        let header = unsafe { Header::new_arena(slab, ARENA_PREALLOC - HEADER_SIZE, Status::Alloc) };
        unsafe { registry::insert_tail(header) };
        return unsafe { Header::user_ptr(header) };
    }

    let reused = arena::try_all(total);
    if !reused.is_null() {
        return unsafe { Header::user_ptr(reused) };
    }

    let fresh = sbrk_bytes(total);
    state::record_arena_extension(fresh, total);
    let header = unsafe { Header::new_arena(fresh, total - HEADER_SIZE, Status::Alloc) };
    unsafe { registry::insert_tail(header) };
    unsafe { Header::user_ptr(header) }
}

/// spec §4.4.2.
pub(crate) fn free_internal(user_ptr: *mut u8) {
    if user_ptr.is_null() {
        return;
    }

    unsafe {
        let header = Header::from_user_ptr(user_ptr);
        match (*header).status {
            Status::Alloc => {
                (*header).status = Status::Free;
            }
            Status::Mapped => {
                let size = (*header).size;
                registry::unlink(header);
                munmap_bytes(header as *mut u8, size);
            }
            // Double-free (or free of an already-free block) is a silent
            // no-op, absorbed by the FREE -> FREE transition.
            Status::Free => {}
        }
    }
}

/// spec §4.4.3.
pub(crate) fn calloc_internal(count: usize, elem_size: usize) -> *mut u8 {
    if count == 0 || elem_size == 0 {
        return ptr::null_mut();
    }

    let Some(raw) = count.checked_mul(elem_size) else {
        return ptr::null_mut();
    };
    let n = align(raw);

    let p = alloc_internal(n, AllocIntent::ZeroInit);
    if p.is_null() {
        return p;
    }

    unsafe { ptr::write_bytes(p, 0, n) };
    p
}

/// spec §4.4.4.
pub(crate) fn realloc_internal(user_ptr: *mut u8, user_size: usize) -> *mut u8 {
    if user_size == 0 {
        free_internal(user_ptr);
        return ptr::null_mut();
    }

    if user_ptr.is_null() {
        return alloc_internal(user_size, AllocIntent::Normal);
    }

    unsafe {
        let header = Header::from_user_ptr(user_ptr);

        if (*header).status == Status::Free {
            return ptr::null_mut();
        }

        let new_payload = align(user_size);
        let old_payload_len = if (*header).status == Status::Mapped {
            (*header).size - HEADER_SIZE
        } else {
            (*header).size
        };
        if new_payload == old_payload_len {
            return user_ptr;
        }

        if (*header).status == Status::Mapped {
            let fresh = alloc_internal(user_size, AllocIntent::Normal);
            if fresh.is_null() {
                return fresh;
            }
            let copy_len = old_payload_len.min(new_payload);
            ptr::copy_nonoverlapping(user_ptr, fresh, copy_len);
            free_internal(user_ptr);
            return fresh;
        }

        // status == Alloc from here on.
        let old_payload = (*header).size;

        if new_payload < old_payload {
            arena::split_realloc(header, new_payload);
            return user_ptr;
        }

        // Grow. Either absorb a free successor in place, or — if this is
        // the tail — extend the program break directly under the block.
        let grown_in_place = if !(*header).next.is_null() {
            registry::contains(header)
                && arena::coalesce_successor(header)
                && (*header).size >= new_payload
        } else {
            arena::extend_heap_realloc(header, new_payload)
        };

        if grown_in_place {
            arena::split_realloc(header, new_payload);
            return user_ptr;
        }

        let fresh = alloc_internal(user_size, AllocIntent::Normal);
        if fresh.is_null() {
            return fresh;
        }
        ptr::copy_nonoverlapping(user_ptr, fresh, old_payload);
        free_internal(user_ptr);
        fresh
    }
}

/// Allocates `size` bytes, or returns null for a zero-size request or a
/// request that can't be satisfied in place (see [`alloc_internal`]).
///
/// # Safety
///
/// The returned pointer, once non-null, must only be passed back to
/// [`os_free`] or [`os_realloc`] from this same allocator.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn os_malloc(size: usize) -> *mut u8 {
    alloc_internal(size, AllocIntent::Normal)
}

/// Releases a block previously returned by [`os_malloc`], [`os_calloc`] or
/// [`os_realloc`]. A null pointer is a no-op; a pointer to an already-freed
/// block is a no-op.
///
/// # Safety
///
/// `ptr` must be null or a pointer previously returned by this allocator
/// and not yet freed in a way this allocator can't detect (e.g. via
/// a corrupted header).
#[unsafe(no_mangle)]
pub unsafe extern "C" fn os_free(ptr: *mut u8) {
    free_internal(ptr)
}

/// Allocates space for `count` elements of `elem_size` bytes each, zeroed.
///
/// # Safety
///
/// See [`os_malloc`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn os_calloc(count: usize, elem_size: usize) -> *mut u8 {
    calloc_internal(count, elem_size)
}

/// Resizes the allocation at `ptr` to `size` bytes, preserving the
/// `min(old, new)` prefix of its contents. `ptr == null` behaves as
/// [`os_malloc`]; `size == 0` behaves as [`os_free`] and returns null.
///
/// # Safety
///
/// See [`os_malloc`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn os_realloc(ptr: *mut u8, size: usize) -> *mut u8 {
    realloc_internal(ptr, size)
}
