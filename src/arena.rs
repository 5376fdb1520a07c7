//! Arena manager: coalesce, best-fit search + split, and trailing-block
//! extension — the reuse pipeline described in spec §4.3.
//!
//! None of these functions talk to `libc` directly except
//! [`extend_heap_normal`] and [`extend_heap_realloc`], which call
//! [`crate::primitives::sbrk_bytes`] to grow the program break. Everything
//! else only walks and rewrites the registry built by [`crate::registry`].

use crate::block::{HEADER_SIZE, Header, Status};
use crate::primitives::sbrk_bytes;
use crate::registry;
use crate::state;

/// Cutoff above which an allocation request uses `mmap` instead of the
/// arena, under the normal (non zero-init) threshold.
pub(crate) const MMAP_THRESHOLD: usize = 128 * 1024;

/// Size of the first arena extension.
pub(crate) const ARENA_PREALLOC: usize = MMAP_THRESHOLD;

/// Sweeps the registry once, merging every run of adjacent `Free` arena
/// blocks into the first block of the run (spec §4.3.1, "global mode").
///
/// `Mapped` blocks never participate: they are not arena-contiguous with
/// anything, regardless of where they sit in insertion order.
pub(crate) fn coalesce_global() {
    let mut current = registry::head();
    while !current.is_null() {
        unsafe {
            if (*current).status != Status::Free {
                current = (*current).next;
                continue;
            }

            loop {
                let next = (*current).next;
                if next.is_null() || (*next).status != Status::Free {
                    break;
                }
                (*current).size += HEADER_SIZE + (*next).size;
                (*current).next = (*next).next;
                if !(*next).next.is_null() {
                    (*(*next).next).prev = current;
                }
            }

            current = (*current).next;
        }
    }
}

/// Absorbs `block`'s immediate successor into it if that successor is
/// `Free` (spec §4.3.1, "successor-only mode"). `block` itself need not be
/// free — this is the only case where a non-free block grows by absorbing
/// a free neighbor.
///
/// Returns whether a merge happened.
pub(crate) fn coalesce_successor(block: *mut Header) -> bool {
    unsafe {
        let next = (*block).next;
        if next.is_null() || (*next).status != Status::Free {
            return false;
        }
        (*block).size += HEADER_SIZE + (*next).size;
        (*block).next = (*next).next;
        if !(*next).next.is_null() {
            (*(*next).next).prev = block;
        }
        true
    }
}

/// Walks the registry once, choosing the smallest `Free` block whose `size`
/// is at least `requested_payload`. Ties go to the first one encountered.
fn find_best_fit(requested_payload: usize) -> *mut Header {
    let mut current = registry::head();
    let mut best: *mut Header = std::ptr::null_mut();
    let mut best_size = usize::MAX;

    while !current.is_null() {
        unsafe {
            if (*current).status == Status::Free
                && (*current).size >= requested_payload
                && (*current).size < best_size
            {
                best = current;
                best_size = (*current).size;
            }
            current = (*current).next;
        }
    }

    best
}

/// Best-fit search plus split (spec §4.3.2).
///
/// `requested_total` is `align(user_size) + HEADER_SIZE`. Returns the
/// chosen, now-`Alloc` block, or null if no free block is big enough.
pub(crate) fn search_and_split(requested_total: usize) -> *mut Header {
    let requested_payload = requested_total - HEADER_SIZE;
    let chosen = find_best_fit(requested_payload);
    if chosen.is_null() {
        return chosen;
    }

    unsafe {
        (*chosen).status = Status::Alloc;

        let residual = (*chosen).size - requested_payload;
        if (*chosen).size >= crate::align::align(1) + requested_total {
            let new_block_at = (chosen as *mut u8).add(requested_total);
            let new_free_size = residual - HEADER_SIZE;
            let new_free = Header::new_arena(new_block_at, new_free_size, Status::Free);
            registry::insert_after(chosen, new_free);
            (*chosen).size = requested_payload;
        }
    }

    chosen
}

/// Extends the trailing block of the arena to satisfy `requested_total`
/// bytes (spec §4.3.3, "normal mode").
///
/// If the registry is empty or the tail is not `Free`, returns null and the
/// caller must `sbrk` a brand new block instead. If the registry is empty,
/// this always returns null (there is no tail to extend).
pub(crate) fn extend_heap_normal(requested_total: usize) -> *mut Header {
    let tail = registry::tail();
    if tail.is_null() {
        return std::ptr::null_mut();
    }

    unsafe {
        if (*tail).status != Status::Free {
            return std::ptr::null_mut();
        }

        let requested_payload = requested_total - HEADER_SIZE;
        let grow_by = requested_payload - (*tail).size;
        let extension = sbrk_bytes(grow_by);
        state::record_arena_extension(extension, grow_by);

        (*tail).size = requested_payload;
        (*tail).status = Status::Alloc;
        tail
    }
}

/// Extends `target`, which must be the registry tail, to hold
/// `requested_payload` bytes in place (spec §4.3.3, "realloc mode").
///
/// Returns `false` (no-op) if `target` is not the tail.
pub(crate) fn extend_heap_realloc(target: *mut Header, requested_payload: usize) -> bool {
    unsafe {
        if !(*target).next.is_null() {
            return false;
        }

        let grow_by = requested_payload - (*target).size;
        let extension = sbrk_bytes(grow_by);
        state::record_arena_extension(extension, grow_by);

        (*target).size = requested_payload;
        (*target).status = Status::Alloc;
        true
    }
}

/// The arena reuse pipeline (spec §4.3.4): coalesce globally, then best-fit
/// search with split, then fall back to extending the tail. Returns the
/// allocated block, or null if the caller must `sbrk` a fresh arena block.
pub(crate) fn try_all(requested_total: usize) -> *mut Header {
    coalesce_global();

    let found = search_and_split(requested_total);
    if !found.is_null() {
        return found;
    }

    extend_heap_normal(requested_total)
}

/// Shrinks `block` in place to `new_payload`, splitting off the residual as
/// a new `Free` successor if it's large enough to be worth keeping (spec
/// §4.4.4, `splitRealloc`). Used both for realloc-shrink and to trim after a
/// successor-coalesce that grew past what was needed.
pub(crate) fn split_realloc(block: *mut Header, new_payload: usize) {
    unsafe {
        let residual = (*block).size - new_payload;
        if residual >= HEADER_SIZE + crate::align::align(1) {
            let new_block_at = (block as *mut u8).add(HEADER_SIZE + new_payload);
            let new_free_size = residual - HEADER_SIZE;
            let new_free = Header::new_arena(new_block_at, new_free_size, Status::Free);
            registry::insert_after(block, new_free);
            (*block).size = new_payload;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[test]
    fn coalesce_global_merges_adjacent_runs() {
        let _guard = testing::lock_for_test();

        // Lay out three adjacent arena blocks in one backing buffer so
        // pointer arithmetic between them is well-defined, matching how
        // real arena blocks sit back-to-back after an sbrk extension.
        let payload = 32usize;
        let mut buf = vec![0u8; (HEADER_SIZE + payload) * 3];
        let base = buf.as_mut_ptr();

        unsafe {
            let h1 = Header::new_arena(base, payload, Status::Free);
            let h2 = Header::new_arena(base.add(HEADER_SIZE + payload), payload, Status::Free);
            let h3 = Header::new_arena(
                base.add(2 * (HEADER_SIZE + payload)),
                payload,
                Status::Alloc,
            );

            registry::insert_tail(h1);
            registry::insert_tail(h2);
            registry::insert_tail(h3);

            coalesce_global();

            assert_eq!(registry::head(), h1);
            assert_eq!((*h1).size, payload * 2 + HEADER_SIZE);
            assert_eq!((*h1).next, h3);
            assert_eq!((*h3).prev, h1);
        }
    }

    #[test]
    fn coalesce_global_skips_mapped_blocks() {
        let _guard = testing::lock_for_test();

        let mut buf = vec![0u8; (HEADER_SIZE + 32) * 2];
        let base = buf.as_mut_ptr();

        unsafe {
            let h1 = Header::new_mapped(base, HEADER_SIZE + 32);
            let h2 = Header::new_arena(base.add(HEADER_SIZE + 32), 32, Status::Free);

            registry::insert_tail(h1);
            registry::insert_tail(h2);

            coalesce_global();

            // Nothing adjacent to merge with: h1 is Mapped, h2 has no
            // Free successor.
            assert_eq!((*h1).next, h2);
            assert_eq!((*h2).status, Status::Free);
        }
    }

    #[test]
    fn search_and_split_prefers_smallest_sufficient_block() {
        let _guard = testing::lock_for_test();

        let mut small = vec![0u8; HEADER_SIZE + 64];
        let mut big = vec![0u8; HEADER_SIZE + 256];

        unsafe {
            let h_small = Header::new_arena(small.as_mut_ptr(), 64, Status::Free);
            let h_big = Header::new_arena(big.as_mut_ptr(), 256, Status::Free);

            registry::insert_tail(h_big);
            registry::insert_tail(h_small);

            let requested_total = crate::align::align(32) + HEADER_SIZE;
            let chosen = search_and_split(requested_total);

            assert_eq!(chosen, h_small);
            assert_eq!((*chosen).status, Status::Alloc);
        }
    }

    #[test]
    fn search_and_split_splits_off_residual() {
        let _guard = testing::lock_for_test();

        let mut buf = vec![0u8; HEADER_SIZE + 256];

        unsafe {
            let h = Header::new_arena(buf.as_mut_ptr(), 256, Status::Free);
            registry::insert_tail(h);

            let requested_total = crate::align::align(32) + HEADER_SIZE;
            let chosen = search_and_split(requested_total);

            assert_eq!(chosen, h);
            assert_eq!((*chosen).size, crate::align::align(32));

            let residual = (*chosen).next;
            assert!(!residual.is_null());
            assert_eq!((*residual).status, Status::Free);
            assert_eq!((*residual).size, 256 - requested_total);
        }
    }

    #[test]
    fn search_and_split_skips_split_when_residual_too_small() {
        let _guard = testing::lock_for_test();

        // HEADER_SIZE + align(1) of slack is exactly what's needed to be
        // worth splitting; anything less must not split.
        let payload = crate::align::align(32);
        let mut buf = vec![0u8; HEADER_SIZE + payload];

        unsafe {
            let h = Header::new_arena(buf.as_mut_ptr(), payload, Status::Free);
            registry::insert_tail(h);

            let requested_total = payload + HEADER_SIZE;
            let chosen = search_and_split(requested_total);

            assert_eq!(chosen, h);
            assert_eq!((*chosen).size, payload);
            assert!((*chosen).next.is_null());
        }
    }

    #[test]
    fn coalesce_successor_absorbs_only_immediate_free_successor() {
        let _guard = testing::lock_for_test();

        let mut buf = vec![0u8; (HEADER_SIZE + 32) * 2];
        let base = buf.as_mut_ptr();

        unsafe {
            let h1 = Header::new_arena(base, 32, Status::Alloc);
            let h2 = Header::new_arena(base.add(HEADER_SIZE + 32), 32, Status::Free);

            registry::insert_tail(h1);
            registry::insert_tail(h2);

            let merged = coalesce_successor(h1);

            assert!(merged);
            assert_eq!((*h1).size, 32 * 2 + HEADER_SIZE);
            assert!((*h1).next.is_null());
        }
    }

    #[test]
    fn split_realloc_leaves_block_unchanged_when_residual_too_small() {
        let _guard = testing::lock_for_test();

        let payload = crate::align::align(64);
        let mut buf = vec![0u8; HEADER_SIZE + payload];

        unsafe {
            let h = Header::new_arena(buf.as_mut_ptr(), payload, Status::Alloc);
            registry::insert_tail(h);

            split_realloc(h, payload);

            assert_eq!((*h).size, payload);
            assert!((*h).next.is_null());
        }
    }
}
