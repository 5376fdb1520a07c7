//! The process-wide doubly-linked registry of every block ever handed out,
//! arena and mapped alike (spec §2/§4.2).
//!
//! New blocks are always appended at the tail; no ordering beyond that is
//! enforced here; arena insertion order equals address order purely because
//! the arena grows monotonically and callers only ever append a fresh arena
//! block at the current break.

use std::ptr;
use std::sync::atomic::Ordering;

use crate::block::Header;
use crate::state::HEAD;

/// The current registry head, or null if the registry is empty.
#[inline]
pub(crate) fn head() -> *mut Header {
    HEAD.load(Ordering::Relaxed)
}

/// Appends `block` to the tail of the registry.
///
/// # Safety
///
/// `block` must not already be linked into the registry.
pub(crate) unsafe fn insert_tail(block: *mut Header) {
    unsafe {
        (*block).next = ptr::null_mut();

        let head = HEAD.load(Ordering::Relaxed);
        if head.is_null() {
            (*block).prev = ptr::null_mut();
            HEAD.store(block, Ordering::Relaxed);
            return;
        }

        let mut tail = head;
        while !(*tail).next.is_null() {
            tail = (*tail).next;
        }
        (*tail).next = block;
        (*block).prev = tail;
    }
}

/// Splices `new_block` into the registry immediately after `after`.
///
/// # Safety
///
/// `after` must be currently linked into the registry; `new_block` must not
/// be.
pub(crate) unsafe fn insert_after(after: *mut Header, new_block: *mut Header) {
    unsafe {
        let following = (*after).next;
        (*new_block).prev = after;
        (*new_block).next = following;
        (*after).next = new_block;
        if !following.is_null() {
            (*following).prev = new_block;
        }
    }
}

/// Removes `block` from the registry, fixing up the head and both
/// neighbors.
///
/// # Safety
///
/// `block` must currently be linked into the registry.
pub(crate) unsafe fn unlink(block: *mut Header) {
    unsafe {
        let prev = (*block).prev;
        let next = (*block).next;

        if prev.is_null() {
            HEAD.store(next, Ordering::Relaxed);
        } else {
            (*prev).next = next;
        }

        if !next.is_null() {
            (*next).prev = prev;
        }

        (*block).next = ptr::null_mut();
        (*block).prev = ptr::null_mut();
    }
}

/// Walks to and returns the tail of the registry, or null if empty.
pub(crate) fn tail() -> *mut Header {
    let mut current = head();
    if current.is_null() {
        return current;
    }
    unsafe {
        while !(*current).next.is_null() {
            current = (*current).next;
        }
    }
    current
}

/// Walks from the head to check whether `block` is still linked into the
/// registry. Used as a defensive revalidation step before a nested call
/// mutates a block a caller is holding a raw pointer to (spec §4.4.4's
/// realloc-grow path).
pub(crate) fn contains(block: *mut Header) -> bool {
    let mut current = head();
    unsafe {
        while !current.is_null() {
            if current == block {
                return true;
            }
            current = (*current).next;
        }
    }
    false
}
