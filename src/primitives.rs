//! The two kernel memory sources, and the page-size query.
//!
//! Everything in this module is a thin, fatal-on-failure wrapper around
//! `libc`. None of it validates its arguments; callers in [`crate::arena`]
//! and [`crate::api`] are responsible for only ever asking for already
//! `ALIGN`-rounded byte counts.

use std::ffi::c_void;
use std::ptr;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Prints a diagnostic and aborts the process.
///
/// This is the only error path the allocator has for kernel primitive
/// failure (spec: "fatal... diagnostic to standard error, process
/// termination"). There is no recovery: an `sbrk`/`mmap`/`munmap` failure
/// means the process's memory model is no longer trustworthy.
#[cold]
fn fatal(what: &str) -> ! {
    eprintln!("hallocator: {what} failed, aborting");
    std::process::abort();
}

/// Extends the program break by `n` bytes and returns the start of the new
/// region (i.e. the *old* break).
///
/// Fatal if the kernel reports failure (`sbrk` returning `(void*)-1`).
pub(crate) fn sbrk_bytes(n: usize) -> *mut u8 {
    let old_break = unsafe { libc::sbrk(n as libc::intptr_t) };
    if old_break == usize::MAX as *mut c_void {
        fatal("sbrk");
    }
    old_break as *mut u8
}

/// Requests a private anonymous read/write mapping of `n` bytes.
///
/// Fatal on failure.
pub(crate) fn mmap_bytes(n: usize) -> *mut u8 {
    let addr = unsafe {
        libc::mmap(
            ptr::null_mut(),
            n,
            libc::PROT_READ | libc::PROT_WRITE,
            libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
            -1,
            0,
        )
    };
    if addr == libc::MAP_FAILED {
        fatal("mmap");
    }
    addr as *mut u8
}

/// Releases a mapping previously returned by [`mmap_bytes`].
///
/// Fatal on failure.
pub(crate) fn munmap_bytes(p: *mut u8, n: usize) {
    let rc = unsafe { libc::munmap(p as *mut c_void, n) };
    if rc != 0 {
        fatal("munmap");
    }
}

static PAGE_SIZE: AtomicUsize = AtomicUsize::new(0);

/// Returns the runtime page size, querying and caching it on first use.
pub(crate) fn page_size() -> usize {
    let cached = PAGE_SIZE.load(Ordering::Relaxed);
    if cached != 0 {
        return cached;
    }
    let queried = unsafe { libc::sysconf(libc::_SC_PAGESIZE) } as usize;
    PAGE_SIZE.store(queried, Ordering::Relaxed);
    queried
}
