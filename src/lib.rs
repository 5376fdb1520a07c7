//! # hallocator — a userspace general-purpose heap allocator
//!
//! This crate manually manages virtual memory obtained from the operating
//! system. It exposes three allocation primitives — allocate, free,
//! reallocate — plus a zero-initializing allocate, and decides per request
//! whether to carve memory out of a contiguous program-break arena or to ask
//! the kernel for an independent page-aligned `mmap` region.
//!
//! ## Crate Structure
//!
//! ```text
//!   hallocator
//!   ├── align        - the ALIGN=8 constant and its rounding function
//!   ├── primitives    - sbrk/mmap/munmap/page-size, fatal on kernel failure
//!   ├── block         - the Header record prefixed to every block
//!   ├── registry       - the process-wide doubly-linked block list
//!   ├── arena          - coalesce, best-fit search + split, tail extension
//!   ├── api            - os_malloc/os_free/os_calloc/os_realloc
//!   └── global_alloc    - an optional std::alloc::GlobalAlloc adapter
//! ```
//!
//! ## How It Works
//!
//! ```text
//!   Program Memory Layout:
//!
//!   High Address ┌─────────────────────┐
//!                │       Stack         │ ↓ grows down
//!                │         │           │
//!                │         ▼           │
//!                │                     │
//!                │         ▲           │
//!                │         │           │
//!                │      Arena          │ ↑ grows up (sbrk)
//!                ├─────────────────────┤ ← Program Break
//!                │   Uninitialized     │
//!                │       Data          │
//!                ├─────────────────────┤
//!                │   Initialized       │
//!                │       Data          │
//!                ├─────────────────────┤
//!                │       Text          │
//!   Low Address  └─────────────────────┘
//! ```
//!
//! Requests below [`arena::MMAP_THRESHOLD`] (or [`primitives::page_size`]
//! for zero-initializing allocations) are served out of the arena; larger
//! requests get their own independent `mmap` region:
//!
//! ```text
//!   Single arena block:
//!   ┌───────────────────────┬────────────────────────────────┐
//!   │    Block Header       │         User Data              │
//!   │  ┌─────────────────┐  │                                │
//!   │  │ size            │  │  ┌──────────────────────────┐  │
//!   │  │ status: Alloc   │  │  │                          │  │
//!   │  │ next / prev     │  │  │     size bytes usable    │  │
//!   │  └─────────────────┘  │  │                          │  │
//!   └───────────────────────┴────────────────────────────────┘
//!                           ▲
//!                           └── pointer returned to the caller
//! ```
//!
//! Freed arena blocks are not returned to the OS; they're marked `Free` and
//! reused by a later allocation's coalesce → best-fit → split → tail-extend
//! pipeline (see [`arena`]). Freed mapped blocks are `munmap`ped immediately.
//!
//! ## Limitations
//!
//! - **Single-threaded only**: no internal synchronization. Multi-threaded
//!   callers must provide their own external mutual exclusion.
//! - **No arena shrinking**: the program break only ever grows.
//! - **No defragmentation** beyond adjacent-block coalescing.
//! - **8-byte alignment only**: nothing stricter is supported.
//!
//! ## Safety
//!
//! This crate is inherently unsafe: it manages raw memory manually and
//! trusts that pointers passed to [`api::os_free`] and [`api::os_realloc`]
//! were returned by this same allocator and not yet freed in a way it
//! can't detect.

pub mod align;
pub(crate) mod arena;
pub(crate) mod block;
pub mod global_alloc;
pub(crate) mod primitives;
pub(crate) mod registry;
pub(crate) mod state;
#[doc(hidden)]
pub mod testing;

mod api;

pub use api::{os_calloc, os_free, os_malloc, os_realloc};
pub use global_alloc::SystemHeap;
