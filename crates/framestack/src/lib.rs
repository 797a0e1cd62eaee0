//! Bump-pointer stack allocation with nested save/restore frames.
//!
//! A [`StackAllocator`] slices a fixed [`BackingBuffer`] with a single bump
//! cursor. Pushing a frame checkpoints the cursor; popping rewinds it. The
//! intended use is short-lived native-memory staging in interop-heavy code
//! paths (scalars and structs handed to foreign calls) without a heap
//! allocation per call.
//!
//! # Architecture
//!
//! ```text
//! StackAllocator (core)
//! ├── BackingBuffer (exclusively owned, fixed base + capacity)
//! ├── SmallVec<[Frame; 8]> (checkpoint table, grows 1.5x on push)
//! ├── Option<ScopeHandle> (at most one bridged scope per frame)
//! └── FrameGuard (RAII push/pop)
//! ```
//!
//! Allocations return [`Region`] handles (offset + length) rather than
//! long-lived borrows into the buffer; resolve them with
//! [`StackAllocator::bytes`] / [`StackAllocator::bytes_mut`].
//!
//! # Push and pop
//!
//! Push and pop must be symmetric. Prefer [`StackAllocator::frame`] (an RAII
//! guard) or [`StackAllocator::with_frame`] over raw `push`/`pop` so the
//! rewind runs on every exit path. Using the allocator with zero pushes is a
//! supported mode: it degenerates to a plain linear bump allocator.
//!
//! # Thread model
//!
//! A `StackAllocator` carries no internal synchronization and is not `Send`
//! or `Sync`; it must be exclusively owned by one thread or task. The
//! `framestack-local` crate provides one allocator per thread for callers
//! that want an ambient instance.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod buffer;
pub mod config;
pub mod error;
pub mod guard;
pub mod region;
pub mod scope;
pub mod stack;

// Public re-exports for the primary API surface.
pub use buffer::BackingBuffer;
pub use config::StackConfig;
pub use error::StackError;
pub use guard::FrameGuard;
pub use region::{ExternalRegion, Region};
pub use scope::{Cleanup, ScopeHandle};
pub use stack::StackAllocator;
