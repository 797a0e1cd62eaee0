//! Ambient allocator access for `framestack`.
//!
//! The core [`StackAllocator`](framestack::StackAllocator) reads no hidden
//! state; this crate is the optional convenience layer around it:
//!
//! - [`defaults`] — process-wide mutable default buffer size and frame
//!   count, read only when an allocator is constructed.
//! - [`registry`] — one lazily-constructed allocator per thread behind an
//!   explicit init/lookup/teardown contract.
//!
//! Because one allocator is handed out per thread and never shared, the
//! core's no-internal-synchronization rule holds without locking.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod defaults;
pub mod registry;

pub use defaults::{
    default_frame_count, default_stack_size, local_config, set_default_frame_count,
    set_default_stack_size,
};
pub use registry::{init_local, pop_local, push_local, teardown_local, with_local};
