//! Process-wide default configuration store.
//!
//! Two mutable settings, seeded from [`StackConfig`]'s constants and read
//! only at allocator-construction time: a later change affects only
//! allocators constructed after it, never existing instances.

use std::sync::atomic::{AtomicUsize, Ordering};

use framestack::StackConfig;

static DEFAULT_STACK_SIZE: AtomicUsize = AtomicUsize::new(StackConfig::DEFAULT_STACK_SIZE);
static DEFAULT_FRAME_COUNT: AtomicUsize = AtomicUsize::new(StackConfig::DEFAULT_FRAME_COUNT);

/// Current default backing-buffer size in bytes.
pub fn default_stack_size() -> usize {
    DEFAULT_STACK_SIZE.load(Ordering::Relaxed)
}

/// Set the default backing-buffer size for allocators constructed later.
///
/// # Panics
///
/// Panics if `bytes` is zero, so every config this store hands out is
/// valid by construction.
pub fn set_default_stack_size(bytes: usize) {
    assert!(bytes > 0, "default stack size must be positive");
    DEFAULT_STACK_SIZE.store(bytes, Ordering::Relaxed);
}

/// Current default frame-table capacity.
pub fn default_frame_count() -> usize {
    DEFAULT_FRAME_COUNT.load(Ordering::Relaxed)
}

/// Set the default frame-table capacity for allocators constructed later.
///
/// # Panics
///
/// Panics if `frames` is zero.
pub fn set_default_frame_count(frames: usize) {
    assert!(frames > 0, "default frame count must be positive");
    DEFAULT_FRAME_COUNT.store(frames, Ordering::Relaxed);
}

/// Snapshot the current defaults as a [`StackConfig`].
pub fn local_config() -> StackConfig {
    StackConfig {
        stack_size: default_stack_size(),
        frame_count: default_frame_count(),
    }
}
