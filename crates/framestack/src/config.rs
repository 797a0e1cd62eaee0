//! Stack configuration parameters.

use crate::error::StackError;

/// Configuration for a [`StackAllocator`](crate::StackAllocator).
///
/// An explicit value passed to [`StackAllocator::new`](crate::StackAllocator::new);
/// the core never reads global state. Process-wide mutable defaults, when
/// wanted, live in the `framestack-local` crate and are snapshotted into a
/// `StackConfig` at construction time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StackConfig {
    /// Size of the backing buffer in bytes.
    ///
    /// Default: 65536 (64 KiB). Must be positive.
    pub stack_size: usize,

    /// Initial capacity of the frame checkpoint table.
    ///
    /// Default: 8. Must be positive. The table grows by 1.5x when a push
    /// exceeds it, so this is a starting point, not a limit.
    pub frame_count: usize,
}

impl StackConfig {
    /// Default backing-buffer size: 64 KiB.
    pub const DEFAULT_STACK_SIZE: usize = 64 * 1024;

    /// Default frame-table capacity.
    pub const DEFAULT_FRAME_COUNT: usize = 8;

    /// Create a config with the given buffer size and the default frame count.
    pub fn new(stack_size: usize) -> Self {
        Self {
            stack_size,
            frame_count: Self::DEFAULT_FRAME_COUNT,
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), StackError> {
        if self.stack_size == 0 {
            return Err(StackError::InvalidConfig {
                reason: "stack size must be positive".into(),
            });
        }
        if self.frame_count == 0 {
            return Err(StackError::InvalidConfig {
                reason: "frame count must be positive".into(),
            });
        }
        Ok(())
    }
}

impl Default for StackConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_STACK_SIZE)
    }
}
