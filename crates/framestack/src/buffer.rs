//! The backing buffer: a fixed contiguous byte region the allocator slices.
//!
//! A [`BackingBuffer`] is exclusively owned by one
//! [`StackAllocator`](crate::StackAllocator) for that allocator's entire
//! lifetime; it is never shared between allocators. The heap block backing
//! the bytes does not move when the owner moves, so [`BackingBuffer::base_address`]
//! is stable and can participate in address-relative alignment arithmetic.

use crate::error::StackError;

/// A contiguous, fixed-capacity byte region with a writability flag.
pub struct BackingBuffer {
    data: Box<[u8]>,
    read_only: bool,
}

impl BackingBuffer {
    /// Allocate an auto-managed, zero-filled buffer of `byte_size` bytes.
    pub fn allocate(byte_size: usize) -> Result<Self, StackError> {
        if byte_size == 0 {
            return Err(StackError::InvalidConfig {
                reason: "stack size must be positive".into(),
            });
        }
        Ok(Self {
            data: vec![0u8; byte_size].into_boxed_slice(),
            read_only: false,
        })
    }

    /// Adopt caller-supplied storage as a writable buffer.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, StackError> {
        if bytes.is_empty() {
            return Err(StackError::InvalidConfig {
                reason: "backing buffer must not be empty".into(),
            });
        }
        Ok(Self {
            data: bytes.into_boxed_slice(),
            read_only: false,
        })
    }

    /// Adopt caller-supplied storage flagged read-only.
    ///
    /// Read-only buffers exist for interop descriptor use; a
    /// [`StackAllocator`](crate::StackAllocator) refuses them at construction.
    pub fn read_only(bytes: Vec<u8>) -> Result<Self, StackError> {
        let mut buffer = Self::from_bytes(bytes)?;
        buffer.read_only = true;
        Ok(buffer)
    }

    /// Total capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Base address of the buffer's first byte.
    ///
    /// Stable for the buffer's lifetime. Used only for alignment
    /// arithmetic and interop hand-off; this crate never fabricates a
    /// pointer from it.
    pub fn base_address(&self) -> usize {
        self.data.as_ptr() as usize
    }

    /// Whether this buffer was constructed read-only.
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// The full byte contents.
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// The full byte contents, mutably. `None` for read-only buffers.
    pub fn bytes_mut(&mut self) -> Option<&mut [u8]> {
        if self.read_only {
            None
        } else {
            Some(&mut self.data)
        }
    }

    /// Shared view of `[start, start + len)`.
    ///
    /// # Panics
    ///
    /// Panics if `start + len` exceeds the buffer's capacity.
    pub fn slice(&self, start: usize, len: usize) -> &[u8] {
        &self.data[start..start + len]
    }

    /// Mutable view of `[start, start + len)`.
    ///
    /// # Panics
    ///
    /// Panics if `start + len` exceeds the buffer's capacity or the buffer
    /// is read-only.
    pub fn slice_mut(&mut self, start: usize, len: usize) -> &mut [u8] {
        assert!(!self.read_only, "mutable slice of read-only buffer");
        &mut self.data[start..start + len]
    }
}
