//! Allocation handles.
//!
//! A [`Region`] describes one allocation as an offset range within the
//! backing buffer. Handles are plain values; resolving one to bytes goes
//! through the allocator, so no long-lived borrow into the buffer ever
//! exists.

use std::fmt;

/// One allocation: `[start, start + len)` within the backing buffer.
///
/// A region is logically invalidated when the frame it was allocated in
/// pops (or when the stack pointer is manually rewound past it); the
/// allocator does not track this, matching the LIFO discipline callers
/// already uphold.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[must_use]
pub struct Region {
    start: usize,
    len: usize,
}

impl Region {
    pub(crate) fn new(start: usize, len: usize) -> Self {
        Self { start, len }
    }

    /// Byte offset of the region's first byte within the buffer.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether this is a zero-length allocation.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Offset one past the region's last byte.
    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Region(start={}, len={})", self.start, self.len)
    }
}

/// An externally obtained memory range: raw address plus length.
///
/// Never dereferenced by this crate. Exists so a foreign range can be
/// re-bound to a frame scope via
/// [`ScopeHandle::bind_external`](crate::ScopeHandle::bind_external),
/// tying its cleanup to the owning frame's pop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExternalRegion {
    address: usize,
    len: usize,
}

impl ExternalRegion {
    /// Describe the range `[address, address + len)`.
    pub fn new(address: usize, len: usize) -> Self {
        Self { address, len }
    }

    /// The range's base address.
    pub fn address(&self) -> usize {
        self.address
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the range is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl fmt::Display for ExternalRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ExternalRegion(address={:#x}, len={})", self.address, self.len)
    }
}
