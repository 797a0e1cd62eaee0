//! Stack-allocator error types.
//!
//! Every variant reports a programmer-usage error, not a transient
//! condition: the allocator never retries, logs, or truncates. State is
//! left unchanged by the failing call, so a caller that can recover (for
//! example by falling back to a heap allocation on [`StackError::OutOfSpace`])
//! may simply continue using the allocator.

use std::error::Error;
use std::fmt;

/// Errors that can occur during stack-allocator operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StackError {
    /// Construction-time misuse: zero buffer size, zero frame count, or a
    /// read-only backing buffer.
    InvalidConfig {
        /// Human-readable description of the rejected parameter.
        reason: String,
    },
    /// Alignment constraint that is zero or not a power of two.
    InvalidAlignment {
        /// The rejected alignment.
        alignment: usize,
    },
    /// The requested allocation does not fit before the buffer's capacity.
    ///
    /// The offset is unchanged; `remaining` tells the caller how much space
    /// was actually left so it can decide to free frames or go to the heap.
    OutOfSpace {
        /// Number of bytes requested.
        requested: usize,
        /// Alignment the request carried.
        alignment: usize,
        /// Bytes remaining before capacity at the time of the request.
        remaining: usize,
    },
    /// `pop()` was called with no pushed frames.
    Underflow,
    /// A bridged frame scope was used after its owning frame popped.
    ScopeClosed,
}

impl fmt::Display for StackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig { reason } => {
                write!(f, "invalid stack configuration: {reason}")
            }
            Self::InvalidAlignment { alignment } => {
                write!(
                    f,
                    "invalid alignment constraint: {alignment} (must be a non-zero power of two)"
                )
            }
            Self::OutOfSpace {
                requested,
                alignment,
                remaining,
            } => {
                write!(
                    f,
                    "stack out of space: requested {requested} bytes at alignment {alignment}, {remaining} bytes remaining"
                )
            }
            Self::Underflow => write!(f, "stack frame underflow"),
            Self::ScopeClosed => write!(f, "frame scope already closed"),
        }
    }
}

impl Error for StackError {}
