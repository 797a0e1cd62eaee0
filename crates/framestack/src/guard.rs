//! RAII frame acquisition.
//!
//! Push/pop must be symmetric on every exit path, including early returns
//! and panics. [`FrameGuard`] is the scoped form: created by
//! [`StackAllocator::frame`], it pops exactly once when dropped.

use std::ops::{Deref, DerefMut};

use crate::stack::StackAllocator;

/// Guard for one pushed frame; pops on drop.
///
/// Dereferences to the underlying [`StackAllocator`], so allocation calls
/// go straight through the guard. Calling `pop` manually through the guard
/// unbalances the stack — use raw `push`/`pop` instead if manual control
/// is wanted.
#[must_use]
pub struct FrameGuard<'a> {
    stack: &'a mut StackAllocator,
}

impl StackAllocator {
    /// Push a frame and return a guard that pops it on drop.
    pub fn frame(&mut self) -> FrameGuard<'_> {
        self.push();
        FrameGuard { stack: self }
    }

    /// Run `f` inside a pushed frame, popping when it returns.
    pub fn with_frame<R>(&mut self, f: impl FnOnce(&mut StackAllocator) -> R) -> R {
        let mut guard = self.frame();
        f(&mut guard)
    }
}

impl Deref for FrameGuard<'_> {
    type Target = StackAllocator;

    fn deref(&self) -> &StackAllocator {
        self.stack
    }
}

impl DerefMut for FrameGuard<'_> {
    fn deref_mut(&mut self) -> &mut StackAllocator {
        self.stack
    }
}

impl Drop for FrameGuard<'_> {
    fn drop(&mut self) {
        // The push in `frame()` guarantees a matching frame, so this
        // cannot underflow.
        let _ = self.stack.pop();
    }
}
