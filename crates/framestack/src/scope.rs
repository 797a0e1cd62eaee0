//! Deferred-cleanup frame scopes (the arena bridge).
//!
//! A [`ScopeHandle`] binds the allocator's current frame to a
//! resource-scope interface: callers register cleanup actions (or re-bind
//! externally obtained memory ranges) against it, and the scope closes
//! exactly once — when the frame that created it pops. Deeper frames pushed
//! and popped in between do not close it.
//!
//! At most one scope is materialized per frame: repeated
//! [`StackAllocator::scope`](crate::StackAllocator::scope) calls within the
//! same frame return handles to the same underlying scope, so all cleanups
//! registered in a frame share a single reverse-registration close order.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::error::StackError;
use crate::region::ExternalRegion;

/// A deferred cleanup action, run when the owning frame pops.
pub type Cleanup = Box<dyn FnOnce()>;

struct ScopeState {
    closed: bool,
    cleanups: Vec<Cleanup>,
}

/// Handle to the deferred-cleanup scope of one allocator frame.
///
/// Cloning is cheap and shares the underlying scope. The handle outlives
/// its frame — holding one past the owning pop is allowed, but every
/// operation on it then fails with [`StackError::ScopeClosed`].
#[derive(Clone)]
pub struct ScopeHandle {
    inner: Rc<RefCell<ScopeState>>,
}

impl ScopeHandle {
    pub(crate) fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(ScopeState {
                closed: false,
                cleanups: Vec::new(),
            })),
        }
    }

    /// Register a cleanup action to run when the owning frame pops.
    ///
    /// Cleanups run in reverse-registration order.
    pub fn defer(&self, cleanup: impl FnOnce() + 'static) -> Result<(), StackError> {
        let mut state = self.inner.borrow_mut();
        if state.closed {
            return Err(StackError::ScopeClosed);
        }
        state.cleanups.push(Box::new(cleanup));
        Ok(())
    }

    /// Re-bind an externally obtained memory range to the owning frame.
    ///
    /// The optional cleanup runs when the owning frame pops — not when any
    /// deeper frame pops, and not later than the owning pop. The range is
    /// returned unchanged as the caller's handle to it.
    pub fn bind_external(
        &self,
        region: ExternalRegion,
        cleanup: Option<Cleanup>,
    ) -> Result<ExternalRegion, StackError> {
        {
            let mut state = self.inner.borrow_mut();
            if state.closed {
                return Err(StackError::ScopeClosed);
            }
            if let Some(cleanup) = cleanup {
                state.cleanups.push(cleanup);
            }
        }
        Ok(region)
    }

    /// Whether the owning frame has already popped.
    pub fn is_closed(&self) -> bool {
        self.inner.borrow().closed
    }

    /// Number of cleanups registered and not yet run.
    pub fn pending_cleanups(&self) -> usize {
        self.inner.borrow().cleanups.len()
    }

    /// Close the scope, running cleanups in reverse-registration order.
    ///
    /// Idempotent: a second close is a no-op. The `closed` flag is set
    /// before any cleanup runs, so a cleanup that touches the scope again
    /// observes it closed.
    pub(crate) fn close(&self) {
        let cleanups = {
            let mut state = self.inner.borrow_mut();
            if state.closed {
                return;
            }
            state.closed = true;
            std::mem::take(&mut state.cleanups)
        };
        // Borrow released above: cleanups may hold clones of this handle.
        for cleanup in cleanups.into_iter().rev() {
            cleanup();
        }
    }

    /// Whether two handles refer to the same underlying scope.
    pub(crate) fn ptr_eq(&self, other: &ScopeHandle) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for ScopeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.borrow();
        f.debug_struct("ScopeHandle")
            .field("closed", &state.closed)
            .field("pending_cleanups", &state.cleanups.len())
            .finish()
    }
}
