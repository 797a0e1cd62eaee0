//! The thread-local allocator registry.
//!
//! Hands back the same [`StackAllocator`] for the same thread across calls,
//! constructing it lazily from the [`defaults`](crate::defaults) store on
//! first touch. Explicit [`init_local`] pins a non-default configuration;
//! [`teardown_local`] drops the instance so the thread can start over.

use std::cell::RefCell;

use framestack::{StackAllocator, StackConfig, StackError};

use crate::defaults;

thread_local! {
    static LOCAL: RefCell<Option<StackAllocator>> = const { RefCell::new(None) };
}

/// Eagerly construct this thread's allocator from an explicit config.
///
/// Fails with [`StackError::InvalidConfig`] if the config is invalid or the
/// thread's allocator already exists (initialize before first use, or call
/// [`teardown_local`] first).
pub fn init_local(config: StackConfig) -> Result<(), StackError> {
    LOCAL.with(|slot| {
        let mut slot = slot.borrow_mut();
        if slot.is_some() {
            return Err(StackError::InvalidConfig {
                reason: "local allocator already initialized for this thread".into(),
            });
        }
        *slot = Some(StackAllocator::new(config)?);
        Ok(())
    })
}

/// Run `f` with this thread's allocator, constructing it on first touch.
///
/// The same instance is handed back for the same thread across calls.
/// `f` must not itself call into the registry; re-entrant access panics.
pub fn with_local<R>(f: impl FnOnce(&mut StackAllocator) -> R) -> R {
    LOCAL.with(|slot| {
        let mut slot = slot.borrow_mut();
        let stack = slot.get_or_insert_with(|| {
            // The defaults store rejects zero values at set time.
            StackAllocator::new(defaults::local_config())
                .expect("default store only hands out valid configs")
        });
        f(stack)
    })
}

/// Push a frame on this thread's allocator.
pub fn push_local() {
    with_local(|stack| {
        stack.push();
    });
}

/// Pop a frame on this thread's allocator.
pub fn pop_local() -> Result<(), StackError> {
    with_local(|stack| stack.pop())
}

/// Drop this thread's allocator, if any. The next access re-initializes.
pub fn teardown_local() {
    LOCAL.with(|slot| {
        *slot.borrow_mut() = None;
    });
}
