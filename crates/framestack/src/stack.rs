//! The stack allocator: bump allocation with nested save/restore frames.
//!
//! [`StackAllocator`] owns one [`BackingBuffer`] and tracks a single bump
//! offset into it. [`StackAllocator::push`] checkpoints the offset in a
//! growable frame table; [`StackAllocator::pop`] rewinds to the matching
//! checkpoint and closes any bridged scope created since that push.
//!
//! Alignment arithmetic is expressed relative to the buffer's base address
//! (`round_up(base + offset, alignment) - base`), so allocation placement is
//! correct whether the buffer backs a real addressable region handed to
//! foreign code or a plain in-process byte sequence.

use smallvec::SmallVec;

use crate::buffer::BackingBuffer;
use crate::config::StackConfig;
use crate::error::StackError;
use crate::region::Region;
use crate::scope::ScopeHandle;

/// One checkpoint: the offset at push time plus the bridged scope that was
/// current at that moment (if any).
#[derive(Clone, Default)]
struct Frame {
    offset: usize,
    scope: Option<ScopeHandle>,
}

/// Bump-pointer allocator over a fixed buffer, with LIFO frame checkpoints.
///
/// Not `Send` or `Sync`: one allocator belongs to one thread or task. All
/// operations are synchronous and non-blocking; errors are programmer-usage
/// errors and leave the allocator's state unchanged.
///
/// The frame table starts at the configured capacity and grows by 1.5x
/// (ceiling) whenever a push would exceed it, so push is amortized O(1).
/// Inline storage covers the default capacity of
/// [`StackConfig::DEFAULT_FRAME_COUNT`] without a heap allocation.
pub struct StackAllocator {
    buffer: BackingBuffer,
    offset: usize,
    frames: SmallVec<[Frame; StackConfig::DEFAULT_FRAME_COUNT]>,
    frame_index: usize,
    scope: Option<ScopeHandle>,
}

impl StackAllocator {
    /// Create an allocator over an explicit buffer with the given initial
    /// frame-table capacity.
    ///
    /// Fails with [`StackError::InvalidConfig`] if the buffer is read-only
    /// or `frame_count` is zero.
    pub fn with_buffer(buffer: BackingBuffer, frame_count: usize) -> Result<Self, StackError> {
        if buffer.is_read_only() {
            return Err(StackError::InvalidConfig {
                reason: "backing buffer is read-only".into(),
            });
        }
        if frame_count == 0 {
            return Err(StackError::InvalidConfig {
                reason: "frame count must be positive".into(),
            });
        }
        let mut frames = SmallVec::new();
        frames.resize(frame_count, Frame::default());
        Ok(Self {
            buffer,
            offset: 0,
            frames,
            frame_index: 0,
            scope: None,
        })
    }

    /// Create an allocator with an auto-managed buffer of `byte_size` bytes.
    pub fn with_capacity(byte_size: usize, frame_count: usize) -> Result<Self, StackError> {
        Self::with_buffer(BackingBuffer::allocate(byte_size)?, frame_count)
    }

    /// Create an allocator from a validated [`StackConfig`].
    pub fn new(config: StackConfig) -> Result<Self, StackError> {
        config.validate()?;
        Self::with_capacity(config.stack_size, config.frame_count)
    }

    /// Reserve `size` bytes at the next offset satisfying `alignment`.
    ///
    /// `alignment` must be a non-zero power of two. On success the bump
    /// offset advances to the end of the returned [`Region`]; on failure
    /// the offset is unchanged. The reserved bytes are NOT zeroed — only
    /// the range itself is guaranteed, non-overlapping with every other
    /// currently-live allocation. A `size` of zero is valid and reserves
    /// an empty region at the aligned cursor.
    pub fn allocate(&mut self, size: usize, alignment: usize) -> Result<Region, StackError> {
        if !alignment.is_power_of_two() {
            return Err(StackError::InvalidAlignment { alignment });
        }
        let base = self.buffer.base_address();
        // round_up(base + offset, alignment) - base, with overflow reported
        // as out-of-space (reachable only via a manually set pointer).
        let start = base
            .checked_add(self.offset)
            .and_then(|addr| addr.checked_add(alignment - 1))
            .map(|addr| (addr & !(alignment - 1)) - base)
            .ok_or_else(|| self.out_of_space(size, alignment))?;
        let end = start
            .checked_add(size)
            .ok_or_else(|| self.out_of_space(size, alignment))?;
        if end > self.buffer.capacity() {
            return Err(self.out_of_space(size, alignment));
        }
        self.offset = end;
        Ok(Region::new(start, size))
    }

    /// Reserve space for one value of type `T`, using `T`'s size and
    /// alignment. (`align_of::<T>()` is always a power of two.)
    pub fn allocate_for<T>(&mut self) -> Result<Region, StackError> {
        self.allocate(std::mem::size_of::<T>(), std::mem::align_of::<T>())
    }

    /// Reserve space through a bridged frame scope.
    ///
    /// Delegates to [`StackAllocator::allocate`]; fails with
    /// [`StackError::ScopeClosed`] once the scope's owning frame has popped.
    pub fn allocate_in(
        &mut self,
        scope: &ScopeHandle,
        size: usize,
        alignment: usize,
    ) -> Result<Region, StackError> {
        if scope.is_closed() {
            return Err(StackError::ScopeClosed);
        }
        self.allocate(size, alignment)
    }

    /// Push a frame: checkpoint the current offset and bridged scope.
    ///
    /// Grows the frame table to `ceil(len * 1.5)` first if it is full.
    /// Returns `self` to support chaining at acquisition sites.
    pub fn push(&mut self) -> &mut Self {
        if self.frame_index == self.frames.len() {
            let len = self.frames.len();
            self.frames.resize(len + len.div_ceil(2), Frame::default());
        }
        self.frames[self.frame_index] = Frame {
            offset: self.offset,
            scope: self.scope.clone(),
        };
        self.frame_index += 1;
        self
    }

    /// Pop the innermost frame, rewinding the offset to its checkpoint.
    ///
    /// If a bridged scope was created after that frame's push, it is closed
    /// here (running its deferred cleanups in reverse-registration order)
    /// before the checkpointed scope — possibly none, possibly an outer
    /// frame's — becomes current again. A scope already current at push
    /// time is restored without being closed.
    ///
    /// Fails with [`StackError::Underflow`] if no frame is pushed; state is
    /// unchanged in that case.
    pub fn pop(&mut self) -> Result<(), StackError> {
        if self.frame_index == 0 {
            return Err(StackError::Underflow);
        }
        self.frame_index -= 1;
        let frame = &mut self.frames[self.frame_index];
        self.offset = frame.offset;
        let saved = frame.scope.take();
        match (self.scope.take(), saved) {
            (Some(current), Some(saved)) => {
                if !current.ptr_eq(&saved) {
                    current.close();
                }
                self.scope = Some(saved);
            }
            (Some(current), None) => current.close(),
            (None, saved) => self.scope = saved,
        }
        Ok(())
    }

    /// The bridged scope of the current frame, creating it on first request.
    ///
    /// At most one scope is materialized per frame; repeated calls within
    /// the same frame return handles to the same scope. The scope closes
    /// when the frame that first requested it pops.
    pub fn scope(&mut self) -> ScopeHandle {
        self.scope.get_or_insert_with(ScopeHandle::new).clone()
    }

    /// Current capacity of the frame checkpoint table.
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Current nesting depth (number of pushed, un-popped frames).
    pub fn frame_index(&self) -> usize {
        self.frame_index
    }

    /// The current bump offset.
    pub fn stack_pointer(&self) -> usize {
        self.offset
    }

    /// Set the bump offset directly.
    ///
    /// Not validated here — an out-of-range pointer surfaces as
    /// [`StackError::OutOfSpace`] on the next allocation. The caller is
    /// responsible for not retaining regions issued past a rewound point.
    pub fn set_pointer(&mut self, pointer: usize) {
        self.offset = pointer;
    }

    /// Bytes remaining before capacity (zero if the pointer was manually
    /// set past capacity).
    pub fn remaining(&self) -> usize {
        self.buffer.capacity().saturating_sub(self.offset)
    }

    /// The backing buffer, for interop use outside the allocator's own
    /// slicing.
    pub fn buffer(&self) -> &BackingBuffer {
        &self.buffer
    }

    /// The backing buffer, mutably.
    pub fn buffer_mut(&mut self) -> &mut BackingBuffer {
        &mut self.buffer
    }

    /// Resolve a region to its bytes.
    ///
    /// # Panics
    ///
    /// Panics if the region does not lie within the buffer (possible only
    /// for regions fabricated against a different allocator).
    pub fn bytes(&self, region: Region) -> &[u8] {
        self.buffer.slice(region.start(), region.len())
    }

    /// Resolve a region to its bytes, mutably.
    ///
    /// # Panics
    ///
    /// Panics if the region does not lie within the buffer.
    pub fn bytes_mut(&mut self, region: Region) -> &mut [u8] {
        self.buffer.slice_mut(region.start(), region.len())
    }

    fn out_of_space(&self, requested: usize, alignment: usize) -> StackError {
        StackError::OutOfSpace {
            requested,
            alignment,
            remaining: self.remaining(),
        }
    }
}

impl Default for StackAllocator {
    fn default() -> Self {
        // The default config always passes validation.
        Self::new(StackConfig::default()).expect("default stack config is valid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn stack(capacity: usize, frame_count: usize) -> StackAllocator {
        StackAllocator::with_capacity(capacity, frame_count).unwrap()
    }

    #[test]
    fn with_buffer_rejects_read_only() {
        let buffer = BackingBuffer::read_only(vec![0; 64]).unwrap();
        assert!(matches!(
            StackAllocator::with_buffer(buffer, 8),
            Err(StackError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn with_buffer_rejects_zero_frame_count() {
        let buffer = BackingBuffer::allocate(64).unwrap();
        assert!(matches!(
            StackAllocator::with_buffer(buffer, 0),
            Err(StackError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn default_uses_config_defaults() {
        let stack = StackAllocator::default();
        assert_eq!(stack.buffer().capacity(), StackConfig::DEFAULT_STACK_SIZE);
        assert_eq!(stack.frame_count(), StackConfig::DEFAULT_FRAME_COUNT);
        assert_eq!(stack.stack_pointer(), 0);
    }

    #[test]
    fn allocate_rejects_bad_alignment() {
        let mut stack = stack(64, 4);
        for bad in [0usize, 3, 6, 12] {
            let result = stack.allocate(8, bad);
            assert_eq!(result, Err(StackError::InvalidAlignment { alignment: bad }));
        }
        assert_eq!(stack.stack_pointer(), 0);
    }

    #[test]
    fn zero_size_allocation_is_valid() {
        let mut stack = stack(64, 4);
        let region = stack.allocate(0, 1).unwrap();
        assert!(region.is_empty());
        assert_eq!(stack.stack_pointer(), 0);
    }

    #[test]
    fn pointer_set_and_rewind() {
        // Scenario: fresh stack at 0; set to 4; push; set to 8; pop back to 4.
        let mut stack = stack(64, 4);
        assert_eq!(stack.stack_pointer(), 0);
        stack.set_pointer(4);
        assert_eq!(stack.stack_pointer(), 4);
        stack.push();
        stack.set_pointer(8);
        assert_eq!(stack.stack_pointer(), 8);
        stack.pop().unwrap();
        assert_eq!(stack.stack_pointer(), 4);
    }

    #[test]
    fn aligned_allocation_walk() {
        // Interleaved sizes and alignments around a push/pop boundary.
        // Heap blocks from the system allocator are at least 16-aligned,
        // so the offsets below are exact.
        let mut stack = stack(64, 4);
        stack.allocate(4, 4).unwrap();
        assert_eq!(stack.stack_pointer(), 4);
        stack.allocate(4, 4).unwrap();
        assert_eq!(stack.stack_pointer(), 8);
        stack.allocate(1, 1).unwrap();
        assert_eq!(stack.stack_pointer(), 9);

        stack.push();
        let region = stack.allocate(4, 4).unwrap();
        assert_eq!(region.start(), 12);
        assert_eq!(stack.stack_pointer(), 16);
        stack.pop().unwrap();
        assert_eq!(stack.stack_pointer(), 9);

        let region = stack.allocate(4, 4).unwrap();
        assert_eq!(region.start(), 12);
        assert_eq!(stack.stack_pointer(), 16);
        let region = stack.allocate(8, 8).unwrap();
        assert_eq!(region.start(), 16);
        assert_eq!(stack.stack_pointer(), 24);
        stack.allocate(4, 4).unwrap();
        assert_eq!(stack.stack_pointer(), 28);
    }

    #[test]
    fn frame_table_growth_keeps_checkpoints() {
        // Push past capacity N, verify growth to ceil(N * 1.5), then pop
        // all N + 1 frames in order and hit underflow on one more.
        let n = 4;
        let mut stack = stack(256, n);
        assert_eq!(stack.frame_count(), n);

        let mut checkpoints = Vec::new();
        for i in 0..=n {
            checkpoints.push(stack.stack_pointer());
            stack.push();
            stack.allocate(i + 1, 1).unwrap();
        }
        assert_eq!(stack.frame_count(), 6); // 4 + ceil(4 / 2)
        assert_eq!(stack.frame_index(), n + 1);

        for expected in checkpoints.iter().rev() {
            stack.pop().unwrap();
            assert_eq!(stack.stack_pointer(), *expected);
        }
        assert_eq!(stack.pop(), Err(StackError::Underflow));
    }

    #[test]
    fn growth_from_single_frame_table() {
        let mut stack = stack(64, 1);
        stack.push();
        stack.push();
        assert_eq!(stack.frame_count(), 2); // 1 + ceil(1 / 2)
    }

    #[test]
    fn underflow_leaves_state_unchanged() {
        let mut stack = stack(64, 4);
        stack.allocate(8, 1).unwrap();
        assert_eq!(stack.pop(), Err(StackError::Underflow));
        assert_eq!(stack.stack_pointer(), 8);
        assert_eq!(stack.frame_index(), 0);
    }

    #[test]
    fn out_of_space_leaves_offset_unchanged() {
        let mut stack = stack(64, 4);
        let result = stack.allocate(65, 1);
        assert_eq!(
            result,
            Err(StackError::OutOfSpace {
                requested: 65,
                alignment: 1,
                remaining: 64,
            })
        );
        assert_eq!(stack.stack_pointer(), 0);
    }

    #[test]
    fn out_of_space_reports_remaining_after_partial_fill() {
        let mut stack = stack(64, 4);
        stack.allocate(40, 1).unwrap();
        let result = stack.allocate(40, 1);
        assert_eq!(
            result,
            Err(StackError::OutOfSpace {
                requested: 40,
                alignment: 1,
                remaining: 24,
            })
        );
        assert_eq!(stack.stack_pointer(), 40);
    }

    #[test]
    fn exact_fit_succeeds() {
        let mut stack = stack(64, 4);
        let region = stack.allocate(64, 1).unwrap();
        assert_eq!(region.len(), 64);
        assert_eq!(stack.remaining(), 0);
        assert!(matches!(
            stack.allocate(1, 1),
            Err(StackError::OutOfSpace { .. })
        ));
    }

    #[test]
    fn manually_set_pointer_fails_lazily() {
        let mut stack = stack(64, 4);
        stack.set_pointer(1000);
        assert_eq!(stack.stack_pointer(), 1000);
        assert_eq!(stack.remaining(), 0);
        assert!(matches!(
            stack.allocate(1, 1),
            Err(StackError::OutOfSpace { .. })
        ));
        // Rewinding forward-set pointers is the caller's business too.
        stack.set_pointer(0);
        assert!(stack.allocate(1, 1).is_ok());
    }

    #[test]
    fn zero_push_linear_mode() {
        // No frames at all: plain linear bump allocation.
        let mut stack = stack(32, 4);
        let a = stack.allocate(8, 1).unwrap();
        let b = stack.allocate(8, 1).unwrap();
        assert_eq!(a.end(), b.start());
        assert_eq!(stack.frame_index(), 0);
    }

    #[test]
    fn regions_resolve_to_disjoint_bytes() {
        let mut stack = stack(64, 4);
        let a = stack.allocate(4, 1).unwrap();
        let b = stack.allocate(4, 1).unwrap();
        stack.bytes_mut(a).copy_from_slice(&[1, 1, 1, 1]);
        stack.bytes_mut(b).copy_from_slice(&[2, 2, 2, 2]);
        assert_eq!(stack.bytes(a), &[1, 1, 1, 1]);
        assert_eq!(stack.bytes(b), &[2, 2, 2, 2]);
    }

    #[test]
    fn allocate_for_uses_type_layout() {
        let mut stack = stack(64, 4);
        stack.allocate(1, 1).unwrap();
        let region = stack.allocate_for::<u64>().unwrap();
        assert_eq!(region.len(), 8);
        let base = stack.buffer().base_address();
        assert_eq!((base + region.start()) % std::mem::align_of::<u64>(), 0);
    }

    #[test]
    fn push_returns_self_for_chaining() {
        let mut stack = stack(64, 4);
        let region = stack.push().allocate(8, 1).unwrap();
        assert_eq!(region.len(), 8);
        stack.pop().unwrap();
    }

    // ── scope bridging ──────────────────────────────

    #[test]
    fn scope_is_cached_within_a_frame() {
        let mut stack = stack(64, 4);
        stack.push();
        let a = stack.scope();
        let b = stack.scope();
        assert!(a.ptr_eq(&b));
        stack.pop().unwrap();
    }

    #[test]
    fn pop_closes_scope_created_in_frame() {
        let mut stack = stack(64, 4);
        let fired = Rc::new(Cell::new(0));
        stack.push();
        let scope = stack.scope();
        {
            let fired = Rc::clone(&fired);
            scope.defer(move || fired.set(fired.get() + 1)).unwrap();
        }
        stack.pop().unwrap();
        assert_eq!(fired.get(), 1);
        assert!(scope.is_closed());
        // Scenario E: unusable for allocation after the pop.
        assert_eq!(
            stack.allocate_in(&scope, 8, 1),
            Err(StackError::ScopeClosed)
        );
    }

    #[test]
    fn deeper_frames_do_not_close_outer_scope() {
        let mut stack = stack(64, 4);
        stack.push();
        let outer = stack.scope();
        stack.push();
        stack.pop().unwrap(); // inner frame never created a scope
        assert!(!outer.is_closed());
        stack.push();
        let inner = stack.scope();
        assert!(outer.ptr_eq(&inner)); // still the outer scope, cached across the push
        stack.pop().unwrap();
        assert!(!outer.is_closed()); // created before that push, so not closed by it
        stack.pop().unwrap();
        assert!(outer.is_closed());
    }

    #[test]
    fn sibling_frames_get_distinct_scopes() {
        let mut stack = stack(64, 4);
        stack.push();
        let first = stack.scope();
        stack.pop().unwrap();
        stack.push();
        let second = stack.scope();
        assert!(!first.ptr_eq(&second));
        assert!(first.is_closed());
        assert!(!second.is_closed());
        stack.pop().unwrap();
    }

    #[test]
    fn allocate_in_delegates_to_bump_allocation() {
        let mut stack = stack(64, 4);
        stack.push();
        let scope = stack.scope();
        let region = stack.allocate_in(&scope, 8, 4).unwrap();
        assert_eq!(stack.stack_pointer(), region.end());
        stack.pop().unwrap();
        assert_eq!(stack.stack_pointer(), 0);
    }

    #[test]
    fn scope_created_without_push_closes_on_enclosing_pop_only() {
        // Depth-zero scope: nothing ever pops it; it stays usable.
        let mut stack = stack(64, 4);
        let scope = stack.scope();
        stack.push();
        stack.pop().unwrap();
        assert!(!scope.is_closed());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn allocation_start_satisfies_alignment(
                prefix in 0usize..64,
                size in 0usize..128,
                pow in 0u32..6,
            ) {
                let mut stack = stack(1024, 4);
                stack.allocate(prefix, 1).unwrap();
                let alignment = 1usize << pow;
                let region = stack.allocate(size, alignment).unwrap();
                let base = stack.buffer().base_address();
                prop_assert_eq!((base + region.start()) % alignment, 0);
                prop_assert_eq!(stack.stack_pointer(), region.end());
            }

            #[test]
            fn aligned_offset_bumps_by_exactly_size(
                size in 0usize..64,
                pow in 0u32..5,
            ) {
                let alignment = 1usize << pow;
                let mut stack = stack(1024, 4);
                // Land the cursor on an aligned boundary first.
                stack.allocate(0, alignment).unwrap();
                let before = stack.stack_pointer();
                stack.allocate(size, alignment).unwrap();
                prop_assert_eq!(stack.stack_pointer(), before + size);
            }

            #[test]
            fn well_nested_push_pop_restores_offsets(
                allocs in proptest::collection::vec((0usize..32, 0u32..4), 1..24),
            ) {
                let mut stack = stack(65536, 4);
                let mut checkpoints = Vec::new();
                for &(size, pow) in &allocs {
                    checkpoints.push(stack.stack_pointer());
                    stack.push();
                    stack.allocate(size, 1 << pow).unwrap();
                }
                for expected in checkpoints.iter().rev() {
                    stack.pop().unwrap();
                    prop_assert_eq!(stack.stack_pointer(), *expected);
                }
                prop_assert_eq!(stack.pop(), Err(StackError::Underflow));
            }

            #[test]
            fn live_allocations_never_overlap(
                sizes in proptest::collection::vec(1usize..32, 1..16),
                pow in 0u32..4,
            ) {
                let mut stack = stack(4096, 4);
                let mut regions: Vec<Region> = Vec::new();
                for &size in &sizes {
                    regions.push(stack.allocate(size, 1 << pow).unwrap());
                }
                for pair in regions.windows(2) {
                    prop_assert!(pair[0].end() <= pair[1].start());
                }
            }

            #[test]
            fn table_growth_is_half_again_rounded_up(initial in 1usize..32) {
                let mut stack = stack(8192, initial);
                for _ in 0..=initial {
                    stack.push();
                }
                prop_assert_eq!(stack.frame_count(), initial + initial.div_ceil(2));
            }
        }
    }
}
