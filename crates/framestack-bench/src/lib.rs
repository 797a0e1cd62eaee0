//! Benchmark workloads for the framestack allocator.
//!
//! Provides a reference staging workload shaped like a typical foreign-call
//! site: a handful of small, mixed-alignment allocations inside one frame.

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use framestack::{StackAllocator, StackError};

/// Argument layouts staged per simulated call: (size, alignment).
pub const CALL_ARGS: [(usize, usize); 5] = [(4, 4), (8, 8), (2, 2), (12, 4), (24, 8)];

/// Stage one simulated foreign call: push a frame, allocate [`CALL_ARGS`],
/// pop. Returns the offset reached before the rewind.
pub fn stage_call(stack: &mut StackAllocator) -> Result<usize, StackError> {
    stack.push();
    for (size, alignment) in CALL_ARGS {
        stack.allocate(size, alignment)?;
    }
    let high_water = stack.stack_pointer();
    stack.pop()?;
    Ok(high_water)
}
