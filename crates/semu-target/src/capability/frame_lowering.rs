//! Stack frame layout.
//!
//! A call pushes the return address and the caller's `fp`, then sets
//! `fp = sp`. The stack grows towards higher addresses, so locals live at
//! non-negative offsets from `fp`. An interrupt additionally saves `ip`,
//! `r0`..`r7` and `fp` before entering the handler.

use std::fmt;

use crate::isa::{IsaModel, WORD_SIZE};

/// Frame layout queries used by prologue/epilogue insertion.
pub trait FrameLowering: fmt::Debug + Send + Sync {
    /// Whether pushes move the stack pointer to higher addresses.
    fn stack_grows_up(&self) -> bool;

    /// Required stack alignment in bytes.
    fn stack_alignment(&self) -> u32;

    /// Bytes pushed by a call before the callee's frame starts.
    fn call_frame_overhead(&self) -> u32;

    /// Bytes pushed on interrupt entry.
    fn interrupt_frame_size(&self) -> u32;

    /// Offset of the first local slot from the frame pointer.
    fn local_area_offset(&self) -> i32;

    /// Whether every function keeps a frame pointer.
    fn has_frame_pointer(&self) -> bool;

    /// Round `size` up to the stack alignment, or `None` if the result
    /// does not fit in a `u32`.
    fn align_stack_size(&self, size: u32) -> Option<u32> {
        size.checked_next_multiple_of(self.stack_alignment())
    }
}

/// Frame lowering for the Semu call convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SemuFrameLowering {
    stack_alignment: u32,
    interrupt_frame_size: u32,
}

impl SemuFrameLowering {
    /// Frame lowering with the given stack alignment in bytes.
    pub fn new(isa: &IsaModel, stack_alignment: u32) -> Self {
        // ip + every gpr + fp
        let saved = 1 + isa.gp_register_count() + 1;
        Self {
            stack_alignment,
            interrupt_frame_size: saved * isa.word_size_bytes(),
        }
    }
}

impl FrameLowering for SemuFrameLowering {
    fn stack_grows_up(&self) -> bool {
        true
    }

    fn stack_alignment(&self) -> u32 {
        self.stack_alignment
    }

    fn call_frame_overhead(&self) -> u32 {
        2 * WORD_SIZE
    }

    fn interrupt_frame_size(&self) -> u32 {
        self.interrupt_frame_size
    }

    fn local_area_offset(&self) -> i32 {
        0
    }

    fn has_frame_pointer(&self) -> bool {
        true
    }
}
