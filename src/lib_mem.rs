#![forbid(unsafe_code)]
#![deny(warnings)]
#![warn(clippy::pedantic)]

use tracing::warn;

/// Byte written into every position of the buffer. Non-zero so the kernel
/// cannot back the pages with the shared zero page.
pub const FILL_BYTE: u8 = 0xA5;

/// The single stress buffer. Replacing it frees the previous allocation.
#[derive(Debug, Default)]
pub struct MemoryBlock {
    buf: Vec<u8>,
}

impl MemoryBlock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Replace the buffer with one of `requested` bytes (clamped to `cap`)
    /// and touch every byte. Returns the applied size.
    ///
    /// Allocation failure aborts the process.
    pub fn set_size(&mut self, requested: usize, cap: Option<usize>) -> usize {
        let applied = match cap {
            Some(limit) if requested > limit => {
                warn!(requested, limit, "requested size exceeds limit, capping");
                limit
            }
            _ => requested,
        };
        // free first so old and new buffers never coexist
        self.buf = Vec::new();
        self.buf = vec![FILL_BYTE; applied];
        applied
    }

    pub fn release(&mut self) {
        self.buf = Vec::new();
    }

    /// True when every byte carries the fill pattern.
    pub fn is_touched(&self) -> bool {
        self.buf.iter().all(|b| *b == FILL_BYTE)
    }
}
