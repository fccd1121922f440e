//! Bounded FIFO window of prefetched blocks.

use std::collections::VecDeque;

/// Bounded FIFO of byte blocks, filled by the prefetcher and drained by
/// reads.
///
/// The buffered bytes always form one contiguous run of absolute offsets:
/// `head_abs` is the offset of the first byte of the head block and
/// `consumed_in_head` counts head-block bytes already surrendered to the
/// consumer, so the effective cursor sits at `head_abs + consumed_in_head`.
/// A fully drained head block is released and never referenced again.
#[derive(Debug)]
pub(crate) struct Window {
    blocks: VecDeque<Vec<u8>>,
    head_abs: u64,
    consumed_in_head: usize,
    max_blocks: usize,
}

impl Window {
    pub(crate) fn new(max_blocks: usize) -> Self {
        Self {
            blocks: VecDeque::with_capacity(max_blocks),
            head_abs: 0,
            consumed_in_head: 0,
            max_blocks,
        }
    }

    pub(crate) fn is_full(&self) -> bool {
        self.blocks.len() >= self.max_blocks
    }

    /// Absolute offset one past the last buffered byte.
    fn end_abs(&self) -> u64 {
        self.head_abs + self.blocks.iter().map(|b| b.len() as u64).sum::<u64>()
    }

    /// Copy bytes from the head of the window into `dst`.
    ///
    /// Returns the number of bytes copied; zero means the window is empty.
    /// A fully drained head block is released, advancing `head_abs`.
    pub(crate) fn copy_from_head(&mut self, dst: &mut [u8]) -> usize {
        let Some(head) = self.blocks.front() else {
            return 0;
        };
        let remaining = &head[self.consumed_in_head..];
        let to_copy = remaining.len().min(dst.len());
        dst[..to_copy].copy_from_slice(&remaining[..to_copy]);
        self.consumed_in_head += to_copy;
        if self.consumed_in_head == head.len() {
            self.release_head();
        }
        to_copy
    }

    /// Append a block at the tail. Blocks are never empty and the caller
    /// has already checked `is_full`.
    pub(crate) fn append(&mut self, block: Vec<u8>) {
        debug_assert!(!block.is_empty());
        debug_assert!(!self.is_full());
        self.blocks.push_back(block);
    }

    /// Reposition the effective cursor to `target` when it lies within the
    /// remaining buffered span, releasing blocks passed over on the way.
    ///
    /// Returns `false` when `target` is outside the window and a prefetch
    /// reset is required. The window end is considered inside: the
    /// producer's next block lands exactly there. Positions already
    /// surrendered are outside; seeking backwards always resets.
    pub(crate) fn seek_within(&mut self, target: u64) -> bool {
        if target < self.head_abs + self.consumed_in_head as u64 || target > self.end_abs() {
            return false;
        }
        while let Some(head) = self.blocks.front() {
            let head_end = self.head_abs + head.len() as u64;
            if target < head_end {
                self.consumed_in_head = (target - self.head_abs) as usize;
                return true;
            }
            self.release_head();
        }
        // Drained the whole window: target equals the old end.
        self.head_abs = target;
        self.consumed_in_head = 0;
        true
    }

    /// Drop every buffered block and restart the window at `target`.
    pub(crate) fn reset_to(&mut self, target: u64) {
        self.blocks.clear();
        self.head_abs = target;
        self.consumed_in_head = 0;
    }

    fn release_head(&mut self) {
        if let Some(block) = self.blocks.pop_front() {
            self.head_abs += block.len() as u64;
            self.consumed_in_head = 0;
        }
    }
}
