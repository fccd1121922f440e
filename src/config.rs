//! Prefetch window configuration.

use serde::{Deserialize, Serialize};

/// Default number of blocks in the prefetch window.
pub const DEFAULT_BUFFERS_NUM: usize = 4;

/// Default size of one prefetch block in bytes (1 MiB).
pub const DEFAULT_BLOCK_SIZE: usize = 1024 * 1024;

/// Configuration for the prefetch window of a [`ChainReader`](crate::ChainReader).
///
/// The window holds up to `buffers_num` blocks of up to `block_size` bytes
/// each, bounding the memory the prefetcher may run ahead of the consumer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Number of blocks in the prefetch window (default: 4).
    ///
    /// A zero value stands in for the default. Higher values let the
    /// prefetcher run further ahead at the cost of memory.
    #[serde(default = "default_buffers_num")]
    pub buffers_num: usize,

    /// Size of one prefetch block in bytes (default: 1 MiB).
    ///
    /// A zero value stands in for the default. Blocks near source
    /// boundaries may be shorter.
    #[serde(default = "default_block_size")]
    pub block_size: usize,
}

fn default_buffers_num() -> usize {
    DEFAULT_BUFFERS_NUM
}

fn default_block_size() -> usize {
    DEFAULT_BLOCK_SIZE
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            buffers_num: default_buffers_num(),
            block_size: default_block_size(),
        }
    }
}

impl ChainConfig {
    /// Create a configuration with default window dimensions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of blocks in the prefetch window.
    pub fn with_buffers_num(mut self, buffers_num: usize) -> Self {
        self.buffers_num = buffers_num;
        self
    }

    /// Set the size of one prefetch block in bytes.
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    /// Resolve zero values to their defaults.
    pub(crate) fn normalize(mut self) -> Self {
        if self.buffers_num == 0 {
            self.buffers_num = DEFAULT_BUFFERS_NUM;
        }
        if self.block_size == 0 {
            self.block_size = DEFAULT_BLOCK_SIZE;
        }
        self
    }
}
