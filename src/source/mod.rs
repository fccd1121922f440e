//! Source abstraction and concrete adapters.
//!
//! A [`ByteSource`] is a sized, seekable, closeable byte stream. The
//! composite owns its sources exclusively: it queries the size exactly once
//! at construction, drives `read`/`seek` only from its background
//! prefetcher, and invokes `close` once per source when it closes.

mod file;
mod memory;

pub use file::FileSource;
pub use memory::MemorySource;

use async_trait::async_trait;
use std::io;

/// Capability contract of an underlying source.
#[async_trait]
pub trait ByteSource: Send {
    /// Total size of this source in bytes. Must be stable; the composite
    /// reads it once at construction and never again.
    fn size(&self) -> u64;

    /// Move the internal cursor to `offset` bytes from the start of the
    /// source. `offset` is within `[0, size]`.
    async fn seek(&mut self, offset: u64) -> io::Result<()>;

    /// Read from the internal cursor into `buf`, advancing the cursor.
    ///
    /// Short reads are permitted. `Ok(0)` on a non-empty `buf` signals
    /// exhaustion; any error is terminal for the composite stream.
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Release the source's resources.
    async fn close(&mut self) -> io::Result<()>;
}
