//! In-memory byte source.

use super::ByteSource;
use async_trait::async_trait;
use std::io;

/// A [`ByteSource`] over an owned byte vector.
///
/// Useful for stitching in-memory segments into a composite stream and as
/// a building block for tests.
#[derive(Debug)]
pub struct MemorySource {
    data: Vec<u8>,
    pos: usize,
}

impl MemorySource {
    /// Create a source over `data`, positioned at the start.
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            pos: 0,
        }
    }
}

#[async_trait]
impl ByteSource for MemorySource {
    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    async fn seek(&mut self, offset: u64) -> io::Result<()> {
        if offset > self.data.len() as u64 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("seek past end of source: {offset} > {}", self.data.len()),
            ));
        }
        self.pos = offset as usize;
        Ok(())
    }

    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = &self.data[self.pos..];
        let n = remaining.len().min(buf.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        self.pos += n;
        Ok(n)
    }

    async fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}
