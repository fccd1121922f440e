//! File-backed byte source.

use super::ByteSource;
use async_trait::async_trait;
use std::io::{self, SeekFrom};
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

/// A [`ByteSource`] over a file on disk.
///
/// The size is captured from file metadata at open time, satisfying the
/// query-once contract even if the file grows or shrinks afterwards.
#[derive(Debug)]
pub struct FileSource {
    file: File,
    size: u64,
}

impl FileSource {
    /// Open the file at `path` and capture its current size.
    pub async fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::open(path).await?;
        let size = file.metadata().await?.len();
        Ok(Self { file, size })
    }
}

#[async_trait]
impl ByteSource for FileSource {
    fn size(&self) -> u64 {
        self.size
    }

    async fn seek(&mut self, offset: u64) -> io::Result<()> {
        self.file.seek(SeekFrom::Start(offset)).await?;
        Ok(())
    }

    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf).await
    }

    async fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}
