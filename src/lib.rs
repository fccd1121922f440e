//! chainflow - a concatenating, seekable byte stream with asynchronous
//! prefetch.
//!
//! An ordered collection of sized, seekable, closeable sources is presented
//! as one read-seek-close handle whose length is the sum of the parts and
//! whose byte sequence is their concatenation. A background task prefetches
//! blocks from the active source into a bounded in-memory window, so the
//! consumer reads from memory while the next blocks are already in flight.
//!
//! # Architecture
//!
//! - [`ByteSource`]: the capability contract a source must satisfy, with
//!   [`MemorySource`] and [`FileSource`] as ready-made adapters
//! - [`ChainConfig`]: window dimensions (block count and block size)
//! - [`ChainReader`]: the public façade owning the sources, the window and
//!   the prefetch task
//!
//! The prefetcher applies backpressure: it suspends once the window holds
//! `buffers_num` blocks and resumes as reads drain them. Seeks within the
//! buffered window are served from memory; seeks outside discard the
//! window and redirect the prefetcher to the new position.
//!
//! # Example
//!
//! ```ignore
//! use chainflow::{ChainReader, FileSource};
//! use std::io::SeekFrom;
//!
//! let part0 = FileSource::open("part-000.bin").await?;
//! let part1 = FileSource::open("part-001.bin").await?;
//! let reader = ChainReader::new(vec![Box::new(part0), Box::new(part1)]);
//!
//! let mut buf = vec![0u8; 4096];
//! let n = reader.read(&mut buf).await?;
//!
//! // Revisit the first bytes of the second part.
//! reader.seek(SeekFrom::Start(part0_size)).await?;
//! reader.read(&mut buf).await?;
//!
//! reader.close().await?;
//! ```

pub mod config;
pub mod error;
pub mod reader;
pub mod source;

mod index;
mod prefetch;
mod window;

pub use config::{ChainConfig, DEFAULT_BLOCK_SIZE, DEFAULT_BUFFERS_NUM};
pub use error::{ChainError, CloseError};
pub use reader::ChainReader;
pub use source::{ByteSource, FileSource, MemorySource};
