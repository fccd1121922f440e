//! Public façade: the concatenating, prefetching composite stream.

use crate::config::ChainConfig;
use crate::error::{ChainError, CloseError};
use crate::index::PrefixIndex;
use crate::prefetch::{self, Lifecycle, Shared, State, Terminal};
use crate::source::ByteSource;
use crate::window::Window;
use std::fmt;
use std::io::SeekFrom;
use std::sync::Arc;
use tokio::sync::{Mutex, Notify};
use tracing::{debug, trace};

/// A concatenating, seekable, asynchronously prefetching byte stream.
///
/// Presents an ordered collection of [`ByteSource`]s as one read-seek-close
/// handle: the length is the sum of the parts, the byte sequence is their
/// concatenation in declared order. A background prefetcher reads ahead of
/// the consumer into a bounded window of blocks, so consecutive reads are
/// served from memory while the next blocks are already in flight.
///
/// # Read contract
///
/// `read` fills the whole buffer unless the stream ends or a source fails:
/// a short `Ok(n)` means a terminal condition was reached after `n` bytes,
/// and the next call surfaces it — `Ok(0)` for end-of-stream,
/// [`ChainError::Source`] for a failure. Seeking inside the buffered window
/// reuses it; seeking outside discards it and redirects the prefetcher.
///
/// There is exactly one logical cursor. Methods take `&self` so that
/// `close` can race a blocked `read` (the one sanctioned concurrent call);
/// sharing a `ChainReader` between concurrent readers is not supported.
pub struct ChainReader {
    shared: Arc<Shared>,
    total_size: u64,
}

impl ChainReader {
    /// Create a composite stream over `sources` with the default window
    /// configuration.
    ///
    /// Each source's size is queried exactly once, here.
    pub fn new(sources: Vec<Box<dyn ByteSource>>) -> Self {
        Self::with_config(ChainConfig::new(), sources)
    }

    /// Create a composite stream with an explicit window configuration.
    ///
    /// Zero config values are substituted with their defaults.
    pub fn with_config(config: ChainConfig, sources: Vec<Box<dyn ByteSource>>) -> Self {
        let config = config.normalize();
        let index = PrefixIndex::new(sources.iter().map(|s| s.size()));
        let total_size = index.total_size();

        debug!(
            sources = sources.len(),
            total_size,
            buffers_num = config.buffers_num,
            block_size = config.block_size,
            "constructed chain reader"
        );

        let shared = Arc::new(Shared {
            index,
            block_size: config.block_size,
            state: Mutex::new(State {
                window: Window::new(config.buffers_num),
                abs_pos: 0,
                pf_pos: 0,
                pending_seek: false,
                lifecycle: Lifecycle::NotStarted,
                terminal: None,
                closed: false,
                pf_handle: None,
            }),
            data_ready: Notify::new(),
            slot_free: Notify::new(),
            sources: Mutex::new(sources),
        });

        Self { shared, total_size }
    }

    /// Total size of the composite stream in bytes.
    ///
    /// Cached at construction; sources are never re-queried.
    pub fn size(&self) -> u64 {
        self.total_size
    }

    /// Read bytes at the cursor into `buf`, advancing the cursor.
    ///
    /// Launches the prefetcher lazily on first use. An empty `buf` returns
    /// `Ok(0)` without touching any state; a read at end-of-stream returns
    /// `Ok(0)` without starting the prefetcher.
    pub async fn read(&self, buf: &mut [u8]) -> Result<usize, ChainError> {
        if buf.is_empty() {
            return Ok(0);
        }

        let mut st = self.shared.state.lock().await;
        if st.closed {
            return Err(ChainError::Closed);
        }
        if st.abs_pos == self.total_size {
            return Ok(0);
        }
        if st.lifecycle != Lifecycle::Running && st.terminal.is_none() {
            self.start_prefetch(&mut st);
        }

        let mut copied = 0;
        loop {
            let n = st.window.copy_from_head(&mut buf[copied..]);
            if n > 0 {
                copied += n;
                st.abs_pos += n as u64;
                // A head release may have freed a slot.
                self.shared.slot_free.notify_one();
                if copied == buf.len() || st.abs_pos == self.total_size {
                    trace!(n = copied, pos = st.abs_pos, "read served from window");
                    return Ok(copied);
                }
                continue;
            }

            // Window empty: surface a terminal signal or wait for a block.
            if let Some(terminal) = &st.terminal {
                match terminal {
                    Terminal::Eof => return Ok(copied),
                    Terminal::Failed { index, error } => {
                        if copied > 0 {
                            return Ok(copied);
                        }
                        return Err(ChainError::Source {
                            index: *index,
                            error: Arc::clone(error),
                        });
                    }
                }
            }

            drop(st);
            self.shared.data_ready.notified().await;
            st = self.shared.state.lock().await;
            if st.closed {
                return Err(ChainError::Closed);
            }
        }
    }

    /// Move the cursor, returning the new absolute position.
    ///
    /// Positions within the remaining buffered window are served from it
    /// without touching the sources; any other target discards the window,
    /// clears a sticky terminal signal and redirects the prefetcher, which
    /// seeks the underlying source before its next read. Seeking to the
    /// total size is valid and positions the cursor at end-of-stream.
    pub async fn seek(&self, pos: SeekFrom) -> Result<u64, ChainError> {
        let mut st = self.shared.state.lock().await;
        if st.closed {
            return Err(ChainError::Closed);
        }

        let target = match pos {
            SeekFrom::Start(offset) => i128::from(offset),
            SeekFrom::Current(delta) => i128::from(st.abs_pos) + i128::from(delta),
            SeekFrom::End(delta) => i128::from(self.total_size) + i128::from(delta),
        };
        if target < 0 || target > i128::from(self.total_size) {
            return Err(ChainError::SeekOutOfRange {
                position: target.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64,
                total_size: self.total_size,
            });
        }
        let target = target as u64;

        if st.window.seek_within(target) {
            trace!(target, "seek served from window");
        } else {
            st.window.reset_to(target);
            st.terminal = None;
            st.pf_pos = target;
            st.pending_seek = true;
            trace!(target, "seek reset prefetch window");
        }
        st.abs_pos = target;
        // Blocks may have been released either way; let the producer refill.
        self.shared.slot_free.notify_one();

        Ok(target)
    }

    /// Close the composite stream, releasing every source.
    ///
    /// Waits for the prefetcher to finish its in-flight work and exit, then
    /// closes the sources in declared order, aggregating their failures
    /// into a single [`CloseError`]. Idempotent: a second call returns
    /// `Ok(())`.
    pub async fn close(&self) -> Result<(), ChainError> {
        let handle = {
            let mut st = self.shared.state.lock().await;
            if st.closed {
                return Ok(());
            }
            st.closed = true;
            // Wake both parties: the producer observes the flag at its next
            // control point, a blocked read fails with `Closed`.
            self.shared.slot_free.notify_one();
            self.shared.data_ready.notify_one();
            st.pf_handle.take()
        };

        if let Some(handle) = handle {
            if let Err(error) = handle.await {
                debug!(%error, "prefetch task did not shut down cleanly");
            }
        }

        let mut sources = self.shared.sources.lock().await;
        let mut errors = Vec::new();
        for (index, source) in sources.iter_mut().enumerate() {
            if let Err(error) = source.close().await {
                debug!(source = index, %error, "source close failed");
                errors.push((index, error));
            }
        }
        debug!(sources = sources.len(), failures = errors.len(), "chain reader closed");

        if errors.is_empty() {
            Ok(())
        } else {
            Err(CloseError::new(errors).into())
        }
    }

    /// Launch the prefetch task from the consumer cursor. Caller holds the
    /// state lock.
    fn start_prefetch(&self, st: &mut State) {
        st.pf_pos = st.abs_pos;
        st.pending_seek = true;
        st.lifecycle = Lifecycle::Running;
        st.pf_handle = Some(tokio::spawn(prefetch::run(Arc::clone(&self.shared))));
        trace!(pos = st.pf_pos, "prefetcher launched");
    }
}

impl fmt::Debug for ChainReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainReader")
            .field("total_size", &self.total_size)
            .finish_non_exhaustive()
    }
}

impl Drop for ChainReader {
    fn drop(&mut self) {
        // Best-effort: stop a producer that is still running so it does not
        // outlive the handle. Sources are not closed here; that is the job
        // of `close`.
        if let Ok(mut st) = self.shared.state.try_lock() {
            st.closed = true;
            if let Some(handle) = st.pf_handle.take() {
                handle.abort();
            }
        }
        self.shared.slot_free.notify_one();
        self.shared.data_ready.notify_one();
    }
}
