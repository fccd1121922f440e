//! Background prefetch task.
//!
//! A single producer walks the logical stream ahead of the consumer,
//! seeking and reading the active source and publishing blocks into the
//! shared window until the window is full (backpressure), the stream is
//! exhausted, a source fails, or the handle closes.
//!
//! Every iteration starts with a control point under the state lock: the
//! producer observes close and pending-seek signals there, and again right
//! after each source I/O so that a block read for an abandoned position is
//! discarded instead of published. Source I/O itself always runs with the
//! state lock released.

use crate::index::PrefixIndex;
use crate::source::ByteSource;
use crate::window::Window;
use std::io;
use std::sync::Arc;
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

/// Why the producer stopped: global end-of-stream or a source failure.
///
/// Sticky once set; only a seek outside the buffered window clears it.
#[derive(Debug, Clone)]
pub(crate) enum Terminal {
    Eof,
    Failed { index: usize, error: Arc<io::Error> },
}

/// Producer lifecycle. `Stopped` is re-entered on every producer exit so
/// that a later out-of-window seek can relaunch it lazily.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Lifecycle {
    NotStarted,
    Running,
    Stopped,
}

/// Mutable state shared between the façade and the prefetch task.
#[derive(Debug)]
pub(crate) struct State {
    pub(crate) window: Window,
    /// Consumer cursor: absolute position of the next byte a read returns.
    pub(crate) abs_pos: u64,
    /// Producer restart position, consumed together with `pending_seek`.
    pub(crate) pf_pos: u64,
    /// Instructs the producer to abandon in-flight work and restart at
    /// `pf_pos`.
    pub(crate) pending_seek: bool,
    pub(crate) lifecycle: Lifecycle,
    pub(crate) terminal: Option<Terminal>,
    pub(crate) closed: bool,
    pub(crate) pf_handle: Option<JoinHandle<()>>,
}

/// State and signalling shared by the façade and the prefetch task.
pub(crate) struct Shared {
    pub(crate) index: PrefixIndex,
    pub(crate) block_size: usize,
    pub(crate) state: Mutex<State>,
    /// Producer -> consumer: a block was appended or a terminal signal set.
    pub(crate) data_ready: Notify,
    /// Consumer -> producer: a slot freed, a pending seek, or close.
    pub(crate) slot_free: Notify,
    /// Locked by the producer for the duration of its run; `close` takes it
    /// only after the producer has exited, so a source is never touched by
    /// two tasks at once.
    pub(crate) sources: Mutex<Vec<Box<dyn ByteSource>>>,
}

/// Run the prefetch loop until end-of-stream, a source failure, or close.
pub(crate) async fn run(shared: Arc<Shared>) {
    let total_size = shared.index.total_size();
    let mut sources = shared.sources.lock().await;

    let mut cur_pos: u64 = 0;
    let mut cur_idx: Option<usize> = None;
    let mut need_seek = true;

    debug!("prefetcher started");

    loop {
        // Control point: observe close/pending-seek, end-of-stream and
        // backpressure, then pick the active source.
        let (idx, local_offset, to_read) = {
            let mut st = shared.state.lock().await;
            if st.closed {
                stop(&shared, &mut st, None);
                return;
            }
            if st.pending_seek {
                st.pending_seek = false;
                cur_pos = st.pf_pos;
                cur_idx = None;
                need_seek = true;
                trace!(pos = cur_pos, "consumed pending seek");
            }
            if cur_pos >= total_size {
                stop(&shared, &mut st, Some(Terminal::Eof));
                return;
            }
            if st.window.is_full() {
                drop(st);
                shared.slot_free.notified().await;
                continue;
            }
            let idx = match cur_idx {
                Some(idx) if shared.index.contains(idx, cur_pos) => idx,
                _ => {
                    let idx = shared.index.locate(cur_pos);
                    cur_idx = Some(idx);
                    need_seek = true;
                    idx
                }
            };
            let remaining = (shared.index.end_of(idx) - cur_pos) as usize;
            (idx, cur_pos - shared.index.start_of(idx), remaining.min(shared.block_size))
        };

        // Source I/O happens with the state lock released.
        let source = &mut sources[idx];
        if need_seek {
            trace!(source = idx, offset = local_offset, "seeking source");
            if let Err(error) = source.seek(local_offset).await {
                let mut st = shared.state.lock().await;
                let terminal = (!st.closed).then(|| Terminal::Failed {
                    index: idx,
                    error: Arc::new(error),
                });
                stop(&shared, &mut st, terminal);
                return;
            }
            need_seek = false;
        }

        let mut block = vec![0u8; to_read];
        let read_result = source.read(&mut block).await;

        // Re-check invalidation: a close or an out-of-window seek during
        // the I/O makes the block stale.
        let mut st = shared.state.lock().await;
        if st.closed {
            stop(&shared, &mut st, None);
            return;
        }
        if st.pending_seek {
            trace!(source = idx, "discarding stale block");
            continue;
        }

        match read_result {
            Ok(0) => {
                // Source exhausted ahead of its declared span: snap to the
                // end of the span and reselect on the next iteration.
                cur_pos = shared.index.end_of(idx);
                cur_idx = None;
                trace!(source = idx, pos = cur_pos, "source exhausted");
            }
            Ok(n) => {
                block.truncate(n);
                st.window.append(block);
                cur_pos += n as u64;
                trace!(source = idx, len = n, pos = cur_pos, "published block");
                shared.data_ready.notify_one();
            }
            Err(error) => {
                let terminal = Terminal::Failed {
                    index: idx,
                    error: Arc::new(error),
                };
                stop(&shared, &mut st, Some(terminal));
                return;
            }
        }
    }
}

/// Record the producer's exit: lifecycle, an optional terminal signal, and
/// a consumer wakeup.
fn stop(shared: &Shared, st: &mut State, terminal: Option<Terminal>) {
    if let Some(terminal) = terminal {
        if st.terminal.is_none() {
            st.terminal = Some(terminal);
        }
    }
    st.lifecycle = Lifecycle::Stopped;
    debug!(terminal = ?st.terminal, "prefetcher stopped");
    shared.data_ready.notify_one();
}
