/*!
 * Buffering Writer
 * Time-based buffered writer that sheds its buffer after reclamation cycles
 */

use crate::cycle::Collector;
use crate::notify::CycleNotifier;
use log::warn;
use parking_lot::Mutex;
use std::io::{self, Write};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Buffered writer with "free when convenient" semantics.
///
/// Writes append to an unbounded in-memory buffer. A background worker
/// flushes the buffer to `out` every `flush_every`, keeping the allocation
/// warm for the next writes; when a reclamation cycle completes it flushes
/// and *discards* the buffer instead, so the capacity is shed rather than
/// capped. Buffer capacity is mirrored into the collector's heap gauge.
///
/// Write errors from the underlying writer are logged and the affected data
/// is dropped; use [`flush`](BufferingWriter::flush) for a synchronous,
/// error-carrying flush.
pub struct BufferingWriter<W: Write + Send + 'static> {
    state: Arc<State<W>>,
    notifier: CycleNotifier,
    worker: Option<JoinHandle<()>>,
}

struct State<W> {
    collector: Arc<Collector>,
    inner: Mutex<Inner<W>>,
}

struct Inner<W> {
    out: W,
    buf: Vec<u8>,
}

impl<W: Write + Send + 'static> BufferingWriter<W> {
    pub fn new(out: W, flush_every: Duration, collector: Arc<Collector>) -> Self {
        let notifier = collector.subscribe();
        let state = Arc::new(State {
            collector,
            inner: Mutex::new(Inner {
                out,
                buf: Vec::new(),
            }),
        });

        let signal = notifier.signal().clone();
        let worker_state = Arc::clone(&state);
        let worker = thread::spawn(move || loop {
            match signal.recv_timeout(flush_every) {
                // Cycle completed: flush and shed the allocation
                Ok(()) => worker_state.flush_buffer(false),
                // Quiet interval: flush but keep the buffer warm
                Err(flume::RecvTimeoutError::Timeout) => worker_state.flush_buffer(true),
                // Subscription closed; the final flush happens in close()
                Err(flume::RecvTimeoutError::Disconnected) => break,
            }
        });

        Self {
            state,
            notifier,
            worker: Some(worker),
        }
    }

    /// Append `data` to the buffer. Never blocks on the underlying writer.
    pub fn write(&self, data: &[u8]) {
        let mut inner = self.state.inner.lock();
        let before = inner.buf.capacity();
        inner.buf.extend_from_slice(data);
        let after = inner.buf.capacity();
        if after > before {
            self.state.collector.record_alloc(after - before);
        }
    }

    /// Flush buffered data to the underlying writer, keeping the buffer.
    pub fn flush(&self) -> io::Result<()> {
        let mut inner = self.state.inner.lock();
        let Inner { out, buf } = &mut *inner;
        if !buf.is_empty() {
            out.write_all(buf)?;
            buf.clear();
        }
        out.flush()
    }

    /// Bytes currently buffered.
    pub fn buffered(&self) -> usize {
        self.state.inner.lock().buf.len()
    }

    /// Flush the remainder, shed the buffer, and stop the worker. Idempotent.
    pub fn close(&mut self) {
        self.notifier.close();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
        self.state.flush_buffer(false);
    }
}

impl<W: Write + Send + 'static> Drop for BufferingWriter<W> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<W: Write> State<W> {
    /// Flush and either keep the allocation (`reuse`) or shed it.
    fn flush_buffer(&self, reuse: bool) {
        let mut inner = self.inner.lock();
        let Inner { out, buf } = &mut *inner;
        if !buf.is_empty() {
            if let Err(err) = out.write_all(buf) {
                warn!("Buffered flush failed, dropping {} bytes: {}", buf.len(), err);
            }
        }
        if reuse {
            buf.clear();
        } else if buf.capacity() > 0 {
            self.collector.record_free(buf.capacity());
            *buf = Vec::new();
        }
    }
}
