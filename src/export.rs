// Export module
// Recomposes a snapshot of the preview on a worker pool, off the interactive path

use crate::alpha;
use crate::error::{AlphaError, AlphaResult};
use crate::opacity::Opacity;
use crate::pixel_buffer::PixelBuffer;
use crate::preview::PreviewEngine;
use log::{debug, warn};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll, Waker};

/// Worker pool settings for [`ExportPipeline`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ExportConfig {
    /// Worker thread count; `None` uses rayon's default
    pub threads: Option<usize>,
}

/// Source and opacity frozen at the moment an export was requested
#[derive(Debug, Clone)]
pub struct ExportSnapshot {
    source: Arc<PixelBuffer>,
    opacity: Opacity,
}

impl ExportSnapshot {
    pub(crate) fn new(source: Arc<PixelBuffer>, opacity: Opacity) -> Self {
        Self { source, opacity }
    }

    pub fn source(&self) -> &PixelBuffer {
        &self.source
    }

    pub fn opacity(&self) -> Opacity {
        self.opacity
    }

    /// Run the composite for this snapshot on the current thread
    pub fn compose(&self) -> PixelBuffer {
        alpha::apply(&self.source, self.opacity)
    }
}

/// Produces encode-ready composites on a dedicated worker pool.
///
/// Every export recomposes from its own snapshot instead of reusing the
/// preview cache, so overlapping exports and later slider moves are
/// independent of each other.
pub struct ExportPipeline {
    pool: rayon::ThreadPool,
}

impl ExportPipeline {
    pub fn new(config: ExportConfig) -> AlphaResult<Self> {
        Ok(Self {
            pool: build_thread_pool(config.threads)?,
        })
    }

    /// Snapshot `engine` and schedule the final composite.
    ///
    /// Fails immediately with `InvalidState` when nothing is loaded. The
    /// returned job resolves with a buffer composited at the opacity that
    /// was current when this was called.
    pub fn export_async(&self, engine: &PreviewEngine) -> AlphaResult<ExportJob> {
        let snapshot = engine.snapshot()?;
        Ok(self.export_snapshot(snapshot))
    }

    /// Snapshot `engine`, then run `then` on the composite, all on the pool.
    ///
    /// Hosts pass their encode and write step here so that none of it runs
    /// on the interactive thread.
    pub fn export_async_then<T, F>(&self, engine: &PreviewEngine, then: F) -> AlphaResult<ExportJob<T>>
    where
        T: Send + 'static,
        F: FnOnce(PixelBuffer) -> T + Send + 'static,
    {
        let snapshot = engine.snapshot()?;
        Ok(self.export_snapshot_then(snapshot, then))
    }

    /// Schedule the composite for an already captured snapshot
    pub fn export_snapshot(&self, snapshot: ExportSnapshot) -> ExportJob {
        self.export_snapshot_then(snapshot, |buffer| buffer)
    }

    pub fn export_snapshot_then<T, F>(&self, snapshot: ExportSnapshot, then: F) -> ExportJob<T>
    where
        T: Send + 'static,
        F: FnOnce(PixelBuffer) -> T + Send + 'static,
    {
        let shared = Arc::new(Mutex::new(JobSlot::default()));
        let completion = Completion {
            shared: Arc::clone(&shared),
            done: false,
        };
        debug!(
            "Scheduling export of {}x{} at {}",
            snapshot.source().width(),
            snapshot.source().height(),
            snapshot.opacity()
        );

        self.pool.spawn(move || {
            let mut completion = completion;
            let buffer = snapshot.compose();
            debug!("Export composite finished at {}", snapshot.opacity());
            completion.finish(Ok(then(buffer)));
        });

        ExportJob { shared }
    }
}

/// Pending export result.
///
/// Await it from async code, call [`wait`](Self::wait) to block, or poll it
/// once per frame with [`try_take`](Self::try_take).
pub struct ExportJob<T = PixelBuffer> {
    shared: Arc<Mutex<JobSlot<T>>>,
}

impl<T> ExportJob<T> {
    /// Take the result if the worker has finished, without blocking.
    ///
    /// Consumes the job on success; while it is still running the job is
    /// handed back in `Err`.
    pub fn try_take(self) -> Result<AlphaResult<T>, Self> {
        let taken = lock(&self.shared).result.take();
        taken.ok_or(self)
    }

    /// Block the calling thread until the job is done
    pub fn wait(self) -> AlphaResult<T> {
        pollster::block_on(self)
    }
}

impl<T> Future for ExportJob<T> {
    type Output = AlphaResult<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut slot = lock(&self.shared);
        match slot.result.take() {
            Some(result) => Poll::Ready(result),
            None if slot.finished => Poll::Ready(Err(AlphaError::ExportAborted)),
            None => {
                slot.waker = Some(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}

struct JobSlot<T> {
    result: Option<AlphaResult<T>>,
    finished: bool,
    waker: Option<Waker>,
}

impl<T> Default for JobSlot<T> {
    fn default() -> Self {
        Self {
            result: None,
            finished: false,
            waker: None,
        }
    }
}

/// Worker-side handle; reports `ExportAborted` if dropped before finishing.
struct Completion<T> {
    shared: Arc<Mutex<JobSlot<T>>>,
    done: bool,
}

impl<T> Completion<T> {
    fn finish(&mut self, result: AlphaResult<T>) {
        self.done = true;
        let waker = {
            let mut slot = lock(&self.shared);
            slot.result = Some(result);
            slot.finished = true;
            slot.waker.take()
        };
        if let Some(waker) = waker {
            waker.wake();
        }
    }
}

impl<T> Drop for Completion<T> {
    fn drop(&mut self) {
        if !self.done {
            warn!("Export worker exited without a result");
            self.finish(Err(AlphaError::ExportAborted));
        }
    }
}

fn lock<T>(shared: &Mutex<JobSlot<T>>) -> MutexGuard<'_, JobSlot<T>> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

fn build_thread_pool(threads: Option<usize>) -> AlphaResult<rayon::ThreadPool> {
    if threads == Some(0) {
        return Err(AlphaError::invalid_config(
            "export threads must be >= 1 when set",
        ));
    }

    // Without a handler rayon aborts the process on a worker panic; the
    // job's Completion guard already reports it to the waiting caller.
    let mut builder = rayon::ThreadPoolBuilder::new()
        .thread_name(|i| format!("export-{}", i))
        .panic_handler(|_| warn!("Export worker panicked"));
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| AlphaError::invalid_config(format!("failed to build export pool: {}", e)))
}
