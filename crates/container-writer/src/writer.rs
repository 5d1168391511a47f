//! Container writer: the single consumer of the transfer queue
//!
//! The writer pops sealed containers and commits each through
//! [`ContainerStore`] until its source reports done and drained. Exit only
//! happens after a pass that saw the source done and empty and popped
//! nothing, so every container enqueued before the done signal is committed
//! exactly once, in pop order.

use crate::config::{FailurePolicy, WaitStrategy, WriterConfig};
use crate::container::Container;
use crate::error::{ConfigError, PersistenceError};
use crate::metrics::{WriterMetrics, WriterStats};
use crate::queue::{ContainerSource, TransferQueue};
use crate::store::ContainerStore;
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tracing::{error, info, info_span};

/// Name of the writer thread created by [`ContainerWriter::spawn`].
pub const WRITER_THREAD_NAME: &str = "container-writer";

/// Single-threaded consumer committing containers to storage
#[derive(Debug)]
pub struct ContainerWriter {
    store: ContainerStore,
    failure_policy: FailurePolicy,
    wait_strategy: WaitStrategy,
    record_timing: bool,
    metrics: Arc<WriterMetrics>,
    /// Popped container whose commit failed under `Propagate`
    pending: Option<Container>,
}

/// Handle to a writer running on its own thread.
#[derive(Debug)]
pub struct WriterHandle {
    inner: JoinHandle<(ContainerWriter, Result<WriterStats, PersistenceError>)>,
}

impl WriterHandle {
    /// Wait for the writer loop to end.
    pub fn join(self) -> thread::Result<Result<WriterStats, PersistenceError>> {
        self.inner.join().map(|(_, result)| result)
    }

    /// Wait for the writer loop to end and take the writer back.
    ///
    /// After a propagated failure the returned writer still holds the
    /// failed container, so calling [`ContainerWriter::run`] again retries it.
    pub fn join_writer(
        self,
    ) -> thread::Result<(ContainerWriter, Result<WriterStats, PersistenceError>)> {
        self.inner.join()
    }

    /// Whether the writer loop has ended.
    pub fn is_finished(&self) -> bool {
        self.inner.is_finished()
    }
}

impl ContainerWriter {
    /// Create a writer from an explicit configuration
    ///
    /// # Errors
    ///
    /// Returns error if the configuration does not validate
    pub fn new(config: WriterConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        info!(
            "Init container writer: root={}, suffix={:?}",
            config.container_root_path.display(),
            config.container_suffix
        );

        Ok(Self {
            store: ContainerStore::new(&config),
            failure_policy: config.failure_policy,
            wait_strategy: config.wait_strategy,
            record_timing: config.record_timing,
            metrics: Arc::new(WriterMetrics::new()),
            pending: None,
        })
    }

    /// Shared handle to the cumulative counters
    pub fn metrics(&self) -> Arc<WriterMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Underlying persistence routine
    pub const fn store(&self) -> &ContainerStore {
        &self.store
    }

    /// Container whose commit failed, waiting to be retried
    pub const fn pending(&self) -> Option<&Container> {
        self.pending.as_ref()
    }

    /// Take back the failed container instead of retrying it
    pub fn take_pending(&mut self) -> Option<Container> {
        self.pending.take()
    }

    /// Drain `source` until it is done and empty.
    ///
    /// Blocks the calling thread. Under [`FailurePolicy::Abort`] a failed
    /// commit terminates the process. Under [`FailurePolicy::Propagate`] it
    /// stops the loop and is returned; the failed container is kept as
    /// [`pending`](Self::pending) and committed first by the next `run`,
    /// and unpopped containers stay queued.
    pub fn run<S>(&mut self, source: &S) -> Result<WriterStats, PersistenceError>
    where
        S: ContainerSource + ?Sized,
    {
        let span = info_span!("container_writer");
        let _enter = span.enter();

        info!("Container writer running ({:?})", self.wait_strategy);
        let start_containers = self.metrics.containers_written();
        let start_bytes = self.metrics.bytes_written();
        let start_write_time = self.metrics.write_time();
        let loop_start = Instant::now();
        self.store.clear_seen();

        let result = match self.pending.take() {
            Some(container) => self.commit(container),
            None => Ok(()),
        };
        let result = result.and_then(|()| match self.wait_strategy {
            WaitStrategy::Blocking => self.run_blocking(source),
            WaitStrategy::Poll => self.run_polling(source),
        });

        let stats = WriterStats {
            containers_written: self.metrics.containers_written() - start_containers,
            bytes_written: self.metrics.bytes_written() - start_bytes,
            write_time: self
                .record_timing
                .then(|| self.metrics.write_time().saturating_sub(start_write_time)),
            total_time: loop_start.elapsed(),
        };
        log_summary(&stats);

        result.map(|()| stats)
    }

    /// Run the writer loop on a dedicated, named thread.
    ///
    /// # Errors
    ///
    /// Returns error if the OS refuses to create the thread
    pub fn spawn(mut self, queue: Arc<TransferQueue>) -> io::Result<WriterHandle> {
        let inner = thread::Builder::new()
            .name(WRITER_THREAD_NAME.to_string())
            .spawn(move || {
                let result = self.run(&*queue);
                (self, result)
            })?;
        Ok(WriterHandle { inner })
    }

    fn run_blocking<S>(&mut self, source: &S) -> Result<(), PersistenceError>
    where
        S: ContainerSource + ?Sized,
    {
        while let Some(container) = source.pop_blocking() {
            self.commit(container)?;
        }
        Ok(())
    }

    fn run_polling<S>(&mut self, source: &S) -> Result<(), PersistenceError>
    where
        S: ContainerSource + ?Sized,
    {
        loop {
            let eligible = source.is_done() && source.is_empty();

            if let Some(container) = source.try_pop() {
                self.commit(container)?;
                continue;
            }

            if eligible {
                return Ok(());
            }
            std::thread::yield_now();
        }
    }

    fn commit(&mut self, container: Container) -> Result<(), PersistenceError> {
        let started = self.record_timing.then(Instant::now);

        if let Err(e) = self.store.persist(&container) {
            let err = self.handle_failure(e);
            self.pending = Some(container);
            return Err(err);
        }

        self.metrics
            .record_write(container.current_size(), started.map(|s| s.elapsed()));
        Ok(())
    }

    fn handle_failure(&self, err: PersistenceError) -> PersistenceError {
        error!("Container writer failed: {}", err);
        match self.failure_policy {
            FailurePolicy::Propagate => err,
            FailurePolicy::Abort => {
                error!(
                    "Aborting after {} containers",
                    self.metrics.containers_written()
                );
                std::process::exit(crate::FATAL_EXIT_CODE)
            }
        }
    }
}

fn log_summary(stats: &WriterStats) {
    match stats.write_time {
        Some(write_time) => info!(
            "Container writer exit: containers={}, bytes={}, write_time={:.6}s, total_time={:.6}s",
            stats.containers_written,
            stats.bytes_written,
            write_time.as_secs_f64(),
            stats.total_time.as_secs_f64()
        ),
        None => info!(
            "Container writer exit: containers={}, bytes={}, total_time={:.6}s",
            stats.containers_written,
            stats.bytes_written,
            stats.total_time.as_secs_f64()
        ),
    }
}
