//! Durable persistence stage for a deduplication storage backend.
//!
//! Upstream stages chunk, deduplicate and pack data into fixed-capacity
//! containers. This crate owns the last hop: a single consumer drains sealed
//! containers from a bounded transfer queue and commits each one as a file in
//! a content-addressed store.
//!
//! - **Container**: immutable unit of bytes identified by an opaque binary ID
//! - **Transfer Queue**: bounded multi-producer hand-off with a done signal
//! - **Container Writer**: the consumer loop and its shutdown protocol
//! - **Path Naming Policy**: `root ++ id ++ suffix`
//!
//! # Example
//!
//! ```rust,no_run
//! use container_writer::{Container, ContainerWriter, TransferQueue, WriterConfig};
//! use std::sync::Arc;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = WriterConfig::new("/var/lib/dedup/containers/", ".container");
//! let queue = Arc::new(TransferQueue::new(config.queue_capacity));
//! let handle = ContainerWriter::new(config)?.spawn(Arc::clone(&queue))?;
//!
//! queue.push(Container::new("AAAA", &b"hello"[..], 4096)?)?;
//! queue.set_done();
//!
//! let stats = handle.join().map_err(|_| "writer thread panicked")??;
//! println!("containers written: {}", stats.containers_written);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

// Data entity and fill buffer
pub mod container;

// Typed errors
pub mod error;

// Writer configuration
pub mod config;

// Path naming policy
pub mod naming;

// Transfer queue and consumer seam
pub mod queue;

// Persistence routine
pub mod store;

// Counters and timing
pub mod metrics;

// Consumer loop
pub mod writer;

pub use config::{DuplicatePolicy, FailurePolicy, WaitStrategy, WriterConfig};
pub use container::{Container, ContainerBuilder, ContainerId};
pub use error::{ConfigError, ContainerError, PersistenceError, QueueError};
pub use metrics::{WriterMetrics, WriterStats};
pub use naming::PathNaming;
pub use queue::{ContainerSource, TransferQueue};
pub use store::ContainerStore;
pub use writer::{ContainerWriter, WriterHandle};

/// Version information for the writer.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Exit status used when a persistence failure aborts the process.
pub const FATAL_EXIT_CODE: i32 = 1;
