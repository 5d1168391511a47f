//! Error types for the persistence stage

use crate::container::Container;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while committing a container to storage.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The container file could not be created or truncated.
    #[error("cannot open container file {}: {source}", .path.display())]
    Open {
        /// Target path
        path: PathBuf,
        /// Underlying I/O error
        source: io::Error,
    },

    /// The write call itself failed.
    #[error("cannot write container file {}: {source}", .path.display())]
    Write {
        /// Target path
        path: PathBuf,
        /// Underlying I/O error
        source: io::Error,
    },

    /// Fewer bytes reached the file than the container holds.
    #[error("short write to {}: {written} of {expected} bytes", .path.display())]
    ShortWrite {
        /// Target path
        path: PathBuf,
        /// Bytes accepted by the write call
        written: usize,
        /// Container size
        expected: usize,
    },

    /// `sync_all` failed after the write.
    #[error("cannot sync container file {}: {source}", .path.display())]
    Sync {
        /// Target path
        path: PathBuf,
        /// Underlying I/O error
        source: io::Error,
    },

    /// A container with the same ID was already committed during this run.
    #[error("duplicate container id, already written to {}", .path.display())]
    DuplicateId {
        /// Path both containers map to
        path: PathBuf,
    },

    /// The container ID does not have the configured length.
    #[error("container id has length {actual}, expected {expected}")]
    InvalidId {
        /// Configured ID length
        expected: usize,
        /// Length of the rejected ID
        actual: usize,
    },
}

impl PersistenceError {
    /// Path of the file the failure concerns, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Open { path, .. }
            | Self::Write { path, .. }
            | Self::ShortWrite { path, .. }
            | Self::Sync { path, .. }
            | Self::DuplicateId { path } => Some(path.as_path()),
            Self::InvalidId { .. } => None,
        }
    }
}

/// Errors returned to producers by the transfer queue.
#[derive(Debug, Error)]
pub enum QueueError {
    /// The queue was marked done; the container is handed back.
    #[error("transfer queue is closed")]
    Closed(Container),

    /// `try_push` found the queue at capacity; the container is handed back.
    #[error("transfer queue is full")]
    Full(Container),
}

impl QueueError {
    /// Recover the container that could not be enqueued.
    pub fn into_container(self) -> Container {
        match self {
            Self::Closed(container) | Self::Full(container) => container,
        }
    }
}

/// Errors raised while building a container.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContainerError {
    /// The body would not fit in the container.
    #[error("container capacity exceeded: {requested} > {capacity}")]
    CapacityExceeded {
        /// Container capacity in bytes
        capacity: usize,
        /// Size the body would reach
        requested: usize,
    },
}

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error reading a configuration file.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Malformed JSON configuration.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Values that parse but cannot be used.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for persistence operations.
pub type Result<T> = std::result::Result<T, PersistenceError>;
