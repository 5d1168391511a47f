//! Configuration for the container writer
//!
//! The configuration is loaded once by the host process and handed to
//! [`ContainerWriter::new`](crate::ContainerWriter::new). Nothing reads it
//! from ambient global state.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default bound of the transfer queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 128;

/// Default suffix of container files.
pub const DEFAULT_CONTAINER_SUFFIX: &str = ".container";

/// What happens when a container cannot be committed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Log the failed path and terminate the process.
    #[default]
    Abort,
    /// Stop the writer and return the error to the caller.
    Propagate,
}

/// Handling of two containers that map to the same path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Last write wins, nothing is tracked.
    #[default]
    Overwrite,
    /// Last write wins, repeats are logged.
    Warn,
    /// Repeats fail with `PersistenceError::DuplicateId`.
    Reject,
}

/// How the writer waits for containers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitStrategy {
    /// Park on the queue until a push or the done signal.
    #[default]
    Blocking,
    /// Spin on non-blocking pops, yielding between empty passes.
    Poll,
}

/// Configuration for the container writer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterConfig {
    /// Prefix of every container path, concatenated verbatim with the ID
    pub container_root_path: PathBuf,

    /// Suffix appended after the ID
    pub container_suffix: String,

    /// Required ID length, unchecked when `None`
    pub id_length: Option<usize>,

    /// Bound of the transfer queue; 0 is raised to 1 by `TransferQueue::new`
    pub queue_capacity: usize,

    /// Measure time spent inside the persistence routine
    pub record_timing: bool,

    /// Call `sync_all` before closing each container file
    pub sync_on_write: bool,

    /// Reaction to a failed commit
    pub failure_policy: FailurePolicy,

    /// Reaction to a repeated container ID
    pub duplicate_policy: DuplicatePolicy,

    /// How the writer waits on the queue
    pub wait_strategy: WaitStrategy,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            container_root_path: PathBuf::from("./containers/"),
            container_suffix: DEFAULT_CONTAINER_SUFFIX.to_string(),
            id_length: None,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            record_timing: false,
            sync_on_write: false,
            failure_policy: FailurePolicy::Abort,
            duplicate_policy: DuplicatePolicy::Overwrite,
            wait_strategy: WaitStrategy::Blocking,
        }
    }
}

impl WriterConfig {
    /// Create a configuration with the given path prefix and suffix
    pub fn new<P: AsRef<Path>>(root: P, suffix: impl Into<String>) -> Self {
        Self {
            container_root_path: root.as_ref().to_path_buf(),
            container_suffix: suffix.into(),
            ..Default::default()
        }
    }

    /// Parse a JSON document. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Check values that deserialize fine but cannot be used.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.id_length == Some(0) {
            return Err(ConfigError::Invalid(
                "id_length must be at least 1 when set".to_string(),
            ));
        }
        Ok(())
    }

    /// Require IDs of exactly `len` bytes
    #[must_use]
    pub const fn with_id_length(mut self, len: usize) -> Self {
        self.id_length = Some(len);
        self
    }

    /// Set the transfer queue bound
    #[must_use]
    pub const fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Enable or disable write timing
    #[must_use]
    pub const fn with_timing(mut self, enable: bool) -> Self {
        self.record_timing = enable;
        self
    }

    /// Enable or disable `sync_all` after each write
    #[must_use]
    pub const fn with_sync_on_write(mut self, enable: bool) -> Self {
        self.sync_on_write = enable;
        self
    }

    /// Set the failure policy
    #[must_use]
    pub const fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Set the duplicate-ID policy
    #[must_use]
    pub const fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    /// Set the wait strategy
    #[must_use]
    pub const fn with_wait_strategy(mut self, strategy: WaitStrategy) -> Self {
        self.wait_strategy = strategy;
        self
    }
}
