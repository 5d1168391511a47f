//! Persistence routine: one container, one file
//!
//! Each container is written with create/truncate semantics in a single
//! write call. The file handle is scoped to [`ContainerStore::persist`] and
//! closed on every exit path. No fsync is issued unless `sync_on_write` is
//! set.

use crate::config::{DuplicatePolicy, WriterConfig};
use crate::container::{Container, ContainerId};
use crate::error::{PersistenceError, Result};
use crate::naming::PathNaming;
use std::collections::HashSet;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Writes containers to the content-addressed file store
#[derive(Debug)]
pub struct ContainerStore {
    naming: PathNaming,
    id_length: Option<usize>,
    sync_on_write: bool,
    duplicate_policy: DuplicatePolicy,
    /// IDs committed so far; only tracked when duplicates are checked
    seen: HashSet<ContainerId>,
}

impl ContainerStore {
    /// Create a store from the writer configuration
    pub fn new(config: &WriterConfig) -> Self {
        Self {
            naming: PathNaming::new(&config.container_root_path, &config.container_suffix),
            id_length: config.id_length,
            sync_on_write: config.sync_on_write,
            duplicate_policy: config.duplicate_policy,
            seen: HashSet::new(),
        }
    }

    /// Path a container with this ID is written to
    pub fn path_for(&self, id: &ContainerId) -> PathBuf {
        self.naming.path_for(id)
    }

    /// Naming policy in use
    pub const fn naming(&self) -> &PathNaming {
        &self.naming
    }

    /// Forget the IDs committed so far; called at the start of each run
    pub fn clear_seen(&mut self) {
        self.seen.clear();
    }

    /// Commit one container, returning the path written.
    ///
    /// On success the file at the returned path holds exactly
    /// `container.body()`. A pre-existing file is overwritten.
    pub fn persist(&mut self, container: &Container) -> Result<PathBuf> {
        let id = container.id();
        if let Some(expected) = self.id_length
            && id.len() != expected
        {
            return Err(PersistenceError::InvalidId {
                expected,
                actual: id.len(),
            });
        }

        let path = self.naming.path_for(id);
        self.check_duplicate(id, &path)?;

        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)
            .map_err(|source| PersistenceError::Open {
                path: path.clone(),
                source,
            })?;

        write_body(&mut file, container.body(), &path)?;

        if self.sync_on_write {
            file.sync_all().map_err(|source| PersistenceError::Sync {
                path: path.clone(),
                source,
            })?;
        }

        debug!(
            "Wrote container {} ({} bytes) to {}",
            id,
            container.current_size(),
            path.display()
        );

        if self.duplicate_policy != DuplicatePolicy::Overwrite {
            self.seen.insert(id.clone());
        }

        Ok(path)
    }

    fn check_duplicate(&self, id: &ContainerId, path: &Path) -> Result<()> {
        match self.duplicate_policy {
            DuplicatePolicy::Overwrite => Ok(()),
            DuplicatePolicy::Warn => {
                if self.seen.contains(id) {
                    warn!(
                        "Container {:?} written twice, overwriting {}",
                        id,
                        path.display()
                    );
                }
                Ok(())
            }
            DuplicatePolicy::Reject => {
                if self.seen.contains(id) {
                    return Err(PersistenceError::DuplicateId {
                        path: path.to_path_buf(),
                    });
                }
                Ok(())
            }
        }
    }
}

/// Issue one write for the whole body; anything less is a short write.
///
/// Regular files only accept a partial write when the disk fills up or a
/// file size limit is hit mid-call.
fn write_body<W: Write>(out: &mut W, body: &[u8], path: &Path) -> Result<()> {
    let written = out.write(body).map_err(|source| PersistenceError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    if written != body.len() {
        return Err(PersistenceError::ShortWrite {
            path: path.to_path_buf(),
            written,
            expected: body.len(),
        });
    }
    Ok(())
}
