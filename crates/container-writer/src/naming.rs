//! Path naming policy: `root ++ id ++ suffix`
//!
//! The root is a prefix, not a directory to join onto. A root of
//! `/store/` yields `/store/<id><suffix>`, a root of `/store/c-` yields
//! `/store/c-<id><suffix>`.

use crate::container::ContainerId;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Deterministic mapping from container ID to file path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathNaming {
    prefix: OsString,
    suffix: OsString,
}

impl PathNaming {
    /// Create a naming policy from a root prefix and suffix.
    pub fn new<P: AsRef<Path>>(root: P, suffix: &str) -> Self {
        Self {
            prefix: root.as_ref().as_os_str().to_os_string(),
            suffix: OsString::from(suffix),
        }
    }

    /// Path of the file holding container `id`.
    pub fn path_for(&self, id: &ContainerId) -> PathBuf {
        let id_part = raw_os_string(id.as_bytes());
        let mut name =
            OsString::with_capacity(self.prefix.len() + id_part.len() + self.suffix.len());
        name.push(&self.prefix);
        name.push(&id_part);
        name.push(&self.suffix);
        PathBuf::from(name)
    }

    /// Root prefix.
    pub fn prefix(&self) -> &Path {
        Path::new(&self.prefix)
    }
}

#[cfg(unix)]
fn raw_os_string(bytes: &[u8]) -> OsString {
    use std::os::unix::ffi::OsStrExt;
    std::ffi::OsStr::from_bytes(bytes).to_os_string()
}

// Non-unix file names must be valid Unicode
#[cfg(not(unix))]
fn raw_os_string(bytes: &[u8]) -> OsString {
    OsString::from(String::from_utf8_lossy(bytes).into_owned())
}
