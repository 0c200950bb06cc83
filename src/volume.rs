//! Filesystem classification.
//!
//! Decides whether two paths live on the same storage volume so the
//! orchestrator can pick between rename-based and byte-exchange strategies.
//!
//! This is a strategy hint, never a promise: a rename between paths on the same
//! volume can still fail (permissions, a directory in the way), and that is a
//! runtime error for the caller to report.

use std::path::{Path, PathBuf};
use tracing::trace;

use crate::destination::volume_root;
use crate::platform;

/// Identity of the volume a path lives on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VolumeId {
    /// Device number of the filesystem (Unix `st_dev`) or normalized drive /
    /// share prefix (Windows).
    Device(String),
    /// Nothing along the path could be examined; the lexical volume root.
    Lexical(PathBuf),
}

/// Volume identity of `path`. Walks up to the nearest existing ancestor, since
/// destinations usually do not exist yet.
pub fn volume_id(path: &Path) -> VolumeId {
    let mut probe = Some(path);
    while let Some(p) = probe {
        if let Ok(Some(id)) = platform::device_id(p) {
            trace!(path = %path.display(), examined = %p.display(), device = %id, "volume identified");
            return VolumeId::Device(id);
        }
        probe = p.parent();
    }
    VolumeId::Lexical(volume_root(path))
}

/// True when `x` and `y` share a volume.
pub fn same_volume(x: &Path, y: &Path) -> bool {
    volume_id(x) == volume_id(y)
}

/// True when every path in `paths` shares a single volume.
pub fn all_on_one_volume(paths: &[&Path]) -> bool {
    let mut ids = paths.iter().map(|p| volume_id(p));
    match ids.next() {
        Some(first) => ids.all(|id| id == first),
        None => true,
    }
}
