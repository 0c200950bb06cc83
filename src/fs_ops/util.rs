//! Small filesystem utilities: temp names, cross-device detection, dir fsync.

use std::ffi::OsStr;
#[cfg(unix)]
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Suffix used when a source is parked during a two-phase rename.
pub const PARK_SUFFIX: &str = ".xmv-park";

/// `<path>.xmv-park`, next to the original.
pub fn park_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(PARK_SUFFIX);
    PathBuf::from(name)
}

/// Hidden, process-unique temp file name inside `dst_dir`, used when a file
/// has to be copied across volumes before its final rename.
pub(super) fn unique_temp_path(dst_dir: &Path, hint: Option<&OsStr>) -> PathBuf {
    let pid = std::process::id();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let hint = hint.map(|h| h.to_string_lossy().into_owned()).unwrap_or_default();
    dst_dir.join(format!(".xmv.{hint}.{pid}.{nanos}.tmp"))
}

/// True for EXDEV / ERROR_NOT_SAME_DEVICE: the rename crossed a filesystem.
pub fn is_cross_device(e: &io::Error) -> bool {
    match e.raw_os_error() {
        #[cfg(unix)]
        Some(code) => code == libc::EXDEV,
        #[cfg(windows)]
        Some(code) => code == 17,
        #[cfg(not(any(unix, windows)))]
        Some(_) => false,
        None => false,
    }
}

#[cfg(unix)]
pub(super) fn fsync_dir(dir: &Path) -> io::Result<()> {
    File::open(dir)?.sync_all()
}

#[cfg(windows)]
pub(super) fn fsync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}
