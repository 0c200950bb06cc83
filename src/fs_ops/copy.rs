//! Relocating a committed file, by rename when possible.
//!
//! A byte exchange leaves each output next to the *original* file, while its
//! landing path may be on yet another volume. In that case a plain rename
//! fails with EXDEV and we copy into a temp file in the landing directory,
//! then atomically rename it into place and drop the source.

use std::fs;
use std::io;
use std::path::Path;
use tracing::{info, warn};

use super::atomic::try_atomic_move;
use super::helpers::io_error_with_help_io;
use super::io_copy::copy_streaming;
use super::util::{is_cross_device, unique_temp_path};

/// How a relocation was carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relocation {
    Renamed,
    Copied { bytes: u64 },
}

/// Copy `src` into a temp file beside `dest`, then rename it over `dest`.
/// The temp file is removed again if the copy or the rename fails.
pub fn safe_copy_and_rename(src: &Path, dest: &Path) -> io::Result<u64> {
    let dest_dir = dest
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "destination has no parent"))?;
    let tmp = unique_temp_path(dest_dir, dest.file_name());

    let bytes = match copy_streaming(src, &tmp) {
        Ok(n) => n,
        Err(e) => {
            let _ = fs::remove_file(&tmp);
            return Err(io_error_with_help_io("copy to temporary file", &tmp)(e));
        }
    };

    if let Err(e) = try_atomic_move(&tmp, dest) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    Ok(bytes)
}

/// Move `src` to `dest`: atomic rename, or copy + rename + remove across volumes.
///
/// On error `dest` is untouched.
pub fn relocate(src: &Path, dest: &Path) -> io::Result<Relocation> {
    match try_atomic_move(src, dest) {
        Ok(()) => Ok(Relocation::Renamed),
        Err(e) if is_cross_device(&e) => {
            warn!(src = %src.display(), dest = %dest.display(), "rename crosses volumes; copying instead");
            let bytes = safe_copy_and_rename(src, dest)?;
            // The copy is committed; a leftover source is only clutter.
            if let Err(e) = fs::remove_file(src) {
                warn!(path = %src.display(), error = %e, "failed to remove source after copy");
            }
            info!(src = %src.display(), dest = %dest.display(), bytes, "relocated by copy");
            Ok(Relocation::Copied { bytes })
        }
        Err(e) => Err(e),
    }
}
