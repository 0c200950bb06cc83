//! Metadata carry-over for committed exchange outputs.
//!
//! An exchange output is a brand-new file, so it starts with default
//! permissions and the current time. When asked, we copy timestamps and
//! permissions from the original whose bytes it now carries. Best-effort:
//! failures are logged, never fatal.

use filetime::{FileTime, set_file_times};
use std::fs;
use std::path::Path;
use tracing::{trace, warn};

pub fn preserve_metadata(dest: &Path, src_meta: &fs::Metadata) {
    let times = {
        #[cfg(unix)]
        {
            use std::os::unix::fs::MetadataExt;
            let mt = FileTime::from_unix_time(src_meta.mtime(), src_meta.mtime_nsec() as u32);
            let at = FileTime::from_unix_time(src_meta.atime(), src_meta.atime_nsec() as u32);
            Some((at, mt))
        }
        #[cfg(not(unix))]
        {
            let at = src_meta.accessed().ok().map(FileTime::from_system_time);
            let mt = src_meta.modified().ok().map(FileTime::from_system_time);
            at.zip(mt)
        }
    };

    if let Some((at, mt)) = times {
        match set_file_times(dest, at, mt) {
            Ok(()) => trace!(path = %dest.display(), "set atime/mtime"),
            Err(e) => warn!(path = %dest.display(), error = %e, "failed to set atime/mtime"),
        }
    }

    #[cfg(unix)]
    let perms = {
        use std::os::unix::fs::PermissionsExt;
        fs::Permissions::from_mode(src_meta.permissions().mode() & 0o7777)
    };
    #[cfg(not(unix))]
    let perms = src_meta.permissions();

    if let Err(e) = fs::set_permissions(dest, perms) {
        warn!(path = %dest.display(), error = %e, "failed to set permissions");
    }
}
