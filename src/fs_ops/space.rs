//! Free-space checks performed before an exchange writes its outputs.

use std::path::Path;
use tracing::debug;

use crate::errors::XmvError;
use crate::platform::available_space;

pub fn format_bytes(n: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;
    let f = n as f64;
    if f >= GB {
        format!("{:.1} GiB", f / GB)
    } else if f >= MB {
        format!("{:.1} MiB", f / MB)
    } else if f >= KB {
        format!("{:.1} KiB", f / KB)
    } else {
        format!("{} B", n)
    }
}

/// Fail with `InsufficientSpace` unless the volume holding `dir` has at least
/// `required` bytes available.
pub fn ensure_space(dir: &Path, required: u64) -> Result<(), XmvError> {
    let available = available_space(dir).map_err(XmvError::io("query free space", dir))?;
    debug!(
        dir = %dir.display(),
        required = %format_bytes(required),
        available = %format_bytes(available),
        "free space check"
    );
    if available < required {
        return Err(XmvError::InsufficientSpace {
            required: required as u128,
            available: available as u128,
            dest: dir.to_path_buf(),
        });
    }
    Ok(())
}
