//! Filesystem operations used by the swap orchestrator.

mod atomic;
mod copy;
mod helpers;
mod io_copy;
mod meta;
mod space;
mod util;

pub use atomic::try_atomic_move;
pub use copy::{Relocation, relocate, safe_copy_and_rename};
pub use helpers::{io_error_with_help, io_error_with_help_io};
pub use meta::preserve_metadata;
pub use space::{ensure_space, format_bytes};
pub use util::{PARK_SUFFIX, is_cross_device, park_path};
