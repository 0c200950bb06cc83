//! Platform-specific helpers.
//! Hides OS differences (Unix/Windows) behind a uniform API so the rest of
//! the codebase stays platform-agnostic.

#[cfg(unix)]
mod common_unix;
mod temp;
#[cfg(unix)]
mod unix;
#[cfg(not(unix))]
mod windows;

#[cfg(unix)]
pub use unix::{
    available_space, device_id, open_log_file_secure_append, set_dir_mode_0700,
    write_config_secure_new_0600,
};

#[cfg(not(unix))]
pub use windows::{
    available_space, device_id, open_log_file_secure_append, set_dir_mode_0700,
    write_config_secure_new_0600,
};
