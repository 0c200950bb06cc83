//! Core library for `xmv`.
//!
//! Swaps the contents of two files and optionally relocates each one. The
//! binary is a thin wrapper: it loads config, sets up logging and prompting,
//! then calls [`run_swap`].
//!
//! Layout:
//! - `destination`: keyword/path vocabulary to concrete destination paths
//! - `volume`: which paths share a volume
//! - `exchange`: chunked XOR content exchange into sibling files
//! - `verify`: SHA-256 check of exchange outputs
//! - `swap`: the orchestrator tying it together

pub mod cli;
pub mod config;
pub mod destination;
pub mod errors;
pub mod exchange;
pub mod fs_ops;
pub mod output;
pub mod platform;
pub mod shutdown;
pub mod swap;
pub mod verify;
pub mod volume;

pub use config::{
    Config, LogLevel, default_config_path, default_log_path, load_config, path_has_symlink_ancestor,
};
pub use destination::{DestinationSpec, FileSlot, PathStrategy, parse_destination, resolve};
pub use errors::XmvError;
pub use exchange::{ChunkMode, ChunkProgress, ExchangeResult, exchange, exchange_observed};
pub use swap::{
    Approver, ConfirmationPolicy, FileOutcome, NoPrompt, PendingAction, PlannedAction, SwapReport,
    SwapRequest, SwapStrategy, run_swap,
};
pub use verify::{Verification, sha256_file, verify_exchange};
pub use volume::{same_volume, volume_id};
