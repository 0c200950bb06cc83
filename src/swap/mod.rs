//! Swap orchestration.
//!
//! A run walks `Validate -> ResolveDestinations -> ClassifyStrategy ->
//! PreflightChecks -> Execute -> (Verify) -> Commit`, with Rollback on any
//! failure detected after Execute starts. Everything before Execute is
//! read-only; a dry run stops there and reports what would happen.
//!
//! Execute is never interrupted: a shutdown request is honoured only before it
//! starts.

mod execute;
mod plan;
mod policy;

use std::fmt;
use std::path::PathBuf;
use tracing::{info, warn};

pub use policy::{Approver, ConfirmationPolicy, NoPrompt, PendingAction};

use crate::destination::DestinationSpec;
use crate::errors::XmvError;
use crate::exchange::{ChunkMode, ChunkProgress};
use crate::shutdown;
use crate::verify::Verification;

/// How the swap is carried out; chosen once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapStrategy {
    /// Same volume, the two paths trade identities by renaming.
    AtomicRenameInPlace,
    /// Same volume, at least one file relocated, two-phase rename.
    AtomicRenameRelocate,
    /// Contents exchanged into sibling files, which are then committed.
    ByteExchange,
}

impl fmt::Display for SwapStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SwapStrategy::AtomicRenameInPlace => "atomic-rename-in-place",
            SwapStrategy::AtomicRenameRelocate => "atomic-rename-relocate",
            SwapStrategy::ByteExchange => "byte-exchange",
        })
    }
}

/// Everything one invocation needs.
#[derive(Debug, Clone)]
pub struct SwapRequest {
    pub first: PathBuf,
    pub second: PathBuf,
    pub destinations: DestinationSpec,
    pub chunk_mode: ChunkMode,
    pub verify: bool,
    pub preserve_metadata: bool,
    pub policy: ConfirmationPolicy,
    pub dry_run: bool,
}

impl SwapRequest {
    /// A plain in-place swap with default settings.
    pub fn new(first: impl Into<PathBuf>, second: impl Into<PathBuf>) -> Self {
        Self {
            first: first.into(),
            second: second.into(),
            destinations: DestinationSpec::default(),
            chunk_mode: ChunkMode::default(),
            verify: false,
            preserve_metadata: false,
            policy: ConfirmationPolicy::default(),
            dry_run: false,
        }
    }
}

/// A step Execute takes (or, in a dry run, would take).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedAction {
    CreateDirectory(PathBuf),
    Remove(PathBuf),
    Exchange { first: PathBuf, second: PathBuf, chunk: ChunkMode },
    Verify,
    Move { from: PathBuf, to: PathBuf },
}

impl fmt::Display for PlannedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlannedAction::CreateDirectory(p) => write!(f, "create directory '{}'", p.display()),
            PlannedAction::Remove(p) => write!(f, "remove '{}'", p.display()),
            PlannedAction::Exchange { first, second, chunk } => write!(
                f,
                "exchange contents of '{}' and '{}' ({chunk} chunks)",
                first.display(),
                second.display()
            ),
            PlannedAction::Verify => f.write_str("verify both outputs with SHA-256"),
            PlannedAction::Move { from, to } => {
                write!(f, "move '{}' -> '{}'", from.display(), to.display())
            }
        }
    }
}

/// Where one input's content ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutcome {
    pub source: PathBuf,
    pub landing: PathBuf,
}

/// Outcome of a run (or of a dry run's plan).
#[derive(Debug, Clone)]
pub struct SwapReport {
    pub strategy: SwapStrategy,
    pub first: FileOutcome,
    pub second: FileOutcome,
    /// Bytes written by a byte exchange; renames move no data.
    pub bytes_transferred: u64,
    pub verification: Option<Verification>,
    pub actions: Vec<PlannedAction>,
    /// Approvals a real run would still need (dry run only).
    pub unapproved: Vec<PendingAction>,
    pub dry_run: bool,
}

/// Run one swap.
///
/// `approver` is asked about anything `req.policy` does not grant (never in a
/// dry run). `observer` receives per-chunk progress of a byte exchange.
pub fn run_swap(
    req: &SwapRequest,
    approver: &mut dyn Approver,
    observer: &mut dyn FnMut(ChunkProgress),
) -> Result<SwapReport, XmvError> {
    let mut plan = plan::build(req)?;
    plan::preflight(&mut plan, &req.policy, approver, req.dry_run)?;
    let actions = plan::describe(&plan, req);

    let mut report = SwapReport {
        strategy: plan.strategy,
        first: FileOutcome { source: plan.a.path.clone(), landing: plan.landing_a.clone() },
        second: FileOutcome { source: plan.b.path.clone(), landing: plan.landing_b.clone() },
        bytes_transferred: 0,
        verification: None,
        actions,
        unapproved: std::mem::take(&mut plan.unapproved),
        dry_run: req.dry_run,
    };

    if req.dry_run {
        info!(strategy = %report.strategy, steps = report.actions.len(), "dry run; nothing changed");
        return Ok(report);
    }

    if shutdown::is_requested() {
        warn!("shutdown requested before execution; nothing changed");
        return Err(XmvError::Interrupted);
    }

    let done = execute::execute(&plan, req, observer)?;
    report.bytes_transferred = done.bytes;
    report.verification = done.verification;
    info!(
        strategy = %report.strategy,
        first = %report.first.landing.display(),
        second = %report.second.landing.display(),
        bytes = report.bytes_transferred,
        "swap complete"
    );
    Ok(report)
}
