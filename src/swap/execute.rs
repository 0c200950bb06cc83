//! Execute, Verify and Commit for each strategy, plus rollback.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use super::plan::Plan;
use super::{SwapRequest, SwapStrategy};
use crate::errors::XmvError;
use crate::exchange::{ChunkProgress, exchange_observed, sibling_output};
use crate::fs_ops::{Relocation, park_path, preserve_metadata, relocate, try_atomic_move};
use crate::verify::{Verification, verify_exchange};

#[derive(Debug, Default)]
pub(super) struct Executed {
    pub bytes: u64,
    pub verification: Option<Verification>,
}

/// Remove files this run created, ignoring the ones already gone.
fn discard(paths: &[PathBuf]) {
    for p in paths {
        match fs::remove_file(p) {
            Ok(()) => debug!(path = %p.display(), "removed temporary"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => error!(path = %p.display(), error = %e, "failed to remove temporary"),
        }
    }
}

fn create_dirs(plan: &Plan) -> Result<(), XmvError> {
    for dir in &plan.create_dirs {
        fs::create_dir_all(dir).map_err(XmvError::io("create directory", dir))?;
        info!(dir = %dir.display(), "created directory");
    }
    Ok(())
}

fn remove_approved<'a>(paths: impl IntoIterator<Item = &'a PathBuf>) -> Result<(), XmvError> {
    for p in paths {
        match fs::remove_file(p) {
            Ok(()) => info!(path = %p.display(), "removed existing file"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(XmvError::io("remove existing file", p)(e)),
        }
    }
    Ok(())
}

fn rename_failure(from: &Path, to: &Path, parked: Vec<PathBuf>, source: io::Error) -> XmvError {
    XmvError::RenameFailure {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        parked,
        source,
    }
}

/// Move parked files back to their original paths. Returns the ones that
/// could not be restored.
fn unpark(pairs: &[(&PathBuf, &PathBuf)]) -> Vec<PathBuf> {
    let mut left = Vec::new();
    for (parked, original) in pairs {
        match try_atomic_move(parked, original) {
            Ok(()) => debug!(path = %original.display(), "restored parked file"),
            Err(e) => {
                error!(parked = %parked.display(), error = %e, "failed to restore parked file");
                left.push((*parked).clone());
            }
        }
    }
    left
}

/// Two-phase rename: park both sources under `.xmv-park`, then move each
/// parked file to its landing. Overlapping sources and landings never clash.
fn rename_strategy(plan: &Plan) -> Result<Executed, XmvError> {
    let (a, b) = (&plan.a.path, &plan.b.path);
    let (park_a, park_b) = (park_path(a), park_path(b));

    create_dirs(plan)?;
    remove_approved(&plan.remove)?;

    try_atomic_move(a, &park_a).map_err(|e| rename_failure(a, &park_a, Vec::new(), e))?;
    if let Err(e) = try_atomic_move(b, &park_b) {
        let parked = unpark(&[(&park_a, a)]);
        return Err(rename_failure(b, &park_b, parked, e));
    }
    debug!(a = %park_a.display(), b = %park_b.display(), "both sources parked");

    // Nothing is committed yet, so both sources can still go home.
    if let Err(e) = try_atomic_move(&park_a, &plan.landing_a) {
        let parked = unpark(&[(&park_a, a), (&park_b, b)]);
        return Err(rename_failure(&park_a, &plan.landing_a, parked, e));
    }
    if let Err(e) = try_atomic_move(&park_b, &plan.landing_b) {
        return Err(rename_failure(&park_b, &plan.landing_b, vec![park_b.clone()], e));
    }

    info!(
        first = %plan.landing_a.display(),
        second = %plan.landing_b.display(),
        "renamed into place"
    );
    Ok(Executed::default())
}

fn commit_one(output: &Path, landing: &Path, original: &fs::Metadata, keep_meta: bool) -> io::Result<()> {
    match relocate(output, landing)? {
        Relocation::Renamed => debug!(from = %output.display(), to = %landing.display(), "committed"),
        Relocation::Copied { bytes } => {
            debug!(from = %output.display(), to = %landing.display(), bytes, "committed across volumes")
        }
    }
    if keep_meta {
        preserve_metadata(landing, original);
    }
    Ok(())
}

/// Exchange at the original paths, optionally verify, then move the sibling
/// outputs to their landings.
fn byte_exchange(
    plan: &Plan,
    req: &SwapRequest,
    observer: &mut dyn FnMut(ChunkProgress),
) -> Result<Executed, XmvError> {
    let (a, b) = (&plan.a.path, &plan.b.path);
    let siblings = [sibling_output(a), sibling_output(b)];

    let (stale, conflicts): (Vec<&PathBuf>, Vec<&PathBuf>) =
        plan.remove.iter().partition(|p| siblings.contains(*p));
    remove_approved(stale)?;

    let exchanged = match exchange_observed(a, b, req.chunk_mode.bytes(), observer) {
        Ok(r) => r,
        Err(e) => {
            warn!(error = %e, "exchange failed; rolling back");
            discard(&siblings);
            return Err(e);
        }
    };

    let verification = if req.verify {
        match verify_exchange(&exchanged.output_a, &exchanged.output_b, a, b) {
            Ok(v) => Some(v),
            Err(e) => {
                discard(&siblings);
                return Err(e);
            }
        }
    } else {
        None
    };

    if let Err(e) = create_dirs(plan).and_then(|_| remove_approved(conflicts)) {
        discard(&siblings);
        return Err(e);
    }

    // Sibling of B carries A's bytes and goes to A's landing; and vice versa.
    if let Err(e) = commit_one(&exchanged.output_b, &plan.landing_a, &plan.a.meta, req.preserve_metadata) {
        // A sibling is the last copy of its content once that original is gone.
        let mut orphaned = Vec::new();
        let mut spare = Vec::new();
        for (output, original) in [(&exchanged.output_a, b), (&exchanged.output_b, a)] {
            if output.exists() && !original.exists() {
                orphaned.push(output.clone());
            } else {
                spare.push(output.clone());
            }
        }
        discard(&spare);
        return Err(rename_failure(&exchanged.output_b, &plan.landing_a, orphaned, e));
    }
    if let Err(e) = commit_one(&exchanged.output_a, &plan.landing_b, &plan.b.meta, req.preserve_metadata) {
        return Err(rename_failure(
            &exchanged.output_a,
            &plan.landing_b,
            vec![exchanged.output_a.clone()],
            e,
        ));
    }

    for original in [a, b] {
        if *original != plan.landing_a && *original != plan.landing_b {
            fs::remove_file(original).map_err(XmvError::io("remove relocated original", original))?;
            debug!(path = %original.display(), "removed original");
        }
    }

    let bytes = exchanged.bytes_written.0 + exchanged.bytes_written.1;
    info!(bytes, chunks = exchanged.chunks, verified = verification.is_some(), "byte exchange committed");
    Ok(Executed { bytes, verification })
}

pub(super) fn execute(
    plan: &Plan,
    req: &SwapRequest,
    observer: &mut dyn FnMut(ChunkProgress),
) -> Result<Executed, XmvError> {
    match plan.strategy {
        SwapStrategy::AtomicRenameInPlace | SwapStrategy::AtomicRenameRelocate => rename_strategy(plan),
        SwapStrategy::ByteExchange => byte_exchange(plan, req, observer),
    }
}
