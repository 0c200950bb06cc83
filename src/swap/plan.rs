//! Validate, resolve, classify and preflight: everything that runs before the
//! first byte on disk changes.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::policy::{Approver, ConfirmationPolicy, PendingAction};
use super::{PlannedAction, SwapRequest, SwapStrategy};
use crate::destination::{FileSlot, resolve};
use crate::errors::XmvError;
use crate::exchange::sibling_output;
use crate::fs_ops::{ensure_space, park_path};
use crate::volume::{all_on_one_volume, same_volume};

/// One validated input.
#[derive(Debug, Clone)]
pub(super) struct Source {
    pub path: PathBuf,
    pub len: u64,
    pub meta: fs::Metadata,
}

/// Result of the pre-mutation states.
#[derive(Debug)]
pub(super) struct Plan {
    pub a: Source,
    pub b: Source,
    /// Where A's content ends up.
    pub landing_a: PathBuf,
    /// Where B's content ends up.
    pub landing_b: PathBuf,
    pub strategy: SwapStrategy,
    /// Approved directories to create, in creation order.
    pub create_dirs: Vec<PathBuf>,
    /// Approved files to remove (conflicts at landings, stale temporaries).
    pub remove: Vec<PathBuf>,
    /// Actions neither the policy nor the approver granted (dry run only).
    pub unapproved: Vec<PendingAction>,
}

fn validate_one(raw: &Path) -> Result<Source, XmvError> {
    let meta = match fs::metadata(raw) {
        Ok(m) => m,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(XmvError::SourceMissing(raw.to_path_buf()));
        }
        Err(e) => return Err(XmvError::io("inspect source", raw)(e)),
    };
    if !meta.is_file() {
        return Err(XmvError::NotRegularFile(raw.to_path_buf()));
    }
    let path = dunce::canonicalize(raw).map_err(XmvError::io("canonicalize source", raw))?;
    Ok(Source { path, len: meta.len(), meta })
}

/// Both inputs exist, are regular files and are not the same file.
pub(super) fn validate(first: &Path, second: &Path) -> Result<(Source, Source), XmvError> {
    let a = validate_one(first)?;
    let b = validate_one(second)?;
    if a.path == b.path {
        return Err(XmvError::SameFile(a.path));
    }
    Ok((a, b))
}

/// Where each file's content lands. A file whose destination is its own path
/// keeps its slot in the swap and lands at the other file's path.
pub(super) fn landings(
    a: &Path,
    b: &Path,
    dest_a: &Path,
    dest_b: &Path,
) -> Result<(PathBuf, PathBuf), XmvError> {
    let landing_a = if dest_a == a { b.to_path_buf() } else { dest_a.to_path_buf() };
    let landing_b = if dest_b == b { a.to_path_buf() } else { dest_b.to_path_buf() };
    if landing_a == landing_b {
        return Err(XmvError::DestinationCollision(landing_a));
    }
    Ok((landing_a, landing_b))
}

/// Pick the execution strategy for this run.
pub(super) fn classify(
    a: &Path,
    b: &Path,
    landing_a: &Path,
    landing_b: &Path,
    in_place: bool,
) -> SwapStrategy {
    if in_place {
        return SwapStrategy::ByteExchange;
    }
    if !all_on_one_volume(&[a, b, landing_a, landing_b]) {
        return SwapStrategy::ByteExchange;
    }
    if landing_a == b && landing_b == a {
        SwapStrategy::AtomicRenameInPlace
    } else {
        SwapStrategy::AtomicRenameRelocate
    }
}

/// Nearest ancestor of `path` (itself included) that exists.
fn nearest_existing(path: &Path) -> Option<&Path> {
    path.ancestors().find(|p| p.exists())
}

fn check_space_for_exchange(plan: &Plan) -> Result<(), XmvError> {
    let dir_a = plan.a.path.parent().unwrap_or(plan.a.path.as_path());
    let dir_b = plan.b.path.parent().unwrap_or(plan.b.path.as_path());

    // Sibling of A receives B's bytes and vice versa.
    if same_volume(dir_a, dir_b) {
        ensure_space(dir_a, plan.a.len.saturating_add(plan.b.len))?;
    } else {
        ensure_space(dir_a, plan.b.len)?;
        ensure_space(dir_b, plan.a.len)?;
    }

    // A landing off the volume of the sibling that feeds it needs a full copy.
    for (landing, feeder, len) in [
        (&plan.landing_a, dir_b, plan.a.len),
        (&plan.landing_b, dir_a, plan.b.len),
    ] {
        if let Some(existing) = nearest_existing(landing) {
            if !same_volume(existing, feeder) {
                ensure_space(existing, len)?;
            }
        }
    }
    Ok(())
}

/// Walk up from `dir` to the first entry that exists. NotFound and
/// NotADirectory just mean "keep climbing"; anything else is fatal.
fn existing_ancestor(dir: &Path) -> Result<Option<(&Path, fs::Metadata)>, XmvError> {
    for p in dir.ancestors().filter(|p| !p.as_os_str().is_empty()) {
        match fs::metadata(p) {
            Ok(m) => return Ok(Some((p, m))),
            Err(e) if matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::NotADirectory) => {}
            Err(e) => return Err(XmvError::io("inspect destination directory", p)(e)),
        }
    }
    Ok(None)
}

/// `Some(meta)` when something sits at `path`, `None` when nothing does.
fn entry_at(path: &Path, step: &'static str) -> Result<Option<fs::Metadata>, XmvError> {
    match fs::symlink_metadata(path) {
        Ok(m) => Ok(Some(m)),
        Err(e) if matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::NotADirectory) => Ok(None),
        Err(e) => Err(XmvError::io(step, path)(e)),
    }
}

/// Collect what needs permission, in a stable order.
///
/// A landing whose nearest existing ancestor is not a directory can never be
/// reached, so it is refused here instead of failing after the sources moved.
fn pending_actions(plan: &Plan) -> Result<Vec<PendingAction>, XmvError> {
    let sources = [plan.a.path.as_path(), plan.b.path.as_path()];
    let mut dirs = BTreeSet::new();
    let mut files = BTreeSet::new();

    for landing in [&plan.landing_a, &plan.landing_b] {
        if let Some(parent) = landing.parent().filter(|p| !p.as_os_str().is_empty()) {
            match existing_ancestor(parent)? {
                Some((found, meta)) if !meta.is_dir() => {
                    return Err(XmvError::DestinationConflict(found.to_path_buf()));
                }
                Some((found, _)) if found == parent => {}
                _ => {
                    dirs.insert(parent.to_path_buf());
                }
            }
        }
        match entry_at(landing, "inspect destination")? {
            Some(m) if m.is_dir() => return Err(XmvError::DestinationConflict(landing.clone())),
            Some(_) if !sources.contains(&landing.as_path()) => {
                files.insert(landing.clone());
            }
            _ => {}
        }
    }

    let temporaries: Vec<PathBuf> = match plan.strategy {
        SwapStrategy::ByteExchange => sources.iter().map(|s| sibling_output(s)).collect(),
        _ => sources.iter().map(|s| park_path(s)).collect(),
    };
    for tmp in temporaries {
        match entry_at(&tmp, "inspect temporary")? {
            Some(m) if m.is_dir() => return Err(XmvError::DestinationConflict(tmp)),
            Some(_) => {
                files.insert(tmp);
            }
            None => {}
        }
    }

    let mut actions: Vec<PendingAction> = dirs.into_iter().map(PendingAction::CreateDirectory).collect();
    actions.extend(files.into_iter().map(PendingAction::Overwrite));
    Ok(actions)
}

fn refusal(action: PendingAction) -> XmvError {
    match action {
        PendingAction::CreateDirectory(p) => XmvError::DirectoryMissing(p),
        PendingAction::Overwrite(p) => XmvError::DestinationConflict(p),
    }
}

/// Free space, directories and conflicts. Never mutates anything; in a dry
/// run the approver is not consulted.
pub(super) fn preflight(
    plan: &mut Plan,
    policy: &ConfirmationPolicy,
    approver: &mut dyn Approver,
    dry_run: bool,
) -> Result<(), XmvError> {
    if plan.strategy == SwapStrategy::ByteExchange {
        check_space_for_exchange(plan)?;
    }

    for action in pending_actions(plan)? {
        let granted = if policy.allows(&action) {
            true
        } else if dry_run {
            false
        } else {
            approver.approve(&action)
        };

        debug!(%action, granted, "preflight action");
        match (granted, action) {
            (true, PendingAction::CreateDirectory(p)) => plan.create_dirs.push(p),
            (true, PendingAction::Overwrite(p)) => plan.remove.push(p),
            (false, action) if dry_run => plan.unapproved.push(action),
            (false, action) => return Err(refusal(action)),
        }
    }
    Ok(())
}

/// Build the plan for `req`: Validate, ResolveDestinations, ClassifyStrategy.
pub(super) fn build(req: &SwapRequest) -> Result<Plan, XmvError> {
    let (a, b) = validate(&req.first, &req.second)?;

    let dest_a = resolve(&a.path, &b.path, req.destinations.for_slot(FileSlot::First));
    let dest_b = resolve(&b.path, &a.path, req.destinations.for_slot(FileSlot::Second));
    let (landing_a, landing_b) = landings(&a.path, &b.path, &dest_a, &dest_b)?;

    let in_place = dest_a == a.path && dest_b == b.path;
    let strategy = classify(&a.path, &b.path, &landing_a, &landing_b, in_place);
    info!(
        first = %a.path.display(),
        second = %b.path.display(),
        landing_first = %landing_a.display(),
        landing_second = %landing_b.display(),
        %strategy,
        "swap planned"
    );

    Ok(Plan {
        a,
        b,
        landing_a,
        landing_b,
        strategy,
        create_dirs: Vec::new(),
        remove: Vec::new(),
        unapproved: Vec::new(),
    })
}

/// The steps Execute would take, for reporting.
pub(super) fn describe(plan: &Plan, req: &SwapRequest) -> Vec<PlannedAction> {
    let mut steps: Vec<PlannedAction> = plan
        .create_dirs
        .iter()
        .cloned()
        .map(PlannedAction::CreateDirectory)
        .collect();

    let (a, b) = (&plan.a.path, &plan.b.path);
    match plan.strategy {
        SwapStrategy::ByteExchange => {
            let stale: Vec<&PathBuf> = plan
                .remove
                .iter()
                .filter(|p| **p == sibling_output(a) || **p == sibling_output(b))
                .collect();
            steps.extend(stale.iter().map(|p| PlannedAction::Remove((*p).clone())));
            steps.push(PlannedAction::Exchange {
                first: a.clone(),
                second: b.clone(),
                chunk: req.chunk_mode,
            });
            if req.verify {
                steps.push(PlannedAction::Verify);
            }
            steps.extend(
                plan.remove
                    .iter()
                    .filter(|p| !stale.contains(p))
                    .cloned()
                    .map(PlannedAction::Remove),
            );
            steps.push(PlannedAction::Move { from: sibling_output(b), to: plan.landing_a.clone() });
            steps.push(PlannedAction::Move { from: sibling_output(a), to: plan.landing_b.clone() });
            for original in [a, b] {
                if *original != plan.landing_a && *original != plan.landing_b {
                    steps.push(PlannedAction::Remove(original.clone()));
                }
            }
        }
        SwapStrategy::AtomicRenameInPlace | SwapStrategy::AtomicRenameRelocate => {
            steps.extend(plan.remove.iter().cloned().map(PlannedAction::Remove));
            steps.push(PlannedAction::Move { from: a.clone(), to: park_path(a) });
            steps.push(PlannedAction::Move { from: b.clone(), to: park_path(b) });
            steps.push(PlannedAction::Move { from: park_path(a), to: plan.landing_a.clone() });
            steps.push(PlannedAction::Move { from: park_path(b), to: plan.landing_b.clone() });
        }
    }
    steps
}
