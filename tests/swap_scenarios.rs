//! End-to-end scenarios: strategy choice, relocation, approvals and dry runs.

use assert_fs::TempDir;
use std::fs;
use std::path::{Path, PathBuf};

use xmv::{
    DestinationSpec, NoPrompt, PendingAction, PlannedAction, SwapRequest, SwapStrategy, XmvError,
    run_swap, sha256_file,
};

fn write(p: &Path, data: &[u8]) -> PathBuf {
    fs::write(p, data).unwrap();
    dunce::canonicalize(p).unwrap()
}

fn run(req: &SwapRequest) -> Result<xmv::SwapReport, XmvError> {
    run_swap(req, &mut NoPrompt, &mut |_| {})
}

fn with_dests(a: &Path, b: &Path, d1: Option<&str>, d2: Option<&str>) -> SwapRequest {
    let mut req = SwapRequest::new(a, b);
    req.destinations = DestinationSpec::from_flags(d1, d2);
    req
}

#[test]
fn in_place_swap_exchanges_bytes() {
    let td = TempDir::new().unwrap();
    let a = write(&td.path().join("a"), b"HELLO");
    let b = write(&td.path().join("b"), b"WORLD");

    let rep = run(&SwapRequest::new(&a, &b)).unwrap();

    assert_eq!(rep.strategy, SwapStrategy::ByteExchange);
    assert_eq!(rep.bytes_transferred, 10);
    assert_eq!(fs::read(&a).unwrap(), b"WORLD");
    assert_eq!(fs::read(&b).unwrap(), b"HELLO");
    assert_eq!(rep.first.landing, b);
    assert_eq!(rep.second.landing, a);
}

#[test]
fn name_swap_is_a_pure_rename() {
    let td = TempDir::new().unwrap();
    let a = write(&td.path().join("a.txt"), b"content of a");
    let b = write(&td.path().join("b.txt"), b"content of b");
    #[cfg(unix)]
    let inode_a = {
        use std::os::unix::fs::MetadataExt;
        fs::metadata(&a).unwrap().ino()
    };

    let req = with_dests(&a, &b, b.to_str(), a.to_str());
    let rep = run(&req).unwrap();

    assert_eq!(rep.strategy, SwapStrategy::AtomicRenameInPlace);
    assert_eq!(rep.bytes_transferred, 0);
    assert_eq!(fs::read(&a).unwrap(), b"content of b");
    assert_eq!(fs::read(&b).unwrap(), b"content of a");
    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        assert_eq!(fs::metadata(&b).unwrap().ino(), inode_a, "file should have been renamed, not rewritten");
    }
}

#[test]
fn relocation_on_one_volume_uses_two_phase_rename() {
    let td = TempDir::new().unwrap();
    let a = write(&td.path().join("a.txt"), b"AAA");
    let b = write(&td.path().join("b.txt"), b"BBB");
    let moved = dunce::canonicalize(td.path()).unwrap().join("moved");

    let mut req = with_dests(&a, &b, moved.to_str(), None);
    req.policy.create_dirs = true;
    let rep = run(&req).unwrap();

    assert_eq!(rep.strategy, SwapStrategy::AtomicRenameRelocate);
    assert_eq!(fs::read(moved.join("a.txt")).unwrap(), b"AAA");
    assert_eq!(fs::read(&a).unwrap(), b"BBB");
    assert!(!b.exists());
    assert!(!td.path().join("a.txt.xmv-park").exists());
    assert!(!td.path().join("b.txt.xmv-park").exists());
}

#[test]
fn missing_directory_needs_approval() {
    let td = TempDir::new().unwrap();
    let a = write(&td.path().join("a.txt"), b"AAA");
    let b = write(&td.path().join("b.txt"), b"BBB");
    let target = dunce::canonicalize(td.path()).unwrap().join("nope");

    let err = run(&with_dests(&a, &b, target.to_str(), None)).unwrap_err();

    assert!(matches!(err, XmvError::DirectoryMissing(ref p) if *p == target), "got {err:?}");
    assert_eq!(fs::read(&a).unwrap(), b"AAA");
    assert_eq!(fs::read(&b).unwrap(), b"BBB");
    assert!(!target.exists());
}

#[test]
fn conflict_is_refused_then_approved() {
    let td = TempDir::new().unwrap();
    let a = write(&td.path().join("a.txt"), b"AAA");
    let b = write(&td.path().join("b.txt"), b"BBB");
    let sub = dunce::canonicalize(td.path()).unwrap().join("sub");
    fs::create_dir(&sub).unwrap();
    let occupied = write(&sub.join("a.txt"), b"old");

    let req = with_dests(&a, &b, sub.to_str(), None);
    let err = run(&req).unwrap_err();
    assert_eq!(err.kind(), "destination_conflict");
    assert_eq!(fs::read(&occupied).unwrap(), b"old");

    let mut asked = Vec::new();
    let mut approver = |action: &PendingAction| {
        asked.push(action.clone());
        true
    };
    run_swap(&req, &mut approver, &mut |_| {}).unwrap();
    assert_eq!(asked, vec![PendingAction::Overwrite(occupied.clone())]);
    assert_eq!(fs::read(&occupied).unwrap(), b"AAA");
}

#[test]
fn directory_in_the_way_is_always_a_conflict() {
    let td = TempDir::new().unwrap();
    let a = write(&td.path().join("a.txt"), b"AAA");
    let b = write(&td.path().join("b.txt"), b"BBB");
    let sub = dunce::canonicalize(td.path()).unwrap().join("sub");
    fs::create_dir_all(sub.join("a.txt")).unwrap();

    let mut req = with_dests(&a, &b, sub.to_str(), None);
    req.policy.assume_yes = true;
    let err = run(&req).unwrap_err();
    assert_eq!(err.kind(), "destination_conflict");
}

#[test]
fn same_landing_for_both_is_a_collision() {
    let td = TempDir::new().unwrap();
    let a = write(&td.path().join("a.txt"), b"AAA");
    let b = write(&td.path().join("b.txt"), b"BBB");
    let target = dunce::canonicalize(td.path()).unwrap().join("out.txt");

    let err = run(&with_dests(&a, &b, target.to_str(), target.to_str())).unwrap_err();
    assert_eq!(err.kind(), "destination_collision");
}

#[test]
fn stale_exchange_output_needs_approval() {
    let td = TempDir::new().unwrap();
    let a = write(&td.path().join("a"), b"HELLO");
    let b = write(&td.path().join("b"), b"WORLD");
    fs::write(td.path().join("a.xmv-swap"), b"leftover").unwrap();

    let err = run(&SwapRequest::new(&a, &b)).unwrap_err();
    assert_eq!(err.kind(), "destination_conflict");

    let mut req = SwapRequest::new(&a, &b);
    req.policy.overwrite = true;
    run(&req).unwrap();
    assert_eq!(fs::read(&a).unwrap(), b"WORLD");
    assert!(!td.path().join("a.xmv-swap").exists());
}

#[test]
fn dry_run_plans_without_touching_anything() {
    let td = TempDir::new().unwrap();
    let a = write(&td.path().join("a.txt"), b"AAA");
    let b = write(&td.path().join("b.txt"), b"BBB");
    let target = dunce::canonicalize(td.path()).unwrap().join("later");

    let mut req = with_dests(&a, &b, target.to_str(), None);
    req.dry_run = true;
    let mut never = |_: &PendingAction| -> bool { panic!("dry run must not prompt") };
    let rep = run_swap(&req, &mut never, &mut |_| {}).unwrap();

    assert!(rep.dry_run);
    assert_eq!(rep.strategy, SwapStrategy::AtomicRenameRelocate);
    assert_eq!(rep.unapproved, vec![PendingAction::CreateDirectory(target.clone())]);
    assert!(rep.actions.iter().any(|s| matches!(s, PlannedAction::Move { to, .. } if *to == target.join("a.txt"))));
    assert!(!target.exists());
    assert_eq!(fs::read(&a).unwrap(), b"AAA");
    assert_eq!(fs::read(&b).unwrap(), b"BBB");
}

#[test]
fn verify_reports_hashes_of_committed_files() {
    let td = TempDir::new().unwrap();
    let a = write(&td.path().join("a"), b"first");
    let b = write(&td.path().join("b"), b"second");

    let mut req = SwapRequest::new(&a, &b);
    req.verify = true;
    let rep = run(&req).unwrap();

    let v = rep.verification.expect("verification requested");
    assert_eq!(v.hash_a, sha256_file(&a).unwrap());
    assert_eq!(v.hash_b, sha256_file(&b).unwrap());
    assert!(rep.actions.contains(&PlannedAction::Verify));
}

#[test]
fn missing_source_is_named() {
    let td = TempDir::new().unwrap();
    let a = write(&td.path().join("a"), b"x");
    let ghost = td.path().join("ghost");

    let err = run(&SwapRequest::new(&a, &ghost)).unwrap_err();
    assert!(matches!(err, XmvError::SourceMissing(ref p) if *p == ghost));
    assert!(err.is_side_effect_free());
}

#[test]
fn preserve_metadata_follows_the_content() {
    let td = TempDir::new().unwrap();
    let a = write(&td.path().join("a"), b"old content");
    let b = write(&td.path().join("b"), b"new content");
    let stamp = filetime::FileTime::from_unix_time(1_600_000_000, 0);
    filetime::set_file_mtime(&a, stamp).unwrap();

    let mut req = SwapRequest::new(&a, &b);
    req.preserve_metadata = true;
    run(&req).unwrap();

    // A's content (and its mtime) now lives at b.
    let got = filetime::FileTime::from_last_modification_time(&fs::metadata(&b).unwrap());
    assert_eq!(got.unix_seconds(), stamp.unix_seconds());
    assert_eq!(fs::read(&b).unwrap(), b"old content");
}
