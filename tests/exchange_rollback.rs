//! A byte exchange that fails after it started writing leaves the originals
//! as they were and cleans up its sibling outputs.

use std::fs;
use tempfile::tempdir;

use xmv::exchange::sibling_output;
use xmv::{PendingAction, SwapRequest, XmvError, run_swap};

#[test]
fn failed_exchange_removes_the_output_it_created() {
    let td = tempdir().unwrap();
    let dir = dunce::canonicalize(td.path()).unwrap();
    let a = dir.join("a.bin");
    let b = dir.join("b.bin");
    fs::write(&a, vec![1u8; 9000]).unwrap();
    fs::write(&b, vec![2u8; 100]).unwrap();
    fs::write(sibling_output(&a), b"stale").unwrap();
    let blocked = sibling_output(&b);

    // Approving the stale file's removal is the last step before Execute;
    // a directory planted now stops the second output from being created.
    let mut approver = |action: &PendingAction| {
        if matches!(action, PendingAction::Overwrite(_)) {
            fs::create_dir(&blocked).unwrap();
        }
        true
    };
    let err = run_swap(&SwapRequest::new(&a, &b), &mut approver, &mut |_| {}).unwrap_err();

    assert!(matches!(err, XmvError::Io { ref path, .. } if *path == blocked));
    assert_eq!(err.code(), 6);
    assert_eq!(fs::read(&a).unwrap(), vec![1u8; 9000]);
    assert_eq!(fs::read(&b).unwrap(), vec![2u8; 100]);
    assert!(!sibling_output(&a).exists());
    assert!(blocked.is_dir());
}

#[cfg(target_os = "linux")]
#[test]
fn failed_first_commit_removes_both_outputs() {
    use std::path::Path;
    use tempfile::tempdir_in;
    use xmv::{ChunkProgress, DestinationSpec, NoPrompt, same_volume};

    let shm = Path::new("/dev/shm");
    let local = tempdir().unwrap();
    let Ok(remote) = tempdir_in(shm) else {
        eprintln!("skipping: /dev/shm not writable");
        return;
    };
    if same_volume(local.path(), remote.path()) {
        eprintln!("skipping: temp dir and /dev/shm share a device");
        return;
    }
    let local_dir = dunce::canonicalize(local.path()).unwrap();
    let a = local_dir.join("a.txt");
    let b = dunce::canonicalize(remote.path()).unwrap().join("b.txt");
    fs::write(&a, b"local").unwrap();
    fs::write(&b, b"remote").unwrap();
    let out = local_dir.join("out");
    fs::create_dir(&out).unwrap();

    let mut req = SwapRequest::new(&a, &b);
    req.destinations = DestinationSpec::from_flags(out.to_str(), None);

    // Once the exchange runs, the landing directory turns into a file.
    let mut blocked = false;
    let mut observer = |_: ChunkProgress| {
        if !blocked {
            fs::remove_dir(&out).unwrap();
            fs::write(&out, b"in the way").unwrap();
            blocked = true;
        }
    };
    let err = run_swap(&req, &mut NoPrompt, &mut observer).unwrap_err();

    assert!(matches!(err, XmvError::RenameFailure { ref parked, .. } if parked.is_empty()));
    assert_eq!(fs::read(&a).unwrap(), b"local");
    assert_eq!(fs::read(&b).unwrap(), b"remote");
    assert!(!sibling_output(&a).exists());
    assert!(!sibling_output(&b).exists());
}
