//! Content-level properties of a swap, checked through the public entry point.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

use xmv::{ChunkMode, NoPrompt, SwapRequest, SwapStrategy, run_swap};

fn pair(dir: &Path, a: &[u8], b: &[u8]) -> (PathBuf, PathBuf) {
    let pa = dir.join("a.bin");
    let pb = dir.join("b.bin");
    fs::write(&pa, a).unwrap();
    fs::write(&pb, b).unwrap();
    (pa, pb)
}

fn swap(a: &Path, b: &Path, chunk: ChunkMode) -> SwapStrategy {
    let mut req = SwapRequest::new(a, b);
    req.chunk_mode = chunk;
    run_swap(&req, &mut NoPrompt, &mut |_| {}).unwrap().strategy
}

#[test]
fn swapping_twice_restores_both_files() {
    let td = tempdir().unwrap();
    let a_data: Vec<u8> = (0..10_000u32).map(|i| (i * 7 % 256) as u8).collect();
    let b_data = b"short and different".to_vec();
    let (a, b) = pair(td.path(), &a_data, &b_data);

    swap(&a, &b, ChunkMode::Fast);
    swap(&a, &b, ChunkMode::Fast);

    assert_eq!(fs::read(&a).unwrap(), a_data);
    assert_eq!(fs::read(&b).unwrap(), b_data);
}

#[test]
fn unequal_lengths_come_out_exact() {
    let td = tempdir().unwrap();
    // Longer than one secure chunk so padding would show up if it leaked.
    let a_data = vec![0xABu8; 1024 * 1024 + 17];
    let b_data = vec![0x01u8; 3];
    let (a, b) = pair(td.path(), &a_data, &b_data);

    swap(&a, &b, ChunkMode::Secure);

    assert_eq!(fs::metadata(&a).unwrap().len(), 3);
    assert_eq!(fs::read(&a).unwrap(), b_data);
    assert_eq!(fs::read(&b).unwrap(), a_data);
}

#[test]
fn identical_contents_are_preserved() {
    let td = tempdir().unwrap();
    let same = b"identical bytes on both sides".to_vec();
    let (a, b) = pair(td.path(), &same, &same);

    swap(&a, &b, ChunkMode::Fast);

    assert_eq!(fs::read(&a).unwrap(), same);
    assert_eq!(fs::read(&b).unwrap(), same);
}

#[test]
fn empty_file_trades_places_with_full_one() {
    let td = tempdir().unwrap();
    let (a, b) = pair(td.path(), b"", b"not empty");

    swap(&a, &b, ChunkMode::Fast);

    assert_eq!(fs::read(&a).unwrap(), b"not empty");
    assert_eq!(fs::metadata(&b).unwrap().len(), 0);
}

#[test]
fn no_temporaries_survive_a_successful_swap() {
    let td = tempdir().unwrap();
    let (a, b) = pair(td.path(), b"one", b"two");
    swap(&a, &b, ChunkMode::Fast);

    let names: Vec<String> = fs::read_dir(td.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names.len(), 2, "unexpected entries: {names:?}");
    assert!(names.iter().all(|n| !n.contains(".xmv-")));
}
