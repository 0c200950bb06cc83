//! A hash mismatch after a correct exchange removes both outputs and leaves
//! the originals untouched.

use std::fs;
use tempfile::tempdir;

use xmv::exchange::{CHUNK_SIZE_FAST, sibling_output};
use xmv::{XmvError, exchange, verify_exchange};

#[test]
fn mismatch_rolls_back_outputs() {
    let td = tempdir().unwrap();
    let a = td.path().join("a.dat");
    let b = td.path().join("b.dat");
    let a_data = vec![7u8; 10_000];
    let b_data = b"tiny".to_vec();
    fs::write(&a, &a_data).unwrap();
    fs::write(&b, &b_data).unwrap();

    let res = exchange(&a, &b, CHUNK_SIZE_FAST).unwrap();
    assert_eq!(res.bytes_written, (4, 10_000));

    // Flip one byte in the output carrying A's content.
    let mut tampered = fs::read(&res.output_b).unwrap();
    tampered[5000] ^= 0xFF;
    fs::write(&res.output_b, tampered).unwrap();

    let err = verify_exchange(&res.output_a, &res.output_b, &a, &b).unwrap_err();
    assert!(matches!(err, XmvError::IntegrityMismatch { ref produced, .. } if *produced == res.output_b));
    assert_eq!(err.code(), 7);

    assert!(!sibling_output(&a).exists());
    assert!(!sibling_output(&b).exists());
    assert_eq!(fs::read(&a).unwrap(), a_data);
    assert_eq!(fs::read(&b).unwrap(), b_data);
}
