//! Post-exchange integrity check.
//!
//! After an exchange, the sibling of A must hold exactly the bytes of the
//! original B and vice versa. Both originals are still intact at this point
//! (nothing has been committed), so they are hashed in place and compared with
//! SHA-256 digests of the produced files.

use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::Path;
use tracing::{debug, error};

use crate::errors::XmvError;

const HASH_BUF_SIZE: usize = 1024 * 1024;

/// Hex-encoded digests of the two produced files, once verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    pub hash_a: String,
    pub hash_b: String,
}

/// Stream `path` through SHA-256 and return the lowercase hex digest.
pub fn sha256_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; HASH_BUF_SIZE];
    loop {
        let n = match file.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

fn hash(path: &Path) -> Result<String, XmvError> {
    sha256_file(path).map_err(XmvError::io("hash file", path))
}

fn discard(produced: &[&Path]) {
    for p in produced {
        if let Err(e) = fs::remove_file(p) {
            if e.kind() != io::ErrorKind::NotFound {
                error!(path = %p.display(), error = %e, "failed to remove exchange output after integrity failure");
            }
        }
    }
}

fn mismatch(produced: &Path, expected: String, actual: String) -> XmvError {
    XmvError::IntegrityMismatch {
        produced: produced.to_path_buf(),
        expected,
        actual,
    }
}

/// Check that `produced_a` equals the original B and `produced_b` the original A.
///
/// On mismatch both produced files are deleted and `IntegrityMismatch` is
/// returned. The originals are only read.
pub fn verify_exchange(
    produced_a: &Path,
    produced_b: &Path,
    original_a: &Path,
    original_b: &Path,
) -> Result<Verification, XmvError> {
    let hash_a = hash(produced_a)?;
    let hash_b = hash(produced_b)?;
    let expect_a = hash(original_b)?;
    let expect_b = hash(original_a)?;

    let failure = if hash_a != expect_a {
        Some(mismatch(produced_a, expect_a, hash_a.clone()))
    } else if hash_b != expect_b {
        Some(mismatch(produced_b, expect_b, hash_b.clone()))
    } else {
        None
    };

    if let Some(err) = failure {
        error!(error = %err, "integrity check failed; discarding exchange outputs");
        discard(&[produced_a, produced_b]);
        return Err(err);
    }

    debug!(%hash_a, %hash_b, "integrity check passed");
    Ok(Verification { hash_a, hash_b })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::exchange;
    use tempfile::tempdir;

    #[test]
    fn known_digest() {
        let td = tempdir().unwrap();
        let p = td.path().join("abc");
        fs::write(&p, b"abc").unwrap();
        assert_eq!(
            sha256_file(&p).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn passes_after_correct_exchange() {
        let td = tempdir().unwrap();
        let a = td.path().join("a");
        let b = td.path().join("b");
        fs::write(&a, b"first file").unwrap();
        fs::write(&b, b"second").unwrap();
        let res = exchange(&a, &b, 4).unwrap();
        let v = verify_exchange(&res.output_a, &res.output_b, &a, &b).unwrap();
        assert_eq!(v.hash_a, sha256_file(&b).unwrap());
        assert_eq!(v.hash_b, sha256_file(&a).unwrap());
    }

    #[test]
    fn mismatch_discards_outputs_and_keeps_originals() {
        let td = tempdir().unwrap();
        let a = td.path().join("a");
        let b = td.path().join("b");
        fs::write(&a, b"HELLO").unwrap();
        fs::write(&b, b"WORLD").unwrap();
        let res = exchange(&a, &b, 4096).unwrap();
        // Corrupt one output after a correct exchange.
        fs::write(&res.output_a, b"W0RLD").unwrap();

        let err = verify_exchange(&res.output_a, &res.output_b, &a, &b).unwrap_err();
        assert_eq!(err.kind(), "integrity_mismatch");
        assert!(!res.output_a.exists());
        assert!(!res.output_b.exists());
        assert_eq!(fs::read(&a).unwrap(), b"HELLO");
        assert_eq!(fs::read(&b).unwrap(), b"WORLD");
    }
}
