use sha2::{Digest, Sha256};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// Compute SHA-256 of a file via streaming reads (constant memory).
pub fn sha256_file(path: &Path) -> io::Result<[u8; 32]> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().into())
}

/// Encode a raw 32-byte hash as a lowercase hex string (64 chars).
pub fn to_hex(hash: &[u8; 32]) -> String {
    hash.iter().map(|b| format!("{b:02x}")).collect()
}

/// Identity of a source file's contents at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileFingerprint {
    pub path: PathBuf,
    pub sha256: [u8; 32],
}

impl FileFingerprint {
    /// Resolves `path` to its canonical form and hashes the contents.
    pub fn of(path: &Path) -> io::Result<Self> {
        let path = std::fs::canonicalize(path)?;
        let sha256 = sha256_file(&path)?;
        Ok(Self { path, sha256 })
    }

    pub fn hex(&self) -> String {
        to_hex(&self.sha256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_of_empty_file_is_known_vector() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        std::fs::write(&path, b"").unwrap();
        assert_eq!(
            to_hex(&sha256_file(&path).unwrap()),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn fingerprint_changes_with_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.csv");
        std::fs::write(&path, b"x\n1\n").unwrap();
        let before = FileFingerprint::of(&path).unwrap();
        assert_eq!(before, FileFingerprint::of(&path).unwrap());

        std::fs::write(&path, b"x\n2\n").unwrap();
        let after = FileFingerprint::of(&path).unwrap();
        assert_eq!(before.path, after.path);
        assert_ne!(before.sha256, after.sha256);
        assert_eq!(after.hex().len(), 64);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(FileFingerprint::of(&dir.path().join("nope.csv")).is_err());
    }
}
