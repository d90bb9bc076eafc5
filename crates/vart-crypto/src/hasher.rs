use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Digest algorithm used for payload hashes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    #[default]
    Sha256,
    Blake3,
}

impl HashAlgorithm {
    /// Lowercase algorithm name, as used in metadata keys (`artifact_sha256`).
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Blake3 => "blake3",
        }
    }

    /// Length of a hex digest produced by this algorithm.
    pub fn hex_len(&self) -> usize {
        // Both algorithms produce 32-byte digests.
        64
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = HasherError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sha256" => Ok(Self::Sha256),
            "blake3" => Ok(Self::Blake3),
            _ => Err(HasherError::UnknownAlgorithm(s.to_string())),
        }
    }
}

/// Payload hasher bound to one algorithm.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ContentHasher {
    algorithm: HashAlgorithm,
}

impl ContentHasher {
    /// SHA-256 hasher.
    pub const SHA256: Self = Self {
        algorithm: HashAlgorithm::Sha256,
    };
    /// BLAKE3 hasher.
    pub const BLAKE3: Self = Self {
        algorithm: HashAlgorithm::Blake3,
    };

    pub const fn new(algorithm: HashAlgorithm) -> Self {
        Self { algorithm }
    }

    /// Raw digest bytes.
    pub fn hash(&self, data: &[u8]) -> [u8; 32] {
        match self.algorithm {
            HashAlgorithm::Sha256 => Sha256::digest(data).into(),
            HashAlgorithm::Blake3 => *blake3::hash(data).as_bytes(),
        }
    }

    /// Lowercase hex digest.
    pub fn hash_hex(&self, data: &[u8]) -> String {
        hex::encode(self.hash(data))
    }

    /// Check `data` against a previously recorded hex digest.
    pub fn verify(&self, data: &[u8], expected_hex: &str) -> bool {
        self.hash_hex(data).eq_ignore_ascii_case(expected_hex)
    }

    /// Like [`ContentHasher::verify`], returning the computed digest on mismatch.
    pub fn check(&self, data: &[u8], expected_hex: &str) -> Result<(), HasherError> {
        let computed = self.hash_hex(data);
        if computed.eq_ignore_ascii_case(expected_hex) {
            Ok(())
        } else {
            Err(HasherError::Mismatch {
                expected: expected_hex.to_string(),
                computed,
            })
        }
    }

    /// Metadata key under which payload objects record their digest.
    pub fn metadata_key(&self) -> String {
        format!("artifact_{}", self.algorithm.name())
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }
}

/// Errors from hashing operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HasherError {
    #[error("unknown hash algorithm: {0}")]
    UnknownAlgorithm(String),

    #[error("digest mismatch: expected {expected}, computed {computed}")]
    Mismatch { expected: String, computed: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_known_vector() {
        assert_eq!(
            ContentHasher::SHA256.hash_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn sha256_of_empty_input() {
        assert_eq!(
            ContentHasher::SHA256.hash_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn blake3_matches_library() {
        let expected = blake3::hash(b"hello world").to_hex().to_string();
        assert_eq!(ContentHasher::BLAKE3.hash_hex(b"hello world"), expected);
    }

    #[test]
    fn algorithms_disagree() {
        assert_ne!(
            ContentHasher::SHA256.hash_hex(b"same"),
            ContentHasher::BLAKE3.hash_hex(b"same")
        );
    }

    #[test]
    fn hex_length_matches_algorithm() {
        for alg in [HashAlgorithm::Sha256, HashAlgorithm::Blake3] {
            let hasher = ContentHasher::new(alg);
            assert_eq!(hasher.hash_hex(b"x").len(), alg.hex_len());
        }
    }

    #[test]
    fn verify_and_check() {
        let hasher = ContentHasher::default();
        let digest = hasher.hash_hex(b"payload");
        assert!(hasher.verify(b"payload", &digest));
        assert!(hasher.verify(b"payload", &digest.to_uppercase()));
        assert!(!hasher.verify(b"tampered", &digest));
        assert!(hasher.check(b"payload", &digest).is_ok());
        assert!(matches!(
            hasher.check(b"tampered", &digest),
            Err(HasherError::Mismatch { .. })
        ));
    }

    #[test]
    fn metadata_key_names_algorithm() {
        assert_eq!(ContentHasher::SHA256.metadata_key(), "artifact_sha256");
        assert_eq!(ContentHasher::BLAKE3.metadata_key(), "artifact_blake3");
    }

    #[test]
    fn default_is_sha256() {
        assert_eq!(ContentHasher::default().algorithm(), HashAlgorithm::Sha256);
    }

    #[test]
    fn parse_algorithm_names() {
        assert_eq!("sha256".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha256);
        assert_eq!("BLAKE3".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Blake3);
        assert!("md5".parse::<HashAlgorithm>().is_err());
    }

    #[test]
    fn serde_uses_lowercase_names() {
        let json = serde_json::to_string(&HashAlgorithm::Blake3).unwrap();
        assert_eq!(json, "\"blake3\"");

        #[derive(Deserialize)]
        struct Wrapper {
            hash_algorithm: HashAlgorithm,
        }
        let parsed: Wrapper = toml::from_str("hash_algorithm = \"sha256\"").unwrap();
        assert_eq!(parsed.hash_algorithm, HashAlgorithm::Sha256);
    }
}
