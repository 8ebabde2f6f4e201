//! Content checksums for published artifacts
//!
//! Each published file gets one sidecar per configured algorithm, named
//! `{file}.{algorithm}` and holding only the lowercase hex digest.

use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha512};

/// Supported digest algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ChecksumAlgorithm {
    #[default]
    Sha256,
    Sha512,
    Blake3,
}

impl ChecksumAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChecksumAlgorithm::Sha256 => "sha256",
            ChecksumAlgorithm::Sha512 => "sha512",
            ChecksumAlgorithm::Blake3 => "blake3",
        }
    }

    /// Sidecar path for `file`, e.g. `foo.jar` -> `foo.jar.sha256`
    pub fn sidecar_path(&self, file: &Path) -> PathBuf {
        let mut name = file.as_os_str().to_os_string();
        name.push(".");
        name.push(self.as_str());
        PathBuf::from(name)
    }

    /// Hex digest of an in-memory buffer
    pub fn hash_bytes(&self, bytes: &[u8]) -> String {
        match self {
            ChecksumAlgorithm::Sha256 => to_hex(&Sha256::digest(bytes)),
            ChecksumAlgorithm::Sha512 => to_hex(&Sha512::digest(bytes)),
            ChecksumAlgorithm::Blake3 => blake3::hash(bytes).to_hex().to_string(),
        }
    }

    /// Hex digest of a file, streamed
    pub fn hash_file(&self, path: &Path) -> io::Result<String> {
        let mut reader = BufReader::new(File::open(path)?);
        match self {
            ChecksumAlgorithm::Sha256 => {
                let mut hasher = Sha256::new();
                stream(&mut reader, |chunk| hasher.update(chunk))?;
                Ok(to_hex(&hasher.finalize()))
            }
            ChecksumAlgorithm::Sha512 => {
                let mut hasher = Sha512::new();
                stream(&mut reader, |chunk| hasher.update(chunk))?;
                Ok(to_hex(&hasher.finalize()))
            }
            ChecksumAlgorithm::Blake3 => {
                let mut hasher = blake3::Hasher::new();
                stream(&mut reader, |chunk| {
                    hasher.update(chunk);
                })?;
                Ok(hasher.finalize().to_hex().to_string())
            }
        }
    }
}

impl fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChecksumAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sha256" | "sha-256" => Ok(ChecksumAlgorithm::Sha256),
            "sha512" | "sha-512" => Ok(ChecksumAlgorithm::Sha512),
            "blake3" => Ok(ChecksumAlgorithm::Blake3),
            other => Err(format!("Unknown checksum algorithm: {}", other)),
        }
    }
}

fn stream(reader: &mut impl Read, mut sink: impl FnMut(&[u8])) -> io::Result<()> {
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            return Ok(());
        }
        sink(&buf[..n]);
    }
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
