// Hash computation module
// Provides the algorithm enum and streaming digest computation

use std::fmt;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha512};

use super::error::HashUtilityError;
use super::path_utils::write_path;

/// Supported hash algorithms
///
/// Each variant carries its own read block size, a multiple of the
/// algorithm's internal block size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HashAlgorithm {
    #[default]
    Md5,
    Sha1,
    Sha256,
    Sha512,
}

impl HashAlgorithm {
    pub const ALL: [HashAlgorithm; 4] = [
        HashAlgorithm::Md5,
        HashAlgorithm::Sha1,
        HashAlgorithm::Sha256,
        HashAlgorithm::Sha512,
    ];

    /// Bytes read from the file per update call
    pub const fn block_size(self) -> usize {
        match self {
            HashAlgorithm::Md5 => 128 * 512,    // 65536
            HashAlgorithm::Sha1 => 160 * 512,   // 81920
            HashAlgorithm::Sha256 => 256 * 512, // 131072
            HashAlgorithm::Sha512 => 512 * 512, // 262144
        }
    }

    /// Digest size in bytes
    pub const fn output_size(self) -> usize {
        match self {
            HashAlgorithm::Md5 => 16,    // 128 bits
            HashAlgorithm::Sha1 => 20,   // 160 bits
            HashAlgorithm::Sha256 => 32, // 256 bits
            HashAlgorithm::Sha512 => 64, // 512 bits
        }
    }

    /// Length of the hex-encoded digest
    pub const fn hex_len(self) -> usize {
        self.output_size() * 2
    }

    pub const fn name(self) -> &'static str {
        match self {
            HashAlgorithm::Md5 => "md5",
            HashAlgorithm::Sha1 => "sha1",
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha512 => "sha512",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = HashUtilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "md5" => Ok(HashAlgorithm::Md5),
            "sha1" | "sha-1" => Ok(HashAlgorithm::Sha1),
            "sha256" | "sha-256" => Ok(HashAlgorithm::Sha256),
            "sha512" | "sha-512" => Ok(HashAlgorithm::Sha512),
            _ => Err(HashUtilityError::UnsupportedAlgorithm {
                algorithm: s.to_string(),
            }),
        }
    }
}

/// Result of a hash computation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashResult {
    pub algorithm: HashAlgorithm,
    pub hash: String, // hex-encoded
    pub file_path: PathBuf,
}

impl fmt::Display for HashResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.hash, self.file_path.display())
    }
}

impl HashResult {
    /// Write `<hash> <path>\n`, the path as its raw bytes where the
    /// platform has them, so names that are not UTF-8 survive intact
    pub fn write_line<W: Write + ?Sized>(&self, out: &mut W) -> io::Result<()> {
        out.write_all(self.hash.as_bytes())?;
        out.write_all(b" ")?;
        write_path(out, &self.file_path)?;
        out.write_all(b"\n")
    }
}

/// Compute the hex digest of a file, streaming it in algorithm-sized blocks
pub fn digest(path: &Path, algorithm: HashAlgorithm) -> Result<String, HashUtilityError> {
    let file = File::open(path)
        .map_err(|e| HashUtilityError::from_io_error(e, "reading", Some(path.to_path_buf())))?;

    digest_reader(file, algorithm)
        .map_err(|e| HashUtilityError::from_io_error(e, "reading", Some(path.to_path_buf())))
}

/// Compute the hex digest of any reader
pub fn digest_reader<R: Read>(reader: R, algorithm: HashAlgorithm) -> io::Result<String> {
    let block_size = algorithm.block_size();
    let bytes = match algorithm {
        HashAlgorithm::Md5 => stream::<Md5, _>(reader, block_size)?,
        HashAlgorithm::Sha1 => stream::<Sha1, _>(reader, block_size)?,
        HashAlgorithm::Sha256 => stream::<Sha256, _>(reader, block_size)?,
        HashAlgorithm::Sha512 => stream::<Sha512, _>(reader, block_size)?,
    };
    Ok(hex::encode(bytes))
}

/// Compute the hex digest of an in-memory buffer
pub fn digest_bytes(data: &[u8], algorithm: HashAlgorithm) -> String {
    match algorithm {
        HashAlgorithm::Md5 => hex::encode(Md5::digest(data)),
        HashAlgorithm::Sha1 => hex::encode(Sha1::digest(data)),
        HashAlgorithm::Sha256 => hex::encode(Sha256::digest(data)),
        HashAlgorithm::Sha512 => hex::encode(Sha512::digest(data)),
    }
}

/// Feed the reader through the hasher one block at a time
fn stream<D: Digest, R: Read>(mut reader: R, block_size: usize) -> io::Result<Vec<u8>> {
    let mut hasher = D::new();
    let mut buffer = vec![0u8; block_size];

    loop {
        let bytes_read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hasher.finalize().to_vec())
}
