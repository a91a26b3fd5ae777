//! Content fingerprinting with streaming support.
//!
//! # Overview
//! This module provides the [`Hasher`] struct for computing digests of file
//! contents. A digest covers either the leading [`PREFIX_SIZE`] bytes of a
//! file ([`DigestMode::Prefix`]) or its entire content ([`DigestMode::Full`]).
//! Full digests stream the file through a bounded buffer, so memory use does
//! not grow with file size.
//!
//! The digest algorithm is chosen when the `Hasher` is built and cannot be
//! changed afterwards, which keeps every fingerprint of one run comparable.
//!
//! # Example
//!
//! ```no_run
//! use prunedupe::scanner::{DigestMode, HashAlgorithm, Hasher};
//! use std::path::Path;
//!
//! let hasher = Hasher::new().with_algorithm(HashAlgorithm::Sha256);
//! let prefix = hasher.digest(Path::new("a.bin"), DigestMode::Prefix).unwrap();
//! let full = hasher.digest(Path::new("a.bin"), DigestMode::Full).unwrap();
//! ```

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sha2::Digest as _;

use super::HashError;

/// Number of leading bytes covered by a prefix digest.
pub const PREFIX_SIZE: usize = 1024;

/// Default read buffer for full digests.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// A 256-bit content digest.
pub type Hash = [u8; 32];

/// Digest algorithm used for fingerprints.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// BLAKE3 (fast, parallel-friendly)
    #[default]
    Blake3,
    /// SHA-256
    Sha256,
}

impl std::fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Blake3 => write!(f, "blake3"),
            Self::Sha256 => write!(f, "sha256"),
        }
    }
}

/// Which part of a file a digest covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestMode {
    /// At most the first [`PREFIX_SIZE`] bytes
    Prefix,
    /// The whole file
    Full,
}

enum DigestState {
    Blake3(Box<blake3::Hasher>),
    Sha256(sha2::Sha256),
}

impl DigestState {
    fn new(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Blake3 => Self::Blake3(Box::new(blake3::Hasher::new())),
            HashAlgorithm::Sha256 => Self::Sha256(sha2::Sha256::new()),
        }
    }

    fn update(&mut self, bytes: &[u8]) {
        match self {
            Self::Blake3(h) => {
                h.update(bytes);
            }
            Self::Sha256(h) => h.update(bytes),
        }
    }

    fn finalize(self) -> Hash {
        match self {
            Self::Blake3(h) => *h.finalize().as_bytes(),
            Self::Sha256(h) => {
                let mut out = [0u8; 32];
                out.copy_from_slice(&h.finalize());
                out
            }
        }
    }
}

/// Bounded-buffer reader that hands out a stream of byte chunks.
///
/// The stream is finite and cannot be restarted: once `next_chunk` returns
/// `Ok(None)` the underlying reader has reached end of file.
pub struct ChunkReader<R> {
    reader: R,
    buf: Vec<u8>,
    finished: bool,
}

impl<R: Read> ChunkReader<R> {
    /// Wrap `reader`, reading at most `chunk_size` bytes at a time.
    #[must_use]
    pub fn new(reader: R, chunk_size: usize) -> Self {
        Self {
            reader,
            buf: vec![0; chunk_size.max(1)],
            finished: false,
        }
    }

    /// Read the next chunk, or `None` at end of stream.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error. `Interrupted` reads are retried.
    pub fn next_chunk(&mut self) -> io::Result<Option<&[u8]>> {
        if self.finished {
            return Ok(None);
        }
        loop {
            match self.reader.read(&mut self.buf) {
                Ok(0) => {
                    self.finished = true;
                    return Ok(None);
                }
                Ok(n) => return Ok(Some(&self.buf[..n])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
    }
}

/// Streaming file hasher.
#[derive(Debug, Clone)]
pub struct Hasher {
    algorithm: HashAlgorithm,
    chunk_size: usize,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher {
    /// Create a BLAKE3 hasher with the default chunk size.
    #[must_use]
    pub fn new() -> Self {
        Self {
            algorithm: HashAlgorithm::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            shutdown_flag: None,
        }
    }

    /// Select the digest algorithm.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Set the read buffer size used for full digests.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Abort long reads when the flag becomes `true`.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// The algorithm this hasher was built with.
    #[must_use]
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Fingerprint a file.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be opened or read, or if
    /// shutdown is requested while reading. Callers should drop the file from
    /// further comparison rather than abort.
    pub fn digest(&self, path: &Path, mode: DigestMode) -> Result<Hash, HashError> {
        let file = File::open(path).map_err(|e| HashError::from_io(path, &e))?;
        match mode {
            DigestMode::Prefix => self.stream(path, file.take(PREFIX_SIZE as u64)),
            DigestMode::Full => self.stream(path, file),
        }
    }

    /// Digest of the first [`PREFIX_SIZE`] bytes of a file.
    ///
    /// # Errors
    ///
    /// See [`Hasher::digest`].
    pub fn prehash(&self, path: &Path) -> Result<Hash, HashError> {
        self.digest(path, DigestMode::Prefix)
    }

    /// Digest of the entire file.
    ///
    /// # Errors
    ///
    /// See [`Hasher::digest`].
    pub fn full_hash(&self, path: &Path) -> Result<Hash, HashError> {
        self.digest(path, DigestMode::Full)
    }

    /// Digest of an in-memory byte slice.
    #[must_use]
    pub fn digest_bytes(&self, bytes: &[u8]) -> Hash {
        let mut state = DigestState::new(self.algorithm);
        state.update(bytes);
        state.finalize()
    }

    fn stream<R: Read>(&self, path: &Path, reader: R) -> Result<Hash, HashError> {
        let mut state = DigestState::new(self.algorithm);
        let mut chunks = ChunkReader::new(reader, self.chunk_size);
        loop {
            if self.is_shutdown_requested() {
                return Err(HashError::Interrupted(path.to_path_buf()));
            }
            match chunks.next_chunk() {
                Ok(Some(chunk)) => state.update(chunk),
                Ok(None) => break,
                Err(e) => return Err(HashError::from_io(path, &e)),
            }
        }
        Ok(state.finalize())
    }
}

/// Render a digest as lowercase hex.
#[must_use]
pub fn hash_to_hex(hash: &Hash) -> String {
    use std::fmt::Write;

    hash.iter().fold(String::with_capacity(64), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}
