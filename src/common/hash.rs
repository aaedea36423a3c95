//! Identifier scheme for files and chunks
//!
//! - File identifiers are the SHA-256 of the logical file name, hex encoded
//! - Chunk identifiers are `<file identifier>_<chunk index>`

use crate::common::{Error, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Separator between the file identifier and the chunk index.
/// Never part of the hex alphabet.
pub const CHUNK_ID_SEPARATOR: char = '_';

/// Length of a hex-encoded SHA-256 digest
pub const FILE_ID_LEN: usize = 64;

/// Identifier of a file, derived from its logical name (not its contents).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FileId(String);

impl FileId {
    /// Compute the identifier of a logical file name
    pub fn from_name(name: &str) -> Self {
        Self(hex::encode(Sha256::digest(name.as_bytes())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for FileId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let well_formed = s.len() == FILE_ID_LEN
            && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
        if !well_formed {
            return Err(Error::BadRequest(format!(
                "malformed file identifier: '{}'",
                s
            )));
        }
        Ok(Self(s.to_string()))
    }
}

impl TryFrom<String> for FileId {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<FileId> for String {
    fn from(id: FileId) -> Self {
        id.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of one chunk of a file. Also the on-disk key at a chunkserver.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChunkId {
    pub file_id: FileId,
    pub index: u64,
}

impl ChunkId {
    pub fn new(file_id: FileId, index: u64) -> Self {
        Self { file_id, index }
    }
}

impl FromStr for ChunkId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (file_part, index_part) = s.split_once(CHUNK_ID_SEPARATOR).ok_or_else(|| {
            Error::BadRequest(format!("malformed chunk identifier: '{}'", s))
        })?;

        // u64::from_str accepts a leading '+', which would break the round trip
        if index_part.is_empty() || !index_part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::BadRequest(format!(
                "error parsing chunk index in '{}'",
                s
            )));
        }
        let index = index_part.parse::<u64>().map_err(|e| {
            Error::BadRequest(format!("error parsing chunk index in '{}': {}", s, e))
        })?;

        Ok(Self {
            file_id: file_part.parse()?,
            index,
        })
    }
}

impl TryFrom<String> for ChunkId {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<ChunkId> for String {
    fn from(id: ChunkId) -> Self {
        id.to_string()
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.file_id, CHUNK_ID_SEPARATOR, self.index)
    }
}
