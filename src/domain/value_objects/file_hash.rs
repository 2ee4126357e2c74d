use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

const HEX_LEN: usize = 64;

/// SHA-256 digest of a file's full content, lowercase hex.
///
/// Together with the file name this is the dedup key inside a knowledge base.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FileHash(String);

impl FileHash {
    /// Accepts a stored digest. Case is folded so rows written by other
    /// tools compare equal.
    pub fn new(hex: String) -> Result<Self, String> {
        match hex.len() {
            HEX_LEN if hex.bytes().all(|b| b.is_ascii_hexdigit()) => {
                Ok(Self(hex.to_ascii_lowercase()))
            }
            HEX_LEN => Err(format!("'{}' is not hexadecimal", hex)),
            n => Err(format!("expected {} hex digits, got {}", HEX_LEN, n)),
        }
    }

    pub fn from_bytes(content: &[u8]) -> Self {
        Self(digest_hex(content))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

pub fn digest_hex(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

impl fmt::Display for FileHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<FileHash> for String {
    fn from(hash: FileHash) -> Self {
        hash.0
    }
}

impl TryFrom<String> for FileHash {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        FileHash::new(value)
    }
}
