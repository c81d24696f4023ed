//! Query hashing
//!
//! A query hash is the SHA-256 digest of the canonical encoding of its
//! condition tree. Structurally equal trees hash identically no matter how
//! they were built or shared; any change to any field of any node changes the
//! hash. The coordinator keys in-flight executions by it.

mod encoding;

use std::fmt;

use sha2::{Digest, Sha256};

use crate::query::{Condition, Query};

pub use encoding::{encode_condition, QueryEncoder, QUERY_HASH_MAGIC, QUERY_HASH_VERSION};

/// 256-bit query hash, most significant byte first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryHash([u8; 32]);

impl QueryHash {
    pub fn of(query: &Query) -> Self {
        Self::of_condition(&query.condition)
    }

    pub fn of_condition(condition: &Condition) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(encode_condition(condition));
        Self(hasher.finalize().into())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

/// Lower-case hex of all 256 bits
impl fmt::Display for QueryHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl serde::Serialize for QueryHash {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
