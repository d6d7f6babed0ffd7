//! Shared types for the participant caches

use serde::{Deserialize, Serialize};
use std::fmt;

/// Record index. Insertion indices are non-negative; [`NO_INDEX`] marks
/// "nothing known".
pub type Index = i64;

/// Sentinel reported for participants with no insertions.
pub const NO_INDEX: Index = -1;

/// Dense, stable participant identifier assigned by the registry
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ParticipantId(pub u32);

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ParticipantId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// A record that declares the index it must be stored at.
pub trait IndexedRecord {
    /// Block height (or other index) this record attests to
    fn index(&self) -> Index;
}

// =============================================================================
// BLOCK SIGNATURE
// =============================================================================

/// A validator's signature over a block, tagged with the block index
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct BlockSignature {
    /// Validator public key bytes
    pub validator: Vec<u8>,
    /// Height of the signed block
    pub index: Index,
    /// Encoded signature
    pub signature: String,
}

impl BlockSignature {
    pub fn new(validator: impl Into<Vec<u8>>, index: Index, signature: impl Into<String>) -> Self {
        Self {
            validator: validator.into(),
            index,
            signature: signature.into(),
        }
    }

    /// Upper-case hex of the validator key, `0X` prefixed
    pub fn validator_hex(&self) -> String {
        format!("0X{}", hex::encode_upper(&self.validator))
    }

    /// Unique key of this signature: `"{index}-{validator_hex}"`
    pub fn key(&self) -> String {
        format!("{}-{}", self.index, self.validator_hex())
    }
}

impl IndexedRecord for BlockSignature {
    fn index(&self) -> Index {
        self.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_signature_key() {
        let sig = BlockSignature::new(vec![0xab, 0x01], 7, "sig");
        assert_eq!(sig.validator_hex(), "0XAB01");
        assert_eq!(sig.key(), "7-0XAB01");
        assert_eq!(IndexedRecord::index(&sig), 7);
    }

    #[test]
    fn test_participant_id_display() {
        assert_eq!(ParticipantId(12).to_string(), "12");
        assert!(ParticipantId(1) < ParticipantId(2));
    }
}
