//! Error types for the participant caches

use crate::types::{Index, ParticipantId};
use thiserror::Error;

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

/// Cache error types
///
/// None of these are fatal. Callers decide whether to refuse the operation
/// (`UnknownParticipant`), fall back to a full resync (`EvictedRange`), or
/// treat the participant as having no records yet (`EmptyWindow`).
#[derive(Debug, Error)]
pub enum Error {
    /// Identity is not present in the participant registry
    #[error("unknown participant: {0}")]
    UnknownParticipant(String),

    /// Participant id was never registered with the store
    #[error("unknown participant id: {0}")]
    UnknownKey(ParticipantId),

    /// Requested index lies below the retained window
    #[error("index {index} evicted for participant {participant} (oldest retained {oldest})")]
    EvictedRange {
        participant: ParticipantId,
        index: Index,
        oldest: Index,
    },

    /// Point lookup miss (never inserted, or a gap in the window)
    #[error("index {index} not found for participant {participant}")]
    NotFound {
        participant: ParticipantId,
        index: Index,
    },

    /// No item has ever been inserted for this participant
    #[error("empty window for participant {0}")]
    EmptyWindow(ParticipantId),

    /// Sequential index policy violated
    #[error("participant {participant} skipped index: expected at most {expected}, got {got}")]
    SkippedIndex {
        participant: ParticipantId,
        expected: Index,
        got: Index,
    },

    /// Insertion index is negative
    #[error("invalid index: {0}")]
    InvalidIndex(Index),

    /// Window capacity must be at least one
    #[error("invalid capacity: window capacity must be at least 1")]
    InvalidCapacity,

    /// Two identities were assigned the same participant id
    #[error("participant id {id} assigned twice (identity {identity})")]
    DuplicateParticipantId { id: ParticipantId, identity: String },

    /// The same identity was listed twice
    #[error("participant identity listed twice: {0}")]
    DuplicateIdentity(String),

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] postcard::Error),
}
