//! Per-participant cache of block signatures
//!
//! Signatures are stored at the block index they attest to, taken from the
//! record itself. Block indices are not produced per participant in
//! lockstep, so gaps and out-of-order heights inside the window are normal.

use hashgraph_cache_core::{
    BlockSignature, Index, IndexPolicy, IndexedRecord, ParticipantId, ParticipantRegistry, Result,
    RollingIndexMap,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Rolling window of block signatures, keyed by participant identity
#[derive(Debug)]
pub struct ParticipantBlockSignaturesCache<S = BlockSignature> {
    participants: Arc<ParticipantRegistry>,
    rim: RollingIndexMap<S>,
}

impl<S: IndexedRecord + Clone> ParticipantBlockSignaturesCache<S> {
    /// Create a cache that accepts any block height inside the window
    pub fn new(size: usize, participants: Arc<ParticipantRegistry>) -> Result<Self> {
        Self::with_policy(size, IndexPolicy::Sparse, participants)
    }

    /// Create a cache with an explicit index policy
    pub fn with_policy(
        size: usize,
        policy: IndexPolicy,
        participants: Arc<ParticipantRegistry>,
    ) -> Result<Self> {
        let rim = RollingIndexMap::new(
            "participant_block_signatures",
            size,
            policy,
            participants.ids(),
        )?;
        Ok(Self { participants, rim })
    }

    fn participant_id(&self, participant: &str) -> Result<ParticipantId> {
        self.participants.lookup(participant)
    }

    /// Signatures of `participant` with block index > `skip_index`
    pub fn get(&self, participant: &str, skip_index: Index) -> Result<Vec<S>> {
        let id = self.participant_id(participant)?;
        self.rim.get(id, skip_index)
    }

    /// Signature for block `index`
    pub fn get_item(&self, participant: &str, index: Index) -> Result<S> {
        let id = self.participant_id(participant)?;
        self.rim.get_item(id, index)
    }

    /// Signature with the highest block index
    pub fn get_last(&self, participant: &str) -> Result<S> {
        let id = self.participant_id(participant)?;
        self.rim.get_last(id)
    }

    /// Store `signature` at the block index it declares
    pub fn set(&self, participant: &str, signature: S) -> Result<()> {
        let id = self.participant_id(participant)?;
        let index = signature.index();
        self.rim.set(id, signature, index)
    }

    /// Highest block index signed by `participant`
    pub fn last_index(&self, participant: &str) -> Result<Index> {
        let id = self.participant_id(participant)?;
        self.rim.last_index(id)
    }

    /// `participant id => highest block index signed`
    pub fn known(&self) -> HashMap<ParticipantId, Index> {
        self.rim.known()
    }

    /// Clear every participant's window
    pub fn reset(&self) {
        self.rim.reset()
    }

    /// Registry snapshot the cache resolves identities with
    pub fn registry(&self) -> &Arc<ParticipantRegistry> {
        &self.participants
    }

    /// Window size per participant
    pub fn capacity(&self) -> usize {
        self.rim.capacity()
    }
}
