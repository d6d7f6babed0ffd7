//! Per-participant cache of authored event hashes

use hashgraph_cache_core::{
    Index, IndexPolicy, ParticipantId, ParticipantRegistry, Result, RollingIndexMap,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Rolling window of event hashes, keyed by participant identity
#[derive(Debug)]
pub struct ParticipantEventsCache {
    participants: Arc<ParticipantRegistry>,
    rim: RollingIndexMap<String>,
}

impl ParticipantEventsCache {
    /// Create a cache that expects one new index per authored event
    pub fn new(size: usize, participants: Arc<ParticipantRegistry>) -> Result<Self> {
        Self::with_policy(size, IndexPolicy::Sequential, participants)
    }

    /// Create a cache with an explicit index policy
    pub fn with_policy(
        size: usize,
        policy: IndexPolicy,
        participants: Arc<ParticipantRegistry>,
    ) -> Result<Self> {
        let rim = RollingIndexMap::new("participant_events", size, policy, participants.ids())?;
        Ok(Self { participants, rim })
    }

    fn participant_id(&self, participant: &str) -> Result<ParticipantId> {
        self.participants.lookup(participant)
    }

    /// Event hashes of `participant` with index > `skip_index`
    pub fn get(&self, participant: &str, skip_index: Index) -> Result<Vec<String>> {
        let id = self.participant_id(participant)?;
        self.rim.get(id, skip_index)
    }

    /// Event hash at exactly `index`
    pub fn get_item(&self, participant: &str, index: Index) -> Result<String> {
        let id = self.participant_id(participant)?;
        self.rim.get_item(id, index)
    }

    /// Hash of the participant's most recent event
    pub fn get_last(&self, participant: &str) -> Result<String> {
        let id = self.participant_id(participant)?;
        self.rim.get_last(id)
    }

    /// Record the participant's event hash at `index`
    pub fn set(&self, participant: &str, hash: impl Into<String>, index: Index) -> Result<()> {
        let id = self.participant_id(participant)?;
        self.rim.set(id, hash.into(), index)
    }

    /// Highest event index seen for `participant`
    pub fn last_index(&self, participant: &str) -> Result<Index> {
        let id = self.participant_id(participant)?;
        self.rim.last_index(id)
    }

    /// `participant id => last known index`
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
