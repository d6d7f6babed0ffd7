//! Anti-entropy delta planning over the participant caches
//!
//! Peers exchange [`KnownDigest`]s (participant id -> last known index) and
//! each side answers with the records the other is missing. Participants
//! whose missing range already rolled out of the window are reported for a
//! full resync instead of receiving a silently truncated delta.

use crate::caches::ParticipantCaches;
use crate::config::CacheConfig;
use hashgraph_cache_core::canonical::{canonical_bytes, from_canonical_bytes};
use hashgraph_cache_core::{BlockSignature, Error as CacheError, Index, ParticipantId, NO_INDEX};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Sync planning errors
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
    #[error("Registry mismatch: local {local}, peer {peer}")]
    RegistryMismatch { local: String, peer: String },
}

/// One participant's last known index
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownEntry {
    pub participant: ParticipantId,
    pub last_index: Index,
}

/// Known-index digest exchanged between peers
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownDigest {
    /// Fingerprint of the registry the ids refer to
    pub registry_fingerprint: [u8; 32],
    /// Sorted by participant id
    pub entries: Vec<KnownEntry>,
}

impl KnownDigest {
    pub fn new(registry_fingerprint: [u8; 32], known: &HashMap<ParticipantId, Index>) -> Self {
        let mut entries: Vec<KnownEntry> = known
            .iter()
            .map(|(participant, last_index)| KnownEntry {
                participant: *participant,
                last_index: *last_index,
            })
            .collect();
        entries.sort_by_key(|entry| entry.participant);

        Self {
            registry_fingerprint,
            entries,
        }
    }

    /// Last index the digest reports for `participant`, or [`NO_INDEX`]
    pub fn last_index(&self, participant: ParticipantId) -> Index {
        self.entries
            .binary_search_by_key(&participant, |entry| entry.participant)
            .map(|pos| self.entries[pos].last_index)
            .unwrap_or(NO_INDEX)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, CacheError> {
        canonical_bytes(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CacheError> {
        let mut digest: Self = from_canonical_bytes(bytes)?;
        digest.entries.sort_by_key(|entry| entry.participant);
        Ok(digest)
    }
}

/// Records one side holds that the other lacks
#[derive(Debug, Clone, PartialEq)]
pub struct Delta<T> {
    /// Per participant, in increasing index order
    pub records: Vec<(ParticipantId, Vec<T>)>,
    /// Participants whose missing range was already evicted
    pub resync: Vec<ParticipantId>,
    /// Whether the batch limit cut the delta short
    pub truncated: bool,
}

impl<T> Default for Delta<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            resync: Vec::new(),
            truncated: false,
        }
    }
}

impl<T> Delta<T> {
    /// Total number of records across participants
    pub fn len(&self) -> usize {
        self.records.iter().map(|(_, items)| items.len()).sum()
    }

    /// No records to send and no participant to resync
    pub fn is_empty(&self) -> bool {
        self.records.is_empty() && self.resync.is_empty()
    }
}

/// Builds digests and deltas from the local caches
pub struct SyncPlanner {
    caches: Arc<ParticipantCaches>,
    /// Maximum records per delta
    max_batch: usize,
}

impl SyncPlanner {
    pub fn new(caches: Arc<ParticipantCaches>, max_batch: usize) -> Self {
        Self { caches, max_batch }
    }

    /// Planner capped at the configured `sync_batch`
    pub fn from_config(caches: Arc<ParticipantCaches>, config: &CacheConfig) -> Self {
        Self::new(caches, config.sync_batch)
    }

    /// Maximum records per delta
    pub fn max_batch(&self) -> usize {
        self.max_batch
    }

    /// Our event digest
    pub fn events_digest(&self) -> KnownDigest {
        KnownDigest::new(
            self.caches.registry().fingerprint(),
            &self.caches.events().known(),
        )
    }

    /// Our block-signature digest
    pub fn signatures_digest(&self) -> KnownDigest {
        KnownDigest::new(
            self.caches.registry().fingerprint(),
            &self.caches.signatures().known(),
        )
    }

    /// Event hashes the peer behind `peer` is missing
    pub fn event_delta(&self, peer: &KnownDigest) -> Result<Delta<String>, SyncError> {
        let events = self.caches.events();
        self.plan(peer, events.known(), events.capacity(), |identity, skip| {
            events.get(identity, skip)
        })
    }

    /// Block signatures the peer behind `peer` is missing
    pub fn signature_delta(&self, peer: &KnownDigest) -> Result<Delta<BlockSignature>, SyncError> {
        let signatures = self.caches.signatures();
        self.plan(peer, signatures.known(), signatures.capacity(), |identity, skip| {
            signatures.get(identity, skip)
        })
    }

    fn check_registry(&self, peer: &KnownDigest) -> Result<(), SyncError> {
        let local = self.caches.registry().fingerprint();
        if peer.registry_fingerprint != local {
            warn!("Peer digest refers to a different participant registry");
            return Err(SyncError::RegistryMismatch {
                local: hex::encode(&local[..8]),
                peer: hex::encode(&peer.registry_fingerprint[..8]),
            });
        }
        Ok(())
    }

    fn plan<T, F>(
        &self,
        peer: &KnownDigest,
        local: HashMap<ParticipantId, Index>,
        capacity: usize,
        fetch: F,
    ) -> Result<Delta<T>, SyncError>
    where
        F: Fn(&str, Index) -> Result<Vec<T>, CacheError>,
    {
        self.check_registry(peer)?;

        let registry = self.caches.registry();
        let mut delta = Delta::default();
        let mut remaining = self.max_batch;

        for id in registry.ids() {
            let local_last = local.get(&id).copied().unwrap_or(NO_INDEX);
            let peer_last = peer.last_index(id);
            if local_last <= peer_last {
                continue;
            }

            // Anything at or below `local_last - capacity` is gone, including
            // index 0 for a peer that knows nothing yet.
            if peer_last < local_last - capacity as Index {
                debug!(participant = %id, peer_last, local_last, "Peer needs full resync");
                delta.resync.push(id);
                continue;
            }

            if remaining == 0 {
                delta.truncated = true;
                continue;
            }

            let Some(identity) = registry.identity(id) else {
                continue;
            };

            match fetch(identity, peer_last) {
                Ok(mut items) => {
                    if items.len() > remaining {
                        items.truncate(remaining);
                        delta.truncated = true;
                    }
                    remaining -= items.len();
                    if !items.is_empty() {
                        delta.records.push((id, items));
                    }
                }
                Err(CacheError::EvictedRange { oldest, .. }) => {
                    debug!(participant = %id, peer_last, oldest, "Peer needs full resync");
                    delta.resync.push(id);
                }
                Err(e) => return Err(e.into()),
            }
        }

        debug!(
            records = delta.len(),
            resync = delta.resync.len(),
            truncated = delta.truncated,
            "Planned sync delta"
        );
        Ok(delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hashgraph_cache_core::ParticipantRegistry;

    fn create_test_planner(cache_size: usize, max_batch: usize) -> SyncPlanner {
        let registry = ParticipantRegistry::from_identities(["alice", "bob", "carol"]).unwrap();
        let config = CacheConfig {
            cache_size,
            ..Default::default()
        };
        let caches = ParticipantCaches::new(&config, Arc::new(registry)).unwrap();
        SyncPlanner::new(Arc::new(caches), max_batch)
    }

    fn fill_events(planner: &SyncPlanner, participant: &str, count: Index) {
        for i in 0..count {
            planner
                .caches
                .events()
                .set(participant, format!("{participant}-{i}"), i)
                .unwrap();
        }
    }

    fn empty_digest(planner: &SyncPlanner) -> KnownDigest {
        KnownDigest::new(planner.caches.registry().fingerprint(), &HashMap::new())
    }

    #[test]
    fn test_digest_sorted_and_encoded() {
        let planner = create_test_planner(10, 100);
        fill_events(&planner, "bob", 3);

        let digest = planner.events_digest();
        let ids: Vec<_> = digest.entries.iter().map(|e| e.participant).collect();
        assert_eq!(ids, vec![ParticipantId(0), ParticipantId(1), ParticipantId(2)]);
        assert_eq!(digest.last_index(ParticipantId(1)), 2);
        assert_eq!(digest.last_index(ParticipantId(0)), NO_INDEX);
        assert_eq!(digest.last_index(ParticipantId(42)), NO_INDEX);

        let decoded = KnownDigest::from_bytes(&digest.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded, digest);
    }

    #[test]
    fn test_event_delta() {
        let planner = create_test_planner(10, 100);
        fill_events(&planner, "alice", 5);
        fill_events(&planner, "carol", 2);

        let mut known = HashMap::new();
        known.insert(ParticipantId(0), 2);
        known.insert(ParticipantId(2), 1);
        let peer = KnownDigest::new(planner.caches.registry().fingerprint(), &known);

        let delta = planner.event_delta(&peer).unwrap();
        assert_eq!(
            delta.records,
            vec![(
                ParticipantId(0),
                vec!["alice-3".to_string(), "alice-4".to_string()]
            )]
        );
        assert!(delta.resync.is_empty());
        assert!(!delta.truncated);
        assert_eq!(delta.len(), 2);
    }

    #[test]
    fn test_evicted_peer_needs_resync() {
        let planner = create_test_planner(3, 100);
        fill_events(&planner, "alice", 10);
        fill_events(&planner, "bob", 2);

        let mut known = HashMap::new();
        known.insert(ParticipantId(0), 1);
        let peer = KnownDigest::new(planner.caches.registry().fingerprint(), &known);

        let delta = planner.event_delta(&peer).unwrap();
        assert_eq!(delta.resync, vec![ParticipantId(0)]);
        assert_eq!(
            delta.records,
            vec![(ParticipantId(1), vec!["bob-0".to_string(), "bob-1".to_string()])]
        );
    }

    #[test]
    fn test_empty_peer_behind_window_needs_resync() {
        let planner = create_test_planner(3, 100);
        fill_events(&planner, "alice", 10);
        fill_events(&planner, "bob", 3);

        let delta = planner.event_delta(&empty_digest(&planner)).unwrap();
        assert_eq!(delta.resync, vec![ParticipantId(0)]);
        // bob still holds index 0, so the whole history fits in the window.
        assert_eq!(
            delta.records,
            vec![(
                ParticipantId(1),
                vec!["bob-0".to_string(), "bob-1".to_string(), "bob-2".to_string()]
            )]
        );
        assert!(!delta.is_empty());
    }

    #[test]
    fn test_resync_only_delta_not_empty() {
        let planner = create_test_planner(2, 100);
        fill_events(&planner, "carol", 5);

        let delta = planner.event_delta(&empty_digest(&planner)).unwrap();
        assert!(delta.records.is_empty());
        assert_eq!(delta.resync, vec![ParticipantId(2)]);
        assert_eq!(delta.len(), 0);
        assert!(!delta.is_empty());
    }

    #[test]
    fn test_batch_from_config() {
        let registry = ParticipantRegistry::from_identities(["alice", "bob"]).unwrap();
        let config = CacheConfig {
            cache_size: 10,
            sync_batch: 2,
            ..Default::default()
        };
        let caches = Arc::new(ParticipantCaches::new(&config, Arc::new(registry)).unwrap());
        let planner = SyncPlanner::from_config(caches, &config);
        assert_eq!(planner.max_batch(), 2);

        fill_events(&planner, "alice", 4);
        let delta = planner.event_delta(&empty_digest(&planner)).unwrap();
        assert!(delta.truncated);
        assert_eq!(
            delta.records,
            vec![(ParticipantId(0), vec!["alice-0".to_string(), "alice-1".to_string()])]
        );
    }

    #[test]
    fn test_batch_limit() {
        let planner = create_test_planner(10, 3);
        fill_events(&planner, "alice", 2);
        fill_events(&planner, "bob", 2);
        fill_events(&planner, "carol", 2);

        let delta = planner.event_delta(&empty_digest(&planner)).unwrap();
        assert!(delta.truncated);
        assert_eq!(delta.len(), 3);
        assert_eq!(delta.records[1], (ParticipantId(1), vec!["bob-0".to_string()]));
    }

    #[test]
    fn test_signature_delta() {
        let planner = create_test_planner(10, 100);
        let signatures = planner.caches.signatures();
        signatures.set("carol", BlockSignature::new(vec![3], 4, "a")).unwrap();
        signatures.set("carol", BlockSignature::new(vec![3], 9, "b")).unwrap();

        let mut known = HashMap::new();
        known.insert(ParticipantId(2), 4);
        let peer = KnownDigest::new(planner.caches.registry().fingerprint(), &known);

        let delta = planner.signature_delta(&peer).unwrap();
        assert_eq!(
            delta.records,
            vec![(ParticipantId(2), vec![BlockSignature::new(vec![3], 9, "b")])]
        );
        assert_eq!(planner.signatures_digest().last_index(ParticipantId(2)), 9);
    }

    #[test]
    fn test_registry_mismatch() {
        let planner = create_test_planner(10, 100);
        let peer = KnownDigest::new([7; 32], &HashMap::new());
        assert!(matches!(
            planner.event_delta(&peer),
            Err(SyncError::RegistryMismatch { .. })
        ));
    }

    #[test]
    fn test_peer_ahead_gets_nothing() {
        let planner = create_test_planner(10, 100);
        fill_events(&planner, "alice", 3);

        let mut known = HashMap::new();
        known.insert(ParticipantId(0), 8);
        let peer = KnownDigest::new(planner.caches.registry().fingerprint(), &known);

        let delta = planner.event_delta(&peer).unwrap();
        assert!(delta.is_empty());
        assert!(delta.resync.is_empty());
    }
}
