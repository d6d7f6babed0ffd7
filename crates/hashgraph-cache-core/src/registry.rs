//! Participant registry snapshot
//!
//! Maps participant identities (e.g. hex public keys) to dense, stable
//! [`ParticipantId`]s. The registry is fixed at construction; caches only
//! ever read it.

use crate::canonical::canonical_hash;
use crate::error::{Error, Result};
use crate::types::ParticipantId;
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

const FINGERPRINT_DOMAIN: &[u8] = b"hashgraph-cache-registry-v1:";

/// Immutable identity -> id mapping
#[derive(Debug, Clone)]
pub struct ParticipantRegistry {
    by_identity: HashMap<String, ParticipantId>,
    by_id: BTreeMap<ParticipantId, String>,
    fingerprint: [u8; 32],
}

impl ParticipantRegistry {
    /// Build from explicit `(identity, id)` pairs
    pub fn new<I, S>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, ParticipantId)>,
        S: Into<String>,
    {
        let mut by_identity = HashMap::new();
        let mut by_id = BTreeMap::new();

        for (identity, id) in entries {
            let identity = identity.into();
            if by_identity.contains_key(&identity) {
                return Err(Error::DuplicateIdentity(identity));
            }
            if by_id.contains_key(&id) {
                return Err(Error::DuplicateParticipantId { id, identity });
            }
            by_identity.insert(identity.clone(), id);
            by_id.insert(id, identity);
        }

        let fingerprint = Self::derive_fingerprint(&by_id)?;

        Ok(Self {
            by_identity,
            by_id,
            fingerprint,
        })
    }

    /// Assign ids `0..n` in the order the identities are given
    pub fn from_identities<I, S>(identities: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            identities
                .into_iter()
                .enumerate()
                .map(|(i, identity)| (identity, ParticipantId(i as u32))),
        )
    }

    /// BLAKE3 over the canonical bytes of the id-ordered entries
    fn derive_fingerprint(by_id: &BTreeMap<ParticipantId, String>) -> Result<[u8; 32]> {
        let entries: Vec<(ParticipantId, &str)> =
            by_id.iter().map(|(id, identity)| (*id, identity.as_str())).collect();
        canonical_hash(FINGERPRINT_DOMAIN, &entries)
    }

    /// Resolve an identity to its participant id
    pub fn lookup(&self, identity: &str) -> Result<ParticipantId> {
        match self.by_identity.get(identity) {
            Some(id) => Ok(*id),
            None => {
                warn!(participant = identity, "Unknown participant");
                Err(Error::UnknownParticipant(identity.to_string()))
            }
        }
    }

    /// Reverse lookup
    pub fn identity(&self, id: ParticipantId) -> Option<&str> {
        self.by_id.get(&id).map(String::as_str)
    }

    /// All ids in increasing order
    pub fn ids(&self) -> impl Iterator<Item = ParticipantId> + '_ {
        self.by_id.keys().copied()
    }

    pub fn contains(&self, id: ParticipantId) -> bool {
        self.by_id.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Digest identifying this exact registry snapshot
    pub fn fingerprint(&self) -> [u8; 32] {
        self.fingerprint
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        let registry = ParticipantRegistry::from_identities(["alice", "bob"]).unwrap();
        assert_eq!(registry.lookup("alice").unwrap(), ParticipantId(0));
        assert_eq!(registry.lookup("bob").unwrap(), ParticipantId(1));
        assert_eq!(registry.identity(ParticipantId(1)), Some("bob"));
        assert_eq!(registry.identity(ParticipantId(7)), None);
        assert!(matches!(
            registry.lookup("carol"),
            Err(Error::UnknownParticipant(name)) if name == "carol"
        ));
    }

    #[test]
    fn test_ids_ordered() {
        let registry = ParticipantRegistry::new([
            ("c", ParticipantId(5)),
            ("a", ParticipantId(2)),
            ("b", ParticipantId(9)),
        ])
        .unwrap();
        let ids: Vec<_> = registry.ids().collect();
        assert_eq!(ids, vec![ParticipantId(2), ParticipantId(5), ParticipantId(9)]);
        assert_eq!(registry.len(), 3);
        assert!(registry.contains(ParticipantId(5)));
        assert!(!registry.contains(ParticipantId(0)));
    }

    #[test]
    fn test_duplicates_rejected() {
        let result = ParticipantRegistry::new([("a", ParticipantId(0)), ("b", ParticipantId(0))]);
        assert!(matches!(result, Err(Error::DuplicateParticipantId { .. })));

        let result = ParticipantRegistry::new([("a", ParticipantId(0)), ("a", ParticipantId(1))]);
        assert!(matches!(result, Err(Error::DuplicateIdentity(_))));
    }

    #[test]
    fn test_fingerprint() {
        let a = ParticipantRegistry::from_identities(["alice", "bob"]).unwrap();
        let same = ParticipantRegistry::new([("bob", ParticipantId(1)), ("alice", ParticipantId(0))])
            .unwrap();
        let swapped = ParticipantRegistry::from_identities(["bob", "alice"]).unwrap();

        // Insertion order does not matter, the id assignment does.
        assert_eq!(a.fingerprint(), same.fingerprint());
        assert_ne!(a.fingerprint(), swapped.fingerprint());
    }

    #[test]
    fn test_empty_registry() {
        let registry = ParticipantRegistry::from_identities(Vec::<String>::new()).unwrap();
        assert!(registry.is_empty());
        assert_eq!(registry.ids().count(), 0);
    }
}
