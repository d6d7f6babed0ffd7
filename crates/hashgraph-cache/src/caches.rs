//! Event and signature caches built from one registry snapshot

use crate::config::CacheConfig;
use crate::event_cache::ParticipantEventsCache;
use crate::signature_cache::ParticipantBlockSignaturesCache;
use hashgraph_cache_core::version::version;
use hashgraph_cache_core::{ParticipantRegistry, Result};
use std::sync::Arc;
use tracing::info;

/// Both participant caches of a node
#[derive(Debug)]
pub struct ParticipantCaches {
    registry: Arc<ParticipantRegistry>,
    events: ParticipantEventsCache,
    signatures: ParticipantBlockSignaturesCache,
}

impl ParticipantCaches {
    pub fn new(config: &CacheConfig, registry: Arc<ParticipantRegistry>) -> Result<Self> {
        let events = ParticipantEventsCache::with_policy(
            config.cache_size,
            config.event_index_policy,
            Arc::clone(&registry),
        )?;
        let signatures = ParticipantBlockSignaturesCache::with_policy(
            config.signature_cache_size(),
            config.signature_index_policy,
            Arc::clone(&registry),
        )?;

        info!(
            version = %version(),
            participants = registry.len(),
            event_window = events.capacity(),
            signature_window = signatures.capacity(),
            "Participant caches ready"
        );

        Ok(Self {
            registry,
            events,
            signatures,
        })
    }

    pub fn events(&self) -> &ParticipantEventsCache {
        &self.events
    }

    pub fn signatures(&self) -> &ParticipantBlockSignaturesCache {
        &self.signatures
    }

    pub fn registry(&self) -> &Arc<ParticipantRegistry> {
        &self.registry
    }

    /// Clear both caches, e.g. before resynchronizing from scratch
    pub fn reset(&self) {
        self.events.reset();
        self.signatures.reset();
        info!("Participant caches reset");
    }
}
