//! hashgraph-cache - per-participant caches for hashgraph gossip sync
//!
//! This crate provides:
//! - Rolling caches of each participant's event hashes
//! - Rolling caches of each participant's block signatures
//! - Known-index digests and delta planning for anti-entropy sync
//! - Cache configuration

pub mod caches;
pub mod config;
pub mod event_cache;
pub mod signature_cache;
pub mod sync;

pub use caches::ParticipantCaches;
pub use config::CacheConfig;
pub use event_cache::ParticipantEventsCache;
pub use signature_cache::ParticipantBlockSignaturesCache;
pub use sync::{Delta, KnownDigest, SyncError, SyncPlanner};
