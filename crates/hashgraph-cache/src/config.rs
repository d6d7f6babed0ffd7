//! Configuration for the participant caches

use anyhow::Context;
use clap::Args;
use hashgraph_cache_core::{IndexPolicy, ParticipantId, ParticipantRegistry};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

pub const DEFAULT_CACHE_SIZE: usize = 10_000;
pub const DEFAULT_SYNC_BATCH: usize = 1000;

/// Cache sizing and index policies
///
/// Derives [`Args`] so a node binary can `#[command(flatten)]` it into its
/// own command line, and serde so it can live in a JSON config file.
#[derive(Args, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Rolling window size per participant for event hashes
    #[arg(long, default_value_t = DEFAULT_CACHE_SIZE)]
    pub cache_size: usize,

    /// Rolling window size per participant for block signatures (defaults to cache size)
    #[arg(long)]
    pub signature_cache_size: Option<usize>,

    /// Index policy of the event cache (sequential or sparse)
    #[arg(long, default_value_t = IndexPolicy::Sequential)]
    pub event_index_policy: IndexPolicy,

    /// Index policy of the signature cache (sequential or sparse)
    #[arg(long, default_value_t = IndexPolicy::Sparse)]
    pub signature_index_policy: IndexPolicy,

    /// Maximum records per sync delta
    #[arg(long, default_value_t = DEFAULT_SYNC_BATCH)]
    pub sync_batch: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_size: DEFAULT_CACHE_SIZE,
            signature_cache_size: None,
            event_index_policy: IndexPolicy::Sequential,
            signature_index_policy: IndexPolicy::Sparse,
            sync_batch: DEFAULT_SYNC_BATCH,
        }
    }
}

impl CacheConfig {
    /// Effective window size of the signature cache
    pub fn signature_cache_size(&self) -> usize {
        self.signature_cache_size.unwrap_or(self.cache_size)
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.cache_size == 0 {
            anyhow::bail!("Cache size must be at least 1");
        }
        if self.signature_cache_size == Some(0) {
            anyhow::bail!("Signature cache size must be at least 1");
        }
        if self.sync_batch == 0 {
            anyhow::bail!("Sync batch must be at least 1");
        }
        Ok(())
    }

    /// Load and validate a JSON config file; missing fields take defaults
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)
            .with_context(|| format!("Failed to read cache config {}", path.display()))?;
        let config: Self = serde_json::from_slice(&data)
            .with_context(|| format!("Invalid cache config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }
}

/// Load a participant registry from a JSON object `{ "<identity>": <id> }`
pub fn load_registry(path: impl AsRef<Path>) -> anyhow::Result<ParticipantRegistry> {
    let path = path.as_ref();
    let data = std::fs::read(path)
        .with_context(|| format!("Failed to read participants file {}", path.display()))?;
    let participants: HashMap<String, u32> = serde_json::from_slice(&data)
        .with_context(|| format!("Invalid participants file {}", path.display()))?;
    let registry = ParticipantRegistry::new(
        participants
            .into_iter()
            .map(|(identity, id)| (identity, ParticipantId(id))),
    )?;
    Ok(registry)
}
