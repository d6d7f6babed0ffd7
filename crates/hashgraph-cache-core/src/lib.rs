//! Hashgraph Cache Core Library
//!
//! This crate provides the shared types, error taxonomy and the rolling
//! window index store behind the per-participant event and block-signature
//! caches of a DAG gossip consensus node.
//!
//! # Modules
//!
//! - [`rolling`]: Capacity-bounded, per-participant rolling index store
//! - [`registry`]: Participant identity -> id snapshot
//! - [`types`]: Participant ids, indices and block signatures
//! - [`canonical`]: Deterministic serialization for hashing and digests
//! - [`version`]: Build version string
//! - [`error`]: Error types

pub mod canonical;
pub mod error;
pub mod registry;
pub mod rolling;
pub mod types;
pub mod version;

pub use error::{Error, Result};
pub use registry::ParticipantRegistry;
pub use rolling::{IndexPolicy, RollingIndexMap};
pub use types::*;
