//! Rolling window index store
//!
//! Each registered participant owns a fixed array of `C` slots. An item
//! inserted at index `i` lands in slot `i mod C`, overwriting whatever index
//! sat there before. Only indices in `(last_index - C, last_index]` are
//! retrievable; anything older is reported as [`Error::EvictedRange`] so
//! callers know to fall back to a full resync instead of trusting a
//! truncated delta.
//!
//! All windows sit behind a single [`RwLock`]: reads share it, `set` and
//! `reset` take it exclusively, so a reset is never observed half done.

use crate::error::{Error, Result};
use crate::types::{Index, ParticipantId, NO_INDEX};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, trace};

/// How a window treats forward jumps in the insertion index
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexPolicy {
    /// Any forward jump is accepted (block signatures)
    #[default]
    Sparse,
    /// Once populated, the next new index must be `last_index + 1`
    Sequential,
}

impl fmt::Display for IndexPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexPolicy::Sparse => write!(f, "sparse"),
            IndexPolicy::Sequential => write!(f, "sequential"),
        }
    }
}

impl FromStr for IndexPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sparse" => Ok(IndexPolicy::Sparse),
            "sequential" => Ok(IndexPolicy::Sequential),
            other => Err(format!("unknown index policy: {other}")),
        }
    }
}

/// Circular index space of one participant
#[derive(Debug)]
struct Window<T> {
    slots: Vec<Option<(Index, T)>>,
    last_index: Index,
}

impl<T> Window<T> {
    fn new(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(|_| None).collect(),
            last_index: NO_INDEX,
        }
    }

    fn capacity(&self) -> Index {
        self.slots.len() as Index
    }

    /// Lowest index that can still be retrieved
    fn oldest(&self) -> Index {
        (self.last_index - self.capacity() + 1).max(0)
    }

    /// Whether `index` has fallen below the retained window
    fn is_evicted(&self, index: Index) -> bool {
        index >= 0 && index <= self.last_index - self.capacity()
    }

    fn slot(&self, index: Index) -> usize {
        (index as u64 % self.slots.len() as u64) as usize
    }

    fn lookup(&self, index: Index) -> Option<&T> {
        if index < 0 || self.is_evicted(index) {
            return None;
        }
        match &self.slots[self.slot(index)] {
            Some((stored, item)) if *stored == index => Some(item),
            _ => None,
        }
    }

    fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
        self.last_index = NO_INDEX;
    }
}

/// Capacity-bounded, per-participant rolling index store
pub struct RollingIndexMap<T> {
    name: String,
    capacity: usize,
    policy: IndexPolicy,
    windows: RwLock<HashMap<ParticipantId, Window<T>>>,
}

impl<T: Clone> RollingIndexMap<T> {
    /// Create a store with one empty window of `capacity` slots per id
    pub fn new(
        name: impl Into<String>,
        capacity: usize,
        policy: IndexPolicy,
        ids: impl IntoIterator<Item = ParticipantId>,
    ) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::InvalidCapacity);
        }

        let windows: HashMap<_, _> = ids
            .into_iter()
            .map(|id| (id, Window::new(capacity)))
            .collect();

        let name = name.into();
        debug!(
            store = %name,
            capacity,
            %policy,
            participants = windows.len(),
            "Created rolling index store"
        );

        Ok(Self {
            name,
            capacity,
            policy,
            windows: RwLock::new(windows),
        })
    }

    /// Window capacity shared by every participant
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Index policy applied on insertion
    pub fn policy(&self) -> IndexPolicy {
        self.policy
    }

    /// Store name used in log output
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Record `item` at `index` for participant `id`
    pub fn set(&self, id: ParticipantId, item: T, index: Index) -> Result<()> {
        if index < 0 {
            return Err(Error::InvalidIndex(index));
        }

        let mut windows = self.windows.write();
        let window = windows.get_mut(&id).ok_or(Error::UnknownKey(id))?;

        if window.is_evicted(index) {
            return Err(Error::EvictedRange {
                participant: id,
                index,
                oldest: window.oldest(),
            });
        }

        let next = window.last_index.saturating_add(1);
        if self.policy == IndexPolicy::Sequential && window.last_index >= 0 && index > next {
            return Err(Error::SkippedIndex {
                participant: id,
                expected: next,
                got: index,
            });
        }

        let slot = window.slot(index);
        if let Some((previous, _)) = &window.slots[slot] {
            if *previous != index {
                trace!(store = %self.name, participant = %id, evicted = previous, index, "Slot overwritten");
            }
        }

        window.slots[slot] = Some((index, item));
        window.last_index = window.last_index.max(index);
        Ok(())
    }

    /// Items with `index > skip_index`, in increasing index order
    ///
    /// A negative `skip_index` means the caller has nothing yet and receives
    /// the whole retained window. A non-negative `skip_index` below
    /// `last_index - C` fails with [`Error::EvictedRange`].
    pub fn get(&self, id: ParticipantId, skip_index: Index) -> Result<Vec<T>> {
        let windows = self.windows.read();
        let window = windows.get(&id).ok_or(Error::UnknownKey(id))?;

        if skip_index >= window.last_index {
            return Ok(Vec::new());
        }

        let oldest = window.oldest();
        if skip_index >= 0 && skip_index < window.last_index - window.capacity() {
            debug!(
                store = %self.name,
                participant = %id,
                skip_index,
                oldest,
                "Requested range already evicted"
            );
            return Err(Error::EvictedRange {
                participant: id,
                index: skip_index,
                oldest,
            });
        }

        let start = (skip_index + 1).max(oldest);
        Ok((start..=window.last_index)
            .filter_map(|index| window.lookup(index).cloned())
            .collect())
    }

    /// Item stored at exactly `index`
    pub fn get_item(&self, id: ParticipantId, index: Index) -> Result<T> {
        let windows = self.windows.read();
        let window = windows.get(&id).ok_or(Error::UnknownKey(id))?;

        if window.is_evicted(index) {
            return Err(Error::EvictedRange {
                participant: id,
                index,
                oldest: window.oldest(),
            });
        }

        window
            .lookup(index)
            .cloned()
            .ok_or(Error::NotFound {
                participant: id,
                index,
            })
    }

    /// Item at the highest index inserted for `id`
    pub fn get_last(&self, id: ParticipantId) -> Result<T> {
        let windows = self.windows.read();
        let window = windows.get(&id).ok_or(Error::UnknownKey(id))?;

        if window.last_index == NO_INDEX {
            return Err(Error::EmptyWindow(id));
        }

        window
            .lookup(window.last_index)
            .cloned()
            .ok_or(Error::NotFound {
                participant: id,
                index: window.last_index,
            })
    }

    /// Highest index ever inserted for `id`, or [`NO_INDEX`]
    pub fn last_index(&self, id: ParticipantId) -> Result<Index> {
        self.windows
            .read()
            .get(&id)
            .map(|window| window.last_index)
            .ok_or(Error::UnknownKey(id))
    }

    /// `participant id => last index` for every registered participant
    pub fn known(&self) -> HashMap<ParticipantId, Index> {
        self.windows
            .read()
            .iter()
            .map(|(id, window)| (*id, window.last_index))
            .collect()
    }

    /// Clear every window back to empty
    pub fn reset(&self) {
        let mut windows = self.windows.write();
        windows.values_mut().for_each(Window::clear);
        debug!(store = %self.name, participants = windows.len(), "Reset rolling index store");
    }
}

impl<T> fmt::Debug for RollingIndexMap<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RollingIndexMap")
            .field("name", &self.name)
            .field("capacity", &self.capacity)
            .field("policy", &self.policy)
            .field("participants", &self.windows.read().len())
            .finish()
    }
}
