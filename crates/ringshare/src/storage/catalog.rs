//! Bidirectional filename <-> slot catalog.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::ring::HASH_RANGE;

/// A stored filename and the slot it was assigned on this node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub filename: String,
    pub slot: u32,
}

/// Node-local catalog. Each slot maps to at most one filename and vice versa.
///
/// The catalog itself is plain data; the node wraps it in a lock so that
/// assignment, insertion and removal are mutually exclusive.
#[derive(Debug, Default, Clone)]
pub struct FileCatalog {
    by_name: HashMap<String, u32>,
    by_slot: BTreeMap<u32, String>,
}

impl FileCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `filename` under `slot`.
    ///
    /// Re-inserting a name under the slot it already holds is a no-op; a slot
    /// held by a different name is rejected, as is moving an existing name.
    pub fn insert(&mut self, filename: &str, slot: u32) -> Result<()> {
        if slot >= HASH_RANGE {
            return Err(Error::Protocol(format!("slot {slot} outside 0..{HASH_RANGE}")));
        }
        if let Some(existing) = self.by_slot.get(&slot) {
            if existing == filename {
                return Ok(());
            }
            return Err(Error::SlotTaken { slot, existing: existing.clone() });
        }
        if let Some(current) = self.by_name.get(filename) {
            return Err(Error::SlotTaken { slot: *current, existing: filename.to_string() });
        }

        self.by_name.insert(filename.to_string(), slot);
        self.by_slot.insert(slot, filename.to_string());
        Ok(())
    }

    /// Remove a filename, returning the slot it held
    pub fn remove(&mut self, filename: &str) -> Option<u32> {
        let slot = self.by_name.remove(filename)?;
        self.by_slot.remove(&slot);
        Some(slot)
    }

    pub fn slot_of(&self, filename: &str) -> Option<u32> {
        self.by_name.get(filename).copied()
    }

    pub fn file_at(&self, slot: u32) -> Option<&str> {
        self.by_slot.get(&slot).map(String::as_str)
    }

    pub fn contains(&self, filename: &str) -> bool {
        self.by_name.contains_key(filename)
    }

    pub fn is_occupied(&self, slot: u32) -> bool {
        self.by_slot.contains_key(&slot)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.by_slot.len() as u32 >= HASH_RANGE
    }

    /// All entries ordered by slot
    pub fn entries(&self) -> Vec<CatalogEntry> {
        self.by_slot
            .iter()
            .map(|(slot, filename)| CatalogEntry { filename: filename.clone(), slot: *slot })
            .collect()
    }
}
