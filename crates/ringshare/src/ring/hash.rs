//! Filename to ring slot hashing.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::storage::FileCatalog;

/// Number of hash slots on the ring; slots are `0..HASH_RANGE`
pub const HASH_RANGE: u32 = 32;

/// Polynomial rolling hash (multiplier 31) over the UTF-16 code units of `name`
pub fn string_hash(name: &str) -> i32 {
    name.encode_utf16().fold(0i32, |hash, unit| hash.wrapping_mul(31).wrapping_add(i32::from(unit)))
}

/// The slot a filename hashes to before collision resolution
pub fn natural_slot(name: &str) -> u32 {
    string_hash(name).unsigned_abs() % HASH_RANGE
}

/// Result of placing a filename into a node's catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    /// Effective slot after linear probing
    pub slot: u32,
    /// Slot the name hashes to
    pub natural_slot: u32,
}

impl Assignment {
    /// Whether probing moved the file away from its natural slot
    pub fn is_relocated(&self) -> bool {
        self.slot != self.natural_slot
    }
}

/// Assigns slots against a local catalog using linear probing
#[derive(Debug, Clone, Copy, Default)]
pub struct HashAssigner;

impl HashAssigner {
    /// Pick the slot `name` should be stored under in `catalog`.
    ///
    /// A name that is already catalogued keeps its slot. Otherwise the natural
    /// slot is probed forward, wrapping, until a free one is found; if every
    /// slot is taken this fails with [`Error::CapacityExhausted`].
    pub fn assign(catalog: &FileCatalog, name: &str) -> Result<Assignment> {
        let natural = natural_slot(name);

        if let Some(slot) = catalog.slot_of(name) {
            return Ok(Assignment { slot, natural_slot: natural });
        }

        (0..HASH_RANGE)
            .map(|step| (natural + step) % HASH_RANGE)
            .find(|slot| !catalog.is_occupied(*slot))
            .map(|slot| Assignment { slot, natural_slot: natural })
            .ok_or(Error::CapacityExhausted { range: HASH_RANGE })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_hash_matches_rolling_definition() {
        assert_eq!(string_hash(""), 0);
        assert_eq!(string_hash("a"), 97);
        assert_eq!(string_hash("ab"), 97 * 31 + 98);
        // "polygenelubricants" is a well-known input whose hash is i32::MIN
        assert_eq!(string_hash("polygenelubricants"), i32::MIN);
    }

    #[test]
    fn test_natural_slot_in_range() {
        for name in ["", "a", "report.pdf", "photo.jpg", "polygenelubricants", "ünïcødé.txt"] {
            assert!(natural_slot(name) < HASH_RANGE, "{name} out of range");
        }
        assert_eq!(natural_slot("polygenelubricants"), 0);
        assert_eq!(natural_slot("a"), 97 % HASH_RANGE);
    }

    #[test]
    fn test_assign_free_slot_is_natural() {
        let catalog = FileCatalog::new();
        let assignment = HashAssigner::assign(&catalog, "a").unwrap();
        assert_eq!(assignment.slot, 1);
        assert!(!assignment.is_relocated());
    }

    #[test]
    fn test_collision_probes_to_next_free_slot() {
        // "Aa" and "BB" share a hash value
        assert_eq!(string_hash("Aa"), string_hash("BB"));

        let mut catalog = FileCatalog::new();
        let first = HashAssigner::assign(&catalog, "Aa").unwrap();
        catalog.insert("Aa", first.slot).unwrap();

        let second = HashAssigner::assign(&catalog, "BB").unwrap();
        assert_eq!(second.natural_slot, first.slot);
        assert_eq!(second.slot, (first.slot + 1) % HASH_RANGE);
        assert!(second.is_relocated());
    }

    #[test]
    fn test_probe_wraps_at_end_of_range() {
        let mut catalog = FileCatalog::new();
        // "_" is 95, which lands on the last slot
        assert_eq!(natural_slot("_"), HASH_RANGE - 1);
        catalog.insert("occupant", HASH_RANGE - 1).unwrap();

        let assignment = HashAssigner::assign(&catalog, "_").unwrap();
        assert_eq!(assignment.slot, 0);
    }

    #[test]
    fn test_existing_name_keeps_slot() {
        let mut catalog = FileCatalog::new();
        catalog.insert("a", 7).unwrap();
        let assignment = HashAssigner::assign(&catalog, "a").unwrap();
        assert_eq!(assignment.slot, 7);
        assert_eq!(assignment.natural_slot, 1);
    }

    #[test]
    fn test_full_catalog_fails_deterministically() {
        let mut catalog = FileCatalog::new();
        for slot in 0..HASH_RANGE {
            catalog.insert(&format!("file-{slot}"), slot).unwrap();
        }
        for _ in 0..2 {
            let err = HashAssigner::assign(&catalog, "one-more.txt").unwrap_err();
            assert!(matches!(err, Error::CapacityExhausted { range: HASH_RANGE }));
        }
    }

    #[test]
    fn test_never_returns_occupied_slot() {
        let mut catalog = FileCatalog::new();
        for index in 0..HASH_RANGE {
            let name = format!("doc-{index}.txt");
            let assignment = HashAssigner::assign(&catalog, &name).unwrap();
            assert!(!catalog.is_occupied(assignment.slot));
            catalog.insert(&name, assignment.slot).unwrap();
        }
        assert!(catalog.is_full());
    }
}
