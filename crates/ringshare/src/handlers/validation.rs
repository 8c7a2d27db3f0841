//! Request validation for RingShare handlers.
//!
//! Filenames arrive from remote peers and end up as paths under the shared
//! directory, so anything that could escape it is refused.

use crate::error::{Error, Result};
use crate::ring::HASH_RANGE;

const MAX_FILENAME_BYTES: usize = 255;

/// Validate a filename used as a catalog key and on-disk name
pub fn validate_filename(name: &str) -> Result<()> {
    let reject = |reason| Err(Error::InvalidFilename { name: name.to_string(), reason });

    if name.is_empty() {
        return reject("empty name");
    }
    if name.len() > MAX_FILENAME_BYTES {
        return reject("longer than 255 bytes");
    }
    if name == "." || name == ".." {
        return reject("reserved name");
    }
    if name.contains(['/', '\\']) {
        return reject("contains a path separator");
    }
    if name.contains('\0') {
        return reject("contains a NUL byte");
    }

    Ok(())
}

/// Validate payload size
pub fn validate_payload_size(size: usize, limit: usize) -> Result<()> {
    if size > limit {
        return Err(Error::PayloadTooLarge { size, limit });
    }
    Ok(())
}

/// Validate a slot number
pub fn validate_slot(slot: u32) -> Result<()> {
    if slot >= HASH_RANGE {
        return Err(Error::InvalidSlot(slot));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_names_accepted() {
        for name in ["a", "report.pdf", ".hidden", "spaces are fine.txt", "ünïcødé"] {
            assert!(validate_filename(name).is_ok(), "{name} should be accepted");
        }
    }

    #[test]
    fn test_dangerous_names_rejected() {
        let long = "x".repeat(256);
        for name in ["", ".", "..", "../etc/passwd", "dir/file", "dir\\file", "nul\0byte", long.as_str()] {
            assert!(validate_filename(name).is_err(), "{name:?} should be rejected");
        }
    }

    #[test]
    fn test_payload_and_slot_limits() {
        assert!(validate_payload_size(10, 10).is_ok());
        assert!(matches!(validate_payload_size(11, 10), Err(Error::PayloadTooLarge { size: 11, limit: 10 })));

        assert!(validate_slot(HASH_RANGE - 1).is_ok());
        assert!(matches!(validate_slot(HASH_RANGE), Err(Error::InvalidSlot(_))));
    }
}
