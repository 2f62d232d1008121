//! Canonical binary snapshot format.
//!
//! Layout: 4 magic bytes, 1 version byte, postcard payload of the roster.
//! The roster is a `BTreeMap` underneath, so encoding the same roster twice
//! yields identical bytes.

use crate::{Roster, TallyError};

/// Magic bytes identifying a Tally snapshot.
pub const SNAPSHOT_MAGIC: [u8; 4] = *b"TALY";

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u8 = 1;

/// Encode a roster into the canonical snapshot format.
pub fn export_canonical(roster: &Roster) -> Result<Vec<u8>, TallyError> {
    let payload = postcard::to_allocvec(roster)?;

    let mut out = Vec::with_capacity(SNAPSHOT_MAGIC.len() + 1 + payload.len());
    out.extend_from_slice(&SNAPSHOT_MAGIC);
    out.push(SNAPSHOT_VERSION);
    out.extend_from_slice(&payload);
    Ok(out)
}

/// Decode a canonical snapshot back into a roster.
///
/// Fails with [`TallyError::BadMagic`] or [`TallyError::UnsupportedVersion`]
/// before attempting to decode the payload, so corrupt files are reported
/// precisely.
pub fn import_canonical(data: &[u8]) -> Result<Roster, TallyError> {
    let Some((header, payload)) = data.split_at_checked(SNAPSHOT_MAGIC.len() + 1) else {
        return Err(TallyError::BadMagic);
    };

    if header[..SNAPSHOT_MAGIC.len()] != SNAPSHOT_MAGIC {
        return Err(TallyError::BadMagic);
    }

    let version = header[SNAPSHOT_MAGIC.len()];
    if version != SNAPSHOT_VERSION {
        return Err(TallyError::UnsupportedVersion(version));
    }

    Ok(postcard::from_bytes(payload)?)
}

// =============================================================================
// TESTS
// =============================================================================
