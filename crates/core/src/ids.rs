//! Photo and storage id generation.
//!
//! Ids are 256-bit random tokens rendered as 64 lowercase hex characters.
//! They are client-visible, globally unique in practice, and double as both
//! the photo's primary key and (separately minted) its storage key.
//! Collisions are astronomically rare but still handled by the upload
//! registry, which re-mints on a conflict with an existing row.

use rand::Rng;

/// Number of random bytes in a generated id (256 bits).
pub const ID_BYTES: usize = 32;

/// Length of a rendered id string (two hex chars per byte).
pub const ID_LENGTH: usize = ID_BYTES * 2;

/// Generate a new random photo/storage id.
pub fn generate_photo_id() -> String {
    let bytes: [u8; ID_BYTES] = rand::rng().random();
    hex_encode(&bytes)
}

/// Generate a new random storage id.
///
/// Same format as a photo id, minted independently so the serving key
/// never leaks the client-visible photo id.
pub fn generate_storage_id() -> String {
    generate_photo_id()
}

/// Check that a string has the shape of a generated id.
///
/// Used to reject malformed client-supplied photo ids before they reach a
/// query.
pub fn is_well_formed(id: &str) -> bool {
    id.len() == ID_LENGTH && id.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Encode bytes as a lowercase hex string.
fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
