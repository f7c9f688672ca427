//! Session identifier generation.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;

/// Random bytes behind every session identifier.
pub const SID_BYTES: usize = 24;

/// Generate a new URL-safe session identifier.
pub fn generate_sid() -> String {
    let mut bytes = [0u8; SID_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
