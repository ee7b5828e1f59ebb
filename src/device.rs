// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Stable device fingerprint sent with trial-timer pushes.
//!
//! The backend keys device-scoped trial restrictions on this value, so it
//! must stay stable across restarts. It is derived once, cached, and reused.

use crate::store::{keys, DurableCache};
use sha2::{Digest, Sha256};

/// Get (or derive and cache) the fingerprint for this device.
pub fn device_id(cache: &DurableCache) -> String {
    if let Some(id) = cache.load::<String>(keys::DEVICE_ID) {
        return id;
    }

    let id = derive_fingerprint();
    cache.save(keys::DEVICE_ID, &id);
    id
}

/// Hash host identifiers into a hex fingerprint.
///
/// Not a security boundary: collisions only merge trial quotas, they never
/// grant access.
fn derive_fingerprint() -> String {
    let hostname = std::env::var("HOSTNAME").unwrap_or_else(|_| "unknown-host".to_string());
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown-user".to_string());

    let mut hasher = Sha256::new();
    hasher.update(hostname.as_bytes());
    hasher.update(b"\x00");
    hasher.update(user.as_bytes());
    hex::encode(&hasher.finalize()[..16])
}
