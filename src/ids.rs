// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Document identifiers and token digests.

use ring::rand::{SecureRandom, SystemRandom};
use sha2::{Digest, Sha256};

/// Generate `len` random bytes, hex encoded.
pub fn random_hex(len: usize) -> String {
    let mut buf = vec![0u8; len];
    SystemRandom::new()
        .fill(&mut buf)
        .expect("system RNG unavailable");
    hex::encode(buf)
}

/// A fresh 96-bit document id (24 hex characters).
pub fn new_document_id() -> String {
    random_hex(12)
}

/// Hex SHA-256 digest, used to derive document ids from secrets and emails
/// without storing them in the id itself.
pub fn digest_hex(value: &str) -> String {
    hex::encode(Sha256::digest(value.as_bytes()))
}
