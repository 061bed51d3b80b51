//! SHA-1 and HMAC-SHA1.
//!
//! OAuth 1.0a `HMAC-SHA1` needs these to be bit-exact; they are not meant for
//! anything that requires collision resistance.

use hmac::{Hmac, Mac};
use sha1::{Digest, Sha1};

/// Length of a SHA-1 digest in bytes.
pub const DIGEST_LEN: usize = 20;

/// SHA-1 digest of `message`.
pub fn sha1(message: &[u8]) -> [u8; DIGEST_LEN] {
    let mut digest = [0u8; DIGEST_LEN];
    digest.copy_from_slice(&Sha1::digest(message));
    digest
}

/// HMAC-SHA1 of `message` under `key`.
pub fn hmac_sha1(key: &[u8], message: &[u8]) -> [u8; DIGEST_LEN] {
    let mut mac = match Hmac::<Sha1>::new_from_slice(key) {
        Ok(mac) => mac,
        Err(_) => unreachable!("HMAC takes keys of any size"),
    };
    mac.update(message);

    let mut digest = [0u8; DIGEST_LEN];
    digest.copy_from_slice(&mac.finalize().into_bytes());
    digest
}
