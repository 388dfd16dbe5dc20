//! The scheme's single hash primitive: SHAKE256, a variable-output-length XOF.
//!
//! Every hash call anywhere in this crate goes through [`hash`] or
//! [`hash_into`]. There is no second hash function in the scheme, so unlike
//! the reference `hypercube-signatures` crate's `HashFunction` trait (which
//! exists to pick between SHA-256 and SHA3-256), no trait abstraction is
//! introduced here — one concrete function is all the scheme needs.

use sha3::digest::{ExtendableOutput, Update, XofReader};
use sha3::Shake256;

/// Canonical digest size used throughout the scheme (N = 32 bytes).
pub const N: usize = 32;

/// `hash(input, output_length) -> output` backed by SHAKE256.
pub fn hash(input: &[u8], output_len: usize) -> Vec<u8> {
    let mut out = vec![0u8; output_len];
    hash_into(input, &mut out);
    out
}

/// Same as [`hash`] but writes into a caller-provided buffer, avoiding an
/// extra allocation on hot paths (hash chains call this once per iteration).
pub fn hash_into(input: &[u8], out: &mut [u8]) {
    let mut hasher = Shake256::default();
    hasher.update(input);
    let mut reader = hasher.finalize_xof();
    reader.read(out);
}

/// Convenience for the scheme's fixed N-byte digest.
pub fn hash_n(input: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    hash_into(input, &mut out);
    out
}
