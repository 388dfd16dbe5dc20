//! WOTS+: the Winternitz one-time signature primitive XMSS builds its Merkle
//! tree of public keys over.
//!
//! A WOTS+ key is `len` independent hash chains. Signing chain `i` walks it
//! forward `a_i` hash applications from the secret head, where `a_i` is a
//! base-w digit of the message digest (plus a checksum that prevents forging
//! by walking a chain further than the signer did). Verification walks the
//! remaining `w-1-a_i` steps from the signature value and must land on the
//! same chain tail the public key committed to.
//!
//! Every chain walk in this module performs exactly `w-1` hash calls
//! regardless of the digit being signed or verified — see [`chain_ct`].

use crate::crypto::hash::{hash_into, N};
use crate::params::Params;
use crate::util::{constant_time_select, mask_from_bool, secure_zero};

/// One WOTS+ chain value: an N-byte hash.
pub type Chain = Vec<u8>;

/// Walk a hash chain from `input` for exactly `w - 1` iterations, selecting
/// (in constant time) the value at position `start + steps` as the output.
///
/// This always performs `w - 1` hash invocations no matter what `start` and
/// `steps` are — the number of SHAKE256 calls never depends on secret or
/// message-derived data, only on the public parameter `w`.
pub fn chain_ct(input: &[u8], start: u32, steps: u32, w: u32) -> Chain {
    let mut current = input.to_vec();
    let mut next = vec![0u8; N];
    let mut selected = vec![0u8; N];

    for i in 0..(w - 1) {
        hash_into(&current, &mut next);
        let in_window = i >= start && i < start + steps;
        let mask = mask_from_bool(in_window);
        constant_time_select(&mut selected, &next, &current, mask);
        current.copy_from_slice(&selected);
    }

    secure_zero(&mut next);
    secure_zero(&mut selected);
    current
}

/// Full chain: `H^{w-1}(sk_i)`, used to derive a WOTS+ public chain tail from
/// its secret head (keygen and tree leaf construction).
pub fn chain_to_end(sk: &[u8], w: u32) -> Chain {
    chain_ct(sk, 0, w - 1, w)
}

/// Convert an N-byte message digest to `len` base-w digits with an appended
/// checksum, most-significant digit first.
///
/// The checksum is left-shifted by `(8 - (len2*log_w mod 8)) mod 8` bits
/// before its top `len2` digits are emitted — this shift convention matches
/// the reference C source this scheme was distilled from (see DESIGN.md).
pub fn base_w_with_checksum(digest: &[u8], params: &Params) -> Vec<u32> {
    debug_assert_eq!(digest.len(), N);

    let log_w = params.log_w();
    let w_mask = params.w() - 1;
    let mut digits = Vec::with_capacity(params.len());

    let mut total: u32 = 0;
    let mut bits: i32 = 0;
    let mut in_idx = 0usize;
    let mut checksum: u32 = 0;

    for _ in 0..params.len1() {
        if bits < log_w as i32 {
            total = (total << 8) | digest[in_idx] as u32;
            in_idx += 1;
            bits += 8;
        }
        bits -= log_w as i32;
        let digit = (total >> bits) & w_mask;
        digits.push(digit);
        checksum += w_mask - digit;
    }

    let shift = (8 - ((params.len2() as u32 * log_w) % 8)) % 8;
    checksum <<= shift;

    for i in 0..params.len2() {
        let shift_amt = (params.len2() - 1 - i) as u32 * log_w;
        digits.push((checksum >> shift_amt) & w_mask);
    }

    digits
}

/// Sign a message digest: chain `i` walks `digits[i]` steps from the secret
/// head. `sk_chains` is consumed by reference only — the caller owns zeroing
/// the secret material once it is done with it (see [`crate::keyderive`]).
pub fn wots_sign(params: &Params, msg_digest: &[u8], sk_chains: &[Chain]) -> Vec<Chain> {
    debug_assert_eq!(sk_chains.len(), params.len());
    let digits = base_w_with_checksum(msg_digest, params);
    sk_chains
        .iter()
        .zip(digits.iter())
        .map(|(sk, &digit)| chain_ct(sk, 0, digit, params.w()))
        .collect()
}

/// Recover the WOTS+ public chain tails implied by a signature over a
/// message digest: chain `i` walks the remaining `w-1-digits[i]` steps from
/// the signature value. A genuine signature reproduces the public key
/// exactly; a forged or mismatched one almost certainly does not.
pub fn wots_pk_from_sig(params: &Params, msg_digest: &[u8], sig_chains: &[Chain]) -> Vec<Chain> {
    debug_assert_eq!(sig_chains.len(), params.len());
    let digits = base_w_with_checksum(msg_digest, params);
    sig_chains
        .iter()
        .zip(digits.iter())
        .map(|(sig, &digit)| chain_ct(sig, digit, params.w() - 1 - digit, params.w()))
        .collect()
}
