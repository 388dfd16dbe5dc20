//! Derivation of WOTS+ secret chains from the master seed.
//!
//! Every leaf's WOTS+ key is derived on demand from a single 32-byte master
//! seed rather than stored individually — `O(1)` storage for a tree with up
//! to `2^h` leaves. Derivation is `SHAKE256(master_seed || leaf_index_le)`
//! expanded to `len * N` bytes and sliced into `len` chains. There is no
//! domain-separation tag byte prepended; the leaf index alone distinguishes
//! one leaf's secret material from every other leaf's (see DESIGN.md for why
//! this differs from the tagged derivation some XMSS descriptions use).

use crate::crypto::hash::{hash, N};
use crate::params::Params;
use crate::util::secure_zero;
use crate::wots::Chain;

/// Derive the `len` WOTS+ secret chain heads for leaf `index` under `master_seed`.
pub fn derive_wots_sk(params: &Params, master_seed: &[u8], index: u64) -> Vec<Chain> {
    debug_assert_eq!(master_seed.len(), N);

    let mut input = Vec::with_capacity(master_seed.len() + 4);
    input.extend_from_slice(master_seed);
    input.extend_from_slice(&(index as u32).to_le_bytes());

    let mut expanded = hash(&input, params.len() * N);
    secure_zero(&mut input);

    let chains = expanded
        .chunks_exact(N)
        .map(|chunk| chunk.to_vec())
        .collect();

    secure_zero(&mut expanded);
    chains
}
