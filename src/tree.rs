//! The Merkle tree of WOTS+ public keys that gives XMSS its single long-lived
//! public key: one root over up to `2^h` one-time keys.
//!
//! Structured after the teacher crate's `MerkleTree`/`AuthPath` pair, but
//! `hash_tree_node` here is a plain `hash(left || right)` with no
//! domain-separation prefix — the reference C source this scheme was
//! distilled from hashes tree nodes exactly that way (see DESIGN.md), unlike
//! RFC 8391-style constructions that mix in the public seed, height, and
//! index.

use crate::crypto::hash::{hash_n, N};
use crate::params::Params;
use crate::wots::{self, Chain};

/// A fully materialized tree: `nodes[0]` is the leaf layer (`2^h` entries),
/// `nodes[h]` is a single-element layer holding the root.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    nodes: Vec<Vec<[u8; N]>>,
    height: u32,
}

impl MerkleTree {
    /// Build the full tree for a key's master seed. `O(2^h)` hash calls for
    /// the leaves plus `O(2^h)` for the internal nodes — the whole tree is
    /// materialized once at keygen time.
    pub fn build(params: &Params, master_seed: &[u8]) -> Self {
        let leaf_count = params.capacity() as usize;
        let mut leaves = Vec::with_capacity(leaf_count);
        for index in 0..leaf_count as u64 {
            leaves.push(leaf_hash(params, master_seed, index));
        }

        let mut nodes = Vec::with_capacity(params.h() as usize + 1);
        nodes.push(leaves);

        for height in 0..params.h() {
            let layer = &nodes[height as usize];
            let mut next = Vec::with_capacity(layer.len() / 2);
            for pair in layer.chunks_exact(2) {
                next.push(hash_tree_node(&pair[0], &pair[1]));
            }
            nodes.push(next);
        }

        MerkleTree {
            nodes,
            height: params.h(),
        }
    }

    pub fn root(&self) -> [u8; N] {
        self.nodes[self.height as usize][0]
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// `node(height, index)`: the internal node at that level, `height=0`
    /// being the leaf layer and `height=self.height()` the single-node root
    /// layer. Panics if `height` or `index` is out of range for this tree.
    pub fn node(&self, height: u32, index: u64) -> [u8; N] {
        self.nodes[height as usize][index as usize]
    }

    /// The `h` sibling nodes on the path from leaf `leaf_index` up to the root.
    pub fn authentication_path(&self, leaf_index: u64) -> AuthPath {
        let mut auth_nodes = Vec::with_capacity(self.height as usize);
        let mut index = leaf_index as usize;

        for height in 0..self.height as usize {
            let sibling = index ^ 1;
            auth_nodes.push(self.nodes[height][sibling]);
            index >>= 1;
        }

        AuthPath::new(auth_nodes)
    }
}

/// An authentication path: the `h` sibling hashes a verifier recombines with
/// a leaf value to recompute the claimed root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthPath {
    nodes: Vec<[u8; N]>,
}

impl AuthPath {
    pub fn new(nodes: Vec<[u8; N]>) -> Self {
        AuthPath { nodes }
    }

    pub fn nodes(&self) -> &[[u8; N]] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Recompute the root implied by this path given the leaf value and its index.
    pub fn compute_root(&self, leaf: &[u8; N], leaf_index: u64) -> [u8; N] {
        let mut node = *leaf;
        let mut index = leaf_index as usize;

        for auth_node in &self.nodes {
            node = if index & 1 == 0 {
                hash_tree_node(&node, auth_node)
            } else {
                hash_tree_node(auth_node, &node)
            };
            index >>= 1;
        }

        node
    }
}

/// Leaf value for index `i`: the hash of the concatenated WOTS+ public chain
/// tails derived from `master_seed` for that leaf.
pub fn leaf_hash(params: &Params, master_seed: &[u8], index: u64) -> [u8; N] {
    let sk_chains = crate::keyderive::derive_wots_sk(params, master_seed, index);
    let pk_chains: Vec<Chain> = sk_chains
        .iter()
        .map(|sk| wots::chain_to_end(sk, params.w()))
        .collect();

    let mut concatenated = Vec::with_capacity(pk_chains.len() * N);
    for chain in &pk_chains {
        concatenated.extend_from_slice(chain);
    }
    hash_n(&concatenated)
}

fn hash_tree_node(left: &[u8; N], right: &[u8; N]) -> [u8; N] {
    let mut data = Vec::with_capacity(2 * N);
    data.extend_from_slice(left);
    data.extend_from_slice(right);
    hash_n(&data)
}
