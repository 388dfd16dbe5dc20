//! Stateful hash-based post-quantum signatures: WOTS+ one-time signatures
//! composed into an XMSS Merkle tree, with a file-backed signer that
//! guarantees no leaf index is ever reused across process restarts.

pub mod crypto;
pub mod error;
pub mod keyderive;
pub mod params;
pub mod signer;
pub mod tree;
pub mod util;
pub mod wire;
pub mod wots;

pub use error::{Error, Result};
pub use params::Params;
pub use signer::{Signer, SignerPaths, XmssKey};
pub use wire::{deserialize_sig, serialize_sig, Signature};
