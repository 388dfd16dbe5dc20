//! The stateful signer: the only component that touches a leaf index twice
//! would be a catastrophic WOTS+ chain-reuse forgery, so every path through
//! `sign_auto` either persists the advanced index before returning a
//! signature or returns an error and produces nothing.

use std::path::PathBuf;

use tracing::{info, warn};

use crate::crypto::hash::{hash_n, N};
use crate::crypto::random::SecureRandom;
use crate::error::Error;
use crate::keyderive::derive_wots_sk;
use crate::params::Params;
use crate::tree::MerkleTree;
use crate::util::constant_time_eq;
use crate::wire::{
    self, read_key_file, read_state_file, write_key_file, write_root_hex_file, write_state_file,
    Signature,
};
use crate::wots::{wots_pk_from_sig, wots_sign};

/// An XMSS key: the master seed (kept only in memory) and its cached root.
pub struct XmssKey {
    master_seed: [u8; N],
    root: [u8; N],
}

impl XmssKey {
    pub fn root(&self) -> [u8; N] {
        self.root
    }
}

impl Drop for XmssKey {
    fn drop(&mut self) {
        crate::util::secure_zero(&mut self.master_seed);
    }
}

/// Filesystem locations of the three signer-owned artifacts. Defaults match
/// the names this scheme ships artifacts under.
#[derive(Debug, Clone)]
pub struct SignerPaths {
    pub key_path: PathBuf,
    pub state_path: PathBuf,
    pub root_hex_path: PathBuf,
}

impl Default for SignerPaths {
    fn default() -> Self {
        SignerPaths {
            key_path: PathBuf::from("xmss_key.bin"),
            state_path: PathBuf::from("xmss_state.dat"),
            root_hex_path: PathBuf::from("root.hex"),
        }
    }
}

/// Couples a set of parameters with the on-disk locations of the key and
/// index files. Not safe for concurrent use against the same paths from two
/// processes — the caller is responsible for external mutual exclusion.
pub struct Signer {
    params: Params,
    paths: SignerPaths,
}

impl Signer {
    pub fn new(params: Params, paths: SignerPaths) -> Self {
        Signer { params, paths }
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Draw a fresh master seed, compute its root, and persist the key file
    /// and a zeroed state file. `Fresh --keygen--> Active(0)`.
    pub fn keygen(&self, rng: &mut dyn SecureRandom) -> Result<XmssKey, Error> {
        if self.params.signature_len() > wire::MAX_SIGNATURE_BYTES {
            return Err(Error::InvalidParameters {
                h: self.params.h(),
                w: self.params.w(),
                reason: "signature would exceed the 4096-byte wire limit",
            });
        }

        let mut seed_bytes = rng.random_bytes(N);
        let mut seed = [0u8; N];
        seed.copy_from_slice(&seed_bytes);
        crate::util::secure_zero(&mut seed_bytes);

        let key = self.build_key(seed)?;

        write_key_file(&self.paths.key_path, &self.params, &key.master_seed, &key.root)?;
        write_state_file(&self.paths.state_path, 0)?;
        write_root_hex_file(&self.paths.root_hex_path, &key.root)?;

        info!(h = self.params.h(), w = self.params.w(), "generated new xmss key");
        Ok(key)
    }

    fn build_key(&self, master_seed: [u8; N]) -> Result<XmssKey, Error> {
        let tree = MerkleTree::build(&self.params, &master_seed);
        Ok(XmssKey {
            master_seed,
            root: tree.root(),
        })
    }

    /// Sign `msg` under leaf `idx` without touching the state file. Callers
    /// that want the index-advancement guarantees should use [`Self::sign_auto`].
    pub fn sign_index(&self, key: &XmssKey, msg: &[u8], idx: u64) -> Result<Signature, Error> {
        let capacity = self.params.capacity();
        if idx >= capacity {
            return Err(Error::IndexOutOfRange {
                index: idx,
                h: self.params.h(),
                capacity,
            });
        }

        let digest = hash_n(msg);

        let mut sk_chains = derive_wots_sk(&self.params, &key.master_seed, idx);
        let wots_sig = wots_sign(&self.params, &digest, &sk_chains);
        for chain in sk_chains.iter_mut() {
            crate::util::secure_zero(chain);
        }

        let tree = MerkleTree::build(&self.params, &key.master_seed);
        let auth_path = tree.authentication_path(idx);

        Ok(Signature {
            leaf_index: idx as u32,
            wots_sig,
            auth_path,
        })
    }

    /// Read `next_index` from disk, rotating the key if it's exhausted, sign
    /// under that index, persist the advanced index, and only then return
    /// the signature. If persistence fails the signature is never handed
    /// back to the caller — `next_index` is what decides whether a leaf has
    /// been spent, not the caller holding a `Signature` value.
    pub fn sign_auto(
        &self,
        rng: &mut dyn SecureRandom,
        key: &mut XmssKey,
        msg: &[u8],
    ) -> Result<Signature, Error> {
        let capacity = self.params.capacity();
        let mut idx = read_state_file(&self.paths.state_path)?;

        if idx >= capacity {
            warn!(h = self.params.h(), "xmss leaves exhausted, rotating key");
            let mut seed_bytes = rng.random_bytes(N);
            let mut seed = [0u8; N];
            seed.copy_from_slice(&seed_bytes);
            crate::util::secure_zero(&mut seed_bytes);

            *key = self.build_key(seed)?;
            write_key_file(&self.paths.key_path, &self.params, &key.master_seed, &key.root)?;
            write_root_hex_file(&self.paths.root_hex_path, &key.root)?;
            write_state_file(&self.paths.state_path, 0)?;
            idx = 0;
        }

        let sig = self.sign_index(key, msg, idx)?;
        write_state_file(&self.paths.state_path, idx + 1)?;

        Ok(sig)
    }

    /// Reload a key from disk, checking its `(h, w)` against this signer's params.
    pub fn load_key(&self) -> Result<XmssKey, Error> {
        let (seed, root) = read_key_file(&self.paths.key_path, &self.params)?;
        Ok(XmssKey {
            master_seed: seed,
            root,
        })
    }

    /// Verify a signature against an expected root. Never panics or
    /// returns an error — any structural problem simply yields `false`.
    pub fn verify(&self, msg: &[u8], sig: &Signature, expected_root: &[u8; N]) -> bool {
        if sig.auth_path.len() != self.params.h() as usize {
            return false;
        }
        if sig.wots_sig.len() != self.params.len() {
            return false;
        }
        if sig.leaf_index as u64 >= self.params.capacity() {
            return false;
        }

        let digest = hash_n(msg);
        let pk_chains = wots_pk_from_sig(&self.params, &digest, &sig.wots_sig);

        let mut concatenated = Vec::with_capacity(pk_chains.len() * N);
        for chain in &pk_chains {
            concatenated.extend_from_slice(chain);
        }
        let leaf = hash_n(&concatenated);

        let computed_root = sig.auth_path.compute_root(&leaf, sig.leaf_index as u64);
        constant_time_eq(&computed_root, expected_root)
    }

    /// Administrative recovery from a corrupt state file: overwrite it with
    /// an explicit count. Never called automatically — a corrupt index file
    /// must surface as [`Error::StateCorrupt`] and wait for an operator.
    pub fn force_reset_state(&self, next_index: u64) -> Result<(), Error> {
        warn!(next_index, "administrative state reset");
        write_state_file(&self.paths.state_path, next_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::random::DeterministicRng;

    fn temp_paths(name: &str) -> SignerPaths {
        let dir = std::env::temp_dir().join(format!("xmss_signer_test_{name}"));
        std::fs::create_dir_all(&dir).unwrap();
        SignerPaths {
            key_path: dir.join("xmss_key.bin"),
            state_path: dir.join("xmss_state.dat"),
            root_hex_path: dir.join("root.hex"),
        }
    }

    #[test]
    fn keygen_persists_state_zero() {
        let params = Params::new(2, 16).unwrap();
        let signer = Signer::new(params, temp_paths("keygen_persists_state_zero"));
        let mut rng = DeterministicRng::from_u64_seed(42);
        signer.keygen(&mut rng).unwrap();

        assert_eq!(read_state_file(&signer.paths.state_path).unwrap(), 0);
    }

    #[test]
    fn sign_then_verify_round_trip() {
        let params = Params::new(2, 16).unwrap();
        let signer = Signer::new(params, temp_paths("sign_then_verify_round_trip"));
        let mut rng = DeterministicRng::from_u64_seed(42);
        let mut key = signer.keygen(&mut rng).unwrap();

        let sig = signer.sign_auto(&mut rng, &mut key, b"hello").unwrap();
        assert_eq!(sig.leaf_index, 0);
        assert!(signer.verify(b"hello", &sig, &key.root()));
        assert!(!signer.verify(b"HELLO", &sig, &key.root()));
    }

    #[test]
    fn sequential_sign_auto_advances_index_with_no_gaps() {
        let params = Params::new(2, 16).unwrap();
        let signer = Signer::new(params, temp_paths("sequential_sign_auto_advances_index_with_no_gaps"));
        let mut rng = DeterministicRng::from_u64_seed(42);
        let mut key = signer.keygen(&mut rng).unwrap();

        for expected in 0..4u32 {
            let msg = format!("msg-{expected}");
            let sig = signer.sign_auto(&mut rng, &mut key, msg.as_bytes()).unwrap();
            assert_eq!(sig.leaf_index, expected);
        }
    }

    #[test]
    fn exhaustion_rotates_key_and_restarts_at_zero() {
        let params = Params::new(2, 16).unwrap();
        let signer = Signer::new(params, temp_paths("exhaustion_rotates_key_and_restarts_at_zero"));
        let mut rng = DeterministicRng::from_u64_seed(42);
        let mut key = signer.keygen(&mut rng).unwrap();
        let old_root = key.root();

        for k in 0..4u32 {
            let msg = format!("msg-{k}");
            signer.sign_auto(&mut rng, &mut key, msg.as_bytes()).unwrap();
        }

        let sig = signer.sign_auto(&mut rng, &mut key, b"rotated").unwrap();
        assert_eq!(sig.leaf_index, 0);
        assert_ne!(key.root(), old_root);
        assert!(signer.verify(b"rotated", &sig, &key.root()));
    }

    #[test]
    fn sign_index_rejects_out_of_range() {
        let params = Params::new(2, 16).unwrap();
        let signer = Signer::new(params, temp_paths("sign_index_rejects_out_of_range"));
        let mut rng = DeterministicRng::from_u64_seed(42);
        let key = signer.keygen(&mut rng).unwrap();

        let result = signer.sign_index(&key, b"msg", 4);
        assert!(matches!(result, Err(Error::IndexOutOfRange { .. })));
    }

    #[test]
    fn verify_rejects_wrong_root() {
        let params = Params::new(2, 16).unwrap();
        let signer = Signer::new(params, temp_paths("verify_rejects_wrong_root"));
        let mut rng = DeterministicRng::from_u64_seed(1);
        let mut key = signer.keygen(&mut rng).unwrap();
        let sig = signer.sign_auto(&mut rng, &mut key, b"msg").unwrap();

        let mut other_rng = DeterministicRng::from_u64_seed(2);
        let other_signer = Signer::new(params, temp_paths("verify_rejects_wrong_root_other"));
        let other_key = other_signer.keygen(&mut other_rng).unwrap();

        assert!(!signer.verify(b"msg", &sig, &other_key.root()));
    }

    #[test]
    fn deterministic_keygen_from_same_seed_matches() {
        let params = Params::new(2, 16).unwrap();
        let a = Signer::new(params, temp_paths("deterministic_keygen_from_same_seed_matches_a"));
        let b = Signer::new(params, temp_paths("deterministic_keygen_from_same_seed_matches_b"));

        let mut rng_a = DeterministicRng::from_u64_seed(42);
        let mut rng_b = DeterministicRng::from_u64_seed(42);
        let key_a = a.keygen(&mut rng_a).unwrap();
        let key_b = b.keygen(&mut rng_b).unwrap();

        assert_eq!(key_a.root(), key_b.root());
    }

    #[test]
    fn force_reset_state_overwrites_index() {
        let params = Params::new(2, 16).unwrap();
        let signer = Signer::new(params, temp_paths("force_reset_state_overwrites_index"));
        let mut rng = DeterministicRng::from_u64_seed(42);
        signer.keygen(&mut rng).unwrap();

        signer.force_reset_state(3).unwrap();
        assert_eq!(read_state_file(&signer.paths.state_path).unwrap(), 3);
    }

    #[derive(Clone, Default)]
    struct CaptureWriter(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CaptureWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for CaptureWriter {
        type Writer = CaptureWriter;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn exhaustion_emits_a_tracing_event() {
        let buffer = CaptureWriter::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(buffer.clone())
            .with_ansi(false)
            .finish();

        let params = Params::new(2, 16).unwrap();
        let signer = Signer::new(params, temp_paths("exhaustion_emits_a_tracing_event"));
        let mut rng = DeterministicRng::from_u64_seed(42);

        tracing::subscriber::with_default(subscriber, || {
            let mut key = signer.keygen(&mut rng).unwrap();
            for k in 0..4u32 {
                let msg = format!("msg-{k}");
                signer.sign_auto(&mut rng, &mut key, msg.as_bytes()).unwrap();
            }
            signer.sign_auto(&mut rng, &mut key, b"rotated").unwrap();
        });

        let logged = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        assert!(logged.contains("leaves exhausted"), "log output: {logged}");
    }
}
