use proptest::prelude::*;

use xmss_signatures::crypto::random::DeterministicRng;
use xmss_signatures::params::Params;
use xmss_signatures::signer::{Signer, SignerPaths};

fn scratch_paths(tag: u64) -> SignerPaths {
    let dir = std::env::temp_dir().join(format!("xmss_proptest_{tag:x}"));
    std::fs::create_dir_all(&dir).unwrap();
    SignerPaths {
        key_path: dir.join("xmss_key.bin"),
        state_path: dir.join("xmss_state.dat"),
        root_hex_path: dir.join("root.hex"),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// `verify(params, msg, sign_index(params, keygen_from_seed(seed), msg, idx), root) == true`
    /// for every (params, msg, seed, idx in [0, 2^h)) — and false for any other message.
    #[test]
    fn verify_round_trip_holds_for_arbitrary_message_and_index(
        seed in any::<u64>(),
        h in 2u32..=4,
        msg in proptest::collection::vec(any::<u8>(), 0..64),
        idx_raw in any::<u64>(),
    ) {
        let params = Params::new(h, 16).unwrap();
        let idx = idx_raw % params.capacity();

        let tag = seed ^ ((h as u64) << 40) ^ (idx << 8) ^ (msg.len() as u64);
        let signer = Signer::new(params, scratch_paths(tag));
        let mut rng = DeterministicRng::from_u64_seed(seed);
        let key = signer.keygen(&mut rng).unwrap();

        let sig = signer.sign_index(&key, &msg, idx).unwrap();
        prop_assert!(signer.verify(&msg, &sig, &key.root()));

        let mut wrong_msg = msg.clone();
        wrong_msg.push(0xFF);
        prop_assert!(!signer.verify(&wrong_msg, &sig, &key.root()));
    }

    /// Sequential `sign_auto` calls within a single key's capacity produce
    /// `0, 1, 2, ...` with no gaps and no repeats, for any number of calls
    /// up to that capacity and any seed.
    #[test]
    fn sequential_sign_auto_has_no_gaps_or_repeats(
        seed in any::<u64>(),
        num_msgs in 1usize..=8,
    ) {
        // h=3 -> capacity 8, large enough to bound num_msgs without rotating.
        let params = Params::new(3, 16).unwrap();
        let tag = seed ^ ((num_msgs as u64) << 48) ^ 0xA5A5;
        let signer = Signer::new(params, scratch_paths(tag));
        let mut rng = DeterministicRng::from_u64_seed(seed);
        let mut key = signer.keygen(&mut rng).unwrap();

        for expected in 0..num_msgs as u32 {
            let msg = format!("msg-{expected}");
            let sig = signer.sign_auto(&mut rng, &mut key, msg.as_bytes()).unwrap();
            prop_assert_eq!(sig.leaf_index, expected);
        }
    }
}
