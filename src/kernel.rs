//! The search kernel: composes rng → sha512 → clamp → scalarmult → compress
//! → base58 → pattern into one attempt. Mirrors the composition order of
//! `metal_gpu.rs`'s `generate_ed25519_keys` kernel body; this is the
//! from-scratch Rust twin of `gpu/kernel.wgsl`, used for the CPU-side
//! conformance tests in §8 and as the source this crate's WGSL shader was
//! translated from.

use crate::base58;
use crate::ge::Ge;
use crate::pattern::{self, PatternConfig};
use crate::rng::Rng;
use crate::sha512;

/// Clamp a 32-byte scalar per Ed25519 rules.
#[inline(always)]
pub fn clamp_scalar(scalar: &mut [u8; 32]) {
    scalar[0] &= 248;
    scalar[31] &= 63;
    scalar[31] |= 64;
}

/// A single search attempt's full output.
pub struct Attempt {
    pub seed: [u8; 32],
    pub hash: [u8; 64],
    pub clamped_scalar: [u8; 32],
    pub public_key: [u8; 32],
    pub address: String,
}

impl Attempt {
    /// The 64-byte keypair file layout: `seed ‖ compressed_public_key`.
    pub fn private_key_bytes(&self) -> [u8; 64] {
        let mut out = [0u8; 64];
        out[..32].copy_from_slice(&self.seed);
        out[32..].copy_from_slice(&self.public_key);
        out
    }
}

/// Run one work-item of the search kernel.
pub fn run(seed: [u8; 32]) -> Attempt {
    let hash = sha512::hash32(&seed);

    let mut clamped_scalar = [0u8; 32];
    clamped_scalar.copy_from_slice(&hash[..32]);
    clamp_scalar(&mut clamped_scalar);

    let point = Ge::scalarmult_base(&clamped_scalar);
    let public_key = point.compress();
    let address = base58::encode_string(&public_key);

    Attempt {
        seed,
        hash,
        clamped_scalar,
        public_key,
        address,
    }
}

/// Run a whole dispatch of `batch_size` work-items, returning the first
/// attempt that matches (an in-process mirror of the GPU kernel's
/// atomic-claim semantics: the host-side loop short-circuits on the first
/// match, equivalent to "at most one winner" for a single-threaded mirror).
pub fn run_batch(
    host_seed: [u64; 2],
    batch_index: u64,
    batch_size: u64,
    pattern: &PatternConfig,
) -> (Option<Attempt>, u64) {
    for local_id in 0..batch_size {
        let work_item_id = batch_index.wrapping_mul(batch_size).wrapping_add(local_id);
        let mut rng = Rng::seeded(host_seed, work_item_id);
        let seed = rng.next_seed32();
        let attempt = run(seed);
        if pattern::matches(attempt.address.as_bytes(), pattern) {
            return (Some(attempt), local_id + 1);
        }
    }
    (None, batch_size)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn clamping_law_holds_for_any_seed(bytes in proptest::collection::vec(any::<u8>(), 32..=32)) {
            let mut scalar = [0u8; 32];
            scalar.copy_from_slice(&bytes);
            clamp_scalar(&mut scalar);
            prop_assert_eq!(scalar[0] & 7, 0);
            prop_assert_eq!(scalar[31] & 0xc0, 0x40);
        }

        #[test]
        fn verification_always_holds_for_any_seed(bytes in proptest::collection::vec(any::<u8>(), 32..=32)) {
            let mut seed = [0u8; 32];
            seed.copy_from_slice(&bytes);
            let attempt = run(seed);
            prop_assert_eq!(base58::encode_string(&attempt.public_key), attempt.address);
        }
    }
}
