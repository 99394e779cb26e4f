//! CPU fallback search path (spec §4.10).
//!
//! Grounded on `keygen.rs` (curve25519-dalek + sha2 pipeline, `clamp_scalar`)
//! for the per-attempt crypto, and on `worker.rs` (`WorkerPool`/
//! `cpu_worker_loop` shape) for the thread fan-out. Uses the standard
//! `curve25519-dalek` scalar multiplication rather than `kernel.rs`'s
//! from-scratch mirror, since the CPU path exists to be fast, not to be a
//! GPU twin.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::Sender;
use curve25519_dalek::constants::ED25519_BASEPOINT_TABLE;
use curve25519_dalek::scalar::Scalar;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use sha2::{Digest, Sha512};

use crate::base58;
use crate::kernel::clamp_scalar;
use crate::pattern::{self, PatternConfig};

/// Number of attempts generated per inner loop before checking `should_stop`
/// and flushing counters, matching the teacher's `BATCH_SIZE` role.
const BATCH_SIZE: usize = 10_000;

/// A found match, crossing the CPU/GPU boundary to the driver uniformly.
#[derive(Clone, Debug)]
pub struct FoundKey {
    pub address: String,
    pub private_key: [u8; 64],
    pub public_key: [u8; 32],
}

/// Generate one Ed25519 keypair from a fresh random seed and test it.
#[inline]
fn try_one(rng: &mut ChaCha20Rng, pattern: &PatternConfig) -> Option<FoundKey> {
    let mut seed = [0u8; 32];
    rng.fill_bytes(&mut seed);

    let mut hasher = Sha512::new();
    hasher.update(&seed);
    let digest: [u8; 64] = hasher.finalize().into();

    let mut clamped = [0u8; 32];
    clamped.copy_from_slice(&digest[..32]);
    clamp_scalar(&mut clamped);

    let scalar = Scalar::from_bytes_mod_order(clamped);
    let public_point = &scalar * ED25519_BASEPOINT_TABLE;
    let public_key: [u8; 32] = public_point.compress().to_bytes();

    let address = base58::encode_string(&public_key);
    if !pattern::matches(address.as_bytes(), pattern) {
        return None;
    }

    let mut private_key = [0u8; 64];
    private_key[..32].copy_from_slice(&seed);
    private_key[32..].copy_from_slice(&public_key);

    Some(FoundKey {
        address,
        private_key,
        public_key,
    })
}

/// Pool of CPU worker threads racing to find a pattern match.
pub struct CpuWorkerPool {
    num_workers: usize,
    pattern: PatternConfig,
    result_sender: Sender<FoundKey>,
    total_attempts: Arc<AtomicU64>,
    should_stop: Arc<AtomicBool>,
    worker_handles: Vec<JoinHandle<()>>,
}

impl CpuWorkerPool {
    pub fn new(
        num_workers: usize,
        pattern: PatternConfig,
        result_sender: Sender<FoundKey>,
        total_attempts: Arc<AtomicU64>,
        should_stop: Arc<AtomicBool>,
    ) -> Self {
        Self {
            num_workers,
            pattern,
            result_sender,
            total_attempts,
            should_stop,
            worker_handles: Vec::new(),
        }
    }

    pub fn start(&mut self) {
        for worker_id in 0..self.num_workers {
            let pattern = self.pattern.clone();
            let sender = self.result_sender.clone();
            let total_attempts = self.total_attempts.clone();
            let should_stop = self.should_stop.clone();

            let handle = thread::Builder::new()
                .name(format!("cpu-worker-{}", worker_id))
                .spawn(move || cpu_worker_loop(&pattern, &sender, &total_attempts, &should_stop))
                .expect("failed to spawn CPU worker thread");
            self.worker_handles.push(handle);
        }
    }

    pub fn stop(&mut self) {
        self.should_stop.store(true, Ordering::Relaxed);
        for handle in self.worker_handles.drain(..) {
            let _ = handle.join();
        }
    }
}

fn cpu_worker_loop(
    pattern: &PatternConfig,
    result_sender: &Sender<FoundKey>,
    total_attempts: &AtomicU64,
    should_stop: &AtomicBool,
) {
    let mut rng = ChaCha20Rng::from_entropy();
    let mut local_attempts: u64 = 0;

    loop {
        if should_stop.load(Ordering::Relaxed) {
            break;
        }

        for _ in 0..BATCH_SIZE {
            if let Some(found) = try_one(&mut rng, pattern) {
                if result_sender.send(found).is_err() {
                    return;
                }
            }
            local_attempts += 1;
        }

        total_attempts.fetch_add(local_attempts, Ordering::Relaxed);
        local_attempts = 0;

        if should_stop.load(Ordering::Relaxed) {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::PatternMode;
    use std::time::Duration;

    #[test]
    fn finds_a_wildcard_match_quickly() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let attempts = Arc::new(AtomicU64::new(0));
        let stop = Arc::new(AtomicBool::new(false));
        let pattern = PatternConfig::new("?", PatternMode::Prefix, false);

        let mut pool = CpuWorkerPool::new(2, pattern, tx, attempts.clone(), stop.clone());
        pool.start();

        let result = rx.recv_timeout(Duration::from_secs(5));
        pool.stop();

        assert!(result.is_ok());
        assert!(attempts.load(Ordering::Relaxed) > 0);
    }

    #[test]
    fn found_key_passes_verification() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let attempts = Arc::new(AtomicU64::new(0));
        let stop = Arc::new(AtomicBool::new(false));
        let pattern = PatternConfig::new("?", PatternMode::Anywhere, false);

        let mut pool = CpuWorkerPool::new(1, pattern, tx, attempts, stop.clone());
        pool.start();
        let found = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        pool.stop();

        let reencoded = base58::encode_string(&found.public_key);
        assert_eq!(reencoded, found.address);
        assert_eq!(&found.private_key[32..], &found.public_key[..]);
    }

    #[test]
    fn matched_address_honors_anchored_wildcard_pattern() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let attempts = Arc::new(AtomicU64::new(0));
        let stop = Arc::new(AtomicBool::new(false));
        let pattern = PatternConfig::new("a?c", PatternMode::Prefix, false);

        let mut pool = CpuWorkerPool::new(4, pattern, tx, attempts, stop.clone());
        pool.start();
        let found = rx.recv_timeout(Duration::from_secs(20)).unwrap();
        pool.stop();

        let addr = found.address.to_ascii_lowercase();
        assert_eq!(addr.as_bytes()[0], b'a');
        assert_eq!(addr.as_bytes()[2], b'c');
    }

    #[test]
    fn stop_flag_halts_workers() {
        let (tx, _rx) = crossbeam_channel::unbounded();
        let attempts = Arc::new(AtomicU64::new(0));
        let stop = Arc::new(AtomicBool::new(false));
        let pattern = PatternConfig::new("ZZZZZZZZZZZZ", PatternMode::Prefix, true);

        let mut pool = CpuWorkerPool::new(2, pattern, tx, attempts, stop.clone());
        pool.start();
        thread::sleep(Duration::from_millis(50));
        pool.stop();

        assert!(stop.load(Ordering::Relaxed));
    }
}
