//! On-disk persistence of found keypairs.
//!
//! Replaces `storage.rs`'s indexed JSON database (patterns, tags,
//! machine-hash fingerprinting) with the trivial format the external
//! interface names: `<address>.json`, a single-line JSON array of the
//! 64 decimal private-key bytes, wire-compatible with Solana keypair
//! tooling.

use std::io;
use std::path::{Path, PathBuf};

/// Write `<address>.json` in `dir`, containing `[b0,b1,...,b63]\n` where
/// `b0..32 = seed` and `b32..64 = compressed public key`.
pub fn save(dir: &Path, address: &str, private_key: &[u8; 64]) -> io::Result<PathBuf> {
    let path = dir.join(format!("{}.json", address));
    let bytes: Vec<String> = private_key.iter().map(|b| b.to_string()).collect();
    let mut contents = String::with_capacity(bytes.len() * 4 + 2);
    contents.push('[');
    contents.push_str(&bytes.join(","));
    contents.push(']');
    contents.push('\n');
    std::fs::write(&path, contents)?;
    Ok(path)
}
