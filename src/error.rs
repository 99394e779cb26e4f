//! Error taxonomy for the search engine.
//!
//! Replaces the teacher's ad hoc `Result<(), String>` / `eprintln!` +
//! `process::exit` pattern with a typed enum carrying its own exit code,
//! per the taxonomy table in spec §7.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Invalid character '{ch}' at position {pos}\nBase58 alphabet does not include: 0, O, I, l")]
    InvalidPattern { ch: char, pos: usize },

    #[error("No GPU backend available")]
    NoGpu,

    #[error("GPU dispatch failed: {0}")]
    GpuDispatchFailed(String),

    #[error("VERIFICATION FAILED: expected address {expected}, got {got}")]
    VerificationFailed { expected: String, got: String },

    #[error("Failed to write key file: {0}")]
    FileWriteFailed(#[from] std::io::Error),
}

impl SearchError {
    /// Process exit code per spec §6/§7.
    pub fn exit_code(&self) -> i32 {
        match self {
            SearchError::InvalidPattern { .. } => 1,
            SearchError::NoGpu => 2,
            SearchError::GpuDispatchFailed(_) => 1,
            SearchError::VerificationFailed { .. } => 1,
            SearchError::FileWriteFailed(_) => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_pattern_exits_1() {
        let e = SearchError::InvalidPattern { ch: '0', pos: 0 };
        assert_eq!(e.exit_code(), 1);
    }

    #[test]
    fn no_gpu_exits_2() {
        assert_eq!(SearchError::NoGpu.exit_code(), 2);
    }

    #[test]
    fn invalid_pattern_message_matches_spec_format() {
        let e = SearchError::InvalidPattern { ch: '0', pos: 3 };
        let msg = format!("{}", e);
        assert!(msg.contains("Invalid character '0' at position 3"));
        assert!(msg.contains("0, O, I, l"));
    }
}
