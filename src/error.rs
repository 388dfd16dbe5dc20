//! Error taxonomy shared by every fallible operation in this crate.

use thiserror::Error;

/// Everything that can go wrong in parameter validation, signing, verification,
/// or persistence.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid parameters: h={h}, w={w} ({reason})")]
    InvalidParameters { h: u32, w: u32, reason: &'static str },

    #[error("leaf index {index} is out of range for capacity 2^{h} = {capacity}")]
    IndexOutOfRange { index: u64, h: u32, capacity: u64 },

    #[error("I/O failure on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parameter mismatch: artifact has (h={found_h}, w={found_w}), expected (h={expected_h}, w={expected_w})")]
    ParameterMismatch {
        found_h: u32,
        found_w: u32,
        expected_h: u32,
        expected_w: u32,
    },

    #[error("state file {path} is corrupt: {reason}")]
    StateCorrupt { path: String, reason: &'static str },

    #[error("failed to persist advanced leaf index to {path}; signature withheld: {source}")]
    StateWriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed signature: {reason}")]
    MalformedSignature { reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
