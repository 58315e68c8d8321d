use crate::remap::{Interval, MalformedReason};

/// Errors produced before any interval is remapped.
///
/// Both variants abort the whole batch: no partial results are returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemapError {
    #[error("Malformed edit script at op {index}: {reason}")]
    MalformedEditScript {
        index: usize,
        reason: MalformedReason,
    },
    #[error("Invalid interval at index {index}: {interval}")]
    InvalidInterval { index: usize, interval: Interval },
}
