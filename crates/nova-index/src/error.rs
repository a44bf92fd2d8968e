use std::path::PathBuf;

use nova_core::Fingerprint;

/// Failures reading, writing or building a symbol tree index.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("not a symbol tree index (bad magic)")]
    BadMagic,

    #[error("unsupported symbol tree index version {found} (expected {expected})")]
    UnsupportedVersion { expected: u32, found: u32 },

    #[error("symbol tree index is truncated")]
    Truncated,

    #[error("symbol tree index is corrupt: {0}")]
    Corrupt(&'static str),

    #[error("symbol tree index fingerprint mismatch: expected {expected}, found {found}")]
    FingerprintMismatch {
        expected: Fingerprint,
        found: Fingerprint,
    },

    #[error("index build cancelled")]
    Cancelled,

    #[error("index build panicked")]
    BuildPanicked,
}

impl IndexError {
    /// Whether the error means the bytes themselves cannot be trusted.
    pub fn is_data_integrity(&self) -> bool {
        matches!(
            self,
            IndexError::BadMagic
                | IndexError::UnsupportedVersion { .. }
                | IndexError::Truncated
                | IndexError::Corrupt(_)
                | IndexError::FingerprintMismatch { .. }
        )
    }
}

impl From<nova_scheduler::Cancelled> for IndexError {
    fn from(_: nova_scheduler::Cancelled) -> Self {
        IndexError::Cancelled
    }
}

impl From<nova_scheduler::TaskError> for IndexError {
    fn from(err: nova_scheduler::TaskError) -> Self {
        match err {
            nova_scheduler::TaskError::Cancelled => IndexError::Cancelled,
            nova_scheduler::TaskError::Panicked => IndexError::BuildPanicked,
        }
    }
}
