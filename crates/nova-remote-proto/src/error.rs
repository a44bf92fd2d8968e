/// Errors produced while framing or decoding protocol messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtoError {
    #[error("bincode error: {0}")]
    Bincode(#[from] bincode::Error),

    #[error("frame too large: {len} bytes (max {max})")]
    FrameTooLarge { len: usize, max: usize },

    #[error("frame length mismatch: prefix declares {declared} bytes, {actual} available")]
    LengthMismatch { declared: usize, actual: usize },

    #[error("unsupported protocol version {found} (expected {expected})")]
    UnsupportedVersion { expected: u32, found: u32 },

    #[error("{what} exceeds limit: {len} (max {max})")]
    LimitExceeded {
        what: &'static str,
        len: usize,
        max: usize,
    },
}
