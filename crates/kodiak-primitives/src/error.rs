/// Unified error type for all primitives operations.
///
/// Covers errors from encoding, identifier parsing, and wire reads.
#[derive(Debug, thiserror::Error)]
pub enum PrimitivesError {
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("invalid base58: {0}")]
    InvalidBase58(String),

    #[error("checksum mismatch")]
    ChecksumMismatch,

    #[error("input too short for checksum: {0} bytes")]
    InputTooShort(usize),

    #[error("invalid id length: expected {expected}, got {got}")]
    InvalidIdLength { expected: usize, got: usize },

    #[error("invalid node id: {0}")]
    InvalidNodeId(String),

    #[error("unexpected end of data")]
    UnexpectedEof,

    #[error("{0}")]
    Other(String),
}

impl From<hex::FromHexError> for PrimitivesError {
    fn from(e: hex::FromHexError) -> Self {
        PrimitivesError::InvalidHex(e.to_string())
    }
}
