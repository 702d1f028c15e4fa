use thiserror::Error;

/// Errors that can occur during key management and signing.
#[derive(Error, Debug)]
pub enum KeychainError {
    /// The keychain holds no key for the requested address.
    #[error("no key for address: {0}")]
    UnknownAddress(String),

    /// The private key bytes are not a valid secp256k1 scalar.
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    /// The public key bytes are not a valid SEC1 point.
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    /// A signature could not be produced or parsed.
    #[error("signature error: {0}")]
    SignatureError(String),

    /// Public key recovery from a signature failed.
    #[error("recovery error: {0}")]
    RecoveryError(String),

    /// Primitives error.
    #[error("primitives error: {0}")]
    Primitives(#[from] kodiak_primitives::PrimitivesError),
}
