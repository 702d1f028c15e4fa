/// Error types for platform chain operations.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    /// A UTXO is malformed (e.g. bad codec version or output type).
    #[error("invalid utxo: {0}")]
    InvalidUtxo(String),
    /// The transaction structure is invalid.
    #[error("invalid transaction: {0}")]
    InvalidTransaction(String),
    /// An error occurred during binary serialization or deserialization.
    #[error("serialization error: {0}")]
    SerializationError(String),
    /// An address was not found where one was required.
    #[error("address error: {0}")]
    AddressError(String),
    /// The UTXO set cannot cover the requested amounts plus fees.
    #[error("insufficient funds: {0}")]
    InsufficientFunds(String),
    /// A signature threshold is impossible to satisfy.
    #[error("threshold error: {0}")]
    ThresholdError(String),
    /// The fee asset is not acceptable for the requested operation.
    #[error("fee asset error: {0}")]
    FeeAssetError(String),
    /// A staking period is malformed.
    #[error("time error: {0}")]
    TimeError(String),
    /// A stake amount is below the required minimum.
    #[error("stake error: {0}")]
    StakeError(String),
    /// A delegation fee is outside the valid range.
    #[error("delegation fee error: {0}")]
    DelegationFeeError(String),
    /// An underlying keychain error (forwarded from `kodiak-keychain`).
    #[error("keychain error: {0}")]
    Keychain(#[from] kodiak_keychain::KeychainError),
    /// An underlying primitives error (forwarded from `kodiak-primitives`).
    #[error("primitives error: {0}")]
    Primitives(#[from] kodiak_primitives::PrimitivesError),
}
