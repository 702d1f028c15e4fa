//! Wire format type identifiers and codec constants.
//!
//! Every serialized output, input, credential, and transaction body on
//! the platform chain is prefixed with a 4-byte type id from the table
//! below.  The codec version is a 2-byte prefix on UTXOs and unsigned
//! transactions.

/// The only serialization codec version this crate understands.
pub const CODEC_VERSION: u16 = 0;

/// Type id of a base transaction body.
pub const BASE_TX_ID: u32 = 0;

/// Type id of a secp256k1 transfer input.
pub const SECP_TRANSFER_INPUT_ID: u32 = 5;

/// Type id of a secp256k1 transfer output.
pub const SECP_TRANSFER_OUTPUT_ID: u32 = 7;

/// Type id of a secp256k1 credential.
pub const SECP_CREDENTIAL_ID: u32 = 9;

/// Type id of a subnet authorization block.
pub const SUBNET_AUTH_ID: u32 = 10;

/// Type id of a secp256k1 owner output (no amount, owners only).
pub const SECP_OWNER_OUTPUT_ID: u32 = 11;

/// Type id of an add-validator transaction body.
pub const ADD_VALIDATOR_TX_ID: u32 = 12;

/// Type id of an add-subnet-validator transaction body.
pub const ADD_SUBNET_VALIDATOR_TX_ID: u32 = 13;

/// Type id of an add-nominator transaction body.
pub const ADD_NOMINATOR_TX_ID: u32 = 14;

/// Type id of a create-chain transaction body.
pub const CREATE_CHAIN_TX_ID: u32 = 15;

/// Type id of a create-subnet transaction body.
pub const CREATE_SUBNET_TX_ID: u32 = 16;

/// Type id of an import transaction body.
pub const IMPORT_TX_ID: u32 = 17;

/// Type id of an export transaction body.
pub const EXPORT_TX_ID: u32 = 18;

/// Type id of a stakeable lock input.
pub const STAKEABLE_LOCK_IN_ID: u32 = 21;

/// Type id of a stakeable lock output.
pub const STAKEABLE_LOCK_OUT_ID: u32 = 22;

/// Multiplier from a delegation fee percentage to on-wire shares.
///
/// Shares are parts per million, so a fee of `2.5` percent is encoded
/// as `25_000`.
pub const DELEGATION_FEE_MULTIPLIER: u32 = 10_000;
