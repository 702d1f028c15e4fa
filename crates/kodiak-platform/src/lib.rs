/// Kodiak SDK - Platform chain transaction construction.
///
/// This crate implements the transaction core of the platform chain:
///
/// - `outputs`/`inputs`: the tagged-variant wire codec for transfer
///   outputs and inputs, ownership blocks, and the stakeable lock
///   wrappers.
/// - `utxo`: UTXOs, their CB58 textual form, and an address-indexed
///   UTXO set with balances and set-algebra merges.
/// - `assetamount`: per-asset spend/burn/change ledgers for a pending
///   build.
/// - `txs`: the eight transaction bodies (base transfer, import,
///   export, the three staking registrations, subnet and chain
///   creation).
/// - `tx`: the codec envelope, signing, and the signed transaction.
/// - `credential`: the signature lists attached to a signed
///   transaction.
///
/// UTXO selection (`UtxoSet::get_minimum_spendable`) and the
/// per-kind builders (`UtxoSet::build_*`) live in private modules and
/// surface as methods on [`UtxoSet`].
///
/// Ported from the Kodiak JS SDK (`platformvm` package).

pub mod assetamount;
pub mod constants;
pub mod credential;
pub mod inputs;
pub mod outputs;
pub mod tx;
pub mod txs;
pub mod utxo;

mod builder;
mod error;
mod spend;

pub use assetamount::{AssetAmount, AssetAmountDestination};
pub use credential::Credential;
pub use error::PlatformError;
pub use inputs::{
    Input, SecpTransferInput, SigIdx, StakeableLockIn, TransferableInput,
};
pub use outputs::{
    Output, OutputOwners, SecpTransferOutput, StakeableLockOut, TransferableOutput,
};
pub use tx::{Tx, UnsignedTx};
pub use txs::{
    AddNominatorTx, AddSubnetValidatorTx, AddValidatorTx, BaseTx, CreateChainTx, CreateSubnetTx,
    ExportTx, ImportTx, TxBody, Validator,
};
pub use utxo::{MergeRule, Utxo, UtxoSet};
