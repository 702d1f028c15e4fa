//! Transaction bodies and the typed body dispatcher.

pub mod base;
pub mod chain;
pub mod export;
pub mod import;
pub mod staking;
pub mod subnet;

pub use base::BaseTx;
pub use chain::CreateChainTx;
pub use export::ExportTx;
pub use import::ImportTx;
pub use staking::{AddNominatorTx, AddSubnetValidatorTx, AddValidatorTx, Validator};
pub use subnet::{CreateSubnetTx, SubnetAuth};

use kodiak_primitives::wire::{KdkReader, KdkWriter};

use crate::constants::{
    ADD_NOMINATOR_TX_ID, ADD_SUBNET_VALIDATOR_TX_ID, ADD_VALIDATOR_TX_ID, BASE_TX_ID,
    CREATE_CHAIN_TX_ID, CREATE_SUBNET_TX_ID, EXPORT_TX_ID, IMPORT_TX_ID,
};
use crate::inputs::SigIdx;
use crate::PlatformError;

/// Any transaction body, tagged with its wire type id.
#[derive(Clone, Debug)]
pub enum TxBody {
    /// A plain value transfer (type id 0).
    Base(BaseTx),
    /// Registers a primary network validator (type id 12).
    AddValidator(AddValidatorTx),
    /// Registers a subnet validator (type id 13).
    AddSubnetValidator(AddSubnetValidatorTx),
    /// Adds stake to an existing validator (type id 14).
    AddNominator(AddNominatorTx),
    /// Creates a blockchain on a subnet (type id 15).
    CreateChain(CreateChainTx),
    /// Registers a new subnet (type id 16).
    CreateSubnet(CreateSubnetTx),
    /// Claims UTXOs exported from another chain (type id 17).
    Import(ImportTx),
    /// Moves funds to another chain's atomic memory (type id 18).
    Export(ExportTx),
}

impl TxBody {
    /// The wire type id of this body.
    pub fn type_id(&self) -> u32 {
        match self {
            TxBody::Base(_) => BASE_TX_ID,
            TxBody::AddValidator(_) => ADD_VALIDATOR_TX_ID,
            TxBody::AddSubnetValidator(_) => ADD_SUBNET_VALIDATOR_TX_ID,
            TxBody::AddNominator(_) => ADD_NOMINATOR_TX_ID,
            TxBody::CreateChain(_) => CREATE_CHAIN_TX_ID,
            TxBody::CreateSubnet(_) => CREATE_SUBNET_TX_ID,
            TxBody::Import(_) => IMPORT_TX_ID,
            TxBody::Export(_) => EXPORT_TX_ID,
        }
    }

    /// The shared base body.
    pub fn base(&self) -> &BaseTx {
        match self {
            TxBody::Base(tx) => tx,
            TxBody::AddValidator(tx) => &tx.base,
            TxBody::AddSubnetValidator(tx) => &tx.base,
            TxBody::AddNominator(tx) => &tx.base,
            TxBody::CreateChain(tx) => &tx.base,
            TxBody::CreateSubnet(tx) => &tx.base,
            TxBody::Import(tx) => &tx.base,
            TxBody::Export(tx) => &tx.base,
        }
    }

    /// The signature slot groups this body needs credentials for, in
    /// credential order.
    ///
    /// Every body signs its base inputs first.  Import transactions
    /// append one group per imported input; transactions carrying a
    /// subnet authorization append its slots as the final group.
    pub(crate) fn signature_sources(&self) -> Vec<&[SigIdx]> {
        let mut sources: Vec<&[SigIdx]> = self
            .base()
            .ins
            .iter()
            .map(|input| input.input.sig_idxs())
            .collect();
        match self {
            TxBody::Import(tx) => {
                sources.extend(tx.import_ins.iter().map(|input| input.input.sig_idxs()));
            }
            TxBody::AddSubnetValidator(tx) => {
                sources.push(tx.subnet_auth.sig_idxs.as_slice());
            }
            TxBody::CreateChain(tx) => {
                sources.push(tx.subnet_auth.sig_idxs.as_slice());
            }
            _ => {}
        }
        sources
    }

    /// Number of credentials a signed transaction with this body
    /// carries.
    pub fn num_credentials(&self) -> usize {
        self.signature_sources().len()
    }

    /// Deserialize any typed body from a `KdkReader`.
    ///
    /// Reads the 4-byte type id and dispatches to the matching body
    /// parser.  An unknown type id leaves the cursor where it was
    /// before the call.
    pub fn read_from(reader: &mut KdkReader) -> Result<Self, PlatformError> {
        let start = reader.pos();
        let type_id = reader.read_u32().map_err(|e| {
            PlatformError::SerializationError(format!("reading tx type: {}", e))
        })?;
        match type_id {
            BASE_TX_ID => Ok(TxBody::Base(BaseTx::read_from(reader)?)),
            ADD_VALIDATOR_TX_ID => Ok(TxBody::AddValidator(AddValidatorTx::read_from(reader)?)),
            ADD_SUBNET_VALIDATOR_TX_ID => Ok(TxBody::AddSubnetValidator(
                AddSubnetValidatorTx::read_from(reader)?,
            )),
            ADD_NOMINATOR_TX_ID => Ok(TxBody::AddNominator(AddNominatorTx::read_from(reader)?)),
            CREATE_CHAIN_TX_ID => Ok(TxBody::CreateChain(CreateChainTx::read_from(reader)?)),
            CREATE_SUBNET_TX_ID => Ok(TxBody::CreateSubnet(CreateSubnetTx::read_from(reader)?)),
            IMPORT_TX_ID => Ok(TxBody::Import(ImportTx::read_from(reader)?)),
            EXPORT_TX_ID => Ok(TxBody::Export(ExportTx::read_from(reader)?)),
            other => {
                reader.rewind_to(start);
                Err(PlatformError::InvalidTransaction(format!(
                    "unknown tx type id: {}",
                    other
                )))
            }
        }
    }

    /// Serialize this body, including its type id.
    pub fn write_to(&self, writer: &mut KdkWriter) {
        writer.write_u32(self.type_id());
        match self {
            TxBody::Base(tx) => tx.write_to(writer),
            TxBody::AddValidator(tx) => tx.write_to(writer),
            TxBody::AddSubnetValidator(tx) => tx.write_to(writer),
            TxBody::AddNominator(tx) => tx.write_to(writer),
            TxBody::CreateChain(tx) => tx.write_to(writer),
            TxBody::CreateSubnet(tx) => tx.write_to(writer),
            TxBody::Import(tx) => tx.write_to(writer),
            TxBody::Export(tx) => tx.write_to(writer),
        }
    }
}
