//! Subnet creation and the subnet authorization block.

use kodiak_primitives::ids::Address;
use kodiak_primitives::wire::{KdkReader, KdkWriter};

use crate::constants::{SECP_OWNER_OUTPUT_ID, SUBNET_AUTH_ID};
use crate::inputs::SigIdx;
use crate::outputs::OutputOwners;
use crate::txs::base::BaseTx;
use crate::PlatformError;

/// Authorization to act on behalf of a subnet.
///
/// Lists the indices of the subnet's owner addresses whose signatures
/// accompany the transaction in an extra credential.  Like input
/// signature slots, the addresses themselves are a local-only
/// annotation used during signing.
///
/// # Wire format
///
/// | Field       | Size         |
/// |-------------|--------------|
/// | type id     | 4 bytes (BE) |
/// | n indices   | 4 bytes (BE) |
/// | sig indices | n * 4 bytes  |
#[derive(Clone, Debug, Default)]
pub struct SubnetAuth {
    /// The signature slots, in ascending index order.
    pub sig_idxs: Vec<SigIdx>,
}

impl SubnetAuth {
    /// Create an empty authorization block.
    pub fn new() -> Self {
        SubnetAuth::default()
    }

    /// Append a signature slot.  Slots must be appended in ascending
    /// index order to produce a canonical encoding.
    pub fn add_signature_idx(&mut self, index: u32, address: Address) {
        self.sig_idxs.push(SigIdx { index, address });
    }

    /// Deserialize an authorization block, including its type id.
    pub fn read_from(reader: &mut KdkReader) -> Result<Self, PlatformError> {
        let type_id = reader.read_u32().map_err(|e| {
            PlatformError::SerializationError(format!("reading subnet auth type: {}", e))
        })?;
        if type_id != SUBNET_AUTH_ID {
            return Err(PlatformError::SerializationError(format!(
                "expected subnet auth type id {}, found {}",
                SUBNET_AUTH_ID, type_id
            )));
        }
        let num_idxs = reader.read_u32().map_err(|e| {
            PlatformError::SerializationError(format!("reading subnet auth index count: {}", e))
        })?;
        let mut sig_idxs = Vec::with_capacity(num_idxs as usize);
        for _ in 0..num_idxs {
            let index = reader.read_u32().map_err(|e| {
                PlatformError::SerializationError(format!("reading subnet auth index: {}", e))
            })?;
            sig_idxs.push(SigIdx {
                index,
                address: Address::default(),
            });
        }
        Ok(SubnetAuth { sig_idxs })
    }

    /// Serialize this authorization block, including its type id.
    pub fn write_to(&self, writer: &mut KdkWriter) {
        writer.write_u32(SUBNET_AUTH_ID);
        writer.write_u32(self.sig_idxs.len() as u32);
        for sig_idx in &self.sig_idxs {
            writer.write_u32(sig_idx.index);
        }
    }
}

/// A transaction registering a new subnet.
///
/// The subnet is controlled by the owner block: future transactions
/// touching the subnet must carry a subnet authorization satisfying
/// its threshold.
///
/// # Wire format (after the type id)
///
/// | Field     | Size                      |
/// |-----------|---------------------------|
/// | base body | base tx                   |
/// | owner     | typed owner output        |
#[derive(Clone, Debug)]
pub struct CreateSubnetTx {
    /// The shared base body.
    pub base: BaseTx,

    /// Who controls the new subnet.
    pub owner: OutputOwners,
}

impl CreateSubnetTx {
    /// Create a new create-subnet transaction.
    pub fn new(base: BaseTx, owner: OutputOwners) -> Self {
        CreateSubnetTx { base, owner }
    }

    /// Deserialize a create-subnet body (the type id has already been
    /// consumed by the caller).
    pub fn read_from(reader: &mut KdkReader) -> Result<Self, PlatformError> {
        let base = BaseTx::read_from(reader)?;
        let owner_type = reader.read_u32().map_err(|e| {
            PlatformError::SerializationError(format!("reading subnet owner type: {}", e))
        })?;
        if owner_type != SECP_OWNER_OUTPUT_ID {
            return Err(PlatformError::SerializationError(format!(
                "expected owner output type id {}, found {}",
                SECP_OWNER_OUTPUT_ID, owner_type
            )));
        }
        let owner = OutputOwners::read_from(reader)?;
        Ok(CreateSubnetTx { base, owner })
    }

    /// Serialize this create-subnet body (without the type id).
    pub fn write_to(&self, writer: &mut KdkWriter) {
        self.base.write_to(writer);
        writer.write_u32(SECP_OWNER_OUTPUT_ID);
        self.owner.write_to(writer);
    }
}
