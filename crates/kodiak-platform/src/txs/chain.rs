//! Chain creation on an existing subnet.

use kodiak_primitives::ids::{Address, Id};
use kodiak_primitives::wire::{KdkReader, KdkWriter};

use crate::txs::base::BaseTx;
use crate::txs::subnet::SubnetAuth;
use crate::PlatformError;

/// A transaction creating a new blockchain on a subnet.
///
/// Requires authorization from the subnet's owners, signed with an
/// extra credential appended after the input credentials.
///
/// # Wire format (after the type id)
///
/// | Field          | Size                    |
/// |----------------|-------------------------|
/// | base body      | base tx                 |
/// | subnet id      | 32 bytes                |
/// | name length    | 2 bytes (BE)            |
/// | chain name     | variable (UTF-8)        |
/// | vm id          | 32 bytes                |
/// | n fx ids       | 4 bytes (BE)            |
/// | fx ids         | n * 32 bytes            |
/// | genesis length | 4 bytes (BE)            |
/// | genesis data   | variable                |
/// | subnet auth    | typed auth block        |
#[derive(Clone, Debug)]
pub struct CreateChainTx {
    /// The shared base body.
    pub base: BaseTx,

    /// The subnet the new chain runs on.
    pub subnet_id: Id,

    /// Human-readable chain name.
    pub chain_name: String,

    /// The virtual machine the chain runs.
    pub vm_id: Id,

    /// Feature extensions the chain's VM uses, in canonical order.
    pub fx_ids: Vec<Id>,

    /// Opaque VM-specific genesis state.
    pub genesis_data: Vec<u8>,

    /// Authorization from the subnet's owners.
    pub subnet_auth: SubnetAuth,
}

impl CreateChainTx {
    /// Create a new create-chain transaction, sorting the feature
    /// extension ids into canonical order.
    pub fn new(
        base: BaseTx,
        subnet_id: Id,
        chain_name: String,
        vm_id: Id,
        mut fx_ids: Vec<Id>,
        genesis_data: Vec<u8>,
    ) -> Self {
        fx_ids.sort();
        CreateChainTx {
            base,
            subnet_id,
            chain_name,
            vm_id,
            fx_ids,
            genesis_data,
            subnet_auth: SubnetAuth::new(),
        }
    }

    /// Append a subnet authorization signature slot.
    pub fn add_signature_idx(&mut self, index: u32, address: Address) {
        self.subnet_auth.add_signature_idx(index, address);
    }

    /// Deserialize a create-chain body (the type id has already been
    /// consumed by the caller).
    pub fn read_from(reader: &mut KdkReader) -> Result<Self, PlatformError> {
        let base = BaseTx::read_from(reader)?;
        let subnet_id = reader.read_id().map_err(|e| {
            PlatformError::SerializationError(format!("reading subnet id: {}", e))
        })?;
        let name_len = reader.read_u16().map_err(|e| {
            PlatformError::SerializationError(format!("reading chain name length: {}", e))
        })?;
        let name_bytes = reader.read_bytes(name_len as usize).map_err(|e| {
            PlatformError::SerializationError(format!("reading chain name: {}", e))
        })?;
        let chain_name = String::from_utf8(name_bytes.to_vec()).map_err(|e| {
            PlatformError::SerializationError(format!("chain name is not valid UTF-8: {}", e))
        })?;
        let vm_id = reader.read_id().map_err(|e| {
            PlatformError::SerializationError(format!("reading vm id: {}", e))
        })?;
        let num_fx_ids = reader.read_u32().map_err(|e| {
            PlatformError::SerializationError(format!("reading fx id count: {}", e))
        })?;
        let mut fx_ids = Vec::with_capacity(num_fx_ids as usize);
        for _ in 0..num_fx_ids {
            let fx_id = reader.read_id().map_err(|e| {
                PlatformError::SerializationError(format!("reading fx id: {}", e))
            })?;
            fx_ids.push(fx_id);
        }
        let genesis_len = reader.read_u32().map_err(|e| {
            PlatformError::SerializationError(format!("reading genesis length: {}", e))
        })?;
        let genesis_data = reader
            .read_bytes(genesis_len as usize)
            .map_err(|e| {
                PlatformError::SerializationError(format!("reading genesis data: {}", e))
            })?
            .to_vec();
        let subnet_auth = SubnetAuth::read_from(reader)?;
        Ok(CreateChainTx {
            base,
            subnet_id,
            chain_name,
            vm_id,
            fx_ids,
            genesis_data,
            subnet_auth,
        })
    }

    /// Serialize this create-chain body (without the type id).
    pub fn write_to(&self, writer: &mut KdkWriter) {
        self.base.write_to(writer);
        writer.write_id(&self.subnet_id);
        writer.write_u16(self.chain_name.len() as u16);
        writer.write_bytes(self.chain_name.as_bytes());
        writer.write_id(&self.vm_id);
        writer.write_u32(self.fx_ids.len() as u32);
        for fx_id in &self.fx_ids {
            writer.write_id(fx_id);
        }
        writer.write_u32(self.genesis_data.len() as u32);
        writer.write_bytes(&self.genesis_data);
        self.subnet_auth.write_to(writer);
    }
}
