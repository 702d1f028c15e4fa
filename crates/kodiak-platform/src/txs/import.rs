//! Import transaction: claims atomic UTXOs exported from another
//! chain.

use kodiak_primitives::ids::Id;
use kodiak_primitives::wire::{KdkReader, KdkWriter};

use crate::inputs::{sort_transferable_inputs, TransferableInput};
use crate::txs::base::BaseTx;
use crate::PlatformError;

/// A transaction consuming UTXOs from another chain's atomic memory.
///
/// The imported inputs are listed separately from the base inputs and
/// are signed with their own credentials, appended after the base
/// input credentials.
///
/// # Wire format (after the type id)
///
/// | Field             | Size              |
/// |-------------------|-------------------|
/// | base body         | base tx           |
/// | source chain      | 32 bytes          |
/// | n imported inputs | 4 bytes (BE)      |
/// | imported inputs   | transferable ins  |
#[derive(Clone, Debug)]
pub struct ImportTx {
    /// The shared base body.
    pub base: BaseTx,

    /// The chain the consumed atomic UTXOs were exported from.
    pub source_chain: Id,

    /// The atomic UTXOs being claimed, in canonical order.
    pub import_ins: Vec<TransferableInput>,
}

impl ImportTx {
    /// Create a new import transaction, sorting the imported inputs
    /// into canonical order.
    pub fn new(base: BaseTx, source_chain: Id, mut import_ins: Vec<TransferableInput>) -> Self {
        sort_transferable_inputs(&mut import_ins);
        ImportTx {
            base,
            source_chain,
            import_ins,
        }
    }

    /// Deserialize an import body (the type id has already been
    /// consumed by the caller).
    pub fn read_from(reader: &mut KdkReader) -> Result<Self, PlatformError> {
        let base = BaseTx::read_from(reader)?;
        let source_chain = reader.read_id().map_err(|e| {
            PlatformError::SerializationError(format!("reading source chain: {}", e))
        })?;
        let num_ins = reader.read_u32().map_err(|e| {
            PlatformError::SerializationError(format!("reading imported input count: {}", e))
        })?;
        let mut import_ins = Vec::with_capacity(num_ins as usize);
        for _ in 0..num_ins {
            import_ins.push(TransferableInput::read_from(reader)?);
        }
        Ok(ImportTx {
            base,
            source_chain,
            import_ins,
        })
    }

    /// Serialize this import body (without the type id).
    pub fn write_to(&self, writer: &mut KdkWriter) {
        self.base.write_to(writer);
        writer.write_id(&self.source_chain);
        writer.write_u32(self.import_ins.len() as u32);
        for input in &self.import_ins {
            input.write_to(writer);
        }
    }
}
