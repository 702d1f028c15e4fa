//! Export transaction: moves funds into another chain's atomic
//! memory.

use kodiak_primitives::ids::Id;
use kodiak_primitives::wire::{KdkReader, KdkWriter};

use crate::outputs::{sort_transferable_outputs, TransferableOutput};
use crate::txs::base::BaseTx;
use crate::PlatformError;

/// A transaction producing outputs spendable only by an import on the
/// destination chain.
///
/// # Wire format (after the type id)
///
/// | Field              | Size               |
/// |--------------------|--------------------|
/// | base body          | base tx            |
/// | destination chain  | 32 bytes           |
/// | n exported outputs | 4 bytes (BE)       |
/// | exported outputs   | transferable outs  |
#[derive(Clone, Debug)]
pub struct ExportTx {
    /// The shared base body.
    pub base: BaseTx,

    /// The chain whose atomic memory receives the exported outputs.
    pub destination_chain: Id,

    /// The outputs being exported, in canonical order.
    pub export_outs: Vec<TransferableOutput>,
}

impl ExportTx {
    /// Create a new export transaction, sorting the exported outputs
    /// into canonical order.
    pub fn new(
        base: BaseTx,
        destination_chain: Id,
        mut export_outs: Vec<TransferableOutput>,
    ) -> Self {
        sort_transferable_outputs(&mut export_outs);
        ExportTx {
            base,
            destination_chain,
            export_outs,
        }
    }

    /// Deserialize an export body (the type id has already been
    /// consumed by the caller).
    pub fn read_from(reader: &mut KdkReader) -> Result<Self, PlatformError> {
        let base = BaseTx::read_from(reader)?;
        let destination_chain = reader.read_id().map_err(|e| {
            PlatformError::SerializationError(format!("reading destination chain: {}", e))
        })?;
        let num_outs = reader.read_u32().map_err(|e| {
            PlatformError::SerializationError(format!("reading exported output count: {}", e))
        })?;
        let mut export_outs = Vec::with_capacity(num_outs as usize);
        for _ in 0..num_outs {
            export_outs.push(TransferableOutput::read_from(reader)?);
        }
        Ok(ExportTx {
            base,
            destination_chain,
            export_outs,
        })
    }

    /// Serialize this export body (without the type id).
    pub fn write_to(&self, writer: &mut KdkWriter) {
        self.base.write_to(writer);
        writer.write_id(&self.destination_chain);
        writer.write_u32(self.export_outs.len() as u32);
        for out in &self.export_outs {
            out.write_to(writer);
        }
    }
}
