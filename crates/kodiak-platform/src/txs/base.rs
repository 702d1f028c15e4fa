//! The base transaction body shared by every transaction kind.

use kodiak_primitives::ids::Id;
use kodiak_primitives::wire::{KdkReader, KdkWriter};

use crate::inputs::{sort_transferable_inputs, TransferableInput};
use crate::outputs::{sort_transferable_outputs, TransferableOutput};
use crate::PlatformError;

/// The common body of every platform transaction: consumed inputs,
/// produced outputs, and chain identification.
///
/// Inputs and outputs are kept in canonical wire order (set by the
/// constructor), so the in-memory order always matches the encoding.
///
/// # Wire format
///
/// | Field         | Size               |
/// |---------------|--------------------|
/// | network id    | 4 bytes (BE)       |
/// | blockchain id | 32 bytes           |
/// | n outputs     | 4 bytes (BE)       |
/// | outputs       | transferable outs  |
/// | n inputs      | 4 bytes (BE)       |
/// | inputs        | transferable ins   |
/// | memo length   | 4 bytes (BE)       |
/// | memo          | variable           |
#[derive(Clone, Debug)]
pub struct BaseTx {
    /// The numeric id of the network this transaction targets.
    pub network_id: u32,

    /// The id of the blockchain this transaction targets.
    pub blockchain_id: Id,

    /// The produced outputs, in canonical order.
    pub outs: Vec<TransferableOutput>,

    /// The consumed inputs, in canonical order.
    pub ins: Vec<TransferableInput>,

    /// Arbitrary caller-supplied bytes carried with the transaction.
    pub memo: Vec<u8>,
}

impl BaseTx {
    /// Create a new base body, sorting inputs and outputs into
    /// canonical order.
    pub fn new(
        network_id: u32,
        blockchain_id: Id,
        mut outs: Vec<TransferableOutput>,
        mut ins: Vec<TransferableInput>,
        memo: Vec<u8>,
    ) -> Self {
        sort_transferable_outputs(&mut outs);
        sort_transferable_inputs(&mut ins);
        BaseTx {
            network_id,
            blockchain_id,
            outs,
            ins,
            memo,
        }
    }

    /// Deserialize a base body from a `KdkReader`.
    pub fn read_from(reader: &mut KdkReader) -> Result<Self, PlatformError> {
        let network_id = reader.read_u32().map_err(|e| {
            PlatformError::SerializationError(format!("reading network id: {}", e))
        })?;
        let blockchain_id = reader.read_id().map_err(|e| {
            PlatformError::SerializationError(format!("reading blockchain id: {}", e))
        })?;

        let num_outs = reader.read_u32().map_err(|e| {
            PlatformError::SerializationError(format!("reading output count: {}", e))
        })?;
        let mut outs = Vec::with_capacity(num_outs as usize);
        for _ in 0..num_outs {
            outs.push(TransferableOutput::read_from(reader)?);
        }

        let num_ins = reader.read_u32().map_err(|e| {
            PlatformError::SerializationError(format!("reading input count: {}", e))
        })?;
        let mut ins = Vec::with_capacity(num_ins as usize);
        for _ in 0..num_ins {
            ins.push(TransferableInput::read_from(reader)?);
        }

        let memo_len = reader.read_u32().map_err(|e| {
            PlatformError::SerializationError(format!("reading memo length: {}", e))
        })?;
        let memo = reader
            .read_bytes(memo_len as usize)
            .map_err(|e| PlatformError::SerializationError(format!("reading memo: {}", e)))?
            .to_vec();

        Ok(BaseTx {
            network_id,
            blockchain_id,
            outs,
            ins,
            memo,
        })
    }

    /// Serialize this base body into a `KdkWriter`.
    pub fn write_to(&self, writer: &mut KdkWriter) {
        writer.write_u32(self.network_id);
        writer.write_id(&self.blockchain_id);
        writer.write_u32(self.outs.len() as u32);
        for out in &self.outs {
            out.write_to(writer);
        }
        writer.write_u32(self.ins.len() as u32);
        for input in &self.ins {
            input.write_to(writer);
        }
        writer.write_u32(self.memo.len() as u32);
        writer.write_bytes(&self.memo);
    }
}
