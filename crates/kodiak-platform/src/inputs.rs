//! Transaction inputs: transfer inputs, the stakeable lock wrapper,
//! and consumed-UTXO references.

use kodiak_primitives::ids::{Address, Id};
use kodiak_primitives::wire::{KdkReader, KdkWriter};

use crate::constants::{SECP_TRANSFER_INPUT_ID, STAKEABLE_LOCK_IN_ID};
use crate::PlatformError;

/// A signature slot: which owner-list index must sign, and with which
/// address.
///
/// Only the index is serialized.  The address is a local-only
/// annotation recorded while selecting UTXOs so that signing can later
/// look the key up in a keychain; decoding a transaction yields
/// zeroed addresses.
#[derive(Clone, Copy, Debug)]
pub struct SigIdx {
    /// Index into the consumed output's owner address list.
    pub index: u32,

    /// The signing address.  Local-only; not serialized.
    pub address: Address,
}

/// A secp256k1 transfer input consuming a fungible amount.
///
/// # Wire format
///
/// | Field        | Size          |
/// |--------------|---------------|
/// | type id      | 4 bytes (BE)  |
/// | amount       | 8 bytes (BE)  |
/// | n sig idxs   | 4 bytes (BE)  |
/// | sig indices  | n * 4 bytes   |
#[derive(Clone, Debug)]
pub struct SecpTransferInput {
    /// The number of asset units consumed, equal to the amount of the
    /// output being spent.
    pub amount: u64,

    /// The signature slots authorizing this spend.
    pub sig_idxs: Vec<SigIdx>,
}

impl SecpTransferInput {
    /// Create a new transfer input with no signature slots.
    pub fn new(amount: u64) -> Self {
        SecpTransferInput {
            amount,
            sig_idxs: Vec::new(),
        }
    }

    /// Append a signature slot.
    ///
    /// Slots must be appended in ascending index order to produce a
    /// canonical encoding; selection walks owner lists in order, so
    /// this happens naturally.
    pub fn add_signature_idx(&mut self, index: u32, address: Address) {
        self.sig_idxs.push(SigIdx { index, address });
    }

    /// Deserialize the body of a transfer input (the type id has
    /// already been consumed by the caller).
    pub fn read_from(reader: &mut KdkReader) -> Result<Self, PlatformError> {
        let amount = reader.read_u64().map_err(|e| {
            PlatformError::SerializationError(format!("reading amount: {}", e))
        })?;
        let num_sig_idxs = reader.read_u32().map_err(|e| {
            PlatformError::SerializationError(format!("reading signature index count: {}", e))
        })?;

        let mut sig_idxs = Vec::with_capacity(num_sig_idxs as usize);
        for _ in 0..num_sig_idxs {
            let index = reader.read_u32().map_err(|e| {
                PlatformError::SerializationError(format!("reading signature index: {}", e))
            })?;
            sig_idxs.push(SigIdx {
                index,
                address: Address::default(),
            });
        }

        Ok(SecpTransferInput { amount, sig_idxs })
    }

    /// Serialize this input, including its type id.
    pub fn write_to(&self, writer: &mut KdkWriter) {
        writer.write_u32(SECP_TRANSFER_INPUT_ID);
        writer.write_u64(self.amount);
        writer.write_u32(self.sig_idxs.len() as u32);
        for sig_idx in &self.sig_idxs {
            writer.write_u32(sig_idx.index);
        }
    }
}

/// A transfer input consuming funds that are still under a stakeable
/// lock.
///
/// # Wire format
///
/// | Field              | Size                 |
/// |--------------------|----------------------|
/// | type id            | 4 bytes (BE)         |
/// | stakeable locktime | 8 bytes (BE)         |
/// | inner input        | typed transfer input |
#[derive(Clone, Debug)]
pub struct StakeableLockIn {
    /// Unix time until which the consumed funds are locked.
    pub stakeable_locktime: u64,

    /// The wrapped transfer input.
    pub inner: SecpTransferInput,
}

impl StakeableLockIn {
    /// Create a new stakeable lock input.
    pub fn new(stakeable_locktime: u64, inner: SecpTransferInput) -> Self {
        StakeableLockIn {
            stakeable_locktime,
            inner,
        }
    }

    /// Deserialize the body of a stakeable lock input (the type id
    /// has already been consumed by the caller).
    ///
    /// The nested input must be a plain transfer input.
    pub fn read_from(reader: &mut KdkReader) -> Result<Self, PlatformError> {
        let stakeable_locktime = reader.read_u64().map_err(|e| {
            PlatformError::SerializationError(format!("reading stakeable locktime: {}", e))
        })?;
        let inner_type = reader.read_u32().map_err(|e| {
            PlatformError::SerializationError(format!("reading inner input type: {}", e))
        })?;
        if inner_type != SECP_TRANSFER_INPUT_ID {
            return Err(PlatformError::InvalidTransaction(format!(
                "stakeable lock input must wrap a transfer input, found type id {}",
                inner_type
            )));
        }
        let inner = SecpTransferInput::read_from(reader)?;
        Ok(StakeableLockIn {
            stakeable_locktime,
            inner,
        })
    }

    /// Serialize this input, including its type id.
    pub fn write_to(&self, writer: &mut KdkWriter) {
        writer.write_u32(STAKEABLE_LOCK_IN_ID);
        writer.write_u64(self.stakeable_locktime);
        self.inner.write_to(writer);
    }
}

/// Any input that can appear in a transaction.
#[derive(Clone, Debug)]
pub enum Input {
    /// A fungible transfer input (type id 5).
    SecpTransfer(SecpTransferInput),
    /// A transfer input under a stakeable lock (type id 21).
    StakeableLock(StakeableLockIn),
}

impl Input {
    /// The wire type id of this input.
    pub fn type_id(&self) -> u32 {
        match self {
            Input::SecpTransfer(_) => SECP_TRANSFER_INPUT_ID,
            Input::StakeableLock(_) => STAKEABLE_LOCK_IN_ID,
        }
    }

    /// The fungible amount consumed.
    pub fn amount(&self) -> u64 {
        match self {
            Input::SecpTransfer(input) => input.amount,
            Input::StakeableLock(input) => input.inner.amount,
        }
    }

    /// The signature slots authorizing this input.
    pub fn sig_idxs(&self) -> &[SigIdx] {
        match self {
            Input::SecpTransfer(input) => &input.sig_idxs,
            Input::StakeableLock(input) => &input.inner.sig_idxs,
        }
    }

    /// Deserialize any typed input from a `KdkReader`.
    ///
    /// An unknown type id leaves the cursor where it was before the
    /// call.
    pub fn read_from(reader: &mut KdkReader) -> Result<Self, PlatformError> {
        let start = reader.pos();
        let type_id = reader.read_u32().map_err(|e| {
            PlatformError::SerializationError(format!("reading input type: {}", e))
        })?;
        match type_id {
            SECP_TRANSFER_INPUT_ID => {
                Ok(Input::SecpTransfer(SecpTransferInput::read_from(reader)?))
            }
            STAKEABLE_LOCK_IN_ID => Ok(Input::StakeableLock(StakeableLockIn::read_from(reader)?)),
            other => {
                reader.rewind_to(start);
                Err(PlatformError::InvalidTransaction(format!(
                    "unknown input type id: {}",
                    other
                )))
            }
        }
    }

    /// Serialize this input, including its type id.
    pub fn write_to(&self, writer: &mut KdkWriter) {
        match self {
            Input::SecpTransfer(input) => input.write_to(writer),
            Input::StakeableLock(input) => input.write_to(writer),
        }
    }
}

/// An input paired with the UTXO it consumes.
///
/// # Wire format
///
/// | Field       | Size         |
/// |-------------|--------------|
/// | tx id       | 32 bytes     |
/// | output idx  | 4 bytes (BE) |
/// | asset id    | 32 bytes     |
/// | input       | typed input  |
#[derive(Clone, Debug)]
pub struct TransferableInput {
    /// The transaction that produced the consumed UTXO.
    pub tx_id: Id,

    /// The index of the consumed output within that transaction.
    pub output_idx: u32,

    /// The asset the consumed output holds.
    pub asset_id: Id,

    /// The typed input.
    pub input: Input,
}

impl TransferableInput {
    /// Create a new transferable input.
    pub fn new(tx_id: Id, output_idx: u32, asset_id: Id, input: Input) -> Self {
        TransferableInput {
            tx_id,
            output_idx,
            asset_id,
            input,
        }
    }

    /// Deserialize a transferable input from a `KdkReader`.
    pub fn read_from(reader: &mut KdkReader) -> Result<Self, PlatformError> {
        let tx_id = reader.read_id().map_err(|e| {
            PlatformError::SerializationError(format!("reading tx id: {}", e))
        })?;
        let output_idx = reader.read_u32().map_err(|e| {
            PlatformError::SerializationError(format!("reading output index: {}", e))
        })?;
        let asset_id = reader.read_id().map_err(|e| {
            PlatformError::SerializationError(format!("reading asset id: {}", e))
        })?;
        let input = Input::read_from(reader)?;
        Ok(TransferableInput {
            tx_id,
            output_idx,
            asset_id,
            input,
        })
    }

    /// Serialize this transferable input into a `KdkWriter`.
    pub fn write_to(&self, writer: &mut KdkWriter) {
        writer.write_id(&self.tx_id);
        writer.write_u32(self.output_idx);
        writer.write_id(&self.asset_id);
        self.input.write_to(writer);
    }
}

/// Sort inputs into canonical wire order (ascending consumed-UTXO
/// reference: tx id bytes, then output index).
pub(crate) fn sort_transferable_inputs(ins: &mut [TransferableInput]) {
    ins.sort_by_key(|input| (input.tx_id, input.output_idx));
}

#[cfg(test)]
mod tests {
    use super::*;
    use kodiak_primitives::ids::{ID_LEN, SHORT_ID_LEN};

    fn addr(byte: u8) -> Address {
        Address::new([byte; SHORT_ID_LEN])
    }

    #[test]
    fn test_transfer_input_roundtrip() {
        let mut input = SecpTransferInput::new(999);
        input.add_signature_idx(0, addr(1));
        input.add_signature_idx(2, addr(3));

        let mut writer = KdkWriter::new();
        input.write_to(&mut writer);
        let bytes = writer.into_bytes();
        // type(4) + amount(8) + count(4) + 2 * idx(4)
        assert_eq!(bytes.len(), 24);

        let mut reader = KdkReader::new(&bytes);
        let decoded = Input::read_from(&mut reader).unwrap();
        assert!(reader.is_empty());
        assert_eq!(decoded.amount(), 999);
        let idxs: Vec<u32> = decoded.sig_idxs().iter().map(|s| s.index).collect();
        assert_eq!(idxs, vec![0, 2]);
    }

    #[test]
    fn test_stakeable_lock_in_roundtrip() {
        let input = StakeableLockIn::new(424242, SecpTransferInput::new(10));
        let mut writer = KdkWriter::new();
        input.write_to(&mut writer);

        let mut reader = KdkReader::new(writer.as_bytes());
        let decoded = Input::read_from(&mut reader).unwrap();
        assert_eq!(decoded.type_id(), STAKEABLE_LOCK_IN_ID);
        assert_eq!(decoded.amount(), 10);
        match decoded {
            Input::StakeableLock(inner) => assert_eq!(inner.stakeable_locktime, 424242),
            _ => panic!("expected stakeable lock input"),
        }
    }

    #[test]
    fn test_unknown_input_type_rejected() {
        let mut writer = KdkWriter::new();
        writer.write_u32(42);
        let mut reader = KdkReader::new(writer.as_bytes());

        let result = Input::read_from(&mut reader);
        assert!(matches!(result, Err(PlatformError::InvalidTransaction(_))));
        assert_eq!(reader.pos(), 0, "unknown type must not advance the cursor");
    }

    #[test]
    fn test_transferable_input_sort_order() {
        let tx_a = Id::new([1u8; ID_LEN]);
        let tx_b = Id::new([2u8; ID_LEN]);
        let asset = Id::new([9u8; ID_LEN]);
        let make = |tx_id, output_idx| {
            TransferableInput::new(
                tx_id,
                output_idx,
                asset,
                Input::SecpTransfer(SecpTransferInput::new(1)),
            )
        };

        let mut ins = vec![make(tx_b, 0), make(tx_a, 7), make(tx_a, 1)];
        sort_transferable_inputs(&mut ins);

        let order: Vec<(Id, u32)> = ins.iter().map(|i| (i.tx_id, i.output_idx)).collect();
        assert_eq!(order, vec![(tx_a, 1), (tx_a, 7), (tx_b, 0)]);
    }
}
