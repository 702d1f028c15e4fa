//! Transaction outputs: transfer outputs, owner outputs, and the
//! stakeable lock wrapper.
//!
//! Defines who may spend an output and from when.  Provides binary
//! serialization/deserialization following the platform wire format.

use kodiak_primitives::ids::{Address, Id};
use kodiak_primitives::wire::{KdkReader, KdkWriter};

use crate::constants::{
    SECP_OWNER_OUTPUT_ID, SECP_TRANSFER_OUTPUT_ID, STAKEABLE_LOCK_OUT_ID,
};
use crate::PlatformError;

/// The ownership block shared by every output kind.
///
/// An output is spendable once `locktime` has passed, by signatures
/// from any `threshold` of the listed `addresses`.  Addresses are kept
/// sorted ascending by their bytes, which is the order the wire format
/// requires and the order signature indices refer to.
///
/// # Wire format
///
/// | Field       | Size            |
/// |-------------|-----------------|
/// | locktime    | 8 bytes (BE)    |
/// | threshold   | 4 bytes (BE)    |
/// | n addresses | 4 bytes (BE)    |
/// | addresses   | n * 20 bytes    |
#[derive(Clone, Debug)]
pub struct OutputOwners {
    /// Unix time before which this output cannot be spent.
    pub locktime: u64,

    /// Number of signatures required to spend this output.
    pub threshold: u32,

    /// The addresses that may sign, sorted ascending.
    pub addresses: Vec<Address>,
}

impl OutputOwners {
    /// Create a new `OutputOwners`, sorting the addresses.
    ///
    /// # Arguments
    /// * `locktime` - Unix time before which the output is locked.
    /// * `threshold` - Number of signatures required.
    /// * `addresses` - The owner addresses, in any order.
    pub fn new(locktime: u64, threshold: u32, mut addresses: Vec<Address>) -> Self {
        addresses.sort();
        OutputOwners {
            locktime,
            threshold,
            addresses,
        }
    }

    /// Deserialize an ownership block from a `KdkReader`.
    ///
    /// # Arguments
    /// * `reader` - The reader positioned at the start of an encoded
    ///   ownership block.
    ///
    /// # Returns
    /// `Ok(OutputOwners)` on success, or a `PlatformError` if the data
    /// is truncated or the threshold exceeds the address count.
    pub fn read_from(reader: &mut KdkReader) -> Result<Self, PlatformError> {
        let locktime = reader.read_u64().map_err(|e| {
            PlatformError::SerializationError(format!("reading locktime: {}", e))
        })?;
        let threshold = reader.read_u32().map_err(|e| {
            PlatformError::SerializationError(format!("reading threshold: {}", e))
        })?;
        let num_addresses = reader.read_u32().map_err(|e| {
            PlatformError::SerializationError(format!("reading address count: {}", e))
        })?;
        if threshold as usize > num_addresses as usize {
            return Err(PlatformError::ThresholdError(format!(
                "threshold {} exceeds {} owner addresses",
                threshold, num_addresses
            )));
        }

        let mut addresses = Vec::with_capacity(num_addresses as usize);
        for _ in 0..num_addresses {
            let address = reader.read_address().map_err(|e| {
                PlatformError::SerializationError(format!("reading address: {}", e))
            })?;
            addresses.push(address);
        }

        Ok(OutputOwners {
            locktime,
            threshold,
            addresses,
        })
    }

    /// Serialize this ownership block into a `KdkWriter`.
    pub fn write_to(&self, writer: &mut KdkWriter) {
        writer.write_u64(self.locktime);
        writer.write_u32(self.threshold);
        writer.write_u32(self.addresses.len() as u32);
        for address in &self.addresses {
            writer.write_address(address);
        }
    }

    /// Select the owner addresses that qualify to sign at `as_of`.
    ///
    /// Walks the owner list in order and, for each owner found among
    /// `addresses`, records its index in the owner list.  Stops once
    /// `threshold` spenders have been found.  Returns an empty vector
    /// while the output is still timelocked (`as_of <= locktime`).
    ///
    /// # Arguments
    /// * `addresses` - The candidate signing addresses.
    /// * `as_of` - The Unix time at which spending would happen.
    ///
    /// # Returns
    /// Pairs of (owner list index, address), at most `threshold` long.
    pub fn spenders(&self, addresses: &[Address], as_of: u64) -> Vec<(u32, Address)> {
        let mut qualified: Vec<(u32, Address)> = Vec::new();
        if as_of <= self.locktime {
            return qualified;
        }
        for (idx, owner) in self.addresses.iter().enumerate() {
            if qualified.len() >= self.threshold as usize {
                break;
            }
            if addresses.contains(owner) {
                qualified.push((idx as u32, *owner));
            }
        }
        qualified
    }

    /// Whether `addresses` can produce exactly `threshold` qualifying
    /// signatures at `as_of`.
    pub fn meets_threshold(&self, addresses: &[Address], as_of: u64) -> bool {
        self.spenders(addresses, as_of).len() == self.threshold as usize
    }
}

/// A secp256k1 transfer output carrying a fungible amount.
///
/// # Wire format
///
/// | Field       | Size            |
/// |-------------|-----------------|
/// | type id     | 4 bytes (BE)    |
/// | amount      | 8 bytes (BE)    |
/// | owners      | ownership block |
#[derive(Clone, Debug)]
pub struct SecpTransferOutput {
    /// The number of asset units held by this output.
    pub amount: u64,

    /// Who may spend this output and from when.
    pub owners: OutputOwners,
}

impl SecpTransferOutput {
    /// Create a new transfer output.
    pub fn new(amount: u64, owners: OutputOwners) -> Self {
        SecpTransferOutput { amount, owners }
    }

    /// Deserialize the body of a transfer output (the type id has
    /// already been consumed by the caller).
    pub fn read_from(reader: &mut KdkReader) -> Result<Self, PlatformError> {
        let amount = reader.read_u64().map_err(|e| {
            PlatformError::SerializationError(format!("reading amount: {}", e))
        })?;
        let owners = OutputOwners::read_from(reader)?;
        Ok(SecpTransferOutput { amount, owners })
    }

    /// Serialize this output, including its type id.
    pub fn write_to(&self, writer: &mut KdkWriter) {
        writer.write_u32(SECP_TRANSFER_OUTPUT_ID);
        writer.write_u64(self.amount);
        self.owners.write_to(writer);
    }
}

/// A transfer output locked for staking until `stakeable_locktime`.
///
/// Until the stakeable locktime passes, the wrapped output can only be
/// consumed by staking transactions, which must re-emit the funds under
/// the same lock.  After it passes, the wrapper is inert and the output
/// behaves like its inner transfer output.
///
/// # Wire format
///
/// | Field              | Size                  |
/// |--------------------|-----------------------|
/// | type id            | 4 bytes (BE)          |
/// | stakeable locktime | 8 bytes (BE)          |
/// | inner output       | typed transfer output |
#[derive(Clone, Debug)]
pub struct StakeableLockOut {
    /// Unix time until which the funds are locked for staking.
    pub stakeable_locktime: u64,

    /// The wrapped transfer output.
    pub inner: SecpTransferOutput,
}

impl StakeableLockOut {
    /// Create a new stakeable lock output.
    pub fn new(stakeable_locktime: u64, inner: SecpTransferOutput) -> Self {
        StakeableLockOut {
            stakeable_locktime,
            inner,
        }
    }

    /// Deserialize the body of a stakeable lock output (the type id
    /// has already been consumed by the caller).
    ///
    /// The nested output must be a plain transfer output; a stakeable
    /// lock output cannot wrap another wrapper.
    pub fn read_from(reader: &mut KdkReader) -> Result<Self, PlatformError> {
        let stakeable_locktime = reader.read_u64().map_err(|e| {
            PlatformError::SerializationError(format!("reading stakeable locktime: {}", e))
        })?;
        let inner_type = reader.read_u32().map_err(|e| {
            PlatformError::SerializationError(format!("reading inner output type: {}", e))
        })?;
        if inner_type != SECP_TRANSFER_OUTPUT_ID {
            return Err(PlatformError::InvalidUtxo(format!(
                "stakeable lock output must wrap a transfer output, found type id {}",
                inner_type
            )));
        }
        let inner = SecpTransferOutput::read_from(reader)?;
        Ok(StakeableLockOut {
            stakeable_locktime,
            inner,
        })
    }

    /// Serialize this output, including its type id.
    pub fn write_to(&self, writer: &mut KdkWriter) {
        writer.write_u32(STAKEABLE_LOCK_OUT_ID);
        writer.write_u64(self.stakeable_locktime);
        self.inner.write_to(writer);
    }
}

/// Any output that can appear in a UTXO or transaction.
#[derive(Clone, Debug)]
pub enum Output {
    /// A fungible transfer output (type id 7).
    SecpTransfer(SecpTransferOutput),
    /// An ownership-only output with no amount (type id 11).
    SecpOwner(OutputOwners),
    /// A transfer output under a stakeable lock (type id 22).
    StakeableLock(StakeableLockOut),
}

impl Output {
    /// The wire type id of this output.
    pub fn type_id(&self) -> u32 {
        match self {
            Output::SecpTransfer(_) => SECP_TRANSFER_OUTPUT_ID,
            Output::SecpOwner(_) => SECP_OWNER_OUTPUT_ID,
            Output::StakeableLock(_) => STAKEABLE_LOCK_OUT_ID,
        }
    }

    /// The fungible amount carried, if this output kind has one.
    pub fn amount(&self) -> Option<u64> {
        match self {
            Output::SecpTransfer(out) => Some(out.amount),
            Output::SecpOwner(_) => None,
            Output::StakeableLock(out) => Some(out.inner.amount),
        }
    }

    /// The ownership block of this output.
    pub fn owners(&self) -> &OutputOwners {
        match self {
            Output::SecpTransfer(out) => &out.owners,
            Output::SecpOwner(owners) => owners,
            Output::StakeableLock(out) => &out.inner.owners,
        }
    }

    /// The stakeable locktime, if this output is under one.
    pub fn stakeable_locktime(&self) -> Option<u64> {
        match self {
            Output::StakeableLock(out) => Some(out.stakeable_locktime),
            _ => None,
        }
    }

    /// Deserialize any typed output from a `KdkReader`.
    ///
    /// Reads the 4-byte type id and dispatches to the matching body
    /// parser.
    ///
    /// # Returns
    /// `Ok(Output)` on success, or a `PlatformError` for an unknown
    /// type id or truncated data.  An unknown type id leaves the
    /// cursor where it was before the call.
    pub fn read_from(reader: &mut KdkReader) -> Result<Self, PlatformError> {
        let start = reader.pos();
        let type_id = reader.read_u32().map_err(|e| {
            PlatformError::SerializationError(format!("reading output type: {}", e))
        })?;
        match type_id {
            SECP_TRANSFER_OUTPUT_ID => {
                Ok(Output::SecpTransfer(SecpTransferOutput::read_from(reader)?))
            }
            SECP_OWNER_OUTPUT_ID => Ok(Output::SecpOwner(OutputOwners::read_from(reader)?)),
            STAKEABLE_LOCK_OUT_ID => {
                Ok(Output::StakeableLock(StakeableLockOut::read_from(reader)?))
            }
            other => {
                reader.rewind_to(start);
                Err(PlatformError::InvalidUtxo(format!(
                    "unknown output type id: {}",
                    other
                )))
            }
        }
    }

    /// Serialize this output, including its type id.
    pub fn write_to(&self, writer: &mut KdkWriter) {
        match self {
            Output::SecpTransfer(out) => out.write_to(writer),
            Output::SecpOwner(owners) => {
                writer.write_u32(SECP_OWNER_OUTPUT_ID);
                owners.write_to(writer);
            }
            Output::StakeableLock(out) => out.write_to(writer),
        }
    }
}

/// An output paired with the asset it denominates.
///
/// # Wire format
///
/// | Field    | Size         |
/// |----------|--------------|
/// | asset id | 32 bytes     |
/// | output   | typed output |
#[derive(Clone, Debug)]
pub struct TransferableOutput {
    /// The asset this output holds units of.
    pub asset_id: Id,

    /// The typed output.
    pub output: Output,
}

impl TransferableOutput {
    /// Create a new transferable output.
    pub fn new(asset_id: Id, output: Output) -> Self {
        TransferableOutput { asset_id, output }
    }

    /// Deserialize a transferable output from a `KdkReader`.
    pub fn read_from(reader: &mut KdkReader) -> Result<Self, PlatformError> {
        let asset_id = reader.read_id().map_err(|e| {
            PlatformError::SerializationError(format!("reading asset id: {}", e))
        })?;
        let output = Output::read_from(reader)?;
        Ok(TransferableOutput { asset_id, output })
    }

    /// Serialize this transferable output into a `KdkWriter`.
    pub fn write_to(&self, writer: &mut KdkWriter) {
        writer.write_id(&self.asset_id);
        self.output.write_to(writer);
    }

    /// Serialize this transferable output to a byte vector.
    ///
    /// The wire encoding doubles as the canonical sort key for output
    /// lists.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = KdkWriter::new();
        self.write_to(&mut writer);
        writer.into_bytes()
    }
}

/// Sort outputs into canonical wire order (ascending encoding bytes).
pub(crate) fn sort_transferable_outputs(outs: &mut [TransferableOutput]) {
    outs.sort_by_cached_key(|out| out.to_bytes());
}
