//! Staking transactions: primary network validators and nominators,
//! and subnet validators.

use kodiak_primitives::ids::{Address, Id, NodeId};
use kodiak_primitives::wire::{KdkReader, KdkWriter};

use crate::constants::SECP_OWNER_OUTPUT_ID;
use crate::outputs::{sort_transferable_outputs, OutputOwners, TransferableOutput};
use crate::txs::base::BaseTx;
use crate::txs::subnet::SubnetAuth;
use crate::PlatformError;

/// The staking commitment common to every staking transaction.
///
/// # Wire format
///
/// | Field      | Size         |
/// |------------|--------------|
/// | node id    | 20 bytes     |
/// | start time | 8 bytes (BE) |
/// | end time   | 8 bytes (BE) |
/// | weight     | 8 bytes (BE) |
#[derive(Clone, Debug)]
pub struct Validator {
    /// The staking node.
    pub node_id: NodeId,

    /// Unix time the staking period starts.
    pub start_time: u64,

    /// Unix time the staking period ends.
    pub end_time: u64,

    /// The staked amount (or subnet weight) in asset units.
    pub weight: u64,
}

impl Validator {
    /// Create a new staking commitment.
    pub fn new(node_id: NodeId, start_time: u64, end_time: u64, weight: u64) -> Self {
        Validator {
            node_id,
            start_time,
            end_time,
            weight,
        }
    }

    /// Deserialize a staking commitment from a `KdkReader`.
    pub fn read_from(reader: &mut KdkReader) -> Result<Self, PlatformError> {
        let node_id = reader.read_node_id().map_err(|e| {
            PlatformError::SerializationError(format!("reading node id: {}", e))
        })?;
        let start_time = reader.read_u64().map_err(|e| {
            PlatformError::SerializationError(format!("reading start time: {}", e))
        })?;
        let end_time = reader.read_u64().map_err(|e| {
            PlatformError::SerializationError(format!("reading end time: {}", e))
        })?;
        let weight = reader.read_u64().map_err(|e| {
            PlatformError::SerializationError(format!("reading weight: {}", e))
        })?;
        Ok(Validator {
            node_id,
            start_time,
            end_time,
            weight,
        })
    }

    /// Serialize this staking commitment into a `KdkWriter`.
    pub fn write_to(&self, writer: &mut KdkWriter) {
        writer.write_node_id(&self.node_id);
        writer.write_u64(self.start_time);
        writer.write_u64(self.end_time);
        writer.write_u64(self.weight);
    }
}

/// Read a typed rewards owner block, validating its type id.
fn read_rewards_owner(reader: &mut KdkReader) -> Result<OutputOwners, PlatformError> {
    let type_id = reader.read_u32().map_err(|e| {
        PlatformError::SerializationError(format!("reading rewards owner type: {}", e))
    })?;
    if type_id != SECP_OWNER_OUTPUT_ID {
        return Err(PlatformError::SerializationError(format!(
            "expected owner output type id {}, found {}",
            SECP_OWNER_OUTPUT_ID, type_id
        )));
    }
    OutputOwners::read_from(reader)
}

fn write_rewards_owner(owner: &OutputOwners, writer: &mut KdkWriter) {
    writer.write_u32(SECP_OWNER_OUTPUT_ID);
    owner.write_to(writer);
}

/// A transaction registering a primary network validator.
///
/// The staked outputs are locked for the duration of the staking
/// period and returned, along with any reward, to the rewards owner
/// when the period ends.  `shares` is the fee this validator takes
/// from nominator rewards, in parts per million.
///
/// # Wire format (after the type id)
///
/// | Field           | Size               |
/// |-----------------|--------------------|
/// | base body       | base tx            |
/// | validator       | staking commitment |
/// | n staked outs   | 4 bytes (BE)       |
/// | staked outs     | transferable outs  |
/// | rewards owner   | typed owner output |
/// | shares          | 4 bytes (BE)       |
#[derive(Clone, Debug)]
pub struct AddValidatorTx {
    /// The shared base body.
    pub base: BaseTx,

    /// The staking commitment.  Its weight equals the total staked
    /// amount.
    pub validator: Validator,

    /// The outputs holding the staked funds, in canonical order.
    pub stake_outs: Vec<TransferableOutput>,

    /// Who receives the stake back and any staking reward.
    pub rewards_owner: OutputOwners,

    /// Nominator reward fee in parts per million.
    pub shares: u32,
}

impl AddValidatorTx {
    /// Create a new add-validator transaction, sorting the staked
    /// outputs into canonical order.
    pub fn new(
        base: BaseTx,
        validator: Validator,
        mut stake_outs: Vec<TransferableOutput>,
        rewards_owner: OutputOwners,
        shares: u32,
    ) -> Self {
        sort_transferable_outputs(&mut stake_outs);
        AddValidatorTx {
            base,
            validator,
            stake_outs,
            rewards_owner,
            shares,
        }
    }

    /// Deserialize an add-validator body (the type id has already
    /// been consumed by the caller).
    pub fn read_from(reader: &mut KdkReader) -> Result<Self, PlatformError> {
        let base = BaseTx::read_from(reader)?;
        let validator = Validator::read_from(reader)?;
        let stake_outs = read_stake_outs(reader)?;
        let rewards_owner = read_rewards_owner(reader)?;
        let shares = reader.read_u32().map_err(|e| {
            PlatformError::SerializationError(format!("reading shares: {}", e))
        })?;
        Ok(AddValidatorTx {
            base,
            validator,
            stake_outs,
            rewards_owner,
            shares,
        })
    }

    /// Serialize this add-validator body (without the type id).
    pub fn write_to(&self, writer: &mut KdkWriter) {
        self.base.write_to(writer);
        self.validator.write_to(writer);
        write_stake_outs(&self.stake_outs, writer);
        write_rewards_owner(&self.rewards_owner, writer);
        writer.write_u32(self.shares);
    }
}

/// A transaction adding stake to an existing validator in exchange
/// for a share of its rewards.
///
/// # Wire format (after the type id)
///
/// | Field         | Size               |
/// |---------------|--------------------|
/// | base body     | base tx            |
/// | validator     | staking commitment |
/// | n staked outs | 4 bytes (BE)       |
/// | staked outs   | transferable outs  |
/// | rewards owner | typed owner output |
#[derive(Clone, Debug)]
pub struct AddNominatorTx {
    /// The shared base body.
    pub base: BaseTx,

    /// The staking commitment.  Its weight equals the total staked
    /// amount.
    pub validator: Validator,

    /// The outputs holding the staked funds, in canonical order.
    pub stake_outs: Vec<TransferableOutput>,

    /// Who receives the stake back and any staking reward.
    pub rewards_owner: OutputOwners,
}

impl AddNominatorTx {
    /// Create a new add-nominator transaction, sorting the staked
    /// outputs into canonical order.
    pub fn new(
        base: BaseTx,
        validator: Validator,
        mut stake_outs: Vec<TransferableOutput>,
        rewards_owner: OutputOwners,
    ) -> Self {
        sort_transferable_outputs(&mut stake_outs);
        AddNominatorTx {
            base,
            validator,
            stake_outs,
            rewards_owner,
        }
    }

    /// Deserialize an add-nominator body (the type id has already
    /// been consumed by the caller).
    pub fn read_from(reader: &mut KdkReader) -> Result<Self, PlatformError> {
        let base = BaseTx::read_from(reader)?;
        let validator = Validator::read_from(reader)?;
        let stake_outs = read_stake_outs(reader)?;
        let rewards_owner = read_rewards_owner(reader)?;
        Ok(AddNominatorTx {
            base,
            validator,
            stake_outs,
            rewards_owner,
        })
    }

    /// Serialize this add-nominator body (without the type id).
    pub fn write_to(&self, writer: &mut KdkWriter) {
        self.base.write_to(writer);
        self.validator.write_to(writer);
        write_stake_outs(&self.stake_outs, writer);
        write_rewards_owner(&self.rewards_owner, writer);
    }
}

/// A transaction registering an existing primary network validator as
/// a validator of a subnet.
///
/// Requires authorization from the subnet's owners; the authorization
/// is signed with an extra credential appended after the input
/// credentials.
///
/// # Wire format (after the type id)
///
/// | Field       | Size               |
/// |-------------|--------------------|
/// | base body   | base tx            |
/// | validator   | staking commitment |
/// | subnet id   | 32 bytes           |
/// | subnet auth | typed auth block   |
#[derive(Clone, Debug)]
pub struct AddSubnetValidatorTx {
    /// The shared base body.
    pub base: BaseTx,

    /// The staking commitment.  Its weight is the validator's sampling
    /// weight on the subnet, not a staked amount.
    pub validator: Validator,

    /// The subnet being validated.
    pub subnet_id: Id,

    /// Authorization from the subnet's owners.
    pub subnet_auth: SubnetAuth,
}

impl AddSubnetValidatorTx {
    /// Create a new add-subnet-validator transaction.
    pub fn new(base: BaseTx, validator: Validator, subnet_id: Id) -> Self {
        AddSubnetValidatorTx {
            base,
            validator,
            subnet_id,
            subnet_auth: SubnetAuth::new(),
        }
    }

    /// Append a subnet authorization signature slot.
    pub fn add_signature_idx(&mut self, index: u32, address: Address) {
        self.subnet_auth.add_signature_idx(index, address);
    }

    /// Deserialize an add-subnet-validator body (the type id has
    /// already been consumed by the caller).
    pub fn read_from(reader: &mut KdkReader) -> Result<Self, PlatformError> {
        let base = BaseTx::read_from(reader)?;
        let validator = Validator::read_from(reader)?;
        let subnet_id = reader.read_id().map_err(|e| {
            PlatformError::SerializationError(format!("reading subnet id: {}", e))
        })?;
        let subnet_auth = SubnetAuth::read_from(reader)?;
        Ok(AddSubnetValidatorTx {
            base,
            validator,
            subnet_id,
            subnet_auth,
        })
    }

    /// Serialize this add-subnet-validator body (without the type id).
    pub fn write_to(&self, writer: &mut KdkWriter) {
        self.base.write_to(writer);
        self.validator.write_to(writer);
        writer.write_id(&self.subnet_id);
        self.subnet_auth.write_to(writer);
    }
}

fn read_stake_outs(reader: &mut KdkReader) -> Result<Vec<TransferableOutput>, PlatformError> {
    let num_outs = reader.read_u32().map_err(|e| {
        PlatformError::SerializationError(format!("reading staked output count: {}", e))
    })?;
    let mut stake_outs = Vec::with_capacity(num_outs as usize);
    for _ in 0..num_outs {
        stake_outs.push(TransferableOutput::read_from(reader)?);
    }
    Ok(stake_outs)
}

fn write_stake_outs(stake_outs: &[TransferableOutput], writer: &mut KdkWriter) {
    writer.write_u32(stake_outs.len() as u32);
    for out in stake_outs {
        out.write_to(writer);
    }
}
