//! Transaction builders: one method per transaction kind.
//!
//! Each builder computes the per-asset requirements (amount plus fee,
//! possibly in two assets), runs minimum-spendable selection over the
//! set, and assembles the transaction body.  Selection failures
//! propagate unchanged; no builder downgrades an
//! [`PlatformError::InsufficientFunds`].

use kodiak_primitives::ids::{Address, Id, NodeId};

use crate::assetamount::AssetAmountDestination;
use crate::constants::DELEGATION_FEE_MULTIPLIER;
use crate::inputs::{Input, SecpTransferInput, TransferableInput};
use crate::outputs::{Output, OutputOwners, SecpTransferOutput, TransferableOutput};
use crate::tx::UnsignedTx;
use crate::txs::{
    AddNominatorTx, AddSubnetValidatorTx, AddValidatorTx, BaseTx, CreateChainTx, CreateSubnetTx,
    ExportTx, ImportTx, TxBody, Validator,
};
use crate::utxo::{Utxo, UtxoSet};
use crate::PlatformError;

/// Reject staking periods that start before `as_of` or end no later
/// than they start.
fn check_staking_times(start_time: u64, end_time: u64, as_of: u64) -> Result<(), PlatformError> {
    if start_time < as_of {
        return Err(PlatformError::TimeError(
            "staking start time is in the past".to_string(),
        ));
    }
    if end_time <= start_time {
        return Err(PlatformError::TimeError(
            "staking end time must come after its start time".to_string(),
        ));
    }
    Ok(())
}

impl UtxoSet {
    /// Select inputs covering just a fee, with change returned to
    /// `change_addresses`.  Returns no inputs or outputs for a zero
    /// fee.
    fn spend_fee(
        &self,
        from_addresses: &[Address],
        change_addresses: &[Address],
        fee: u64,
        fee_asset_id: Id,
        as_of: u64,
    ) -> Result<(Vec<TransferableInput>, Vec<TransferableOutput>), PlatformError> {
        if fee == 0 {
            return Ok((Vec::new(), Vec::new()));
        }
        let mut aad = AssetAmountDestination::new(
            from_addresses.to_vec(),
            from_addresses.to_vec(),
            change_addresses.to_vec(),
        );
        aad.add_asset_amount(fee_asset_id, 0, fee);
        self.get_minimum_spendable(&mut aad, as_of, 0, 1, false)?;
        let (ins, mut outs, change) = aad.into_parts();
        outs.extend(change);
        Ok((ins, outs))
    }

    /// Stakeable selection shared by the validator and nominator
    /// builders.  Returns (inputs, change outputs, stake outputs).
    #[allow(clippy::too_many_arguments)]
    fn select_stake(
        &self,
        to_addresses: Vec<Address>,
        from_addresses: Vec<Address>,
        change_addresses: Vec<Address>,
        stake_amount: u64,
        stake_asset_id: Id,
        fee: u64,
        fee_asset_id: Id,
        as_of: u64,
    ) -> Result<
        (
            Vec<TransferableInput>,
            Vec<TransferableOutput>,
            Vec<TransferableOutput>,
        ),
        PlatformError,
    > {
        let mut aad = AssetAmountDestination::new(to_addresses, from_addresses, change_addresses);
        if stake_asset_id == fee_asset_id {
            aad.add_asset_amount(stake_asset_id, stake_amount, fee);
        } else {
            aad.add_asset_amount(stake_asset_id, stake_amount, 0);
            if fee > 0 {
                aad.add_asset_amount(fee_asset_id, 0, fee);
            }
        }
        self.get_minimum_spendable(&mut aad, as_of, 0, 1, true)?;
        let (ins, stake_outs, change) = aad.into_parts();
        Ok((ins, change, stake_outs))
    }

    /// Build a plain value-transfer transaction.
    ///
    /// Selects enough of `asset_id` to send `amount` to the
    /// destination addresses plus `fee` in `fee_asset_id`, returning
    /// leftovers to the change addresses.  When the fee asset is the
    /// transferred asset (or `None`), the two requirements merge into
    /// a single ledger entry.
    ///
    /// # Arguments
    /// * `network_id` - The target network.
    /// * `blockchain_id` - The target chain.
    /// * `amount` - Units of `asset_id` the destinations receive.
    /// * `asset_id` - The transferred asset.
    /// * `to_addresses` - Who receives the amount.
    /// * `from_addresses` - Whose UTXOs may be consumed.
    /// * `change_addresses` - Who receives leftovers; the destination
    ///   addresses when empty.
    /// * `fee` - Units burned as the transaction fee.
    /// * `fee_asset_id` - The asset the fee is paid in; `asset_id`
    ///   when `None`.
    /// * `memo` - Arbitrary bytes carried with the transaction.
    /// * `as_of` - The Unix time the spend happens at.
    /// * `locktime` - Locktime applied to the destination outputs.
    /// * `threshold` - Signature threshold of the destination outputs.
    ///
    /// # Returns
    /// The unsigned transaction, or `Ok(None)` for a zero amount.
    /// Fails with [`PlatformError::ThresholdError`] if `threshold`
    /// exceeds the destination address count, or with
    /// [`PlatformError::InsufficientFunds`] if the set cannot cover
    /// the requirements.
    #[allow(clippy::too_many_arguments)]
    pub fn build_base_tx(
        &self,
        network_id: u32,
        blockchain_id: Id,
        amount: u64,
        asset_id: Id,
        to_addresses: Vec<Address>,
        from_addresses: Vec<Address>,
        change_addresses: Vec<Address>,
        fee: u64,
        fee_asset_id: Option<Id>,
        memo: Vec<u8>,
        as_of: u64,
        locktime: u64,
        threshold: u32,
    ) -> Result<Option<UnsignedTx>, PlatformError> {
        if threshold as usize > to_addresses.len() {
            return Err(PlatformError::ThresholdError(
                "threshold is greater than the number of destination addresses".to_string(),
            ));
        }
        if amount == 0 {
            return Ok(None);
        }
        let change_addresses = if change_addresses.is_empty() {
            to_addresses.clone()
        } else {
            change_addresses
        };
        let fee_asset_id = fee_asset_id.unwrap_or(asset_id);

        let mut aad = AssetAmountDestination::new(to_addresses, from_addresses, change_addresses);
        if asset_id == fee_asset_id {
            aad.add_asset_amount(asset_id, amount, fee);
        } else {
            aad.add_asset_amount(asset_id, amount, 0);
            if fee > 0 {
                aad.add_asset_amount(fee_asset_id, 0, fee);
            }
        }

        self.get_minimum_spendable(&mut aad, as_of, locktime, threshold, false)?;
        let (ins, mut outs, change) = aad.into_parts();
        outs.extend(change);

        let base = BaseTx::new(network_id, blockchain_id, outs, ins, memo);
        Ok(Some(UnsignedTx::new(TxBody::Base(base))))
    }

    /// Build a transaction claiming UTXOs exported from another
    /// chain.
    ///
    /// The atomic UTXOs are consumed directly; no selection happens
    /// for them.  As much of each imported UTXO's value as possible is
    /// applied toward the fee, and the non-fee remainder becomes one
    /// output per imported UTXO for the destination addresses.  Only a
    /// fee shortfall triggers selection from this set.
    ///
    /// # Arguments
    /// * `atomic_utxos` - The UTXOs held in this chain's atomic
    ///   memory, as fetched from the source chain.
    /// * `source_chain` - The chain the UTXOs were exported from.
    ///
    /// Remaining arguments as in [`UtxoSet::build_base_tx`].
    ///
    /// # Returns
    /// The unsigned transaction.  Fails with
    /// [`PlatformError::ThresholdError`] if `threshold` exceeds the
    /// destination address count, with [`PlatformError::InvalidUtxo`]
    /// if an imported UTXO carries no amount, or with
    /// [`PlatformError::AddressError`] if one cannot be spent by its
    /// own owners at `as_of`.
    #[allow(clippy::too_many_arguments)]
    pub fn build_import_tx(
        &self,
        network_id: u32,
        blockchain_id: Id,
        to_addresses: Vec<Address>,
        from_addresses: Vec<Address>,
        change_addresses: Vec<Address>,
        atomic_utxos: &[Utxo],
        source_chain: Id,
        fee: u64,
        fee_asset_id: Id,
        memo: Vec<u8>,
        as_of: u64,
        locktime: u64,
        threshold: u32,
    ) -> Result<UnsignedTx, PlatformError> {
        if threshold as usize > to_addresses.len() {
            return Err(PlatformError::ThresholdError(
                "threshold is greater than the number of destination addresses".to_string(),
            ));
        }
        let mut ins: Vec<TransferableInput> = Vec::new();
        let mut outs: Vec<TransferableOutput> = Vec::new();
        let mut import_ins: Vec<TransferableInput> = Vec::new();
        let mut fee_paid: u64 = 0;

        for utxo in atomic_utxos {
            let amount = utxo.output.amount().ok_or_else(|| {
                PlatformError::InvalidUtxo(format!(
                    "imported utxo {} has no amount",
                    utxo.utxo_id()
                ))
            })?;
            let owners = utxo.output.owners();
            if !owners.meets_threshold(&owners.addresses, as_of) {
                return Err(PlatformError::AddressError(format!(
                    "imported utxo {} cannot be spent by its owners at {}",
                    utxo.utxo_id(),
                    as_of
                )));
            }

            // Apply as much of the imported value as possible toward
            // the fee before touching the local set.
            let mut leftover = amount;
            if fee > 0 && fee_paid < fee && utxo.asset_id == fee_asset_id {
                fee_paid = fee_paid.saturating_add(leftover);
                if fee_paid >= fee {
                    leftover = fee_paid - fee;
                    fee_paid = fee;
                } else {
                    leftover = 0;
                }
            }

            let mut input = SecpTransferInput::new(amount);
            for (idx, address) in owners.spenders(&owners.addresses, as_of) {
                input.add_signature_idx(idx, address);
            }
            import_ins.push(TransferableInput::new(
                utxo.tx_id,
                utxo.output_idx,
                utxo.asset_id,
                Input::SecpTransfer(input),
            ));

            if leftover > 0 {
                let spend_owners = OutputOwners::new(locktime, threshold, to_addresses.clone());
                outs.push(TransferableOutput::new(
                    utxo.asset_id,
                    Output::SecpTransfer(SecpTransferOutput::new(leftover, spend_owners)),
                ));
            }
        }

        // Any fee shortfall is covered from the local set.
        let fee_remaining = fee.saturating_sub(fee_paid);
        if fee_remaining > 0 {
            let mut aad =
                AssetAmountDestination::new(to_addresses, from_addresses, change_addresses);
            aad.add_asset_amount(fee_asset_id, 0, fee_remaining);
            self.get_minimum_spendable(&mut aad, as_of, locktime, threshold, false)?;
            let (fee_ins, fee_outs, fee_change) = aad.into_parts();
            ins = fee_ins;
            outs.extend(fee_outs);
            outs.extend(fee_change);
        }

        let base = BaseTx::new(network_id, blockchain_id, outs, ins, memo);
        let import = ImportTx::new(base, source_chain, import_ins);
        Ok(UnsignedTx::new(TxBody::Import(import)))
    }

    /// Build a transaction moving funds into another chain's atomic
    /// memory.
    ///
    /// Selects funds exactly like a base transfer, but the destination
    /// outputs leave the chain as exported outputs while change stays
    /// behind.  The fee must be paid in the exported asset.
    ///
    /// # Arguments
    /// * `destination_chain` - The chain whose atomic memory receives
    ///   the exported outputs.
    ///
    /// Remaining arguments as in [`UtxoSet::build_base_tx`].
    ///
    /// # Returns
    /// The unsigned transaction, or `Ok(None)` for a zero amount.
    /// Fails with [`PlatformError::ThresholdError`] if `threshold`
    /// exceeds the destination address count, or with
    /// [`PlatformError::FeeAssetError`] if `fee_asset_id` names a
    /// different asset than `asset_id`.
    #[allow(clippy::too_many_arguments)]
    pub fn build_export_tx(
        &self,
        network_id: u32,
        blockchain_id: Id,
        amount: u64,
        asset_id: Id,
        to_addresses: Vec<Address>,
        from_addresses: Vec<Address>,
        change_addresses: Vec<Address>,
        destination_chain: Id,
        fee: u64,
        fee_asset_id: Option<Id>,
        memo: Vec<u8>,
        as_of: u64,
        locktime: u64,
        threshold: u32,
    ) -> Result<Option<UnsignedTx>, PlatformError> {
        if threshold as usize > to_addresses.len() {
            return Err(PlatformError::ThresholdError(
                "threshold is greater than the number of destination addresses".to_string(),
            ));
        }
        if amount == 0 {
            return Ok(None);
        }
        let change_addresses = if change_addresses.is_empty() {
            to_addresses.clone()
        } else {
            change_addresses
        };
        let fee_asset_id = fee_asset_id.unwrap_or(asset_id);
        if fee_asset_id != asset_id {
            return Err(PlatformError::FeeAssetError(
                "export fees must be paid in the exported asset".to_string(),
            ));
        }

        let mut aad = AssetAmountDestination::new(to_addresses, from_addresses, change_addresses);
        aad.add_asset_amount(asset_id, amount, fee);
        self.get_minimum_spendable(&mut aad, as_of, locktime, threshold, false)?;
        let (ins, export_outs, outs) = aad.into_parts();

        let base = BaseTx::new(network_id, blockchain_id, outs, ins, memo);
        let export = ExportTx::new(base, destination_chain, export_outs);
        Ok(Some(UnsignedTx::new(TxBody::Export(export))))
    }

    /// Build a transaction registering a primary network validator.
    ///
    /// Runs stakeable selection: outputs under an active stakeable
    /// lock are consumed first and re-emitted under the same lock as
    /// staked outputs, then unlocked funds make up the difference.
    /// The staked amount becomes the validator's weight.
    ///
    /// # Arguments
    /// * `to_addresses` - Who owns the staked outputs.
    /// * `node_id` - The staking node.
    /// * `start_time`/`end_time` - The staking period, in Unix time.
    /// * `stake_amount` - Units of `stake_asset_id` to stake.
    /// * `reward_locktime`/`reward_threshold`/`reward_addresses` -
    ///   The owner block receiving the stake back and any reward.
    /// * `delegation_fee` - Percentage of nominator rewards this
    ///   validator keeps, in `[0, 100]`.
    /// * `min_stake` - The network's minimum stake.
    ///
    /// Remaining arguments as in [`UtxoSet::build_base_tx`].
    ///
    /// # Returns
    /// The unsigned transaction.  Fails with
    /// [`PlatformError::TimeError`] for a malformed staking period,
    /// [`PlatformError::StakeError`] for a stake below `min_stake`,
    /// [`PlatformError::DelegationFeeError`] for a fee outside
    /// `[0, 100]`, or [`PlatformError::ThresholdError`] if
    /// `reward_threshold` exceeds the reward address count.
    #[allow(clippy::too_many_arguments)]
    pub fn build_add_validator_tx(
        &self,
        network_id: u32,
        blockchain_id: Id,
        to_addresses: Vec<Address>,
        from_addresses: Vec<Address>,
        change_addresses: Vec<Address>,
        node_id: NodeId,
        start_time: u64,
        end_time: u64,
        stake_amount: u64,
        stake_asset_id: Id,
        reward_locktime: u64,
        reward_threshold: u32,
        reward_addresses: Vec<Address>,
        delegation_fee: f64,
        min_stake: u64,
        fee: u64,
        fee_asset_id: Id,
        memo: Vec<u8>,
        as_of: u64,
    ) -> Result<UnsignedTx, PlatformError> {
        check_staking_times(start_time, end_time, as_of)?;
        if stake_amount < min_stake {
            return Err(PlatformError::StakeError(format!(
                "stake amount {} is below the network minimum of {}",
                stake_amount, min_stake
            )));
        }
        if !(0.0..=100.0).contains(&delegation_fee) {
            return Err(PlatformError::DelegationFeeError(format!(
                "delegation fee {} is not a percentage between 0 and 100",
                delegation_fee
            )));
        }
        if reward_threshold as usize > reward_addresses.len() {
            return Err(PlatformError::ThresholdError(
                "reward threshold is greater than the number of reward addresses".to_string(),
            ));
        }
        let shares = (delegation_fee * f64::from(DELEGATION_FEE_MULTIPLIER)).round() as u32;

        let (ins, outs, stake_outs) = self.select_stake(
            to_addresses,
            from_addresses,
            change_addresses,
            stake_amount,
            stake_asset_id,
            fee,
            fee_asset_id,
            as_of,
        )?;

        let base = BaseTx::new(network_id, blockchain_id, outs, ins, memo);
        let validator = Validator::new(node_id, start_time, end_time, stake_amount);
        let rewards_owner = OutputOwners::new(reward_locktime, reward_threshold, reward_addresses);
        let tx = AddValidatorTx::new(base, validator, stake_outs, rewards_owner, shares);
        Ok(UnsignedTx::new(TxBody::AddValidator(tx)))
    }

    /// Build a transaction adding stake to an existing validator.
    ///
    /// Identical to [`UtxoSet::build_add_validator_tx`] except that a
    /// nominator takes no delegation fee.
    #[allow(clippy::too_many_arguments)]
    pub fn build_add_nominator_tx(
        &self,
        network_id: u32,
        blockchain_id: Id,
        to_addresses: Vec<Address>,
        from_addresses: Vec<Address>,
        change_addresses: Vec<Address>,
        node_id: NodeId,
        start_time: u64,
        end_time: u64,
        stake_amount: u64,
        stake_asset_id: Id,
        reward_locktime: u64,
        reward_threshold: u32,
        reward_addresses: Vec<Address>,
        min_stake: u64,
        fee: u64,
        fee_asset_id: Id,
        memo: Vec<u8>,
        as_of: u64,
    ) -> Result<UnsignedTx, PlatformError> {
        check_staking_times(start_time, end_time, as_of)?;
        if stake_amount < min_stake {
            return Err(PlatformError::StakeError(format!(
                "stake amount {} is below the network minimum of {}",
                stake_amount, min_stake
            )));
        }
        if reward_threshold as usize > reward_addresses.len() {
            return Err(PlatformError::ThresholdError(
                "reward threshold is greater than the number of reward addresses".to_string(),
            ));
        }

        let (ins, outs, stake_outs) = self.select_stake(
            to_addresses,
            from_addresses,
            change_addresses,
            stake_amount,
            stake_asset_id,
            fee,
            fee_asset_id,
            as_of,
        )?;

        let base = BaseTx::new(network_id, blockchain_id, outs, ins, memo);
        let validator = Validator::new(node_id, start_time, end_time, stake_amount);
        let rewards_owner = OutputOwners::new(reward_locktime, reward_threshold, reward_addresses);
        let tx = AddNominatorTx::new(base, validator, stake_outs, rewards_owner);
        Ok(UnsignedTx::new(TxBody::AddNominator(tx)))
    }

    /// Build a transaction registering an existing validator as a
    /// subnet validator.
    ///
    /// Spends only the fee.  `weight` is the validator's sampling
    /// weight on the subnet, and `subnet_auth_pairs` lists the
    /// (owner index, address) slots of the subnet authorization, in
    /// ascending index order.
    ///
    /// # Returns
    /// The unsigned transaction, or [`PlatformError::TimeError`] for a
    /// malformed staking period.
    #[allow(clippy::too_many_arguments)]
    pub fn build_add_subnet_validator_tx(
        &self,
        network_id: u32,
        blockchain_id: Id,
        from_addresses: Vec<Address>,
        change_addresses: Vec<Address>,
        node_id: NodeId,
        start_time: u64,
        end_time: u64,
        weight: u64,
        subnet_id: Id,
        subnet_auth_pairs: &[(u32, Address)],
        fee: u64,
        fee_asset_id: Id,
        memo: Vec<u8>,
        as_of: u64,
    ) -> Result<UnsignedTx, PlatformError> {
        check_staking_times(start_time, end_time, as_of)?;
        let (ins, outs) =
            self.spend_fee(&from_addresses, &change_addresses, fee, fee_asset_id, as_of)?;

        let base = BaseTx::new(network_id, blockchain_id, outs, ins, memo);
        let validator = Validator::new(node_id, start_time, end_time, weight);
        let mut tx = AddSubnetValidatorTx::new(base, validator, subnet_id);
        for (index, address) in subnet_auth_pairs {
            tx.add_signature_idx(*index, *address);
        }
        Ok(UnsignedTx::new(TxBody::AddSubnetValidator(tx)))
    }

    /// Build a transaction registering a new subnet.
    ///
    /// Spends only the fee.  The subnet is controlled by the given
    /// owner addresses under `subnet_owner_threshold`, with no
    /// locktime.
    #[allow(clippy::too_many_arguments)]
    pub fn build_create_subnet_tx(
        &self,
        network_id: u32,
        blockchain_id: Id,
        from_addresses: Vec<Address>,
        change_addresses: Vec<Address>,
        subnet_owner_addresses: Vec<Address>,
        subnet_owner_threshold: u32,
        fee: u64,
        fee_asset_id: Id,
        memo: Vec<u8>,
        as_of: u64,
    ) -> Result<UnsignedTx, PlatformError> {
        if subnet_owner_threshold as usize > subnet_owner_addresses.len() {
            return Err(PlatformError::ThresholdError(
                "owner threshold is greater than the number of owner addresses".to_string(),
            ));
        }
        let (ins, outs) =
            self.spend_fee(&from_addresses, &change_addresses, fee, fee_asset_id, as_of)?;

        let base = BaseTx::new(network_id, blockchain_id, outs, ins, memo);
        let owner = OutputOwners::new(0, subnet_owner_threshold, subnet_owner_addresses);
        let tx = CreateSubnetTx::new(base, owner);
        Ok(UnsignedTx::new(TxBody::CreateSubnet(tx)))
    }

    /// Build a transaction creating a new blockchain on a subnet.
    ///
    /// Spends only the fee.  The chain parameters are attached
    /// verbatim; `subnet_auth_pairs` lists the subnet authorization
    /// slots as in [`UtxoSet::build_add_subnet_validator_tx`].
    #[allow(clippy::too_many_arguments)]
    pub fn build_create_chain_tx(
        &self,
        network_id: u32,
        blockchain_id: Id,
        from_addresses: Vec<Address>,
        change_addresses: Vec<Address>,
        subnet_id: Id,
        chain_name: String,
        vm_id: Id,
        fx_ids: Vec<Id>,
        genesis_data: Vec<u8>,
        subnet_auth_pairs: &[(u32, Address)],
        fee: u64,
        fee_asset_id: Id,
        memo: Vec<u8>,
        as_of: u64,
    ) -> Result<UnsignedTx, PlatformError> {
        let (ins, outs) =
            self.spend_fee(&from_addresses, &change_addresses, fee, fee_asset_id, as_of)?;

        let base = BaseTx::new(network_id, blockchain_id, outs, ins, memo);
        let mut tx = CreateChainTx::new(base, subnet_id, chain_name, vm_id, fx_ids, genesis_data);
        for (index, address) in subnet_auth_pairs {
            tx.add_signature_idx(*index, *address);
        }
        Ok(UnsignedTx::new(TxBody::CreateChain(tx)))
    }
}
