//! Minimum-spendable UTXO selection.
//!
//! Walks a UTXO set and consumes just enough value to satisfy the
//! per-asset requirements of an [`AssetAmountDestination`], producing
//! the transferable inputs, destination outputs, and change outputs a
//! transaction needs.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use kodiak_primitives::ids::Id;

use crate::assetamount::{AssetAmount, AssetAmountDestination};
use crate::inputs::{Input, SecpTransferInput, StakeableLockIn, TransferableInput};
use crate::outputs::{
    Output, OutputOwners, SecpTransferOutput, StakeableLockOut, TransferableOutput,
};
use crate::utxo::{Utxo, UtxoSet};
use crate::PlatformError;

impl UtxoSet {
    /// The UTXOs a spend happening at `as_of` may consume.
    ///
    /// Staking spends may consume anything, including outputs whose
    /// stakeable locktime has not passed.  Other spends may only
    /// consume outputs that are not under an active stakeable lock.
    fn consumable_utxos(&self, as_of: u64, stakeable: bool) -> Vec<&Utxo> {
        self.get_all_utxos()
            .into_iter()
            .filter(|utxo| {
                if stakeable {
                    return true;
                }
                match utxo.output.stakeable_locktime() {
                    Some(stakeable_locktime) => stakeable_locktime <= as_of,
                    None => true,
                }
            })
            .collect()
    }

    /// Consume UTXOs until every requirement in `aad` is met.
    ///
    /// Walks the consumable UTXOs, turning each usable one into a
    /// transferable input until the requested amount plus burn is
    /// covered for every asset, then emits the destination and change
    /// outputs.  For staking spends, outputs under an active stakeable
    /// lock are consumed before unlocked ones (highest stakeable
    /// locktime first), and their value is re-emitted under the same
    /// lock and ownership so the lock is preserved.
    ///
    /// Change goes to the change addresses unlocked (locktime zero,
    /// threshold one), except change from a still-locked output, which
    /// keeps the original lock and owners.  Destination outputs are
    /// created with the provided `locktime` and `threshold`.
    ///
    /// # Arguments
    /// * `aad` - The selection state: address roles and per-asset
    ///   requirements.  Receives the inputs and outputs.
    /// * `as_of` - The Unix time at which spending happens.
    /// * `locktime` - Locktime applied to destination outputs.
    /// * `threshold` - Signature threshold of destination outputs.
    /// * `stakeable` - Whether this selection feeds a staking
    ///   transaction.
    ///
    /// # Returns
    /// `Ok(())` once `aad` holds a complete selection, or
    /// [`PlatformError::InsufficientFunds`] if the set cannot cover
    /// the requirements.
    pub fn get_minimum_spendable(
        &self,
        aad: &mut AssetAmountDestination,
        as_of: u64,
        locktime: u64,
        threshold: u32,
        stakeable: bool,
    ) -> Result<(), PlatformError> {
        let mut utxo_array = self.consumable_utxos(as_of, stakeable);

        if stakeable {
            // Consume locked outputs first, highest stakeable locktime
            // first, so the longest-locked funds are put to work before
            // any unlocked ones.  The sort is stable, so equal
            // locktimes keep UTXO id order.
            let mut ordered: Vec<&Utxo> = utxo_array
                .iter()
                .copied()
                .filter(|utxo| utxo.output.stakeable_locktime().is_some())
                .collect();
            ordered.sort_by_key(|utxo| Reverse(utxo.output.stakeable_locktime().unwrap_or(0)));
            ordered.extend(utxo_array.iter().copied().filter(|utxo| {
                utxo.output.stakeable_locktime().is_none() && utxo.output.amount().is_some()
            }));
            utxo_array = ordered;
        }

        let senders = aad.senders().to_vec();

        // Still-locked outputs consumed per asset, in consumption
        // order.  They must be re-emitted after selection.
        let mut consumed_locked: BTreeMap<Id, Vec<StakeableLockOut>> = BTreeMap::new();

        for utxo in utxo_array {
            let asset_id = utxo.asset_id;
            let amount = match utxo.output.amount() {
                Some(amount) => amount,
                None => continue,
            };
            match aad.asset_amount(&asset_id) {
                Some(ledger) if !ledger.is_finished() => {}
                _ => continue,
            }
            if !utxo.output.owners().meets_threshold(&senders, as_of) {
                continue;
            }

            let mut base_input = SecpTransferInput::new(amount);
            for (idx, address) in utxo.output.owners().spenders(&senders, as_of) {
                base_input.add_signature_idx(idx, address);
            }

            let mut locked = false;
            let input = match &utxo.output {
                Output::StakeableLock(out) if out.stakeable_locktime > as_of => {
                    locked = true;
                    consumed_locked
                        .entry(asset_id)
                        .or_default()
                        .push(out.clone());
                    Input::StakeableLock(StakeableLockIn::new(out.stakeable_locktime, base_input))
                }
                _ => Input::SecpTransfer(base_input),
            };

            if let Some(ledger) = aad.asset_amount_mut(&asset_id) {
                ledger.spend_amount(amount, locked);
            }

            aad.add_input(TransferableInput::new(
                utxo.tx_id,
                utxo.output_idx,
                asset_id,
                input,
            ));
        }

        if !aad.can_complete() {
            return Err(PlatformError::InsufficientFunds(
                "insufficient funds to create the transaction".to_string(),
            ));
        }

        let destinations = aad.destinations().to_vec();
        let change_addresses = aad.change_addresses().to_vec();
        let amounts: Vec<AssetAmount> = aad.amounts().to_vec();

        for ledger in &amounts {
            let asset_id = ledger.asset_id();
            let change = ledger.change();
            let change_is_locked = ledger.is_stakeable_lock_change();
            let locked_change = if change_is_locked { change } else { 0 };

            // Re-emit every still-locked output that was consumed,
            // preserving its stakeable locktime and ownership.  Only
            // the last one can carry change; earlier ones would not
            // have been consumed unless they were needed in full.
            if let Some(locked_outs) = consumed_locked.get(&asset_id) {
                let last = locked_outs.len() - 1;
                for (i, locked_out) in locked_outs.iter().enumerate() {
                    let owners = locked_out.inner.owners.clone();
                    let mut remaining = locked_out.inner.amount;
                    if i == last && locked_change > 0 {
                        remaining = remaining.saturating_sub(locked_change);
                        aad.add_change(TransferableOutput::new(
                            asset_id,
                            Output::StakeableLock(StakeableLockOut::new(
                                locked_out.stakeable_locktime,
                                SecpTransferOutput::new(locked_change, owners.clone()),
                            )),
                        ));
                    }
                    aad.add_output(TransferableOutput::new(
                        asset_id,
                        Output::StakeableLock(StakeableLockOut::new(
                            locked_out.stakeable_locktime,
                            SecpTransferOutput::new(remaining, owners),
                        )),
                    ));
                }
            }

            let unlocked_change = if change_is_locked { 0 } else { change };
            if unlocked_change > 0 {
                // Change must never be timelocked.
                let owners = OutputOwners::new(0, 1, change_addresses.clone());
                aad.add_change(TransferableOutput::new(
                    asset_id,
                    Output::SecpTransfer(SecpTransferOutput::new(unlocked_change, owners)),
                ));
            }

            let unlocked_spent = ledger.spent().saturating_sub(ledger.stakeable_lock_spent());
            let unlocked_available = unlocked_spent.saturating_sub(ledger.burn());
            let unlocked_amount = unlocked_available.saturating_sub(unlocked_change);
            if unlocked_amount > 0 {
                let owners = OutputOwners::new(locktime, threshold, destinations.clone());
                aad.add_output(TransferableOutput::new(
                    asset_id,
                    Output::SecpTransfer(SecpTransferOutput::new(unlocked_amount, owners)),
                ));
            }
        }

        Ok(())
    }
}
