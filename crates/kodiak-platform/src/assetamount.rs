//! Per-asset spending ledgers used during UTXO selection.
//!
//! An [`AssetAmount`] tracks one asset through a selection pass: how
//! much must reach the destinations, how much must be burned as fees,
//! how much has been consumed so far, and what is left over as change.
//! An [`AssetAmountDestination`] bundles the ledgers for every asset a
//! transaction touches together with the address roles and the inputs
//! and outputs accumulated so far.

use std::collections::BTreeMap;

use kodiak_primitives::ids::{Address, Id};

use crate::inputs::TransferableInput;
use crate::outputs::TransferableOutput;

/// The spending ledger for a single asset.
#[derive(Clone, Debug)]
pub struct AssetAmount {
    asset_id: Id,
    amount: u64,
    burn: u64,
    spent: u64,
    stakeable_lock_spent: u64,
    change: u64,
    stakeable_lock_change: bool,
    finished: bool,
}

impl AssetAmount {
    /// Create a ledger requiring `amount` units for the destinations
    /// plus `burn` units destroyed as fees.
    pub fn new(asset_id: Id, amount: u64, burn: u64) -> Self {
        AssetAmount {
            asset_id,
            amount,
            burn,
            spent: 0,
            stakeable_lock_spent: 0,
            change: 0,
            stakeable_lock_change: false,
            finished: false,
        }
    }

    /// The asset this ledger tracks.
    pub fn asset_id(&self) -> Id {
        self.asset_id
    }

    /// Units that must reach the destinations.
    pub fn amount(&self) -> u64 {
        self.amount
    }

    /// Units that must be burned.
    pub fn burn(&self) -> u64 {
        self.burn
    }

    /// Units consumed so far.
    pub fn spent(&self) -> u64 {
        self.spent
    }

    /// Units consumed from still-locked stakeable outputs.
    pub fn stakeable_lock_spent(&self) -> u64 {
        self.stakeable_lock_spent
    }

    /// Units left over once the requirement was met.
    pub fn change(&self) -> u64 {
        self.change
    }

    /// Whether the spend that met the requirement consumed locked
    /// funds, in which case the change must stay locked.
    pub fn is_stakeable_lock_change(&self) -> bool {
        self.stakeable_lock_change
    }

    /// Whether enough has been consumed to cover amount plus burn.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Record the consumption of `amount` units.
    ///
    /// Once the running total reaches the requirement, the ledger is
    /// finished: the surplus is recorded as change, and the change is
    /// marked locked if this finishing spend was locked.  Callers must
    /// not spend into a finished ledger.
    ///
    /// # Arguments
    /// * `amount` - Units consumed from one UTXO.
    /// * `locked` - Whether the consumed UTXO was under an active
    ///   stakeable lock.
    ///
    /// # Returns
    /// `true` once the ledger is finished.
    pub fn spend_amount(&mut self, amount: u64, locked: bool) -> bool {
        debug_assert!(!self.finished, "spend_amount on a finished ledger");
        if locked {
            self.stakeable_lock_spent = self.stakeable_lock_spent.saturating_add(amount);
        }
        self.spent = self.spent.saturating_add(amount);
        let total = self.amount.saturating_add(self.burn);
        if self.spent >= total {
            self.change = self.spent - total;
            if locked {
                self.stakeable_lock_change = true;
            }
            self.finished = true;
        }
        self.finished
    }
}

/// The working state of one UTXO selection pass.
///
/// Holds the address roles (destinations, senders, change), one
/// [`AssetAmount`] ledger per asset, and the transferable inputs and
/// outputs accumulated while walking the UTXO set.  Destination
/// outputs and change outputs are kept separate because staking
/// transactions place them in different transaction fields.
#[derive(Debug, Default)]
pub struct AssetAmountDestination {
    destinations: Vec<Address>,
    senders: Vec<Address>,
    change_addresses: Vec<Address>,
    amounts: Vec<AssetAmount>,
    amount_index: BTreeMap<Id, usize>,
    inputs: Vec<TransferableInput>,
    outputs: Vec<TransferableOutput>,
    change: Vec<TransferableOutput>,
}

impl AssetAmountDestination {
    /// Create a selection state with the given address roles.
    ///
    /// # Arguments
    /// * `destinations` - Addresses the requested amounts are sent to.
    /// * `senders` - Addresses whose UTXOs may be consumed.
    /// * `change_addresses` - Addresses leftover funds return to.
    pub fn new(
        destinations: Vec<Address>,
        senders: Vec<Address>,
        change_addresses: Vec<Address>,
    ) -> Self {
        AssetAmountDestination {
            destinations,
            senders,
            change_addresses,
            ..AssetAmountDestination::default()
        }
    }

    /// Add a requirement ledger for an asset.
    ///
    /// Each asset may appear at most once per selection pass.
    pub fn add_asset_amount(&mut self, asset_id: Id, amount: u64, burn: u64) {
        debug_assert!(
            !self.amount_index.contains_key(&asset_id),
            "asset added to a selection pass twice"
        );
        self.amount_index.insert(asset_id, self.amounts.len());
        self.amounts.push(AssetAmount::new(asset_id, amount, burn));
    }

    /// The destination addresses.
    pub fn destinations(&self) -> &[Address] {
        &self.destinations
    }

    /// The sender addresses.
    pub fn senders(&self) -> &[Address] {
        &self.senders
    }

    /// The change addresses.
    pub fn change_addresses(&self) -> &[Address] {
        &self.change_addresses
    }

    /// Whether a ledger exists for `asset_id`.
    pub fn asset_exists(&self, asset_id: &Id) -> bool {
        self.amount_index.contains_key(asset_id)
    }

    /// The ledger for `asset_id`, if one was added.
    pub fn asset_amount(&self, asset_id: &Id) -> Option<&AssetAmount> {
        self.amount_index
            .get(asset_id)
            .map(|idx| &self.amounts[*idx])
    }

    /// Mutable access to the ledger for `asset_id`.
    pub fn asset_amount_mut(&mut self, asset_id: &Id) -> Option<&mut AssetAmount> {
        let idx = *self.amount_index.get(asset_id)?;
        Some(&mut self.amounts[idx])
    }

    /// All ledgers, in the order their assets were added.
    pub fn amounts(&self) -> &[AssetAmount] {
        &self.amounts
    }

    /// Whether every ledger has met its requirement.
    pub fn can_complete(&self) -> bool {
        self.amounts.iter().all(AssetAmount::is_finished)
    }

    /// Record a consumed UTXO.
    pub fn add_input(&mut self, input: TransferableInput) {
        self.inputs.push(input);
    }

    /// Record a destination output.
    pub fn add_output(&mut self, output: TransferableOutput) {
        self.outputs.push(output);
    }

    /// Record a change output.
    pub fn add_change(&mut self, output: TransferableOutput) {
        self.change.push(output);
    }

    /// The inputs accumulated so far.
    pub fn inputs(&self) -> &[TransferableInput] {
        &self.inputs
    }

    /// The destination outputs accumulated so far.
    pub fn outputs(&self) -> &[TransferableOutput] {
        &self.outputs
    }

    /// The change outputs accumulated so far.
    pub fn change_outputs(&self) -> &[TransferableOutput] {
        &self.change
    }

    /// Consume the state, yielding (inputs, destination outputs,
    /// change outputs).
    pub fn into_parts(
        self,
    ) -> (
        Vec<TransferableInput>,
        Vec<TransferableOutput>,
        Vec<TransferableOutput>,
    ) {
        (self.inputs, self.outputs, self.change)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kodiak_primitives::ids::ID_LEN;

    fn asset(byte: u8) -> Id {
        Id::new([byte; ID_LEN])
    }

    #[test]
    fn test_spend_amount_accumulates_until_finished() {
        let mut ledger = AssetAmount::new(asset(1), 400, 100);
        assert!(!ledger.spend_amount(200, false));
        assert!(!ledger.is_finished());
        assert_eq!(ledger.spent(), 200);

        assert!(ledger.spend_amount(350, false));
        assert!(ledger.is_finished());
        assert_eq!(ledger.spent(), 550);
        assert_eq!(ledger.change(), 50);
        assert!(!ledger.is_stakeable_lock_change());
    }

    #[test]
    fn test_exact_spend_leaves_no_change() {
        let mut ledger = AssetAmount::new(asset(1), 400, 100);
        assert!(ledger.spend_amount(500, false));
        assert_eq!(ledger.change(), 0);
    }

    #[test]
    fn test_locked_finishing_spend_marks_change_locked() {
        let mut ledger = AssetAmount::new(asset(1), 500, 0);
        assert!(!ledger.spend_amount(200, false));
        assert!(ledger.spend_amount(400, true));
        assert_eq!(ledger.change(), 100);
        assert!(ledger.is_stakeable_lock_change());
        assert_eq!(ledger.stakeable_lock_spent(), 400);
    }

    #[test]
    fn test_unlocked_finishing_spend_keeps_change_unlocked() {
        let mut ledger = AssetAmount::new(asset(1), 500, 0);
        assert!(!ledger.spend_amount(400, true));
        assert!(ledger.spend_amount(200, false));
        assert_eq!(ledger.change(), 100);
        assert!(!ledger.is_stakeable_lock_change());
    }

    #[test]
    fn test_destination_tracks_completion_per_asset() {
        let mut aad = AssetAmountDestination::new(vec![], vec![], vec![]);
        aad.add_asset_amount(asset(1), 100, 0);
        aad.add_asset_amount(asset(2), 0, 50);
        assert!(aad.asset_exists(&asset(1)));
        assert!(!aad.asset_exists(&asset(3)));
        assert!(!aad.can_complete());

        aad.asset_amount_mut(&asset(1)).unwrap().spend_amount(100, false);
        assert!(!aad.can_complete());

        aad.asset_amount_mut(&asset(2)).unwrap().spend_amount(80, false);
        assert!(aad.can_complete());
        assert_eq!(aad.asset_amount(&asset(2)).unwrap().change(), 30);
    }

    #[test]
    fn test_empty_destination_can_complete() {
        let aad = AssetAmountDestination::new(vec![], vec![], vec![]);
        assert!(aad.can_complete());
    }
}
