//! Unspent transaction outputs and the indexed UTXO set.

use std::collections::{BTreeMap, BTreeSet};

use kodiak_primitives::cb58;
use kodiak_primitives::ids::{Address, Id};
use kodiak_primitives::wire::{KdkReader, KdkWriter};

use crate::constants::CODEC_VERSION;
use crate::outputs::Output;
use crate::PlatformError;

/// An unspent transaction output.
///
/// A UTXO names the transaction and output index that produced it, the
/// asset it holds, and the typed output describing its amount and
/// spending conditions.
///
/// # Wire format
///
/// | Field         | Size         |
/// |---------------|--------------|
/// | codec version | 2 bytes (BE) |
/// | tx id         | 32 bytes     |
/// | output idx    | 4 bytes (BE) |
/// | asset id      | 32 bytes     |
/// | output        | typed output |
#[derive(Clone, Debug)]
pub struct Utxo {
    /// The transaction that produced this output.
    pub tx_id: Id,

    /// The index of this output within the producing transaction.
    pub output_idx: u32,

    /// The asset this output holds units of.
    pub asset_id: Id,

    /// The typed output.
    pub output: Output,
}

impl Utxo {
    /// Create a new UTXO.
    pub fn new(tx_id: Id, output_idx: u32, asset_id: Id, output: Output) -> Self {
        Utxo {
            tx_id,
            output_idx,
            asset_id,
            output,
        }
    }

    /// The unique identifier of this UTXO: the CB58 encoding of the
    /// producing tx id concatenated with the big-endian output index.
    pub fn utxo_id(&self) -> String {
        let mut writer = KdkWriter::with_capacity(36);
        writer.write_id(&self.tx_id);
        writer.write_u32(self.output_idx);
        cb58::encode(writer.as_bytes())
    }

    /// Deserialize a UTXO from a `KdkReader`.
    ///
    /// # Returns
    /// `Ok(Utxo)` on success, or a `PlatformError` if the codec
    /// version is unsupported or the data is truncated or malformed.
    pub fn read_from(reader: &mut KdkReader) -> Result<Self, PlatformError> {
        let codec_version = reader.read_u16().map_err(|e| {
            PlatformError::SerializationError(format!("reading codec version: {}", e))
        })?;
        if codec_version != CODEC_VERSION {
            return Err(PlatformError::InvalidUtxo(format!(
                "unsupported codec version: {}",
                codec_version
            )));
        }
        let tx_id = reader.read_id().map_err(|e| {
            PlatformError::SerializationError(format!("reading tx id: {}", e))
        })?;
        let output_idx = reader.read_u32().map_err(|e| {
            PlatformError::SerializationError(format!("reading output index: {}", e))
        })?;
        let asset_id = reader.read_id().map_err(|e| {
            PlatformError::SerializationError(format!("reading asset id: {}", e))
        })?;
        let output = Output::read_from(reader)?;
        Ok(Utxo {
            tx_id,
            output_idx,
            asset_id,
            output,
        })
    }

    /// Serialize this UTXO into a `KdkWriter`.
    pub fn write_to(&self, writer: &mut KdkWriter) {
        writer.write_u16(CODEC_VERSION);
        writer.write_id(&self.tx_id);
        writer.write_u32(self.output_idx);
        writer.write_id(&self.asset_id);
        self.output.write_to(writer);
    }

    /// Serialize this UTXO to a byte vector.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = KdkWriter::new();
        self.write_to(&mut writer);
        writer.into_bytes()
    }

    /// Deserialize a UTXO from a byte slice, rejecting trailing bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PlatformError> {
        let mut reader = KdkReader::new(bytes);
        let utxo = Utxo::read_from(&mut reader)?;
        if !reader.is_empty() {
            return Err(PlatformError::InvalidUtxo(format!(
                "{} trailing bytes after utxo",
                reader.remaining()
            )));
        }
        Ok(utxo)
    }

    /// Serialize this UTXO to its CB58 textual form.
    pub fn to_cb58(&self) -> String {
        cb58::encode(&self.to_bytes())
    }

    /// Deserialize a UTXO from its CB58 textual form.
    pub fn from_cb58(s: &str) -> Result<Self, PlatformError> {
        let bytes = cb58::decode(s)
            .map_err(|e| PlatformError::InvalidUtxo(format!("decoding utxo string: {}", e)))?;
        Utxo::from_bytes(&bytes)
    }
}

/// How [`UtxoSet::merge_by_rule`] combines two sets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MergeRule {
    /// Every UTXO from either set.
    Union,
    /// Only UTXOs present in both sets.
    Intersection,
    /// UTXOs present in `self` but not in the other set.
    DifferenceSelf,
    /// UTXOs present in the other set but not in `self`.
    DifferenceNew,
    /// UTXOs present in exactly one of the two sets.
    SymDifference,
    /// The union with every UTXO of the other set removed.
    UnionMinusNew,
    /// The union with every UTXO of `self` removed.
    UnionMinusSelf,
}

/// A set of UTXOs indexed by UTXO id and by owner address.
///
/// The address index records, for every address appearing in an
/// output's owner list, the UTXO ids it can (eventually) spend along
/// with the output's locktime.  Both indexes are ordered maps, so
/// iteration order is deterministic.
#[derive(Clone, Debug, Default)]
pub struct UtxoSet {
    utxos: BTreeMap<String, Utxo>,
    address_index: BTreeMap<Address, BTreeMap<String, u64>>,
}

impl UtxoSet {
    /// Create an empty UTXO set.
    pub fn new() -> Self {
        UtxoSet::default()
    }

    /// Number of UTXOs in the set.
    pub fn len(&self) -> usize {
        self.utxos.len()
    }

    /// Whether the set holds no UTXOs.
    pub fn is_empty(&self) -> bool {
        self.utxos.is_empty()
    }

    /// Add a UTXO to the set.
    ///
    /// # Arguments
    /// * `utxo` - The UTXO to add.
    /// * `overwrite` - Whether to replace a UTXO already stored under
    ///   the same id.
    ///
    /// # Returns
    /// `true` if the UTXO was stored, `false` if it was already
    /// present and `overwrite` was false.
    pub fn add(&mut self, utxo: Utxo, overwrite: bool) -> bool {
        let utxo_id = utxo.utxo_id();
        if !overwrite && self.utxos.contains_key(&utxo_id) {
            return false;
        }
        let owners = utxo.output.owners();
        for address in &owners.addresses {
            self.address_index
                .entry(*address)
                .or_default()
                .insert(utxo_id.clone(), owners.locktime);
        }
        self.utxos.insert(utxo_id, utxo);
        true
    }

    /// Add several UTXOs, returning how many were stored.
    pub fn add_array(&mut self, utxos: &[Utxo], overwrite: bool) -> usize {
        utxos
            .iter()
            .filter(|utxo| self.add((*utxo).clone(), overwrite))
            .count()
    }

    /// Remove a UTXO by id, returning it if it was present.
    pub fn remove(&mut self, utxo_id: &str) -> Option<Utxo> {
        let utxo = self.utxos.remove(utxo_id)?;
        for address in &utxo.output.owners().addresses {
            if let Some(entries) = self.address_index.get_mut(address) {
                entries.remove(utxo_id);
                if entries.is_empty() {
                    self.address_index.remove(address);
                }
            }
        }
        Some(utxo)
    }

    /// Remove several UTXOs by id, returning how many were removed.
    pub fn remove_array(&mut self, utxo_ids: &[String]) -> usize {
        utxo_ids
            .iter()
            .filter(|utxo_id| self.remove(utxo_id).is_some())
            .count()
    }

    /// Whether a UTXO with this id is in the set.
    pub fn includes(&self, utxo_id: &str) -> bool {
        self.utxos.contains_key(utxo_id)
    }

    /// Look up a UTXO by id.
    pub fn get_utxo(&self, utxo_id: &str) -> Option<&Utxo> {
        self.utxos.get(utxo_id)
    }

    /// All UTXOs in the set, in UTXO id order.
    pub fn get_all_utxos(&self) -> Vec<&Utxo> {
        self.utxos.values().collect()
    }

    /// All UTXO ids in the set, in order.
    pub fn get_utxo_ids(&self) -> Vec<String> {
        self.utxos.keys().cloned().collect()
    }

    /// The UTXO ids spendable (eventually) by any of `addresses`.
    ///
    /// # Arguments
    /// * `addresses` - The addresses to look up.
    /// * `spendable_at` - If set, only include UTXOs whose owner
    ///   locktime has passed at the given Unix time.
    pub fn get_utxo_ids_for_addresses(
        &self,
        addresses: &[Address],
        spendable_at: Option<u64>,
    ) -> Vec<String> {
        let mut results: BTreeSet<String> = BTreeSet::new();
        for address in addresses {
            if let Some(entries) = self.address_index.get(address) {
                for (utxo_id, locktime) in entries {
                    match spendable_at {
                        Some(as_of) if *locktime > as_of => {}
                        _ => {
                            results.insert(utxo_id.clone());
                        }
                    }
                }
            }
        }
        results.into_iter().collect()
    }

    /// Every address referenced by an output in the set.
    pub fn get_addresses(&self) -> Vec<Address> {
        self.address_index.keys().copied().collect()
    }

    /// Every distinct asset id held by UTXOs in the set.
    pub fn get_asset_ids(&self) -> Vec<Id> {
        let assets: BTreeSet<Id> = self.utxos.values().map(|utxo| utxo.asset_id).collect();
        assets.into_iter().collect()
    }

    /// Total amount of `asset_id` spendable by `addresses` at `as_of`.
    ///
    /// Counts amount-bearing outputs whose signature threshold the
    /// addresses can meet.  Stakeable locktimes are ignored here; they
    /// restrict what the funds may be spent on, not their balance.
    pub fn get_balance(&self, addresses: &[Address], asset_id: &Id, as_of: u64) -> u64 {
        let utxo_ids = self.get_utxo_ids_for_addresses(addresses, None);
        let mut balance: u64 = 0;
        for utxo_id in &utxo_ids {
            if let Some(utxo) = self.utxos.get(utxo_id) {
                if utxo.asset_id != *asset_id {
                    continue;
                }
                if let Some(amount) = utxo.output.amount() {
                    if utxo.output.owners().meets_threshold(addresses, as_of) {
                        balance = balance.saturating_add(amount);
                    }
                }
            }
        }
        balance
    }

    /// Combine this set with another according to a [`MergeRule`].
    ///
    /// Neither operand is modified.  Where both sets hold a UTXO with
    /// the same id, the copy from `self` wins.
    pub fn merge_by_rule(&self, other: &UtxoSet, rule: MergeRule) -> UtxoSet {
        let included = |utxo_id: &str| -> bool {
            let in_self = self.utxos.contains_key(utxo_id);
            let in_other = other.utxos.contains_key(utxo_id);
            match rule {
                MergeRule::Union => true,
                MergeRule::Intersection => in_self && in_other,
                MergeRule::DifferenceSelf | MergeRule::UnionMinusNew => in_self && !in_other,
                MergeRule::DifferenceNew | MergeRule::UnionMinusSelf => !in_self && in_other,
                MergeRule::SymDifference => in_self != in_other,
            }
        };

        let mut result = UtxoSet::new();
        for (utxo_id, utxo) in &self.utxos {
            if included(utxo_id) {
                result.add(utxo.clone(), false);
            }
        }
        for (utxo_id, utxo) in &other.utxos {
            if included(utxo_id) {
                result.add(utxo.clone(), false);
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outputs::{OutputOwners, SecpTransferOutput};
    use kodiak_primitives::ids::{ID_LEN, SHORT_ID_LEN};

    fn addr(byte: u8) -> Address {
        Address::new([byte; SHORT_ID_LEN])
    }

    fn utxo(tx_byte: u8, output_idx: u32, amount: u64, owner: Address) -> Utxo {
        Utxo::new(
            Id::new([tx_byte; ID_LEN]),
            output_idx,
            Id::new([0xaa; ID_LEN]),
            Output::SecpTransfer(SecpTransferOutput::new(
                amount,
                OutputOwners::new(0, 1, vec![owner]),
            )),
        )
    }

    #[test]
    fn test_add_remove_includes() {
        let mut set = UtxoSet::new();
        let u = utxo(1, 0, 100, addr(1));
        let id = u.utxo_id();

        assert!(set.add(u.clone(), false));
        assert!(set.includes(&id));
        assert_eq!(set.len(), 1);

        // Same id again without overwrite is rejected.
        assert!(!set.add(u, false));
        assert_eq!(set.len(), 1);

        let removed = set.remove(&id);
        assert!(removed.is_some());
        assert!(!set.includes(&id));
        assert!(set.is_empty());
        assert!(set.get_addresses().is_empty());
    }

    #[test]
    fn test_add_array_counts_new_only() {
        let mut set = UtxoSet::new();
        let a = utxo(1, 0, 100, addr(1));
        let b = utxo(1, 1, 200, addr(1));
        assert_eq!(set.add_array(&[a.clone(), b.clone()], false), 2);
        assert_eq!(set.add_array(&[a, b, utxo(2, 0, 50, addr(2))], false), 1);
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_address_index_and_balance() {
        let mut set = UtxoSet::new();
        set.add(utxo(1, 0, 100, addr(1)), false);
        set.add(utxo(1, 1, 250, addr(1)), false);
        set.add(utxo(2, 0, 500, addr(2)), false);

        let asset = Id::new([0xaa; ID_LEN]);
        assert_eq!(set.get_balance(&[addr(1)], &asset, 1), 350);
        assert_eq!(set.get_balance(&[addr(2)], &asset, 1), 500);
        assert_eq!(set.get_balance(&[addr(1), addr(2)], &asset, 1), 850);
        assert_eq!(set.get_balance(&[addr(3)], &asset, 1), 0);

        let other_asset = Id::new([0xbb; ID_LEN]);
        assert_eq!(set.get_balance(&[addr(1)], &other_asset, 1), 0);

        assert_eq!(set.get_addresses(), vec![addr(1), addr(2)]);
        assert_eq!(set.get_asset_ids(), vec![asset]);
    }

    #[test]
    fn test_balance_respects_locktime() {
        let mut set = UtxoSet::new();
        let locked = Utxo::new(
            Id::new([3; ID_LEN]),
            0,
            Id::new([0xaa; ID_LEN]),
            Output::SecpTransfer(SecpTransferOutput::new(
                100,
                OutputOwners::new(1000, 1, vec![addr(1)]),
            )),
        );
        set.add(locked, false);

        let asset = Id::new([0xaa; ID_LEN]);
        assert_eq!(set.get_balance(&[addr(1)], &asset, 500), 0);
        assert_eq!(set.get_balance(&[addr(1)], &asset, 1001), 100);
    }

    #[test]
    fn test_utxo_roundtrip() {
        let u = utxo(7, 3, 12345, addr(9));
        let bytes = u.to_bytes();
        let decoded = Utxo::from_bytes(&bytes).unwrap();
        assert_eq!(decoded.to_bytes(), bytes);
        assert_eq!(decoded.utxo_id(), u.utxo_id());

        let restored = Utxo::from_cb58(&u.to_cb58()).unwrap();
        assert_eq!(restored.to_bytes(), bytes);
    }

    #[test]
    fn test_utxo_rejects_bad_codec_version() {
        let mut bytes = utxo(7, 3, 12345, addr(9)).to_bytes();
        bytes[0] = 0;
        bytes[1] = 9;
        assert!(matches!(
            Utxo::from_bytes(&bytes),
            Err(PlatformError::InvalidUtxo(_))
        ));
    }

    #[test]
    fn test_utxo_rejects_trailing_bytes() {
        let mut bytes = utxo(7, 3, 12345, addr(9)).to_bytes();
        bytes.push(0);
        assert!(Utxo::from_bytes(&bytes).is_err());
    }

    #[test]
    fn test_merge_rules() {
        let shared = utxo(1, 0, 100, addr(1));
        let only_self = utxo(2, 0, 200, addr(1));
        let only_other = utxo(3, 0, 300, addr(1));

        let mut left = UtxoSet::new();
        left.add(shared.clone(), false);
        left.add(only_self.clone(), false);

        let mut right = UtxoSet::new();
        right.add(shared.clone(), false);
        right.add(only_other.clone(), false);

        let ids = |set: &UtxoSet| set.get_utxo_ids();

        let union = left.merge_by_rule(&right, MergeRule::Union);
        assert_eq!(union.len(), 3);

        let intersection = left.merge_by_rule(&right, MergeRule::Intersection);
        assert_eq!(ids(&intersection), vec![shared.utxo_id()]);

        let diff_self = left.merge_by_rule(&right, MergeRule::DifferenceSelf);
        assert_eq!(ids(&diff_self), vec![only_self.utxo_id()]);

        let diff_new = left.merge_by_rule(&right, MergeRule::DifferenceNew);
        assert_eq!(ids(&diff_new), vec![only_other.utxo_id()]);

        let sym = left.merge_by_rule(&right, MergeRule::SymDifference);
        let mut expected = vec![only_self.utxo_id(), only_other.utxo_id()];
        expected.sort();
        assert_eq!(ids(&sym), expected);

        let minus_new = left.merge_by_rule(&right, MergeRule::UnionMinusNew);
        assert_eq!(ids(&minus_new), ids(&diff_self));

        let minus_self = left.merge_by_rule(&right, MergeRule::UnionMinusSelf);
        assert_eq!(ids(&minus_self), ids(&diff_new));
    }

    #[test]
    fn test_clone_is_independent() {
        let mut original = UtxoSet::new();
        original.add(utxo(1, 0, 100, addr(1)), false);

        let snapshot = original.clone();
        original.add(utxo(2, 0, 200, addr(2)), false);
        original.remove(&utxo(1, 0, 100, addr(1)).utxo_id());

        assert_eq!(snapshot.len(), 1);
        assert!(snapshot.includes(&utxo(1, 0, 100, addr(1)).utxo_id()));
        assert_eq!(snapshot.get_addresses(), vec![addr(1)]);
    }

    #[test]
    fn test_get_utxo_ids_for_addresses_spendable_filter() {
        let mut set = UtxoSet::new();
        let unlocked = utxo(1, 0, 100, addr(1));
        let locked = Utxo::new(
            Id::new([2; ID_LEN]),
            0,
            Id::new([0xaa; ID_LEN]),
            Output::SecpTransfer(SecpTransferOutput::new(
                100,
                OutputOwners::new(5000, 1, vec![addr(1)]),
            )),
        );
        set.add(unlocked.clone(), false);
        set.add(locked.clone(), false);

        let all = set.get_utxo_ids_for_addresses(&[addr(1)], None);
        assert_eq!(all.len(), 2);

        let now = set.get_utxo_ids_for_addresses(&[addr(1)], Some(100));
        assert_eq!(now, vec![unlocked.utxo_id()]);

        let later = set.get_utxo_ids_for_addresses(&[addr(1)], Some(5000));
        assert_eq!(later.len(), 2);
    }
}
