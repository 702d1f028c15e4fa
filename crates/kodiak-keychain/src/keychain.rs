//! A collection of key pairs indexed by payment address.

use std::collections::BTreeMap;

use kodiak_primitives::ids::Address;

use crate::keypair::{KeyPair, SIGNATURE_LEN};
use crate::KeychainError;

/// The signing interface transaction construction works against.
///
/// Anything that can enumerate the addresses it controls and produce a
/// recoverable signature for one of them can act as a keychain.  The
/// concrete [`Keychain`] holds raw key pairs in memory; hardware-backed
/// or remote signers implement the same interface.
pub trait KeychainInterface {
    /// Return every address this keychain can sign for.
    fn addresses(&self) -> Vec<Address>;

    /// Whether this keychain can sign for `address`.
    fn contains(&self, address: &Address) -> bool;

    /// Sign a 32-byte digest with the key for `address`.
    ///
    /// # Arguments
    /// * `digest` - The prehashed message to sign.
    /// * `address` - The address whose key must produce the signature.
    ///
    /// # Returns
    /// A 65-byte recoverable signature, or
    /// [`KeychainError::UnknownAddress`] if the keychain holds no key
    /// for the address.
    fn sign_digest(
        &self,
        digest: &[u8; 32],
        address: &Address,
    ) -> Result<[u8; SIGNATURE_LEN], KeychainError>;
}

/// An in-memory keychain.
///
/// Keys are indexed by address, so lookups during signing are direct
/// and [`Keychain::addresses`] enumerates in a stable order.
#[derive(Default)]
pub struct Keychain {
    keys: BTreeMap<Address, KeyPair>,
}

impl Keychain {
    /// Create an empty keychain.
    pub fn new() -> Self {
        Keychain {
            keys: BTreeMap::new(),
        }
    }

    /// Generate a new random key, add it, and return its address.
    pub fn generate(&mut self) -> Address {
        self.add(KeyPair::generate())
    }

    /// Add a key pair, returning the address it is filed under.
    ///
    /// Adding a key pair for an address already present replaces the
    /// stored key, which is a no-op for a well-formed key pair since
    /// the address commits to the public key.
    pub fn add(&mut self, pair: KeyPair) -> Address {
        let address = pair.address();
        self.keys.insert(address, pair);
        address
    }

    /// Add a key from its `PrivateKey-` CB58 textual form.
    pub fn import_cb58(&mut self, s: &str) -> Result<Address, KeychainError> {
        let pair = KeyPair::from_cb58(s)?;
        Ok(self.add(pair))
    }

    /// Look up the key pair for an address.
    pub fn get(&self, address: &Address) -> Option<&KeyPair> {
        self.keys.get(address)
    }

    /// The textual form of every address this keychain can sign for.
    pub fn address_strings(&self) -> Vec<String> {
        self.keys.keys().map(|address| address.to_string()).collect()
    }

    /// Combine this keychain with another into a new keychain holding
    /// both key sets.  Neither operand is modified.
    pub fn union(&self, other: &Keychain) -> Keychain {
        let mut merged = Keychain::new();
        for pair in self.keys.values().chain(other.keys.values()) {
            merged.add(pair.clone());
        }
        merged
    }

    /// Number of keys held.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the keychain holds no keys.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl KeychainInterface for Keychain {
    fn addresses(&self) -> Vec<Address> {
        self.keys.keys().copied().collect()
    }

    fn contains(&self, address: &Address) -> bool {
        self.keys.contains_key(address)
    }

    fn sign_digest(
        &self,
        digest: &[u8; 32],
        address: &Address,
    ) -> Result<[u8; SIGNATURE_LEN], KeychainError> {
        let pair = self
            .keys
            .get(address)
            .ok_or_else(|| KeychainError::UnknownAddress(address.to_string()))?;
        pair.sign_digest(digest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keypair::recover_address;
    use kodiak_primitives::hash::sha256;

    #[test]
    fn test_add_and_lookup() {
        let mut keychain = Keychain::new();
        assert!(keychain.is_empty());

        let pair = KeyPair::from_bytes(&[0x11u8; 32]).unwrap();
        let address = keychain.add(pair);
        assert_eq!(keychain.len(), 1);
        assert!(keychain.contains(&address));
        assert!(keychain.get(&address).is_some());
    }

    #[test]
    fn test_adding_same_key_twice_is_idempotent() {
        let mut keychain = Keychain::new();
        let a = keychain.add(KeyPair::from_bytes(&[0x11u8; 32]).unwrap());
        let b = keychain.add(KeyPair::from_bytes(&[0x11u8; 32]).unwrap());
        assert_eq!(a, b);
        assert_eq!(keychain.len(), 1);
    }

    #[test]
    fn test_addresses_are_sorted() {
        let mut keychain = Keychain::new();
        keychain.add(KeyPair::from_bytes(&[0x11u8; 32]).unwrap());
        keychain.add(KeyPair::from_bytes(&[0x22u8; 32]).unwrap());
        keychain.add(KeyPair::from_bytes(&[0x33u8; 32]).unwrap());

        let addresses = keychain.addresses();
        assert_eq!(addresses.len(), 3);
        let mut sorted = addresses.clone();
        sorted.sort();
        assert_eq!(addresses, sorted);
    }

    #[test]
    fn test_sign_digest_via_interface() {
        let mut keychain = Keychain::new();
        let address = keychain.add(KeyPair::from_bytes(&[0x11u8; 32]).unwrap());
        let digest = sha256(b"payload");

        let sig = keychain.sign_digest(&digest, &address).unwrap();
        assert_eq!(recover_address(&digest, &sig).unwrap(), address);
    }

    #[test]
    fn test_sign_digest_unknown_address() {
        let keychain = Keychain::new();
        let digest = sha256(b"payload");
        let stranger = KeyPair::from_bytes(&[0x99u8; 32]).unwrap().address();

        let result = keychain.sign_digest(&digest, &stranger);
        assert!(matches!(result, Err(KeychainError::UnknownAddress(_))));
    }

    #[test]
    fn test_union_holds_both_key_sets() {
        let mut left = Keychain::new();
        let a = left.add(KeyPair::from_bytes(&[0x11u8; 32]).unwrap());
        let mut right = Keychain::new();
        let b = right.add(KeyPair::from_bytes(&[0x22u8; 32]).unwrap());

        let merged = left.union(&right);
        assert_eq!(merged.len(), 2);
        assert!(merged.contains(&a));
        assert!(merged.contains(&b));
        assert_eq!(left.len(), 1, "operands are untouched");
        assert_eq!(right.len(), 1, "operands are untouched");
    }

    #[test]
    fn test_address_strings_match_addresses() {
        let mut keychain = Keychain::new();
        keychain.add(KeyPair::from_bytes(&[0x11u8; 32]).unwrap());
        keychain.add(KeyPair::from_bytes(&[0x22u8; 32]).unwrap());

        let strings = keychain.address_strings();
        let addresses = keychain.addresses();
        assert_eq!(strings.len(), addresses.len());
        for (s, address) in strings.iter().zip(&addresses) {
            assert_eq!(s, &address.to_string());
        }
    }

    #[test]
    fn test_import_cb58() {
        let pair = KeyPair::from_bytes(&[0x2au8; 32]).unwrap();
        let exported = pair.to_cb58();

        let mut keychain = Keychain::new();
        let address = keychain.import_cb58(&exported).unwrap();
        assert_eq!(address, pair.address());
    }
}
