//! Fixed-width identifiers used across the Kodiak network.
//!
//! Three newtypes cover every identifier the transaction format needs:
//!
//! - [`Id`]: a 32-byte identifier for transactions, assets, chains, and
//!   subnets, rendered as CB58.
//! - [`NodeId`]: a 20-byte staking node identifier, rendered as CB58
//!   with a `NodeID-` prefix.
//! - [`Address`]: a 20-byte payment address (the HASH160 of a
//!   compressed public key), rendered as hex.
//!
//! Ported from the Kodiak JS SDK (`ids` package).

use std::fmt;
use std::str::FromStr;

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::cb58;
use crate::PrimitivesError;

/// Length of an [`Id`] in bytes.
pub const ID_LEN: usize = 32;

/// Length of a [`NodeId`] or [`Address`] in bytes.
pub const SHORT_ID_LEN: usize = 20;

/// String prefix carried by the textual form of a [`NodeId`].
pub const NODE_ID_PREFIX: &str = "NodeID-";

/// A 32-byte identifier for transactions, assets, chains, and subnets.
///
/// The all-zero id is used as a sentinel for "the primary network" in
/// subnet contexts and for "not yet assigned" elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Id([u8; ID_LEN]);

impl Id {
    /// Create an id from a fixed-size byte array.
    pub fn new(bytes: [u8; ID_LEN]) -> Self {
        Id(bytes)
    }

    /// Create an id from a byte slice, checking the length.
    ///
    /// # Arguments
    /// * `bytes` - A slice that must be exactly 32 bytes long.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        if bytes.len() != ID_LEN {
            return Err(PrimitivesError::InvalidIdLength {
                expected: ID_LEN,
                got: bytes.len(),
            });
        }
        let mut id = [0u8; ID_LEN];
        id.copy_from_slice(bytes);
        Ok(Id(id))
    }

    /// Return the raw bytes of the id.
    pub fn as_bytes(&self) -> &[u8; ID_LEN] {
        &self.0
    }

    /// Whether this is the all-zero sentinel id.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; ID_LEN]
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", cb58::encode(&self.0))
    }
}

impl FromStr for Id {
    type Err = PrimitivesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = cb58::decode(s)?;
        Id::from_slice(&bytes)
    }
}

impl Serialize for Id {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Id::from_str(&s).map_err(D::Error::custom)
    }
}

/// A 20-byte staking node identifier.
///
/// Displayed as `NodeID-` followed by the CB58 encoding of the bytes.
/// Parsing accepts the string with or without the prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct NodeId([u8; SHORT_ID_LEN]);

impl NodeId {
    /// Create a node id from a fixed-size byte array.
    pub fn new(bytes: [u8; SHORT_ID_LEN]) -> Self {
        NodeId(bytes)
    }

    /// Create a node id from a byte slice, checking the length.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        if bytes.len() != SHORT_ID_LEN {
            return Err(PrimitivesError::InvalidIdLength {
                expected: SHORT_ID_LEN,
                got: bytes.len(),
            });
        }
        let mut id = [0u8; SHORT_ID_LEN];
        id.copy_from_slice(bytes);
        Ok(NodeId(id))
    }

    /// Return the raw bytes of the node id.
    pub fn as_bytes(&self) -> &[u8; SHORT_ID_LEN] {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", NODE_ID_PREFIX, cb58::encode(&self.0))
    }
}

impl FromStr for NodeId {
    type Err = PrimitivesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let stripped = s.strip_prefix(NODE_ID_PREFIX).unwrap_or(s);
        let bytes = cb58::decode(stripped)
            .map_err(|e| PrimitivesError::InvalidNodeId(e.to_string()))?;
        NodeId::from_slice(&bytes)
    }
}

impl Serialize for NodeId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NodeId::from_str(&s).map_err(D::Error::custom)
    }
}

/// A 20-byte payment address.
///
/// This is the RIPEMD-160 of the SHA-256 of a compressed secp256k1
/// public key.  Addresses order lexicographically by their bytes, which
/// is the order the transaction format requires for owner lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address([u8; SHORT_ID_LEN]);

impl Address {
    /// Create an address from a fixed-size byte array.
    pub fn new(bytes: [u8; SHORT_ID_LEN]) -> Self {
        Address(bytes)
    }

    /// Create an address from a byte slice, checking the length.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        if bytes.len() != SHORT_ID_LEN {
            return Err(PrimitivesError::InvalidIdLength {
                expected: SHORT_ID_LEN,
                got: bytes.len(),
            });
        }
        let mut addr = [0u8; SHORT_ID_LEN];
        addr.copy_from_slice(bytes);
        Ok(Address(addr))
    }

    /// Return the raw bytes of the address.
    pub fn as_bytes(&self) -> &[u8; SHORT_ID_LEN] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = PrimitivesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s)?;
        Address::from_slice(&bytes)
    }
}

impl Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Address::from_str(&s).map_err(D::Error::custom)
    }
}
