//! The unsigned transaction envelope, signing, and the signed
//! transaction.

use kodiak_keychain::KeychainInterface;
use kodiak_primitives::cb58;
use kodiak_primitives::hash::sha256;
use kodiak_primitives::ids::Id;
use kodiak_primitives::wire::{KdkReader, KdkWriter};

use crate::constants::CODEC_VERSION;
use crate::credential::Credential;
use crate::txs::TxBody;
use crate::PlatformError;

/// A transaction body wrapped in the codec envelope, ready to be
/// signed.
///
/// # Wire format
///
/// | Field         | Size         |
/// |---------------|--------------|
/// | codec version | 2 bytes (BE) |
/// | body          | typed body   |
#[derive(Clone, Debug)]
pub struct UnsignedTx {
    /// The typed transaction body.
    pub body: TxBody,
}

impl UnsignedTx {
    /// Wrap a body in the codec envelope.
    pub fn new(body: TxBody) -> Self {
        UnsignedTx { body }
    }

    /// Deserialize an unsigned transaction from a `KdkReader`.
    pub fn read_from(reader: &mut KdkReader) -> Result<Self, PlatformError> {
        let codec_version = reader.read_u16().map_err(|e| {
            PlatformError::SerializationError(format!("reading codec version: {}", e))
        })?;
        if codec_version != CODEC_VERSION {
            return Err(PlatformError::InvalidTransaction(format!(
                "unsupported codec version: {}",
                codec_version
            )));
        }
        let body = TxBody::read_from(reader)?;
        Ok(UnsignedTx { body })
    }

    /// Serialize this unsigned transaction into a `KdkWriter`.
    pub fn write_to(&self, writer: &mut KdkWriter) {
        writer.write_u16(CODEC_VERSION);
        self.body.write_to(writer);
    }

    /// Serialize this unsigned transaction to a byte vector.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = KdkWriter::new();
        self.write_to(&mut writer);
        writer.into_bytes()
    }

    /// Deserialize an unsigned transaction from a byte slice,
    /// rejecting trailing bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PlatformError> {
        let mut reader = KdkReader::new(bytes);
        let unsigned = UnsignedTx::read_from(&mut reader)?;
        if !reader.is_empty() {
            return Err(PlatformError::SerializationError(format!(
                "{} trailing bytes after unsigned tx",
                reader.remaining()
            )));
        }
        Ok(unsigned)
    }

    /// The SHA-256 digest of the serialized unsigned transaction.
    ///
    /// This is the message every credential signature covers.
    pub fn hash(&self) -> [u8; 32] {
        sha256(&self.to_bytes())
    }

    /// Sign this transaction with keys from a keychain.
    ///
    /// Produces one credential per signature slot group, in order:
    /// base inputs, then imported inputs, then the subnet
    /// authorization where those apply.  Every slot's address must be
    /// present in the keychain.
    ///
    /// # Arguments
    /// * `keychain` - The source of signing keys.
    ///
    /// # Returns
    /// The signed transaction, or an error if a required key is
    /// missing or signing fails.
    pub fn sign<K: KeychainInterface>(&self, keychain: &K) -> Result<Tx, PlatformError> {
        let digest = self.hash();
        let mut credentials = Vec::new();
        for source in self.body.signature_sources() {
            let mut credential = Credential::new();
            for sig_idx in source {
                let signature = keychain.sign_digest(&digest, &sig_idx.address)?;
                credential.add_signature(signature);
            }
            credentials.push(credential);
        }
        Ok(Tx {
            unsigned: self.clone(),
            credentials,
        })
    }
}

/// A signed transaction: the unsigned envelope plus its credentials.
///
/// # Wire format
///
/// | Field         | Size              |
/// |---------------|-------------------|
/// | unsigned tx   | codec + typed body|
/// | n credentials | 4 bytes (BE)      |
/// | credentials   | typed credentials |
#[derive(Clone, Debug)]
pub struct Tx {
    /// The signed payload.
    pub unsigned: UnsignedTx,

    /// One credential per signature slot group.
    pub credentials: Vec<Credential>,
}

impl Tx {
    /// Create a signed transaction from parts.
    pub fn new(unsigned: UnsignedTx, credentials: Vec<Credential>) -> Self {
        Tx {
            unsigned,
            credentials,
        }
    }

    /// The transaction id: the SHA-256 of the full signed encoding.
    pub fn id(&self) -> Id {
        Id::new(sha256(&self.to_bytes()))
    }

    /// Serialize this transaction into a `KdkWriter`.
    pub fn write_to(&self, writer: &mut KdkWriter) {
        self.unsigned.write_to(writer);
        writer.write_u32(self.credentials.len() as u32);
        for credential in &self.credentials {
            credential.write_to(writer);
        }
    }

    /// Serialize this transaction to a byte vector.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = KdkWriter::new();
        self.write_to(&mut writer);
        writer.into_bytes()
    }

    /// Deserialize a signed transaction from a byte slice, rejecting
    /// trailing bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PlatformError> {
        let mut reader = KdkReader::new(bytes);
        let unsigned = UnsignedTx::read_from(&mut reader)?;
        let num_credentials = reader.read_u32().map_err(|e| {
            PlatformError::SerializationError(format!("reading credential count: {}", e))
        })?;
        let mut credentials = Vec::with_capacity(num_credentials as usize);
        for _ in 0..num_credentials {
            credentials.push(Credential::read_from(&mut reader)?);
        }
        if !reader.is_empty() {
            return Err(PlatformError::SerializationError(format!(
                "{} trailing bytes after tx",
                reader.remaining()
            )));
        }
        Ok(Tx {
            unsigned,
            credentials,
        })
    }

    /// Serialize this transaction to its CB58 textual form.
    pub fn to_cb58(&self) -> String {
        cb58::encode(&self.to_bytes())
    }

    /// Deserialize a signed transaction from its CB58 textual form.
    pub fn from_cb58(s: &str) -> Result<Self, PlatformError> {
        let bytes = cb58::decode(s)?;
        Tx::from_bytes(&bytes)
    }
}

impl std::fmt::Display for Tx {
    /// Display the transaction as its CB58-encoded serialization.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_cb58())
    }
}
