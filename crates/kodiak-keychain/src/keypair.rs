//! secp256k1 key pairs with recoverable signing.
//!
//! Ported from the Kodiak JS SDK (`common/keychain` package).

use k256::ecdsa::signature::hazmat::PrehashVerifier;
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use rand::rngs::OsRng;

use kodiak_primitives::cb58;
use kodiak_primitives::hash::hash160;
use kodiak_primitives::ids::Address;

use crate::KeychainError;

/// Length of a raw private key in bytes.
pub const PRIVATE_KEY_LEN: usize = 32;

/// Length of a compressed SEC1 public key in bytes.
pub const PUBLIC_KEY_LEN: usize = 33;

/// Length of a recoverable signature in bytes: `r || s || recovery_id`.
pub const SIGNATURE_LEN: usize = 65;

/// String prefix carried by the textual form of a private key.
pub const PRIVATE_KEY_PREFIX: &str = "PrivateKey-";

/// A secp256k1 key pair.
///
/// Holds the signing key and derives the verifying key and payment
/// address on demand.  Signatures are 65 bytes, `r || s` followed by a
/// one-byte recovery id, so the signer's public key can be recovered
/// from the signature and the signed digest alone.
#[derive(Clone)]
pub struct KeyPair {
    key: SigningKey,
}

impl KeyPair {
    /// Generate a new random key pair using the OS entropy source.
    pub fn generate() -> Self {
        KeyPair {
            key: SigningKey::random(&mut OsRng),
        }
    }

    /// Create a key pair from raw private key bytes.
    ///
    /// # Arguments
    /// * `bytes` - A 32-byte big-endian secp256k1 scalar.
    ///
    /// # Returns
    /// The key pair, or an error if the slice has the wrong length or
    /// is not a valid scalar.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeychainError> {
        if bytes.len() != PRIVATE_KEY_LEN {
            return Err(KeychainError::InvalidPrivateKey(format!(
                "expected {} bytes, got {}",
                PRIVATE_KEY_LEN,
                bytes.len()
            )));
        }
        let key = SigningKey::from_slice(bytes)
            .map_err(|e| KeychainError::InvalidPrivateKey(e.to_string()))?;
        Ok(KeyPair { key })
    }

    /// Create a key pair from its textual form.
    ///
    /// Accepts the CB58 encoding of the private key bytes, with or
    /// without the `PrivateKey-` prefix.
    pub fn from_cb58(s: &str) -> Result<Self, KeychainError> {
        let stripped = s.strip_prefix(PRIVATE_KEY_PREFIX).unwrap_or(s);
        let bytes = cb58::decode(stripped)?;
        KeyPair::from_bytes(&bytes)
    }

    /// Return the textual form of the private key: `PrivateKey-` plus
    /// the CB58 encoding of the raw bytes.
    pub fn to_cb58(&self) -> String {
        format!("{}{}", PRIVATE_KEY_PREFIX, cb58::encode(&self.key.to_bytes()))
    }

    /// Return the raw private key bytes.
    pub fn private_key_bytes(&self) -> [u8; PRIVATE_KEY_LEN] {
        self.key.to_bytes().into()
    }

    /// Return the compressed SEC1 encoding of the public key.
    pub fn public_key_bytes(&self) -> [u8; PUBLIC_KEY_LEN] {
        let point = self.key.verifying_key().to_encoded_point(true);
        let mut bytes = [0u8; PUBLIC_KEY_LEN];
        bytes.copy_from_slice(point.as_bytes());
        bytes
    }

    /// Return the payment address for this key pair.
    ///
    /// The address is the RIPEMD-160 of the SHA-256 of the compressed
    /// public key.
    pub fn address(&self) -> Address {
        Address::new(hash160(&self.public_key_bytes()))
    }

    /// Sign a 32-byte digest, producing a recoverable signature.
    ///
    /// # Arguments
    /// * `digest` - The prehashed message to sign.
    ///
    /// # Returns
    /// A 65-byte signature: `r || s || recovery_id`.
    pub fn sign_digest(&self, digest: &[u8; 32]) -> Result<[u8; SIGNATURE_LEN], KeychainError> {
        let (sig, recovery_id) = self
            .key
            .sign_prehash_recoverable(digest)
            .map_err(|e| KeychainError::SignatureError(e.to_string()))?;
        let mut out = [0u8; SIGNATURE_LEN];
        out[..64].copy_from_slice(&sig.to_bytes());
        out[64] = recovery_id.to_byte();
        Ok(out)
    }

    /// Verify a signature produced by this key pair over a digest.
    ///
    /// Accepts either the 64-byte `r || s` form or the 65-byte
    /// recoverable form; the trailing recovery id is ignored.
    pub fn verify_digest(&self, digest: &[u8; 32], signature: &[u8]) -> bool {
        if signature.len() < 64 {
            return false;
        }
        match Signature::from_slice(&signature[..64]) {
            Ok(sig) => self.key.verifying_key().verify_prehash(digest, &sig).is_ok(),
            Err(_) => false,
        }
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print the private scalar.
        f.debug_struct("KeyPair")
            .field("address", &self.address())
            .finish()
    }
}

/// Recover the compressed public key that produced a recoverable
/// signature over a digest.
///
/// # Arguments
/// * `digest` - The prehashed message that was signed.
/// * `signature` - A 65-byte signature: `r || s || recovery_id`.
///
/// # Returns
/// The 33-byte compressed SEC1 public key.
pub fn recover_public_key(
    digest: &[u8; 32],
    signature: &[u8],
) -> Result<[u8; PUBLIC_KEY_LEN], KeychainError> {
    if signature.len() != SIGNATURE_LEN {
        return Err(KeychainError::RecoveryError(format!(
            "expected {} signature bytes, got {}",
            SIGNATURE_LEN,
            signature.len()
        )));
    }
    let sig = Signature::from_slice(&signature[..64])
        .map_err(|e| KeychainError::RecoveryError(e.to_string()))?;
    let recovery_id = RecoveryId::from_byte(signature[64])
        .ok_or_else(|| KeychainError::RecoveryError("invalid recovery id".to_string()))?;
    let verifying_key = VerifyingKey::recover_from_prehash(digest, &sig, recovery_id)
        .map_err(|e| KeychainError::RecoveryError(e.to_string()))?;

    let point = verifying_key.to_encoded_point(true);
    let mut bytes = [0u8; PUBLIC_KEY_LEN];
    bytes.copy_from_slice(point.as_bytes());
    Ok(bytes)
}

/// Recover the payment address that produced a recoverable signature
/// over a digest.
pub fn recover_address(digest: &[u8; 32], signature: &[u8]) -> Result<Address, KeychainError> {
    let public_key = recover_public_key(digest, signature)?;
    Ok(Address::new(hash160(&public_key)))
}
