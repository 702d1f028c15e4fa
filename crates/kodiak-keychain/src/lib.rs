/// Kodiak SDK - secp256k1 key management and recoverable signing.
///
/// This crate covers the key side of transaction construction:
///
/// - `keypair`: key pair generation, textual import/export, address
///   derivation, and recoverable signing over 32-byte digests.
/// - `keychain`: an address-indexed key collection and the
///   [`KeychainInterface`] seam transaction signing works against.
///
/// Ported from the Kodiak JS SDK (`common/keychain` package).

pub mod keychain;
pub mod keypair;

mod error;

pub use error::KeychainError;
pub use keychain::{Keychain, KeychainInterface};
pub use keypair::{
    recover_address, recover_public_key, KeyPair, PRIVATE_KEY_LEN, PRIVATE_KEY_PREFIX,
    PUBLIC_KEY_LEN, SIGNATURE_LEN,
};
