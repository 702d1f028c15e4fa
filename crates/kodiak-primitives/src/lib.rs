/// Kodiak SDK - Hashing, identifiers, and wire codec utilities.
///
/// This crate provides the foundational building blocks for the Kodiak SDK:
/// - Hash functions (SHA-256, RIPEMD-160, Hash160)
/// - CB58 encoding/decoding (Base58 with a SHA-256 checksum)
/// - Fixed-width identifier types (32-byte ids, 20-byte node ids and
///   addresses)
/// - Big-endian cursor reader/writer for the platform wire format

pub mod cb58;
pub mod hash;
pub mod ids;
pub mod wire;

mod error;
pub use error::PrimitivesError;
