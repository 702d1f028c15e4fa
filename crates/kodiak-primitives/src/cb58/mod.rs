//! CB58 encoding and decoding.
//!
//! CB58 is Base58 (Bitcoin alphabet) over the payload followed by a
//! four-byte checksum, where the checksum is the *last* four bytes of
//! SHA-256(payload).  All human-readable ids on the Kodiak network
//! (transaction ids, asset ids, chain ids, serialized transactions)
//! use this form.
//! Ported from the Kodiak JS SDK (`utils/bintools`).

use crate::hash::sha256;
use crate::PrimitivesError;

/// Number of checksum bytes appended to the payload.
const CHECKSUM_LEN: usize = 4;

/// Encode a byte slice as a CB58 string.
///
/// Appends the last four bytes of SHA-256(data) as a checksum, then
/// Base58-encodes the whole buffer with the Bitcoin alphabet.
///
/// # Arguments
/// * `data` - The payload bytes to encode.
///
/// # Returns
/// A CB58-encoded string.
pub fn encode(data: &[u8]) -> String {
    let digest = sha256(data);
    let mut payload = Vec::with_capacity(data.len() + CHECKSUM_LEN);
    payload.extend_from_slice(data);
    payload.extend_from_slice(&digest[digest.len() - CHECKSUM_LEN..]);
    bs58::encode(payload)
        .with_alphabet(bs58::Alphabet::BITCOIN)
        .into_string()
}

/// Decode a CB58 string, verifying and stripping its checksum.
///
/// # Arguments
/// * `s` - The CB58 string to decode.
///
/// # Returns
/// `Ok(Vec<u8>)` with the payload bytes, or an error for invalid
/// characters, a too-short input, or a checksum mismatch.
pub fn decode(s: &str) -> Result<Vec<u8>, PrimitivesError> {
    let decoded = bs58::decode(s)
        .with_alphabet(bs58::Alphabet::BITCOIN)
        .into_vec()
        .map_err(|e| PrimitivesError::InvalidBase58(e.to_string()))?;

    if decoded.len() < CHECKSUM_LEN {
        return Err(PrimitivesError::InputTooShort(decoded.len()));
    }

    let (payload, checksum) = decoded.split_at(decoded.len() - CHECKSUM_LEN);
    let digest = sha256(payload);
    if checksum != &digest[digest.len() - CHECKSUM_LEN..] {
        return Err(PrimitivesError::ChecksumMismatch);
    }

    Ok(payload.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode_roundtrip() {
        let cases: Vec<Vec<u8>> = vec![
            vec![],
            vec![0x00],
            vec![0x00, 0x00, 0x00],
            vec![0xde, 0xad, 0xbe, 0xef],
            (0u8..=255).collect(),
        ];
        for data in cases {
            let encoded = encode(&data);
            let decoded = decode(&encoded).expect("decode should succeed");
            assert_eq!(decoded, data, "roundtrip mismatch for {:?}", data);
        }
    }

    #[test]
    fn test_decode_rejects_bad_checksum() {
        let mut encoded = encode(b"kodiak");
        // Flip the trailing character to corrupt the checksum.
        let last = encoded.pop().unwrap();
        let replacement = if last == '2' { '3' } else { '2' };
        encoded.push(replacement);
        assert!(decode(&encoded).is_err(), "corrupted checksum should fail");
    }

    #[test]
    fn test_decode_rejects_short_input() {
        // "1" decodes to a single zero byte, shorter than the checksum.
        let result = decode("1");
        assert!(matches!(result, Err(PrimitivesError::InputTooShort(_))));
    }

    #[test]
    fn test_decode_rejects_invalid_character() {
        // '0' and 'O' are not in the Bitcoin Base58 alphabet.
        assert!(decode("0OIl").is_err());
    }
}
