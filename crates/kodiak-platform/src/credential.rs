//! Credentials: the signatures authorizing a transaction.

use kodiak_keychain::SIGNATURE_LEN;
use kodiak_primitives::wire::{KdkReader, KdkWriter};

use crate::constants::SECP_CREDENTIAL_ID;
use crate::PlatformError;

/// The recoverable signatures for one signature slot group.
///
/// A signed transaction carries one credential per base input, plus
/// one per imported input and one for a subnet authorization where
/// those apply.  Signatures appear in the same order as the slots
/// they satisfy.
///
/// # Wire format
///
/// | Field        | Size          |
/// |--------------|---------------|
/// | type id      | 4 bytes (BE)  |
/// | n signatures | 4 bytes (BE)  |
/// | signatures   | n * 65 bytes  |
#[derive(Clone, Debug, Default)]
pub struct Credential {
    /// The 65-byte recoverable signatures.
    pub signatures: Vec<[u8; SIGNATURE_LEN]>,
}

impl Credential {
    /// Create an empty credential.
    pub fn new() -> Self {
        Credential::default()
    }

    /// Append a signature.
    pub fn add_signature(&mut self, signature: [u8; SIGNATURE_LEN]) {
        self.signatures.push(signature);
    }

    /// Deserialize a credential, including its type id.
    pub fn read_from(reader: &mut KdkReader) -> Result<Self, PlatformError> {
        let type_id = reader.read_u32().map_err(|e| {
            PlatformError::SerializationError(format!("reading credential type: {}", e))
        })?;
        if type_id != SECP_CREDENTIAL_ID {
            return Err(PlatformError::SerializationError(format!(
                "unknown credential type id: {}",
                type_id
            )));
        }
        let num_sigs = reader.read_u32().map_err(|e| {
            PlatformError::SerializationError(format!("reading signature count: {}", e))
        })?;
        let mut signatures = Vec::with_capacity(num_sigs as usize);
        for _ in 0..num_sigs {
            let bytes = reader.read_bytes(SIGNATURE_LEN).map_err(|e| {
                PlatformError::SerializationError(format!("reading signature: {}", e))
            })?;
            let mut signature = [0u8; SIGNATURE_LEN];
            signature.copy_from_slice(bytes);
            signatures.push(signature);
        }
        Ok(Credential { signatures })
    }

    /// Serialize this credential, including its type id.
    pub fn write_to(&self, writer: &mut KdkWriter) {
        writer.write_u32(SECP_CREDENTIAL_ID);
        writer.write_u32(self.signatures.len() as u32);
        for signature in &self.signatures {
            writer.write_bytes(signature);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_roundtrip() {
        let mut credential = Credential::new();
        credential.add_signature([0x11; SIGNATURE_LEN]);
        credential.add_signature([0x22; SIGNATURE_LEN]);

        let mut writer = KdkWriter::new();
        credential.write_to(&mut writer);
        let bytes = writer.into_bytes();
        assert_eq!(bytes.len(), 4 + 4 + 2 * SIGNATURE_LEN);

        let mut reader = KdkReader::new(&bytes);
        let decoded = Credential::read_from(&mut reader).unwrap();
        assert!(reader.is_empty());
        assert_eq!(decoded.signatures.len(), 2);
        assert_eq!(decoded.signatures[0], [0x11; SIGNATURE_LEN]);
    }

    #[test]
    fn test_credential_rejects_unknown_type() {
        let mut writer = KdkWriter::new();
        writer.write_u32(77);
        writer.write_u32(0);
        let mut reader = KdkReader::new(writer.as_bytes());
        assert!(Credential::read_from(&mut reader).is_err());
    }

    #[test]
    fn test_credential_rejects_truncated_signature() {
        let mut writer = KdkWriter::new();
        writer.write_u32(SECP_CREDENTIAL_ID);
        writer.write_u32(1);
        writer.write_bytes(&[0u8; 64]);
        let mut reader = KdkReader::new(writer.as_bytes());
        assert!(Credential::read_from(&mut reader).is_err());
    }
}
