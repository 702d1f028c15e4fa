//! Property-based tests for hashing, CB58, ids, and the wire codec.

use std::str::FromStr;

use proptest::prelude::*;

use kodiak_primitives::cb58;
use kodiak_primitives::hash::{hash160, ripemd160, sha256};
use kodiak_primitives::ids::{Address, Id, NodeId};
use kodiak_primitives::wire::{KdkReader, KdkWriter};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn proptest_cb58_roundtrip(data in prop::collection::vec(any::<u8>(), 0..256)) {
        let encoded = cb58::encode(&data);
        let decoded = cb58::decode(&encoded).expect("decode should succeed");
        prop_assert_eq!(decoded, data);
    }

    #[test]
    fn proptest_cb58_rejects_truncation(data in prop::collection::vec(any::<u8>(), 1..256)) {
        // Dropping the last character invalidates the checksum (or the
        // length) for effectively every input.
        let encoded = cb58::encode(&data);
        let truncated = &encoded[..encoded.len() - 1];
        prop_assert!(cb58::decode(truncated).is_err());
    }

    #[test]
    fn proptest_id_string_roundtrip(bytes in prop::array::uniform32(any::<u8>())) {
        let id = Id::new(bytes);
        let parsed = Id::from_str(&id.to_string()).expect("parse should succeed");
        prop_assert_eq!(parsed, id);
    }

    #[test]
    fn proptest_node_id_string_roundtrip(bytes in prop::array::uniform20(any::<u8>())) {
        let node = NodeId::new(bytes);
        let parsed = NodeId::from_str(&node.to_string()).expect("parse should succeed");
        prop_assert_eq!(parsed, node);
    }

    #[test]
    fn proptest_address_string_roundtrip(bytes in prop::array::uniform20(any::<u8>())) {
        let addr = Address::new(bytes);
        let parsed = Address::from_str(&addr.to_string()).expect("parse should succeed");
        prop_assert_eq!(parsed, addr);
    }

    #[test]
    fn proptest_wire_integer_roundtrip(a in any::<u8>(), b in any::<u16>(), c in any::<u32>(), d in any::<u64>()) {
        let mut writer = KdkWriter::new();
        writer.write_u8(a);
        writer.write_u16(b);
        writer.write_u32(c);
        writer.write_u64(d);

        let bytes = writer.into_bytes();
        prop_assert_eq!(bytes.len(), 15);

        let mut reader = KdkReader::new(&bytes);
        prop_assert_eq!(reader.read_u8().unwrap(), a);
        prop_assert_eq!(reader.read_u16().unwrap(), b);
        prop_assert_eq!(reader.read_u32().unwrap(), c);
        prop_assert_eq!(reader.read_u64().unwrap(), d);
        prop_assert!(reader.is_empty());
    }

    #[test]
    fn proptest_reader_never_reads_past_end(data in prop::collection::vec(any::<u8>(), 0..64), len in 0usize..80) {
        let mut reader = KdkReader::new(&data);
        let result = reader.read_bytes(len);
        if len <= data.len() {
            prop_assert!(result.is_ok());
            prop_assert_eq!(reader.pos(), len);
        } else {
            prop_assert!(result.is_err());
            prop_assert_eq!(reader.pos(), 0);
        }
    }

    #[test]
    fn proptest_hash_lengths(data in prop::collection::vec(any::<u8>(), 0..512)) {
        prop_assert_eq!(sha256(&data).len(), 32);
        prop_assert_eq!(ripemd160(&data).len(), 20);
        prop_assert_eq!(hash160(&data), ripemd160(&sha256(&data)));
    }
}
