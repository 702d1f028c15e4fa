//! Property-based tests for the output/input codec, UTXOs, the UTXO
//! set, selection, and the transaction envelope.

use proptest::prelude::*;

use kodiak_keychain::SIGNATURE_LEN;
use kodiak_primitives::ids::{Address, Id, NodeId};
use kodiak_primitives::wire::{KdkReader, KdkWriter};

use kodiak_platform::{
    AddNominatorTx, AddSubnetValidatorTx, AddValidatorTx, AssetAmountDestination, BaseTx,
    CreateChainTx, CreateSubnetTx, Credential, ExportTx, ImportTx, Input, Output, OutputOwners,
    PlatformError, SecpTransferInput, SecpTransferOutput, StakeableLockIn, StakeableLockOut,
    TransferableInput, TransferableOutput, Tx, TxBody, UnsignedTx, Utxo, UtxoSet, Validator,
};

// -----------------------------------------------------------------------
// Strategies
// -----------------------------------------------------------------------

fn arb_address() -> impl Strategy<Value = Address> {
    prop::array::uniform20(any::<u8>()).prop_map(Address::new)
}

fn arb_id() -> impl Strategy<Value = Id> {
    prop::array::uniform32(any::<u8>()).prop_map(Id::new)
}

fn arb_owners() -> impl Strategy<Value = OutputOwners> {
    (
        0u64..2_000_000,
        prop::collection::vec(arb_address(), 1..4),
        any::<prop::sample::Index>(),
    )
        .prop_map(|(locktime, addresses, pick)| {
            let threshold = pick.index(addresses.len()) as u32 + 1;
            OutputOwners::new(locktime, threshold, addresses)
        })
}

fn arb_output() -> impl Strategy<Value = Output> {
    prop_oneof![
        (any::<u64>(), arb_owners()).prop_map(|(amount, owners)| {
            Output::SecpTransfer(SecpTransferOutput::new(amount, owners))
        }),
        arb_owners().prop_map(Output::SecpOwner),
        (any::<u64>(), any::<u64>(), arb_owners()).prop_map(|(end, amount, owners)| {
            Output::StakeableLock(StakeableLockOut::new(
                end,
                SecpTransferOutput::new(amount, owners),
            ))
        }),
    ]
}

fn arb_transfer_input() -> impl Strategy<Value = SecpTransferInput> {
    (
        any::<u64>(),
        prop::collection::vec((any::<u32>(), arb_address()), 0..4),
    )
        .prop_map(|(amount, slots)| {
            let mut input = SecpTransferInput::new(amount);
            for (index, address) in slots {
                input.add_signature_idx(index, address);
            }
            input
        })
}

fn arb_input() -> impl Strategy<Value = Input> {
    prop_oneof![
        arb_transfer_input().prop_map(Input::SecpTransfer),
        (any::<u64>(), arb_transfer_input()).prop_map(|(end, inner)| {
            Input::StakeableLock(StakeableLockIn::new(end, inner))
        }),
    ]
}

fn arb_utxo() -> impl Strategy<Value = Utxo> {
    (arb_id(), any::<u32>(), arb_id(), arb_output()).prop_map(
        |(tx_id, output_idx, asset_id, output)| Utxo::new(tx_id, output_idx, asset_id, output),
    )
}

fn arb_transferable_output() -> impl Strategy<Value = TransferableOutput> {
    (arb_id(), arb_output())
        .prop_map(|(asset_id, output)| TransferableOutput::new(asset_id, output))
}

fn arb_transferable_input() -> impl Strategy<Value = TransferableInput> {
    (arb_id(), any::<u32>(), arb_id(), arb_input()).prop_map(
        |(tx_id, output_idx, asset_id, input)| {
            TransferableInput::new(tx_id, output_idx, asset_id, input)
        },
    )
}

fn arb_base_tx() -> impl Strategy<Value = BaseTx> {
    (
        any::<u32>(),
        arb_id(),
        prop::collection::vec(arb_transferable_output(), 0..4),
        prop::collection::vec(arb_transferable_input(), 0..4),
        prop::collection::vec(any::<u8>(), 0..32),
    )
        .prop_map(|(network_id, blockchain_id, outs, ins, memo)| {
            BaseTx::new(network_id, blockchain_id, outs, ins, memo)
        })
}

fn arb_node_id() -> impl Strategy<Value = NodeId> {
    prop::array::uniform20(any::<u8>()).prop_map(NodeId::new)
}

fn arb_validator() -> impl Strategy<Value = Validator> {
    (arb_node_id(), any::<u64>(), any::<u64>(), any::<u64>()).prop_map(
        |(node_id, start_time, end_time, weight)| {
            Validator::new(node_id, start_time, end_time, weight)
        },
    )
}

fn arb_tx_body() -> impl Strategy<Value = TxBody> {
    prop_oneof![
        arb_base_tx().prop_map(TxBody::Base),
        (
            arb_base_tx(),
            arb_id(),
            prop::collection::vec(arb_transferable_input(), 0..3),
        )
            .prop_map(|(base, source_chain, ins)| {
                TxBody::Import(ImportTx::new(base, source_chain, ins))
            }),
        (
            arb_base_tx(),
            arb_id(),
            prop::collection::vec(arb_transferable_output(), 0..3),
        )
            .prop_map(|(base, destination_chain, outs)| {
                TxBody::Export(ExportTx::new(base, destination_chain, outs))
            }),
        (
            arb_base_tx(),
            arb_validator(),
            prop::collection::vec(arb_transferable_output(), 0..3),
            arb_owners(),
            any::<u32>(),
        )
            .prop_map(|(base, validator, stake_outs, rewards_owner, shares)| {
                TxBody::AddValidator(AddValidatorTx::new(
                    base,
                    validator,
                    stake_outs,
                    rewards_owner,
                    shares,
                ))
            }),
        (
            arb_base_tx(),
            arb_validator(),
            prop::collection::vec(arb_transferable_output(), 0..3),
            arb_owners(),
        )
            .prop_map(|(base, validator, stake_outs, rewards_owner)| {
                TxBody::AddNominator(AddNominatorTx::new(
                    base,
                    validator,
                    stake_outs,
                    rewards_owner,
                ))
            }),
        (
            arb_base_tx(),
            arb_validator(),
            arb_id(),
            prop::collection::vec((any::<u32>(), arb_address()), 0..3),
        )
            .prop_map(|(base, validator, subnet_id, auth)| {
                let mut tx = AddSubnetValidatorTx::new(base, validator, subnet_id);
                for (index, address) in auth {
                    tx.add_signature_idx(index, address);
                }
                TxBody::AddSubnetValidator(tx)
            }),
        (arb_base_tx(), arb_owners())
            .prop_map(|(base, owner)| TxBody::CreateSubnet(CreateSubnetTx::new(base, owner))),
        (
            arb_base_tx(),
            arb_id(),
            "[a-z]{0,12}",
            arb_id(),
            prop::collection::vec(arb_id(), 0..3),
            prop::collection::vec(any::<u8>(), 0..24),
        )
            .prop_map(|(base, subnet_id, chain_name, vm_id, fx_ids, genesis_data)| {
                TxBody::CreateChain(CreateChainTx::new(
                    base,
                    subnet_id,
                    chain_name,
                    vm_id,
                    fx_ids,
                    genesis_data,
                ))
            }),
    ]
}

fn output_bytes(output: &Output) -> Vec<u8> {
    let mut writer = KdkWriter::new();
    output.write_to(&mut writer);
    writer.into_bytes()
}

fn input_bytes(input: &TransferableInput) -> Vec<u8> {
    let mut writer = KdkWriter::new();
    input.write_to(&mut writer);
    writer.into_bytes()
}

// -----------------------------------------------------------------------
// Properties
// -----------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn proptest_output_wire_roundtrip(output in arb_output()) {
        let bytes = output_bytes(&output);
        let mut reader = KdkReader::new(&bytes);
        let decoded = Output::read_from(&mut reader).expect("decode should succeed");
        prop_assert!(reader.is_empty());
        prop_assert_eq!(output_bytes(&decoded), bytes);
    }

    #[test]
    fn proptest_input_wire_roundtrip(
        tx_id in arb_id(),
        output_idx in any::<u32>(),
        asset_id in arb_id(),
        input in arb_input(),
    ) {
        let transferable = TransferableInput::new(tx_id, output_idx, asset_id, input);
        let bytes = input_bytes(&transferable);

        let mut reader = KdkReader::new(&bytes);
        let decoded = TransferableInput::read_from(&mut reader).expect("decode should succeed");
        prop_assert!(reader.is_empty());
        prop_assert_eq!(input_bytes(&decoded), bytes);
    }

    #[test]
    fn proptest_utxo_roundtrip(utxo in arb_utxo()) {
        let bytes = utxo.to_bytes();
        let decoded = Utxo::from_bytes(&bytes).expect("decode should succeed");
        prop_assert_eq!(&decoded.to_bytes(), &bytes);

        let restored = Utxo::from_cb58(&utxo.to_cb58()).expect("cb58 decode should succeed");
        prop_assert_eq!(restored.to_bytes(), bytes);
    }

    #[test]
    fn proptest_utxo_rejects_trailing_bytes(utxo in arb_utxo(), extra in any::<u8>()) {
        let mut bytes = utxo.to_bytes();
        bytes.push(extra);
        prop_assert!(Utxo::from_bytes(&bytes).is_err());
    }

    #[test]
    fn proptest_owner_addresses_are_sorted(owners in arb_owners()) {
        let mut sorted = owners.addresses.clone();
        sorted.sort();
        prop_assert_eq!(&owners.addresses, &sorted);
    }

    #[test]
    fn proptest_spenders_respect_locktime(owners in arb_owners(), as_of in 0u64..3_000_000) {
        let spenders = owners.spenders(&owners.addresses, as_of);
        if as_of <= owners.locktime {
            prop_assert!(spenders.is_empty());
            prop_assert!(!owners.meets_threshold(&owners.addresses, as_of));
        } else {
            // The full owner set always covers the threshold.
            prop_assert_eq!(spenders.len() as u32, owners.threshold);
            prop_assert!(owners.meets_threshold(&owners.addresses, as_of));
        }
    }

    #[test]
    fn proptest_base_tx_order_is_canonical(
        outputs in prop::collection::vec(arb_output(), 1..6),
        inputs in prop::collection::vec(arb_input(), 1..6),
        asset_id in arb_id(),
    ) {
        let outs: Vec<TransferableOutput> = outputs
            .into_iter()
            .map(|output| TransferableOutput::new(asset_id, output))
            .collect();
        let ins: Vec<TransferableInput> = inputs
            .into_iter()
            .enumerate()
            .map(|(i, input)| TransferableInput::new(Id::new([i as u8; 32]), 0, asset_id, input))
            .collect();
        let mut outs_reversed = outs.clone();
        outs_reversed.reverse();
        let mut ins_reversed = ins.clone();
        ins_reversed.reverse();

        let forward = UnsignedTx::new(TxBody::Base(BaseTx::new(
            1,
            asset_id,
            outs,
            ins,
            Vec::new(),
        )))
        .to_bytes();
        let backward = UnsignedTx::new(TxBody::Base(BaseTx::new(
            1,
            asset_id,
            outs_reversed,
            ins_reversed,
            Vec::new(),
        )))
        .to_bytes();
        prop_assert_eq!(forward, backward);
    }

    #[test]
    fn proptest_unsigned_tx_roundtrip(body in arb_tx_body()) {
        let unsigned = UnsignedTx::new(body);
        let bytes = unsigned.to_bytes();
        let decoded = UnsignedTx::from_bytes(&bytes).expect("decode should succeed");
        prop_assert_eq!(decoded.to_bytes(), bytes);
    }

    #[test]
    fn proptest_signed_tx_roundtrip(
        signatures in prop::collection::vec(prop::collection::vec(any::<u8>(), SIGNATURE_LEN), 0..3),
        memo in prop::collection::vec(any::<u8>(), 0..16),
    ) {
        let base = BaseTx::new(1, Id::new([7; 32]), Vec::new(), Vec::new(), memo);
        let unsigned = UnsignedTx::new(TxBody::Base(base));

        let mut credentials = Vec::new();
        for signature in signatures {
            let bytes: [u8; SIGNATURE_LEN] =
                signature.try_into().expect("strategy emits exact length");
            let mut credential = Credential::new();
            credential.add_signature(bytes);
            credentials.push(credential);
        }

        let tx = Tx::new(unsigned, credentials);
        let bytes = tx.to_bytes();
        let decoded = Tx::from_bytes(&bytes).expect("decode should succeed");
        prop_assert_eq!(decoded.to_bytes(), bytes);
        prop_assert_eq!(decoded.id(), tx.id());
    }

    #[test]
    fn proptest_utxo_set_add_remove(utxos in prop::collection::vec(arb_utxo(), 1..10)) {
        let mut set = UtxoSet::new();
        for utxo in &utxos {
            set.add(utxo.clone(), false);
        }
        for utxo in &utxos {
            prop_assert!(set.includes(&utxo.utxo_id()));
        }
        prop_assert_eq!(set.get_utxo_ids().len(), set.len());

        for utxo in &utxos {
            set.remove(&utxo.utxo_id());
        }
        prop_assert!(set.is_empty());
    }

    #[test]
    fn proptest_balance_counts_owned_amounts(
        amounts in prop::collection::vec(1u64..1_000_000, 1..8),
    ) {
        let owner = Address::new([1; 20]);
        let other = Address::new([2; 20]);
        let asset_id = Id::new([0xaa; 32]);

        let mut set = UtxoSet::new();
        let mut owned_total: u64 = 0;
        for (i, amount) in amounts.iter().enumerate() {
            let recipient = if i % 2 == 0 { owner } else { other };
            if recipient == owner {
                owned_total += amount;
            }
            let utxo = Utxo::new(
                Id::new([(i + 1) as u8; 32]),
                0,
                asset_id,
                Output::SecpTransfer(SecpTransferOutput::new(
                    *amount,
                    OutputOwners::new(0, 1, vec![recipient]),
                )),
            );
            set.add(utxo, false);
        }

        prop_assert_eq!(set.get_balance(&[owner], &asset_id, 1), owned_total);
        prop_assert_eq!(set.get_balance(&[owner], &Id::new([0xbb; 32]), 1), 0);
    }

    #[test]
    fn proptest_selection_conserves_value(
        amounts in prop::collection::vec(1_000u64..1_000_000, 1..8),
        request in any::<prop::sample::Index>(),
        fee in 0u64..500,
    ) {
        let owner = Address::new([1; 20]);
        let destination = Address::new([2; 20]);
        let change = Address::new([3; 20]);
        let asset_id = Id::new([0xaa; 32]);
        let blockchain_id = Id::new([0xcc; 32]);

        let mut set = UtxoSet::new();
        for (i, amount) in amounts.iter().enumerate() {
            let utxo = Utxo::new(
                Id::new([(i + 1) as u8; 32]),
                0,
                asset_id,
                Output::SecpTransfer(SecpTransferOutput::new(
                    *amount,
                    OutputOwners::new(0, 1, vec![owner]),
                )),
            );
            set.add(utxo, false);
        }
        let total: u64 = amounts.iter().sum();
        let amount = request.index((total - fee) as usize) as u64 + 1;

        let unsigned = set
            .build_base_tx(
                1,
                blockchain_id,
                amount,
                asset_id,
                vec![destination],
                vec![owner],
                vec![change],
                fee,
                None,
                Vec::new(),
                1,
                0,
                1,
            )
            .expect("selection should succeed")
            .expect("non-zero amount should build");

        let base = match &unsigned.body {
            TxBody::Base(base) => base,
            _ => panic!("expected a base tx"),
        };
        let spent: u64 = base.ins.iter().map(|input| input.input.amount()).sum();
        let returned: u64 = base.outs.iter().filter_map(|out| out.output.amount()).sum();
        prop_assert_eq!(spent, returned + fee);

        let delivered: u64 = base
            .outs
            .iter()
            .filter(|out| out.output.owners().addresses.contains(&destination))
            .filter_map(|out| out.output.amount())
            .sum();
        prop_assert_eq!(delivered, amount);
    }

    #[test]
    fn proptest_over_request_always_fails(
        amounts in prop::collection::vec(1_000u64..1_000_000, 1..8),
        excess in 1u64..1_000_000,
        fee in 0u64..500,
    ) {
        let owner = Address::new([1; 20]);
        let asset_id = Id::new([0xaa; 32]);

        let mut set = UtxoSet::new();
        for (i, amount) in amounts.iter().enumerate() {
            let utxo = Utxo::new(
                Id::new([(i + 1) as u8; 32]),
                0,
                asset_id,
                Output::SecpTransfer(SecpTransferOutput::new(
                    *amount,
                    OutputOwners::new(0, 1, vec![owner]),
                )),
            );
            set.add(utxo, false);
        }
        let total: u64 = amounts.iter().sum();
        // amount + fee always exceeds the set's holdings.
        let amount = total + excess - fee;

        let result = set.build_base_tx(
            1,
            Id::new([0xcc; 32]),
            amount,
            asset_id,
            vec![Address::new([2; 20])],
            vec![owner],
            vec![Address::new([3; 20])],
            fee,
            None,
            Vec::new(),
            1,
            0,
            1,
        );
        prop_assert!(matches!(result, Err(PlatformError::InsufficientFunds(_))));
    }

    #[test]
    fn proptest_locked_change_attaches_to_smallest_locktime(
        parts in prop::collection::vec((1_000u64..100_000, 0u64..500), 2..5),
        request in any::<prop::sample::Index>(),
    ) {
        let owner = Address::new([1; 20]);
        let asset_id = Id::new([0xaa; 32]);
        let as_of = 50u64;

        let mut set = UtxoSet::new();
        let mut lots: Vec<(u64, u64)> = Vec::new();
        for (i, (amount, jitter)) in parts.iter().enumerate() {
            // Spaced apart so every lot has a distinct stakeable locktime.
            let lock_end = 1_000 * (i as u64 + 1) + jitter;
            lots.push((lock_end, *amount));
            let utxo = Utxo::new(
                Id::new([(i + 1) as u8; 32]),
                0,
                asset_id,
                Output::StakeableLock(StakeableLockOut::new(
                    lock_end,
                    SecpTransferOutput::new(*amount, OutputOwners::new(0, 1, vec![owner])),
                )),
            );
            set.add(utxo, false);
        }
        let total: u64 = lots.iter().map(|(_, amount)| amount).sum();
        let stake = request.index((total - 1) as usize) as u64 + 1;

        let mut aad = AssetAmountDestination::new(vec![owner], vec![owner], vec![owner]);
        aad.add_asset_amount(asset_id, stake, 0);
        set.get_minimum_spendable(&mut aad, as_of, 0, 1, true)
            .expect("selection should succeed");

        // Selection consumes lots in descending locktime order, so the
        // last lot it touches has the smallest locktime of any consumed.
        lots.sort_by_key(|(lock_end, _)| std::cmp::Reverse(*lock_end));
        let mut consumed_sum = 0u64;
        let mut smallest_consumed_lock = 0u64;
        for (lock_end, amount) in &lots {
            consumed_sum += amount;
            smallest_consumed_lock = *lock_end;
            if consumed_sum >= stake {
                break;
            }
        }
        let expected_change = consumed_sum - stake;

        let staked: u64 = aad
            .outputs()
            .iter()
            .filter_map(|out| out.output.amount())
            .sum();
        prop_assert_eq!(staked, stake);

        let change_outs = aad.change_outputs();
        if expected_change == 0 {
            prop_assert!(change_outs.is_empty());
        } else {
            prop_assert_eq!(change_outs.len(), 1, "locked change must sit in exactly one output");
            let change = &change_outs[0].output;
            prop_assert_eq!(change.amount(), Some(expected_change));
            prop_assert_eq!(change.stakeable_locktime(), Some(smallest_consumed_lock));
        }
    }
}
