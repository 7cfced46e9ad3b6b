//! End-to-end tests for the public builder API against a mock chain client

use std::cell::RefCell;
use std::collections::HashMap;

use neo_tx_core::rpc::{Balance, Claimable, ClaimableOutput, InvokeResult, UnspentOutput, Unspents};
use neo_tx_core::*;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Default)]
struct MockClient {
    balances: HashMap<String, Vec<Balance>>,
    claimable: Vec<ClaimableOutput>,
    gas_consumed: Option<Fixed8>,
    vm_state: String,
    transport_down: bool,
    rpc_error: Option<(i64, String)>,
    sent: RefCell<Vec<String>>,
}

impl MockClient {
    fn check<T>(&self, ok: T) -> anyhow::Result<RpcResponse<T>> {
        if self.transport_down {
            anyhow::bail!("connection reset by peer");
        }
        if let Some((code, message)) = &self.rpc_error {
            return Ok(RpcResponse::err(*code, message.clone()));
        }
        Ok(RpcResponse::ok(ok))
    }
}

impl ChainClient for MockClient {
    fn get_unspent_outputs(&self, address: &str) -> anyhow::Result<RpcResponse<Unspents>> {
        let balance = self.balances.get(address).cloned().unwrap_or_default();
        self.check(Unspents { balance, address: address.to_string() })
    }

    fn invoke_script(&self, script_hex: &str) -> anyhow::Result<RpcResponse<InvokeResult>> {
        self.check(InvokeResult {
            state: self.vm_state.clone(),
            gas_consumed: self.gas_consumed.unwrap_or(Fixed8::ZERO),
            script: script_hex.to_string(),
            stack: Vec::new(),
        })
    }

    fn get_claimable(&self, address: &str) -> anyhow::Result<RpcResponse<Claimable>> {
        self.check(Claimable { claimable: self.claimable.clone(), address: address.to_string() })
    }

    fn send_raw_transaction(&self, raw_hex: &str) -> anyhow::Result<RpcResponse<bool>> {
        self.sent.borrow_mut().push(raw_hex.to_string());
        self.check(true)
    }
}

fn key(n: u8) -> PrivateKey {
    PrivateKey::from_bytes(&[n; 32]).unwrap()
}

fn amount(s: &str) -> Fixed8 {
    Fixed8::parse(s).unwrap()
}

fn unspent(values: &[&str]) -> Vec<UnspentOutput> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| UnspentOutput {
            tx_id: Hash256::from_bytes([0x30 + i as u8; 32]),
            index: i as u16,
            value: amount(v),
        })
        .collect()
}

#[test]
fn test_contract_transfer_end_to_end() {
    init_logging();
    let sender = key(1);
    let from = public_key_to_address(&sender.public_key());
    let to = public_key_to_address(&key(2).public_key());

    let mut client = MockClient::default();
    client
        .balances
        .insert(from.clone(), vec![Balance { asset_id: NEO_ASSET_ID, unspent: unspent(&["100"]) }]);
    let builder = TransactionBuilder::new(client);

    let mut tx = builder
        .build_contract_transaction(&from, &to, &NEO_ASSET_ID, amount("30"), Fixed8::ZERO, None)
        .unwrap();
    assert_eq!(tx.transaction_type(), TransactionType::Contract);
    assert_eq!(tx.inputs.len(), 1);
    assert_eq!(tx.outputs.len(), 2);
    assert_eq!(tx.outputs[0].value, amount("30"));
    assert_eq!(tx.outputs[0].script_hash, address_to_script_hash(&to).unwrap());
    assert_eq!(tx.outputs[1].value, amount("70"));
    assert_eq!(tx.outputs[1].script_hash, address_to_script_hash(&from).unwrap());

    let id = tx.id();
    tx.sign(&sender);
    assert!(tx.verify_witnesses());

    let parsed = Transaction::from_bytes(&tx.to_bytes()).unwrap();
    assert_eq!(parsed, tx);
    assert_eq!(parsed.id(), id);

    assert!(builder.relay(&tx).unwrap());
    assert_eq!(builder.client().sent.borrow().as_slice(), &[tx.to_hex()]);
}

#[test]
fn test_exact_amount_has_no_change_output() {
    init_logging();
    let from = public_key_to_address(&key(1).public_key());
    let to = public_key_to_address(&key(2).public_key());
    let mut client = MockClient::default();
    client
        .balances
        .insert(from.clone(), vec![Balance { asset_id: GAS_ASSET_ID, unspent: unspent(&["2", "3"]) }]);
    let builder = TransactionBuilder::new(client);

    let tx = builder
        .build_contract_transaction(&from, &to, &GAS_ASSET_ID, amount("5"), Fixed8::ZERO, None)
        .unwrap();
    assert_eq!(tx.inputs.len(), 2);
    assert_eq!(tx.outputs.len(), 1);
}

#[test]
fn test_gas_selection_vector() {
    let from = public_key_to_address(&key(1).public_key());
    let mut client = MockClient::default();
    client.balances.insert(
        from.clone(),
        vec![Balance { asset_id: GAS_ASSET_ID, unspent: unspent(&["11250", "81.96167", "0.03833"]) }],
    );
    let builder = TransactionBuilder::new(client);
    let selection = builder.select_inputs(&from, &GAS_ASSET_ID, amount("10000")).unwrap();
    assert_eq!(selection.inputs.len(), 1);
    assert_eq!(selection.total, amount("11250"));
}

#[test]
fn test_claim_single_record() {
    init_logging();
    let address = public_key_to_address(&key(3).public_key());
    let client = MockClient {
        claimable: vec![ClaimableOutput {
            tx_id: Hash256::from_reversed_hex(
                "52ba70ef18e879785572c917795cd81422c3820b8cf44c24846a30ee7376fd77",
            )
            .unwrap(),
            index: 1,
            unclaimed: amount("750.032"),
        }],
        ..Default::default()
    };
    let builder = TransactionBuilder::new(client);
    let tx = builder.build_claim_transaction(&address, None).unwrap();
    assert_eq!(tx.transaction_type(), TransactionType::Claim);
    assert_eq!(tx.outputs.len(), 1);
    assert_eq!(tx.outputs[0].value.raw_value(), 75_003_200_000);
    assert_eq!(tx.outputs[0].asset_id, GAS_ASSET_ID);
    assert!(tx.inputs.is_empty());
}

#[test]
fn test_invocation_without_inputs_carries_sender() {
    init_logging();
    let sender = key(4);
    let from = public_key_to_address(&sender.public_key());
    let client = MockClient {
        gas_consumed: Some(amount("2.1")),
        vm_state: "HALT, BREAK".to_string(),
        ..Default::default()
    };
    let builder = TransactionBuilder::new(client);
    let contract = Hash160::from_reversed_hex("ecc6b20d3ccac1ee9ef109af5a7cdb85706b1df9").unwrap();
    let args = vec![
        ContractParameter::Hash160(address_to_script_hash(&from).unwrap()),
        ContractParameter::Integer(5),
    ];
    let mut tx = builder
        .build_invocation_transaction(&from, &contract, "transfer", &args, Fixed8::ZERO)
        .unwrap();
    assert_eq!(tx.version, 1);
    assert_eq!(tx.attributes.len(), 1);
    assert_eq!(tx.attributes[0].usage(), AttributeUsage::SCRIPT);
    assert_eq!(tx.attributes[0].data(), address_to_script_hash(&from).unwrap().as_bytes());

    tx.sign(&sender);
    let parsed = Transaction::from_hex(&tx.to_hex()).unwrap();
    assert_eq!(parsed.hash(), tx.hash());
}

#[test]
fn test_custom_fee_policy() {
    let from = public_key_to_address(&key(5).public_key());
    let mut client = MockClient {
        gas_consumed: Some(amount("0.4")),
        vm_state: "HALT".to_string(),
        ..Default::default()
    };
    client
        .balances
        .insert(from.clone(), vec![Balance { asset_id: GAS_ASSET_ID, unspent: unspent(&["3"]) }]);
    let policy = FeePolicy::from_json(r#"{"free_gas": "0"}"#).unwrap();
    let builder = TransactionBuilder::with_policy(client, policy);
    let tx = builder.build_script_transaction(&from, vec![0x61], Fixed8::ZERO).unwrap();
    match &tx.data {
        TransactionData::Invocation { gas, .. } => assert_eq!(*gas, Fixed8::ONE),
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(tx.outputs[0].value, amount("2"));
}

#[test]
fn test_multi_sig_and_single_sig_witnesses_are_sorted() {
    let keys: Vec<PrivateKey> = (10..14).map(key).collect();
    let publics: Vec<PublicKey> = keys.iter().map(PrivateKey::public_key).collect();

    let mut tx = Transaction::contract();
    tx.outputs.push(TransactionOutput {
        asset_id: GAS_ASSET_ID,
        value: Fixed8::ONE,
        script_hash: Hash160::from_bytes([9; 20]),
    });
    tx.sign_multi(3, &publics, &keys[..3]).unwrap();
    assert_eq!(tx.witnesses[0].invocation_script.len(), 3 * 65);
    assert_eq!(tx.witnesses[0].verification_script.len(), 1 + 34 * 4 + 1 + 1);

    tx.sign(&key(20));
    tx.sign(&key(21));
    assert_eq!(tx.witnesses.len(), 3);
    for pair in tx.witnesses.windows(2) {
        assert!(pair[0].script_hash().to_reversed_hex() < pair[1].script_hash().to_reversed_hex());
    }
    assert!(tx.verify_witnesses());
}

#[test]
fn test_witnesses_serialize_in_numeric_script_hash_order() {
    let mut tx = Transaction::contract();
    // stored bytes start da.. and 69.., but display order is 4b5acd30.. < b93c2a10..
    tx.add_witness(Witness::new(Vec::new(), vec![0x52]));
    tx.add_witness(Witness::new(Vec::new(), vec![0x51]));
    let bytes = tx.to_bytes();
    // ..., witness count 2, then [00 01 51] [00 01 52]
    assert_eq!(hex::encode(&bytes[bytes.len() - 7..]), "02000151000152");
}

#[test]
fn test_transport_failure_surfaces() {
    let from = public_key_to_address(&key(1).public_key());
    let client = MockClient { transport_down: true, ..Default::default() };
    let builder = TransactionBuilder::new(client);
    let err = builder
        .build_contract_transaction(&from, &from, &NEO_ASSET_ID, Fixed8::ONE, Fixed8::ZERO, None)
        .unwrap_err();
    match err {
        TxError::Transport(e) => assert_eq!(e.to_string(), "connection reset by peer"),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_rpc_error_payload_surfaces() {
    let from = public_key_to_address(&key(1).public_key());
    let client = MockClient { rpc_error: Some((-100, "Unknown address".to_string())), ..Default::default() };
    let builder = TransactionBuilder::new(client);
    let err = builder.build_claim_transaction(&from, None).unwrap_err();
    assert!(matches!(err, TxError::Rpc { code: -100, ref message } if message == "Unknown address"));
}

#[test]
fn test_insufficient_balance_surfaces() {
    let from = public_key_to_address(&key(1).public_key());
    let mut client = MockClient::default();
    client
        .balances
        .insert(from.clone(), vec![Balance { asset_id: NEO_ASSET_ID, unspent: unspent(&["1"]) }]);
    let builder = TransactionBuilder::new(client);
    let err = builder
        .build_contract_transaction(&from, &from, &NEO_ASSET_ID, amount("2"), Fixed8::ZERO, None)
        .unwrap_err();
    assert!(matches!(err, TxError::InsufficientBalance { .. }));
}
