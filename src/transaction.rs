//! Transaction model and wire codec
//!
//! Every variant shares one layout:
//!
//! ```text
//! type:u8 version:u8 <exclusive data> attributes inputs outputs [witnesses]
//! ```
//!
//! Everything before the witness list is the unsigned form. Its double
//! SHA-256 is the transaction hash, and it is the message every witness signs.

use serde::{Deserialize, Serialize};

use crate::attribute::{hex_bytes, Attribute};
use crate::codec::{var_bytes_size, BinaryReader, BinaryWriter, Decodable, Encodable, VarInt};
use crate::crypto::{double_sha256, PrivateKey, PublicKey};
use crate::error::{Result, TxError};
use crate::fixed8::Fixed8;
use crate::types::{Hash160, Hash256};
use crate::witness::{sort_witnesses, Witness};

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionType {
    Miner = 0x00,
    Issue = 0x01,
    Claim = 0x02,
    Contract = 0x80,
    State = 0x90,
    Invocation = 0xd1,
}

impl TryFrom<u8> for TransactionType {
    type Error = TxError;

    fn try_from(b: u8) -> Result<Self> {
        match b {
            0x00 => Ok(TransactionType::Miner),
            0x01 => Ok(TransactionType::Issue),
            0x02 => Ok(TransactionType::Claim),
            0x80 => Ok(TransactionType::Contract),
            0x90 => Ok(TransactionType::State),
            0xd1 => Ok(TransactionType::Invocation),
            other => Err(TxError::UnknownTransactionType(other)),
        }
    }
}

/// Input: reference to output `prev_index` of transaction `prev_hash`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CoinReference {
    pub prev_hash: Hash256,
    pub prev_index: u16,
}

impl Encodable for CoinReference {
    fn encode(&self, writer: &mut BinaryWriter) {
        self.prev_hash.encode(writer);
        writer.write_u16(self.prev_index);
    }
}

impl Decodable for CoinReference {
    fn decode(reader: &mut BinaryReader<'_>) -> Result<Self> {
        let prev_hash = reader.read_hash256()?;
        let prev_index = reader.read_u16()?;
        Ok(CoinReference { prev_hash, prev_index })
    }
}

/// Output: `value` of `asset_id` paid to `script_hash`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionOutput {
    pub asset_id: Hash256,
    pub value: Fixed8,
    pub script_hash: Hash160,
}

impl TransactionOutput {
    pub const SIZE: usize = 32 + 8 + 20;
}

impl Encodable for TransactionOutput {
    fn encode(&self, writer: &mut BinaryWriter) {
        self.asset_id.encode(writer);
        writer.write_i64(self.value.raw_value());
        self.script_hash.encode(writer);
    }
}

impl Decodable for TransactionOutput {
    fn decode(reader: &mut BinaryReader<'_>) -> Result<Self> {
        let asset_id = reader.read_hash256()?;
        let value = Fixed8::from_raw(reader.read_i64()?);
        let script_hash = reader.read_hash160()?;
        Ok(TransactionOutput { asset_id, value, script_hash })
    }
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateType {
    Account = 0x40,
    Validator = 0x48,
}

impl TryFrom<u8> for StateType {
    type Error = TxError;

    fn try_from(b: u8) -> Result<Self> {
        match b {
            0x40 => Ok(StateType::Account),
            0x48 => Ok(StateType::Validator),
            other => Err(TxError::UnknownStateType(other)),
        }
    }
}

/// One state change carried by a State transaction (votes, registrations).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateDescriptor {
    pub descriptor_type: StateType,
    #[serde(with = "hex_bytes")]
    pub key: Vec<u8>,
    pub field: String,
    #[serde(with = "hex_bytes")]
    pub value: Vec<u8>,
}

impl Encodable for StateDescriptor {
    fn encode(&self, writer: &mut BinaryWriter) {
        writer.write_u8(self.descriptor_type as u8);
        writer.write_var_bytes(&self.key);
        writer.write_var_string(&self.field);
        writer.write_var_bytes(&self.value);
    }
}

impl Decodable for StateDescriptor {
    fn decode(reader: &mut BinaryReader<'_>) -> Result<Self> {
        let descriptor_type = StateType::try_from(reader.read_u8()?)?;
        let key = reader.read_var_bytes()?;
        let field = reader.read_var_string()?;
        let value = reader.read_var_bytes()?;
        Ok(StateDescriptor { descriptor_type, key, field, value })
    }
}

/// Variant-specific payload ("exclusive data").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TransactionData {
    Miner { nonce: u32 },
    Issue,
    Claim { claims: Vec<CoinReference> },
    Contract,
    State { descriptors: Vec<StateDescriptor> },
    Invocation {
        #[serde(with = "hex_bytes")]
        script: Vec<u8>,
        gas: Fixed8,
    },
}

impl TransactionData {
    pub fn transaction_type(&self) -> TransactionType {
        match self {
            TransactionData::Miner { .. } => TransactionType::Miner,
            TransactionData::Issue => TransactionType::Issue,
            TransactionData::Claim { .. } => TransactionType::Claim,
            TransactionData::Contract => TransactionType::Contract,
            TransactionData::State { .. } => TransactionType::State,
            TransactionData::Invocation { .. } => TransactionType::Invocation,
        }
    }

    fn encode(&self, version: u8, writer: &mut BinaryWriter) {
        match self {
            TransactionData::Miner { nonce } => writer.write_u32(*nonce),
            TransactionData::Issue | TransactionData::Contract => {}
            TransactionData::Claim { claims } => writer.write_list(claims),
            TransactionData::State { descriptors } => writer.write_list(descriptors),
            TransactionData::Invocation { script, gas } => {
                writer.write_var_bytes(script);
                if version >= 1 {
                    writer.write_i64(gas.raw_value());
                }
            }
        }
    }

    fn decode(tx_type: TransactionType, version: u8, reader: &mut BinaryReader<'_>) -> Result<Self> {
        Ok(match tx_type {
            TransactionType::Miner => TransactionData::Miner { nonce: reader.read_u32()? },
            TransactionType::Issue => TransactionData::Issue,
            TransactionType::Claim => TransactionData::Claim { claims: reader.read_list()? },
            TransactionType::Contract => TransactionData::Contract,
            TransactionType::State => TransactionData::State { descriptors: reader.read_list()? },
            TransactionType::Invocation => {
                let script = reader.read_var_bytes()?;
                let gas = if version >= 1 {
                    Fixed8::from_raw(reader.read_i64()?)
                } else {
                    Fixed8::ZERO
                };
                TransactionData::Invocation { script, gas }
            }
        })
    }

    fn size(&self, version: u8) -> usize {
        match self {
            TransactionData::Miner { .. } => 4,
            TransactionData::Issue | TransactionData::Contract => 0,
            TransactionData::Claim { claims } => VarInt::from(claims.len()).size() + claims.len() * 34,
            TransactionData::State { descriptors } => {
                VarInt::from(descriptors.len()).size()
                    + descriptors
                        .iter()
                        .map(|d| {
                            1 + var_bytes_size(d.key.len())
                                + var_bytes_size(d.field.len())
                                + var_bytes_size(d.value.len())
                        })
                        .sum::<usize>()
            }
            TransactionData::Invocation { script, .. } => {
                var_bytes_size(script.len()) + if version >= 1 { 8 } else { 0 }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Format version. Invocation gas is only on the wire from version 1;
    /// at version 0 a non-zero gas is not encoded and decodes back as zero.
    pub version: u8,
    pub data: TransactionData,
    pub attributes: Vec<Attribute>,
    pub inputs: Vec<CoinReference>,
    pub outputs: Vec<TransactionOutput>,
    pub witnesses: Vec<Witness>,
}

impl Transaction {
    /// Empty transaction around `data`; invocations default to version 1 so
    /// their gas field is carried.
    pub fn new(data: TransactionData) -> Self {
        let version = match data {
            TransactionData::Invocation { .. } => 1,
            _ => 0,
        };
        Transaction {
            version,
            data,
            attributes: Vec::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            witnesses: Vec::new(),
        }
    }

    pub fn contract() -> Self {
        Self::new(TransactionData::Contract)
    }

    pub fn claim(claims: Vec<CoinReference>) -> Self {
        Self::new(TransactionData::Claim { claims })
    }

    /// Version 1 invocation. Lowering `version` to 0 drops `gas` from the
    /// encoding, so only do that for zero-gas scripts.
    pub fn invocation(script: Vec<u8>, gas: Fixed8) -> Self {
        Self::new(TransactionData::Invocation { script, gas })
    }

    pub fn miner(nonce: u32) -> Self {
        Self::new(TransactionData::Miner { nonce })
    }

    pub fn issue() -> Self {
        Self::new(TransactionData::Issue)
    }

    pub fn state(descriptors: Vec<StateDescriptor>) -> Self {
        Self::new(TransactionData::State { descriptors })
    }

    pub fn transaction_type(&self) -> TransactionType {
        self.data.transaction_type()
    }

    pub fn is_signed(&self) -> bool {
        !self.witnesses.is_empty()
    }

    /// Write the unsigned form: everything except the witness list.
    pub fn encode_unsigned(&self, writer: &mut BinaryWriter) {
        writer.write_u8(self.transaction_type() as u8);
        writer.write_u8(self.version);
        self.data.encode(self.version, writer);
        writer.write_list(&self.attributes);
        writer.write_list(&self.inputs);
        writer.write_list(&self.outputs);
    }

    /// The signing pre-image.
    pub fn unsigned_bytes(&self) -> Vec<u8> {
        let mut writer = BinaryWriter::with_capacity(self.unsigned_size());
        self.encode_unsigned(&mut writer);
        writer.into_bytes()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.encoded_bytes()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Decode a complete signed transaction; trailing bytes are an error.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut reader = BinaryReader::new(bytes);
        let tx = Transaction::decode(&mut reader)?;
        if !reader.is_empty() {
            return Err(TxError::TrailingBytes(reader.remaining()));
        }
        Ok(tx)
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s).map_err(|e| TxError::MalformedResponse(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    /// Decode only the unsigned shape (no witness list).
    pub fn decode_unsigned(reader: &mut BinaryReader<'_>) -> Result<Self> {
        let tx_type = TransactionType::try_from(reader.read_u8()?)?;
        let version = reader.read_u8()?;
        let data = TransactionData::decode(tx_type, version, reader)?;
        let attributes = reader.read_list()?;
        let inputs = reader.read_list()?;
        let outputs = reader.read_list()?;
        Ok(Transaction { version, data, attributes, inputs, outputs, witnesses: Vec::new() })
    }

    /// SHA256(SHA256(unsigned form)). Witnesses never affect it.
    pub fn hash(&self) -> Hash256 {
        double_sha256(&self.unsigned_bytes())
    }

    /// Transaction id as shown by explorers and RPC nodes.
    pub fn id(&self) -> String {
        self.hash().to_reversed_hex()
    }

    pub fn unsigned_size(&self) -> usize {
        2 + self.data.size(self.version)
            + VarInt::from(self.attributes.len()).size()
            + self.attributes.iter().map(Attribute::size).sum::<usize>()
            + VarInt::from(self.inputs.len()).size()
            + self.inputs.len() * 34
            + VarInt::from(self.outputs.len()).size()
            + self.outputs.len() * TransactionOutput::SIZE
    }

    /// Serialized size including witnesses.
    pub fn size(&self) -> usize {
        self.unsigned_size()
            + VarInt::from(self.witnesses.len()).size()
            + self.witnesses.iter().map(Witness::size).sum::<usize>()
    }

    /// Attach a witness, keeping the list ordered by script hash.
    pub fn add_witness(&mut self, witness: Witness) {
        self.witnesses.push(witness);
        sort_witnesses(&mut self.witnesses);
    }

    /// Sign the unsigned form with `key` and attach the witness.
    pub fn sign(&mut self, key: &PrivateKey) {
        let witness = Witness::create_signature(&self.unsigned_bytes(), key);
        self.add_witness(witness);
    }

    /// Attach an M-of-N witness produced by `signers`.
    pub fn sign_multi(
        &mut self,
        threshold: usize,
        public_keys: &[PublicKey],
        signers: &[PrivateKey],
    ) -> Result<()> {
        let witness = Witness::create_multi_sig(threshold, public_keys, signers, &self.unsigned_bytes())?;
        self.add_witness(witness);
        Ok(())
    }

    /// Every attached witness signs this transaction's unsigned form.
    pub fn verify_witnesses(&self) -> bool {
        let message = self.unsigned_bytes();
        self.is_signed() && self.witnesses.iter().all(|w| w.verify(&message))
    }

    /// Sum of outputs paying `asset_id`.
    pub fn output_total(&self, asset_id: &Hash256) -> Result<Fixed8> {
        Fixed8::checked_sum(self.outputs.iter().filter(|o| o.asset_id == *asset_id).map(|o| o.value))
    }
}

impl Encodable for Transaction {
    fn encode(&self, writer: &mut BinaryWriter) {
        self.encode_unsigned(writer);
        writer.write_list(&self.witnesses);
    }
}

impl Decodable for Transaction {
    fn decode(reader: &mut BinaryReader<'_>) -> Result<Self> {
        let mut tx = Transaction::decode_unsigned(reader)?;
        tx.witnesses = reader.read_list()?;
        Ok(tx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::AttributeUsage;
    use crate::constants::*;

    fn sample_output() -> TransactionOutput {
        TransactionOutput {
            asset_id: GAS_ASSET_ID,
            value: Fixed8::from_int(7).unwrap(),
            script_hash: Hash160::from_bytes([0x0a; 20]),
        }
    }

    fn sample_input(n: u8) -> CoinReference {
        CoinReference { prev_hash: Hash256::from_bytes([n; 32]), prev_index: n as u16 }
    }

    fn roundtrip(tx: &Transaction) -> Transaction {
        let bytes = tx.to_bytes();
        assert_eq!(bytes.len(), tx.size());
        Transaction::from_bytes(&bytes).unwrap()
    }

    #[test]
    fn test_contract_transaction_layout() {
        let mut tx = Transaction::contract();
        tx.inputs.push(sample_input(1));
        tx.outputs.push(sample_output());
        let bytes = tx.unsigned_bytes();
        assert_eq!(bytes[0], 0x80);
        assert_eq!(bytes[1], 0x00);
        // no exclusive data: attribute count follows the version
        assert_eq!(bytes[2], 0x00);
        assert_eq!(bytes[3], 0x01);
        assert_eq!(&bytes[4..36], &[1u8; 32]);
        assert_eq!(&bytes[36..38], &[0x01, 0x00]);
        assert_eq!(bytes[38], 0x01);
        assert_eq!(&bytes[39..71], GAS_ASSET_ID.as_bytes());
        assert_eq!(&bytes[71..79], &700_000_000i64.to_le_bytes());
        assert_eq!(&bytes[79..99], &[0x0a; 20]);
        assert_eq!(bytes.len(), 99);
        assert_eq!(tx.unsigned_size(), 99);
    }

    #[test]
    fn test_every_variant_roundtrips() {
        let variants = vec![
            Transaction::miner(0xdeadbeef),
            Transaction::issue(),
            Transaction::claim(vec![sample_input(3), sample_input(4)]),
            Transaction::contract(),
            Transaction::state(vec![StateDescriptor {
                descriptor_type: StateType::Account,
                key: vec![0x01; 20],
                field: "Votes".to_string(),
                value: vec![0x02, 0x03],
            }]),
            Transaction::invocation(vec![0x51, 0x66], Fixed8::from_int(2).unwrap()),
        ];
        for mut tx in variants {
            tx.attributes.push(Attribute::remark(b"r".to_vec()));
            tx.inputs.push(sample_input(9));
            tx.outputs.push(sample_output());
            tx.add_witness(Witness::new(vec![0x00], vec![0x51]));
            assert_eq!(roundtrip(&tx), tx, "{:?}", tx.transaction_type());
        }
    }

    #[test]
    fn test_invocation_version_zero_has_no_gas_field() {
        let mut tx = Transaction::invocation(vec![0x61], Fixed8::ZERO);
        tx.version = 0;
        let v0 = tx.unsigned_bytes();
        tx.version = 1;
        let v1 = tx.unsigned_bytes();
        assert_eq!(v1.len(), v0.len() + 8);
        assert_eq!(&v0[..4], &[0xd1, 0x00, 0x01, 0x61]);
        let back = Transaction::from_bytes(&roundtrip(&tx).to_bytes()).unwrap();
        assert_eq!(back.version, 1);
    }

    #[test]
    fn test_version_zero_invocation_does_not_carry_gas() {
        let mut tx = Transaction::invocation(vec![0x61], Fixed8::from_int(3).unwrap());
        tx.version = 0;
        let back = Transaction::from_bytes(&tx.to_bytes()).unwrap();
        match back.data {
            TransactionData::Invocation { gas, .. } => assert_eq!(gas, Fixed8::ZERO),
            other => panic!("unexpected {:?}", other),
        }
        assert_ne!(back, tx);

        tx.version = 1;
        assert_eq!(Transaction::from_bytes(&tx.to_bytes()).unwrap(), tx);
    }

    #[test]
    fn test_output_total_overflow_is_an_error() {
        let mut tx = Transaction::contract();
        let big = TransactionOutput { value: Fixed8::MAX, ..sample_output() };
        tx.outputs.push(big.clone());
        tx.outputs.push(big);
        let decoded = Transaction::from_bytes(&tx.to_bytes()).unwrap();
        assert!(matches!(decoded.output_total(&GAS_ASSET_ID), Err(TxError::Overflow(_))));
    }

    #[test]
    fn test_hash_ignores_witnesses() {
        let mut tx = Transaction::contract();
        tx.outputs.push(sample_output());
        let before = tx.hash();
        let key = PrivateKey::from_bytes(&[5; 32]).unwrap();
        tx.sign(&key);
        assert_eq!(tx.hash(), before);
        assert!(tx.is_signed());
        assert!(tx.verify_witnesses());
        assert_eq!(tx.id(), before.to_reversed_hex());
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let mut tx = Transaction::claim(vec![sample_input(1)]);
        tx.outputs.push(sample_output());
        assert_eq!(tx.to_bytes(), tx.to_bytes());
        assert_eq!(tx.hash(), tx.clone().hash());
    }

    #[test]
    fn test_unknown_type_rejected() {
        assert!(matches!(
            Transaction::from_bytes(&[0x20, 0x00, 0x00, 0x00, 0x00, 0x00]),
            Err(TxError::UnknownTransactionType(0x20))
        ));
    }

    #[test]
    fn test_unknown_attribute_rejected() {
        // contract, v0, one attribute with usage 0x10
        let bytes = [0x80, 0x00, 0x01, 0x10, 0x00, 0x00, 0x00, 0x00];
        assert!(matches!(
            Transaction::from_bytes(&bytes),
            Err(TxError::UnknownAttributeUsage(0x10))
        ));
    }

    #[test]
    fn test_truncated_transaction() {
        let mut tx = Transaction::contract();
        tx.outputs.push(sample_output());
        let bytes = tx.to_bytes();
        for cut in [1, 2, 10, bytes.len() - 1] {
            assert!(matches!(
                Transaction::from_bytes(&bytes[..cut]),
                Err(TxError::Truncated { .. })
            ));
        }
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut bytes = Transaction::contract().to_bytes();
        bytes.push(0x00);
        assert!(matches!(Transaction::from_bytes(&bytes), Err(TxError::TrailingBytes(1))));
    }

    #[test]
    fn test_output_total() {
        let mut tx = Transaction::contract();
        tx.outputs.push(sample_output());
        tx.outputs.push(sample_output());
        tx.outputs.push(TransactionOutput { asset_id: NEO_ASSET_ID, ..sample_output() });
        assert_eq!(tx.output_total(&GAS_ASSET_ID).unwrap(), Fixed8::from_int(14).unwrap());
        assert_eq!(tx.output_total(&NEO_ASSET_ID).unwrap(), Fixed8::from_int(7).unwrap());
    }

    #[test]
    fn test_script_attribute_size_accounting() {
        let mut tx = Transaction::invocation(vec![0x00; 300], Fixed8::ZERO);
        tx.attributes.push(Attribute::script(&Hash160::default()));
        tx.attributes.push(Attribute::new(AttributeUsage::DESCRIPTION_URL, vec![1; 10]).unwrap());
        assert_eq!(tx.unsigned_bytes().len(), tx.unsigned_size());
    }

    #[test]
    fn test_serde_json_roundtrip() {
        let mut tx = Transaction::invocation(vec![0x51], Fixed8::from_int(1).unwrap());
        tx.outputs.push(sample_output());
        let json = serde_json::to_string(&tx).unwrap();
        let back: Transaction = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tx);
    }
}
