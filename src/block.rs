//! Block and block header codec
//!
//! Header layout:
//!
//! ```text
//! version:u32 prev_hash:32 merkle_root:32 timestamp:u32 index:u32
//! consensus_data:u64 next_consensus:20 | padding:u8(=1) witness
//! ```
//!
//! Only the fields left of `|` are hashed. A block is the header followed by
//! its transaction list; a standalone header carries a trailing zero count.

use serde::{Deserialize, Serialize};

use crate::codec::{BinaryReader, BinaryWriter, Decodable, Encodable};
use crate::crypto::double_sha256;
use crate::error::{Result, TxError};
use crate::transaction::Transaction;
use crate::types::{Hash160, Hash256};
use crate::witness::Witness;

const HEADER_PADDING: u8 = 1;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub version: u32,
    pub prev_hash: Hash256,
    pub merkle_root: Hash256,
    pub timestamp: u32,
    pub index: u32,
    pub consensus_data: u64,
    pub next_consensus: Hash160,
    pub witness: Witness,
}

impl BlockHeader {
    fn encode_hashable(&self, writer: &mut BinaryWriter) {
        writer.write_u32(self.version);
        self.prev_hash.encode(writer);
        self.merkle_root.encode(writer);
        writer.write_u32(self.timestamp);
        writer.write_u32(self.index);
        writer.write_u64(self.consensus_data);
        self.next_consensus.encode(writer);
    }

    /// Bytes signed by the consensus witness.
    pub fn hashable_bytes(&self) -> Vec<u8> {
        let mut writer = BinaryWriter::new();
        self.encode_hashable(&mut writer);
        writer.into_bytes()
    }

    pub fn hash(&self) -> Hash256 {
        double_sha256(&self.hashable_bytes())
    }

    /// Standalone header wire form: the header followed by a zero
    /// transaction count.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = BinaryWriter::new();
        self.encode(&mut writer);
        writer.write_u8(0);
        writer.into_bytes()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut reader = BinaryReader::new(bytes);
        let header = BlockHeader::decode(&mut reader)?;
        let count = reader.read_u8()?;
        if count != 0 {
            return Err(TxError::InvalidPadding { expected: 0, found: count });
        }
        if !reader.is_empty() {
            return Err(TxError::TrailingBytes(reader.remaining()));
        }
        Ok(header)
    }
}

impl Encodable for BlockHeader {
    fn encode(&self, writer: &mut BinaryWriter) {
        self.encode_hashable(writer);
        writer.write_u8(HEADER_PADDING);
        self.witness.encode(writer);
    }
}

impl Decodable for BlockHeader {
    fn decode(reader: &mut BinaryReader<'_>) -> Result<Self> {
        let version = reader.read_u32()?;
        let prev_hash = reader.read_hash256()?;
        let merkle_root = reader.read_hash256()?;
        let timestamp = reader.read_u32()?;
        let index = reader.read_u32()?;
        let consensus_data = reader.read_u64()?;
        let next_consensus = reader.read_hash160()?;
        let padding = reader.read_u8()?;
        if padding != HEADER_PADDING {
            return Err(TxError::InvalidPadding { expected: HEADER_PADDING, found: padding });
        }
        let witness = Witness::decode(reader)?;
        Ok(BlockHeader {
            version,
            prev_hash,
            merkle_root,
            timestamp,
            index,
            consensus_data,
            next_consensus,
            witness,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    pub transactions: Vec<Transaction>,
}

impl Block {
    pub fn hash(&self) -> Hash256 {
        self.header.hash()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.encoded_bytes()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut reader = BinaryReader::new(bytes);
        let block = Block::decode(&mut reader)?;
        if !reader.is_empty() {
            return Err(TxError::TrailingBytes(reader.remaining()));
        }
        Ok(block)
    }

    /// Merkle root over the transaction hashes.
    pub fn compute_merkle_root(&self) -> Hash256 {
        let hashes: Vec<Hash256> = self.transactions.iter().map(Transaction::hash).collect();
        merkle_root(&hashes)
    }
}

impl Encodable for Block {
    fn encode(&self, writer: &mut BinaryWriter) {
        self.header.encode(writer);
        writer.write_list(&self.transactions);
    }
}

impl Decodable for Block {
    fn decode(reader: &mut BinaryReader<'_>) -> Result<Self> {
        let header = BlockHeader::decode(reader)?;
        let transactions = reader.read_list()?;
        Ok(Block { header, transactions })
    }
}

/// Pairwise double SHA-256 up to a single root; an odd level duplicates its
/// last hash. Empty input gives the zero hash.
pub fn merkle_root(hashes: &[Hash256]) -> Hash256 {
    if hashes.is_empty() {
        return Hash256::default();
    }
    let mut level: Vec<Hash256> = hashes.to_vec();
    while level.len() > 1 {
        level = level
            .chunks(2)
            .map(|pair| {
                let left = &pair[0];
                let right = pair.get(1).unwrap_or(left);
                let mut concat = Vec::with_capacity(64);
                concat.extend_from_slice(left.as_bytes());
                concat.extend_from_slice(right.as_bytes());
                double_sha256(&concat)
            })
            .collect();
    }
    level[0]
}
