//! # neo-tx-core
//!
//! Transaction construction, serialization and signing for the legacy
//! UTXO-model NEO ledger.
//!
//! ## Architecture
//!
//! Leaf modules first:
//! - `codec`, `fixed8`, `types`: wire primitives and amounts
//! - `script`, `opcode`: VM bytecode emission
//! - `crypto`, `address`: P-256 keys, hashing, Base58Check
//! - `attribute`, `transaction`, `witness`, `block`: the wire model
//! - `fee`, `coin_selection`, `rpc`, `builder`: assembling unsigned
//!   transactions against a caller-supplied chain client
//!
//! ## Design Principles
//!
//! 1. **Bit-exact wire format**: the unsigned form is the hash pre-image and
//!    the signing message, so encoding is deterministic
//! 2. **No floating point**: every amount is a checked 8-decimal fixed-point
//! 3. **Injected collaborators**: the builder owns no transport; it calls a
//!    [`ChainClient`] supplied at construction
//!
//! ## Usage
//!
//! ```rust
//! use neo_tx_core::*;
//!
//! let key = PrivateKey::from_bytes(&[7u8; 32]).unwrap();
//! let recipient = Hash160::from_bytes([1u8; 20]);
//!
//! let mut tx = Transaction::contract();
//! tx.inputs.push(CoinReference { prev_hash: Hash256::from_bytes([2u8; 32]), prev_index: 0 });
//! tx.outputs.push(TransactionOutput {
//!     asset_id: NEO_ASSET_ID,
//!     value: Fixed8::from_int(1).unwrap(),
//!     script_hash: recipient,
//! });
//!
//! let id = tx.id();
//! tx.sign(&key);
//! assert!(tx.verify_witnesses());
//!
//! let parsed = Transaction::from_hex(&tx.to_hex()).unwrap();
//! assert_eq!(parsed.id(), id);
//! ```

pub mod address;
pub mod attribute;
pub mod block;
pub mod builder;
pub mod codec;
pub mod coin_selection;
pub mod constants;
pub mod crypto;
pub mod error;
pub mod fee;
pub mod fixed8;
pub mod opcode;
pub mod rpc;
pub mod script;
pub mod transaction;
pub mod types;
pub mod witness;

// Re-export commonly used types
pub use address::{address_to_script_hash, public_key_to_address, script_hash_to_address};
pub use attribute::{Attribute, AttributeUsage};
pub use block::{Block, BlockHeader};
pub use builder::TransactionBuilder;
pub use codec::{BinaryReader, BinaryWriter, Decodable, Encodable};
pub use coin_selection::{select_unspent, Selection};
pub use constants::*;
pub use crypto::{PrivateKey, PublicKey};
pub use error::{Result, TxError};
pub use fee::FeePolicy;
pub use fixed8::Fixed8;
pub use rpc::{ChainClient, RpcError, RpcResponse};
pub use script::{ContractParameter, ScriptBuilder};
pub use transaction::{
    CoinReference, StateDescriptor, StateType, Transaction, TransactionData, TransactionOutput,
    TransactionType,
};
pub use types::{Hash160, Hash256};
pub use witness::Witness;
