//! Protocol constants for the legacy UTXO ledger

use crate::fixed8::Fixed8;
use crate::types::Hash256;

/// Governing token asset id (stored byte order).
///
/// Display form: `c56f33fc6ecfcd0c225c4ab356fee59390af8560be0e930faebe74a6daff7c9b`
pub const NEO_ASSET_ID: Hash256 = Hash256::from_bytes([
    0x9b, 0x7c, 0xff, 0xda, 0xa6, 0x74, 0xbe, 0xae,
    0x0f, 0x93, 0x0e, 0xbe, 0x60, 0x85, 0xaf, 0x90,
    0x93, 0xe5, 0xfe, 0x56, 0xb3, 0x4a, 0x5c, 0x22,
    0x0c, 0xcd, 0xcf, 0x6e, 0xfc, 0x33, 0x6f, 0xc5,
]);

/// Utility token (fee asset) id (stored byte order).
///
/// Display form: `602c79718b16e442de58778e148d0b1084e3b2dffd5de6b7b16cee7969282de7`
pub const GAS_ASSET_ID: Hash256 = Hash256::from_bytes([
    0xe7, 0x2d, 0x28, 0x69, 0x79, 0xee, 0x6c, 0xb1,
    0xb7, 0xe6, 0x5d, 0xfd, 0xdf, 0xb2, 0xe3, 0x84,
    0x10, 0x0b, 0x8d, 0x14, 0x8e, 0x77, 0x58, 0xde,
    0x42, 0xe4, 0x16, 0x8b, 0x71, 0x79, 0x2c, 0x60,
]);

/// Base58Check version byte for addresses
pub const ADDRESS_VERSION: u8 = 0x17;

/// Base58Check version byte for WIF private keys
pub const WIF_VERSION: u8 = 0x80;

/// Trailing WIF byte marking a compressed public key
pub const WIF_COMPRESSED_FLAG: u8 = 0x01;

/// Fixed-point scale: 10^8 units per whole token
pub const FIXED8_DECIMALS: u32 = 8;
pub const FIXED8_FACTOR: i64 = 100_000_000;

/// Gas every invocation may consume for free
pub const FREE_GAS: Fixed8 = Fixed8::from_raw(10 * FIXED8_FACTOR);

/// Transactions up to this many bytes relay without a size surcharge
pub const MAX_FREE_TX_SIZE: usize = 1024;

/// Surcharge per byte above `MAX_FREE_TX_SIZE`: 0.00001
pub const FEE_PER_EXTRA_BYTE: Fixed8 = Fixed8::from_raw(1_000);

/// Minimum fee once a transaction is over the free size: 0.001
pub const LOW_PRIORITY_THRESHOLD: Fixed8 = Fixed8::from_raw(100_000);

/// Maximum number of claimed outputs in one claim transaction
pub const MAX_CLAIMS: usize = 50;

/// Longest uncompressed syscall name
pub const MAX_SYSCALL_NAME_LEN: usize = 252;

/// Compressed public key length (SEC1)
pub const PUBLIC_KEY_LEN: usize = 33;

/// Raw `r || s` signature length
pub const SIGNATURE_LEN: usize = 64;

/// PUSHBYTES64 + signature
pub const SIGNATURE_PUSH_LEN: usize = SIGNATURE_LEN + 1;

/// PUSHBYTES33 + compressed public key
pub const PUBLIC_KEY_PUSH_LEN: usize = PUBLIC_KEY_LEN + 1;

/// Size of a single-signature witness on the wire:
/// VarBytes(65-byte invocation) + VarBytes(35-byte verification)
pub const SINGLE_SIG_WITNESS_SIZE: usize = 1 + SIGNATURE_PUSH_LEN + 1 + PUBLIC_KEY_PUSH_LEN + 1;
