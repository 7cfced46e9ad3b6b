//! Error types for transaction construction and encoding

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TxError {
    #[error("Unexpected end of input: needed {needed} bytes, {remaining} remaining")]
    Truncated { needed: usize, remaining: usize },

    #[error("Unknown attribute usage: 0x{0:02x}")]
    UnknownAttributeUsage(u8),

    #[error("Unknown transaction type: 0x{0:02x}")]
    UnknownTransactionType(u8),

    #[error("Unknown state descriptor type: 0x{0:02x}")]
    UnknownStateType(u8),

    #[error("Trailing data: {0} bytes after end of structure")]
    TrailingBytes(usize),

    #[error("Format error: padding must equal {expected}, got {found}")]
    InvalidPadding { expected: u8, found: u8 },

    #[error("Invalid attribute payload for {usage}: {reason}")]
    InvalidAttribute { usage: String, reason: String },

    #[error("Invalid script hash length: expected 20 bytes, got {0}")]
    InvalidScriptHashLength(usize),

    #[error("Invalid hash: {0}")]
    InvalidHash(String),

    #[error("Invalid string encoding: {0}")]
    InvalidString(String),

    #[error("Syscall name too long: {0} bytes")]
    SyscallTooLong(usize),

    #[error("Fixed-point overflow: {0}")]
    Overflow(String),

    #[error("Malformed decimal: {0}")]
    MalformedDecimal(String),

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance { requested: String, available: String },

    #[error("Asset not found in balance: {0}")]
    AssetNotFound(String),

    #[error("Nothing to claim for {0}")]
    NothingToClaim(String),

    #[error("Not enough signers: {provided} provided, {required} required")]
    NotEnoughSigners { provided: usize, required: usize },

    #[error("Invalid multi-signature parameters: {0}")]
    InvalidMultiSig(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid fee policy: {0}")]
    InvalidConfig(String),

    #[error("Network fee did not settle after {0} rounds")]
    FeeNotSettled(usize),

    #[error("Script simulation faulted: {0}")]
    ScriptFault(String),

    #[error("Transport error: {0}")]
    Transport(#[from] anyhow::Error),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

pub type Result<T> = std::result::Result<T, TxError>;
