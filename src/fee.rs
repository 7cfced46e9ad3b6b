//! Network fee arithmetic
//!
//! Invocation fee = ⌈max(0, gas_consumed − free_gas)⌉ + size_fee(size)
//!
//! size_fee(s) = 0                                              if s ≤ max_free_tx_size
//!             = low_priority_threshold + per_byte × (s − max)   otherwise

use serde::{Deserialize, Serialize};

use crate::codec::VarInt;
use crate::constants::*;
use crate::error::{Result, TxError};
use crate::fixed8::Fixed8;
use crate::transaction::Transaction;

/// Tunable fee constants; defaults match the public network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeePolicy {
    pub free_gas: Fixed8,
    pub max_free_tx_size: usize,
    pub fee_per_extra_byte: Fixed8,
    pub low_priority_threshold: Fixed8,
}

impl Default for FeePolicy {
    fn default() -> Self {
        FeePolicy {
            free_gas: FREE_GAS,
            max_free_tx_size: MAX_FREE_TX_SIZE,
            fee_per_extra_byte: FEE_PER_EXTRA_BYTE,
            low_priority_threshold: LOW_PRIORITY_THRESHOLD,
        }
    }
}

impl FeePolicy {
    /// Load a policy from JSON; missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| TxError::InvalidConfig(e.to_string()))
    }

    /// Gas to declare for an invocation that consumed `consumed` in
    /// simulation. Rounded up to a whole unit, never down.
    pub fn invocation_gas(&self, consumed: Fixed8) -> Result<Fixed8> {
        let billable = consumed.checked_sub(self.free_gas)?;
        if billable <= Fixed8::ZERO {
            return Ok(Fixed8::ZERO);
        }
        billable.ceil()
    }

    /// Surcharge for a transaction of `size` bytes.
    pub fn size_fee(&self, size: usize) -> Result<Fixed8> {
        if size <= self.max_free_tx_size {
            return Ok(Fixed8::ZERO);
        }
        let extra = (size - self.max_free_tx_size) as i64;
        self.low_priority_threshold
            .checked_add(self.fee_per_extra_byte.checked_mul_int(extra)?)
    }
}

/// Size `tx` will have once one single-signature witness is attached.
pub fn estimated_signed_size(tx: &Transaction) -> usize {
    tx.unsigned_size() + VarInt::from(1usize).size() + SINGLE_SIG_WITNESS_SIZE
}
