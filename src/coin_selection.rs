//! Deterministic unspent-output selection
//!
//! Given unspent outputs U and a target t:
//! 1. Σ U < t                → insufficient balance
//! 2. Σ U = t                → all of U
//! 3. sort U descending (stable), take the longest prefix whose every
//!    element is ≤ the amount still missing
//! 4. if something is still missing, add the smallest u ∈ U with u ≥ missing

use crate::error::{Result, TxError};
use crate::fixed8::Fixed8;
use crate::rpc::UnspentOutput;
use crate::transaction::CoinReference;

/// Outputs chosen to fund a payment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub inputs: Vec<CoinReference>,
    pub total: Fixed8,
}

impl Selection {
    /// Amount left over above `target`.
    pub fn change(&self, target: Fixed8) -> Result<Fixed8> {
        self.total.checked_sub(target)
    }
}

fn reference(u: &UnspentOutput) -> CoinReference {
    CoinReference { prev_hash: u.tx_id, prev_index: u.index }
}

/// Select unspent outputs covering `target`.
///
/// A zero target selects nothing.
pub fn select_unspent(unspent: &[UnspentOutput], target: Fixed8) -> Result<Selection> {
    if target <= Fixed8::ZERO {
        return Ok(Selection::default());
    }

    let available = Fixed8::checked_sum(unspent.iter().map(|u| u.value))?;
    if available < target {
        return Err(TxError::InsufficientBalance {
            requested: target.to_string(),
            available: available.to_string(),
        });
    }
    if available == target {
        return Ok(Selection { inputs: unspent.iter().map(reference).collect(), total: available });
    }

    let mut sorted: Vec<&UnspentOutput> = unspent.iter().collect();
    sorted.sort_by(|a, b| b.value.cmp(&a.value));

    let mut selected = Vec::new();
    let mut total = Fixed8::ZERO;
    let mut missing = target;
    let mut taken = 0;
    for u in &sorted {
        if missing <= Fixed8::ZERO || u.value > missing {
            break;
        }
        selected.push(reference(u));
        total = total.checked_add(u.value)?;
        missing = missing.checked_sub(u.value)?;
        taken += 1;
    }

    if missing > Fixed8::ZERO {
        let closer = sorted[taken..]
            .iter()
            .rev()
            .find(|u| u.value >= missing)
            .ok_or_else(|| TxError::InsufficientBalance {
                requested: target.to_string(),
                available: available.to_string(),
            })?;
        selected.push(reference(closer));
        total = total.checked_add(closer.value)?;
    }

    Ok(Selection { inputs: selected, total })
}
