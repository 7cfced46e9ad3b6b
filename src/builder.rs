//! Transaction builder
//!
//! Turns "pay X of asset A from F to T" style requests into unsigned
//! transactions, consulting the chain collaborator for unspent outputs,
//! claimable gas and script simulation.

use log::{debug, warn};

use crate::address::address_to_script_hash;
use crate::attribute::Attribute;
use crate::coin_selection::{select_unspent, Selection};
use crate::constants::{GAS_ASSET_ID, MAX_CLAIMS};
use crate::error::{Result, TxError};
use crate::fee::{estimated_signed_size, FeePolicy};
use crate::fixed8::Fixed8;
use crate::rpc::{unwrap_response, ChainClient, InvokeResult, UnspentOutput, Unspents};
use crate::script::{build_invocation_script, ContractParameter};
use crate::transaction::{CoinReference, Transaction, TransactionOutput};
use crate::types::{Hash160, Hash256};

/// Upper bound on re-selection rounds while the size surcharge settles.
const MAX_FEE_ROUNDS: usize = 8;

pub struct TransactionBuilder<C: ChainClient> {
    client: C,
    policy: FeePolicy,
}

impl<C: ChainClient> TransactionBuilder<C> {
    pub fn new(client: C) -> Self {
        Self::with_policy(client, FeePolicy::default())
    }

    pub fn with_policy(client: C, policy: FeePolicy) -> Self {
        TransactionBuilder { client, policy }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn policy(&self) -> &FeePolicy {
        &self.policy
    }

    fn unspents(&self, address: &str) -> Result<Unspents> {
        unwrap_response(self.client.get_unspent_outputs(address))
    }

    /// Select inputs of `asset_id` owned by `address` covering `amount`.
    pub fn select_inputs(&self, address: &str, asset_id: &Hash256, amount: Fixed8) -> Result<Selection> {
        let unspents = self.unspents(address)?;
        select_from(&unspents, asset_id, amount)
    }

    /// Plain transfer of `amount` of `asset_id` from `from` to `to`.
    ///
    /// A non-zero `fee` is always paid in the utility token: drawn together
    /// with the payment when the payment is itself in that token, selected
    /// separately otherwise. Change goes back to `change_address`, or to the
    /// sender when none is given.
    pub fn build_contract_transaction(
        &self,
        from: &str,
        to: &str,
        asset_id: &Hash256,
        amount: Fixed8,
        fee: Fixed8,
        change_address: Option<&str>,
    ) -> Result<Transaction> {
        let to_hash = address_to_script_hash(to)?;
        let change_hash = address_to_script_hash(change_address.unwrap_or(from))?;
        let unspents = self.unspents(from)?;

        let mut tx = Transaction::contract();
        tx.outputs.push(TransactionOutput { asset_id: *asset_id, value: amount, script_hash: to_hash });

        if fee > Fixed8::ZERO && *asset_id == GAS_ASSET_ID {
            let target = amount.checked_add(fee)?;
            let selection = select_from(&unspents, asset_id, target)?;
            add_funding(&mut tx, asset_id, &selection, target, &change_hash)?;
        } else {
            let selection = select_from(&unspents, asset_id, amount)?;
            add_funding(&mut tx, asset_id, &selection, amount, &change_hash)?;
            if fee > Fixed8::ZERO {
                let fee_selection = select_from(&unspents, &GAS_ASSET_ID, fee)?;
                add_funding(&mut tx, &GAS_ASSET_ID, &fee_selection, fee, &change_hash)?;
            }
        }

        debug!(
            "contract transaction {}: {} inputs, {} outputs, fee {}",
            tx.id(),
            tx.inputs.len(),
            tx.outputs.len(),
            fee
        );
        Ok(tx)
    }

    /// Call `operation` on `contract` with `args`, funding the simulated gas
    /// plus `fee` from `from`.
    pub fn build_invocation_transaction(
        &self,
        from: &str,
        contract: &Hash160,
        operation: &str,
        args: &[ContractParameter],
        fee: Fixed8,
    ) -> Result<Transaction> {
        let script = build_invocation_script(contract.as_bytes(), operation, args)?;
        self.build_script_transaction(from, script, fee)
    }

    /// Invocation transaction around a prebuilt script.
    pub fn build_script_transaction(&self, from: &str, script: Vec<u8>, fee: Fixed8) -> Result<Transaction> {
        let from_hash = address_to_script_hash(from)?;

        let simulation = self.simulate(&script)?;
        let gas = self.policy.invocation_gas(simulation.gas_consumed)?;
        debug!("simulation consumed {}, declaring gas {}", simulation.gas_consumed, gas);

        let mut tx = Transaction::invocation(script, gas);
        let mut gas_unspent: Option<Vec<UnspentOutput>> = None;
        let mut size_fee = Fixed8::ZERO;

        let mut settled = false;
        for round in 0..MAX_FEE_ROUNDS {
            let required = fee.checked_add(gas)?.checked_add(size_fee)?;
            tx.attributes.clear();
            tx.inputs.clear();
            tx.outputs.clear();
            if required > Fixed8::ZERO {
                if gas_unspent.is_none() {
                    let unspents = self.unspents(from)?;
                    gas_unspent = Some(asset_unspent(&unspents, &GAS_ASSET_ID)?.to_vec());
                }
                let available = gas_unspent.as_deref().unwrap_or(&[]);
                let selection = select_unspent(available, required)?;
                add_funding(&mut tx, &GAS_ASSET_ID, &selection, required, &from_hash)?;
            } else {
                // no inputs, so the sender's witness is demanded through the attribute
                tx.attributes.push(Attribute::script(&from_hash));
            }

            let next = self.policy.size_fee(estimated_signed_size(&tx))?;
            debug!("fee round {}: required {}, size fee {}", round, required, next);
            if next <= size_fee {
                settled = true;
                break;
            }
            size_fee = next;
        }
        if !settled {
            warn!("size fee still growing after {} rounds", MAX_FEE_ROUNDS);
            return Err(TxError::FeeNotSettled(MAX_FEE_ROUNDS));
        }

        debug!(
            "invocation transaction {}: gas {}, size fee {}, {} inputs",
            tx.id(),
            gas,
            size_fee,
            tx.inputs.len()
        );
        Ok(tx)
    }

    fn simulate(&self, script: &[u8]) -> Result<InvokeResult> {
        let result = unwrap_response(self.client.invoke_script(&hex::encode(script)))?;
        if result.is_fault() {
            warn!("script simulation faulted with state {}", result.state);
            return Err(TxError::ScriptFault(result.state));
        }
        Ok(result)
    }

    /// Claim unclaimed utility tokens of `address`, paying them to
    /// `destination` (or back to `address`).
    pub fn build_claim_transaction(&self, address: &str, destination: Option<&str>) -> Result<Transaction> {
        let destination_hash = address_to_script_hash(destination.unwrap_or(address))?;
        let claimable = unwrap_response(self.client.get_claimable(address))?;
        if claimable.claimable.is_empty() {
            return Err(TxError::NothingToClaim(address.to_string()));
        }

        let records = &claimable.claimable[..claimable.claimable.len().min(MAX_CLAIMS)];
        let mut total = Fixed8::ZERO;
        let mut claims = Vec::with_capacity(records.len());
        for record in records {
            total = total.checked_add(record.unclaimed)?;
            claims.push(CoinReference { prev_hash: record.tx_id, prev_index: record.index });
        }
        if claimable.claimable.len() > MAX_CLAIMS {
            debug!(
                "claiming {} of {} claimable outputs",
                MAX_CLAIMS,
                claimable.claimable.len()
            );
        }

        let mut tx = Transaction::claim(claims);
        tx.outputs.push(TransactionOutput {
            asset_id: GAS_ASSET_ID,
            value: total,
            script_hash: destination_hash,
        });
        debug!("claim transaction {}: {} claimed", tx.id(), total);
        Ok(tx)
    }

    /// Broadcast a signed transaction. Returns the node's verdict.
    pub fn relay(&self, tx: &Transaction) -> Result<bool> {
        if !tx.is_signed() {
            warn!("relaying unsigned transaction {}", tx.id());
        }
        let accepted = unwrap_response(self.client.send_raw_transaction(&tx.to_hex()))?;
        debug!("relay {}: accepted={}", tx.id(), accepted);
        Ok(accepted)
    }
}

fn asset_unspent<'a>(unspents: &'a Unspents, asset_id: &Hash256) -> Result<&'a [UnspentOutput]> {
    unspents
        .asset(asset_id)
        .map(|b| b.unspent.as_slice())
        .ok_or_else(|| TxError::AssetNotFound(asset_id.to_string()))
}

fn select_from(unspents: &Unspents, asset_id: &Hash256, amount: Fixed8) -> Result<Selection> {
    if amount <= Fixed8::ZERO {
        return Ok(Selection::default());
    }
    select_unspent(asset_unspent(unspents, asset_id)?, amount)
}

/// Append `selection` as inputs and any excess over `target` as change.
fn add_funding(
    tx: &mut Transaction,
    asset_id: &Hash256,
    selection: &Selection,
    target: Fixed8,
    change_hash: &Hash160,
) -> Result<()> {
    tx.inputs.extend_from_slice(&selection.inputs);
    let change = selection.change(target)?;
    if change > Fixed8::ZERO {
        debug!("change {} of asset {}", change, asset_id);
        tx.outputs.push(TransactionOutput { asset_id: *asset_id, value: change, script_hash: *change_hash });
    }
    Ok(())
}
