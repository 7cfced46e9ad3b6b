//! Witness engine: signature and multi-signature witnesses
//!
//! Witness = invocation script × verification script. The invocation script
//! pushes signatures; the verification script is the redemption script whose
//! hash names the account being proven.

use serde::{Deserialize, Serialize};

use crate::attribute::hex_bytes;
use crate::codec::{var_bytes_size, BinaryReader, BinaryWriter, Decodable, Encodable};
use crate::constants::*;
use crate::crypto::{hash160, PrivateKey, PublicKey};
use crate::error::{Result, TxError};
use crate::opcode::OpCode;
use crate::script::{multisig_redeem_script, read_push_int, signature_redeem_script, ScriptBuilder};
use crate::types::Hash160;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Witness {
    #[serde(with = "hex_bytes")]
    pub invocation_script: Vec<u8>,
    #[serde(with = "hex_bytes")]
    pub verification_script: Vec<u8>,
}

impl Witness {
    pub fn new(invocation_script: Vec<u8>, verification_script: Vec<u8>) -> Self {
        Witness { invocation_script, verification_script }
    }

    /// RIPEMD160(SHA256(verification script)), recomputed on every call.
    pub fn script_hash(&self) -> Hash160 {
        hash160(&self.verification_script)
    }

    pub fn size(&self) -> usize {
        var_bytes_size(self.invocation_script.len()) + var_bytes_size(self.verification_script.len())
    }

    /// Single-signature witness over `message`.
    pub fn create_signature(message: &[u8], key: &PrivateKey) -> Self {
        let signature = key.sign(message);
        let mut invocation = ScriptBuilder::new();
        invocation.emit_push_bytes(&signature);
        Witness {
            invocation_script: invocation.into_bytes(),
            verification_script: signature_redeem_script(&key.public_key()),
        }
    }

    /// M-of-N witness over `message`.
    ///
    /// Every signer signs; signatures are pushed in canonical public-key
    /// order. The signer count must lie in `[threshold, public_keys.len()]`
    /// and every signer must own one of `public_keys`.
    pub fn create_multi_sig(
        threshold: usize,
        public_keys: &[PublicKey],
        signers: &[PrivateKey],
        message: &[u8],
    ) -> Result<Self> {
        let verification_script = multisig_redeem_script(threshold, public_keys)?;
        if signers.len() < threshold {
            return Err(TxError::NotEnoughSigners { provided: signers.len(), required: threshold });
        }
        if signers.len() > public_keys.len() {
            return Err(TxError::InvalidMultiSig(format!(
                "{} signers for {} keys",
                signers.len(),
                public_keys.len()
            )));
        }

        let mut ordered: Vec<(PublicKey, &PrivateKey)> =
            signers.iter().map(|k| (k.public_key(), k)).collect();
        ordered.sort_by(|a, b| a.0.cmp(&b.0));
        for (i, (public, _)) in ordered.iter().enumerate() {
            if !public_keys.contains(public) {
                return Err(TxError::InvalidMultiSig(format!("signer {} is not a listed key", public)));
            }
            if i > 0 && ordered[i - 1].0 == *public {
                return Err(TxError::InvalidMultiSig(format!("signer {} repeated", public)));
            }
        }

        let mut invocation = ScriptBuilder::new();
        for (_, key) in &ordered {
            invocation.emit_push_bytes(&key.sign(message));
        }
        Ok(Witness { invocation_script: invocation.into_bytes(), verification_script })
    }

    /// Check the witness against `message`. Never errors: anything malformed
    /// is simply not a valid witness.
    pub fn verify(&self, message: &[u8]) -> bool {
        if is_signature_contract(&self.verification_script) {
            verify_signature_witness(self, message)
        } else if is_multisig_contract(&self.verification_script) {
            verify_multi_sig_witness(self, message)
        } else {
            false
        }
    }
}

impl Encodable for Witness {
    fn encode(&self, writer: &mut BinaryWriter) {
        writer.write_var_bytes(&self.invocation_script);
        writer.write_var_bytes(&self.verification_script);
    }
}

impl Decodable for Witness {
    fn decode(reader: &mut BinaryReader<'_>) -> Result<Self> {
        let invocation_script = reader.read_var_bytes()?;
        let verification_script = reader.read_var_bytes()?;
        Ok(Witness { invocation_script, verification_script })
    }
}

/// push(33-byte key) CHECKSIG
pub fn is_signature_contract(script: &[u8]) -> bool {
    script.len() == PUBLIC_KEY_PUSH_LEN + 1
        && script[0] == OpCode::PUSHBYTES33.byte()
        && script[PUBLIC_KEY_PUSH_LEN] == OpCode::CHECKSIG.byte()
}

/// push(M) push(key)* push(N) CHECKMULTISIG
pub fn is_multisig_contract(script: &[u8]) -> bool {
    parse_multisig_script(script).is_some()
}

/// Threshold and keys of a multi-signature redemption script.
pub fn parse_multisig_script(script: &[u8]) -> Option<(usize, Vec<PublicKey>)> {
    if script.last() != Some(&OpCode::CHECKMULTISIG.byte()) {
        return None;
    }
    let mut pos = 0;
    let threshold = read_push_int(script, &mut pos)?;
    let mut keys = Vec::new();
    while script.get(pos) == Some(&OpCode::PUSHBYTES33.byte()) {
        let chunk = script.get(pos + 1..pos + PUBLIC_KEY_PUSH_LEN)?;
        keys.push(PublicKey::from_slice(chunk).ok()?);
        pos += PUBLIC_KEY_PUSH_LEN;
    }
    let count = read_push_int(script, &mut pos)?;
    if pos + 1 != script.len() {
        return None;
    }
    if threshold < 1 || threshold > count || count as usize != keys.len() {
        return None;
    }
    Some((threshold as usize, keys))
}

fn split_signatures(invocation: &[u8]) -> Option<Vec<&[u8]>> {
    if invocation.is_empty() || invocation.len() % SIGNATURE_PUSH_LEN != 0 {
        return None;
    }
    invocation
        .chunks(SIGNATURE_PUSH_LEN)
        .map(|chunk| {
            if chunk[0] == OpCode::PUSHBYTES64.byte() {
                Some(&chunk[1..])
            } else {
                None
            }
        })
        .collect()
}

pub fn verify_signature_witness(witness: &Witness, message: &[u8]) -> bool {
    if !is_signature_contract(&witness.verification_script) {
        return false;
    }
    let signatures = match split_signatures(&witness.invocation_script) {
        Some(sigs) if sigs.len() == 1 => sigs,
        _ => return false,
    };
    match PublicKey::from_slice(&witness.verification_script[1..PUBLIC_KEY_PUSH_LEN]) {
        Ok(key) => key.verify(message, signatures[0]),
        Err(_) => false,
    }
}

/// Each provided signature must verify against some key embedded in the
/// verification script, and the signature count must be within `[M, N]`.
pub fn verify_multi_sig_witness(witness: &Witness, message: &[u8]) -> bool {
    let (threshold, keys) = match parse_multisig_script(&witness.verification_script) {
        Some(parsed) => parsed,
        None => return false,
    };
    let signatures = match split_signatures(&witness.invocation_script) {
        Some(sigs) => sigs,
        None => return false,
    };
    if signatures.len() < threshold || signatures.len() > keys.len() {
        return false;
    }
    signatures
        .iter()
        .all(|sig| keys.iter().any(|key| key.verify(message, sig)))
}

/// Stable sort by ascending script hash, compared as numbers.
pub fn sort_witnesses(witnesses: &mut [Witness]) {
    witnesses.sort_by_key(|w| w.script_hash());
}
