//! Script builder: VM bytecode emission
//!
//! The VM is a stack machine, so anything consumed as a list (call
//! arguments, array elements) is pushed last-to-first followed by its
//! length and PACK.

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::crypto::{sha256, PublicKey};
use crate::error::{Result, TxError};
use crate::opcode::OpCode;
use crate::types::{Hash160, Hash256};

/// A typed argument for a contract call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum ContractParameter {
    Boolean(bool),
    Integer(i64),
    ByteArray(Vec<u8>),
    Hash160(Hash160),
    Hash256(Hash256),
    String(String),
    Array(Vec<ContractParameter>),
}

/// Append-only VM script buffer.
#[derive(Debug, Default, Clone)]
pub struct ScriptBuilder {
    script: Vec<u8>,
}

impl ScriptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.script.len()
    }

    pub fn is_empty(&self) -> bool {
        self.script.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.script
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.script
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.script)
    }

    pub fn emit(&mut self, op: OpCode) -> &mut Self {
        self.script.push(op.byte());
        self
    }

    pub fn emit_with(&mut self, op: OpCode, operand: &[u8]) -> &mut Self {
        self.script.push(op.byte());
        self.script.extend_from_slice(operand);
        self
    }

    /// Push an integer: PUSHM1, PUSH0, PUSH1..PUSH16, or its minimal
    /// little-endian two's complement bytes.
    pub fn emit_push_int(&mut self, value: i64) -> &mut Self {
        match value {
            -1 => self.emit(OpCode::PUSHM1),
            0 => self.emit(OpCode::PUSH0),
            1..=16 => {
                self.script.push(OpCode::PUSH1.byte() + (value as u8 - 1));
                self
            }
            _ => self.emit_push_bytes(&int_to_bytes(value)),
        }
    }

    pub fn emit_push_bool(&mut self, value: bool) -> &mut Self {
        self.emit(if value { OpCode::PUSHT } else { OpCode::PUSHF })
    }

    /// Push raw bytes with the shortest length encoding.
    pub fn emit_push_bytes(&mut self, data: &[u8]) -> &mut Self {
        let len = data.len();
        if len <= OpCode::PUSHBYTES75.byte() as usize {
            self.script.push(len as u8);
        } else if len < 0x100 {
            self.emit_with(OpCode::PUSHDATA1, &[len as u8]);
        } else if len < 0x10000 {
            self.emit_with(OpCode::PUSHDATA2, &(len as u16).to_le_bytes());
        } else {
            self.emit_with(OpCode::PUSHDATA4, &(len as u32).to_le_bytes());
        }
        self.script.extend_from_slice(data);
        self
    }

    pub fn emit_push_string(&mut self, value: &str) -> &mut Self {
        self.emit_push_bytes(value.as_bytes())
    }

    pub fn emit_push_param(&mut self, param: &ContractParameter) -> &mut Self {
        match param {
            ContractParameter::Boolean(b) => self.emit_push_bool(*b),
            ContractParameter::Integer(i) => self.emit_push_int(*i),
            ContractParameter::ByteArray(bytes) => self.emit_push_bytes(bytes),
            ContractParameter::Hash160(h) => self.emit_push_bytes(h.as_bytes()),
            ContractParameter::Hash256(h) => self.emit_push_bytes(h.as_bytes()),
            ContractParameter::String(s) => self.emit_push_string(s),
            ContractParameter::Array(items) => self.emit_push_array(items),
        }
    }

    /// Push elements last-to-first, then the count, then PACK.
    pub fn emit_push_array(&mut self, items: &[ContractParameter]) -> &mut Self {
        for item in items.iter().rev() {
            self.emit_push_param(item);
        }
        self.emit_push_int(items.len() as i64);
        self.emit(OpCode::PACK)
    }

    /// APPCALL (or TAILCALL) addressed by a 20-byte script hash.
    pub fn emit_app_call(&mut self, script_hash: &[u8], tail_call: bool) -> Result<&mut Self> {
        if script_hash.len() != Hash160::LEN {
            return Err(TxError::InvalidScriptHashLength(script_hash.len()));
        }
        let op = if tail_call { OpCode::TAILCALL } else { OpCode::APPCALL };
        Ok(self.emit_with(op, script_hash))
    }

    /// SYSCALL by name, or by the 4-byte interop hash of the name.
    pub fn emit_syscall(&mut self, api: &str, compress: bool) -> Result<&mut Self> {
        let api_bytes = if compress {
            interop_method_hash(api).to_vec()
        } else {
            api.as_bytes().to_vec()
        };
        if api_bytes.len() > MAX_SYSCALL_NAME_LEN {
            return Err(TxError::SyscallTooLong(api_bytes.len()));
        }
        self.script.push(OpCode::SYSCALL.byte());
        self.script.push(api_bytes.len() as u8);
        self.script.extend_from_slice(&api_bytes);
        Ok(self)
    }

    /// Call `operation` on a contract with `args` packed into one array.
    pub fn emit_contract_call(
        &mut self,
        script_hash: &[u8],
        operation: &str,
        args: &[ContractParameter],
    ) -> Result<&mut Self> {
        if script_hash.len() != Hash160::LEN {
            return Err(TxError::InvalidScriptHashLength(script_hash.len()));
        }
        self.emit_push_array(args);
        self.emit_push_string(operation);
        self.emit_app_call(script_hash, false)
    }
}

/// First four bytes of SHA256(name).
pub fn interop_method_hash(api: &str) -> [u8; 4] {
    let digest = sha256(api.as_bytes());
    [digest[0], digest[1], digest[2], digest[3]]
}

/// Invocation script calling `operation(args)` on the contract at `script_hash`.
pub fn build_invocation_script(
    script_hash: &[u8],
    operation: &str,
    args: &[ContractParameter],
) -> Result<Vec<u8>> {
    let mut sb = ScriptBuilder::new();
    sb.emit_contract_call(script_hash, operation, args)?;
    Ok(sb.into_bytes())
}

/// Single-signature redemption script: push(key) CHECKSIG
pub fn signature_redeem_script(key: &PublicKey) -> Vec<u8> {
    let mut sb = ScriptBuilder::new();
    sb.emit_push_bytes(&key.to_compressed()).emit(OpCode::CHECKSIG);
    sb.into_bytes()
}

/// M-of-N redemption script: push(M) push(key)* push(N) CHECKMULTISIG,
/// with keys in canonical order.
pub fn multisig_redeem_script(threshold: usize, keys: &[PublicKey]) -> Result<Vec<u8>> {
    if threshold == 0 || threshold > keys.len() {
        return Err(TxError::InvalidMultiSig(format!(
            "threshold {} for {} keys",
            threshold,
            keys.len()
        )));
    }
    let mut sorted = keys.to_vec();
    sorted.sort();
    sorted.dedup();
    if sorted.len() != keys.len() {
        return Err(TxError::InvalidMultiSig("duplicate public key".to_string()));
    }

    let mut sb = ScriptBuilder::new();
    sb.emit_push_int(threshold as i64);
    for key in &sorted {
        sb.emit_push_bytes(&key.to_compressed());
    }
    sb.emit_push_int(sorted.len() as i64).emit(OpCode::CHECKMULTISIG);
    Ok(sb.into_bytes())
}

/// Minimal little-endian two's complement encoding.
fn int_to_bytes(value: i64) -> Vec<u8> {
    let bytes = value.to_le_bytes();
    let mut len = bytes.len();
    while len > 1 {
        let top = bytes[len - 1];
        let next_sign = bytes[len - 2] & 0x80;
        if (top == 0x00 && next_sign == 0) || (top == 0xff && next_sign != 0) {
            len -= 1;
        } else {
            break;
        }
    }
    bytes[..len].to_vec()
}

/// Read one data push at `*pos`, advancing past it.
pub fn read_push_data<'a>(script: &'a [u8], pos: &mut usize) -> Option<&'a [u8]> {
    let op = *script.get(*pos)?;
    let mut cursor = *pos + 1;
    let len = match op {
        0x00 => 0,
        0x01..=0x4b => op as usize,
        0x4c => {
            let n = *script.get(cursor)? as usize;
            cursor += 1;
            n
        }
        0x4d => {
            let b = script.get(cursor..cursor + 2)?;
            cursor += 2;
            u16::from_le_bytes([b[0], b[1]]) as usize
        }
        0x4e => {
            let b = script.get(cursor..cursor + 4)?;
            cursor += 4;
            u32::from_le_bytes([b[0], b[1], b[2], b[3]]) as usize
        }
        _ => return None,
    };
    let data = script.get(cursor..cursor.checked_add(len)?)?;
    *pos = cursor + len;
    Some(data)
}

/// Read one integer push at `*pos`, advancing past it.
pub fn read_push_int(script: &[u8], pos: &mut usize) -> Option<i64> {
    let op = *script.get(*pos)?;
    if op == OpCode::PUSHM1.byte() {
        *pos += 1;
        return Some(-1);
    }
    if (OpCode::PUSH1.byte()..=OpCode::PUSH16.byte()).contains(&op) {
        *pos += 1;
        return Some((op - OpCode::PUSH1.byte()) as i64 + 1);
    }
    let mut cursor = *pos;
    let data = read_push_data(script, &mut cursor)?;
    if data.len() > 8 {
        return None;
    }
    let mut value: i64 = 0;
    for (i, b) in data.iter().enumerate() {
        value |= (*b as i64) << (8 * i);
    }
    // sign-extend from the top byte
    if let Some(last) = data.last() {
        if last & 0x80 != 0 && data.len() < 8 {
            value |= -1i64 << (8 * data.len());
        }
    }
    *pos = cursor;
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::PrivateKey;

    fn pushed_int(v: i64) -> Vec<u8> {
        let mut sb = ScriptBuilder::new();
        sb.emit_push_int(v);
        sb.into_bytes()
    }

    #[test]
    fn test_push_small_ints_use_dedicated_opcodes() {
        assert_eq!(pushed_int(-1), vec![0x4f]);
        assert_eq!(pushed_int(0), vec![0x00]);
        assert_eq!(pushed_int(1), vec![0x51]);
        assert_eq!(pushed_int(16), vec![0x60]);
    }

    #[test]
    fn test_push_other_ints_as_minimal_bytes() {
        assert_eq!(pushed_int(17), vec![0x01, 0x11]);
        assert_eq!(pushed_int(127), vec![0x01, 0x7f]);
        assert_eq!(pushed_int(128), vec![0x02, 0x80, 0x00]);
        assert_eq!(pushed_int(-2), vec![0x01, 0xfe]);
        assert_eq!(pushed_int(-129), vec![0x02, 0x7f, 0xff]);
        assert_eq!(pushed_int(100_000_000), vec![0x04, 0x00, 0xe1, 0xf5, 0x05]);
    }

    #[test]
    fn test_push_bytes_length_classes() {
        let check = |len: usize, prefix: &[u8]| {
            let data = vec![0xaa; len];
            let mut sb = ScriptBuilder::new();
            sb.emit_push_bytes(&data);
            let out = sb.into_bytes();
            assert_eq!(&out[..prefix.len()], prefix, "len {}", len);
            assert_eq!(out.len(), prefix.len() + len);
        };
        check(0, &[0x00]);
        check(75, &[0x4b]);
        check(76, &[0x4c, 76]);
        check(255, &[0x4c, 0xff]);
        check(256, &[0x4d, 0x00, 0x01]);
        check(65535, &[0x4d, 0xff, 0xff]);
        check(65536, &[0x4e, 0x00, 0x00, 0x01, 0x00]);
    }

    #[test]
    fn test_push_array_reverses_elements() {
        let mut sb = ScriptBuilder::new();
        sb.emit_push_param(&ContractParameter::Array(vec![
            ContractParameter::Integer(1),
            ContractParameter::Boolean(false),
            ContractParameter::String("a".to_string()),
        ]));
        assert_eq!(sb.as_bytes(), &[0x01, b'a', 0x00, 0x51, 0x53, 0xc1]);
    }

    #[test]
    fn test_nested_array() {
        let mut sb = ScriptBuilder::new();
        sb.emit_push_param(&ContractParameter::Array(vec![ContractParameter::Array(vec![])]));
        // inner: PUSH0 PACK; outer: PUSH1 PACK
        assert_eq!(sb.as_bytes(), &[0x00, 0xc1, 0x51, 0xc1]);
    }

    #[test]
    fn test_invocation_script_layout() {
        let hash = [0x42u8; 20];
        let script = build_invocation_script(
            &hash,
            "transfer",
            &[ContractParameter::Integer(5), ContractParameter::ByteArray(vec![0xde, 0xad])],
        )
        .unwrap();
        let mut expected = vec![0x02, 0xde, 0xad, 0x55, 0x52, 0xc1, 0x08];
        expected.extend_from_slice(b"transfer");
        expected.push(0x67);
        expected.extend_from_slice(&hash);
        assert_eq!(script, expected);
    }

    #[test]
    fn test_app_call_rejects_wrong_hash_length() {
        let err = build_invocation_script(&[0u8; 19], "name", &[]).unwrap_err();
        assert!(matches!(err, TxError::InvalidScriptHashLength(19)));
        let mut sb = ScriptBuilder::new();
        assert!(sb.emit_app_call(&[0u8; 32], true).is_err());
        assert!(sb.is_empty());
    }

    #[test]
    fn test_syscall_plain_and_compressed() {
        let mut sb = ScriptBuilder::new();
        sb.emit_syscall("Neo.Runtime.CheckWitness", false).unwrap();
        let out = sb.into_bytes();
        assert_eq!(out[0], 0x68);
        assert_eq!(out[1] as usize, "Neo.Runtime.CheckWitness".len());
        assert_eq!(&out[2..], b"Neo.Runtime.CheckWitness");

        let mut sb = ScriptBuilder::new();
        sb.emit_syscall("Neo.Runtime.CheckWitness", true).unwrap();
        let out = sb.into_bytes();
        assert_eq!(out.len(), 6);
        assert_eq!(out[1], 4);
        assert_eq!(&out[2..], &interop_method_hash("Neo.Runtime.CheckWitness"));
    }

    #[test]
    fn test_syscall_name_limit() {
        let long = "x".repeat(253);
        let mut sb = ScriptBuilder::new();
        assert!(matches!(sb.emit_syscall(&long, false), Err(TxError::SyscallTooLong(253))));
        // compressing makes any name fit
        assert!(sb.emit_syscall(&long, true).is_ok());
        assert!(sb.emit_syscall(&"y".repeat(252), false).is_ok());
    }

    #[test]
    fn test_redeem_scripts() {
        let keys: Vec<PublicKey> = (1u8..=4)
            .map(|i| PrivateKey::from_bytes(&[i; 32]).unwrap().public_key())
            .collect();
        let single = signature_redeem_script(&keys[0]);
        assert_eq!(single.len(), 35);
        assert_eq!(single[0], 0x21);
        assert_eq!(single[34], 0xac);

        let multi = multisig_redeem_script(3, &keys).unwrap();
        assert_eq!(multi.len(), 1 + 34 * 4 + 1 + 1);
        assert_eq!(multi[0], 0x53);
        assert_eq!(multi[multi.len() - 2], 0x54);
        assert_eq!(multi[multi.len() - 1], 0xae);

        // key order in the script does not depend on input order
        let mut shuffled = keys.clone();
        shuffled.reverse();
        assert_eq!(multisig_redeem_script(3, &shuffled).unwrap(), multi);
    }

    #[test]
    fn test_redeem_script_bad_threshold() {
        let key = PrivateKey::from_bytes(&[9; 32]).unwrap().public_key();
        assert!(multisig_redeem_script(0, &[key.clone()]).is_err());
        assert!(multisig_redeem_script(2, &[key.clone()]).is_err());
        assert!(multisig_redeem_script(1, &[key.clone(), key]).is_err());
    }

    #[test]
    fn test_read_push_int() {
        for v in [-129i64, -2, -1, 0, 1, 16, 17, 128, 100_000_000, i64::MAX, i64::MIN] {
            let script = pushed_int(v);
            let mut pos = 0;
            assert_eq!(read_push_int(&script, &mut pos), Some(v));
            assert_eq!(pos, script.len());
        }
        let mut pos = 0;
        assert_eq!(read_push_int(&[0xac], &mut pos), None);
        assert_eq!(pos, 0);
    }

    #[test]
    fn test_read_push_data_truncated() {
        let mut pos = 0;
        assert_eq!(read_push_data(&[0x05, 0x01, 0x02], &mut pos), None);
        assert_eq!(read_push_data(&[0x4d, 0x01], &mut pos), None);
        assert_eq!(read_push_data(&[0x02, 0x01, 0x02], &mut pos), Some(&[0x01u8, 0x02][..]));
        assert_eq!(pos, 3);
    }
}
