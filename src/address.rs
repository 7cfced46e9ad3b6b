//! Base58Check addresses
//!
//! Address = Base58Check(ADDRESS_VERSION || script hash)

use crate::constants::ADDRESS_VERSION;
use crate::crypto::{hash160, PublicKey};
use crate::error::{Result, TxError};
use crate::script::signature_redeem_script;
use crate::types::Hash160;

pub fn script_hash_to_address(script_hash: &Hash160) -> String {
    let mut payload = Vec::with_capacity(21);
    payload.push(ADDRESS_VERSION);
    payload.extend_from_slice(script_hash.as_bytes());
    bs58::encode(payload).with_check().into_string()
}

pub fn address_to_script_hash(address: &str) -> Result<Hash160> {
    let payload = bs58::decode(address)
        .with_check(None)
        .into_vec()
        .map_err(|e| TxError::InvalidAddress(format!("{}: {}", address, e)))?;
    if payload.len() != 21 {
        return Err(TxError::InvalidAddress(format!("{}: wrong length", address)));
    }
    if payload[0] != ADDRESS_VERSION {
        return Err(TxError::InvalidAddress(format!(
            "{}: version 0x{:02x}",
            address, payload[0]
        )));
    }
    Hash160::from_slice(&payload[1..])
}

/// Script hash of the single-signature account owned by `key`.
pub fn public_key_to_script_hash(key: &PublicKey) -> Hash160 {
    hash160(&signature_redeem_script(key))
}

pub fn public_key_to_address(key: &PublicKey) -> String {
    script_hash_to_address(&public_key_to_script_hash(key))
}

pub fn is_valid_address(address: &str) -> bool {
    address_to_script_hash(address).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_roundtrip() {
        let hash = Hash160::from_bytes([0x5a; 20]);
        let address = script_hash_to_address(&hash);
        assert!(address.starts_with('A'));
        assert_eq!(address_to_script_hash(&address).unwrap(), hash);
    }

    #[test]
    fn test_known_address() {
        let hash = Hash160::from_hex("23ba2703c53263e8d6e522dc32203339dcd8eee9").unwrap();
        assert_eq!(hash.to_string(), "e9eed8dc39332032dc22e5d6e86332c50327ba23");
        assert_eq!(script_hash_to_address(&hash), "AK2nJJpJr6o664CWJKi1QRXjqeic2zRp8y");
        assert_eq!(
            address_to_script_hash("AK2nJJpJr6o664CWJKi1QRXjqeic2zRp8y").unwrap(),
            hash
        );
    }

    #[test]
    fn test_invalid_addresses() {
        assert!(!is_valid_address(""));
        assert!(!is_valid_address("AK2nJJpJr6o664CWJKi1QRXjqeic2zRp8z"));
        // valid Base58Check, wrong version byte
        let mut payload = vec![0x00];
        payload.extend_from_slice(&[0x11; 20]);
        let bitcoin_style = bs58::encode(payload).with_check().into_string();
        assert!(matches!(
            address_to_script_hash(&bitcoin_style),
            Err(TxError::InvalidAddress(_))
        ));
    }
}
