//! Hashing and P-256 key primitives

use std::cmp::Ordering;
use std::fmt;

use bitcoin_hashes::{sha256d, Hash as BitcoinHash};
use p256::ecdsa::signature::{Signer, Verifier};
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

use crate::constants::*;
use crate::error::{Result, TxError};
use crate::types::{Hash160, Hash256};

/// SHA256(x)
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let digest = Sha256::digest(data);
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

/// SHA256(SHA256(x)), the identifier hash for transactions and blocks
pub fn double_sha256(data: &[u8]) -> Hash256 {
    let digest = sha256d::Hash::hash(data);
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest[..]);
    Hash256::from_bytes(out)
}

/// RIPEMD160(SHA256(x)), the script hash of a verification script
pub fn hash160(data: &[u8]) -> Hash160 {
    let sha256_hash = Sha256::digest(data);
    let ripemd160_hash = Ripemd160::digest(sha256_hash);
    let mut out = [0u8; 20];
    out.copy_from_slice(&ripemd160_hash);
    Hash160::from_bytes(out)
}

/// P-256 signing key.
#[derive(Clone)]
pub struct PrivateKey(SigningKey);

impl PrivateKey {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        SigningKey::from_slice(bytes)
            .map(PrivateKey)
            .map_err(|e| TxError::InvalidKey(e.to_string()))
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s).map_err(|e| TxError::InvalidKey(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    /// Import from Wallet Import Format: Base58Check(0x80 || key || 0x01).
    pub fn from_wif(wif: &str) -> Result<Self> {
        let payload = bs58::decode(wif)
            .with_check(None)
            .into_vec()
            .map_err(|e| TxError::InvalidKey(format!("WIF: {}", e)))?;
        if payload.len() != 34 || payload[0] != WIF_VERSION || payload[33] != WIF_COMPRESSED_FLAG {
            return Err(TxError::InvalidKey("WIF: unexpected version or length".to_string()));
        }
        Self::from_bytes(&payload[1..33])
    }

    pub fn to_wif(&self) -> String {
        let mut payload = Vec::with_capacity(34);
        payload.push(WIF_VERSION);
        payload.extend_from_slice(&self.to_bytes());
        payload.push(WIF_COMPRESSED_FLAG);
        bs58::encode(payload).with_check().into_string()
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        out.copy_from_slice(&self.0.to_bytes());
        out
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey::from_verifying_key(self.0.verifying_key())
    }

    /// ECDSA over SHA256(message), deterministic nonce, `r || s` encoding.
    pub fn sign(&self, message: &[u8]) -> [u8; SIGNATURE_LEN] {
        let signature: Signature = self.0.sign(message);
        let mut out = [0u8; SIGNATURE_LEN];
        out.copy_from_slice(&signature.to_bytes());
        out
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrivateKey({})", self.public_key())
    }
}

/// P-256 public key.
///
/// Ordered by X coordinate, then Y, which is the canonical order for keys
/// in a multi-signature redemption script.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PublicKey {
    compressed: [u8; PUBLIC_KEY_LEN],
    uncompressed: [u8; 65],
}

impl PublicKey {
    fn from_verifying_key(key: &VerifyingKey) -> Self {
        let mut compressed = [0u8; PUBLIC_KEY_LEN];
        compressed.copy_from_slice(key.to_encoded_point(true).as_bytes());
        let mut uncompressed = [0u8; 65];
        uncompressed.copy_from_slice(key.to_encoded_point(false).as_bytes());
        PublicKey { compressed, uncompressed }
    }

    /// Accepts SEC1 compressed (33 bytes) or uncompressed (65 bytes) points.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let key = VerifyingKey::from_sec1_bytes(bytes).map_err(|e| TxError::InvalidKey(e.to_string()))?;
        Ok(Self::from_verifying_key(&key))
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s).map_err(|e| TxError::InvalidKey(e.to_string()))?;
        Self::from_slice(&bytes)
    }

    pub fn to_compressed(&self) -> [u8; PUBLIC_KEY_LEN] {
        self.compressed
    }

    pub fn to_uncompressed(&self) -> [u8; 65] {
        self.uncompressed
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.compressed)
    }

    /// Check a 64-byte `r || s` signature over SHA256(message).
    ///
    /// Malformed keys or signatures are a plain `false`.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        let key = match VerifyingKey::from_sec1_bytes(&self.compressed) {
            Ok(k) => k,
            Err(_) => return false,
        };
        let signature = match Signature::from_slice(signature) {
            Ok(s) => s,
            Err(_) => return false,
        };
        key.verify(message, &signature).is_ok()
    }
}

impl Ord for PublicKey {
    fn cmp(&self, other: &Self) -> Ordering {
        // skip the 0x04 tag: X then Y, big-endian
        self.uncompressed[1..].cmp(&other.uncompressed[1..])
    }
}

impl PartialOrd for PublicKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_hex())
    }
}
