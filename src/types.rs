//! Fixed-size hash identifiers
//!
//! Both types keep their bytes in stored (wire) order. Human-facing hex uses
//! the reversed order, which is also what `Display` and serde produce.
//! Ordering is numeric: the last stored byte is the most significant.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Result, TxError};

macro_rules! hash_type {
    ($name:ident, $len:expr, $doc:literal) => {
        #[doc = $doc]
        #[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
        pub struct $name([u8; $len]);

        impl $name {
            pub const LEN: usize = $len;

            pub const fn from_bytes(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            pub fn from_slice(bytes: &[u8]) -> Result<Self> {
                if bytes.len() != $len {
                    return Err(TxError::InvalidHash(format!(
                        "expected {} bytes, got {}",
                        $len,
                        bytes.len()
                    )));
                }
                let mut out = [0u8; $len];
                out.copy_from_slice(bytes);
                Ok(Self(out))
            }

            /// Parse hex in stored byte order.
            pub fn from_hex(s: &str) -> Result<Self> {
                let bytes = hex::decode(strip_0x(s)).map_err(|e| TxError::InvalidHash(e.to_string()))?;
                Self::from_slice(&bytes)
            }

            /// Parse hex in display (reversed) byte order.
            pub fn from_reversed_hex(s: &str) -> Result<Self> {
                let mut h = Self::from_hex(s)?;
                h.0.reverse();
                Ok(h)
            }

            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            pub fn to_vec(&self) -> Vec<u8> {
                self.0.to_vec()
            }

            pub fn reversed(&self) -> Self {
                let mut out = self.0;
                out.reverse();
                Self(out)
            }

            /// Hex in stored byte order.
            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }

            /// Hex in display (reversed) byte order.
            pub fn to_reversed_hex(&self) -> String {
                hex::encode(self.reversed().0)
            }
        }

        impl Ord for $name {
            fn cmp(&self, other: &Self) -> Ordering {
                self.0.iter().rev().cmp(other.0.iter().rev())
            }
        }

        impl PartialOrd for $name {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl From<[u8; $len]> for $name {
            fn from(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.to_reversed_hex())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.to_reversed_hex())
            }
        }

        impl FromStr for $name {
            type Err = TxError;

            fn from_str(s: &str) -> Result<Self> {
                Self::from_reversed_hex(s)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_reversed_hex())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Self::from_reversed_hex(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}

hash_type!(Hash160, 20, "160-bit identifier: script hashes, account and contract addresses");
hash_type!(Hash256, 32, "256-bit identifier: transaction, block and asset ids");

fn strip_0x(s: &str) -> &str {
    s.strip_prefix("0x").unwrap_or(s)
}
