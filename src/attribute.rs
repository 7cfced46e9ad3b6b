//! Transaction attributes
//!
//! Attribute = usage:u8 × payload, where the usage alone decides how the
//! payload is sized on the wire.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::codec::{var_bytes_size, BinaryReader, BinaryWriter, Decodable, Encodable};
use crate::error::{Result, TxError};
use crate::types::Hash160;

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct AttributeUsage(u8);

/// How a payload is laid out after the usage byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PayloadLayout {
    Fixed(usize),
    ShortPrefixed,
    VarBytes,
}

impl AttributeUsage {
    pub const CONTRACT_HASH: AttributeUsage = AttributeUsage(0x00);
    pub const ECDH02: AttributeUsage = AttributeUsage(0x02);
    pub const ECDH03: AttributeUsage = AttributeUsage(0x03);
    pub const SCRIPT: AttributeUsage = AttributeUsage(0x20);
    pub const VOTE: AttributeUsage = AttributeUsage(0x30);
    pub const CERT_URL: AttributeUsage = AttributeUsage(0x80);
    pub const DESCRIPTION_URL: AttributeUsage = AttributeUsage(0x81);
    pub const DESCRIPTION: AttributeUsage = AttributeUsage(0x90);
    pub const HASH1: AttributeUsage = AttributeUsage(0xa1);
    pub const HASH15: AttributeUsage = AttributeUsage(0xaf);
    pub const REMARK: AttributeUsage = AttributeUsage(0xf0);
    pub const REMARK15: AttributeUsage = AttributeUsage(0xff);

    pub fn from_u8(b: u8) -> Result<Self> {
        let usage = AttributeUsage(b);
        usage.layout().map(|_| usage)
    }

    /// `HashN` usage for n in 1..=15.
    pub fn hash(n: u8) -> Result<Self> {
        if !(1..=15).contains(&n) {
            return Err(TxError::UnknownAttributeUsage(0xa0u8.wrapping_add(n)));
        }
        Ok(AttributeUsage(Self::HASH1.0 + n - 1))
    }

    /// `Remark` (n = 0) or `RemarkN` usage for n in 1..=15.
    pub fn remark(n: u8) -> Result<Self> {
        if n > 15 {
            return Err(TxError::UnknownAttributeUsage(Self::REMARK.0.wrapping_add(n)));
        }
        Ok(AttributeUsage(Self::REMARK.0 + n))
    }

    pub fn as_u8(self) -> u8 {
        self.0
    }

    fn layout(self) -> Result<PayloadLayout> {
        match self.0 {
            0x00 | 0x02 | 0x03 | 0x30 | 0xa1..=0xaf => Ok(PayloadLayout::Fixed(32)),
            0x20 => Ok(PayloadLayout::Fixed(20)),
            0x81 => Ok(PayloadLayout::ShortPrefixed),
            0x80 | 0x90 | 0xf0..=0xff => Ok(PayloadLayout::VarBytes),
            other => Err(TxError::UnknownAttributeUsage(other)),
        }
    }
}

impl TryFrom<u8> for AttributeUsage {
    type Error = TxError;

    fn try_from(b: u8) -> Result<Self> {
        Self::from_u8(b)
    }
}

impl From<AttributeUsage> for u8 {
    fn from(usage: AttributeUsage) -> u8 {
        usage.0
    }
}

impl fmt::Debug for AttributeUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            0x00 => f.write_str("ContractHash"),
            0x02 => f.write_str("ECDH02"),
            0x03 => f.write_str("ECDH03"),
            0x20 => f.write_str("Script"),
            0x30 => f.write_str("Vote"),
            0x80 => f.write_str("CertUrl"),
            0x81 => f.write_str("DescriptionUrl"),
            0x90 => f.write_str("Description"),
            n @ 0xa1..=0xaf => write!(f, "Hash{}", n - 0xa0),
            0xf0 => f.write_str("Remark"),
            n @ 0xf1..=0xff => write!(f, "Remark{}", n - 0xf0),
            n => write!(f, "Unknown(0x{:02x})", n),
        }
    }
}

impl fmt::Display for AttributeUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A usage tag plus a payload whose length matches the tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawAttribute", into = "RawAttribute")]
pub struct Attribute {
    usage: AttributeUsage,
    data: Vec<u8>,
}

impl Attribute {
    pub fn new(usage: AttributeUsage, data: Vec<u8>) -> Result<Self> {
        let invalid = |reason: String| TxError::InvalidAttribute { usage: usage.to_string(), reason };
        match usage.layout()? {
            PayloadLayout::Fixed(n) if data.len() != n => {
                return Err(invalid(format!("expected {} bytes, got {}", n, data.len())));
            }
            PayloadLayout::ShortPrefixed if data.len() > u8::MAX as usize => {
                return Err(invalid(format!("{} bytes exceeds 255", data.len())));
            }
            _ => {}
        }
        Ok(Attribute { usage, data })
    }

    /// Script attribute naming an account that must witness the transaction.
    pub fn script(script_hash: &Hash160) -> Self {
        Attribute { usage: AttributeUsage::SCRIPT, data: script_hash.to_vec() }
    }

    pub fn remark(data: Vec<u8>) -> Self {
        Attribute { usage: AttributeUsage::REMARK, data }
    }

    pub fn usage(&self) -> AttributeUsage {
        self.usage
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn size(&self) -> usize {
        1 + match self.usage.layout() {
            Ok(PayloadLayout::Fixed(n)) => n,
            Ok(PayloadLayout::ShortPrefixed) => 1 + self.data.len(),
            _ => var_bytes_size(self.data.len()),
        }
    }
}

impl Encodable for Attribute {
    fn encode(&self, writer: &mut BinaryWriter) {
        writer.write_u8(self.usage.0);
        match self.usage.layout() {
            Ok(PayloadLayout::Fixed(_)) => writer.write_bytes(&self.data),
            Ok(PayloadLayout::ShortPrefixed) => {
                writer.write_u8(self.data.len() as u8);
                writer.write_bytes(&self.data);
            }
            _ => writer.write_var_bytes(&self.data),
        }
    }
}

impl Decodable for Attribute {
    fn decode(reader: &mut BinaryReader<'_>) -> Result<Self> {
        let usage = AttributeUsage(reader.read_u8()?);
        let data = match usage.layout()? {
            PayloadLayout::Fixed(n) => reader.read_bytes(n)?.to_vec(),
            PayloadLayout::ShortPrefixed => {
                let len = reader.read_u8()? as usize;
                reader.read_bytes(len)?.to_vec()
            }
            PayloadLayout::VarBytes => reader.read_var_bytes()?,
        };
        Ok(Attribute { usage, data })
    }
}

#[derive(Serialize, Deserialize)]
struct RawAttribute {
    usage: u8,
    #[serde(with = "hex_bytes")]
    data: Vec<u8>,
}

impl TryFrom<RawAttribute> for Attribute {
    type Error = TxError;

    fn try_from(raw: RawAttribute) -> Result<Self> {
        Attribute::new(AttributeUsage::from_u8(raw.usage)?, raw.data)
    }
}

impl From<Attribute> for RawAttribute {
    fn from(attr: Attribute) -> Self {
        RawAttribute { usage: attr.usage.0, data: attr.data }
    }
}

pub(crate) mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s).map_err(serde::de::Error::custom)
    }
}
