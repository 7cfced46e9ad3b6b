//! Binary wire codec
//!
//! Little-endian fixed-width values, the compact VarInt, and length-prefixed
//! byte strings. Every read returns a `Result`, so a chain of reads can be
//! written with `?` and stops at the first failure.

use crate::error::{Result, TxError};
use crate::types::{Hash160, Hash256};

/// Compact variable-length integer.
///
/// `u8` below 0xFD, otherwise a 0xFD/0xFE/0xFF prefix followed by a
/// `u16`/`u32`/`u64`. Encoding always picks the shortest form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VarInt(pub u64);

impl VarInt {
    /// Encoded length in bytes: 1, 3, 5 or 9.
    pub fn size(&self) -> usize {
        if self.0 < 0xfd {
            1
        } else if self.0 <= 0xffff {
            3
        } else if self.0 <= 0xffff_ffff {
            5
        } else {
            9
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = BinaryWriter::with_capacity(self.size());
        writer.write_var_int(self.0);
        writer.into_bytes()
    }
}

impl From<usize> for VarInt {
    fn from(v: usize) -> Self {
        VarInt(v as u64)
    }
}

/// Size of a VarBytes field holding `len` bytes.
pub fn var_bytes_size(len: usize) -> usize {
    VarInt::from(len).size() + len
}

/// Types with a wire encoding.
pub trait Encodable {
    fn encode(&self, writer: &mut BinaryWriter);

    fn encoded_bytes(&self) -> Vec<u8> {
        let mut writer = BinaryWriter::new();
        self.encode(&mut writer);
        writer.into_bytes()
    }
}

/// Types that can be read back from their wire encoding.
pub trait Decodable: Sized {
    fn decode(reader: &mut BinaryReader<'_>) -> Result<Self>;
}

/// Cursor over a borrowed byte slice.
pub struct BinaryReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> BinaryReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        BinaryReader { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Read `n` bytes and advance.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        if n > self.remaining() {
            return Err(TxError::Truncated { needed: n, remaining: self.remaining() });
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        Ok(i64::from_le_bytes(self.read_array()?))
    }

    pub fn read_hash160(&mut self) -> Result<Hash160> {
        Ok(Hash160::from_bytes(self.read_array()?))
    }

    pub fn read_hash256(&mut self) -> Result<Hash256> {
        Ok(Hash256::from_bytes(self.read_array()?))
    }

    pub fn read_var_int(&mut self) -> Result<u64> {
        match self.read_u8()? {
            0xfd => Ok(self.read_u16()? as u64),
            0xfe => Ok(self.read_u32()? as u64),
            0xff => self.read_u64(),
            b => Ok(b as u64),
        }
    }

    /// Read a VarInt length and make sure that many bytes could follow.
    fn read_length(&mut self) -> Result<usize> {
        let len = self.read_var_int()?;
        let remaining = self.remaining();
        if len > remaining as u64 {
            return Err(TxError::Truncated {
                needed: usize::try_from(len).unwrap_or(usize::MAX),
                remaining,
            });
        }
        Ok(len as usize)
    }

    pub fn read_var_bytes(&mut self) -> Result<Vec<u8>> {
        let len = self.read_length()?;
        Ok(self.read_bytes(len)?.to_vec())
    }

    pub fn read_var_string(&mut self) -> Result<String> {
        let bytes = self.read_var_bytes()?;
        String::from_utf8(bytes).map_err(|e| TxError::InvalidString(e.to_string()))
    }

    /// Read a VarInt count followed by that many items.
    pub fn read_list<T: Decodable>(&mut self) -> Result<Vec<T>> {
        // every item occupies at least one byte
        let count = self.read_length()?;
        let mut items = Vec::with_capacity(count);
        for _ in 0..count {
            items.push(T::decode(self)?);
        }
        Ok(items)
    }
}

/// Growable output buffer.
#[derive(Debug, Default, Clone)]
pub struct BinaryWriter {
    buf: Vec<u8>,
}

impl BinaryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        BinaryWriter { buf: Vec::with_capacity(capacity) }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn write_bool(&mut self, v: bool) {
        self.write_u8(v as u8);
    }

    pub fn write_u16(&mut self, v: u16) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub fn write_u32(&mut self, v: u32) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub fn write_u64(&mut self, v: u64) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub fn write_i64(&mut self, v: i64) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub fn write_var_int(&mut self, v: u64) {
        if v < 0xfd {
            self.write_u8(v as u8);
        } else if v <= 0xffff {
            self.write_u8(0xfd);
            self.write_u16(v as u16);
        } else if v <= 0xffff_ffff {
            self.write_u8(0xfe);
            self.write_u32(v as u32);
        } else {
            self.write_u8(0xff);
            self.write_u64(v);
        }
    }

    pub fn write_var_bytes(&mut self, bytes: &[u8]) {
        self.write_var_int(bytes.len() as u64);
        self.write_bytes(bytes);
    }

    pub fn write_var_string(&mut self, s: &str) {
        self.write_var_bytes(s.as_bytes());
    }

    /// Write a VarInt count followed by each item.
    pub fn write_list<T: Encodable>(&mut self, items: &[T]) {
        self.write_var_int(items.len() as u64);
        for item in items {
            item.encode(self);
        }
    }
}

impl Encodable for Hash160 {
    fn encode(&self, writer: &mut BinaryWriter) {
        writer.write_bytes(self.as_bytes());
    }
}

impl Decodable for Hash160 {
    fn decode(reader: &mut BinaryReader<'_>) -> Result<Self> {
        reader.read_hash160()
    }
}

impl Encodable for Hash256 {
    fn encode(&self, writer: &mut BinaryWriter) {
        writer.write_bytes(self.as_bytes());
    }
}

impl Decodable for Hash256 {
    fn decode(reader: &mut BinaryReader<'_>) -> Result<Self> {
        reader.read_hash256()
    }
}
