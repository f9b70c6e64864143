//! Binary serialization primitives shared by transactions and scripts
//!
//! Variable-length integers, fixed-width little-endian integers, the
//! protocol's digest compositions (double SHA-256 and SHA-256+RIPEMD-160),
//! and base58check for address round-trips.
//!
//! Hash-based identifiers follow the network's byte-reversal convention:
//! digests are computed in one order and displayed/stored reversed. Parsers
//! and serializers here preserve that reversal exactly.

use num_bigint::BigUint;
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

use crate::error::{ProtocolError, Result};

const BASE58_ALPHABET: &[u8] = b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Cursor over an input byte slice. Every read checks bounds and fails with
/// `UnexpectedEndOfInput` on truncation.
#[derive(Debug)]
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        ByteReader { buf, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(ProtocolError::UnexpectedEndOfInput(format!(
                "wanted {} bytes, {} remain",
                n,
                self.remaining()
            )));
        }
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    pub fn read_byte(&mut self) -> Result<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_u16_le(&mut self) -> Result<u16> {
        let bytes = self.read_bytes(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_u32_le(&mut self) -> Result<u32> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_u64_le(&mut self) -> Result<u64> {
        let bytes = self.read_bytes(8)?;
        let mut out = [0u8; 8];
        out.copy_from_slice(bytes);
        Ok(u64::from_le_bytes(out))
    }

    /// Decode a Bitcoin varint: one byte below 0xfd, otherwise a prefix
    /// selecting a 2-, 4-, or 8-byte little-endian payload.
    pub fn read_varint(&mut self) -> Result<u64> {
        match self.read_byte()? {
            0xfd => Ok(self.read_u16_le()? as u64),
            0xfe => Ok(self.read_u32_le()? as u64),
            0xff => self.read_u64_le(),
            n => Ok(n as u64),
        }
    }
}

/// Encode a Bitcoin varint.
pub fn encode_varint(value: u64) -> Vec<u8> {
    if value < 0xfd {
        vec![value as u8]
    } else if value <= 0xffff {
        let mut out = vec![0xfd];
        out.extend_from_slice(&(value as u16).to_le_bytes());
        out
    } else if value <= 0xffff_ffff {
        let mut out = vec![0xfe];
        out.extend_from_slice(&(value as u32).to_le_bytes());
        out
    } else {
        let mut out = vec![0xff];
        out.extend_from_slice(&value.to_le_bytes());
        out
    }
}

/// SHA-256.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// Two rounds of SHA-256, the protocol's transaction/block digest.
pub fn hash256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(Sha256::digest(data)).into()
}

/// SHA-256 followed by RIPEMD-160, used for public-key and script hashes.
pub fn hash160(data: &[u8]) -> [u8; 20] {
    Ripemd160::digest(Sha256::digest(data)).into()
}

/// A big-endian 32-byte encoding of the low 256 bits of an integer.
/// Callers in this crate only pass values below 2^256 (field elements and
/// scalars); larger values are masked rather than panicking.
pub fn biguint_to_be32(value: &BigUint) -> [u8; 32] {
    let bytes = value.to_bytes_be();
    let mut out = [0u8; 32];
    match bytes.len().checked_sub(32) {
        Some(start) => out.copy_from_slice(&bytes[start..]),
        None => out[32 - bytes.len()..].copy_from_slice(&bytes),
    }
    out
}

pub fn encode_base58(data: &[u8]) -> String {
    let leading_zeros = data.iter().take_while(|&&b| b == 0).count();
    let mut num = BigUint::from_bytes_be(data);
    let fifty_eight = BigUint::from(58u8);
    let zero = BigUint::from(0u8);
    let mut result = Vec::new();
    while num > zero {
        let rem = &num % &fifty_eight;
        num /= &fifty_eight;
        let digit = rem.to_u32_digits().first().copied().unwrap_or(0) as usize;
        result.push(BASE58_ALPHABET[digit]);
    }
    for _ in 0..leading_zeros {
        result.push(b'1');
    }
    result.reverse();
    String::from_utf8(result).expect("alphabet is ASCII")
}

/// Base58 with a 4-byte hash256 checksum suffix.
pub fn encode_base58_checksum(data: &[u8]) -> String {
    let mut payload = data.to_vec();
    payload.extend_from_slice(&hash256(data)[..4]);
    encode_base58(&payload)
}

/// Decode a base58check address into its 20-byte payload, verifying the
/// checksum and stripping the version byte.
pub fn decode_base58(input: &str) -> Result<[u8; 20]> {
    let mut num = BigUint::from(0u8);
    let fifty_eight = BigUint::from(58u8);
    for c in input.bytes() {
        let digit = BASE58_ALPHABET
            .iter()
            .position(|&b| b == c)
            .ok_or_else(|| {
                ProtocolError::MalformedTransaction(format!(
                    "invalid base58 character {:?}",
                    c as char
                ))
            })?;
        num = num * &fifty_eight + BigUint::from(digit);
    }
    let bytes = num.to_bytes_be();
    if bytes.len() > 25 {
        return Err(ProtocolError::MalformedTransaction(
            "base58 payload too long for an address".to_string(),
        ));
    }
    let mut combined = [0u8; 25];
    combined[25 - bytes.len()..].copy_from_slice(&bytes);
    let (body, checksum) = combined.split_at(21);
    if &hash256(body)[..4] != checksum {
        return Err(ProtocolError::MalformedTransaction(
            "base58 checksum mismatch".to_string(),
        ));
    }
    let mut hash = [0u8; 20];
    hash.copy_from_slice(&body[1..]);
    Ok(hash)
}
