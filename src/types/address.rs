//! Stacks addresses and the c32check encoding.
//!
//! A Stacks address is a version byte plus a 20-byte HASH160, rendered as
//! `S` followed by the version character and the c32 encoding of
//! `hash160 ‖ checksum`, where the checksum is the first four bytes of a
//! double SHA-256 over `version ‖ hash160`.

use std::fmt::{self, Debug, Display};
use std::str::FromStr;

use sha2::{Digest, Sha256};

use crate::error::ParseAddressError;
use crate::types::key::{Hash160, StacksPublicKey};
use crate::types::network::Network;

/// The c32 alphabet (Crockford-style: no I, L, O, U).
const C32_CHARACTERS: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

/// Map a c32 character to its value, applying the standard homoglyph
/// normalization (lowercase folds up; O→0, L→1, I→1).
fn c32_value(c: char) -> Result<u8, ParseAddressError> {
    let c = match c.to_ascii_uppercase() {
        'O' => '0',
        'L' | 'I' => '1',
        other => other,
    };
    C32_CHARACTERS
        .iter()
        .position(|&a| a as char == c)
        .map(|i| i as u8)
        .ok_or(ParseAddressError::InvalidChar(c))
}

/// Encode bytes as a c32 string.
///
/// The input is treated as a big-endian bit string packed into 5-bit groups
/// from the right; leading zero bytes are preserved as leading `0` digits.
fn c32_encode(input: &[u8]) -> String {
    let mut result: Vec<u8> = Vec::new();
    let mut carry: u8 = 0;
    let mut carry_bits: u8 = 0;

    for current in input.iter().rev() {
        let low_bits_to_take = 5 - carry_bits;
        let low_bits = current & ((1 << low_bits_to_take) - 1);
        let c32_value = (low_bits << carry_bits) + carry;
        result.push(C32_CHARACTERS[c32_value as usize]);
        carry_bits = (8 + carry_bits) - 5;
        carry = current >> (8 - carry_bits);

        if carry_bits >= 5 {
            let c32_value = carry & ((1 << 5) - 1);
            result.push(C32_CHARACTERS[c32_value as usize]);
            carry_bits -= 5;
            carry >>= 5;
        }
    }
    if carry_bits > 0 {
        result.push(C32_CHARACTERS[carry as usize]);
    }

    // Strip padding zeros from the big end, then restore one `0` digit per
    // leading zero byte of the input.
    while let Some(v) = result.pop() {
        if v != C32_CHARACTERS[0] {
            result.push(v);
            break;
        }
    }
    for current in input {
        if *current == 0 {
            result.push(C32_CHARACTERS[0]);
        } else {
            break;
        }
    }

    result.iter().rev().map(|&b| b as char).collect()
}

/// Decode a c32 string back into bytes.
fn c32_decode(input: &str) -> Result<Vec<u8>, ParseAddressError> {
    let mut result: Vec<u8> = Vec::new();
    let mut carry: u16 = 0;
    let mut carry_bits: u8 = 0;

    for c in input.chars().rev() {
        carry += u16::from(c32_value(c)?) << carry_bits;
        carry_bits += 5;
        if carry_bits >= 8 {
            result.push((carry & 0xff) as u8);
            carry_bits -= 8;
            carry >>= 8;
        }
    }
    if carry_bits > 0 && carry != 0 {
        result.push(carry as u8);
    }

    // Strip zero padding, then restore one zero byte per leading `0` digit.
    while let Some(v) = result.pop() {
        if v != 0 {
            result.push(v);
            break;
        }
    }
    for c in input.chars() {
        if c == '0' {
            result.push(0);
        } else {
            break;
        }
    }

    result.reverse();
    Ok(result)
}

/// First four bytes of a double SHA-256 over `version ‖ data`.
fn checksum(version: u8, data: &[u8]) -> [u8; 4] {
    let mut hasher = Sha256::new();
    hasher.update([version]);
    hasher.update(data);
    let first = hasher.finalize();
    let second = Sha256::digest(first);
    let mut sum = [0u8; 4];
    sum.copy_from_slice(&second[..4]);
    sum
}

// ============================================================================
// StacksAddress
// ============================================================================

/// A Stacks account or contract address: version byte plus HASH160.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct StacksAddress {
    version: u8,
    hash160: Hash160,
}

impl StacksAddress {
    /// Create an address from a version byte and HASH160.
    pub const fn new(version: u8, hash160: Hash160) -> Self {
        Self { version, hash160 }
    }

    /// Derive the single-signature address of a public key on the given
    /// network: `network version ‖ HASH160(key bytes)`.
    pub fn from_public_key(network: Network, key: &StacksPublicKey) -> Self {
        Self {
            version: network.address_version(),
            hash160: key.hash160(),
        }
    }

    /// The address version byte.
    pub fn version(&self) -> u8 {
        self.version
    }

    /// The 20-byte HASH160 payload.
    pub fn hash160(&self) -> &Hash160 {
        &self.hash160
    }
}

impl Display for StacksAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.hash160.as_bytes();
        let mut payload = data.to_vec();
        payload.extend_from_slice(&checksum(self.version, data));
        write!(
            f,
            "S{}{}",
            C32_CHARACTERS[self.version as usize & 0x1f] as char,
            c32_encode(&payload)
        )
    }
}

impl Debug for StacksAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StacksAddress({})", self)
    }
}

impl FromStr for StacksAddress {
    type Err = ParseAddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // "S" + version char + at least the 4 checksum bytes of payload.
        if s.len() < 9 {
            return Err(ParseAddressError::TooShort(s.to_string()));
        }
        let mut chars = s.chars();
        if chars.next() != Some('S') {
            return Err(ParseAddressError::MissingPrefix(s.to_string()));
        }
        let version = c32_value(chars.next().ok_or_else(|| {
            ParseAddressError::TooShort(s.to_string())
        })?)?;

        let decoded = c32_decode(chars.as_str())?;
        if decoded.len() < 4 {
            return Err(ParseAddressError::TooShort(s.to_string()));
        }
        let (data, sum) = decoded.split_at(decoded.len() - 4);
        if sum != checksum(version, data) {
            return Err(ParseAddressError::BadChecksum);
        }
        if data.len() != 20 {
            return Err(ParseAddressError::BadLength(data.len()));
        }

        let mut hash_bytes = [0u8; 20];
        hash_bytes.copy_from_slice(data);
        Ok(Self {
            version,
            hash160: Hash160::from_bytes(hash_bytes),
        })
    }
}
