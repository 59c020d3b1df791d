//! Public keys and signatures.
//!
//! This crate never holds private key material: signatures are produced by
//! an external custodial signer and arrive as a recoverable
//! `(recovery id, r, s)` triple. The types here cover the public-key side
//! (parsing, HASH160 for spending conditions and addresses) and the wire
//! form of the signature.

use std::fmt::{self, Debug, Display};
use std::str::FromStr;

use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

use crate::error::ParseKeyError;

/// Compressed SEC1 public key length.
const COMPRESSED_LEN: usize = 33;
/// Uncompressed SEC1 public key length.
const UNCOMPRESSED_LEN: usize = 65;

// ============================================================================
// Hash160
// ============================================================================

/// A 20-byte HASH160 digest: RIPEMD-160 over SHA-256.
///
/// Used both as the signer field of a spending condition and as the payload
/// of a Stacks address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Hash160([u8; 20]);

impl Hash160 {
    /// Hash the given data.
    pub fn hash(data: &[u8]) -> Self {
        let sha = Sha256::digest(data);
        let ripe = Ripemd160::digest(sha);
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&ripe);
        Self(bytes)
    }

    /// Create from raw 20 bytes.
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Get the raw 20 bytes.
    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl From<[u8; 20]> for Hash160 {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Hash160 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Display for Hash160 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl Debug for Hash160 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash160({})", self)
    }
}

// ============================================================================
// StacksPublicKey
// ============================================================================

/// A secp256k1 public key in SEC1 encoding (33-byte compressed or 65-byte
/// uncompressed), validated to be a point on the curve at parse time.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct StacksPublicKey {
    bytes: Vec<u8>,
}

impl StacksPublicKey {
    /// Parse a public key from raw SEC1 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ParseKeyError> {
        if bytes.len() != COMPRESSED_LEN && bytes.len() != UNCOMPRESSED_LEN {
            return Err(ParseKeyError::InvalidLength(bytes.len()));
        }
        k256::PublicKey::from_sec1_bytes(bytes).map_err(|_| ParseKeyError::InvalidCurvePoint)?;
        Ok(Self {
            bytes: bytes.to_vec(),
        })
    }

    /// Parse a public key from a hex string (with or without `0x` prefix).
    pub fn from_hex(s: &str) -> Result<Self, ParseKeyError> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s).map_err(|e| ParseKeyError::InvalidHex(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    /// The raw SEC1 bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Lowercase hex encoding of the SEC1 bytes.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    /// Whether the key uses the 33-byte compressed encoding.
    pub fn is_compressed(&self) -> bool {
        self.bytes.len() == COMPRESSED_LEN
    }

    /// HASH160 of the SEC1 bytes, as used by single-sig spending conditions
    /// and address derivation.
    pub fn hash160(&self) -> Hash160 {
        Hash160::hash(&self.bytes)
    }
}

impl FromStr for StacksPublicKey {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Display for StacksPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Debug for StacksPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StacksPublicKey({})", self)
    }
}

// ============================================================================
// Signatures
// ============================================================================

/// A recoverable secp256k1 signature as returned by the custodial signer.
///
/// `r` and `s` are left-padded to 32 bytes each; `recovery_id` is the
/// low byte the signer calls `v`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecoverableSignature {
    pub recovery_id: u8,
    pub r: [u8; 32],
    pub s: [u8; 32],
}

impl RecoverableSignature {
    /// Pack into the 65-byte wire form `recovery_id ‖ r ‖ s`.
    pub fn to_message_signature(&self) -> MessageSignature {
        let mut bytes = [0u8; 65];
        bytes[0] = self.recovery_id;
        bytes[1..33].copy_from_slice(&self.r);
        bytes[33..].copy_from_slice(&self.s);
        MessageSignature(bytes)
    }
}

/// The 65-byte signature slot of a single-sig spending condition.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct MessageSignature([u8; 65]);

impl MessageSignature {
    /// The zero-filled placeholder an unsigned transaction carries, so that
    /// pre-sign hashing operates on a byte-stable structure.
    pub const EMPTY: Self = Self([0; 65]);

    /// Create from raw 65 bytes.
    pub const fn from_bytes(bytes: [u8; 65]) -> Self {
        Self(bytes)
    }

    /// Get the raw 65 bytes.
    pub const fn as_bytes(&self) -> &[u8; 65] {
        &self.0
    }

    /// Whether this is still the zero placeholder.
    pub fn is_empty(&self) -> bool {
        self.0 == [0u8; 65]
    }
}

impl Display for MessageSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl Debug for MessageSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MessageSignature({})", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Generator point of secp256k1, compressed.
    const GENERATOR_HEX: &str =
        "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";

    #[test]
    fn test_public_key_parse_roundtrip() {
        let key = StacksPublicKey::from_hex(GENERATOR_HEX).unwrap();
        assert!(key.is_compressed());
        assert_eq!(key.to_hex(), GENERATOR_HEX);
        assert_eq!(key.as_bytes().len(), 33);

        // 0x prefix accepted
        let prefixed = format!("0x{GENERATOR_HEX}");
        assert_eq!(StacksPublicKey::from_hex(&prefixed).unwrap(), key);
    }

    #[test]
    fn test_public_key_rejects_bad_input() {
        assert_eq!(
            StacksPublicKey::from_hex("02abcd"),
            Err(ParseKeyError::InvalidLength(3))
        );
        assert!(matches!(
            StacksPublicKey::from_hex("zz"),
            Err(ParseKeyError::InvalidHex(_))
        ));
        // Right length, not a curve point.
        let not_a_point = format!("02{}", "00".repeat(32));
        assert_eq!(
            StacksPublicKey::from_hex(&not_a_point),
            Err(ParseKeyError::InvalidCurvePoint)
        );
    }

    #[test]
    fn test_hash160_known_vector() {
        // HASH160 of the empty string.
        assert_eq!(
            Hash160::hash(b"").to_string(),
            "b472a266d0bd89c13706a4132ccfb16f7c3b9fcb"
        );
    }

    #[test]
    fn test_message_signature_layout() {
        let sig = RecoverableSignature {
            recovery_id: 1,
            r: [0xab; 32],
            s: [0xcd; 32],
        };
        let packed = sig.to_message_signature();
        let bytes = packed.as_bytes();
        assert_eq!(bytes[0], 0x01);
        assert_eq!(&bytes[1..33], &[0xab; 32]);
        assert_eq!(&bytes[33..], &[0xcd; 32]);
        assert!(!packed.is_empty());
        assert!(MessageSignature::EMPTY.is_empty());
    }
}
