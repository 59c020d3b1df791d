//! Error types for campus-kit.
//!
//! Each concern carries its own small error enum; the top-level
//! [`Error`](enum@Error) folds them together for callers that don't need to
//! pattern-match a specific failure class.
//!
//! # Error Hierarchy
//!
//! - [`Error`](enum@Error) — Main error type, returned by most operations
//!   - [`ParseAddressError`] — Invalid c32check address
//!   - [`ParseKeyError`] — Invalid public key
//!   - [`ParseNameError`] — Invalid Clarity name
//!   - [`ParseContractIdError`] — Invalid `address.contract-name` identifier
//!   - [`EncodeError`] / [`DecodeError`] — Clarity value codec failures
//!   - [`TransportError`] — Node API failures
//!   - [`SigningError`] — Remote signer failures
//!   - [`BroadcastError`] — Transaction submission failures
//!
//! The write path surfaces every one of these; the derived read queries in
//! [`contracts`](crate::contracts) deliberately collapse failures into
//! negative results instead (see the module docs there).

use thiserror::Error;

/// Error parsing a c32check Stacks address.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseAddressError {
    #[error("Address is too short to be a c32check address: '{0}'")]
    TooShort(String),

    #[error("Address '{0}' does not start with 'S'")]
    MissingPrefix(String),

    #[error("Address contains invalid c32 character '{0}'")]
    InvalidChar(char),

    #[error("Address checksum mismatch")]
    BadChecksum,

    #[error("Address payload is {0} bytes, expected a 20-byte hash")]
    BadLength(usize),
}

/// Error parsing a secp256k1 public key.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseKeyError {
    #[error("Invalid hex encoding: {0}")]
    InvalidHex(String),

    #[error("Invalid key length: expected 33 or 65 bytes, got {0}")]
    InvalidLength(usize),

    #[error("Invalid curve point: key bytes do not represent a valid point on secp256k1")]
    InvalidCurvePoint,
}

/// Error parsing a Clarity contract or function name.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseNameError {
    #[error("Clarity name is empty")]
    Empty,

    #[error("Clarity name '{0}' is too long (max 128 characters)")]
    TooLong(String),

    #[error("Clarity name '{0}' contains invalid character '{1}'")]
    InvalidChar(String, char),
}

/// Error parsing an `address.contract-name` identifier.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseContractIdError {
    #[error("Contract identifier '{0}' is missing the '.' separator")]
    MissingSeparator(String),

    #[error(transparent)]
    InvalidAddress(#[from] ParseAddressError),

    #[error(transparent)]
    InvalidName(#[from] ParseNameError),
}

/// Error serializing a Clarity value or transaction to wire format.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EncodeError {
    #[error("Buffer of {0} bytes does not fit a 32-bit length prefix")]
    BufferTooLong(usize),

    #[error("List of {0} elements does not fit a 32-bit length prefix")]
    ListTooLong(usize),

    #[error("Memo of {0} bytes exceeds the 34-byte field")]
    MemoTooLong(usize),

    #[error("Integer {0} is out of range for a Clarity uint")]
    IntOutOfRange(i128),
}

/// Error deserializing a Clarity value from wire format.
///
/// Offsets are byte positions into the input being decoded.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Unexpected end of input at offset {offset} while reading {expected}")]
    UnexpectedEnd { offset: usize, expected: &'static str },

    #[error("Unknown Clarity type tag 0x{tag:02x} at offset {offset}")]
    UnknownTag { offset: usize, tag: u8 },

    #[error("{remaining} trailing bytes after value ending at offset {offset}")]
    TrailingBytes { offset: usize, remaining: usize },

    #[error("Name at offset {offset} is not valid ASCII")]
    BadName { offset: usize },

    #[error("Invalid hex encoding: {0}")]
    InvalidHex(String),
}

/// Error talking to the node API.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Error obtaining a signature from the remote custodial signer.
///
/// None of these are retried automatically: by the time a signature request
/// has been issued for a nonce, that nonce must be treated as consumed.
#[derive(Debug, Error)]
pub enum SigningError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Signer rejected the request (HTTP {status}): {body}")]
    Denied { status: u16, body: String },

    #[error("Malformed signer response: {0}")]
    MalformedResponse(String),

    #[error("Invalid '{field}' in signer response: '{value}'")]
    InvalidField { field: &'static str, value: String },
}

/// Error broadcasting a signed transaction.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BroadcastError {
    #[error("Transaction rejected by node: {reason}")]
    Rejected {
        /// The node's reason, verbatim.
        reason: String,
        /// Transaction id the node echoed back, when present.
        txid: Option<String>,
    },

    #[error("Unexpected broadcast response: {0}")]
    UnexpectedResponse(String),
}

/// Main error type for campus-kit operations.
#[derive(Debug, Error)]
pub enum Error {
    // ─── Configuration ───
    #[error("No signer configured. Call .signer() on StacksBuilder.")]
    NoSigner,

    #[error("Invalid configuration: {0}")]
    Config(String),

    // ─── Parsing ───
    #[error(transparent)]
    ParseAddress(#[from] ParseAddressError),

    #[error(transparent)]
    ParseKey(#[from] ParseKeyError),

    #[error(transparent)]
    ParseName(#[from] ParseNameError),

    #[error(transparent)]
    ParseContractId(#[from] ParseContractIdError),

    // ─── Codec ───
    #[error("Encode error: {0}")]
    Encode(#[from] EncodeError),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    // ─── Network ───
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Signing failed: {0}")]
    Signing(#[from] SigningError),

    #[error("Broadcast failed: {0}")]
    Broadcast(#[from] BroadcastError),
}
