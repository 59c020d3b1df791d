//! Clarity values and their wire codec.
//!
//! Contract-call arguments and read-only results travel as a self-describing
//! binary format: a type tag byte followed by the payload, so decoding never
//! needs external type hints. The node API carries these as 0x-prefixed hex
//! strings.

use std::fmt::{self, Debug, Display};
use std::str::FromStr;

use crate::error::{DecodeError, EncodeError, ParseContractIdError, ParseNameError};
use crate::types::address::StacksAddress;

// Wire type tags.
const TAG_UINT: u8 = 0x01;
const TAG_BUFFER: u8 = 0x02;
const TAG_BOOL_TRUE: u8 = 0x03;
const TAG_BOOL_FALSE: u8 = 0x04;
const TAG_PRINCIPAL_STANDARD: u8 = 0x05;
const TAG_PRINCIPAL_CONTRACT: u8 = 0x06;
const TAG_RESPONSE_OK: u8 = 0x07;
const TAG_RESPONSE_ERR: u8 = 0x08;
const TAG_LIST: u8 = 0x0b;

/// Maximum length of a Clarity contract or function name.
const MAX_NAME_LEN: usize = 128;

// ============================================================================
// Names and contract identifiers
// ============================================================================

/// A validated Clarity identifier: a contract name or function name.
///
/// Names start with a letter and contain letters, digits, `-`, `_`, `?`
/// or `!`, at most 128 characters.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ClarityName(String);

impl ClarityName {
    /// Validate and wrap a name.
    pub fn new(name: impl Into<String>) -> Result<Self, ParseNameError> {
        let name = name.into();
        if name.len() > MAX_NAME_LEN {
            return Err(ParseNameError::TooLong(name));
        }
        let mut chars = name.chars();
        match chars.next() {
            None => return Err(ParseNameError::Empty),
            Some(c) if !c.is_ascii_alphabetic() => {
                return Err(ParseNameError::InvalidChar(name.clone(), c));
            }
            Some(_) => {}
        }
        if let Some(c) = chars.find(|c| !c.is_ascii_alphanumeric() && !"-_?!".contains(*c)) {
            return Err(ParseNameError::InvalidChar(name.clone(), c));
        }
        Ok(Self(name))
    }

    /// The name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ClarityName {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Display for ClarityName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Debug for ClarityName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClarityName({})", self.0)
    }
}

/// A fully qualified contract identifier: `address.contract-name`.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ContractId {
    pub address: StacksAddress,
    pub name: ClarityName,
}

impl ContractId {
    /// Create from parts.
    pub const fn new(address: StacksAddress, name: ClarityName) -> Self {
        Self { address, name }
    }
}

impl FromStr for ContractId {
    type Err = ParseContractIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (address, name) = s
            .split_once('.')
            .ok_or_else(|| ParseContractIdError::MissingSeparator(s.to_string()))?;
        Ok(Self {
            address: address.parse()?,
            name: name.parse()?,
        })
    }
}

impl Display for ContractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.address, self.name)
    }
}

impl Debug for ContractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContractId({})", self)
    }
}

// ============================================================================
// Principals
// ============================================================================

/// An account or contract principal.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum PrincipalData {
    /// A standard (account) principal.
    Standard(StacksAddress),
    /// A contract principal.
    Contract(ContractId),
}

impl Display for PrincipalData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrincipalData::Standard(addr) => Display::fmt(addr, f),
            PrincipalData::Contract(id) => Display::fmt(id, f),
        }
    }
}

impl From<StacksAddress> for PrincipalData {
    fn from(addr: StacksAddress) -> Self {
        PrincipalData::Standard(addr)
    }
}

impl From<ContractId> for PrincipalData {
    fn from(id: ContractId) -> Self {
        PrincipalData::Contract(id)
    }
}

// ============================================================================
// ClarityValue
// ============================================================================

/// A typed Clarity value.
///
/// The invariant the codec upholds: `decode(encode(v)) == v` for every
/// constructible value.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum ClarityValue {
    /// An unsigned 128-bit integer.
    UInt(u128),
    /// A boolean (`true` / `false`).
    Bool(bool),
    /// A byte buffer (`0x…`).
    Buffer(Vec<u8>),
    /// An account or contract principal.
    Principal(PrincipalData),
    /// A homogeneous-on-chain (but not enforced here) list of values.
    List(Vec<ClarityValue>),
    /// `(ok inner)`.
    ResponseOk(Box<ClarityValue>),
    /// `(err inner)`.
    ResponseErr(Box<ClarityValue>),
}

impl ClarityValue {
    /// A uint value.
    pub fn uint(value: impl Into<u128>) -> Self {
        ClarityValue::UInt(value.into())
    }

    /// A uint value from a signed integer; negative inputs fail.
    pub fn try_uint(value: i128) -> Result<Self, EncodeError> {
        u128::try_from(value)
            .map(ClarityValue::UInt)
            .map_err(|_| EncodeError::IntOutOfRange(value))
    }

    /// A bool value.
    pub fn bool(value: bool) -> Self {
        ClarityValue::Bool(value)
    }

    /// A buffer value.
    pub fn buffer(bytes: impl Into<Vec<u8>>) -> Self {
        ClarityValue::Buffer(bytes.into())
    }

    /// A standard principal value.
    pub fn principal(address: StacksAddress) -> Self {
        ClarityValue::Principal(PrincipalData::Standard(address))
    }

    /// A contract principal value.
    pub fn contract_principal(id: ContractId) -> Self {
        ClarityValue::Principal(PrincipalData::Contract(id))
    }

    /// A list value.
    pub fn list(values: impl Into<Vec<ClarityValue>>) -> Self {
        ClarityValue::List(values.into())
    }

    /// An `(ok …)` response.
    pub fn ok(inner: ClarityValue) -> Self {
        ClarityValue::ResponseOk(Box::new(inner))
    }

    /// An `(err …)` response.
    pub fn err(inner: ClarityValue) -> Self {
        ClarityValue::ResponseErr(Box::new(inner))
    }

    // ========================================================================
    // Encoding
    // ========================================================================

    /// Serialize to wire bytes.
    pub fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        let mut out = Vec::new();
        self.encode_into(&mut out)?;
        Ok(out)
    }

    /// Serialize to a 0x-prefixed hex string, the form the node API expects.
    pub fn encode_hex(&self) -> Result<String, EncodeError> {
        Ok(format!("0x{}", hex::encode(self.encode()?)))
    }

    fn encode_into(&self, out: &mut Vec<u8>) -> Result<(), EncodeError> {
        match self {
            ClarityValue::UInt(value) => {
                out.push(TAG_UINT);
                out.extend_from_slice(&value.to_be_bytes());
            }
            ClarityValue::Bool(true) => out.push(TAG_BOOL_TRUE),
            ClarityValue::Bool(false) => out.push(TAG_BOOL_FALSE),
            ClarityValue::Buffer(bytes) => {
                let len = u32::try_from(bytes.len())
                    .map_err(|_| EncodeError::BufferTooLong(bytes.len()))?;
                out.push(TAG_BUFFER);
                out.extend_from_slice(&len.to_be_bytes());
                out.extend_from_slice(bytes);
            }
            ClarityValue::Principal(principal) => encode_principal(principal, out),
            ClarityValue::List(values) => {
                let len = u32::try_from(values.len())
                    .map_err(|_| EncodeError::ListTooLong(values.len()))?;
                out.push(TAG_LIST);
                out.extend_from_slice(&len.to_be_bytes());
                for value in values {
                    value.encode_into(out)?;
                }
            }
            ClarityValue::ResponseOk(inner) => {
                out.push(TAG_RESPONSE_OK);
                inner.encode_into(out)?;
            }
            ClarityValue::ResponseErr(inner) => {
                out.push(TAG_RESPONSE_ERR);
                inner.encode_into(out)?;
            }
        }
        Ok(())
    }

    // ========================================================================
    // Decoding
    // ========================================================================

    /// Deserialize a single value from wire bytes, rejecting trailing input.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut reader = Reader::new(bytes);
        let value = reader.read_value()?;
        if reader.remaining() > 0 {
            return Err(DecodeError::TrailingBytes {
                offset: reader.offset,
                remaining: reader.remaining(),
            });
        }
        Ok(value)
    }

    /// Deserialize from a hex string (with or without `0x` prefix).
    pub fn decode_hex(s: &str) -> Result<Self, DecodeError> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s).map_err(|e| DecodeError::InvalidHex(e.to_string()))?;
        Self::decode(&bytes)
    }
}

impl Display for ClarityValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClarityValue::UInt(v) => write!(f, "u{v}"),
            ClarityValue::Bool(v) => write!(f, "{v}"),
            ClarityValue::Buffer(bytes) => write!(f, "0x{}", hex::encode(bytes)),
            ClarityValue::Principal(p) => write!(f, "'{p}"),
            ClarityValue::List(values) => {
                write!(f, "(list")?;
                for value in values {
                    write!(f, " {value}")?;
                }
                write!(f, ")")
            }
            ClarityValue::ResponseOk(inner) => write!(f, "(ok {inner})"),
            ClarityValue::ResponseErr(inner) => write!(f, "(err {inner})"),
        }
    }
}

fn encode_principal(principal: &PrincipalData, out: &mut Vec<u8>) {
    match principal {
        PrincipalData::Standard(addr) => {
            out.push(TAG_PRINCIPAL_STANDARD);
            out.push(addr.version());
            out.extend_from_slice(addr.hash160().as_bytes());
        }
        PrincipalData::Contract(id) => {
            out.push(TAG_PRINCIPAL_CONTRACT);
            out.push(id.address.version());
            out.extend_from_slice(id.address.hash160().as_bytes());
            // Name length always fits one byte: names are capped at 128.
            out.push(id.name.as_str().len() as u8);
            out.extend_from_slice(id.name.as_str().as_bytes());
        }
    }
}

/// Cursor over wire bytes that tracks the running offset for error
/// reporting.
struct Reader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.offset
    }

    fn take(&mut self, n: usize, expected: &'static str) -> Result<&'a [u8], DecodeError> {
        if self.remaining() < n {
            return Err(DecodeError::UnexpectedEnd {
                offset: self.offset,
                expected,
            });
        }
        let slice = &self.bytes[self.offset..self.offset + n];
        self.offset += n;
        Ok(slice)
    }

    fn read_u8(&mut self, expected: &'static str) -> Result<u8, DecodeError> {
        Ok(self.take(1, expected)?[0])
    }

    fn read_u32(&mut self, expected: &'static str) -> Result<u32, DecodeError> {
        let bytes = self.take(4, expected)?;
        Ok(u32::from_be_bytes(bytes.try_into().unwrap()))
    }

    fn read_value(&mut self) -> Result<ClarityValue, DecodeError> {
        let tag_offset = self.offset;
        let tag = self.read_u8("type tag")?;
        match tag {
            TAG_UINT => {
                let bytes = self.take(16, "uint payload")?;
                Ok(ClarityValue::UInt(u128::from_be_bytes(
                    bytes.try_into().unwrap(),
                )))
            }
            TAG_BOOL_TRUE => Ok(ClarityValue::Bool(true)),
            TAG_BOOL_FALSE => Ok(ClarityValue::Bool(false)),
            TAG_BUFFER => {
                let len = self.read_u32("buffer length")? as usize;
                let bytes = self.take(len, "buffer payload")?;
                Ok(ClarityValue::Buffer(bytes.to_vec()))
            }
            TAG_PRINCIPAL_STANDARD => {
                let addr = self.read_address()?;
                Ok(ClarityValue::Principal(PrincipalData::Standard(addr)))
            }
            TAG_PRINCIPAL_CONTRACT => {
                let addr = self.read_address()?;
                let name = self.read_name()?;
                Ok(ClarityValue::Principal(PrincipalData::Contract(
                    ContractId::new(addr, name),
                )))
            }
            TAG_RESPONSE_OK => Ok(ClarityValue::ok(self.read_value()?)),
            TAG_RESPONSE_ERR => Ok(ClarityValue::err(self.read_value()?)),
            TAG_LIST => {
                let len = self.read_u32("list length")? as usize;
                let mut values = Vec::with_capacity(len.min(1024));
                for _ in 0..len {
                    values.push(self.read_value()?);
                }
                Ok(ClarityValue::List(values))
            }
            tag => Err(DecodeError::UnknownTag {
                offset: tag_offset,
                tag,
            }),
        }
    }

    fn read_address(&mut self) -> Result<StacksAddress, DecodeError> {
        let version = self.read_u8("principal version")?;
        let hash = self.take(20, "principal hash160")?;
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(hash);
        Ok(StacksAddress::new(version, bytes.into()))
    }

    fn read_name(&mut self) -> Result<ClarityName, DecodeError> {
        let name_offset = self.offset;
        let len = self.read_u8("name length")? as usize;
        let bytes = self.take(len, "name")?;
        let s = std::str::from_utf8(bytes)
            .map_err(|_| DecodeError::BadName { offset: name_offset })?;
        ClarityName::new(s).map_err(|_| DecodeError::BadName { offset: name_offset })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_address() -> StacksAddress {
        "SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ7".parse().unwrap()
    }

    fn roundtrip(value: ClarityValue) {
        let encoded = value.encode().unwrap();
        assert_eq!(ClarityValue::decode(&encoded).unwrap(), value);
        // Hex convenience path agrees with the byte path.
        let hex = value.encode_hex().unwrap();
        assert_eq!(ClarityValue::decode_hex(&hex).unwrap(), value);
    }

    #[test]
    fn test_roundtrip_scalars() {
        roundtrip(ClarityValue::uint(0u64));
        roundtrip(ClarityValue::uint(3u64));
        roundtrip(ClarityValue::UInt(u128::MAX));
        roundtrip(ClarityValue::bool(true));
        roundtrip(ClarityValue::bool(false));
        roundtrip(ClarityValue::buffer(Vec::new()));
        roundtrip(ClarityValue::buffer(b"hello".to_vec()));
        roundtrip(ClarityValue::principal(sample_address()));
    }

    #[test]
    fn test_roundtrip_nested() {
        let contract = ContractId::new(sample_address(), "campus".parse().unwrap());
        roundtrip(ClarityValue::contract_principal(contract));
        roundtrip(ClarityValue::ok(ClarityValue::bool(true)));
        roundtrip(ClarityValue::err(ClarityValue::uint(102u64)));
        roundtrip(ClarityValue::list(vec![
            ClarityValue::uint(1u64),
            ClarityValue::uint(3u64),
            ClarityValue::uint(5u64),
        ]));
        roundtrip(ClarityValue::ok(ClarityValue::list(vec![
            ClarityValue::err(ClarityValue::buffer(vec![0xff])),
            ClarityValue::principal(sample_address()),
            ClarityValue::List(Vec::new()),
        ])));
    }

    #[test]
    fn test_uint_wire_shape() {
        // Tag byte then 16-byte big-endian payload.
        let encoded = ClarityValue::uint(3u64).encode().unwrap();
        assert_eq!(encoded.len(), 17);
        assert_eq!(encoded[0], 0x01);
        assert_eq!(encoded[16], 3);
        assert_eq!(ClarityValue::uint(3u64).encode_hex().unwrap().len(), 2 + 34);
    }

    #[test]
    fn test_bool_wire_shape() {
        assert_eq!(ClarityValue::bool(true).encode().unwrap(), vec![0x03]);
        assert_eq!(ClarityValue::bool(false).encode().unwrap(), vec![0x04]);
    }

    #[test]
    fn test_decode_unknown_tag_names_offset() {
        // Tuple values (tag 0x0c) are outside the supported grammar.
        let err = ClarityValue::decode(&[0x0c]).unwrap_err();
        assert_eq!(err, DecodeError::UnknownTag { offset: 0, tag: 0x0c });

        // A nested unknown tag reports the nested offset.
        let err = ClarityValue::decode(&[0x07, 0x00]).unwrap_err();
        assert_eq!(err, DecodeError::UnknownTag { offset: 1, tag: 0x00 });
    }

    #[test]
    fn test_decode_truncation_names_offset() {
        let err = ClarityValue::decode(&[0x01, 0x00, 0x00]).unwrap_err();
        assert_eq!(
            err,
            DecodeError::UnexpectedEnd {
                offset: 1,
                expected: "uint payload"
            }
        );

        // List announcing three elements but carrying one.
        let mut bytes = vec![0x0b, 0, 0, 0, 3];
        bytes.extend(ClarityValue::bool(true).encode().unwrap());
        let err = ClarityValue::decode(&bytes).unwrap_err();
        assert!(matches!(err, DecodeError::UnexpectedEnd { offset: 6, .. }));
    }

    #[test]
    fn test_decode_rejects_trailing_bytes() {
        let mut bytes = ClarityValue::bool(true).encode().unwrap();
        bytes.push(0xaa);
        let err = ClarityValue::decode(&bytes).unwrap_err();
        assert_eq!(
            err,
            DecodeError::TrailingBytes {
                offset: 1,
                remaining: 1
            }
        );
    }

    #[test]
    fn test_try_uint_rejects_negative() {
        assert_eq!(
            ClarityValue::try_uint(-1),
            Err(EncodeError::IntOutOfRange(-1))
        );
        assert_eq!(ClarityValue::try_uint(7), Ok(ClarityValue::uint(7u64)));
    }

    #[test]
    fn test_clarity_name_validation() {
        assert!("enroll-course".parse::<ClarityName>().is_ok());
        assert!("is-whitelisted-beta".parse::<ClarityName>().is_ok());
        assert!("set-greeting!".parse::<ClarityName>().is_ok());
        assert!(matches!(
            "".parse::<ClarityName>(),
            Err(ParseNameError::Empty)
        ));
        assert!(matches!(
            "9lives".parse::<ClarityName>(),
            Err(ParseNameError::InvalidChar(_, '9'))
        ));
        assert!(matches!(
            "has space".parse::<ClarityName>(),
            Err(ParseNameError::InvalidChar(_, ' '))
        ));
        assert!("a".repeat(129).parse::<ClarityName>().is_err());
    }

    #[test]
    fn test_contract_id_parse_display() {
        let id: ContractId = "SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ7.btcuni"
            .parse()
            .unwrap();
        assert_eq!(id.name.as_str(), "btcuni");
        assert_eq!(
            id.to_string(),
            "SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ7.btcuni"
        );
        assert!(matches!(
            "SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ7".parse::<ContractId>(),
            Err(ParseContractIdError::MissingSeparator(_))
        ));
    }

    #[test]
    fn test_display_forms() {
        assert_eq!(ClarityValue::uint(42u64).to_string(), "u42");
        assert_eq!(
            ClarityValue::ok(ClarityValue::bool(true)).to_string(),
            "(ok true)"
        );
        assert_eq!(
            ClarityValue::list(vec![ClarityValue::uint(1u64), ClarityValue::uint(2u64)])
                .to_string(),
            "(list u1 u2)"
        );
    }
}
