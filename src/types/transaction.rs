//! Transaction wire model: building, serialization, pre-sign hashing and
//! signature attachment.
//!
//! The write pipeline treats these types in strict sequence: a
//! [`StacksTransaction`] is built with a zero-filled signature placeholder,
//! hashed with [`presign_hash`](StacksTransaction::presign_hash), signed
//! externally, and consumed by [`attach`](StacksTransaction::attach) to
//! produce the immutable [`SignedTransaction`] that gets broadcast.

use std::fmt::{self, Debug, Display};
use std::str::FromStr;

use sha2::{Digest, Sha512_256};

use crate::error::{DecodeError, EncodeError};
use crate::types::clarity::{ClarityName, ClarityValue, ContractId, PrincipalData};
use crate::types::key::{Hash160, MessageSignature, RecoverableSignature, StacksPublicKey};
use crate::types::network::Network;

// Wire constants.
const AUTH_TYPE_STANDARD: u8 = 0x04;
const HASH_MODE_P2PKH: u8 = 0x00;
const KEY_ENCODING_COMPRESSED: u8 = 0x00;
const KEY_ENCODING_UNCOMPRESSED: u8 = 0x01;
const ANCHOR_MODE_ANY: u8 = 0x03;
const POST_CONDITION_MODE_ALLOW: u8 = 0x01;
const PAYLOAD_TOKEN_TRANSFER: u8 = 0x00;
const PAYLOAD_CONTRACT_CALL: u8 = 0x02;

/// Default fee for contract calls: 0.01 STX.
pub const DEFAULT_CONTRACT_CALL_FEE: u64 = 10_000;

/// Default fee for STX transfers.
pub const DEFAULT_TRANSFER_FEE: u64 = 180;

/// Byte length of the token-transfer memo field.
const MEMO_LEN: usize = 34;

fn sha512_256(data: &[u8]) -> [u8; 32] {
    let digest = Sha512_256::digest(data);
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&digest);
    bytes
}

// ============================================================================
// ContractCallSpec
// ============================================================================

/// Everything a single contract-call action needs: the target function, its
/// ordered arguments, and the key that will authorize it. Immutable — one
/// per user action.
#[derive(Clone, Debug)]
pub struct ContractCallSpec {
    pub contract: ContractId,
    pub function: ClarityName,
    pub args: Vec<ClarityValue>,
    pub sender_key: StacksPublicKey,
    /// Pinned nonce; resolved from the network when absent.
    pub nonce: Option<u64>,
    /// Fee in micro-STX; [`DEFAULT_CONTRACT_CALL_FEE`] when absent.
    pub fee: Option<u64>,
}

// ============================================================================
// Payloads
// ============================================================================

/// A fixed-size token-transfer memo, right-padded with zeros.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Memo([u8; MEMO_LEN]);

impl Memo {
    /// The empty memo.
    pub const EMPTY: Self = Self([0; MEMO_LEN]);

    /// Create a memo from text; fails if it exceeds the 34-byte field.
    pub fn new(text: &str) -> Result<Self, EncodeError> {
        let bytes = text.as_bytes();
        if bytes.len() > MEMO_LEN {
            return Err(EncodeError::MemoTooLong(bytes.len()));
        }
        let mut memo = [0u8; MEMO_LEN];
        memo[..bytes.len()].copy_from_slice(bytes);
        Ok(Self(memo))
    }

    /// The raw padded bytes.
    pub const fn as_bytes(&self) -> &[u8; MEMO_LEN] {
        &self.0
    }
}

impl Debug for Memo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let end = self.0.iter().position(|&b| b == 0).unwrap_or(MEMO_LEN);
        write!(f, "Memo({})", String::from_utf8_lossy(&self.0[..end]))
    }
}

/// The action a transaction performs.
#[derive(Clone, Debug)]
pub enum Payload {
    /// Invoke a public contract function.
    ContractCall {
        contract: ContractId,
        function: ClarityName,
        args: Vec<ClarityValue>,
    },
    /// Move STX to a recipient.
    TokenTransfer {
        recipient: PrincipalData,
        /// Amount in micro-STX.
        amount: u64,
        memo: Memo,
    },
}

impl Payload {
    fn serialize_into(&self, out: &mut Vec<u8>) -> Result<(), EncodeError> {
        match self {
            Payload::ContractCall {
                contract,
                function,
                args,
            } => {
                out.push(PAYLOAD_CONTRACT_CALL);
                out.push(contract.address.version());
                out.extend_from_slice(contract.address.hash160().as_bytes());
                serialize_name(&contract.name, out);
                serialize_name(function, out);
                let count =
                    u32::try_from(args.len()).map_err(|_| EncodeError::ListTooLong(args.len()))?;
                out.extend_from_slice(&count.to_be_bytes());
                for arg in args {
                    out.extend_from_slice(&arg.encode()?);
                }
            }
            Payload::TokenTransfer {
                recipient,
                amount,
                memo,
            } => {
                out.push(PAYLOAD_TOKEN_TRANSFER);
                // The recipient travels as a tagged Clarity principal.
                out.extend_from_slice(&ClarityValue::Principal(recipient.clone()).encode()?);
                out.extend_from_slice(&amount.to_be_bytes());
                out.extend_from_slice(memo.as_bytes());
            }
        }
        Ok(())
    }
}

/// Length-prefixed name: names are validated to at most 128 bytes, so the
/// length always fits the one-byte prefix.
fn serialize_name(name: &ClarityName, out: &mut Vec<u8>) {
    out.push(name.as_str().len() as u8);
    out.extend_from_slice(name.as_str().as_bytes());
}

// ============================================================================
// Spending condition
// ============================================================================

/// Single-signature spending condition: who authorizes the transaction and
/// with what nonce, fee, and signature.
#[derive(Clone, Debug)]
pub struct SpendingCondition {
    /// HASH160 of the sender's public key.
    pub signer: Hash160,
    pub nonce: u64,
    /// Fee in micro-STX.
    pub fee: u64,
    key_encoding: u8,
    pub signature: MessageSignature,
}

impl SpendingCondition {
    fn new(key: &StacksPublicKey, nonce: u64, fee: u64) -> Self {
        Self {
            signer: key.hash160(),
            nonce,
            fee,
            key_encoding: if key.is_compressed() {
                KEY_ENCODING_COMPRESSED
            } else {
                KEY_ENCODING_UNCOMPRESSED
            },
            signature: MessageSignature::EMPTY,
        }
    }

    fn serialize_into(&self, out: &mut Vec<u8>) {
        out.push(HASH_MODE_P2PKH);
        out.extend_from_slice(self.signer.as_bytes());
        out.extend_from_slice(&self.nonce.to_be_bytes());
        out.extend_from_slice(&self.fee.to_be_bytes());
        out.push(self.key_encoding);
        out.extend_from_slice(self.signature.as_bytes());
    }
}

// ============================================================================
// StacksTransaction
// ============================================================================

/// The pre-sign digest handed to the external signer.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PresignHash([u8; 32]);

impl PresignHash {
    /// The raw 32 bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// The 0x-prefixed hex form the signer's raw-payload API expects.
    pub fn to_payload_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl Display for PresignHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl Debug for PresignHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PresignHash({})", self)
    }
}

/// An unsigned transaction.
///
/// Owned exclusively by the builder until [`attach`](Self::attach) consumes
/// it; the signature slot holds the zero placeholder throughout so hashing
/// operates on a byte-stable structure.
#[derive(Clone, Debug)]
pub struct StacksTransaction {
    version: u8,
    chain_id: u32,
    auth_type: u8,
    pub condition: SpendingCondition,
    anchor_mode: u8,
    post_condition_mode: u8,
    payload: Payload,
}

impl StacksTransaction {
    /// Build an unsigned contract-call transaction.
    ///
    /// Post-condition mode is permissive (no asset-transfer guard) with an
    /// empty post-condition list, matching the platform contracts.
    pub fn contract_call(network: Network, spec: &ContractCallSpec, nonce: u64, fee: u64) -> Self {
        Self {
            version: network.transaction_version(),
            chain_id: network.chain_id(),
            auth_type: AUTH_TYPE_STANDARD,
            condition: SpendingCondition::new(&spec.sender_key, nonce, fee),
            anchor_mode: ANCHOR_MODE_ANY,
            post_condition_mode: POST_CONDITION_MODE_ALLOW,
            payload: Payload::ContractCall {
                contract: spec.contract.clone(),
                function: spec.function.clone(),
                args: spec.args.clone(),
            },
        }
    }

    /// Build an unsigned STX token-transfer transaction.
    pub fn token_transfer(
        network: Network,
        sender_key: &StacksPublicKey,
        recipient: PrincipalData,
        amount: u64,
        memo: Memo,
        nonce: u64,
        fee: u64,
    ) -> Self {
        Self {
            version: network.transaction_version(),
            chain_id: network.chain_id(),
            auth_type: AUTH_TYPE_STANDARD,
            condition: SpendingCondition::new(sender_key, nonce, fee),
            anchor_mode: ANCHOR_MODE_ANY,
            post_condition_mode: POST_CONDITION_MODE_ALLOW,
            payload: Payload::TokenTransfer {
                recipient,
                amount,
                memo,
            },
        }
    }

    /// The payload this transaction carries.
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Serialize to wire bytes.
    pub fn serialize(&self) -> Result<Vec<u8>, EncodeError> {
        let mut out = Vec::with_capacity(128);
        out.push(self.version);
        out.extend_from_slice(&self.chain_id.to_be_bytes());
        out.push(self.auth_type);
        self.condition.serialize_into(&mut out);
        out.push(self.anchor_mode);
        out.push(self.post_condition_mode);
        // Post-condition list is always empty here: count only.
        out.extend_from_slice(&0u32.to_be_bytes());
        self.payload.serialize_into(&mut out)?;
        Ok(out)
    }

    /// Digest of the transaction with fee, nonce, and signature cleared —
    /// the starting point of the signature hash chain.
    fn initial_sig_hash(&self) -> Result<[u8; 32], EncodeError> {
        let mut cleared = self.clone();
        cleared.condition.fee = 0;
        cleared.condition.nonce = 0;
        cleared.condition.signature = MessageSignature::EMPTY;
        Ok(sha512_256(&cleared.serialize()?))
    }

    /// The exact 32-byte digest the external signer must sign.
    ///
    /// SHA-512/256 over `initial sig hash ‖ auth type ‖ fee ‖ nonce`, with
    /// fee and nonce big-endian. Byte-identical transactions yield
    /// byte-identical digests; anything else would fail on-chain
    /// verification.
    pub fn presign_hash(&self) -> Result<PresignHash, EncodeError> {
        let mut data = Vec::with_capacity(32 + 1 + 8 + 8);
        data.extend_from_slice(&self.initial_sig_hash()?);
        data.push(self.auth_type);
        data.extend_from_slice(&self.condition.fee.to_be_bytes());
        data.extend_from_slice(&self.condition.nonce.to_be_bytes());
        Ok(PresignHash(sha512_256(&data)))
    }

    /// Inject an externally produced signature, consuming the unsigned
    /// transaction.
    ///
    /// Purely structural: the signature is not verified locally; an invalid
    /// one surfaces only when the node rejects the broadcast.
    pub fn attach(mut self, signature: &RecoverableSignature) -> Result<SignedTransaction, EncodeError> {
        self.condition.signature = signature.to_message_signature();
        let bytes = self.serialize()?;
        Ok(SignedTransaction { tx: self, bytes })
    }
}

// ============================================================================
// SignedTransaction
// ============================================================================

/// A fully authorized transaction, serialized once at attachment time.
/// After broadcast it is external, immutable history.
#[derive(Clone, Debug)]
pub struct SignedTransaction {
    tx: StacksTransaction,
    bytes: Vec<u8>,
}

impl SignedTransaction {
    /// The underlying transaction.
    pub fn transaction(&self) -> &StacksTransaction {
        &self.tx
    }

    /// The serialized wire bytes submitted to the node.
    pub fn to_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The transaction id: SHA-512/256 of the wire bytes.
    pub fn txid(&self) -> TxId {
        TxId(sha512_256(&self.bytes))
    }
}

// ============================================================================
// TxId
// ============================================================================

/// A 32-byte transaction identifier, rendered as lowercase hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TxId([u8; 32]);

impl TxId {
    /// The raw 32 bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl Debug for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxId({})", self)
    }
}

impl FromStr for TxId {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s).map_err(|e| DecodeError::InvalidHex(e.to_string()))?;
        let arr: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
            DecodeError::InvalidHex(format!("expected 32 bytes, got {}", bytes.len()))
        })?;
        Ok(Self(arr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::address::StacksAddress;

    fn sender_key() -> StacksPublicKey {
        StacksPublicKey::from_hex(
            "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798",
        )
        .unwrap()
    }

    fn enroll_spec(nonce: Option<u64>, fee: Option<u64>) -> ContractCallSpec {
        ContractCallSpec {
            contract: "SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ7.btcuni"
                .parse()
                .unwrap(),
            function: "enroll-course".parse().unwrap(),
            args: vec![ClarityValue::uint(3u64)],
            sender_key: sender_key(),
            nonce,
            fee,
        }
    }

    #[test]
    fn test_wire_layout_prefix() {
        let tx = StacksTransaction::contract_call(Network::Testnet, &enroll_spec(None, None), 7, 10_000);
        let bytes = tx.serialize().unwrap();

        assert_eq!(bytes[0], 0x80); // testnet version
        assert_eq!(&bytes[1..5], &0x8000_0000u32.to_be_bytes()); // chain id
        assert_eq!(bytes[5], 0x04); // standard auth
        assert_eq!(bytes[6], 0x00); // P2PKH hash mode
        assert_eq!(&bytes[7..27], sender_key().hash160().as_bytes()); // signer
        assert_eq!(&bytes[27..35], &7u64.to_be_bytes()); // nonce
        assert_eq!(&bytes[35..43], &10_000u64.to_be_bytes()); // fee
        assert_eq!(bytes[43], 0x00); // compressed key encoding
        assert_eq!(&bytes[44..109], &[0u8; 65]); // signature placeholder
        assert_eq!(bytes[109], 0x03); // anchor mode: any
        assert_eq!(bytes[110], 0x01); // post-condition mode: allow
        assert_eq!(&bytes[111..115], &[0u8; 4]); // no post conditions
        assert_eq!(bytes[115], 0x02); // contract-call payload
    }

    #[test]
    fn test_presign_hash_deterministic() {
        let a = StacksTransaction::contract_call(Network::Testnet, &enroll_spec(None, None), 7, 10_000);
        let b = StacksTransaction::contract_call(Network::Testnet, &enroll_spec(None, None), 7, 10_000);
        assert_eq!(a.presign_hash().unwrap(), b.presign_hash().unwrap());
        // Re-hashing the same transaction is stable too.
        assert_eq!(a.presign_hash().unwrap(), a.presign_hash().unwrap());
    }

    #[test]
    fn test_presign_hash_covers_auth_fields() {
        let base = StacksTransaction::contract_call(Network::Testnet, &enroll_spec(None, None), 7, 10_000);
        let other_nonce =
            StacksTransaction::contract_call(Network::Testnet, &enroll_spec(None, None), 8, 10_000);
        let other_fee =
            StacksTransaction::contract_call(Network::Testnet, &enroll_spec(None, None), 7, 10_001);
        assert_ne!(
            base.presign_hash().unwrap(),
            other_nonce.presign_hash().unwrap()
        );
        assert_ne!(
            base.presign_hash().unwrap(),
            other_fee.presign_hash().unwrap()
        );
    }

    #[test]
    fn test_attach_writes_signature_into_condition() {
        let tx = StacksTransaction::contract_call(Network::Testnet, &enroll_spec(None, None), 7, 10_000);
        let unsigned_bytes = tx.serialize().unwrap();

        let signature = RecoverableSignature {
            recovery_id: 1,
            r: [0xab; 32],
            s: [0xcd; 32],
        };
        let signed = tx.attach(&signature).unwrap();
        let bytes = signed.to_bytes();

        assert_eq!(bytes.len(), unsigned_bytes.len());
        assert_eq!(bytes[44], 0x01);
        assert_eq!(&bytes[45..77], &[0xab; 32]);
        assert_eq!(&bytes[77..109], &[0xcd; 32]);
        // Everything outside the signature slot is untouched.
        assert_eq!(&bytes[..44], &unsigned_bytes[..44]);
        assert_eq!(&bytes[109..], &unsigned_bytes[109..]);
    }

    #[test]
    fn test_token_transfer_layout() {
        let recipient: StacksAddress = "SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ7"
            .parse()
            .unwrap();
        let tx = StacksTransaction::token_transfer(
            Network::Mainnet,
            &sender_key(),
            recipient.into(),
            1_500_000,
            Memo::EMPTY,
            0,
            DEFAULT_TRANSFER_FEE,
        );
        let bytes = tx.serialize().unwrap();
        assert_eq!(bytes[0], 0x00); // mainnet version
        assert_eq!(bytes[115], 0x00); // token-transfer payload
        assert_eq!(bytes[116], 0x05); // standard principal tag
        assert_eq!(bytes[117], 22); // recipient version
        // amount follows the 21-byte principal body
        assert_eq!(&bytes[138..146], &1_500_000u64.to_be_bytes());
        // then the 34-byte memo, ending the transaction
        assert_eq!(bytes.len(), 146 + 34);
    }

    #[test]
    fn test_memo() {
        assert_eq!(Memo::new("").unwrap(), Memo::EMPTY);
        let memo = Memo::new("withdrawal").unwrap();
        assert_eq!(&memo.as_bytes()[..10], b"withdrawal");
        assert_eq!(memo.as_bytes()[10], 0);
        assert_eq!(
            Memo::new(&"x".repeat(35)),
            Err(EncodeError::MemoTooLong(35))
        );
    }

    #[test]
    fn test_txid_parse_display() {
        let signed = StacksTransaction::contract_call(
            Network::Testnet,
            &enroll_spec(None, None),
            7,
            10_000,
        )
        .attach(&RecoverableSignature {
            recovery_id: 0,
            r: [1; 32],
            s: [2; 32],
        })
        .unwrap();

        let txid = signed.txid();
        let hex = txid.to_string();
        assert_eq!(hex.len(), 64);
        assert_eq!(hex.parse::<TxId>().unwrap(), txid);
        assert_eq!(format!("0x{hex}").parse::<TxId>().unwrap(), txid);
        assert!("abcd".parse::<TxId>().is_err());
    }
}
