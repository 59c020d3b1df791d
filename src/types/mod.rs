//! Core types for the Stacks write and read pipelines.
//!
//! Hand-rolled wire types matching what the node accepts: Clarity values,
//! c32check addresses, single-signature transactions and their digests.

mod address;
mod clarity;
mod key;
mod network;
mod transaction;

pub use address::StacksAddress;
pub use clarity::{ClarityName, ClarityValue, ContractId, PrincipalData};
pub use key::{Hash160, MessageSignature, RecoverableSignature, StacksPublicKey};
pub use network::{MAINNET_API_URL, Network, TESTNET_API_URL};
pub use transaction::{
    ContractCallSpec, DEFAULT_CONTRACT_CALL_FEE, DEFAULT_TRANSFER_FEE, Memo, Payload, PresignHash,
    SignedTransaction, SpendingCondition, StacksTransaction, TxId,
};
