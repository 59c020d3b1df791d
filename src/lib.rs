//! Stacks transaction pipeline and contract client for an on-chain course
//! platform.
//!
//! **campus-kit** prepares transactions for the Stacks blockchain, has them
//! signed by an external custodial service — no private key ever lives in
//! this process — and submits them; a companion read path queries and
//! decodes read-only contract state.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use campus_kit::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Error> {
//!     // Configure once; nothing is global.
//!     let stacks = Stacks::testnet()
//!         .contracts(Contracts {
//!             campus: "ST000000000000000000002AMW42H.btcuni".parse()?,
//!             certificate: "ST000000000000000000002AMW42H.btcuni-nft".parse()?,
//!         })
//!         .build();
//!
//!     let student: StacksAddress = "ST000000000000000000002AMW42H".parse()?;
//!     let enrolled = stacks.campus()?.enrolled_course_ids(&student).await;
//!     println!("enrolled in {} courses", enrolled.len());
//!     Ok(())
//! }
//! ```
//!
//! # Design
//!
//! 1. **Single entry point**: everything hangs off the [`Stacks`] client.
//! 2. **Explicit configuration**: network, endpoint, contracts, and signer
//!    are passed at construction, never read from globals.
//! 3. **Custody stays remote**: the pipeline sends a 32-byte digest to the
//!    signer and receives `(v, r, s)`; nothing else crosses that boundary.
//! 4. **Writes are loud, reads are quiet**: every write failure surfaces
//!    with a descriptive error, while the derived read queries collapse
//!    failures into negative results.
//!
//! # Core Types
//!
//! - [`ClarityValue`] — Typed contract-call arguments and results
//! - [`StacksAddress`] / [`ContractId`] — c32check-encoded principals
//! - [`StacksTransaction`] / [`SignedTransaction`] — The write pipeline's
//!   transaction states
//! - [`RecoverableSignature`] — The `(v, r, s)` triple a signer returns
//! - [`TxId`] — Broadcast result

pub mod client;
pub mod contracts;
pub mod error;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{
    BroadcastError, DecodeError, EncodeError, Error, ParseAddressError, ParseContractIdError,
    ParseKeyError, ParseNameError, SigningError, TransportError,
};

pub use client::{
    AccountNonces, ApiClient, BalanceQuery, BroadcastResponse, ContractCallBuilder, Contracts,
    NonceQuery, ReadOnlyCall, RemoteSigner, Stacks, StacksBuilder, StxBalance, TransferBuilder,
    TurnkeyConfig, TurnkeySigner, WriteQueue,
};

pub use contracts::{Campus, Certificate};

pub use types::{
    ClarityName, ClarityValue, ContractCallSpec, ContractId, DEFAULT_CONTRACT_CALL_FEE,
    DEFAULT_TRANSFER_FEE, Hash160, Memo, MessageSignature, Network, Payload, PresignHash,
    PrincipalData, RecoverableSignature, SignedTransaction, SpendingCondition, StacksAddress,
    StacksPublicKey, StacksTransaction, TxId,
};
