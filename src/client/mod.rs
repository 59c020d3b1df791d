//! Client module: the write and read pipelines.
//!
//! - [`Stacks`] — The main client, the single entry point for all operations
//! - [`StacksBuilder`] — Fluent builder carrying the explicit configuration
//! - [`ApiClient`] — Low-level HTTP client for the node API
//! - [`RemoteSigner`] / [`TurnkeySigner`] — Custodial signing boundary
//! - [`WriteQueue`] — Per-sender serialization of auto-nonce writes
//!
//! Write flow: codec → nonce resolution → builder → pre-sign hash → remote
//! signer → signature attachment → broadcast. Read flow: codec → read-only
//! call → codec.

mod api;
mod nonce;
mod query;
mod signer;
mod stacks;
mod transaction;

pub use api::{AccountNonces, ApiClient, BroadcastResponse, StxBalance};
pub use nonce::WriteQueue;
pub use query::{BalanceQuery, NonceQuery, ReadOnlyCall};
pub use signer::{RemoteSigner, TurnkeyConfig, TurnkeySigner};
pub use stacks::{Contracts, Stacks, StacksBuilder};
pub use transaction::{ContractCallBuilder, TransferBuilder};
