//! Write pipelines: fluent builders that take a user action from Clarity
//! arguments to a broadcast transaction id.
//!
//! Each `.send()` runs one sequential chain — resolve nonce, build the
//! unsigned transaction, derive the pre-sign digest, obtain the remote
//! signature, attach it, broadcast — with no inter-stage concurrency and no
//! automatic retries. A caller retrying a failed write must re-resolve the
//! nonce first.

use std::sync::Arc;

use tracing::debug;

use crate::error::{BroadcastError, Error};
use crate::types::{
    ClarityName, ClarityValue, ContractCallSpec, ContractId, DEFAULT_CONTRACT_CALL_FEE,
    DEFAULT_TRANSFER_FEE, Memo, Network, PrincipalData, StacksAddress, StacksPublicKey,
    StacksTransaction, TxId,
};

use super::api::{ApiClient, BroadcastResponse};
use super::nonce::{WriteQueue, resolve_nonce};
use super::signer::RemoteSigner;

/// Shared innards of the write builders.
pub(crate) struct PipelineContext {
    pub(crate) api: Arc<ApiClient>,
    pub(crate) signer: Option<Arc<dyn RemoteSigner>>,
    pub(crate) signing_key: Option<StacksPublicKey>,
    pub(crate) queue: Arc<WriteQueue>,
    pub(crate) network: Network,
}

// ============================================================================
// ContractCallBuilder
// ============================================================================

/// Builder for a contract-call write.
///
/// Created via [`Stacks::call_contract`](crate::client::Stacks::call_contract)
/// or the contract clients in [`contracts`](crate::contracts).
///
/// # Example
///
/// ```rust,no_run
/// # use campus_kit::*;
/// # async fn example(stacks: Stacks) -> Result<(), Error> {
/// let contract: ContractId = "ST000000000000000000002AMW42H.btcuni".parse()?;
/// let txid = stacks
///     .call_contract(contract, "enroll-course".parse()?)
///     .arg(ClarityValue::uint(3u64))
///     .send()
///     .await?;
/// println!("broadcast {txid}");
/// # Ok(())
/// # }
/// ```
pub struct ContractCallBuilder {
    ctx: PipelineContext,
    contract: ContractId,
    function: ClarityName,
    args: Vec<ClarityValue>,
    nonce: Option<u64>,
    fee: Option<u64>,
    sign_with: Option<StacksPublicKey>,
}

impl ContractCallBuilder {
    pub(crate) fn new(ctx: PipelineContext, contract: ContractId, function: ClarityName) -> Self {
        Self {
            ctx,
            contract,
            function,
            args: Vec::new(),
            nonce: None,
            fee: None,
            sign_with: None,
        }
    }

    /// Append one function argument.
    pub fn arg(mut self, value: ClarityValue) -> Self {
        self.args.push(value);
        self
    }

    /// Append several function arguments in order.
    pub fn args(mut self, values: impl IntoIterator<Item = ClarityValue>) -> Self {
        self.args.extend(values);
        self
    }

    /// Pin the nonce instead of resolving it from the network.
    ///
    /// Pinned writes skip the per-sender queue; the caller owns ordering.
    pub fn nonce(mut self, nonce: u64) -> Self {
        self.nonce = Some(nonce);
        self
    }

    /// Set the fee in micro-STX. Defaults to [`DEFAULT_CONTRACT_CALL_FEE`].
    pub fn fee(mut self, fee: u64) -> Self {
        self.fee = Some(fee);
        self
    }

    /// Sign with a specific custodied key instead of the client default.
    pub fn sign_with(mut self, key: StacksPublicKey) -> Self {
        self.sign_with = Some(key);
        self
    }

    /// Run the pipeline and return the broadcast transaction id.
    pub async fn send(self) -> Result<TxId, Error> {
        let key = self
            .sign_with
            .or_else(|| self.ctx.signing_key.clone())
            .ok_or(Error::NoSigner)?;
        let spec = ContractCallSpec {
            contract: self.contract,
            function: self.function,
            args: self.args,
            sender_key: key,
            nonce: self.nonce,
            fee: self.fee,
        };
        debug!(
            contract = %spec.contract,
            function = %spec.function,
            "building contract call"
        );

        let build = |nonce, fee| StacksTransaction::contract_call(self.ctx.network, &spec, nonce, fee);
        run_pipeline(
            &self.ctx,
            &spec.sender_key,
            spec.nonce,
            spec.fee.unwrap_or(DEFAULT_CONTRACT_CALL_FEE),
            build,
        )
        .await
    }
}

// ============================================================================
// TransferBuilder
// ============================================================================

/// Builder for an STX token-transfer write (withdrawals).
///
/// Created via [`Stacks::transfer`](crate::client::Stacks::transfer).
pub struct TransferBuilder {
    ctx: PipelineContext,
    recipient: PrincipalData,
    amount: u64,
    memo: Memo,
    nonce: Option<u64>,
    fee: Option<u64>,
    sign_with: Option<StacksPublicKey>,
}

impl TransferBuilder {
    pub(crate) fn new(ctx: PipelineContext, recipient: StacksAddress, amount: u64) -> Self {
        Self {
            ctx,
            recipient: recipient.into(),
            amount,
            memo: Memo::EMPTY,
            nonce: None,
            fee: None,
            sign_with: None,
        }
    }

    /// Attach a memo.
    pub fn memo(mut self, memo: Memo) -> Self {
        self.memo = memo;
        self
    }

    /// Pin the nonce instead of resolving it from the network.
    pub fn nonce(mut self, nonce: u64) -> Self {
        self.nonce = Some(nonce);
        self
    }

    /// Set the fee in micro-STX. Defaults to [`DEFAULT_TRANSFER_FEE`].
    pub fn fee(mut self, fee: u64) -> Self {
        self.fee = Some(fee);
        self
    }

    /// Sign with a specific custodied key instead of the client default.
    pub fn sign_with(mut self, key: StacksPublicKey) -> Self {
        self.sign_with = Some(key);
        self
    }

    /// Run the pipeline and return the broadcast transaction id.
    pub async fn send(self) -> Result<TxId, Error> {
        let key = self
            .sign_with
            .or_else(|| self.ctx.signing_key.clone())
            .ok_or(Error::NoSigner)?;
        debug!(recipient = %self.recipient, amount = self.amount, "building transfer");

        let network = self.ctx.network;
        let recipient = self.recipient;
        let amount = self.amount;
        let memo = self.memo;
        let signing_key = key.clone();
        let build = move |nonce, fee| {
            StacksTransaction::token_transfer(
                network,
                &signing_key,
                recipient.clone(),
                amount,
                memo,
                nonce,
                fee,
            )
        };
        run_pipeline(
            &self.ctx,
            &key,
            self.nonce,
            self.fee.unwrap_or(DEFAULT_TRANSFER_FEE),
            build,
        )
        .await
    }
}

// ============================================================================
// Pipeline
// ============================================================================

/// The shared build → presign → sign → attach → broadcast chain.
async fn run_pipeline(
    ctx: &PipelineContext,
    key: &StacksPublicKey,
    pinned_nonce: Option<u64>,
    fee: u64,
    build: impl FnOnce(u64, u64) -> StacksTransaction,
) -> Result<TxId, Error> {
    let signer = ctx.signer.as_ref().ok_or(Error::NoSigner)?;
    let sender = StacksAddress::from_public_key(ctx.network, key);

    // Auto-nonce writes hold the sender's queue permit from resolution
    // through broadcast; pinned nonces are the caller's ordering problem.
    let _permit = match pinned_nonce {
        Some(_) => None,
        None => Some(ctx.queue.acquire(&sender).await),
    };
    let nonce = match pinned_nonce {
        Some(n) => n,
        None => resolve_nonce(&ctx.api, &sender).await,
    };
    debug!(%sender, nonce, fee, "assembling unsigned transaction");

    let tx = build(nonce, fee);
    let digest = tx.presign_hash()?;
    debug!(digest = %digest, "requesting signature");

    let signature = signer.sign_payload(&digest.to_payload_hex(), key).await?;
    let signed = tx.attach(&signature)?;
    debug!(txid = %signed.txid(), "broadcasting");

    match ctx.api.broadcast(&signed).await? {
        BroadcastResponse::Accepted(txid) => {
            debug!(%txid, "broadcast accepted");
            Ok(txid)
        }
        BroadcastResponse::Rejected { reason, txid } => {
            Err(BroadcastError::Rejected { reason, txid }.into())
        }
    }
}
