//! Query builders for fluent read operations.
//!
//! All query builders implement `IntoFuture` so they can be `.await`ed
//! directly. Failures surface here; the derived course-platform queries in
//! [`contracts`](crate::contracts) are the layer that collapses them.

use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::sync::Arc;

use crate::error::Error;
use crate::types::{ClarityName, ClarityValue, ContractId, StacksAddress};

use super::api::{AccountNonces, ApiClient, StxBalance};

// ============================================================================
// ReadOnlyCall
// ============================================================================

/// Query builder for read-only contract calls.
///
/// Encodes the arguments, issues the call, and decodes the hex result into
/// a [`ClarityValue`]. A read-only call produces no transaction.
///
/// # Example
///
/// ```rust,no_run
/// # use campus_kit::*;
/// # async fn example(stacks: Stacks) -> Result<(), Error> {
/// let contract: ContractId = "ST000000000000000000002AMW42H.btcuni".parse()?;
/// let result = stacks
///     .read_only(contract, "is-enrolled".parse()?)
///     .arg(ClarityValue::uint(3u64))
///     .arg(ClarityValue::principal("ST000000000000000000002AMW42H".parse()?))
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct ReadOnlyCall {
    api: Arc<ApiClient>,
    contract: ContractId,
    function: ClarityName,
    args: Vec<ClarityValue>,
    sender: Option<StacksAddress>,
}

impl ReadOnlyCall {
    pub(crate) fn new(api: Arc<ApiClient>, contract: ContractId, function: ClarityName) -> Self {
        Self {
            api,
            contract,
            function,
            args: Vec::new(),
            sender: None,
        }
    }

    /// Append one argument.
    pub fn arg(mut self, value: ClarityValue) -> Self {
        self.args.push(value);
        self
    }

    /// Append several arguments in order.
    pub fn args(mut self, values: impl IntoIterator<Item = ClarityValue>) -> Self {
        self.args.extend(values);
        self
    }

    /// Set the sender the node evaluates the call as. Defaults to the
    /// contract's own address.
    pub fn sender(mut self, sender: StacksAddress) -> Self {
        self.sender = Some(sender);
        self
    }
}

impl IntoFuture for ReadOnlyCall {
    type Output = Result<ClarityValue, Error>;
    type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + Send>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(async move {
            let sender = self.sender.unwrap_or(self.contract.address);
            self.api
                .call_read_only_decoded(&self.contract, &self.function, &sender, &self.args)
                .await
        })
    }
}

// ============================================================================
// BalanceQuery
// ============================================================================

/// Query builder for an address's STX balance.
pub struct BalanceQuery {
    api: Arc<ApiClient>,
    address: StacksAddress,
}

impl BalanceQuery {
    pub(crate) fn new(api: Arc<ApiClient>, address: StacksAddress) -> Self {
        Self { api, address }
    }
}

impl IntoFuture for BalanceQuery {
    type Output = Result<StxBalance, Error>;
    type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + Send>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(async move { Ok(self.api.stx_balance(&self.address).await?) })
    }
}

// ============================================================================
// NonceQuery
// ============================================================================

/// Query builder for an address's nonce bookkeeping.
///
/// This is the fallible counterpart of
/// [`Stacks::next_nonce`](crate::client::Stacks::next_nonce): transport
/// failures surface instead of collapsing to 0.
pub struct NonceQuery {
    api: Arc<ApiClient>,
    address: StacksAddress,
}

impl NonceQuery {
    pub(crate) fn new(api: Arc<ApiClient>, address: StacksAddress) -> Self {
        Self { api, address }
    }
}

impl IntoFuture for NonceQuery {
    type Output = Result<AccountNonces, Error>;
    type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + Send>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(async move { Ok(self.api.account_nonces(&self.address).await?) })
    }
}
