//! Low-level HTTP client for the node API.
//!
//! Covers the four endpoints the pipelines consume: account nonces, STX
//! balance, read-only contract calls, and transaction broadcast. No retry
//! layer on purpose — a replayed write could re-consume a nonce, so retry
//! policy belongs to callers who can re-resolve it first.

use serde::Deserialize;
use tracing::debug;

use crate::error::{BroadcastError, Error, TransportError};
use crate::types::{ClarityName, ClarityValue, ContractId, SignedTransaction, StacksAddress, TxId};

/// Nonce bookkeeping for an address, as reported by the node.
#[derive(Clone, Debug, Deserialize)]
pub struct AccountNonces {
    /// The next nonce a new transaction should use.
    pub possible_next_nonce: u64,
    #[serde(default)]
    pub last_executed_tx_nonce: Option<u64>,
    #[serde(default)]
    pub last_mempool_tx_nonce: Option<u64>,
    #[serde(default)]
    pub detected_missing_nonces: Vec<u64>,
}

/// STX balance of an address, amounts in micro-STX carried as strings.
#[derive(Clone, Debug, Deserialize)]
pub struct StxBalance {
    pub balance: String,
    #[serde(default)]
    pub locked: String,
}

impl StxBalance {
    /// The spendable balance in micro-STX, if the node's string parses.
    pub fn balance_micro(&self) -> Option<u128> {
        self.balance.parse().ok()
    }
}

/// Outcome of a transaction broadcast, resolved once at this boundary.
///
/// The node answers with either a bare txid string or a `{"txid": …}`
/// object on acceptance, and a `{"error", "reason", …}` object on
/// rejection; downstream code only ever sees this sum type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BroadcastResponse {
    /// The node accepted the transaction.
    Accepted(TxId),
    /// The node rejected it; `reason` is the node's wording, verbatim.
    Rejected {
        reason: String,
        txid: Option<String>,
    },
}

/// Response body of a read-only contract call.
#[derive(Debug, Deserialize)]
struct ReadOnlyResponse {
    #[serde(default)]
    okay: bool,
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    cause: Option<String>,
}

/// Request body of a read-only contract call.
#[derive(serde::Serialize)]
struct ReadOnlyRequest<'a> {
    sender: String,
    arguments: &'a [String],
}

/// Low-level HTTP client for the node API.
///
/// Stateless apart from the connection pool; cheap to clone and share
/// between concurrent pipelines.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    /// Create a client for the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            http: reqwest::Client::new(),
        }
    }

    /// The base URL this client talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch nonce bookkeeping for an address.
    pub async fn account_nonces(
        &self,
        address: &StacksAddress,
    ) -> Result<AccountNonces, TransportError> {
        let url = format!("{}/extended/v1/address/{}/nonces", self.base_url, address);
        let response = self.http.get(&url).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(serde_json::from_str(&body)?)
    }

    /// Fetch the STX balance of an address.
    pub async fn stx_balance(
        &self,
        address: &StacksAddress,
    ) -> Result<StxBalance, TransportError> {
        let url = format!("{}/extended/v1/address/{}/stx", self.base_url, address);
        let response = self.http.get(&url).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(serde_json::from_str(&body)?)
    }

    /// Invoke a read-only contract function and return the hex-encoded
    /// Clarity result.
    pub async fn call_read_only(
        &self,
        contract: &ContractId,
        function: &ClarityName,
        sender: &StacksAddress,
        arguments: &[String],
    ) -> Result<String, TransportError> {
        let url = format!(
            "{}/v2/contracts/call-read/{}/{}/{}",
            self.base_url, contract.address, contract.name, function
        );
        debug!(%url, args = arguments.len(), "read-only call");

        let request = ReadOnlyRequest {
            sender: sender.to_string(),
            arguments,
        };
        let response = self.http.post(&url).json(&request).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ReadOnlyResponse = serde_json::from_str(&body)?;
        match parsed {
            ReadOnlyResponse {
                okay: true,
                result: Some(result),
                ..
            } => Ok(result),
            ReadOnlyResponse { cause, .. } => Err(TransportError::InvalidResponse(
                cause.unwrap_or_else(|| "read-only call failed without a cause".to_string()),
            )),
        }
    }

    /// Decode-convenience wrapper over [`call_read_only`](Self::call_read_only).
    pub async fn call_read_only_decoded(
        &self,
        contract: &ContractId,
        function: &ClarityName,
        sender: &StacksAddress,
        args: &[ClarityValue],
    ) -> Result<ClarityValue, Error> {
        let mut arguments = Vec::with_capacity(args.len());
        for arg in args {
            arguments.push(arg.encode_hex()?);
        }
        let result = self
            .call_read_only(contract, function, sender, &arguments)
            .await?;
        Ok(ClarityValue::decode_hex(&result)?)
    }

    /// Submit a signed transaction.
    ///
    /// Transport failures surface as [`TransportError`]; every recognizable
    /// node answer — accepted or rejected — becomes a [`BroadcastResponse`],
    /// and unrecognizable bodies a [`BroadcastError`].
    pub async fn broadcast(&self, tx: &SignedTransaction) -> Result<BroadcastResponse, Error> {
        let url = format!("{}/v2/transactions", self.base_url);
        debug!(%url, bytes = tx.to_bytes().len(), "broadcasting transaction");

        let response = self
            .http
            .post(&url)
            .header("Content-Type", "application/octet-stream")
            .body(tx.to_bytes().to_vec())
            .send()
            .await
            .map_err(TransportError::Http)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(TransportError::Http)?;

        Ok(normalize_broadcast(status, &body)?)
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Resolve the node's polymorphic broadcast response into one type.
fn normalize_broadcast(status: u16, body: &str) -> Result<BroadcastResponse, BroadcastError> {
    let json: Option<serde_json::Value> = serde_json::from_str(body).ok();

    if (200..300).contains(&status) {
        // Bare string txid, or an object carrying one.
        let txid_str = match &json {
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(serde_json::Value::Object(map)) => map
                .get("txid")
                .and_then(|v| v.as_str())
                .map(String::from),
            _ => None,
        };
        return match txid_str.as_deref().map(str::parse::<TxId>) {
            Some(Ok(txid)) => Ok(BroadcastResponse::Accepted(txid)),
            _ => Err(BroadcastError::UnexpectedResponse(body.to_string())),
        };
    }

    // Rejection: pass the node's reason through verbatim.
    if let Some(serde_json::Value::Object(map)) = &json {
        let reason = map
            .get("reason")
            .or_else(|| map.get("error"))
            .and_then(|v| v.as_str())
            .map(String::from);
        if let Some(reason) = reason {
            let txid = map.get("txid").and_then(|v| v.as_str()).map(String::from);
            return Ok(BroadcastResponse::Rejected { reason, txid });
        }
    }
    Err(BroadcastError::UnexpectedResponse(format!(
        "HTTP {status}: {body}"
    )))
}
