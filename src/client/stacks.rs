//! The main Stacks client.

use std::sync::Arc;

use crate::contracts::{Campus, Certificate};
use crate::error::Error;
use crate::types::{ClarityName, ContractId, Network, StacksAddress, StacksPublicKey};

use super::api::ApiClient;
use super::nonce::{WriteQueue, resolve_nonce};
use super::query::{BalanceQuery, NonceQuery, ReadOnlyCall};
use super::signer::{RemoteSigner, TurnkeyConfig, TurnkeySigner};
use super::transaction::{ContractCallBuilder, PipelineContext, TransferBuilder};

/// The contract addresses one deployment of the platform talks to.
#[derive(Clone, Debug)]
pub struct Contracts {
    /// The main course-platform contract.
    pub campus: ContractId,
    /// The certificate NFT contract.
    pub certificate: ContractId,
}

/// The main client for the course platform's on-chain operations.
///
/// A `Stacks` client is the single entry point: generic reads and writes
/// hang off it directly, and the platform contract clients are reached via
/// [`campus()`](Self::campus) and [`certificate()`](Self::certificate).
/// All configuration — network, endpoint, contracts, signer — is explicit
/// and set at construction; there is no global state.
///
/// # Example
///
/// ```rust,no_run
/// use campus_kit::*;
///
/// # async fn example() -> Result<(), Error> {
/// let stacks = Stacks::testnet()
///     .contracts(Contracts {
///         campus: "ST000000000000000000002AMW42H.btcuni".parse()?,
///         certificate: "ST000000000000000000002AMW42H.btcuni-nft".parse()?,
///     })
///     .build();
///
/// let enrolled = stacks
///     .campus()?
///     .enrolled_course_ids(&"ST000000000000000000002AMW42H".parse()?)
///     .await;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Stacks {
    api: Arc<ApiClient>,
    signer: Option<Arc<dyn RemoteSigner>>,
    signing_key: Option<StacksPublicKey>,
    network: Network,
    contracts: Option<Contracts>,
    queue: Arc<WriteQueue>,
}

impl Stacks {
    /// Create a builder for mainnet.
    pub fn mainnet() -> StacksBuilder {
        StacksBuilder::new(Network::Mainnet)
    }

    /// Create a builder for testnet.
    pub fn testnet() -> StacksBuilder {
        StacksBuilder::new(Network::Testnet)
    }

    /// Create a configured client from environment variables.
    ///
    /// Reads:
    /// - `STACKS_NETWORK` (optional): `"mainnet"` or `"testnet"`, default
    ///   testnet.
    /// - `STACKS_API_URL` (optional): node API override.
    /// - `CAMPUS_CONTRACT` / `CERTIFICATE_CONTRACT` (optional, paired):
    ///   `address.name` identifiers for the platform contracts.
    /// - `TURNKEY_BASE_URL` / `TURNKEY_ORGANIZATION_ID` / `TURNKEY_API_TOKEN`
    ///   / `TURNKEY_SIGNER_PUBLIC_KEY` (optional, all-or-none): custodial
    ///   signer wiring. Without them the client is read-only.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when a variable is malformed or its
    /// counterpart is missing.
    pub fn from_env() -> Result<Stacks, Error> {
        let network = match std::env::var("STACKS_NETWORK").ok().as_deref() {
            Some(value) => value.parse()?,
            None => Network::Testnet,
        };
        let mut builder = StacksBuilder::new(network);

        if let Ok(url) = std::env::var("STACKS_API_URL") {
            builder = builder.api_url(url);
        }

        let campus = std::env::var("CAMPUS_CONTRACT").ok();
        let certificate = std::env::var("CERTIFICATE_CONTRACT").ok();
        match (campus, certificate) {
            (Some(campus), Some(certificate)) => {
                builder = builder.contracts(Contracts {
                    campus: campus.parse()?,
                    certificate: certificate.parse()?,
                });
            }
            (None, None) => {}
            (Some(_), None) => {
                return Err(Error::Config(
                    "CAMPUS_CONTRACT is set but CERTIFICATE_CONTRACT is missing".into(),
                ));
            }
            (None, Some(_)) => {
                return Err(Error::Config(
                    "CERTIFICATE_CONTRACT is set but CAMPUS_CONTRACT is missing".into(),
                ));
            }
        }

        let signer_key = std::env::var("TURNKEY_SIGNER_PUBLIC_KEY").ok();
        let any_turnkey = signer_key.is_some()
            || std::env::var("TURNKEY_BASE_URL").is_ok()
            || std::env::var("TURNKEY_ORGANIZATION_ID").is_ok()
            || std::env::var("TURNKEY_API_TOKEN").is_ok();
        if any_turnkey {
            let key = signer_key
                .ok_or_else(|| Error::Config("TURNKEY_SIGNER_PUBLIC_KEY is not set".into()))?
                .parse::<StacksPublicKey>()
                .map_err(|e| Error::Config(format!("TURNKEY_SIGNER_PUBLIC_KEY: {e}")))?;
            builder = builder.signer(TurnkeySigner::new(TurnkeyConfig::from_env()?), key);
        }

        Ok(builder.build())
    }

    /// The network this client is connected to.
    pub fn network(&self) -> Network {
        self.network
    }

    /// The underlying node API client.
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// The default signing key, when a signer is configured.
    pub fn signing_key(&self) -> Option<&StacksPublicKey> {
        self.signing_key.as_ref()
    }

    /// The sender address of the default signing key on this network.
    pub fn sender_address(&self) -> Option<StacksAddress> {
        self.signing_key
            .as_ref()
            .map(|key| StacksAddress::from_public_key(self.network, key))
    }

    // ========================================================================
    // Read operations
    // ========================================================================

    /// Get the STX balance of an address.
    pub fn balance(&self, address: StacksAddress) -> BalanceQuery {
        BalanceQuery::new(self.api.clone(), address)
    }

    /// Get the nonce bookkeeping of an address; failures surface.
    pub fn nonces(&self, address: StacksAddress) -> NonceQuery {
        NonceQuery::new(self.api.clone(), address)
    }

    /// Resolve the next usable nonce for an address.
    ///
    /// Re-fetched from the network on every call; collapses transport
    /// failure to 0 (see [`nonces`](Self::nonces) for the fallible form).
    pub async fn next_nonce(&self, address: &StacksAddress) -> u64 {
        resolve_nonce(&self.api, address).await
    }

    /// Call a read-only contract function.
    pub fn read_only(&self, contract: ContractId, function: ClarityName) -> ReadOnlyCall {
        ReadOnlyCall::new(self.api.clone(), contract, function)
    }

    // ========================================================================
    // Write operations
    // ========================================================================

    /// Build a contract-call transaction.
    pub fn call_contract(&self, contract: ContractId, function: ClarityName) -> ContractCallBuilder {
        ContractCallBuilder::new(self.pipeline_context(), contract, function)
    }

    /// Build an STX transfer of `amount_micro` micro-STX to `recipient`.
    pub fn transfer(&self, recipient: StacksAddress, amount_micro: u64) -> TransferBuilder {
        TransferBuilder::new(self.pipeline_context(), recipient, amount_micro)
    }

    // ========================================================================
    // Platform contracts
    // ========================================================================

    /// The course-platform contract client.
    pub fn campus(&self) -> Result<Campus, Error> {
        let contracts = self.contracts.as_ref().ok_or_else(|| {
            Error::Config("No contracts configured. Call .contracts() on StacksBuilder.".into())
        })?;
        Ok(Campus::new(self.clone(), contracts.campus.clone()))
    }

    /// The certificate NFT contract client.
    pub fn certificate(&self) -> Result<Certificate, Error> {
        let contracts = self.contracts.as_ref().ok_or_else(|| {
            Error::Config("No contracts configured. Call .contracts() on StacksBuilder.".into())
        })?;
        Ok(Certificate::new(self.clone(), contracts.certificate.clone()))
    }

    fn pipeline_context(&self) -> PipelineContext {
        PipelineContext {
            api: self.api.clone(),
            signer: self.signer.clone(),
            signing_key: self.signing_key.clone(),
            queue: self.queue.clone(),
            network: self.network,
        }
    }
}

impl std::fmt::Debug for Stacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stacks")
            .field("network", &self.network)
            .field("api", &self.api)
            .field("has_signer", &self.signer.is_some())
            .finish()
    }
}

// ============================================================================
// StacksBuilder
// ============================================================================

/// Fluent builder for [`Stacks`].
pub struct StacksBuilder {
    network: Network,
    api_url: Option<String>,
    contracts: Option<Contracts>,
    signer: Option<Arc<dyn RemoteSigner>>,
    signing_key: Option<StacksPublicKey>,
}

impl StacksBuilder {
    fn new(network: Network) -> Self {
        Self {
            network,
            api_url: None,
            contracts: None,
            signer: None,
            signing_key: None,
        }
    }

    /// Override the node API endpoint.
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }

    /// Set the platform contract addresses.
    pub fn contracts(mut self, contracts: Contracts) -> Self {
        self.contracts = Some(contracts);
        self
    }

    /// Set the remote signer and the custodied key it signs with by default.
    pub fn signer(mut self, signer: impl RemoteSigner + 'static, key: StacksPublicKey) -> Self {
        self.signer = Some(Arc::new(signer));
        self.signing_key = Some(key);
        self
    }

    /// Build the client.
    pub fn build(self) -> Stacks {
        let api_url = self
            .api_url
            .unwrap_or_else(|| self.network.api_url().to_string());
        Stacks {
            api: Arc::new(ApiClient::new(api_url)),
            signer: self.signer,
            signing_key: self.signing_key,
            network: self.network,
            contracts: self.contracts,
            queue: Arc::new(WriteQueue::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let stacks = Stacks::testnet().build();
        assert_eq!(stacks.network(), Network::Testnet);
        assert_eq!(stacks.api().base_url(), "https://api.testnet.hiro.so");
        assert!(stacks.signing_key().is_none());
        assert!(stacks.sender_address().is_none());
    }

    #[test]
    fn test_builder_overrides() {
        let stacks = Stacks::mainnet().api_url("http://127.0.0.1:3999/").build();
        assert_eq!(stacks.network(), Network::Mainnet);
        assert_eq!(stacks.api().base_url(), "http://127.0.0.1:3999");
    }

    #[test]
    fn test_contract_clients_require_configuration() {
        let stacks = Stacks::testnet().build();
        assert!(matches!(stacks.campus(), Err(Error::Config(_))));
        assert!(matches!(stacks.certificate(), Err(Error::Config(_))));
    }
}
