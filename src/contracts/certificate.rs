//! Certificate NFT contract client.

use crate::client::Stacks;
use crate::error::Error;
use crate::types::{ClarityName, ClarityValue, ContractId, StacksAddress, TxId};

/// Client for the certificate NFT contract.
///
/// Create via [`Stacks::certificate`] or directly with a contract id.
pub struct Certificate {
    stacks: Stacks,
    contract: ContractId,
}

impl Certificate {
    /// Create a client for a specific contract deployment.
    pub fn new(stacks: Stacks, contract: ContractId) -> Self {
        Self { stacks, contract }
    }

    /// The contract this client talks to.
    pub fn contract_id(&self) -> &ContractId {
        &self.contract
    }

    /// Mint a certificate NFT to a recipient (`mint`).
    pub async fn mint(&self, recipient: &StacksAddress) -> Result<TxId, Error> {
        self.stacks
            .call_contract(self.contract.clone(), ClarityName::new("mint")?)
            .arg(ClarityValue::principal(*recipient))
            .send()
            .await
    }
}

impl std::fmt::Debug for Certificate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Certificate")
            .field("contract", &self.contract)
            .finish()
    }
}
