//! Course-platform contract client.
//!
//! Writes surface every failure; the derived read queries do the opposite
//! and collapse every failure class — transport, decode, contract `err` —
//! into a negative or empty result, so "not enrolled" and "lookup failed"
//! are indistinguishable to the caller. That asymmetry is deliberate: a
//! dropped write would leave ambiguity about fund movement or nonce
//! consumption, while a dropped read only costs a refresh.

use tracing::warn;

use crate::client::Stacks;
use crate::error::Error;
use crate::types::{ClarityName, ClarityValue, ContractId, StacksAddress, TxId};

/// Client for the main course-platform contract.
///
/// Create via [`Stacks::campus`] or directly with a contract id.
pub struct Campus {
    stacks: Stacks,
    contract: ContractId,
}

impl Campus {
    /// Create a client for a specific contract deployment.
    pub fn new(stacks: Stacks, contract: ContractId) -> Self {
        Self { stacks, contract }
    }

    /// The contract this client talks to.
    pub fn contract_id(&self) -> &ContractId {
        &self.contract
    }

    fn function(&self, name: &'static str) -> Result<ClarityName, Error> {
        Ok(ClarityName::new(name)?)
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Enroll the platform account in the whitelist (`enroll-whitelist`).
    pub async fn enroll_whitelist(&self) -> Result<TxId, Error> {
        self.stacks
            .call_contract(self.contract.clone(), self.function("enroll-whitelist")?)
            .send()
            .await
    }

    /// Enroll in a course (`enroll-course`).
    pub async fn enroll_course(&self, course_id: u64) -> Result<TxId, Error> {
        self.stacks
            .call_contract(self.contract.clone(), self.function("enroll-course")?)
            .arg(ClarityValue::uint(course_id))
            .send()
            .await
    }

    /// Mark a course complete for a student (`complete-course`).
    ///
    /// The signing key must belong to an instructor or the contract owner;
    /// the contract enforces that, not this client.
    pub async fn complete_course(
        &self,
        course_id: u64,
        student: &StacksAddress,
    ) -> Result<TxId, Error> {
        self.stacks
            .call_contract(self.contract.clone(), self.function("complete-course")?)
            .arg(ClarityValue::uint(course_id))
            .arg(ClarityValue::principal(*student))
            .send()
            .await
    }

    // ========================================================================
    // Derived reads
    // ========================================================================

    /// Whether an address is whitelisted (`is-whitelisted-beta`).
    ///
    /// `(ok true)` means yes; `(ok false)`, any `(err …)`, and any lookup
    /// failure all mean no.
    pub async fn is_whitelisted(&self, address: &StacksAddress) -> bool {
        let outcome = match self.function("is-whitelisted-beta") {
            Ok(function) => {
                self.stacks
                    .read_only(self.contract.clone(), function)
                    .arg(ClarityValue::principal(*address))
                    .sender(*address)
                    .await
            }
            Err(e) => Err(e),
        };
        membership("is-whitelisted-beta", outcome)
    }

    /// Whether a student is enrolled in a course (`is-enrolled`).
    pub async fn is_enrolled(&self, student: &StacksAddress, course_id: u64) -> bool {
        let outcome = match self.function("is-enrolled") {
            Ok(function) => {
                self.stacks
                    .read_only(self.contract.clone(), function)
                    .arg(ClarityValue::uint(course_id))
                    .arg(ClarityValue::principal(*student))
                    .sender(*student)
                    .await
            }
            Err(e) => Err(e),
        };
        membership("is-enrolled", outcome)
    }

    /// The ids of the courses an address is enrolled in
    /// (`get-enrolled-ids`), in contract order. Empty on any failure.
    pub async fn enrolled_course_ids(&self, address: &StacksAddress) -> Vec<u64> {
        let outcome = match self.function("get-enrolled-ids") {
            Ok(function) => {
                self.stacks
                    .read_only(self.contract.clone(), function)
                    .arg(ClarityValue::principal(*address))
                    .sender(*address)
                    .await
            }
            Err(e) => Err(e),
        };
        course_ids(outcome)
    }
}

impl std::fmt::Debug for Campus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Campus")
            .field("contract", &self.contract)
            .finish()
    }
}

/// Collapse a membership-style read result: only `(ok true)` is positive.
fn membership(query: &str, outcome: Result<ClarityValue, Error>) -> bool {
    match outcome {
        Ok(ClarityValue::ResponseOk(inner)) => matches!(*inner, ClarityValue::Bool(true)),
        Ok(ClarityValue::ResponseErr(_)) => false,
        Ok(other) => {
            warn!(query, value = %other, "unexpected read-only result shape");
            false
        }
        Err(e) => {
            warn!(query, error = %e, "read failed, reporting negative");
            false
        }
    }
}

/// Collapse a list-of-uints read result: anything but `(ok (list u…))`
/// is empty.
fn course_ids(outcome: Result<ClarityValue, Error>) -> Vec<u64> {
    match outcome {
        Ok(ClarityValue::ResponseOk(inner)) => match *inner {
            ClarityValue::List(values) => values
                .into_iter()
                .filter_map(|value| match value {
                    ClarityValue::UInt(id) => u64::try_from(id).ok(),
                    _ => None,
                })
                .collect(),
            other => {
                warn!(value = %other, "expected a list of course ids");
                Vec::new()
            }
        },
        Ok(_) => Vec::new(),
        Err(e) => {
            warn!(error = %e, "course id read failed, reporting empty");
            Vec::new()
        }
    }
}
