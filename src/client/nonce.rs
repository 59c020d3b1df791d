//! Nonce resolution and same-sender write serialization.
//!
//! Nonces are re-fetched from the node on every resolution — there is no
//! local counter, so two concurrent writes for the same sender can both
//! resolve the same nonce and race at the node. [`WriteQueue`] closes that
//! race in-process by handing out one permit per sender; pipelines that pin
//! their nonce explicitly skip the queue.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::OwnedMutexGuard;
use tracing::warn;

use crate::types::StacksAddress;

use super::api::ApiClient;

/// Resolve the next usable nonce for a sender.
///
/// Returns the node's "possible next nonce". On transport failure this
/// collapses to 0 with a warning — callers must not trust a 0 that follows
/// an error as a real nonce. Use [`ApiClient::account_nonces`] directly to
/// observe the failure instead.
pub(crate) async fn resolve_nonce(api: &ApiClient, address: &StacksAddress) -> u64 {
    match api.account_nonces(address).await {
        Ok(nonces) => nonces.possible_next_nonce,
        Err(e) => {
            warn!(%address, error = %e, "nonce fetch failed, falling back to 0");
            0
        }
    }
}

/// Serializes write pipelines per sender.
///
/// One entry per sender address; each holds an async mutex whose guard is
/// held from nonce resolution through broadcast, so same-sender writes
/// observe each other's nonce consumption. Different senders never contend.
pub struct WriteQueue {
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl Default for WriteQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl WriteQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Acquire the permit for a sender, waiting behind earlier writes for
    /// the same sender.
    pub async fn acquire(&self, sender: &StacksAddress) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap();
            locks
                .entry(sender.to_string())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}
