//! Simulated payment network.
//!
//! `PaymentProvider` classifies a payment source, waits on the network when the
//! source says so, and keeps committed outcomes in an `AuthorizationStore`.

pub mod classifier;
pub mod store;

use crate::domain::payment::{Authorization, Outcome, PaymentDetails, mask_source};
use crate::domain::ports::{AuthorizationSignals, Authorizer};
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use classifier::{Classification, classify};
use std::time::Duration;
use store::AuthorizationStore;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// How long an unresponsive network takes to answer when nobody cancels.
pub const DEFAULT_NETWORK_STALL: Duration = Duration::from_secs(10_000 * 60 * 60);

#[derive(Clone)]
pub struct PaymentProvider {
    store: AuthorizationStore,
    network_stall: Duration,
}

impl Default for PaymentProvider {
    fn default() -> Self {
        Self::new(AuthorizationStore::new())
    }
}

impl PaymentProvider {
    pub fn new(store: AuthorizationStore) -> Self {
        Self {
            store,
            network_stall: DEFAULT_NETWORK_STALL,
        }
    }

    pub fn with_network_stall(mut self, network_stall: Duration) -> Self {
        self.network_stall = network_stall;
        self
    }

    pub fn store(&self) -> &AuthorizationStore {
        &self.store
    }

    async fn wait_for_network(&self, cancel: &CancellationToken) -> Result<Outcome> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(PaymentError::Cancelled),
            _ = tokio::time::sleep(self.network_stall) => Ok(Outcome::Success),
        }
    }
}

#[async_trait]
impl Authorizer for PaymentProvider {
    async fn authorize(
        &self,
        details: &PaymentDetails,
        signals: &AuthorizationSignals,
    ) -> Result<Authorization> {
        let outcome = match classify(&details.source) {
            Classification::Decided(outcome) => outcome,
            Classification::Unresponsive => {
                tracing::warn!(
                    source = %mask_source(&details.source),
                    "Payment network unresponsive, waiting for an answer or cancellation"
                );
                signals.waiting.cancel();
                self.wait_for_network(&signals.cancel).await?
            }
        };

        let authorization = self.store.issue(outcome).await;
        tracing::debug!(
            authorization_id = %authorization.id,
            reference_id = %authorization.reference_id,
            outcome = %outcome,
            amount = %details.amount.value(),
            currency = %details.currency,
            "Authorization decided"
        );
        Ok(authorization)
    }

    async fn commit(&self, authorization: &Authorization) -> Result<()> {
        self.store.commit(authorization).await
    }

    async fn by_id(&self, id: Uuid) -> Option<Outcome> {
        self.store.by_id(id).await
    }

    async fn by_reference_id(&self, reference_id: Uuid) -> Option<Outcome> {
        self.store.by_reference_id(reference_id).await
    }
}
