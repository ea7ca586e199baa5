use super::invoice::{Invoice, NewInvoice};
use super::party::{Customer, Merchant};
use super::payment::{Authorization, NewPaymentAttempt, Outcome, PaymentAttempt, PaymentDetails};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

// `Ok(None)` is the not-found signal; `Err` is reserved for backend failures.

#[async_trait]
pub trait InvoiceRepository: Send + Sync {
    async fn create(&self, invoice: NewInvoice) -> Result<Invoice>;
    async fn get(&self, id: u64) -> Result<Option<Invoice>>;
}

#[async_trait]
pub trait MerchantRepository: Send + Sync {
    async fn get(&self, id: u64) -> Result<Option<Merchant>>;
    async fn allowed_currency(&self, id: u64) -> Result<Option<String>>;
}

#[async_trait]
pub trait CustomerRepository: Send + Sync {
    async fn get(&self, id: u64) -> Result<Option<Customer>>;
}

#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn create(&self, attempt: NewPaymentAttempt) -> Result<PaymentAttempt>;
    /// Returns the most recently created attempt for the invoice.
    async fn latest_for_invoice(&self, invoice_id: u64) -> Result<Option<PaymentAttempt>>;
}

/// Signals shared by a payment request and the authorizer serving it.
#[derive(Debug, Clone, Default)]
pub struct AuthorizationSignals {
    /// Cancelling aborts an authorization still waiting on the network.
    pub cancel: CancellationToken,
    /// Cancelled by the authorizer once it starts waiting on the network.
    pub waiting: CancellationToken,
}

impl AuthorizationSignals {
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            waiting: CancellationToken::new(),
        }
    }
}

/// The payment network seen from the payment workflow.
///
/// Authorizing and recording are separate steps: an authorization only
/// becomes visible to lookups once it is committed.
#[async_trait]
pub trait Authorizer: Send + Sync {
    /// Decides an outcome and picks its identifiers. May wait on the network
    /// until `signals.cancel` fires.
    async fn authorize(
        &self,
        details: &PaymentDetails,
        signals: &AuthorizationSignals,
    ) -> Result<Authorization>;
    async fn commit(&self, authorization: &Authorization) -> Result<()>;
    async fn by_id(&self, id: Uuid) -> Option<Outcome>;
    async fn by_reference_id(&self, reference_id: Uuid) -> Option<Outcome>;
}

pub type InvoiceRepositoryRef = Arc<dyn InvoiceRepository>;
pub type MerchantRepositoryRef = Arc<dyn MerchantRepository>;
pub type CustomerRepositoryRef = Arc<dyn CustomerRepository>;
pub type PaymentRepositoryRef = Arc<dyn PaymentRepository>;
pub type AuthorizerRef = Arc<dyn Authorizer>;

/// The full set of repositories a backend provides.
#[derive(Clone)]
pub struct Repositories {
    pub invoices: InvoiceRepositoryRef,
    pub merchants: MerchantRepositoryRef,
    pub customers: CustomerRepositoryRef,
    pub payments: PaymentRepositoryRef,
}
