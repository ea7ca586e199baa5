use crate::domain::payment::{
    NewPaymentAttempt, Outcome, PaymentAttempt, PaymentDetails, mask_source,
};
use crate::domain::ports::{
    AuthorizationSignals, AuthorizerRef, InvoiceRepositoryRef, PaymentRepositoryRef, Repositories,
};
use crate::error::{Entity, PaymentError, Result};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use uuid::Uuid;

/// A request to pay an invoice. The amount is never part of it: it is always
/// taken from the invoice.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProcessPaymentRequest {
    pub invoice_id: u64,
    pub payment_method: String,
    pub payment_source: String,
}

#[derive(Clone)]
pub struct PaymentService {
    invoices: InvoiceRepositoryRef,
    payments: PaymentRepositoryRef,
    authorizer: AuthorizerRef,
}

impl PaymentService {
    pub fn new(repositories: &Repositories, authorizer: AuthorizerRef) -> Self {
        Self {
            invoices: repositories.invoices.clone(),
            payments: repositories.payments.clone(),
            authorizer,
        }
    }

    /// Authorizes a payment against an existing invoice and persists the attempt.
    ///
    /// `cancel` aborts a pending authorization; nothing is persisted then.
    pub async fn process_payment(
        &self,
        request: ProcessPaymentRequest,
        cancel: &CancellationToken,
    ) -> Result<PaymentAttempt> {
        self.process_payment_with(request, &AuthorizationSignals::new(cancel.clone()))
            .await
    }

    /// Like [`Self::process_payment`], also reporting through `signals.waiting`
    /// when the authorization starts waiting on the network.
    ///
    /// The authorization is committed only after the attempt is persisted, so
    /// a failed write leaves no outcome behind.
    pub async fn process_payment_with(
        &self,
        request: ProcessPaymentRequest,
        signals: &AuthorizationSignals,
    ) -> Result<PaymentAttempt> {
        info!(
            invoice_id = request.invoice_id,
            payment_method = %request.payment_method,
            payment_source = %mask_source(&request.payment_source),
            "Processing payment"
        );

        if request.invoice_id == 0 {
            return Err(PaymentError::InvalidRequest(
                "Invoice ID must be provided".to_string(),
            ));
        }
        if request.payment_method.is_empty() || request.payment_source.is_empty() {
            return Err(PaymentError::InvalidRequest(
                "Payment method and payment source must be provided".to_string(),
            ));
        }

        let invoice = match self.invoices.get(request.invoice_id).await {
            Ok(Some(invoice)) => invoice,
            Ok(None) => {
                return Err(PaymentError::not_found(Entity::Invoice, request.invoice_id));
            }
            Err(e) => {
                error!(error = %e, "Error checking invoice existence");
                return Err(PaymentError::internal(
                    "Internal error while validating invoice ID",
                    e,
                ));
            }
        };

        let details = PaymentDetails {
            source: request.payment_source.clone(),
            amount: invoice.amount,
            currency: invoice.currency.clone(),
        };
        let authorization = self
            .authorizer
            .authorize(&details, signals)
            .await
            .map_err(|e| match e {
                PaymentError::Cancelled => e,
                other => PaymentError::internal("Payment authorization failed", other),
            })?;

        let attempt = NewPaymentAttempt {
            invoice_id: invoice.id,
            merchant_id: invoice.merchant_id,
            customer_id: invoice.customer_id,
            amount: invoice.amount,
            outcome: authorization.outcome,
            authorization_id: authorization.id,
            reference_id: authorization.reference_id,
            payment_method: request.payment_method,
            payment_source: request.payment_source,
        };

        let processed = self.payments.create(attempt).await.map_err(|e| {
            error!(error = %e, "Failed to process payment");
            PaymentError::internal("Failed to process payment", e)
        })?;

        self.authorizer.commit(&authorization).await.map_err(|e| {
            error!(payment_id = processed.id, error = %e, "Failed to record authorization");
            PaymentError::internal("Failed to record authorization", e)
        })?;

        info!(
            payment_id = processed.id,
            reference_id = %processed.reference_id,
            outcome = %processed.outcome,
            "Payment processed successfully"
        );
        Ok(processed)
    }

    /// Outcome of the most recent payment attempt on an invoice.
    pub async fn payment_status(&self, invoice_id: u64) -> Result<Outcome> {
        if invoice_id == 0 {
            return Err(PaymentError::InvalidRequest(
                "Invoice ID must be provided".to_string(),
            ));
        }
        info!(invoice_id, "Fetching payment status");

        match self.payments.latest_for_invoice(invoice_id).await {
            Ok(Some(attempt)) => {
                info!(
                    invoice_id,
                    outcome = %attempt.outcome,
                    "Successfully fetched payment status"
                );
                Ok(attempt.outcome)
            }
            Ok(None) => Err(PaymentError::not_found(Entity::Payment, invoice_id)),
            Err(e) => {
                error!(invoice_id, error = %e, "Failed to fetch payment status");
                Err(PaymentError::internal("Failed to fetch payment status", e))
            }
        }
    }

    pub async fn authorization_by_reference(&self, reference_id: Uuid) -> Result<Outcome> {
        self.authorizer
            .by_reference_id(reference_id)
            .await
            .ok_or_else(|| PaymentError::not_found(Entity::Authorization, reference_id))
    }

    pub async fn authorization_by_id(&self, id: Uuid) -> Result<Outcome> {
        self.authorizer
            .by_id(id)
            .await
            .ok_or_else(|| PaymentError::not_found(Entity::Authorization, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::invoice::{Amount, NewInvoice};
    use crate::domain::ports::InvoiceRepository;
    use crate::error::ErrorKind;
    use crate::infrastructure::in_memory::InMemoryBackend;
    use crate::provider::PaymentProvider;
    use rust_decimal_macros::dec;
    use std::sync::Arc;
    use std::time::Duration;

    async fn setup() -> (InMemoryBackend, PaymentService, PaymentProvider) {
        let backend = InMemoryBackend::new();
        backend
            .invoices
            .create(NewInvoice {
                merchant_id: 3,
                customer_id: 4,
                amount: Amount::new(dec!(150.00)).unwrap(),
                currency: "USD".to_string(),
                description: None,
                created_by: "system".to_string(),
            })
            .await
            .unwrap();
        let provider = PaymentProvider::default();
        let service = PaymentService::new(&backend.repositories(), Arc::new(provider.clone()));
        (backend, service, provider)
    }

    fn pay(invoice_id: u64, source: &str) -> ProcessPaymentRequest {
        ProcessPaymentRequest {
            invoice_id,
            payment_method: "card".to_string(),
            payment_source: source.to_string(),
        }
    }

    #[tokio::test]
    async fn test_process_payment_copies_invoice_fields() {
        let (_, service, provider) = setup().await;

        let attempt = service
            .process_payment(pay(1, "4242424242424242"), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(attempt.amount.value(), dec!(150.00));
        assert_eq!(attempt.merchant_id, 3);
        assert_eq!(attempt.customer_id, 4);
        assert_eq!(attempt.outcome, Outcome::Success);
        assert_eq!(
            provider.store().by_reference_id(attempt.reference_id).await,
            Some(Outcome::Success)
        );
        assert_eq!(
            service.authorization_by_id(attempt.authorization_id).await.unwrap(),
            Outcome::Success
        );
    }

    #[tokio::test]
    async fn test_insufficient_funds_outcome() {
        let (_, service, _) = setup().await;
        let attempt = service
            .process_payment(pay(1, "4242424242421212"), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(attempt.outcome, Outcome::InsufficientFunds);
        assert_eq!(service.payment_status(1).await.unwrap(), Outcome::InsufficientFunds);
    }

    #[tokio::test]
    async fn test_zero_invoice_id_rejected_without_persistence() {
        let (backend, service, provider) = setup().await;
        let err = service
            .process_payment(pay(0, "4242424242424242"), &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
        assert_eq!(backend.payments.count().await, 0);
        assert!(provider.store().is_empty().await);
    }

    #[tokio::test]
    async fn test_unknown_invoice_rejected_without_persistence() {
        let (backend, service, provider) = setup().await;
        let err = service
            .process_payment(pay(42, "4242424242424242"), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PaymentError::NotFound {
                entity: Entity::Invoice,
                ..
            }
        ));
        assert_eq!(backend.payments.count().await, 0);
        assert!(provider.store().is_empty().await);
    }

    #[tokio::test]
    async fn test_cancelled_authorization_persists_nothing() {
        let (backend, service, _) = setup().await;
        let cancel = CancellationToken::new();

        let task = {
            let service = service.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move {
                service
                    .process_payment(pay(1, "4242424242424545"), &cancel)
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel.cancel();

        assert!(matches!(task.await.unwrap(), Err(PaymentError::Cancelled)));
        assert_eq!(backend.payments.count().await, 0);
    }

    struct UnwritablePayments;

    #[async_trait::async_trait]
    impl crate::domain::ports::PaymentRepository for UnwritablePayments {
        async fn create(&self, _attempt: NewPaymentAttempt) -> Result<PaymentAttempt> {
            Err(PaymentError::StorageError("disk full".to_string()))
        }

        async fn latest_for_invoice(&self, _invoice_id: u64) -> Result<Option<PaymentAttempt>> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn test_failed_write_leaves_no_authorization() {
        let (backend, _, provider) = setup().await;
        let repositories = Repositories {
            payments: Arc::new(UnwritablePayments),
            ..backend.repositories()
        };
        let service = PaymentService::new(&repositories, Arc::new(provider.clone()));

        let err = service
            .process_payment(pay(1, "4242424242421212"), &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InternalError);
        assert!(err.to_string().starts_with("Failed to process payment"));
        assert_eq!(provider.store().len().await, (0, 0));
    }

    #[tokio::test]
    async fn test_waiting_signal_fires_for_unresponsive_network() {
        let (_, service, provider) = setup().await;
        let signals = AuthorizationSignals::default();

        let task = {
            let service = service.clone();
            let signals = signals.clone();
            tokio::spawn(async move {
                service
                    .process_payment_with(pay(1, "4242424242424545"), &signals)
                    .await
            })
        };
        signals.waiting.cancelled().await;
        assert!(!task.is_finished());
        signals.cancel.cancel();

        assert!(matches!(task.await.unwrap(), Err(PaymentError::Cancelled)));
        assert!(provider.store().is_empty().await);
    }

    #[tokio::test]
    async fn test_status_latest_attempt_wins() {
        let (_, service, _) = setup().await;
        let cancel = CancellationToken::new();
        service
            .process_payment(pay(1, "4242424242423434"), &cancel)
            .await
            .unwrap();
        service
            .process_payment(pay(1, "4242424242424242"), &cancel)
            .await
            .unwrap();

        assert_eq!(service.payment_status(1).await.unwrap(), Outcome::Success);
    }

    #[tokio::test]
    async fn test_status_not_found() {
        let (_, service, _) = setup().await;
        assert_eq!(
            service.payment_status(1).await.unwrap_err().kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            service
                .authorization_by_reference(Uuid::now_v7())
                .await
                .unwrap_err()
                .kind(),
            ErrorKind::NotFound
        );
    }
}
