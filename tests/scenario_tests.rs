use async_trait::async_trait;
use payproc::application::invoice_service::{CreateInvoiceRequest, InvoiceService};
use payproc::application::payment_service::{PaymentService, ProcessPaymentRequest};
use payproc::domain::invoice::{Invoice, NewInvoice};
use payproc::domain::payment::{NewPaymentAttempt, Outcome, PaymentAttempt};
use payproc::domain::ports::{InvoiceRepository, PaymentRepository, Repositories};
use payproc::error::{Entity, ErrorKind, PaymentError, Result};
use payproc::infrastructure::in_memory::InMemoryPaymentRepository;
use payproc::provider::PaymentProvider;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio_util::sync::CancellationToken;

mod common;

/// Counts writes and delegates to an in-memory repository.
#[derive(Default)]
struct CountingPaymentRepository {
    inner: InMemoryPaymentRepository,
    creates: AtomicUsize,
}

#[async_trait]
impl PaymentRepository for CountingPaymentRepository {
    async fn create(&self, attempt: NewPaymentAttempt) -> Result<PaymentAttempt> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.inner.create(attempt).await
    }

    async fn latest_for_invoice(&self, invoice_id: u64) -> Result<Option<PaymentAttempt>> {
        self.inner.latest_for_invoice(invoice_id).await
    }
}

/// An invoice repository whose backend is down.
struct UnavailableInvoiceRepository;

#[async_trait]
impl InvoiceRepository for UnavailableInvoiceRepository {
    async fn create(&self, _invoice: NewInvoice) -> Result<Invoice> {
        Err(PaymentError::StorageError("connection refused".to_string()))
    }

    async fn get(&self, _id: u64) -> Result<Option<Invoice>> {
        Err(PaymentError::StorageError("connection refused".to_string()))
    }
}

/// A payment repository that cannot accept writes.
struct FullDiskPaymentRepository;

#[async_trait]
impl PaymentRepository for FullDiskPaymentRepository {
    async fn create(&self, _attempt: NewPaymentAttempt) -> Result<PaymentAttempt> {
        Err(PaymentError::StorageError("disk full".to_string()))
    }

    async fn latest_for_invoice(&self, _invoice_id: u64) -> Result<Option<PaymentAttempt>> {
        Ok(None)
    }
}

struct Fixture {
    invoices: InvoiceService,
    payments: PaymentService,
    payment_repo: Arc<CountingPaymentRepository>,
}

async fn fixture() -> Fixture {
    let backend = common::seeded_backend().await;
    let payment_repo = Arc::new(CountingPaymentRepository::default());
    let repositories = Repositories {
        payments: payment_repo.clone(),
        ..backend.repositories()
    };
    Fixture {
        invoices: InvoiceService::new(&repositories),
        payments: PaymentService::new(&repositories, Arc::new(PaymentProvider::default())),
        payment_repo,
    }
}

fn invoice_request(amount: rust_decimal::Decimal, currency: &str) -> CreateInvoiceRequest {
    CreateInvoiceRequest {
        merchant_id: 1,
        customer_id: 10,
        amount,
        currency: currency.to_string(),
        description: None,
    }
}

fn payment(invoice_id: u64, source: &str) -> ProcessPaymentRequest {
    ProcessPaymentRequest {
        invoice_id,
        payment_method: "card".to_string(),
        payment_source: source.to_string(),
    }
}

#[tokio::test]
async fn test_invoice_currency_scenario() {
    let f = fixture().await;

    let created = f
        .invoices
        .create_invoice(invoice_request(dec!(100.00), "USD"))
        .await
        .unwrap();
    assert_eq!(created.amount.value(), dec!(100.00));

    let err = f
        .invoices
        .create_invoice(invoice_request(dec!(100.00), "EUR"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CurrencyNotAllowed);
}

#[tokio::test]
async fn test_payment_outcome_scenarios() {
    let f = fixture().await;
    let invoice = f
        .invoices
        .create_invoice(invoice_request(dec!(150.00), "USD"))
        .await
        .unwrap();
    let cancel = CancellationToken::new();

    let cases = [
        ("4242424242421212", Outcome::InsufficientFunds),
        ("4242424242422323", Outcome::DoNotHonor),
        ("4242424242423434", Outcome::Declined),
        ("4242424242424242", Outcome::Success),
    ];
    for (source, expected) in cases {
        let attempt = f
            .payments
            .process_payment(payment(invoice.id, source), &cancel)
            .await
            .unwrap();
        assert_eq!(attempt.outcome, expected);
        // Amount always comes from the invoice.
        assert_eq!(attempt.amount.value(), dec!(150.00));
        assert_eq!(attempt.merchant_id, 1);
        assert_eq!(attempt.customer_id, 10);
        assert_eq!(
            f.payments.authorization_by_reference(attempt.reference_id).await.unwrap(),
            expected
        );
    }
    assert_eq!(f.payment_repo.creates.load(Ordering::SeqCst), 4);
    assert_eq!(f.payments.payment_status(invoice.id).await.unwrap(), Outcome::Success);
}

#[tokio::test]
async fn test_rejected_payments_never_write() {
    let f = fixture().await;
    let cancel = CancellationToken::new();

    let err = f
        .payments
        .process_payment(payment(0, "4242424242424242"), &cancel)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidRequest);

    let err = f
        .payments
        .process_payment(payment(12, "4242424242424242"), &cancel)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        PaymentError::NotFound {
            entity: Entity::Invoice,
            ..
        }
    ));

    assert_eq!(f.payment_repo.creates.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_repository_failure_is_internal_error() {
    let backend = common::seeded_backend().await;
    let repositories = Repositories {
        invoices: Arc::new(UnavailableInvoiceRepository),
        ..backend.repositories()
    };
    let payments = PaymentService::new(&repositories, Arc::new(PaymentProvider::default()));
    let invoices = InvoiceService::new(&repositories);

    let err = payments
        .process_payment(payment(1, "4242424242424242"), &CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InternalError);
    assert!(err.to_string().starts_with("Internal error while validating invoice ID"));

    let err = invoices
        .create_invoice(invoice_request(dec!(5.00), "USD"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InternalError);
    assert_eq!(backend.payments.count().await, 0);
}

#[tokio::test]
async fn test_failed_payment_write_is_internal_error_without_authorization() {
    let backend = common::seeded_backend().await;
    let invoices = InvoiceService::new(&backend.repositories());
    let invoice = invoices
        .create_invoice(invoice_request(dec!(150.00), "USD"))
        .await
        .unwrap();

    let provider = PaymentProvider::default();
    let repositories = Repositories {
        payments: Arc::new(FullDiskPaymentRepository),
        ..backend.repositories()
    };
    let payments = PaymentService::new(&repositories, Arc::new(provider.clone()));

    for source in ["4242424242424242", "4242424242421212"] {
        let err = payments
            .process_payment(payment(invoice.id, source), &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InternalError);
        assert!(err.to_string().starts_with("Failed to process payment"));
        assert!(std::error::Error::source(&err).is_some());
    }

    // No outcome is left behind for a payment that was never stored.
    assert_eq!(provider.store().len().await, (0, 0));
    assert_eq!(
        payments.payment_status(invoice.id).await.unwrap_err().kind(),
        ErrorKind::NotFound
    );
}
