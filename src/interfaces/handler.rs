use super::csv::request_reader::{Operation, RequestRecord};
use super::dto::{
    AuthorizationStatusResponse, CreateInvoiceRequest, InvoiceResponse, PaymentStatusResponse,
    ProcessPaymentRequest, ProcessPaymentResponse, Response,
};
use crate::application::invoice_service::InvoiceService;
use crate::application::payment_service::PaymentService;
use crate::domain::payment::PaymentAttempt;
use crate::domain::ports::{AuthorizationSignals, AuthorizerRef, Repositories};
use crate::error::{PaymentError, Result};
use rust_decimal::Decimal;
use std::str::FromStr;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

pub const DEFAULT_AUTHORIZATION_TIMEOUT: Duration = Duration::from_secs(30);

/// A request with the fields its operation needs.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    CreateInvoice(CreateInvoiceRequest),
    GetInvoice { invoice_id: u64 },
    Pay(ProcessPaymentRequest),
    Status { invoice_id: u64 },
    Lookup { reference_id: Uuid },
}

impl TryFrom<RequestRecord> for Request {
    type Error = PaymentError;

    // Missing identifiers become 0, the unset value, so the workflows reject them.
    fn try_from(record: RequestRecord) -> Result<Self> {
        let request = match record.op {
            Operation::CreateInvoice => {
                let amount = record.amount.as_deref().ok_or_else(|| {
                    PaymentError::InvalidRequest("Invoice amount must be provided".to_string())
                })?;
                let amount = Decimal::from_str(amount).map_err(|e| {
                    PaymentError::InvalidRequest(format!("Invalid amount {amount:?}: {e}"))
                })?;
                Request::CreateInvoice(CreateInvoiceRequest {
                    merchant_id: record.merchant.unwrap_or_default(),
                    customer_id: record.customer.unwrap_or_default(),
                    amount,
                    currency: record.currency.unwrap_or_default(),
                    description: record.description,
                })
            }
            Operation::GetInvoice => Request::GetInvoice {
                invoice_id: record.invoice.unwrap_or_default(),
            },
            Operation::Pay => Request::Pay(ProcessPaymentRequest {
                invoice_id: record.invoice.unwrap_or_default(),
                payment_method: record.method.unwrap_or_default(),
                payment_source: record.source.unwrap_or_default(),
            }),
            Operation::Status => Request::Status {
                invoice_id: record.invoice.unwrap_or_default(),
            },
            Operation::Lookup => Request::Lookup {
                reference_id: record.reference.ok_or_else(|| {
                    PaymentError::InvalidRequest("Reference ID must be provided".to_string())
                })?,
            },
        };
        Ok(request)
    }
}

/// Maps requests onto the workflows and every outcome onto a `Response`.
///
/// Each payment runs under its own child of the shutdown token and is bounded
/// by the authorization timeout. Running out of time cancels the payment
/// rather than dropping it, so a payment that already has an outcome still
/// finishes persisting it.
#[derive(Clone)]
pub struct RequestHandler {
    invoices: InvoiceService,
    payments: PaymentService,
    authorization_timeout: Duration,
    shutdown: CancellationToken,
}

impl RequestHandler {
    pub fn new(repositories: &Repositories, authorizer: AuthorizerRef) -> Self {
        Self {
            invoices: InvoiceService::new(repositories),
            payments: PaymentService::new(repositories, authorizer),
            authorization_timeout: DEFAULT_AUTHORIZATION_TIMEOUT,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.invoices = self.invoices.with_actor(actor);
        self
    }

    pub fn with_authorization_timeout(mut self, timeout: Duration) -> Self {
        self.authorization_timeout = timeout;
        self
    }

    /// Cancelling `shutdown` cancels every in-flight authorization.
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub async fn handle(&self, request: Request) -> Response {
        self.handle_settling(request, CancellationToken::new()).await
    }

    /// Handles `request`, cancelling `settled` once it can no longer change
    /// state soon: when it completes, or when its payment starts waiting on
    /// the network.
    pub async fn handle_settling(&self, request: Request, settled: CancellationToken) -> Response {
        let _settled = settled.clone().drop_guard();
        match self.dispatch(request, settled).await {
            Ok(response) => response,
            Err(e) => self.reject(e),
        }
    }

    pub fn reject(&self, err: PaymentError) -> Response {
        tracing::warn!(kind = ?err.kind(), error = %err, "Request failed");
        Response::from(err)
    }

    async fn dispatch(&self, request: Request, settled: CancellationToken) -> Result<Response> {
        let response = match request {
            Request::CreateInvoice(req) => {
                let invoice = self.invoices.create_invoice(req).await?;
                Response::Invoice(InvoiceResponse::from(invoice))
            }
            Request::GetInvoice { invoice_id } => {
                let invoice = self.invoices.get_invoice(invoice_id).await?;
                Response::Invoice(InvoiceResponse::from(invoice))
            }
            Request::Pay(req) => {
                Response::Payment(ProcessPaymentResponse::from(self.pay(req, settled).await?))
            }
            Request::Status { invoice_id } => Response::Status(PaymentStatusResponse {
                invoice_id,
                payment_status: self.payments.payment_status(invoice_id).await?,
            }),
            Request::Lookup { reference_id } => {
                Response::Authorization(AuthorizationStatusResponse {
                    reference_id,
                    payment_status: self.payments.authorization_by_reference(reference_id).await?,
                })
            }
        };
        Ok(response)
    }

    async fn pay(
        &self,
        request: ProcessPaymentRequest,
        settled: CancellationToken,
    ) -> Result<PaymentAttempt> {
        let signals = AuthorizationSignals {
            cancel: self.shutdown.child_token(),
            waiting: settled,
        };
        let payment = self.payments.process_payment_with(request, &signals);
        tokio::pin!(payment);

        tokio::select! {
            result = &mut payment => result,
            _ = tokio::time::sleep(self.authorization_timeout) => {
                signals.cancel.cancel();
                match payment.await {
                    Err(PaymentError::Cancelled) => {
                        Err(PaymentError::TimedOut(self.authorization_timeout))
                    }
                    other => other,
                }
            }
        }
    }
}
