use crate::domain::invoice::Invoice;
use crate::domain::payment::{Outcome, PaymentAttempt, mask_source};
use crate::error::{ErrorKind, PaymentError};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

pub use crate::application::invoice_service::CreateInvoiceRequest;
pub use crate::application::payment_service::ProcessPaymentRequest;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceResponse {
    pub id: u64,
    pub merchant_id: u64,
    pub customer_id: u64,
    pub amount: Decimal,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Invoice> for InvoiceResponse {
    fn from(invoice: Invoice) -> Self {
        Self {
            id: invoice.id,
            merchant_id: invoice.merchant_id,
            customer_id: invoice.customer_id,
            amount: invoice.amount.value(),
            currency: invoice.currency,
            description: invoice.description,
            created_at: invoice.audit.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessPaymentResponse {
    pub id: u64,
    pub invoice_id: u64,
    pub merchant_id: u64,
    pub customer_id: u64,
    pub amount: Decimal,
    pub payment_status: Outcome,
    pub payment_method: String,
    pub payment_source: String,
    pub reference_id: Uuid,
}

impl From<PaymentAttempt> for ProcessPaymentResponse {
    fn from(attempt: PaymentAttempt) -> Self {
        Self {
            id: attempt.id,
            invoice_id: attempt.invoice_id,
            merchant_id: attempt.merchant_id,
            customer_id: attempt.customer_id,
            amount: attempt.amount.value(),
            payment_status: attempt.outcome,
            payment_method: attempt.payment_method,
            payment_source: mask_source(&attempt.payment_source),
            reference_id: attempt.reference_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentStatusResponse {
    pub invoice_id: u64,
    pub payment_status: Outcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthorizationStatusResponse {
    pub reference_id: Uuid,
    pub payment_status: Outcome,
}

/// What a caller sees when a request fails.
///
/// Internal failures only expose the workflow message, never the
/// underlying storage error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorKind,
    pub message: String,
}

impl From<&PaymentError> for ErrorResponse {
    fn from(err: &PaymentError) -> Self {
        let message = match err {
            PaymentError::InternalError { context, .. } => context.clone(),
            PaymentError::InvalidRequest(_)
            | PaymentError::NotFound { .. }
            | PaymentError::CurrencyNotAllowed { .. }
            | PaymentError::Cancelled
            | PaymentError::TimedOut(_) => err.to_string(),
            _ => "Internal error".to_string(),
        };
        Self {
            error: err.kind(),
            message,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Invoice(InvoiceResponse),
    Payment(ProcessPaymentResponse),
    Status(PaymentStatusResponse),
    Authorization(AuthorizationStatusResponse),
    Error(ErrorResponse),
}

impl Response {
    pub fn is_error(&self) -> bool {
        matches!(self, Response::Error(_))
    }
}

impl From<PaymentError> for Response {
    fn from(err: PaymentError) -> Self {
        Response::Error(ErrorResponse::from(&err))
    }
}
