use crate::error::PaymentError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A strictly positive monetary amount.
///
/// Wraps `rust_decimal::Decimal` so amounts never go through floating point,
/// and so a zero or negative value cannot reach an invoice or a payment.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, PaymentError> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(PaymentError::InvalidRequest(
                "Invoice amount must be greater than zero".to_string(),
            ))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = PaymentError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

/// Who created a record and when it was last touched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditTrail {
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub last_updated_at: DateTime<Utc>,
    pub last_updated_by: String,
}

impl AuditTrail {
    pub fn new(actor: &str, now: DateTime<Utc>) -> Self {
        Self {
            created_at: now,
            created_by: actor.to_string(),
            last_updated_at: now,
            last_updated_by: actor.to_string(),
        }
    }
}

/// An invoice that passed validation but has not been persisted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewInvoice {
    pub merchant_id: u64,
    pub customer_id: u64,
    pub amount: Amount,
    pub currency: String,
    pub description: Option<String>,
    pub created_by: String,
}

impl NewInvoice {
    /// Assigns the repository identifier and audit timestamps.
    pub fn into_invoice(self, id: u64, now: DateTime<Utc>) -> Invoice {
        Invoice {
            id,
            merchant_id: self.merchant_id,
            customer_id: self.customer_id,
            amount: self.amount,
            currency: self.currency,
            description: self.description,
            audit: AuditTrail::new(&self.created_by, now),
        }
    }
}

/// A persisted invoice. Read-only once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: u64,
    pub merchant_id: u64,
    pub customer_id: u64,
    pub amount: Amount,
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub audit: AuditTrail,
}
