use super::invoice::Amount;
use crate::error::PaymentError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// The result of a simulated authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    Success,
    InsufficientFunds,
    DoNotHonor,
    Declined,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "SUCCESS",
            Outcome::InsufficientFunds => "INSUFFICIENT_FUNDS",
            Outcome::DoNotHonor => "DO_NOT_HONOR",
            Outcome::Declined => "DECLINED",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Outcome {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SUCCESS" => Ok(Outcome::Success),
            "INSUFFICIENT_FUNDS" => Ok(Outcome::InsufficientFunds),
            "DO_NOT_HONOR" => Ok(Outcome::DoNotHonor),
            "DECLINED" => Ok(Outcome::Declined),
            other => Err(PaymentError::InvalidRequest(format!(
                "Unknown payment outcome: {other}"
            ))),
        }
    }
}

/// What the payment network needs to decide an authorization.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentDetails {
    pub source: String,
    pub amount: Amount,
    pub currency: String,
}

/// A recorded authorization decision, reachable by either identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authorization {
    pub id: Uuid,
    pub reference_id: Uuid,
    pub outcome: Outcome,
}

/// A payment attempt that has been authorized but not yet persisted.
///
/// Amount and parties always come from the invoice, never from the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPaymentAttempt {
    pub invoice_id: u64,
    pub merchant_id: u64,
    pub customer_id: u64,
    pub amount: Amount,
    pub outcome: Outcome,
    pub authorization_id: Uuid,
    pub reference_id: Uuid,
    pub payment_method: String,
    pub payment_source: String,
}

impl NewPaymentAttempt {
    pub fn into_attempt(self, id: u64, now: DateTime<Utc>) -> PaymentAttempt {
        PaymentAttempt {
            id,
            invoice_id: self.invoice_id,
            merchant_id: self.merchant_id,
            customer_id: self.customer_id,
            amount: self.amount,
            outcome: self.outcome,
            authorization_id: self.authorization_id,
            reference_id: self.reference_id,
            payment_method: self.payment_method,
            payment_source: self.payment_source,
            created_at: now,
        }
    }
}

/// A persisted payment attempt. Write-once: there is no update or cancel path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentAttempt {
    pub id: u64,
    pub invoice_id: u64,
    pub merchant_id: u64,
    pub customer_id: u64,
    pub amount: Amount,
    pub outcome: Outcome,
    pub authorization_id: Uuid,
    pub reference_id: Uuid,
    pub payment_method: String,
    pub payment_source: String,
    pub created_at: DateTime<Utc>,
}

/// Masks all but the last four characters of a payment source.
pub fn mask_source(source: &str) -> String {
    let chars: Vec<char> = source.chars().collect();
    let visible = chars.len().min(4);
    let hidden = chars.len() - visible;
    let tail: String = chars[hidden..].iter().collect();
    format!("{}{}", "*".repeat(hidden), tail)
}
