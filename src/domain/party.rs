use serde::{Deserialize, Serialize};

/// A merchant that issues invoices.
///
/// A merchant accepts exactly one currency. Invoices in any other currency
/// are rejected at creation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Merchant {
    pub id: u64,
    pub name: String,
    pub code: String,
    pub allowed_currency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub address: String,
}
