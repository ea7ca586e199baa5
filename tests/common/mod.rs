#![allow(dead_code)]

use payproc::domain::party::{Customer, Merchant};
use payproc::infrastructure::in_memory::InMemoryBackend;
use std::io::Write;
use tempfile::NamedTempFile;

pub const HEADER: &str =
    "op, invoice, merchant, customer, amount, currency, method, source, reference, description";

pub const SEED_JSON: &str = r#"{
    "merchants": [
        {"id": 1, "name": "Acme Corp", "code": "ACME", "allowed_currency": "USD"},
        {"id": 2, "name": "Euro Shop", "code": "EURO", "allowed_currency": "EUR"}
    ],
    "customers": [
        {"id": 10, "name": "Jane Doe", "email": "jane@example.com", "address": "1 Main St"}
    ]
}"#;

pub fn seed_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{SEED_JSON}").unwrap();
    file
}

/// Writes a request batch, one row per entry, after the header.
pub fn requests_file(rows: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{HEADER}").unwrap();
    for row in rows {
        writeln!(file, "{row}").unwrap();
    }
    file
}

pub fn merchant(id: u64, currency: &str) -> Merchant {
    Merchant {
        id,
        name: format!("Merchant {id}"),
        code: format!("M{id}"),
        allowed_currency: currency.to_string(),
    }
}

pub fn customer(id: u64) -> Customer {
    Customer {
        id,
        name: format!("Customer {id}"),
        email: format!("customer{id}@example.com"),
        address: "1 Main St".to_string(),
    }
}

/// A backend with merchant 1 (USD) and customer 10.
pub async fn seeded_backend() -> InMemoryBackend {
    let backend = InMemoryBackend::new();
    backend.merchants.insert(merchant(1, "USD")).await;
    backend.customers.insert(customer(10)).await;
    backend
}
