use crate::domain::party::{Customer, Merchant};
use crate::error::Result;
use crate::infrastructure::in_memory::InMemoryBackend;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Merchant and customer reference data, loaded from JSON.
///
/// ```json
/// {
///   "merchants": [{"id": 1, "name": "Acme", "code": "ACME", "allowed_currency": "USD"}],
///   "customers": [{"id": 2, "name": "Jane", "email": "jane@example.com", "address": "1 Main St"}]
/// }
/// ```
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
pub struct Seed {
    #[serde(default)]
    pub merchants: Vec<Merchant>,
    #[serde(default)]
    pub customers: Vec<Customer>,
}

impl Seed {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    pub async fn load_into_memory(&self, backend: &InMemoryBackend) {
        for merchant in &self.merchants {
            backend.merchants.insert(merchant.clone()).await;
        }
        for customer in &self.customers {
            backend.customers.insert(customer.clone()).await;
        }
    }

    #[cfg(feature = "storage-rocksdb")]
    pub fn load_into_rocksdb(
        &self,
        store: &crate::infrastructure::rocksdb::RocksDBStore,
    ) -> Result<()> {
        for merchant in &self.merchants {
            store.put_merchant(merchant)?;
        }
        for customer in &self.customers {
            store.put_customer(customer)?;
        }
        Ok(())
    }
}
