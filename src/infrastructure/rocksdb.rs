use crate::domain::invoice::{Invoice, NewInvoice};
use crate::domain::party::{Customer, Merchant};
use crate::domain::payment::{NewPaymentAttempt, PaymentAttempt};
use crate::domain::ports::{
    CustomerRepository, InvoiceRepository, MerchantRepository, PaymentRepository, Repositories,
};
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use chrono::Utc;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, Direction, IteratorMode, Options};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column Family for merchant reference data.
pub const CF_MERCHANTS: &str = "merchants";
/// Column Family for customer reference data.
pub const CF_CUSTOMERS: &str = "customers";
/// Column Family for invoices, keyed by invoice id.
pub const CF_INVOICES: &str = "invoices";
/// Column Family for payment attempts, keyed by `invoice_id ‖ payment_id`.
pub const CF_PAYMENTS: &str = "payments";
/// Column Family holding the last allocated id per sequence.
pub const CF_SEQUENCES: &str = "sequences";

const SEQ_INVOICES: &[u8] = b"invoices";
const SEQ_PAYMENTS: &[u8] = b"payments";

/// A persistent store implementation using RocksDB.
///
/// Holds every entity in its own Column Family, JSON-encoded. Id allocation
/// and the insert that uses the id happen under one mutex, so concurrent
/// creates never share an id.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    sequence_lock: Arc<Mutex<()>>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let descriptors = [
            CF_MERCHANTS,
            CF_CUSTOMERS,
            CF_INVOICES,
            CF_PAYMENTS,
            CF_SEQUENCES,
        ]
        .into_iter()
        .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
        .collect::<Vec<_>>();

        let db = DB::open_cf_descriptors(&opts, path, descriptors)?;

        Ok(Self {
            db: Arc::new(db),
            sequence_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn repositories(&self) -> Repositories {
        Repositories {
            invoices: Arc::new(self.clone()),
            merchants: Arc::new(self.clone()),
            customers: Arc::new(self.clone()),
            payments: Arc::new(self.clone()),
        }
    }

    pub fn put_merchant(&self, merchant: &Merchant) -> Result<()> {
        self.put_json(CF_MERCHANTS, &merchant.id.to_be_bytes(), merchant)
    }

    pub fn put_customer(&self, customer: &Customer) -> Result<()> {
        self.put_json(CF_CUSTOMERS, &customer.id.to_be_bytes(), customer)
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| PaymentError::StorageError(format!("{name} column family not found")))
    }

    fn put_json<T: Serialize>(&self, cf_name: &str, key: &[u8], value: &T) -> Result<()> {
        let cf = self.cf(cf_name)?;
        let bytes = serde_json::to_vec(value)?;
        self.db.put_cf(&cf, key, bytes)?;
        Ok(())
    }

    fn get_json<T: DeserializeOwned>(&self, cf_name: &str, key: &[u8]) -> Result<Option<T>> {
        let cf = self.cf(cf_name)?;
        match self.db.get_pinned_cf(&cf, key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Bumps and returns the next id of a sequence. Caller holds `sequence_lock`.
    fn next_id(&self, sequence: &[u8]) -> Result<u64> {
        let cf = self.cf(CF_SEQUENCES)?;
        let last = match self.db.get_pinned_cf(&cf, sequence)? {
            Some(bytes) => decode_u64(&bytes)?,
            None => 0,
        };
        let next = last + 1;
        self.db.put_cf(&cf, sequence, next.to_be_bytes())?;
        Ok(next)
    }
}

fn decode_u64(bytes: &[u8]) -> Result<u64> {
    let array: [u8; 8] = bytes
        .try_into()
        .map_err(|_| PaymentError::StorageError("Corrupt sequence value".to_string()))?;
    Ok(u64::from_be_bytes(array))
}

fn payment_key(invoice_id: u64, payment_id: u64) -> [u8; 16] {
    let mut key = [0u8; 16];
    key[..8].copy_from_slice(&invoice_id.to_be_bytes());
    key[8..].copy_from_slice(&payment_id.to_be_bytes());
    key
}

#[async_trait]
impl MerchantRepository for RocksDBStore {
    async fn get(&self, id: u64) -> Result<Option<Merchant>> {
        self.get_json(CF_MERCHANTS, &id.to_be_bytes())
    }

    async fn allowed_currency(&self, id: u64) -> Result<Option<String>> {
        let merchant: Option<Merchant> = self.get_json(CF_MERCHANTS, &id.to_be_bytes())?;
        Ok(merchant.map(|m| m.allowed_currency))
    }
}

#[async_trait]
impl CustomerRepository for RocksDBStore {
    async fn get(&self, id: u64) -> Result<Option<Customer>> {
        self.get_json(CF_CUSTOMERS, &id.to_be_bytes())
    }
}

#[async_trait]
impl InvoiceRepository for RocksDBStore {
    async fn create(&self, invoice: NewInvoice) -> Result<Invoice> {
        let _guard = self.sequence_lock.lock().await;
        let id = self.next_id(SEQ_INVOICES)?;
        let invoice = invoice.into_invoice(id, Utc::now());
        self.put_json(CF_INVOICES, &id.to_be_bytes(), &invoice)?;
        Ok(invoice)
    }

    async fn get(&self, id: u64) -> Result<Option<Invoice>> {
        self.get_json(CF_INVOICES, &id.to_be_bytes())
    }
}

#[async_trait]
impl PaymentRepository for RocksDBStore {
    async fn create(&self, attempt: NewPaymentAttempt) -> Result<PaymentAttempt> {
        let _guard = self.sequence_lock.lock().await;
        let id = self.next_id(SEQ_PAYMENTS)?;
        let attempt = attempt.into_attempt(id, Utc::now());
        self.put_json(CF_PAYMENTS, &payment_key(attempt.invoice_id, id), &attempt)?;
        Ok(attempt)
    }

    async fn latest_for_invoice(&self, invoice_id: u64) -> Result<Option<PaymentAttempt>> {
        let cf = self.cf(CF_PAYMENTS)?;
        let upper = payment_key(invoice_id, u64::MAX);
        let prefix = invoice_id.to_be_bytes();

        let mut iter = self
            .db
            .iterator_cf(&cf, IteratorMode::From(&upper, Direction::Reverse));
        match iter.next() {
            Some(item) => {
                let (key, value) = item?;
                if key.starts_with(&prefix) {
                    Ok(Some(serde_json::from_slice(&value)?))
                } else {
                    Ok(None)
                }
            }
            None => Ok(None),
        }
    }
}
