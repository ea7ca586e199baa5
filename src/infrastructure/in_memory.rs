use crate::domain::invoice::{Invoice, NewInvoice};
use crate::domain::party::{Customer, Merchant};
use crate::domain::payment::{NewPaymentAttempt, PaymentAttempt};
use crate::domain::ports::{
    CustomerRepository, InvoiceRepository, MerchantRepository, PaymentRepository, Repositories,
};
use crate::error::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory store for merchants.
///
/// Merchants are reference data; `insert` exists for seeding.
#[derive(Default, Clone)]
pub struct InMemoryMerchantRepository {
    merchants: Arc<RwLock<HashMap<u64, Merchant>>>,
}

impl InMemoryMerchantRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, merchant: Merchant) {
        self.merchants.write().await.insert(merchant.id, merchant);
    }
}

#[async_trait]
impl MerchantRepository for InMemoryMerchantRepository {
    async fn get(&self, id: u64) -> Result<Option<Merchant>> {
        Ok(self.merchants.read().await.get(&id).cloned())
    }

    async fn allowed_currency(&self, id: u64) -> Result<Option<String>> {
        Ok(self
            .merchants
            .read()
            .await
            .get(&id)
            .map(|m| m.allowed_currency.clone()))
    }
}

/// A thread-safe in-memory store for customers.
#[derive(Default, Clone)]
pub struct InMemoryCustomerRepository {
    customers: Arc<RwLock<HashMap<u64, Customer>>>,
}

impl InMemoryCustomerRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, customer: Customer) {
        self.customers.write().await.insert(customer.id, customer);
    }
}

#[async_trait]
impl CustomerRepository for InMemoryCustomerRepository {
    async fn get(&self, id: u64) -> Result<Option<Customer>> {
        Ok(self.customers.read().await.get(&id).cloned())
    }
}

#[derive(Default)]
struct InvoiceTable {
    last_id: u64,
    rows: HashMap<u64, Invoice>,
}

/// A thread-safe in-memory store for invoices. Identifiers start at 1.
#[derive(Default, Clone)]
pub struct InMemoryInvoiceRepository {
    table: Arc<RwLock<InvoiceTable>>,
}

impl InMemoryInvoiceRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InvoiceRepository for InMemoryInvoiceRepository {
    async fn create(&self, invoice: NewInvoice) -> Result<Invoice> {
        let mut table = self.table.write().await;
        table.last_id += 1;
        let invoice = invoice.into_invoice(table.last_id, Utc::now());
        table.rows.insert(invoice.id, invoice.clone());
        Ok(invoice)
    }

    async fn get(&self, id: u64) -> Result<Option<Invoice>> {
        Ok(self.table.read().await.rows.get(&id).cloned())
    }
}

#[derive(Default)]
struct PaymentTable {
    last_id: u64,
    // invoice id -> attempts ordered by payment id
    by_invoice: HashMap<u64, BTreeMap<u64, PaymentAttempt>>,
}

/// A thread-safe in-memory store for payment attempts.
#[derive(Default, Clone)]
pub struct InMemoryPaymentRepository {
    table: Arc<RwLock<PaymentTable>>,
}

impl InMemoryPaymentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn count(&self) -> usize {
        self.table
            .read()
            .await
            .by_invoice
            .values()
            .map(BTreeMap::len)
            .sum()
    }
}

#[async_trait]
impl PaymentRepository for InMemoryPaymentRepository {
    async fn create(&self, attempt: NewPaymentAttempt) -> Result<PaymentAttempt> {
        let mut table = self.table.write().await;
        table.last_id += 1;
        let attempt = attempt.into_attempt(table.last_id, Utc::now());
        table
            .by_invoice
            .entry(attempt.invoice_id)
            .or_default()
            .insert(attempt.id, attempt.clone());
        Ok(attempt)
    }

    async fn latest_for_invoice(&self, invoice_id: u64) -> Result<Option<PaymentAttempt>> {
        let table = self.table.read().await;
        Ok(table
            .by_invoice
            .get(&invoice_id)
            .and_then(|attempts| attempts.last_key_value())
            .map(|(_, attempt)| attempt.clone()))
    }
}

/// In-memory repositories for every entity, with handles kept for seeding.
#[derive(Default, Clone)]
pub struct InMemoryBackend {
    pub merchants: InMemoryMerchantRepository,
    pub customers: InMemoryCustomerRepository,
    pub invoices: InMemoryInvoiceRepository,
    pub payments: InMemoryPaymentRepository,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn repositories(&self) -> Repositories {
        Repositories {
            invoices: Arc::new(self.invoices.clone()),
            merchants: Arc::new(self.merchants.clone()),
            customers: Arc::new(self.customers.clone()),
            payments: Arc::new(self.payments.clone()),
        }
    }
}
