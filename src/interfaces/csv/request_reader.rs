use crate::error::{PaymentError, Result};
use serde::Deserialize;
use std::io::Read;
use uuid::Uuid;

#[derive(Debug, Deserialize, PartialEq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    CreateInvoice,
    GetInvoice,
    Pay,
    Status,
    Lookup,
}

/// One row of a request batch.
///
/// Only `op` is mandatory; which other columns matter depends on it. Amounts
/// stay textual here so they are parsed as exact decimals later.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct RequestRecord {
    pub op: Operation,
    #[serde(default)]
    pub invoice: Option<u64>,
    #[serde(default)]
    pub merchant: Option<u64>,
    #[serde(default)]
    pub customer: Option<u64>,
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub reference: Option<Uuid>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Reads request records from a CSV source.
///
/// Wraps `csv::Reader`, trimming whitespace and accepting short records.
pub struct RequestReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> RequestReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily reads and deserializes records, one per row.
    pub fn requests(self) -> impl Iterator<Item = Result<RequestRecord>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(PaymentError::from))
    }
}
