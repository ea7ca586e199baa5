//! Application layer containing the workflow orchestration.
//!
//! `InvoiceService` validates and creates invoices. `PaymentService` authorizes
//! payments against existing invoices and answers status queries. Both depend
//! only on the ports in `crate::domain::ports`, so any backend can sit behind them.

pub mod invoice_service;
pub mod payment_service;
