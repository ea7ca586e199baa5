//! Concurrent execution of a request batch.
//!
//! Every row runs on its own task. A row only waits for the earlier rows whose
//! effects it reads:
//!
//! - invoice creations run one after another, so ids follow row order;
//! - rows naming an invoice wait for earlier creations and for earlier
//!   payments on the same invoice to settle;
//! - lookups wait for nothing.
//!
//! A payment settles when it completes or when it starts waiting on the
//! network, so an unresponsive network only holds up its own row. Once every
//! row has settled the batch has no more work it can finish on its own, and
//! payments still waiting on the network are cancelled.
//!
//! Responses are written in row order.

use super::dto::Response;
use super::handler::{Request, RequestHandler};
use super::response_writer::ResponseWriter;
use crate::error::{PaymentError, Result};
use std::collections::HashMap;
use std::io::Write;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub struct BatchRunner {
    handler: RequestHandler,
    drain: CancellationToken,
    last_creation: Option<CancellationToken>,
    payments_by_invoice: HashMap<u64, Vec<CancellationToken>>,
    settled: Vec<CancellationToken>,
    rows: Vec<JoinHandle<Response>>,
}

impl BatchRunner {
    /// `shutdown` cancels every in-flight payment of the batch.
    pub fn new(handler: RequestHandler, shutdown: &CancellationToken) -> Self {
        let drain = shutdown.child_token();
        Self {
            handler: handler.with_shutdown(drain.clone()),
            drain,
            last_creation: None,
            payments_by_invoice: HashMap::new(),
            settled: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Schedules a row. Rows that failed to convert are answered right away.
    pub fn submit(&mut self, request: Result<Request>) {
        let request = match request {
            Ok(request) => request,
            Err(e) => {
                let response = self.handler.reject(e);
                self.rows.push(tokio::spawn(async move { response }));
                return;
            }
        };

        let settled = CancellationToken::new();
        let dependencies = self.dependencies(&request, &settled);
        let handler = self.handler.clone();
        let row_settled = settled.clone();
        self.settled.push(settled);
        self.rows.push(tokio::spawn(async move {
            for dependency in dependencies {
                dependency.cancelled().await;
            }
            handler.handle_settling(request, row_settled).await
        }));
    }

    fn dependencies(
        &mut self,
        request: &Request,
        settled: &CancellationToken,
    ) -> Vec<CancellationToken> {
        let mut dependencies: Vec<CancellationToken> = self.last_creation.iter().cloned().collect();

        match request {
            Request::CreateInvoice(_) => {
                self.last_creation = Some(settled.clone());
            }
            Request::GetInvoice { invoice_id } | Request::Status { invoice_id } => {
                dependencies.extend(self.pending_payments(*invoice_id));
            }
            Request::Pay(req) => {
                dependencies.extend(self.pending_payments(req.invoice_id));
                self.payments_by_invoice
                    .entry(req.invoice_id)
                    .or_default()
                    .push(settled.clone());
            }
            Request::Lookup { .. } => dependencies.clear(),
        }
        dependencies
    }

    fn pending_payments(&mut self, invoice_id: u64) -> Vec<CancellationToken> {
        match self.payments_by_invoice.get_mut(&invoice_id) {
            Some(payments) => {
                payments.retain(|payment| !payment.is_cancelled());
                payments.clone()
            }
            None => Vec::new(),
        }
    }

    /// Waits for the batch to settle, cancels what is still waiting on the
    /// network and writes every response in row order.
    pub async fn finish<W: Write>(self, writer: &mut ResponseWriter<W>) -> Result<()> {
        for settled in &self.settled {
            settled.cancelled().await;
        }
        if !self.drain.is_cancelled() {
            tracing::debug!("Batch settled, cancelling payments still waiting on the network");
            self.drain.cancel();
        }

        for row in self.rows {
            let response = match row.await {
                Ok(response) => response,
                Err(e) => self.handler.reject(PaymentError::InternalError {
                    context: "Request worker failed".to_string(),
                    source: Box::new(e),
                }),
            };
            writer.write_response(&response)?;
        }
        writer.flush()
    }
}
