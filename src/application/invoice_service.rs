use crate::domain::invoice::{Amount, Invoice, NewInvoice};
use crate::domain::ports::{
    CustomerRepositoryRef, InvoiceRepositoryRef, MerchantRepositoryRef, Repositories,
};
use crate::error::{Entity, PaymentError, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{error, info, warn};

pub const DEFAULT_ACTOR: &str = "system";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreateInvoiceRequest {
    pub merchant_id: u64,
    pub customer_id: u64,
    pub amount: Decimal,
    pub currency: String,
    #[serde(default, alias = "optional_description")]
    pub description: Option<String>,
}

/// Validates invoice requests against merchant, customer and currency rules
/// and persists the ones that pass.
#[derive(Clone)]
pub struct InvoiceService {
    invoices: InvoiceRepositoryRef,
    merchants: MerchantRepositoryRef,
    customers: CustomerRepositoryRef,
    actor: String,
}

impl InvoiceService {
    pub fn new(repositories: &Repositories) -> Self {
        Self {
            invoices: repositories.invoices.clone(),
            merchants: repositories.merchants.clone(),
            customers: repositories.customers.clone(),
            actor: DEFAULT_ACTOR.to_string(),
        }
    }

    /// Sets the actor recorded in the audit trail of created invoices.
    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = actor.into();
        self
    }

    pub async fn create_invoice(&self, request: CreateInvoiceRequest) -> Result<Invoice> {
        info!(
            merchant_id = request.merchant_id,
            customer_id = request.customer_id,
            amount = %request.amount,
            currency = %request.currency,
            "Attempting to create a new invoice"
        );

        let amount = self.validate(&request).await?;

        let invoice = NewInvoice {
            merchant_id: request.merchant_id,
            customer_id: request.customer_id,
            amount,
            currency: request.currency,
            description: request.description.filter(|d| !d.is_empty()),
            created_by: self.actor.clone(),
        };

        let created = self.invoices.create(invoice).await.map_err(|e| {
            error!(error = %e, "Failed to create invoice");
            PaymentError::internal("Failed to create invoice", e)
        })?;

        info!(invoice_id = created.id, "Invoice created successfully");
        Ok(created)
    }

    /// Runs every check `create_invoice` performs, without writing anything.
    ///
    /// Structural checks come first; no repository is queried for a request
    /// that fails them.
    pub async fn validate(&self, request: &CreateInvoiceRequest) -> Result<Amount> {
        if request.merchant_id == 0 || request.customer_id == 0 {
            return Err(PaymentError::InvalidRequest(
                "Merchant ID and customer ID must be provided".to_string(),
            ));
        }
        let amount = Amount::new(request.amount)?;
        if request.currency.is_empty() {
            return Err(PaymentError::InvalidRequest(
                "Currency must be provided".to_string(),
            ));
        }

        match self.merchants.get(request.merchant_id).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                warn!(merchant_id = request.merchant_id, "Merchant not found");
                return Err(PaymentError::not_found(Entity::Merchant, request.merchant_id));
            }
            Err(e) => {
                error!(error = %e, "Error checking merchant existence");
                return Err(PaymentError::internal(
                    "Internal error while validating merchant ID",
                    e,
                ));
            }
        }

        match self.customers.get(request.customer_id).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                warn!(customer_id = request.customer_id, "Customer not found");
                return Err(PaymentError::not_found(Entity::Customer, request.customer_id));
            }
            Err(e) => {
                error!(error = %e, "Error checking customer existence");
                return Err(PaymentError::internal(
                    "Internal error while validating customer ID",
                    e,
                ));
            }
        }

        let allowed_currency = match self.merchants.allowed_currency(request.merchant_id).await {
            Ok(Some(currency)) => currency,
            Ok(None) => {
                return Err(PaymentError::not_found(Entity::Merchant, request.merchant_id));
            }
            Err(e) => {
                error!(error = %e, "Error fetching allowed currency for merchant");
                return Err(PaymentError::internal(
                    "Internal error while validating currency",
                    e,
                ));
            }
        };

        // Exact, case-sensitive match.
        if request.currency != allowed_currency {
            warn!(
                merchant_id = request.merchant_id,
                currency = %request.currency,
                allowed_currency = %allowed_currency,
                "Currency is not allowed for the merchant"
            );
            return Err(PaymentError::CurrencyNotAllowed {
                merchant_id: request.merchant_id,
                currency: request.currency.clone(),
            });
        }

        Ok(amount)
    }

    pub async fn get_invoice(&self, id: u64) -> Result<Invoice> {
        if id == 0 {
            return Err(PaymentError::InvalidRequest(
                "Invoice ID must be provided".to_string(),
            ));
        }
        info!(invoice_id = id, "Fetching invoice by ID");

        match self.invoices.get(id).await {
            Ok(Some(invoice)) => Ok(invoice),
            Ok(None) => Err(PaymentError::not_found(Entity::Invoice, id)),
            Err(e) => {
                error!(invoice_id = id, error = %e, "Error fetching invoice");
                Err(PaymentError::internal("Internal error while fetching invoice", e))
            }
        }
    }
}
