use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::invoice::{
  Invoice, InvoiceError, InvoiceFilter, InvoiceService, InvoiceStatus, InvoiceType,
};

#[derive(Debug, Default, Deserialize)]
pub struct ListInvoicesCommand {
  pub organization_id: Uuid,
  pub status: Option<String>,
  pub customer_id: Option<Uuid>,
  pub invoice_type: Option<String>,
  pub number_contains: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InvoiceListItemDto {
  pub id: Uuid,
  pub invoice_number: String,
  pub invoice_type: InvoiceType,
  pub status: InvoiceStatus,
  pub customer_id: Uuid,
  pub invoice_date: NaiveDate,
  pub due_date: Option<NaiveDate>,
  pub currency: String,
  pub total_amount: Decimal,
  pub amount_paid: Decimal,
  pub balance_due: Decimal,
}

impl From<&Invoice> for InvoiceListItemDto {
  fn from(invoice: &Invoice) -> Self {
    Self {
      id: invoice.id,
      invoice_number: invoice.invoice_number.to_string(),
      invoice_type: invoice.invoice_type,
      status: invoice.status,
      customer_id: invoice.customer_id,
      invoice_date: invoice.invoice_date,
      due_date: invoice.due_date,
      currency: invoice.currency.as_str().to_string(),
      total_amount: invoice.total_amount,
      amount_paid: invoice.amount_paid,
      balance_due: invoice.balance_due(),
    }
  }
}

#[derive(Debug, Serialize)]
pub struct ListInvoicesResponse {
  pub invoices: Vec<InvoiceListItemDto>,
}

pub struct ListInvoicesUseCase {
  invoice_service: Arc<InvoiceService>,
}

impl ListInvoicesUseCase {
  pub fn new(invoice_service: Arc<InvoiceService>) -> Self {
    Self { invoice_service }
  }

  pub async fn execute(
    &self,
    command: ListInvoicesCommand,
  ) -> Result<ListInvoicesResponse, InvoiceError> {
    let filter = InvoiceFilter {
      status: command
        .status
        .as_deref()
        .map(InvoiceStatus::from_str)
        .transpose()?,
      customer_id: command.customer_id,
      invoice_type: command
        .invoice_type
        .as_deref()
        .map(InvoiceType::from_str)
        .transpose()?,
      number_contains: command
        .number_contains
        .filter(|needle| !needle.trim().is_empty()),
    };

    let invoices = self
      .invoice_service
      .list_invoices(command.organization_id, &filter)
      .await?;

    Ok(ListInvoicesResponse {
      invoices: invoices.iter().map(InvoiceListItemDto::from).collect(),
    })
  }
}
