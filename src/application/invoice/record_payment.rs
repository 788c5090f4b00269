use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::invoice::{InvoiceError, InvoiceService, InvoiceStatus, value_objects};

#[derive(Debug, Deserialize)]
pub struct RecordPaymentCommand {
  pub organization_id: Uuid,
  pub invoice_id: Uuid,
  #[serde(alias = "amount_paid_now")]
  pub amount: Decimal,
}

#[derive(Debug, Serialize)]
pub struct RecordPaymentResponse {
  pub invoice_id: Uuid,
  pub invoice_number: String,
  pub status: InvoiceStatus,
  pub total_amount: Decimal,
  pub amount_paid: Decimal,
  pub balance_due: Decimal,
}

pub struct RecordPaymentUseCase {
  invoice_service: Arc<InvoiceService>,
}

impl RecordPaymentUseCase {
  pub fn new(invoice_service: Arc<InvoiceService>) -> Self {
    Self { invoice_service }
  }

  pub async fn execute(
    &self,
    command: RecordPaymentCommand,
  ) -> Result<RecordPaymentResponse, InvoiceError> {
    if command.amount <= Decimal::ZERO {
      return Err(InvoiceError::InvalidInput(
        "Payment amount must be greater than zero".to_string(),
      ));
    }
    let amount = value_objects::money_amount("amount", command.amount)?;

    let invoice = self
      .invoice_service
      .get_organization_invoice(command.organization_id, command.invoice_id)
      .await?;

    let invoice = self
      .invoice_service
      .record_payment(invoice.id, amount)
      .await?;

    Ok(RecordPaymentResponse {
      invoice_id: invoice.id,
      balance_due: invoice.balance_due(),
      invoice_number: invoice.invoice_number.into_inner(),
      status: invoice.status,
      total_amount: invoice.total_amount,
      amount_paid: invoice.amount_paid,
    })
  }
}
