use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::invoice::{InvoiceError, InvoiceService};

#[derive(Debug, Deserialize)]
pub struct DeleteInvoiceCommand {
  pub organization_id: Uuid,
  pub invoice_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct DeleteInvoiceResponse {
  pub invoice_id: Uuid,
  pub invoice_number: String,
  pub deleted: bool,
}

pub struct DeleteInvoiceUseCase {
  invoice_service: Arc<InvoiceService>,
}

impl DeleteInvoiceUseCase {
  pub fn new(invoice_service: Arc<InvoiceService>) -> Self {
    Self { invoice_service }
  }

  /// Removes the invoice together with its line items.
  pub async fn execute(
    &self,
    command: DeleteInvoiceCommand,
  ) -> Result<DeleteInvoiceResponse, InvoiceError> {
    let invoice = self
      .invoice_service
      .get_organization_invoice(command.organization_id, command.invoice_id)
      .await?;

    self.invoice_service.delete_invoice(invoice.id).await?;

    Ok(DeleteInvoiceResponse {
      invoice_id: invoice.id,
      invoice_number: invoice.invoice_number.into_inner(),
      deleted: true,
    })
  }
}
