use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use super::get_invoice_details::InvoiceDetailsResponse;
use crate::domain::invoice::{InvoiceError, InvoiceService};

#[derive(Debug, Deserialize)]
pub struct DeleteLineItemCommand {
  pub organization_id: Uuid,
  pub invoice_id: Uuid,
  pub line_item_id: Uuid,
}

pub struct DeleteLineItemUseCase {
  invoice_service: Arc<InvoiceService>,
}

impl DeleteLineItemUseCase {
  pub fn new(invoice_service: Arc<InvoiceService>) -> Self {
    Self { invoice_service }
  }

  pub async fn execute(
    &self,
    command: DeleteLineItemCommand,
  ) -> Result<InvoiceDetailsResponse, InvoiceError> {
    let invoice = self
      .invoice_service
      .get_organization_invoice(command.organization_id, command.invoice_id)
      .await?;

    let invoice = self
      .invoice_service
      .delete_line_item(invoice.id, command.line_item_id)
      .await?;
    Ok(InvoiceDetailsResponse::from(&invoice))
  }
}
