use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use super::create_invoice::LineItemInput;
use super::get_invoice_details::{InvoiceDetailsResponse, LineItemDto};
use crate::domain::invoice::{Invoice, InvoiceError, InvoiceService, LineItem};

#[derive(Debug, Deserialize, Validate)]
pub struct AddLineItemCommand {
  pub organization_id: Uuid,
  pub invoice_id: Uuid,
  #[validate(nested)]
  pub line_item: LineItemInput,
}

/// The touched line item plus the recomputed invoice it belongs to.
#[derive(Debug, Serialize)]
pub struct LineItemResponse {
  pub line_item: LineItemDto,
  pub invoice: InvoiceDetailsResponse,
}

impl LineItemResponse {
  pub(crate) fn new(invoice: &Invoice, line_item: &LineItem) -> Self {
    Self {
      line_item: LineItemDto::from(line_item),
      invoice: InvoiceDetailsResponse::from(invoice),
    }
  }
}

pub struct AddLineItemUseCase {
  invoice_service: Arc<InvoiceService>,
}

impl AddLineItemUseCase {
  pub fn new(invoice_service: Arc<InvoiceService>) -> Self {
    Self { invoice_service }
  }

  pub async fn execute(
    &self,
    command: AddLineItemCommand,
  ) -> Result<LineItemResponse, InvoiceError> {
    command.validate()?;

    let invoice = self
      .invoice_service
      .get_organization_invoice(command.organization_id, command.invoice_id)
      .await?;
    let details = command.line_item.into_details(&invoice.currency)?;

    let (invoice, line_item) = self
      .invoice_service
      .add_line_item(invoice.id, details)
      .await?;
    Ok(LineItemResponse::new(&invoice, &line_item))
  }
}
