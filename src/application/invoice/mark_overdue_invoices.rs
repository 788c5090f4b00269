use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use super::list_invoices::InvoiceListItemDto;
use crate::domain::invoice::{InvoiceError, InvoiceService};

#[derive(Debug, Deserialize)]
pub struct MarkOverdueInvoicesCommand {
  pub organization_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct MarkOverdueInvoicesResponse {
  pub updated: Vec<InvoiceListItemDto>,
}

pub struct MarkOverdueInvoicesUseCase {
  invoice_service: Arc<InvoiceService>,
}

impl MarkOverdueInvoicesUseCase {
  pub fn new(invoice_service: Arc<InvoiceService>) -> Self {
    Self { invoice_service }
  }

  pub async fn execute(
    &self,
    command: MarkOverdueInvoicesCommand,
  ) -> Result<MarkOverdueInvoicesResponse, InvoiceError> {
    let updated = self
      .invoice_service
      .mark_overdue_invoices(command.organization_id)
      .await?;

    Ok(MarkOverdueInvoicesResponse {
      updated: updated.iter().map(InvoiceListItemDto::from).collect(),
    })
  }
}
