use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use super::get_invoice_details::InvoiceDetailsResponse;
use crate::domain::invoice::{InvoiceError, InvoiceNumber, InvoiceService};

#[derive(Debug, Deserialize, Validate)]
pub struct GeneratePackingListCommand {
  pub organization_id: Uuid,
  pub commercial_invoice_id: Uuid,
  #[serde(alias = "new_packing_list_number")]
  #[validate(length(min = 1, max = 50))]
  pub new_invoice_number: Option<String>,
}

pub struct GeneratePackingListUseCase {
  invoice_service: Arc<InvoiceService>,
}

impl GeneratePackingListUseCase {
  pub fn new(invoice_service: Arc<InvoiceService>) -> Self {
    Self { invoice_service }
  }

  pub async fn execute(
    &self,
    command: GeneratePackingListCommand,
  ) -> Result<InvoiceDetailsResponse, InvoiceError> {
    command.validate()?;
    let new_number = command
      .new_invoice_number
      .map(InvoiceNumber::new)
      .transpose()?;

    let commercial = self
      .invoice_service
      .get_organization_invoice(command.organization_id, command.commercial_invoice_id)
      .await?;

    let packing_list = self
      .invoice_service
      .generate_packing_list_from_commercial(commercial.id, new_number)
      .await?;
    Ok(InvoiceDetailsResponse::from(&packing_list))
  }
}
