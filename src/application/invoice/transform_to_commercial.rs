use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use super::get_invoice_details::InvoiceDetailsResponse;
use crate::domain::invoice::{InvoiceError, InvoiceNumber, InvoiceService};

#[derive(Debug, Deserialize, Validate)]
pub struct TransformToCommercialCommand {
  pub organization_id: Uuid,
  #[serde(alias = "pro_forma_invoice_id")]
  pub pro_forma_id: Uuid,
  /// Falls back to the configured suffix appended to the Pro Forma number.
  #[validate(length(min = 1, max = 50))]
  pub new_invoice_number: Option<String>,
}

pub struct TransformToCommercialUseCase {
  invoice_service: Arc<InvoiceService>,
}

impl TransformToCommercialUseCase {
  pub fn new(invoice_service: Arc<InvoiceService>) -> Self {
    Self { invoice_service }
  }

  pub async fn execute(
    &self,
    command: TransformToCommercialCommand,
  ) -> Result<InvoiceDetailsResponse, InvoiceError> {
    command.validate()?;
    let new_number = command
      .new_invoice_number
      .map(InvoiceNumber::new)
      .transpose()?;

    let pro_forma = self
      .invoice_service
      .get_organization_invoice(command.organization_id, command.pro_forma_id)
      .await?;

    let commercial = self
      .invoice_service
      .transform_pro_forma_to_commercial(pro_forma.id, new_number)
      .await?;
    Ok(InvoiceDetailsResponse::from(&commercial))
  }
}
