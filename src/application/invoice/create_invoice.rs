use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use super::get_invoice_details::InvoiceDetailsResponse;
use crate::domain::invoice::{
  CurrencyCode, DEFAULT_UNIT_LABEL, InvoiceData, InvoiceError, InvoiceNumber, InvoiceService,
  InvoiceStatus, InvoiceType, LineItemDescription, LineItemDetails, Percentage, ShippingDetails,
  UnitBasis, value_objects,
};

/// Client-supplied line item. `line_total` is never accepted from the
/// client; it is always derived.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LineItemInput {
  #[validate(length(min = 1, max = 2000))]
  pub description: String,
  pub quantity_units: Option<Decimal>,
  pub quantity_cartons: Option<Decimal>,
  pub unit_basis: Option<String>,
  #[validate(length(max = 50))]
  pub unit_label: Option<String>,
  pub price: Decimal,
  /// Defaults to the invoice currency; anything else is rejected.
  pub currency: Option<String>,
  pub net_weight_kg: Option<Decimal>,
  pub gross_weight_kg: Option<Decimal>,
  pub volume_cbm: Option<Decimal>,
  pub comments: Option<String>,
  pub catalog_item_id: Option<Uuid>,
}

impl LineItemInput {
  pub fn into_details(self, invoice_currency: &CurrencyCode) -> Result<LineItemDetails, InvoiceError> {
    let currency = parse_line_currency(self.currency.as_deref(), invoice_currency)?;
    let unit_basis = match self.unit_basis {
      Some(basis) => UnitBasis::from_str(&basis)?,
      None => UnitBasis::default(),
    };

    Ok(LineItemDetails {
      description: LineItemDescription::new(self.description)?,
      quantity_units: value_objects::non_negative("quantity_units", self.quantity_units)?,
      quantity_cartons: value_objects::non_negative("quantity_cartons", self.quantity_cartons)?,
      unit_basis,
      unit_label: self
        .unit_label
        .filter(|label| !label.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_UNIT_LABEL.to_string()),
      price: value_objects::positive_price(self.price)?,
      currency,
      net_weight_kg: value_objects::non_negative("net_weight_kg", self.net_weight_kg)?,
      gross_weight_kg: value_objects::non_negative("gross_weight_kg", self.gross_weight_kg)?,
      volume_cbm: value_objects::non_negative("volume_cbm", self.volume_cbm)?,
      comments: self.comments,
      catalog_item_id: self.catalog_item_id,
    })
  }
}

pub(crate) fn parse_line_currency(
  requested: Option<&str>,
  invoice_currency: &CurrencyCode,
) -> Result<CurrencyCode, InvoiceError> {
  let Some(code) = requested else {
    return Ok(invoice_currency.clone());
  };
  let currency = CurrencyCode::new(code)?;
  if &currency != invoice_currency {
    return Err(InvoiceError::InvalidInput(format!(
      "Line item currency {} does not match invoice currency {}",
      currency, invoice_currency
    )));
  }
  Ok(currency)
}

pub(crate) fn parse_percentage(value: Option<Decimal>) -> Result<Option<Percentage>, InvoiceError> {
  Ok(value.map(Percentage::new).transpose()?)
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateInvoiceCommand {
  pub organization_id: Uuid,
  pub customer_id: Uuid,
  #[validate(length(min = 1, max = 50))]
  pub invoice_number: String,
  pub invoice_type: String,
  pub status: Option<String>,
  #[validate(length(equal = 3))]
  pub currency: String,
  pub invoice_date: Option<NaiveDate>,
  pub due_date: Option<NaiveDate>,
  pub tax_percentage: Option<Decimal>,
  pub discount_percentage: Option<Decimal>,
  pub comments: Option<String>,
  pub container_number: Option<String>,
  pub seal_number: Option<String>,
  pub hs_code: Option<String>,
  pub bl_number: Option<String>,
  #[serde(default)]
  #[validate(nested)]
  pub line_items: Vec<LineItemInput>,
}

pub struct CreateInvoiceUseCase {
  invoice_service: Arc<InvoiceService>,
}

impl CreateInvoiceUseCase {
  pub fn new(invoice_service: Arc<InvoiceService>) -> Self {
    Self { invoice_service }
  }

  pub async fn execute(
    &self,
    command: CreateInvoiceCommand,
  ) -> Result<InvoiceDetailsResponse, InvoiceError> {
    command.validate()?;

    let currency = CurrencyCode::new(&command.currency)?;
    let invoice_type = InvoiceType::from_str(&command.invoice_type)?;
    let status = match command.status {
      Some(status) => InvoiceStatus::from_str(&status)?,
      None => InvoiceStatus::Draft,
    };

    let line_items = command
      .line_items
      .into_iter()
      .map(|item| item.into_details(&currency))
      .collect::<Result<Vec<_>, InvoiceError>>()?;

    let invoice_data = InvoiceData {
      organization_id: command.organization_id,
      customer_id: command.customer_id,
      invoice_number: InvoiceNumber::new(command.invoice_number)?,
      invoice_type,
      status,
      currency,
      invoice_date: command.invoice_date,
      due_date: command.due_date,
      tax_percentage: parse_percentage(command.tax_percentage)?,
      discount_percentage: parse_percentage(command.discount_percentage)?,
      comments: command.comments,
      shipping: ShippingDetails {
        container_number: command.container_number,
        seal_number: command.seal_number,
        hs_code: command.hs_code,
        bl_number: command.bl_number,
      },
      source_invoice_id: None,
      line_items,
    };

    let invoice = self.invoice_service.create_invoice(invoice_data).await?;
    Ok(InvoiceDetailsResponse::from(&invoice))
  }
}
