use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use super::add_line_item::LineItemResponse;
use super::create_invoice::parse_line_currency;
use super::update_invoice::nullable;
use crate::domain::invoice::{
  InvoiceError, InvoiceService, LineItemDescription, LineItemPatch, UnitBasis, value_objects,
};

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateLineItemCommand {
  pub organization_id: Uuid,
  pub invoice_id: Uuid,
  pub line_item_id: Uuid,
  #[validate(length(min = 1, max = 2000))]
  pub description: Option<String>,
  #[serde(default, deserialize_with = "nullable")]
  pub quantity_units: Option<Option<Decimal>>,
  #[serde(default, deserialize_with = "nullable")]
  pub quantity_cartons: Option<Option<Decimal>>,
  pub unit_basis: Option<String>,
  #[validate(length(min = 1, max = 50))]
  pub unit_label: Option<String>,
  pub price: Option<Decimal>,
  pub currency: Option<String>,
  #[serde(default, deserialize_with = "nullable")]
  pub net_weight_kg: Option<Option<Decimal>>,
  #[serde(default, deserialize_with = "nullable")]
  pub gross_weight_kg: Option<Option<Decimal>>,
  #[serde(default, deserialize_with = "nullable")]
  pub volume_cbm: Option<Option<Decimal>>,
  #[serde(default, deserialize_with = "nullable")]
  pub comments: Option<Option<String>>,
  #[serde(default, deserialize_with = "nullable")]
  pub catalog_item_id: Option<Option<Uuid>>,
}

fn non_negative_patch(
  field: &str,
  value: Option<Option<Decimal>>,
) -> Result<Option<Option<Decimal>>, InvoiceError> {
  Ok(
    value
      .map(|inner| value_objects::non_negative(field, inner))
      .transpose()?,
  )
}

pub struct UpdateLineItemUseCase {
  invoice_service: Arc<InvoiceService>,
}

impl UpdateLineItemUseCase {
  pub fn new(invoice_service: Arc<InvoiceService>) -> Self {
    Self { invoice_service }
  }

  pub async fn execute(
    &self,
    command: UpdateLineItemCommand,
  ) -> Result<LineItemResponse, InvoiceError> {
    command.validate()?;

    let invoice = self
      .invoice_service
      .get_organization_invoice(command.organization_id, command.invoice_id)
      .await?;

    let patch = LineItemPatch {
      description: command
        .description
        .map(LineItemDescription::new)
        .transpose()?,
      quantity_units: non_negative_patch("quantity_units", command.quantity_units)?,
      quantity_cartons: non_negative_patch("quantity_cartons", command.quantity_cartons)?,
      unit_basis: command
        .unit_basis
        .as_deref()
        .map(UnitBasis::from_str)
        .transpose()?,
      unit_label: command.unit_label,
      price: command
        .price
        .map(value_objects::positive_price)
        .transpose()?,
      currency: command
        .currency
        .as_deref()
        .map(|code| parse_line_currency(Some(code), &invoice.currency))
        .transpose()?,
      net_weight_kg: non_negative_patch("net_weight_kg", command.net_weight_kg)?,
      gross_weight_kg: non_negative_patch("gross_weight_kg", command.gross_weight_kg)?,
      volume_cbm: non_negative_patch("volume_cbm", command.volume_cbm)?,
      comments: command.comments,
      catalog_item_id: command.catalog_item_id,
    };

    let (invoice, line_item) = self
      .invoice_service
      .update_line_item(invoice.id, command.line_item_id, patch)
      .await?;
    Ok(LineItemResponse::new(&invoice, &line_item))
  }
}
