use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use super::create_invoice::{LineItemInput, parse_percentage};
use super::get_invoice_details::InvoiceDetailsResponse;
use crate::domain::invoice::{
  InvoiceError, InvoiceNumber, InvoiceService, InvoiceStatus, InvoiceUpdateData, value_objects,
};

/// Distinguishes an absent field (`None`) from an explicit `null`
/// (`Some(None)`). Use together with `#[serde(default)]`.
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
  D: Deserializer<'de>,
  T: Deserialize<'de>,
{
  Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateInvoiceCommand {
  pub organization_id: Uuid,
  pub invoice_id: Uuid,
  #[validate(length(min = 1, max = 50))]
  pub invoice_number: Option<String>,
  pub customer_id: Option<Uuid>,
  pub invoice_date: Option<NaiveDate>,
  #[serde(default, deserialize_with = "nullable")]
  pub due_date: Option<Option<NaiveDate>>,
  #[serde(default, deserialize_with = "nullable")]
  pub tax_percentage: Option<Option<Decimal>>,
  #[serde(default, deserialize_with = "nullable")]
  pub discount_percentage: Option<Option<Decimal>>,
  #[serde(default, deserialize_with = "nullable")]
  pub comments: Option<Option<String>>,
  #[serde(default, deserialize_with = "nullable")]
  pub container_number: Option<Option<String>>,
  #[serde(default, deserialize_with = "nullable")]
  pub seal_number: Option<Option<String>>,
  #[serde(default, deserialize_with = "nullable")]
  pub hs_code: Option<Option<String>>,
  #[serde(default, deserialize_with = "nullable")]
  pub bl_number: Option<Option<String>>,
  /// Replaces the whole collection when present, even if empty.
  #[validate(nested)]
  pub line_items: Option<Vec<LineItemInput>>,
  pub status: Option<String>,
  pub amount_paid: Option<Decimal>,
}

pub struct UpdateInvoiceUseCase {
  invoice_service: Arc<InvoiceService>,
}

impl UpdateInvoiceUseCase {
  pub fn new(invoice_service: Arc<InvoiceService>) -> Self {
    Self { invoice_service }
  }

  pub async fn execute(
    &self,
    command: UpdateInvoiceCommand,
  ) -> Result<InvoiceDetailsResponse, InvoiceError> {
    command.validate()?;
    let amount_paid = command
      .amount_paid
      .map(|amount| value_objects::money_amount("amount_paid", amount))
      .transpose()?;

    let existing = self
      .invoice_service
      .get_organization_invoice(command.organization_id, command.invoice_id)
      .await?;

    let line_items = command
      .line_items
      .map(|items| {
        items
          .into_iter()
          .map(|item| item.into_details(&existing.currency))
          .collect::<Result<Vec<_>, InvoiceError>>()
      })
      .transpose()?;

    let update_data = InvoiceUpdateData {
      invoice_number: command.invoice_number.map(InvoiceNumber::new).transpose()?,
      customer_id: command.customer_id,
      invoice_date: command.invoice_date,
      due_date: command.due_date,
      tax_percentage: command.tax_percentage.map(parse_percentage).transpose()?,
      discount_percentage: command
        .discount_percentage
        .map(parse_percentage)
        .transpose()?,
      comments: command.comments,
      container_number: command.container_number,
      seal_number: command.seal_number,
      hs_code: command.hs_code,
      bl_number: command.bl_number,
      line_items,
      status: command
        .status
        .as_deref()
        .map(InvoiceStatus::from_str)
        .transpose()?,
      amount_paid,
    };

    let invoice = self
      .invoice_service
      .update_invoice(existing.id, update_data)
      .await?;
    Ok(InvoiceDetailsResponse::from(&invoice))
  }
}
