use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::invoice::{
  Invoice, InvoiceError, InvoiceService, InvoiceStatus, InvoiceType, LineItem, ShippingDetails,
  UnitBasis,
};

#[derive(Debug, Deserialize)]
pub struct GetInvoiceDetailsCommand {
  pub organization_id: Uuid,
  pub invoice_id: Uuid,
}

#[derive(Debug, Clone, Serialize)]
pub struct LineItemDto {
  pub id: Uuid,
  pub line_order: i32,
  pub description: String,
  pub quantity_units: Option<Decimal>,
  pub quantity_cartons: Option<Decimal>,
  pub unit_basis: UnitBasis,
  pub unit_label: String,
  pub price: Decimal,
  pub currency: String,
  pub line_total: Decimal,
  pub net_weight_kg: Option<Decimal>,
  pub gross_weight_kg: Option<Decimal>,
  pub volume_cbm: Option<Decimal>,
  pub comments: Option<String>,
  pub catalog_item_id: Option<Uuid>,
}

impl From<&LineItem> for LineItemDto {
  fn from(item: &LineItem) -> Self {
    let details = &item.details;
    Self {
      id: item.id,
      line_order: item.line_order,
      description: details.description.value().to_string(),
      quantity_units: details.quantity_units,
      quantity_cartons: details.quantity_cartons,
      unit_basis: details.unit_basis,
      unit_label: details.unit_label.clone(),
      price: details.price,
      currency: details.currency.as_str().to_string(),
      line_total: item.line_total,
      net_weight_kg: details.net_weight_kg,
      gross_weight_kg: details.gross_weight_kg,
      volume_cbm: details.volume_cbm,
      comments: details.comments.clone(),
      catalog_item_id: details.catalog_item_id,
    }
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct InvoiceTotalsDto {
  pub subtotal: Decimal,
  pub tax_percentage: Option<Decimal>,
  pub tax_amount: Decimal,
  pub discount_percentage: Option<Decimal>,
  pub discount_amount: Decimal,
  pub total: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct InvoiceDetailsResponse {
  pub id: Uuid,
  pub organization_id: Uuid,
  pub customer_id: Uuid,
  pub invoice_number: String,
  pub invoice_type: InvoiceType,
  pub status: InvoiceStatus,
  pub currency: String,
  pub invoice_date: NaiveDate,
  pub due_date: Option<NaiveDate>,
  pub comments: Option<String>,
  #[serde(flatten)]
  pub shipping: ShippingDetails,
  pub source_invoice_id: Option<Uuid>,
  pub line_items: Vec<LineItemDto>,
  pub totals: InvoiceTotalsDto,
  pub amount_paid: Decimal,
  pub balance_due: Decimal,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl From<&Invoice> for InvoiceDetailsResponse {
  fn from(invoice: &Invoice) -> Self {
    Self {
      id: invoice.id,
      organization_id: invoice.organization_id,
      customer_id: invoice.customer_id,
      invoice_number: invoice.invoice_number.to_string(),
      invoice_type: invoice.invoice_type,
      status: invoice.status,
      currency: invoice.currency.as_str().to_string(),
      invoice_date: invoice.invoice_date,
      due_date: invoice.due_date,
      comments: invoice.comments.clone(),
      shipping: invoice.shipping.clone(),
      source_invoice_id: invoice.source_invoice_id,
      line_items: invoice.line_items.iter().map(LineItemDto::from).collect(),
      totals: InvoiceTotalsDto {
        subtotal: invoice.subtotal_amount,
        tax_percentage: invoice.tax_percentage.map(|rate| rate.value()),
        tax_amount: invoice.tax_amount,
        discount_percentage: invoice.discount_percentage.map(|rate| rate.value()),
        discount_amount: invoice.discount_amount,
        total: invoice.total_amount,
      },
      amount_paid: invoice.amount_paid,
      balance_due: invoice.balance_due(),
      created_at: invoice.created_at,
      updated_at: invoice.updated_at,
    }
  }
}

pub struct GetInvoiceDetailsUseCase {
  invoice_service: Arc<InvoiceService>,
}

impl GetInvoiceDetailsUseCase {
  pub fn new(invoice_service: Arc<InvoiceService>) -> Self {
    Self { invoice_service }
  }

  pub async fn execute(
    &self,
    command: GetInvoiceDetailsCommand,
  ) -> Result<InvoiceDetailsResponse, InvoiceError> {
    let invoice = self
      .invoice_service
      .get_organization_invoice(command.organization_id, command.invoice_id)
      .await?;

    Ok(InvoiceDetailsResponse::from(&invoice))
  }
}
