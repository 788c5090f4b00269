use rust_decimal_macros::dec;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::invoice::{
  CurrencyCode, DEFAULT_UNIT_LABEL, DocumentNumbering, Invoice, InvoiceData, InvoiceNumber,
  InvoiceService, InvoiceStatus, InvoiceType, LineItemDescription, LineItemDetails,
  ShippingDetails, UnitBasis,
};
use crate::infrastructure::clock::FixedClock;
use crate::infrastructure::persistence::memory::InMemoryInvoiceRepository;

pub fn service() -> Arc<InvoiceService> {
  Arc::new(InvoiceService::new(
    Arc::new(InMemoryInvoiceRepository::new()),
    Arc::new(FixedClock::at_date(2026, 10, 19)),
    DocumentNumbering::default(),
  ))
}

pub fn widget() -> LineItemDetails {
  LineItemDetails {
    description: LineItemDescription::new("Widget".to_string()).unwrap(),
    quantity_units: Some(dec!(10)),
    quantity_cartons: Some(dec!(1)),
    unit_basis: UnitBasis::Unit,
    unit_label: DEFAULT_UNIT_LABEL.to_string(),
    price: dec!(9.99),
    currency: CurrencyCode::new("USD").unwrap(),
    net_weight_kg: Some(dec!(5)),
    gross_weight_kg: None,
    volume_cbm: None,
    comments: None,
    catalog_item_id: None,
  }
}

/// Stores a single-line invoice (10 x 9.99 USD) for a fresh organization.
pub async fn seed_invoice(
  service: &InvoiceService,
  number: &str,
  invoice_type: InvoiceType,
) -> Invoice {
  seed_invoice_with_status(service, number, invoice_type, InvoiceStatus::Draft).await
}

pub async fn seed_invoice_with_status(
  service: &InvoiceService,
  number: &str,
  invoice_type: InvoiceType,
  status: InvoiceStatus,
) -> Invoice {
  service
    .create_invoice(InvoiceData {
      organization_id: Uuid::new_v4(),
      customer_id: Uuid::new_v4(),
      invoice_number: InvoiceNumber::new(number.to_string()).unwrap(),
      invoice_type,
      status,
      currency: CurrencyCode::new("USD").unwrap(),
      invoice_date: None,
      due_date: None,
      tax_percentage: None,
      discount_percentage: None,
      comments: None,
      shipping: ShippingDetails::default(),
      source_invoice_id: None,
      line_items: vec![widget()],
    })
    .await
    .unwrap()
}
