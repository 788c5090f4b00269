use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::value_objects::{
  CurrencyCode, InvoiceNumber, InvoiceStatus, InvoiceType, LineItemDescription, Percentage,
  UnitBasis, round_money,
};

pub const DEFAULT_UNIT_LABEL: &str = "pieces";

/// Client-supplied content of a line item. Everything except `line_total`,
/// which is always derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItemDetails {
  pub description: LineItemDescription,
  pub quantity_units: Option<Decimal>,
  pub quantity_cartons: Option<Decimal>,
  pub unit_basis: UnitBasis,
  pub unit_label: String,
  pub price: Decimal,
  pub currency: CurrencyCode,
  pub net_weight_kg: Option<Decimal>,
  pub gross_weight_kg: Option<Decimal>,
  pub volume_cbm: Option<Decimal>,
  pub comments: Option<String>,
  pub catalog_item_id: Option<Uuid>,
}

impl LineItemDetails {
  /// Quantity the price applies to. The field named by `unit_basis` wins,
  /// the other one is a fallback, and no quantity at all counts as zero.
  pub fn effective_quantity(&self) -> Decimal {
    let (preferred, fallback) = match self.unit_basis {
      UnitBasis::Carton => (self.quantity_cartons, self.quantity_units),
      UnitBasis::Unit => (self.quantity_units, self.quantity_cartons),
    };
    preferred.or(fallback).unwrap_or(Decimal::ZERO)
  }

  pub fn line_total(&self) -> Decimal {
    round_money(self.price * self.effective_quantity())
  }
}

// Invoice Line Item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
  pub id: Uuid,
  pub invoice_id: Uuid,
  pub line_order: i32,
  #[serde(flatten)]
  pub details: LineItemDetails,
  pub line_total: Decimal,
}

impl LineItem {
  pub fn new(invoice_id: Uuid, details: LineItemDetails, line_order: i32) -> Self {
    let line_total = details.line_total();
    Self {
      id: Uuid::new_v4(),
      invoice_id,
      line_order,
      details,
      line_total,
    }
  }

  /// Recomputes `line_total` from the current details. Stored totals are
  /// never trusted.
  pub fn revalue(&mut self) {
    self.line_total = self.details.line_total();
  }
}

/// Partial update of a single line item. `None` leaves a field untouched;
/// `Some(None)` clears a nullable one.
#[derive(Debug, Clone, Default)]
pub struct LineItemPatch {
  pub description: Option<LineItemDescription>,
  pub quantity_units: Option<Option<Decimal>>,
  pub quantity_cartons: Option<Option<Decimal>>,
  pub unit_basis: Option<UnitBasis>,
  pub unit_label: Option<String>,
  pub price: Option<Decimal>,
  pub currency: Option<CurrencyCode>,
  pub net_weight_kg: Option<Option<Decimal>>,
  pub gross_weight_kg: Option<Option<Decimal>>,
  pub volume_cbm: Option<Option<Decimal>>,
  pub comments: Option<Option<String>>,
  pub catalog_item_id: Option<Option<Uuid>>,
}

impl LineItemPatch {
  pub fn apply_to(self, details: &mut LineItemDetails) {
    if let Some(description) = self.description {
      details.description = description;
    }
    if let Some(quantity_units) = self.quantity_units {
      details.quantity_units = quantity_units;
    }
    if let Some(quantity_cartons) = self.quantity_cartons {
      details.quantity_cartons = quantity_cartons;
    }
    if let Some(unit_basis) = self.unit_basis {
      details.unit_basis = unit_basis;
    }
    if let Some(unit_label) = self.unit_label {
      details.unit_label = unit_label;
    }
    if let Some(price) = self.price {
      details.price = price;
    }
    if let Some(currency) = self.currency {
      details.currency = currency;
    }
    if let Some(net_weight_kg) = self.net_weight_kg {
      details.net_weight_kg = net_weight_kg;
    }
    if let Some(gross_weight_kg) = self.gross_weight_kg {
      details.gross_weight_kg = gross_weight_kg;
    }
    if let Some(volume_cbm) = self.volume_cbm {
      details.volume_cbm = volume_cbm;
    }
    if let Some(comments) = self.comments {
      details.comments = comments;
    }
    if let Some(catalog_item_id) = self.catalog_item_id {
      details.catalog_item_id = catalog_item_id;
    }
  }
}

// Shipping metadata printed on commercial documents and packing lists
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingDetails {
  pub container_number: Option<String>,
  pub seal_number: Option<String>,
  pub hs_code: Option<String>,
  pub bl_number: Option<String>,
}

// Invoice Totals - derived from line items and the invoice percentages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceTotals {
  pub subtotal: Decimal,
  pub tax_amount: Decimal,
  pub discount_amount: Decimal,
  pub total: Decimal,
}

impl InvoiceTotals {
  /// Full recomputation over the given line items. Line totals are derived
  /// here again rather than read from stored values.
  pub fn calculate<'a, I>(
    line_items: I,
    tax_percentage: Option<Percentage>,
    discount_percentage: Option<Percentage>,
  ) -> Self
  where
    I: IntoIterator<Item = &'a LineItemDetails>,
  {
    let subtotal = round_money(
      line_items
        .into_iter()
        .map(LineItemDetails::line_total)
        .sum::<Decimal>(),
    );

    let tax_amount = tax_percentage
      .map(|rate| rate.portion_of(subtotal))
      .unwrap_or(Decimal::ZERO);

    // A discount can never take the invoice below zero.
    let discount_amount = discount_percentage
      .map(|rate| rate.portion_of(subtotal))
      .unwrap_or(Decimal::ZERO)
      .min(subtotal);

    let total = round_money(subtotal + tax_amount - discount_amount);

    Self {
      subtotal,
      tax_amount,
      discount_amount,
      total,
    }
  }

  pub fn zero() -> Self {
    Self {
      subtotal: Decimal::ZERO,
      tax_amount: Decimal::ZERO,
      discount_amount: Decimal::ZERO,
      total: Decimal::ZERO,
    }
  }
}

// Invoice - aggregate root owning its line items
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
  pub id: Uuid,
  pub organization_id: Uuid,
  pub customer_id: Uuid,
  pub invoice_number: InvoiceNumber,
  pub invoice_type: InvoiceType,
  pub status: InvoiceStatus,
  pub currency: CurrencyCode,
  pub invoice_date: NaiveDate,
  pub due_date: Option<NaiveDate>,
  pub tax_percentage: Option<Percentage>,
  pub discount_percentage: Option<Percentage>,
  pub subtotal_amount: Decimal,
  pub tax_amount: Decimal,
  pub discount_amount: Decimal,
  pub total_amount: Decimal,
  pub amount_paid: Decimal,
  pub comments: Option<String>,
  pub shipping: ShippingDetails,
  pub source_invoice_id: Option<Uuid>,
  pub line_items: Vec<LineItem>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Invoice {
  pub fn new(
    organization_id: Uuid,
    customer_id: Uuid,
    invoice_number: InvoiceNumber,
    invoice_type: InvoiceType,
    currency: CurrencyCode,
    invoice_date: NaiveDate,
    now: DateTime<Utc>,
  ) -> Self {
    Self {
      id: Uuid::new_v4(),
      organization_id,
      customer_id,
      invoice_number,
      invoice_type,
      status: InvoiceStatus::Draft,
      currency,
      invoice_date,
      due_date: None,
      tax_percentage: None,
      discount_percentage: None,
      subtotal_amount: Decimal::ZERO,
      tax_amount: Decimal::ZERO,
      discount_amount: Decimal::ZERO,
      total_amount: Decimal::ZERO,
      amount_paid: Decimal::ZERO,
      comments: None,
      shipping: ShippingDetails::default(),
      source_invoice_id: None,
      line_items: Vec::new(),
      created_at: now,
      updated_at: now,
    }
  }

  /// Discards the current collection and builds a fresh one, in order.
  pub fn replace_line_items(&mut self, line_items: Vec<LineItemDetails>) {
    let invoice_id = self.id;
    self.line_items = line_items
      .into_iter()
      .enumerate()
      .map(|(i, details)| LineItem::new(invoice_id, details, (i + 1) as i32))
      .collect();
  }

  pub fn add_line_item(&mut self, details: LineItemDetails) -> &LineItem {
    let next_order = self
      .line_items
      .iter()
      .map(|item| item.line_order)
      .max()
      .unwrap_or(0)
      + 1;
    let item = LineItem::new(self.id, details, next_order);
    self.line_items.push(item);
    &self.line_items[self.line_items.len() - 1]
  }

  pub fn line_item_mut(&mut self, line_item_id: Uuid) -> Option<&mut LineItem> {
    self
      .line_items
      .iter_mut()
      .find(|item| item.id == line_item_id)
  }

  pub fn remove_line_item(&mut self, line_item_id: Uuid) -> Option<LineItem> {
    let position = self
      .line_items
      .iter()
      .position(|item| item.id == line_item_id)?;
    Some(self.line_items.remove(position))
  }

  pub fn totals(&self) -> InvoiceTotals {
    InvoiceTotals {
      subtotal: self.subtotal_amount,
      tax_amount: self.tax_amount,
      discount_amount: self.discount_amount,
      total: self.total_amount,
    }
  }

  /// Re-values every line item and recomputes the invoice totals from
  /// scratch. Never patched incrementally.
  pub fn recalculate(&mut self) {
    for item in &mut self.line_items {
      item.revalue();
    }
    let totals = InvoiceTotals::calculate(
      self.line_items.iter().map(|item| &item.details),
      self.tax_percentage,
      self.discount_percentage,
    );
    self.subtotal_amount = totals.subtotal;
    self.tax_amount = totals.tax_amount;
    self.discount_amount = totals.discount_amount;
    self.total_amount = totals.total;
  }

  pub fn balance_due(&self) -> Decimal {
    (self.total_amount - self.amount_paid).max(Decimal::ZERO)
  }

  pub fn is_overdue(&self, current_date: NaiveDate) -> bool {
    matches!(
      self.status,
      InvoiceStatus::Unpaid | InvoiceStatus::PartiallyPaid
    ) && self.due_date.is_some_and(|due| due < current_date)
  }

  pub fn touch(&mut self, now: DateTime<Utc>) {
    self.updated_at = now;
  }
}
