use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

use super::entities::{Invoice, LineItem, LineItemDetails, LineItemPatch, ShippingDetails};
use super::errors::InvoiceError;
use super::ports::{Clock, InvoiceFilter, InvoiceRepository};
use super::reconciler::{self, PaymentUpdate};
use super::transform::{self, DocumentNumbering};
use super::value_objects::{
  CurrencyCode, InvoiceNumber, InvoiceStatus, InvoiceType, MAX_MONEY, Percentage,
};

/// Invoice creation data
#[derive(Debug, Clone)]
pub struct InvoiceData {
  pub organization_id: Uuid,
  pub customer_id: Uuid,
  pub invoice_number: InvoiceNumber,
  pub invoice_type: InvoiceType,
  pub status: InvoiceStatus,
  pub currency: CurrencyCode,
  /// Defaults to the clock's current date.
  pub invoice_date: Option<NaiveDate>,
  pub due_date: Option<NaiveDate>,
  pub tax_percentage: Option<Percentage>,
  pub discount_percentage: Option<Percentage>,
  pub comments: Option<String>,
  pub shipping: ShippingDetails,
  pub source_invoice_id: Option<Uuid>,
  pub line_items: Vec<LineItemDetails>,
}

/// Invoice update data. Absent fields are left alone, `Some(None)` clears a
/// nullable field, and `line_items: Some(..)` replaces the whole collection.
#[derive(Debug, Clone, Default)]
pub struct InvoiceUpdateData {
  pub invoice_number: Option<InvoiceNumber>,
  pub customer_id: Option<Uuid>,
  pub invoice_date: Option<NaiveDate>,
  pub due_date: Option<Option<NaiveDate>>,
  pub tax_percentage: Option<Option<Percentage>>,
  pub discount_percentage: Option<Option<Percentage>>,
  pub comments: Option<Option<String>>,
  pub container_number: Option<Option<String>>,
  pub seal_number: Option<Option<String>>,
  pub hs_code: Option<Option<String>>,
  pub bl_number: Option<Option<String>>,
  pub line_items: Option<Vec<LineItemDetails>>,
  pub status: Option<InvoiceStatus>,
  pub amount_paid: Option<Decimal>,
}

impl InvoiceUpdateData {
  fn apply_header(&mut self, invoice: &mut Invoice) {
    if let Some(invoice_number) = self.invoice_number.take() {
      invoice.invoice_number = invoice_number;
    }
    if let Some(customer_id) = self.customer_id {
      invoice.customer_id = customer_id;
    }
    if let Some(invoice_date) = self.invoice_date {
      invoice.invoice_date = invoice_date;
    }
    if let Some(due_date) = self.due_date {
      invoice.due_date = due_date;
    }
    if let Some(tax_percentage) = self.tax_percentage {
      invoice.tax_percentage = tax_percentage;
    }
    if let Some(discount_percentage) = self.discount_percentage {
      invoice.discount_percentage = discount_percentage;
    }
    if let Some(comments) = self.comments.take() {
      invoice.comments = comments;
    }
    if let Some(container_number) = self.container_number.take() {
      invoice.shipping.container_number = container_number;
    }
    if let Some(seal_number) = self.seal_number.take() {
      invoice.shipping.seal_number = seal_number;
    }
    if let Some(hs_code) = self.hs_code.take() {
      invoice.shipping.hs_code = hs_code;
    }
    if let Some(bl_number) = self.bl_number.take() {
      invoice.shipping.bl_number = bl_number;
    }
  }
}

pub struct InvoiceService {
  invoice_repo: Arc<dyn InvoiceRepository>,
  clock: Arc<dyn Clock>,
  numbering: DocumentNumbering,
}

impl InvoiceService {
  pub fn new(
    invoice_repo: Arc<dyn InvoiceRepository>,
    clock: Arc<dyn Clock>,
    numbering: DocumentNumbering,
  ) -> Self {
    Self {
      invoice_repo,
      clock,
      numbering,
    }
  }

  pub async fn create_invoice(&self, data: InvoiceData) -> Result<Invoice, InvoiceError> {
    let now = self.clock.now();
    let invoice_date = data.invoice_date.unwrap_or_else(|| self.clock.today());

    let mut invoice = Invoice::new(
      data.organization_id,
      data.customer_id,
      data.invoice_number,
      data.invoice_type,
      data.currency,
      invoice_date,
      now,
    );
    invoice.due_date = data.due_date;
    invoice.tax_percentage = data.tax_percentage;
    invoice.discount_percentage = data.discount_percentage;
    invoice.comments = data.comments;
    invoice.shipping = data.shipping;
    invoice.source_invoice_id = data.source_invoice_id;
    invoice.replace_line_items(data.line_items);

    invoice.recalculate();
    ensure_storable(&invoice)?;
    // A new invoice starts from DRAFT with nothing paid; an explicit initial
    // status goes through the same rules as any other status request.
    reconciler::apply_payment_update(
      &mut invoice,
      InvoiceStatus::Draft,
      PaymentUpdate {
        status: Some(data.status),
        amount_paid: None,
      },
    );

    let created = self.invoice_repo.create(invoice).await?;
    tracing::info!(
      invoice_id = %created.id,
      invoice_number = %created.invoice_number,
      invoice_type = %created.invoice_type,
      total = %created.total_amount,
      "Created invoice"
    );
    Ok(created)
  }

  pub async fn get_invoice(&self, invoice_id: Uuid) -> Result<Invoice, InvoiceError> {
    self
      .invoice_repo
      .find_by_id(invoice_id)
      .await?
      .ok_or(InvoiceError::InvoiceNotFound(invoice_id))
  }

  /// Like `get_invoice`, but invoices of other organizations are reported
  /// as missing.
  pub async fn get_organization_invoice(
    &self,
    organization_id: Uuid,
    invoice_id: Uuid,
  ) -> Result<Invoice, InvoiceError> {
    let invoice = self.get_invoice(invoice_id).await?;
    if invoice.organization_id != organization_id {
      tracing::warn!(
        invoice_id = %invoice_id,
        organization_id = %organization_id,
        "Invoice requested by a different organization"
      );
      return Err(InvoiceError::InvoiceNotFound(invoice_id));
    }
    Ok(invoice)
  }

  pub async fn list_invoices(
    &self,
    organization_id: Uuid,
    filter: &InvoiceFilter,
  ) -> Result<Vec<Invoice>, InvoiceError> {
    self
      .invoice_repo
      .find_by_organization(organization_id, filter)
      .await
  }

  pub async fn update_invoice(
    &self,
    invoice_id: Uuid,
    mut data: InvoiceUpdateData,
  ) -> Result<Invoice, InvoiceError> {
    let mut invoice = self.get_invoice(invoice_id).await?;
    let previous_status = invoice.status;

    data.apply_header(&mut invoice);
    if let Some(line_items) = data.line_items.take() {
      invoice.replace_line_items(line_items);
    }

    invoice.recalculate();
    ensure_storable(&invoice)?;
    reconciler::apply_payment_update(
      &mut invoice,
      previous_status,
      PaymentUpdate {
        status: data.status,
        amount_paid: data.amount_paid,
      },
    );

    let updated = self.save(invoice).await?;
    tracing::info!(
      invoice_id = %updated.id,
      status = %updated.status,
      total = %updated.total_amount,
      "Updated invoice"
    );
    Ok(updated)
  }

  pub async fn delete_invoice(&self, invoice_id: Uuid) -> Result<(), InvoiceError> {
    // Existence check keeps NotFound distinct from a silent no-op.
    self.get_invoice(invoice_id).await?;
    self.invoice_repo.delete(invoice_id).await?;
    tracing::info!(invoice_id = %invoice_id, "Deleted invoice");
    Ok(())
  }

  pub async fn add_line_item(
    &self,
    invoice_id: Uuid,
    details: LineItemDetails,
  ) -> Result<(Invoice, LineItem), InvoiceError> {
    let mut invoice = self.get_invoice(invoice_id).await?;
    let line_item_id = invoice.add_line_item(details).id;

    let saved = self.recompute_and_save(invoice).await?;
    let line_item = find_line_item(&saved, line_item_id)?;
    tracing::debug!(invoice_id = %saved.id, line_item_id = %line_item.id, "Added line item");
    Ok((saved, line_item))
  }

  pub async fn update_line_item(
    &self,
    invoice_id: Uuid,
    line_item_id: Uuid,
    patch: LineItemPatch,
  ) -> Result<(Invoice, LineItem), InvoiceError> {
    let mut invoice = self.get_invoice(invoice_id).await?;
    let line_item = invoice
      .line_item_mut(line_item_id)
      .ok_or(InvoiceError::LineItemNotFound(line_item_id))?;
    patch.apply_to(&mut line_item.details);

    let saved = self.recompute_and_save(invoice).await?;
    let line_item = find_line_item(&saved, line_item_id)?;
    tracing::debug!(invoice_id = %saved.id, line_item_id = %line_item.id, "Updated line item");
    Ok((saved, line_item))
  }

  pub async fn delete_line_item(
    &self,
    invoice_id: Uuid,
    line_item_id: Uuid,
  ) -> Result<Invoice, InvoiceError> {
    let mut invoice = self.get_invoice(invoice_id).await?;
    invoice
      .remove_line_item(line_item_id)
      .ok_or(InvoiceError::LineItemNotFound(line_item_id))?;

    let saved = self.recompute_and_save(invoice).await?;
    tracing::debug!(invoice_id = %saved.id, line_item_id = %line_item_id, "Deleted line item");
    Ok(saved)
  }

  pub async fn record_payment(
    &self,
    invoice_id: Uuid,
    amount: Decimal,
  ) -> Result<Invoice, InvoiceError> {
    let mut invoice = self.get_invoice(invoice_id).await?;
    invoice.recalculate();
    reconciler::record_payment(&mut invoice, amount)?;

    let saved = self.save(invoice).await?;
    tracing::info!(
      invoice_id = %saved.id,
      amount = %amount,
      amount_paid = %saved.amount_paid,
      status = %saved.status,
      "Recorded payment"
    );
    Ok(saved)
  }

  pub async fn transform_pro_forma_to_commercial(
    &self,
    pro_forma_id: Uuid,
    new_number: Option<InvoiceNumber>,
  ) -> Result<Invoice, InvoiceError> {
    let pro_forma = self.get_invoice(pro_forma_id).await?;
    let data = transform::commercial_from_pro_forma(
      &pro_forma,
      new_number,
      &self.numbering,
      self.clock.today(),
    )?;
    let commercial = self.create_invoice(data).await?;
    tracing::info!(
      source_invoice_id = %pro_forma.id,
      invoice_id = %commercial.id,
      "Transformed Pro Forma into Commercial invoice"
    );
    Ok(commercial)
  }

  pub async fn generate_packing_list_from_commercial(
    &self,
    commercial_id: Uuid,
    new_number: Option<InvoiceNumber>,
  ) -> Result<Invoice, InvoiceError> {
    let commercial = self.get_invoice(commercial_id).await?;
    let data = transform::packing_list_from_commercial(
      &commercial,
      new_number,
      &self.numbering,
      self.clock.today(),
    )?;
    let packing_list = self.create_invoice(data).await?;
    tracing::info!(
      source_invoice_id = %commercial.id,
      invoice_id = %packing_list.id,
      "Generated Packing List from Commercial invoice"
    );
    Ok(packing_list)
  }

  /// Moves unpaid and partially paid invoices past their due date to OVERDUE.
  /// Partial payments are preserved.
  pub async fn mark_overdue_invoices(
    &self,
    organization_id: Uuid,
  ) -> Result<Vec<Invoice>, InvoiceError> {
    let current_date = self.clock.today();
    let candidates = self
      .invoice_repo
      .find_overdue(organization_id, current_date)
      .await?;

    let mut updated_invoices = Vec::new();
    for mut invoice in candidates {
      if !invoice.is_overdue(current_date) {
        continue;
      }
      let previous_status = invoice.status;
      invoice.recalculate();
      reconciler::apply_payment_update(
        &mut invoice,
        previous_status,
        PaymentUpdate {
          status: Some(InvoiceStatus::Overdue),
          amount_paid: None,
        },
      );
      updated_invoices.push(self.save(invoice).await?);
    }

    if !updated_invoices.is_empty() {
      tracing::info!(
        organization_id = %organization_id,
        count = updated_invoices.len(),
        "Marked invoices overdue"
      );
    }
    Ok(updated_invoices)
  }

  // Helper methods
  async fn recompute_and_save(&self, mut invoice: Invoice) -> Result<Invoice, InvoiceError> {
    let previous_status = invoice.status;
    invoice.recalculate();
    ensure_storable(&invoice)?;
    reconciler::apply_payment_update(&mut invoice, previous_status, PaymentUpdate::default());
    self.save(invoice).await
  }

  async fn save(&self, mut invoice: Invoice) -> Result<Invoice, InvoiceError> {
    invoice.touch(self.clock.now());
    self.invoice_repo.update(invoice).await
  }
}

/// Every computed amount has to fit the stored money columns.
fn ensure_storable(invoice: &Invoice) -> Result<(), InvoiceError> {
  let too_large = invoice
    .line_items
    .iter()
    .map(|item| item.line_total)
    .chain([
      invoice.subtotal_amount,
      invoice.tax_amount,
      invoice.total_amount,
    ])
    .any(|amount| amount > MAX_MONEY);

  if too_large {
    return Err(InvoiceError::InvalidInput(format!(
      "Invoice amounts cannot exceed {}",
      MAX_MONEY
    )));
  }
  Ok(())
}

fn find_line_item(invoice: &Invoice, line_item_id: Uuid) -> Result<LineItem, InvoiceError> {
  invoice
    .line_items
    .iter()
    .find(|item| item.id == line_item_id)
    .cloned()
    .ok_or(InvoiceError::LineItemNotFound(line_item_id))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::invoice::entities::DEFAULT_UNIT_LABEL;
  use crate::domain::invoice::value_objects::{LineItemDescription, UnitBasis};
  use crate::infrastructure::clock::FixedClock;
  use crate::infrastructure::persistence::memory::InMemoryInvoiceRepository;
  use rust_decimal_macros::dec;

  struct Fixture {
    service: InvoiceService,
    repo: Arc<InMemoryInvoiceRepository>,
    organization_id: Uuid,
    customer_id: Uuid,
  }

  fn fixture() -> Fixture {
    let repo = Arc::new(InMemoryInvoiceRepository::new());
    let clock = Arc::new(FixedClock::at_date(2026, 10, 19));
    Fixture {
      service: InvoiceService::new(repo.clone(), clock, DocumentNumbering::default()),
      repo,
      organization_id: Uuid::new_v4(),
      customer_id: Uuid::new_v4(),
    }
  }

  fn item(description: &str, price: Decimal, units: Decimal) -> LineItemDetails {
    LineItemDetails {
      description: LineItemDescription::new(description.to_string()).unwrap(),
      quantity_units: Some(units),
      quantity_cartons: None,
      unit_basis: UnitBasis::Unit,
      unit_label: DEFAULT_UNIT_LABEL.to_string(),
      price,
      currency: CurrencyCode::new("USD").unwrap(),
      net_weight_kg: None,
      gross_weight_kg: None,
      volume_cbm: None,
      comments: None,
      catalog_item_id: None,
    }
  }

  fn data(
    f: &Fixture,
    number: &str,
    invoice_type: InvoiceType,
    line_items: Vec<LineItemDetails>,
  ) -> InvoiceData {
    InvoiceData {
      organization_id: f.organization_id,
      customer_id: f.customer_id,
      invoice_number: InvoiceNumber::new(number.to_string()).unwrap(),
      invoice_type,
      status: InvoiceStatus::Draft,
      currency: CurrencyCode::new("USD").unwrap(),
      invoice_date: None,
      due_date: None,
      tax_percentage: None,
      discount_percentage: None,
      comments: None,
      shipping: ShippingDetails::default(),
      source_invoice_id: None,
      line_items,
    }
  }

  #[tokio::test]
  async fn test_create_invoice_computes_totals() {
    let f = fixture();
    let mut input = data(
      &f,
      "INV-001",
      InvoiceType::Commercial,
      vec![
        item("Bolts", dec!(40), dec!(1)),
        item("Nuts", dec!(20), dec!(3)),
      ],
    );
    input.tax_percentage = Some(Percentage::new(dec!(10)).unwrap());
    input.discount_percentage = Some(Percentage::new(dec!(50)).unwrap());

    let invoice = f.service.create_invoice(input).await.unwrap();

    assert_eq!(invoice.status, InvoiceStatus::Draft);
    assert_eq!(invoice.invoice_date, NaiveDate::from_ymd_opt(2026, 10, 19).unwrap());
    assert_eq!(invoice.subtotal_amount, dec!(100.00));
    assert_eq!(invoice.tax_amount, dec!(10.00));
    assert_eq!(invoice.discount_amount, dec!(50.00));
    assert_eq!(invoice.total_amount, dec!(60.00));
    assert_eq!(invoice.line_items.len(), 2);
    assert_eq!(invoice.line_items[1].line_total, dec!(60.00));

    let stored = f.repo.find_by_id(invoice.id).await.unwrap().unwrap();
    assert_eq!(stored, invoice);
  }

  #[tokio::test]
  async fn test_create_empty_draft() {
    let f = fixture();
    let invoice = f
      .service
      .create_invoice(data(&f, "INV-002", InvoiceType::ProForma, vec![]))
      .await
      .unwrap();
    assert_eq!(invoice.subtotal_amount, Decimal::ZERO);
    assert_eq!(invoice.total_amount, Decimal::ZERO);
  }

  #[tokio::test]
  async fn test_create_with_paid_status_settles_total() {
    let f = fixture();
    let mut input = data(
      &f,
      "INV-003",
      InvoiceType::Commercial,
      vec![item("Crate", dec!(12.50), dec!(4))],
    );
    input.status = InvoiceStatus::Paid;
    let invoice = f.service.create_invoice(input).await.unwrap();
    assert_eq!(invoice.status, InvoiceStatus::Paid);
    assert_eq!(invoice.amount_paid, dec!(50.00));
  }

  #[tokio::test]
  async fn test_update_with_unchanged_patch_keeps_totals() {
    let f = fixture();
    let mut input = data(
      &f,
      "INV-004",
      InvoiceType::Commercial,
      vec![item("Widget", dec!(9.99), dec!(7))],
    );
    input.tax_percentage = Some(Percentage::new(dec!(7.5)).unwrap());
    let created = f.service.create_invoice(input).await.unwrap();

    let updated = f
      .service
      .update_invoice(created.id, InvoiceUpdateData::default())
      .await
      .unwrap();

    assert_eq!(updated.totals(), created.totals());
    assert_eq!(updated.status, created.status);
    assert_eq!(updated.amount_paid, created.amount_paid);
  }

  #[tokio::test]
  async fn test_update_replaces_line_items_and_percentages() {
    let f = fixture();
    let created = f
      .service
      .create_invoice(data(
        &f,
        "INV-005",
        InvoiceType::Commercial,
        vec![item("Old", dec!(100), dec!(1))],
      ))
      .await
      .unwrap();
    let old_id = created.line_items[0].id;

    let updated = f
      .service
      .update_invoice(
        created.id,
        InvoiceUpdateData {
          line_items: Some(vec![item("New", dec!(10), dec!(2))]),
          tax_percentage: Some(Some(Percentage::new(dec!(20)).unwrap())),
          comments: Some(Some("Revised".to_string())),
          ..Default::default()
        },
      )
      .await
      .unwrap();

    assert_eq!(updated.line_items.len(), 1);
    assert_ne!(updated.line_items[0].id, old_id);
    assert_eq!(updated.subtotal_amount, dec!(20.00));
    assert_eq!(updated.tax_amount, dec!(4.00));
    assert_eq!(updated.total_amount, dec!(24.00));
    assert_eq!(updated.comments.as_deref(), Some("Revised"));
  }

  #[tokio::test]
  async fn test_update_with_empty_line_items_clears_collection() {
    let f = fixture();
    let created = f
      .service
      .create_invoice(data(
        &f,
        "INV-006",
        InvoiceType::Commercial,
        vec![item("Thing", dec!(5), dec!(5))],
      ))
      .await
      .unwrap();

    let updated = f
      .service
      .update_invoice(
        created.id,
        InvoiceUpdateData {
          line_items: Some(vec![]),
          ..Default::default()
        },
      )
      .await
      .unwrap();

    assert!(updated.line_items.is_empty());
    assert_eq!(updated.total_amount, Decimal::ZERO);
  }

  #[tokio::test]
  async fn test_update_amount_paid_infers_status() {
    let f = fixture();
    let mut input = data(
      &f,
      "INV-007",
      InvoiceType::Commercial,
      vec![item("Pallet", dec!(100), dec!(2))],
    );
    input.status = InvoiceStatus::Unpaid;
    let created = f.service.create_invoice(input).await.unwrap();

    let partial = f
      .service
      .update_invoice(
        created.id,
        InvoiceUpdateData {
          amount_paid: Some(dec!(50)),
          ..Default::default()
        },
      )
      .await
      .unwrap();
    assert_eq!(partial.status, InvoiceStatus::PartiallyPaid);

    let relabeled = f
      .service
      .update_invoice(
        created.id,
        InvoiceUpdateData {
          status: Some(InvoiceStatus::Overdue),
          ..Default::default()
        },
      )
      .await
      .unwrap();
    assert_eq!(relabeled.status, InvoiceStatus::Overdue);
    assert_eq!(relabeled.amount_paid, dec!(50));
  }

  #[tokio::test]
  async fn test_update_clears_nullable_header_fields() {
    let f = fixture();
    let mut input = data(&f, "INV-008", InvoiceType::Commercial, vec![]);
    input.due_date = NaiveDate::from_ymd_opt(2026, 12, 1);
    input.shipping.container_number = Some("TGHU0000001".to_string());
    let created = f.service.create_invoice(input).await.unwrap();

    let updated = f
      .service
      .update_invoice(
        created.id,
        InvoiceUpdateData {
          due_date: Some(None),
          container_number: Some(None),
          ..Default::default()
        },
      )
      .await
      .unwrap();

    assert_eq!(updated.due_date, None);
    assert_eq!(updated.shipping.container_number, None);
    assert_eq!(updated.invoice_number, created.invoice_number);
  }

  #[tokio::test]
  async fn test_line_item_operations_recompute_totals() {
    let f = fixture();
    let created = f
      .service
      .create_invoice(data(
        &f,
        "INV-009",
        InvoiceType::Commercial,
        vec![item("A", dec!(10), dec!(1))],
      ))
      .await
      .unwrap();

    let (invoice, added) = f
      .service
      .add_line_item(created.id, item("B", dec!(2.50), dec!(4)))
      .await
      .unwrap();
    assert_eq!(added.line_total, dec!(10.00));
    assert_eq!(invoice.total_amount, dec!(20.00));

    let (invoice, changed) = f
      .service
      .update_line_item(
        created.id,
        added.id,
        LineItemPatch {
          quantity_units: Some(Some(dec!(10))),
          ..Default::default()
        },
      )
      .await
      .unwrap();
    assert_eq!(changed.line_total, dec!(25.00));
    assert_eq!(invoice.total_amount, dec!(35.00));

    let invoice = f
      .service
      .delete_line_item(created.id, created.line_items[0].id)
      .await
      .unwrap();
    assert_eq!(invoice.line_items.len(), 1);
    assert_eq!(invoice.total_amount, dec!(25.00));
  }

  #[tokio::test]
  async fn test_line_item_operations_report_missing_entities() {
    let f = fixture();
    let missing_invoice = f
      .service
      .add_line_item(Uuid::new_v4(), item("A", dec!(1), dec!(1)))
      .await;
    assert!(matches!(missing_invoice, Err(InvoiceError::InvoiceNotFound(_))));

    let created = f
      .service
      .create_invoice(data(&f, "INV-010", InvoiceType::Commercial, vec![]))
      .await
      .unwrap();
    let missing_item = f
      .service
      .delete_line_item(created.id, Uuid::new_v4())
      .await;
    assert!(matches!(missing_item, Err(InvoiceError::LineItemNotFound(_))));
  }

  async fn paid_invoice(f: &Fixture, number: &str) -> Invoice {
    let mut input = data(
      f,
      number,
      InvoiceType::Commercial,
      vec![
        item("Pump", dec!(100), dec!(1)),
        item("Valve", dec!(100), dec!(1)),
      ],
    );
    input.status = InvoiceStatus::Unpaid;
    let created = f.service.create_invoice(input).await.unwrap();
    let paid = f.service.record_payment(created.id, dec!(200)).await.unwrap();
    assert_eq!(paid.status, InvoiceStatus::Paid);
    paid
  }

  #[tokio::test]
  async fn test_deleting_line_from_paid_invoice_clamps_amount_paid() {
    let f = fixture();
    let paid = paid_invoice(&f, "INV-020").await;

    let invoice = f
      .service
      .delete_line_item(paid.id, paid.line_items[0].id)
      .await
      .unwrap();

    assert_eq!(invoice.total_amount, dec!(100.00));
    assert_eq!(invoice.status, InvoiceStatus::Paid);
    assert_eq!(invoice.amount_paid, dec!(100.00));
    assert_eq!(invoice.balance_due(), Decimal::ZERO);
  }

  #[tokio::test]
  async fn test_adding_line_to_paid_invoice_reopens_balance() {
    let f = fixture();
    let paid = paid_invoice(&f, "INV-021").await;

    let (invoice, _) = f
      .service
      .add_line_item(paid.id, item("Gasket", dec!(50), dec!(1)))
      .await
      .unwrap();

    assert_eq!(invoice.total_amount, dec!(250.00));
    assert_eq!(invoice.status, InvoiceStatus::PartiallyPaid);
    assert_eq!(invoice.amount_paid, dec!(200));
    assert_eq!(invoice.balance_due(), dec!(50.00));
  }

  #[tokio::test]
  async fn test_updating_line_on_paid_invoice_keeps_status_consistent() {
    let f = fixture();
    let paid = paid_invoice(&f, "INV-022").await;
    let line_id = paid.line_items[1].id;
    let reprice = |price| LineItemPatch {
      price: Some(price),
      ..Default::default()
    };

    let (cheaper, _) = f
      .service
      .update_line_item(paid.id, line_id, reprice(dec!(40)))
      .await
      .unwrap();
    assert_eq!(cheaper.total_amount, dec!(140.00));
    assert_eq!(cheaper.status, InvoiceStatus::Paid);
    assert_eq!(cheaper.amount_paid, dec!(140.00));

    let (dearer, _) = f
      .service
      .update_line_item(paid.id, line_id, reprice(dec!(60)))
      .await
      .unwrap();
    assert_eq!(dearer.total_amount, dec!(160.00));
    assert_eq!(dearer.status, InvoiceStatus::PartiallyPaid);
    assert_eq!(dearer.amount_paid, dec!(140.00));
  }

  #[tokio::test]
  async fn test_changing_tax_on_paid_invoice_reopens_balance() {
    let f = fixture();
    let paid = paid_invoice(&f, "INV-023").await;

    let updated = f
      .service
      .update_invoice(
        paid.id,
        InvoiceUpdateData {
          tax_percentage: Some(Some(Percentage::new(dec!(10)).unwrap())),
          ..Default::default()
        },
      )
      .await
      .unwrap();

    assert_eq!(updated.total_amount, dec!(220.00));
    assert_eq!(updated.status, InvoiceStatus::PartiallyPaid);
    assert_eq!(updated.amount_paid, dec!(200));
    assert!(updated.amount_paid <= updated.total_amount);
  }

  #[tokio::test]
  async fn test_amounts_beyond_money_columns_are_rejected() {
    let f = fixture();
    let huge = data(
      &f,
      "INV-024",
      InvoiceType::Commercial,
      vec![item("Bulk ore", MAX_MONEY, dec!(10))],
    );
    let result = f.service.create_invoice(huge).await;
    assert!(matches!(result, Err(InvoiceError::InvalidInput(_))));

    let created = f
      .service
      .create_invoice(data(
        &f,
        "INV-025",
        InvoiceType::Commercial,
        vec![item("Ore sample", dec!(10), dec!(1))],
      ))
      .await
      .unwrap();
    let added = f
      .service
      .add_line_item(created.id, item("Bulk ore", MAX_MONEY, dec!(2)))
      .await;
    assert!(matches!(added, Err(InvoiceError::InvalidInput(_))));

    let stored = f.repo.find_by_id(created.id).await.unwrap().unwrap();
    assert_eq!(stored.line_items.len(), 1);
  }

  #[tokio::test]
  async fn test_record_payment_scenario() {
    let f = fixture();
    let mut input = data(
      &f,
      "INV-011",
      InvoiceType::Commercial,
      vec![item("Machine", dec!(200.00), dec!(1))],
    );
    input.status = InvoiceStatus::Unpaid;
    let created = f.service.create_invoice(input).await.unwrap();

    let first = f.service.record_payment(created.id, dec!(120.00)).await.unwrap();
    assert_eq!(first.amount_paid, dec!(120.00));
    assert_eq!(first.status, InvoiceStatus::PartiallyPaid);

    let second = f.service.record_payment(created.id, dec!(80.00)).await.unwrap();
    assert_eq!(second.amount_paid, dec!(200.00));
    assert_eq!(second.status, InvoiceStatus::Paid);

    let third = f.service.record_payment(created.id, dec!(1.00)).await;
    assert!(matches!(third, Err(InvoiceError::InvalidOperation(_))));
  }

  #[tokio::test]
  async fn test_transform_pro_forma_to_commercial() {
    let f = fixture();
    let pro_forma = f
      .service
      .create_invoice(data(
        &f,
        "PF-001",
        InvoiceType::ProForma,
        vec![item("Widget", dec!(9.99), dec!(10))],
      ))
      .await
      .unwrap();

    let commercial = f
      .service
      .transform_pro_forma_to_commercial(pro_forma.id, None)
      .await
      .unwrap();

    assert_eq!(commercial.invoice_number.value(), "PF-001-COMM");
    assert_eq!(commercial.invoice_type, InvoiceType::Commercial);
    assert_eq!(commercial.status, InvoiceStatus::Draft);
    assert_eq!(commercial.subtotal_amount, dec!(99.90));
    assert_eq!(commercial.source_invoice_id, Some(pro_forma.id));
    assert_eq!(
      commercial.line_items[0].details,
      pro_forma.line_items[0].details
    );

    let source_after = f.service.get_invoice(pro_forma.id).await.unwrap();
    assert_eq!(source_after, pro_forma);
  }

  #[tokio::test]
  async fn test_generate_packing_list() {
    let f = fixture();
    let mut widget = item("Widget", dec!(9.99), dec!(10));
    widget.net_weight_kg = Some(dec!(5));
    let mut input = data(&f, "C-007", InvoiceType::Commercial, vec![widget]);
    input.tax_percentage = Some(Percentage::new(dec!(10)).unwrap());
    let commercial = f.service.create_invoice(input).await.unwrap();

    let packing_list = f
      .service
      .generate_packing_list_from_commercial(commercial.id, None)
      .await
      .unwrap();

    assert_eq!(packing_list.invoice_number.value(), "PL-C-007");
    assert_eq!(packing_list.invoice_type, InvoiceType::PackingList);
    assert_eq!(packing_list.line_items[0].details.price, Decimal::ZERO);
    assert_eq!(packing_list.line_items[0].line_total, Decimal::ZERO);
    assert_eq!(packing_list.line_items[0].details.net_weight_kg, Some(dec!(5)));
    assert_eq!(packing_list.totals(), crate::domain::invoice::InvoiceTotals::zero());
    assert_eq!(packing_list.amount_paid, Decimal::ZERO);
  }

  #[tokio::test]
  async fn test_transform_rejects_wrong_source_type() {
    let f = fixture();
    let commercial = f
      .service
      .create_invoice(data(&f, "C-100", InvoiceType::Commercial, vec![]))
      .await
      .unwrap();

    let result = f
      .service
      .transform_pro_forma_to_commercial(commercial.id, None)
      .await;
    assert!(matches!(result, Err(InvoiceError::InvalidOperation(_))));

    let pro_forma = f
      .service
      .create_invoice(data(&f, "PF-100", InvoiceType::ProForma, vec![]))
      .await
      .unwrap();
    let result = f
      .service
      .generate_packing_list_from_commercial(pro_forma.id, None)
      .await;
    assert!(matches!(result, Err(InvoiceError::InvalidOperation(_))));
  }

  #[tokio::test]
  async fn test_mark_overdue_invoices_keeps_partial_payments() {
    let f = fixture();
    let mut input = data(
      &f,
      "INV-012",
      InvoiceType::Commercial,
      vec![item("Drum", dec!(100), dec!(1))],
    );
    input.status = InvoiceStatus::Unpaid;
    input.due_date = NaiveDate::from_ymd_opt(2026, 10, 1);
    let late = f.service.create_invoice(input).await.unwrap();
    f.service.record_payment(late.id, dec!(30)).await.unwrap();

    let mut input = data(
      &f,
      "INV-013",
      InvoiceType::Commercial,
      vec![item("Drum", dec!(100), dec!(1))],
    );
    input.status = InvoiceStatus::Unpaid;
    input.due_date = NaiveDate::from_ymd_opt(2026, 11, 1);
    let on_time = f.service.create_invoice(input).await.unwrap();

    let marked = f
      .service
      .mark_overdue_invoices(f.organization_id)
      .await
      .unwrap();

    assert_eq!(marked.len(), 1);
    assert_eq!(marked[0].id, late.id);
    assert_eq!(marked[0].status, InvoiceStatus::Overdue);
    assert_eq!(marked[0].amount_paid, dec!(30));
    let untouched = f.service.get_invoice(on_time.id).await.unwrap();
    assert_eq!(untouched.status, InvoiceStatus::Unpaid);
  }

  #[tokio::test]
  async fn test_organization_scoping() {
    let f = fixture();
    let created = f
      .service
      .create_invoice(data(&f, "INV-015", InvoiceType::ProForma, vec![]))
      .await
      .unwrap();

    let own = f
      .service
      .get_organization_invoice(f.organization_id, created.id)
      .await
      .unwrap();
    assert_eq!(own.id, created.id);

    let foreign = f
      .service
      .get_organization_invoice(Uuid::new_v4(), created.id)
      .await;
    assert!(matches!(foreign, Err(InvoiceError::InvoiceNotFound(_))));
  }

  #[tokio::test]
  async fn test_delete_invoice() {
    let f = fixture();
    let created = f
      .service
      .create_invoice(data(&f, "INV-014", InvoiceType::Commercial, vec![]))
      .await
      .unwrap();

    f.service.delete_invoice(created.id).await.unwrap();
    assert!(matches!(
      f.service.get_invoice(created.id).await,
      Err(InvoiceError::InvoiceNotFound(_))
    ));
    assert!(matches!(
      f.service.delete_invoice(created.id).await,
      Err(InvoiceError::InvoiceNotFound(_))
    ));
  }
}
