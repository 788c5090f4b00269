use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::invoice::{Invoice, InvoiceError, InvoiceFilter, InvoiceRepository};

/// Process-local invoice store.
///
/// Mirrors the constraints the Postgres schema enforces (unique number per
/// organization, line items owned by their invoice) so the services behave
/// the same against either backend.
#[derive(Default)]
pub struct InMemoryInvoiceRepository {
  invoices: RwLock<HashMap<Uuid, Invoice>>,
}

impl InMemoryInvoiceRepository {
  pub fn new() -> Self {
    Self::default()
  }

  fn ensure_unique_number(
    invoices: &HashMap<Uuid, Invoice>,
    invoice: &Invoice,
  ) -> Result<(), InvoiceError> {
    let taken = invoices.values().any(|existing| {
      existing.id != invoice.id
        && existing.organization_id == invoice.organization_id
        && existing.invoice_number == invoice.invoice_number
    });
    if taken {
      return Err(InvoiceError::InvoiceNumberAlreadyExists(
        invoice.invoice_number.to_string(),
      ));
    }
    Ok(())
  }

  fn sorted(mut invoices: Vec<Invoice>) -> Vec<Invoice> {
    invoices.sort_by(|a, b| {
      b.invoice_date
        .cmp(&a.invoice_date)
        .then_with(|| b.invoice_number.value().cmp(a.invoice_number.value()))
    });
    invoices
  }
}

#[async_trait]
impl InvoiceRepository for InMemoryInvoiceRepository {
  async fn create(&self, invoice: Invoice) -> Result<Invoice, InvoiceError> {
    let mut invoices = self.invoices.write().await;
    if invoices.contains_key(&invoice.id) {
      return Err(InvoiceError::Repository(format!(
        "Invoice {} already stored",
        invoice.id
      )));
    }
    Self::ensure_unique_number(&invoices, &invoice)?;

    invoices.insert(invoice.id, invoice.clone());
    Ok(invoice)
  }

  async fn update(&self, invoice: Invoice) -> Result<Invoice, InvoiceError> {
    let mut invoices = self.invoices.write().await;
    if !invoices.contains_key(&invoice.id) {
      return Err(InvoiceError::InvoiceNotFound(invoice.id));
    }
    Self::ensure_unique_number(&invoices, &invoice)?;

    invoices.insert(invoice.id, invoice.clone());
    Ok(invoice)
  }

  async fn find_by_id(&self, id: Uuid) -> Result<Option<Invoice>, InvoiceError> {
    Ok(self.invoices.read().await.get(&id).cloned())
  }

  async fn find_by_organization(
    &self,
    organization_id: Uuid,
    filter: &InvoiceFilter,
  ) -> Result<Vec<Invoice>, InvoiceError> {
    let invoices = self.invoices.read().await;
    let matching = invoices
      .values()
      .filter(|invoice| invoice.organization_id == organization_id && filter.matches(invoice))
      .cloned()
      .collect();
    Ok(Self::sorted(matching))
  }

  async fn find_overdue(
    &self,
    organization_id: Uuid,
    current_date: NaiveDate,
  ) -> Result<Vec<Invoice>, InvoiceError> {
    let invoices = self.invoices.read().await;
    let mut overdue: Vec<Invoice> = invoices
      .values()
      .filter(|invoice| {
        invoice.organization_id == organization_id && invoice.is_overdue(current_date)
      })
      .cloned()
      .collect();
    overdue.sort_by_key(|invoice| invoice.due_date);
    Ok(overdue)
  }

  async fn delete(&self, id: Uuid) -> Result<(), InvoiceError> {
    self.invoices.write().await.remove(&id);
    Ok(())
  }
}
