use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use super::entities::Invoice;
use super::errors::InvoiceError;
use super::value_objects::{InvoiceStatus, InvoiceType};

/// Optional narrowing of an organization's invoice listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvoiceFilter {
  pub status: Option<InvoiceStatus>,
  pub customer_id: Option<Uuid>,
  pub invoice_type: Option<InvoiceType>,
  pub number_contains: Option<String>,
}

impl InvoiceFilter {
  pub fn matches(&self, invoice: &Invoice) -> bool {
    self.status.is_none_or(|status| invoice.status == status)
      && self
        .customer_id
        .is_none_or(|customer_id| invoice.customer_id == customer_id)
      && self
        .invoice_type
        .is_none_or(|invoice_type| invoice.invoice_type == invoice_type)
      && self.number_contains.as_deref().is_none_or(|needle| {
        invoice
          .invoice_number
          .value()
          .to_lowercase()
          .contains(&needle.to_lowercase())
      })
  }
}

/// Storage port for the invoice aggregate (header plus line items).
///
/// `create` and `update` must persist header and line items in a single
/// transaction; the line-item collection stored afterwards is exactly
/// `invoice.line_items`.
#[async_trait]
pub trait InvoiceRepository: Send + Sync {
  async fn create(&self, invoice: Invoice) -> Result<Invoice, InvoiceError>;
  async fn update(&self, invoice: Invoice) -> Result<Invoice, InvoiceError>;
  /// Loads the invoice together with its line items, ordered by `line_order`.
  async fn find_by_id(&self, id: Uuid) -> Result<Option<Invoice>, InvoiceError>;
  async fn find_by_organization(
    &self,
    organization_id: Uuid,
    filter: &InvoiceFilter,
  ) -> Result<Vec<Invoice>, InvoiceError>;
  async fn find_overdue(
    &self,
    organization_id: Uuid,
    current_date: NaiveDate,
  ) -> Result<Vec<Invoice>, InvoiceError>;
  async fn delete(&self, id: Uuid) -> Result<(), InvoiceError>;
}

/// Time source used for default dates and timestamps.
pub trait Clock: Send + Sync {
  fn now(&self) -> DateTime<Utc>;

  fn today(&self) -> NaiveDate {
    self.now().date_naive()
  }
}
