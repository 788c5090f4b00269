//! Derivation of follow-up documents from an existing invoice.
//!
//! Builders here only read the source invoice and return creation data; the
//! resulting document goes through the regular create path and gets its own
//! freshly computed totals.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;

use super::entities::{Invoice, LineItemDetails};
use super::errors::InvoiceError;
use super::services::InvoiceData;
use super::value_objects::{InvoiceNumber, InvoiceStatus, InvoiceType, Percentage};

/// Fallback numbering for derived documents when the caller supplies none.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DocumentNumbering {
  #[serde(default = "default_commercial_suffix")]
  pub commercial_suffix: String,
  #[serde(default = "default_packing_list_prefix")]
  pub packing_list_prefix: String,
}

fn default_commercial_suffix() -> String {
  "-COMM".to_string()
}

fn default_packing_list_prefix() -> String {
  "PL-".to_string()
}

impl Default for DocumentNumbering {
  fn default() -> Self {
    Self {
      commercial_suffix: default_commercial_suffix(),
      packing_list_prefix: default_packing_list_prefix(),
    }
  }
}

impl DocumentNumbering {
  pub fn commercial_number(&self, source: &InvoiceNumber) -> Result<InvoiceNumber, InvoiceError> {
    fallback_number(format!("{}{}", source.value(), self.commercial_suffix))
  }

  pub fn packing_list_number(&self, source: &InvoiceNumber) -> Result<InvoiceNumber, InvoiceError> {
    fallback_number(format!("{}{}", self.packing_list_prefix, source.value()))
  }
}

fn fallback_number(candidate: String) -> Result<InvoiceNumber, InvoiceError> {
  if candidate.trim().len() > InvoiceNumber::MAX_LEN {
    return Err(InvoiceError::InvalidInput(format!(
      "Default number '{}' exceeds {} characters; supply the new invoice number explicitly",
      candidate,
      InvoiceNumber::MAX_LEN
    )));
  }
  Ok(InvoiceNumber::new(candidate)?)
}

pub fn commercial_from_pro_forma(
  pro_forma: &Invoice,
  new_number: Option<InvoiceNumber>,
  numbering: &DocumentNumbering,
  today: NaiveDate,
) -> Result<InvoiceData, InvoiceError> {
  if pro_forma.invoice_type != InvoiceType::ProForma {
    return Err(InvoiceError::InvalidOperation(format!(
      "Only Pro Forma invoices can be transformed to Commercial, got {}",
      pro_forma.invoice_type
    )));
  }

  let invoice_number = match new_number {
    Some(number) => number,
    None => numbering.commercial_number(&pro_forma.invoice_number)?,
  };

  Ok(InvoiceData {
    invoice_type: InvoiceType::Commercial,
    invoice_number,
    tax_percentage: pro_forma.tax_percentage,
    discount_percentage: pro_forma.discount_percentage,
    line_items: copy_line_items(pro_forma, None),
    ..derived_from(pro_forma, today)
  })
}

pub fn packing_list_from_commercial(
  commercial: &Invoice,
  new_number: Option<InvoiceNumber>,
  numbering: &DocumentNumbering,
  today: NaiveDate,
) -> Result<InvoiceData, InvoiceError> {
  if commercial.invoice_type != InvoiceType::Commercial {
    return Err(InvoiceError::InvalidOperation(format!(
      "Only Commercial invoices can be used to generate a Packing List, got {}",
      commercial.invoice_type
    )));
  }

  let invoice_number = match new_number {
    Some(number) => number,
    None => numbering.packing_list_number(&commercial.invoice_number)?,
  };

  // A packing list documents quantities and weights, not value.
  Ok(InvoiceData {
    invoice_type: InvoiceType::PackingList,
    invoice_number,
    tax_percentage: Some(Percentage::zero()),
    discount_percentage: Some(Percentage::zero()),
    line_items: copy_line_items(commercial, Some(Decimal::ZERO)),
    ..derived_from(commercial, today)
  })
}

/// Header fields every derived document carries over verbatim.
fn derived_from(source: &Invoice, today: NaiveDate) -> InvoiceData {
  InvoiceData {
    organization_id: source.organization_id,
    customer_id: source.customer_id,
    invoice_number: source.invoice_number.clone(),
    invoice_type: source.invoice_type,
    status: InvoiceStatus::Draft,
    currency: source.currency.clone(),
    invoice_date: Some(today),
    due_date: source.due_date,
    tax_percentage: None,
    discount_percentage: None,
    comments: source.comments.clone(),
    shipping: source.shipping.clone(),
    source_invoice_id: Some(source.id),
    line_items: Vec::new(),
  }
}

fn copy_line_items(source: &Invoice, price_override: Option<Decimal>) -> Vec<LineItemDetails> {
  source
    .line_items
    .iter()
    .map(|item| LineItemDetails {
      price: price_override.unwrap_or(item.details.price),
      ..item.details.clone()
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::invoice::entities::{DEFAULT_UNIT_LABEL, ShippingDetails};
  use crate::domain::invoice::value_objects::{CurrencyCode, LineItemDescription, UnitBasis};
  use chrono::Utc;
  use rust_decimal_macros::dec;
  use uuid::Uuid;

  fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
  }

  fn source(invoice_type: InvoiceType, number: &str) -> Invoice {
    let mut invoice = Invoice::new(
      Uuid::new_v4(),
      Uuid::new_v4(),
      InvoiceNumber::new(number.to_string()).unwrap(),
      invoice_type,
      CurrencyCode::new("USD").unwrap(),
      NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
      Utc::now(),
    );
    invoice.tax_percentage = Some(Percentage::new(dec!(5)).unwrap());
    invoice.due_date = NaiveDate::from_ymd_opt(2026, 11, 1);
    invoice.comments = Some("FOB Shanghai".to_string());
    invoice.shipping = ShippingDetails {
      container_number: Some("MSKU1234567".to_string()),
      seal_number: Some("SL-88".to_string()),
      hs_code: Some("8471.30".to_string()),
      bl_number: Some("BL-2026-01".to_string()),
    };
    invoice.replace_line_items(vec![LineItemDetails {
      description: LineItemDescription::new("Widget".to_string()).unwrap(),
      quantity_units: Some(dec!(10)),
      quantity_cartons: Some(dec!(1)),
      unit_basis: UnitBasis::Unit,
      unit_label: DEFAULT_UNIT_LABEL.to_string(),
      price: dec!(9.99),
      currency: CurrencyCode::new("USD").unwrap(),
      net_weight_kg: Some(dec!(5)),
      gross_weight_kg: Some(dec!(5.6)),
      volume_cbm: Some(dec!(0.12)),
      comments: None,
      catalog_item_id: None,
    }]);
    invoice.recalculate();
    invoice
  }

  #[test]
  fn test_commercial_copies_header_and_prices() {
    let pro_forma = source(InvoiceType::ProForma, "PF-001");
    let data =
      commercial_from_pro_forma(&pro_forma, None, &DocumentNumbering::default(), today()).unwrap();

    assert_eq!(data.invoice_number.value(), "PF-001-COMM");
    assert_eq!(data.invoice_type, InvoiceType::Commercial);
    assert_eq!(data.status, InvoiceStatus::Draft);
    assert_eq!(data.invoice_date, Some(today()));
    assert_eq!(data.due_date, pro_forma.due_date);
    assert_eq!(data.tax_percentage, pro_forma.tax_percentage);
    assert_eq!(data.shipping, pro_forma.shipping);
    assert_eq!(data.comments, pro_forma.comments);
    assert_eq!(data.source_invoice_id, Some(pro_forma.id));
    assert_eq!(data.line_items.len(), 1);
    assert_eq!(data.line_items[0], pro_forma.line_items[0].details);
  }

  #[test]
  fn test_commercial_uses_supplied_number() {
    let pro_forma = source(InvoiceType::ProForma, "PF-001");
    let number = InvoiceNumber::new("CI-2026-17".to_string()).unwrap();
    let data = commercial_from_pro_forma(
      &pro_forma,
      Some(number.clone()),
      &DocumentNumbering::default(),
      today(),
    )
    .unwrap();
    assert_eq!(data.invoice_number, number);
  }

  #[test]
  fn test_commercial_requires_pro_forma() {
    let commercial = source(InvoiceType::Commercial, "C-007");
    let result =
      commercial_from_pro_forma(&commercial, None, &DocumentNumbering::default(), today());
    assert!(matches!(result, Err(InvoiceError::InvalidOperation(_))));
  }

  #[test]
  fn test_packing_list_zeroes_prices_and_keeps_weights() {
    let commercial = source(InvoiceType::Commercial, "C-007");
    let data =
      packing_list_from_commercial(&commercial, None, &DocumentNumbering::default(), today())
        .unwrap();

    assert_eq!(data.invoice_number.value(), "PL-C-007");
    assert_eq!(data.invoice_type, InvoiceType::PackingList);
    assert_eq!(data.tax_percentage, Some(Percentage::zero()));
    assert_eq!(data.discount_percentage, Some(Percentage::zero()));
    let item = &data.line_items[0];
    assert_eq!(item.price, Decimal::ZERO);
    assert_eq!(item.line_total(), Decimal::ZERO);
    assert_eq!(item.quantity_units, Some(dec!(10)));
    assert_eq!(item.net_weight_kg, Some(dec!(5)));
    assert_eq!(item.gross_weight_kg, Some(dec!(5.6)));
    assert_eq!(item.volume_cbm, Some(dec!(0.12)));
  }

  #[test]
  fn test_packing_list_requires_commercial() {
    let pro_forma = source(InvoiceType::ProForma, "PF-001");
    let result =
      packing_list_from_commercial(&pro_forma, None, &DocumentNumbering::default(), today());
    assert!(matches!(result, Err(InvoiceError::InvalidOperation(_))));
  }

  #[test]
  fn test_custom_numbering() {
    let numbering = DocumentNumbering {
      commercial_suffix: "-C".to_string(),
      packing_list_prefix: "PACK/".to_string(),
    };
    let number = InvoiceNumber::new("2026-04".to_string()).unwrap();
    assert_eq!(numbering.commercial_number(&number).unwrap().value(), "2026-04-C");
    assert_eq!(
      numbering.packing_list_number(&number).unwrap().value(),
      "PACK/2026-04"
    );
  }

  #[test]
  fn test_fallback_number_too_long_is_rejected() {
    let pro_forma = source(InvoiceType::ProForma, &"9".repeat(InvoiceNumber::MAX_LEN));
    let result =
      commercial_from_pro_forma(&pro_forma, None, &DocumentNumbering::default(), today());
    match result {
      Err(InvoiceError::InvalidInput(message)) => {
        assert!(message.contains("exceeds 50 characters"));
        assert!(message.contains("supply the new invoice number explicitly"));
      }
      other => panic!("expected InvalidInput, got {:?}", other.map(|data| data.invoice_number)),
    }

    let explicit = InvoiceNumber::new("CI-LONG-1".to_string()).unwrap();
    let data = commercial_from_pro_forma(
      &pro_forma,
      Some(explicit.clone()),
      &DocumentNumbering::default(),
      today(),
    )
    .unwrap();
    assert_eq!(data.invoice_number, explicit);
  }

  #[test]
  fn test_packing_list_fallback_number_too_long_is_rejected() {
    let commercial = source(InvoiceType::Commercial, &"7".repeat(InvoiceNumber::MAX_LEN - 1));
    let result =
      packing_list_from_commercial(&commercial, None, &DocumentNumbering::default(), today());
    assert!(matches!(result, Err(InvoiceError::InvalidInput(_))));
  }
}
