use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValueObjectError {
  #[error("Invalid invoice number: {0}")]
  InvalidInvoiceNumber(String),
  #[error("Invalid currency code: {0}")]
  InvalidCurrency(String),
  #[error("Invalid amount: {0}")]
  InvalidAmount(String),
  #[error("Invalid line item description: {0}")]
  InvalidDescription(String),
  #[error("Invalid quantity: {0}")]
  InvalidQuantity(String),
  #[error("Invalid percentage: {0}")]
  InvalidPercentage(String),
  #[error("Invalid invoice type: {0}")]
  InvalidInvoiceType(String),
  #[error("Invalid invoice status: {0}")]
  InvalidStatus(String),
  #[error("Invalid unit basis: {0}")]
  InvalidUnitBasis(String),
}

/// Rounds a monetary amount to cents, half away from zero.
///
/// Every rounding step in the financial computations goes through here so
/// totals are reproducible to the penny.
pub fn round_money(value: Decimal) -> Decimal {
  value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

// Invoice Number - User-editable text field, unique per organization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InvoiceNumber(String);

impl InvoiceNumber {
  pub const MAX_LEN: usize = 50;

  pub fn new(value: String) -> Result<Self, ValueObjectError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
      return Err(ValueObjectError::InvalidInvoiceNumber(
        "Invoice number cannot be empty".to_string(),
      ));
    }
    if trimmed.len() > Self::MAX_LEN {
      return Err(ValueObjectError::InvalidInvoiceNumber(format!(
        "Invoice number cannot exceed {} characters",
        Self::MAX_LEN
      )));
    }
    Ok(Self(trimmed.to_string()))
  }

  pub fn value(&self) -> &str {
    &self.0
  }

  pub fn into_inner(self) -> String {
    self.0
  }
}

impl TryFrom<String> for InvoiceNumber {
  type Error = ValueObjectError;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    Self::new(value)
  }
}

impl From<InvoiceNumber> for String {
  fn from(value: InvoiceNumber) -> Self {
    value.0
  }
}

impl fmt::Display for InvoiceNumber {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

// Invoice Type - the stage of the export transaction the document belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceType {
  ProForma,
  Commercial,
  PackingList,
}

impl InvoiceType {
  pub fn as_str(&self) -> &'static str {
    match self {
      InvoiceType::ProForma => "PRO_FORMA",
      InvoiceType::Commercial => "COMMERCIAL",
      InvoiceType::PackingList => "PACKING_LIST",
    }
  }
}

impl FromStr for InvoiceType {
  type Err = ValueObjectError;

  // Accepts the canonical labels as well as the human-readable ones
  // ("Pro Forma", "Packing List") older rows were written with.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_uppercase().replace([' ', '-'], "_").as_str() {
      "PRO_FORMA" | "PROFORMA" => Ok(InvoiceType::ProForma),
      "COMMERCIAL" => Ok(InvoiceType::Commercial),
      "PACKING_LIST" => Ok(InvoiceType::PackingList),
      _ => Err(ValueObjectError::InvalidInvoiceType(format!(
        "Unknown invoice type: {}",
        s
      ))),
    }
  }
}

impl fmt::Display for InvoiceType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

// Invoice Status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
  Draft,
  Unpaid,
  PartiallyPaid,
  Paid,
  Overdue,
  Cancelled,
}

impl InvoiceStatus {
  /// Payments can no longer be recorded against these.
  pub fn accepts_payments(&self) -> bool {
    !matches!(self, InvoiceStatus::Paid | InvoiceStatus::Cancelled)
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      InvoiceStatus::Draft => "DRAFT",
      InvoiceStatus::Unpaid => "UNPAID",
      InvoiceStatus::PartiallyPaid => "PARTIALLY_PAID",
      InvoiceStatus::Paid => "PAID",
      InvoiceStatus::Overdue => "OVERDUE",
      InvoiceStatus::Cancelled => "CANCELLED",
    }
  }
}

impl FromStr for InvoiceStatus {
  type Err = ValueObjectError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_uppercase().replace(' ', "_").as_str() {
      "DRAFT" => Ok(InvoiceStatus::Draft),
      "UNPAID" => Ok(InvoiceStatus::Unpaid),
      "PARTIALLY_PAID" => Ok(InvoiceStatus::PartiallyPaid),
      "PAID" => Ok(InvoiceStatus::Paid),
      "OVERDUE" => Ok(InvoiceStatus::Overdue),
      "CANCELLED" => Ok(InvoiceStatus::Cancelled),
      _ => Err(ValueObjectError::InvalidStatus(format!(
        "Unknown status: {}",
        s
      ))),
    }
  }
}

impl fmt::Display for InvoiceStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

// Unit Basis - which quantity field the price is quoted against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnitBasis {
  #[default]
  Unit,
  Carton,
}

impl UnitBasis {
  pub fn as_str(&self) -> &'static str {
    match self {
      UnitBasis::Unit => "UNIT",
      UnitBasis::Carton => "CARTON",
    }
  }
}

impl FromStr for UnitBasis {
  type Err = ValueObjectError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_uppercase().as_str() {
      "UNIT" => Ok(UnitBasis::Unit),
      "CARTON" => Ok(UnitBasis::Carton),
      _ => Err(ValueObjectError::InvalidUnitBasis(format!(
        "Unknown unit basis: {}",
        s
      ))),
    }
  }
}

// Currency - ISO 4217 alphabetic code. No conversion happens anywhere, so any
// well-formed code is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
  pub fn new(value: &str) -> Result<Self, ValueObjectError> {
    let code = value.trim().to_uppercase();
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
      return Err(ValueObjectError::InvalidCurrency(format!(
        "Currency must be a 3-letter code, got '{}'",
        value
      )));
    }
    Ok(Self(code))
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl TryFrom<String> for CurrencyCode {
  type Error = ValueObjectError;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    Self::new(&value)
  }
}

impl From<CurrencyCode> for String {
  fn from(value: CurrencyCode) -> Self {
    value.0
  }
}

impl FromStr for CurrencyCode {
  type Err = ValueObjectError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::new(s)
  }
}

impl fmt::Display for CurrencyCode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

// Percentage - tax or discount rate in [0, 100]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Percentage(Decimal);

impl Percentage {
  pub const MAX_SCALE: u32 = 4;

  pub fn new(value: Decimal) -> Result<Self, ValueObjectError> {
    if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
      return Err(ValueObjectError::InvalidPercentage(
        "Percentage must be between 0 and 100".to_string(),
      ));
    }
    if value.normalize().scale() > Self::MAX_SCALE {
      return Err(ValueObjectError::InvalidPercentage(format!(
        "Percentage cannot have more than {} decimal places",
        Self::MAX_SCALE
      )));
    }
    Ok(Self(value))
  }

  pub fn zero() -> Self {
    Self(Decimal::ZERO)
  }

  pub fn value(&self) -> Decimal {
    self.0
  }

  /// Rounded share of `base` this percentage represents; zero when the rate is zero.
  pub fn portion_of(&self, base: Decimal) -> Decimal {
    if self.0 > Decimal::ZERO {
      round_money(base * self.0 / Decimal::ONE_HUNDRED)
    } else {
      Decimal::ZERO
    }
  }
}

impl TryFrom<Decimal> for Percentage {
  type Error = ValueObjectError;

  fn try_from(value: Decimal) -> Result<Self, Self::Error> {
    Self::new(value)
  }
}

impl From<Percentage> for Decimal {
  fn from(value: Percentage) -> Self {
    value.0
  }
}

// Line Item Description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LineItemDescription(String);

impl LineItemDescription {
  pub fn new(value: String) -> Result<Self, ValueObjectError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
      return Err(ValueObjectError::InvalidDescription(
        "Description cannot be empty".to_string(),
      ));
    }
    if trimmed.len() > 2000 {
      return Err(ValueObjectError::InvalidDescription(
        "Description cannot exceed 2000 characters".to_string(),
      ));
    }
    Ok(Self(trimmed.to_string()))
  }

  pub fn value(&self) -> &str {
    &self.0
  }
}

impl TryFrom<String> for LineItemDescription {
  type Error = ValueObjectError;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    Self::new(value)
  }
}

impl From<LineItemDescription> for String {
  fn from(value: LineItemDescription) -> Self {
    value.0
  }
}

/// Largest amount a stored money column (`NUMERIC(14, 2)`) holds.
pub const MAX_MONEY: Decimal = dec!(999999999999.99);

/// Upper bound for quantities, weights and volumes. Together with
/// `MAX_MONEY` as the price bound, `price * quantity` stays far inside
/// `Decimal`'s range.
pub const MAX_QUANTITY: Decimal = dec!(1000000000);

/// Boundary check for optional quantities, weights and volumes.
pub fn non_negative(
  field: &str,
  value: Option<Decimal>,
) -> Result<Option<Decimal>, ValueObjectError> {
  match value {
    Some(v) if v < Decimal::ZERO => Err(ValueObjectError::InvalidQuantity(
      format!("{} cannot be negative", field),
    )),
    Some(v) if v > MAX_QUANTITY => Err(ValueObjectError::InvalidQuantity(format!(
      "{} cannot exceed {}",
      field, MAX_QUANTITY
    ))),
    other => Ok(other),
  }
}

/// Boundary check for client-supplied unit prices.
pub fn positive_price(value: Decimal) -> Result<Decimal, ValueObjectError> {
  if value <= Decimal::ZERO {
    return Err(ValueObjectError::InvalidAmount(
      "Price must be greater than zero".to_string(),
    ));
  }
  if value > MAX_MONEY {
    return Err(ValueObjectError::InvalidAmount(format!(
      "Price cannot exceed {}",
      MAX_MONEY
    )));
  }
  Ok(value)
}

/// Boundary check for client-supplied payment amounts; rounds to cents.
pub fn money_amount(field: &str, value: Decimal) -> Result<Decimal, ValueObjectError> {
  if value < Decimal::ZERO {
    return Err(ValueObjectError::InvalidAmount(format!(
      "{} cannot be negative",
      field
    )));
  }
  if value > MAX_MONEY {
    return Err(ValueObjectError::InvalidAmount(format!(
      "{} cannot exceed {}",
      field, MAX_MONEY
    )));
  }
  Ok(round_money(value))
}
