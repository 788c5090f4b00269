//! Keeps `amount_paid`, `total_amount` and `status` of an invoice consistent.
//!
//! An explicitly requested status always wins. The status is inferred from
//! the paid amount only when the same request did not name one.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::entities::Invoice;
use super::errors::InvoiceError;
use super::value_objects::{InvoiceStatus, round_money};

/// Two amounts closer than this are considered equal when deciding whether
/// an invoice has been fully paid.
pub const PAYMENT_TOLERANCE: Decimal = dec!(0.01);

/// Status and amount a caller asked for in a single write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaymentUpdate {
  pub status: Option<InvoiceStatus>,
  pub amount_paid: Option<Decimal>,
}

impl PaymentUpdate {
  pub fn is_empty(&self) -> bool {
    self.status.is_none() && self.amount_paid.is_none()
  }
}

/// Applies a status/amount request to an invoice whose totals are already
/// up to date. `previous_status` is the status before the current write began.
pub fn apply_payment_update(
  invoice: &mut Invoice,
  previous_status: InvoiceStatus,
  update: PaymentUpdate,
) {
  match update.status {
    Some(status) => apply_explicit_status(invoice, previous_status, status, update.amount_paid),
    None => match update.amount_paid {
      Some(amount) => {
        invoice.amount_paid = amount;
        infer_status(invoice, Decimal::ZERO);
      }
      None => settle_paid_amount(invoice),
    },
  }
}

/// Re-derives a paid or partially paid status after the total moved under
/// an unchanged `amount_paid`. Other statuses are left as they are.
fn settle_paid_amount(invoice: &mut Invoice) {
  if !matches!(
    invoice.status,
    InvoiceStatus::Paid | InvoiceStatus::PartiallyPaid
  ) {
    return;
  }

  if invoice.amount_paid >= invoice.total_amount {
    invoice.status = InvoiceStatus::Paid;
    invoice.amount_paid = invoice.total_amount;
  } else {
    infer_status(invoice, Decimal::ZERO);
  }
}

fn apply_explicit_status(
  invoice: &mut Invoice,
  previous_status: InvoiceStatus,
  status: InvoiceStatus,
  requested_amount: Option<Decimal>,
) {
  invoice.status = status;
  match (status, requested_amount) {
    (_, Some(amount)) => invoice.amount_paid = amount,
    (InvoiceStatus::Paid, None) => invoice.amount_paid = invoice.total_amount,
    (InvoiceStatus::Unpaid | InvoiceStatus::Overdue | InvoiceStatus::Cancelled, None) => {
      // Relabeling a partially paid invoice keeps what was already received.
      if previous_status != InvoiceStatus::PartiallyPaid {
        invoice.amount_paid = Decimal::ZERO;
      }
    }
    (InvoiceStatus::Draft, None) => invoice.amount_paid = Decimal::ZERO,
    (InvoiceStatus::PartiallyPaid, None) => {}
  }

  if invoice.status == InvoiceStatus::Paid {
    invoice.amount_paid = invoice.amount_paid.min(invoice.total_amount);
  }
}

/// Derives the status from `amount_paid`. Draft and cancelled invoices are
/// never reopened by a zero amount.
fn infer_status(invoice: &mut Invoice, tolerance: Decimal) {
  let total = invoice.total_amount;
  let paid = invoice.amount_paid;

  if total > Decimal::ZERO && (paid >= total || (paid - total).abs() < tolerance) {
    invoice.status = InvoiceStatus::Paid;
    invoice.amount_paid = total;
  } else if paid > Decimal::ZERO && paid < total {
    invoice.status = InvoiceStatus::PartiallyPaid;
  } else if paid <= Decimal::ZERO
    && !matches!(
      invoice.status,
      InvoiceStatus::Draft | InvoiceStatus::Cancelled
    )
  {
    invoice.status = InvoiceStatus::Unpaid;
  }
}

/// Adds a payment to the invoice and re-derives its status.
///
/// Fails when the invoice is already paid or cancelled.
pub fn record_payment(invoice: &mut Invoice, amount: Decimal) -> Result<(), InvoiceError> {
  match invoice.status {
    InvoiceStatus::Paid => {
      return Err(InvoiceError::InvalidOperation(
        "Invoice is already fully paid".to_string(),
      ));
    }
    InvoiceStatus::Cancelled => {
      return Err(InvoiceError::InvalidOperation(
        "Cannot record payment for a cancelled invoice".to_string(),
      ));
    }
    _ => {}
  }

  let amount_paid = invoice
    .amount_paid
    .checked_add(amount)
    .ok_or_else(|| InvoiceError::InvalidInput("Payment amount is too large".to_string()))?;
  invoice.amount_paid = round_money(amount_paid);
  infer_status(invoice, PAYMENT_TOLERANCE);
  Ok(())
}
