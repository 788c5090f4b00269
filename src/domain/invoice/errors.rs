use super::value_objects::ValueObjectError;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum InvoiceError {
  #[error("Validation error: {0}")]
  Validation(#[from] ValueObjectError),

  #[error("Invalid input: {0}")]
  InvalidInput(String),

  #[error("Invoice not found: {0}")]
  InvoiceNotFound(Uuid),

  #[error("Line item not found: {0}")]
  LineItemNotFound(Uuid),

  #[error("Invoice number '{0}' already exists")]
  InvoiceNumberAlreadyExists(String),

  #[error("Invalid operation: {0}")]
  InvalidOperation(String),

  #[error("Repository error: {0}")]
  Repository(String),

  #[error("Database error: {0}")]
  Database(#[from] sqlx::Error),
}

/// Coarse classification callers map onto their own responses
/// (HTTP status codes, chat replies).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
  Validation,
  NotFound,
  InvalidOperation,
  Persistence,
}

impl InvoiceError {
  pub fn kind(&self) -> ErrorKind {
    match self {
      InvoiceError::Validation(_)
      | InvoiceError::InvalidInput(_)
      | InvoiceError::InvoiceNumberAlreadyExists(_) => ErrorKind::Validation,
      InvoiceError::InvoiceNotFound(_) | InvoiceError::LineItemNotFound(_) => ErrorKind::NotFound,
      InvoiceError::InvalidOperation(_) => ErrorKind::InvalidOperation,
      InvoiceError::Repository(_) | InvoiceError::Database(_) => ErrorKind::Persistence,
    }
  }
}

impl From<validator::ValidationErrors> for InvoiceError {
  fn from(errors: validator::ValidationErrors) -> Self {
    InvoiceError::InvalidInput(errors.to_string())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_error_kinds() {
    assert_eq!(
      InvoiceError::from(ValueObjectError::InvalidAmount("x".to_string())).kind(),
      ErrorKind::Validation
    );
    assert_eq!(
      InvoiceError::InvoiceNotFound(Uuid::nil()).kind(),
      ErrorKind::NotFound
    );
    assert_eq!(
      InvoiceError::InvalidOperation("wrong type".to_string()).kind(),
      ErrorKind::InvalidOperation
    );
    assert_eq!(
      InvoiceError::Repository("lost connection".to_string()).kind(),
      ErrorKind::Persistence
    );
  }
}
