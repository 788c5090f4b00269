pub mod entities;
pub mod errors;
pub mod ports;
pub mod reconciler;
pub mod services;
pub mod transform;
pub mod value_objects;

pub use entities::{
  DEFAULT_UNIT_LABEL, Invoice, InvoiceTotals, LineItem, LineItemDetails, LineItemPatch,
  ShippingDetails,
};
pub use errors::{ErrorKind, InvoiceError};
pub use ports::{Clock, InvoiceFilter, InvoiceRepository};
pub use reconciler::PaymentUpdate;
pub use services::{InvoiceData, InvoiceService, InvoiceUpdateData};
pub use transform::DocumentNumbering;
pub use value_objects::{
  CurrencyCode, InvoiceNumber, InvoiceStatus, InvoiceType, LineItemDescription, Percentage,
  MAX_MONEY, UnitBasis, ValueObjectError, round_money,
};
