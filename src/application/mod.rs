//! Application layer
//!
//! Use cases translate loosely typed commands (tool arguments, JSON) into
//! domain value objects, call `InvoiceService` and shape the responses.

pub mod invoice;
pub mod tools;

pub use tools::{ToolContext, ToolDispatcher, ToolError};
