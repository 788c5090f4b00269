//! Name-based entry point for the conversational layer.
//!
//! A chat orchestrator asks for an operation by name with loosely typed JSON
//! arguments. The dispatcher injects the caller's organization, deserializes
//! the matching command and runs the same use case the other entry points use.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use super::invoice::{
  AddLineItemUseCase, CreateInvoiceUseCase, DeleteInvoiceUseCase, DeleteLineItemUseCase,
  GeneratePackingListUseCase, GetInvoiceDetailsUseCase, ListInvoicesUseCase,
  MarkOverdueInvoicesUseCase, RecordPaymentUseCase, TransformToCommercialUseCase,
  UpdateInvoiceUseCase, UpdateLineItemUseCase,
};
use crate::domain::invoice::{ErrorKind, InvoiceError, InvoiceService};

pub const TOOL_NAMES: &[&str] = &[
  "create_invoice",
  "update_invoice",
  "delete_invoice",
  "get_invoice_details",
  "list_invoices",
  "add_line_item",
  "update_line_item",
  "delete_line_item",
  "record_payment",
  "transform_invoice_to_commercial",
  "generate_packing_list",
  "mark_overdue_invoices",
];

/// Identity of the caller, established outside the tool arguments.
#[derive(Debug, Clone, Copy)]
pub struct ToolContext {
  pub organization_id: Uuid,
}

#[derive(Debug, Error)]
pub enum ToolError {
  #[error("Unknown tool: {0}")]
  UnknownTool(String),

  #[error("Invalid arguments for {tool}: {message}")]
  InvalidArguments { tool: String, message: String },

  #[error(transparent)]
  Invoice(#[from] InvoiceError),

  #[error("Failed to encode response: {0}")]
  Encoding(#[from] serde_json::Error),
}

impl ToolError {
  pub fn code(&self) -> &'static str {
    match self {
      ToolError::UnknownTool(_) | ToolError::InvalidArguments { .. } => "validation",
      ToolError::Invoice(err) => match err.kind() {
        ErrorKind::Validation => "validation",
        ErrorKind::NotFound => "not_found",
        ErrorKind::InvalidOperation => "invalid_operation",
        ErrorKind::Persistence => "persistence",
      },
      ToolError::Encoding(_) => "internal",
    }
  }

  /// Shape handed back to the orchestrator so it can phrase a reply.
  pub fn to_payload(&self) -> Value {
    json!({
      "error": self.code(),
      "message": self.to_string(),
    })
  }
}

pub struct ToolDispatcher {
  create_invoice: CreateInvoiceUseCase,
  update_invoice: UpdateInvoiceUseCase,
  delete_invoice: DeleteInvoiceUseCase,
  get_invoice_details: GetInvoiceDetailsUseCase,
  list_invoices: ListInvoicesUseCase,
  add_line_item: AddLineItemUseCase,
  update_line_item: UpdateLineItemUseCase,
  delete_line_item: DeleteLineItemUseCase,
  record_payment: RecordPaymentUseCase,
  transform_to_commercial: TransformToCommercialUseCase,
  generate_packing_list: GeneratePackingListUseCase,
  mark_overdue_invoices: MarkOverdueInvoicesUseCase,
}

impl ToolDispatcher {
  pub fn new(invoice_service: Arc<InvoiceService>) -> Self {
    Self {
      create_invoice: CreateInvoiceUseCase::new(invoice_service.clone()),
      update_invoice: UpdateInvoiceUseCase::new(invoice_service.clone()),
      delete_invoice: DeleteInvoiceUseCase::new(invoice_service.clone()),
      get_invoice_details: GetInvoiceDetailsUseCase::new(invoice_service.clone()),
      list_invoices: ListInvoicesUseCase::new(invoice_service.clone()),
      add_line_item: AddLineItemUseCase::new(invoice_service.clone()),
      update_line_item: UpdateLineItemUseCase::new(invoice_service.clone()),
      delete_line_item: DeleteLineItemUseCase::new(invoice_service.clone()),
      record_payment: RecordPaymentUseCase::new(invoice_service.clone()),
      transform_to_commercial: TransformToCommercialUseCase::new(invoice_service.clone()),
      generate_packing_list: GeneratePackingListUseCase::new(invoice_service.clone()),
      mark_overdue_invoices: MarkOverdueInvoicesUseCase::new(invoice_service),
    }
  }

  pub async fn dispatch(
    &self,
    ctx: &ToolContext,
    name: &str,
    args: Value,
  ) -> Result<Value, ToolError> {
    if !TOOL_NAMES.contains(&name) {
      tracing::warn!(tool = name, "Unknown tool requested");
      return Err(ToolError::UnknownTool(name.to_string()));
    }
    let args = with_context(ctx, name, args)?;
    tracing::debug!(tool = name, organization_id = %ctx.organization_id, "Dispatching tool call");

    let result = self.run(name, args).await;
    if let Err(err) = &result {
      tracing::info!(tool = name, error = %err, "Tool call failed");
    }
    result
  }

  async fn run(&self, name: &str, args: Value) -> Result<Value, ToolError> {
    match name {
      "create_invoice" => encode(self.create_invoice.execute(parse(name, args)?).await?),
      "update_invoice" => encode(self.update_invoice.execute(parse(name, args)?).await?),
      "delete_invoice" => encode(self.delete_invoice.execute(parse(name, args)?).await?),
      "get_invoice_details" => encode(self.get_invoice_details.execute(parse(name, args)?).await?),
      "list_invoices" => encode(self.list_invoices.execute(parse(name, args)?).await?),
      "add_line_item" => encode(self.add_line_item.execute(parse(name, args)?).await?),
      "update_line_item" => encode(self.update_line_item.execute(parse(name, args)?).await?),
      "delete_line_item" => encode(self.delete_line_item.execute(parse(name, args)?).await?),
      "record_payment" => encode(self.record_payment.execute(parse(name, args)?).await?),
      "transform_invoice_to_commercial" => {
        encode(self.transform_to_commercial.execute(parse(name, args)?).await?)
      }
      "generate_packing_list" => {
        encode(self.generate_packing_list.execute(parse(name, args)?).await?)
      }
      "mark_overdue_invoices" => {
        encode(self.mark_overdue_invoices.execute(parse(name, args)?).await?)
      }
      _ => Err(ToolError::UnknownTool(name.to_string())),
    }
  }
}

/// The caller's organization always overrides whatever the arguments carry.
fn with_context(ctx: &ToolContext, tool: &str, args: Value) -> Result<Value, ToolError> {
  let mut map = match args {
    Value::Object(map) => map,
    Value::Null => Map::new(),
    other => {
      return Err(ToolError::InvalidArguments {
        tool: tool.to_string(),
        message: format!("expected a JSON object, got {}", other),
      });
    }
  };
  map.insert(
    "organization_id".to_string(),
    Value::String(ctx.organization_id.to_string()),
  );
  Ok(Value::Object(map))
}

fn parse<T: DeserializeOwned>(tool: &str, args: Value) -> Result<T, ToolError> {
  serde_json::from_value(args).map_err(|err| ToolError::InvalidArguments {
    tool: tool.to_string(),
    message: err.to_string(),
  })
}

fn encode<T: Serialize>(response: T) -> Result<Value, ToolError> {
  Ok(serde_json::to_value(response)?)
}
