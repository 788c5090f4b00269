use anyhow::Context;
use serde::Deserialize;
use serde_json::{Value, json};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use tradeinvoice::{
  application::{ToolContext, ToolDispatcher, ToolError},
  domain::invoice::InvoiceService,
  infrastructure::{
    clock::SystemClock, config::Config, persistence::postgres::PostgresInvoiceRepository,
  },
};

/// One line of input: which tool to run, for whom, with what.
#[derive(Debug, Deserialize)]
struct ToolRequest {
  organization_id: Uuid,
  tool: String,
  #[serde(default)]
  args: Value,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialize environment variables from .env file
  dotenvy::dotenv().ok();

  // stdout carries responses, so logs go to stderr
  tracing_subscriber::registry()
    .with(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tradeinvoice=debug".into()),
    )
    .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
    .init();

  tracing::info!("Starting tradeinvoice tool runner");

  let config = Config::load().context("Failed to load configuration")?;
  tracing::info!("Configuration loaded successfully");

  let db_pool = tokio::time::timeout(
    config.database.connect_timeout(),
    PgPoolOptions::new()
      .max_connections(config.database.max_connections)
      .acquire_timeout(config.database.acquire_timeout())
      .connect(&config.database.url),
  )
  .await
  .map_err(|_| {
    tracing::error!(
      "Database connection timed out after {} seconds. Is PostgreSQL running?",
      config.database.connect_timeout_seconds
    );
    anyhow::anyhow!(
      "Database connection timed out after {} seconds",
      config.database.connect_timeout_seconds
    )
  })?
  .context("Failed to connect to database")?;
  tracing::info!("Database connection pool created");

  tracing::info!("Running database migrations");
  sqlx::migrate!("./migrations")
    .run(&db_pool)
    .await
    .context("Failed to run database migrations")?;
  tracing::info!("Database migrations completed");

  let invoice_service = Arc::new(InvoiceService::new(
    Arc::new(PostgresInvoiceRepository::new(db_pool)),
    Arc::new(SystemClock),
    config.numbering.clone(),
  ));
  let dispatcher = ToolDispatcher::new(invoice_service);

  let mut lines = BufReader::new(tokio::io::stdin()).lines();
  let mut stdout = tokio::io::stdout();

  while let Some(line) = lines.next_line().await? {
    if line.trim().is_empty() {
      continue;
    }

    let response = handle_line(&dispatcher, &line).await;
    let mut encoded = serde_json::to_string(&response)?;
    encoded.push('\n');
    stdout.write_all(encoded.as_bytes()).await?;
    stdout.flush().await?;
  }

  tracing::info!("Input closed, shutting down");
  Ok(())
}

async fn handle_line(dispatcher: &ToolDispatcher, line: &str) -> Value {
  let request: ToolRequest = match serde_json::from_str(line) {
    Ok(request) => request,
    Err(e) => {
      tracing::warn!(error = %e, "Malformed request line");
      return ToolError::InvalidArguments {
        tool: "request".to_string(),
        message: e.to_string(),
      }
      .to_payload();
    }
  };

  let ctx = ToolContext {
    organization_id: request.organization_id,
  };
  match dispatcher.dispatch(&ctx, &request.tool, request.args).await {
    Ok(result) => json!({ "result": result }),
    Err(e) => e.to_payload(),
  }
}
