use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgConnection, PgPool};
use std::collections::HashMap;
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::invoice::{
  CurrencyCode, Invoice, InvoiceFilter, InvoiceNumber, InvoiceStatus, InvoiceType, LineItem,
  LineItemDescription, LineItemDetails, Percentage, ShippingDetails, UnitBasis,
  errors::InvoiceError, ports::InvoiceRepository,
};

const UNIQUE_NUMBER_CONSTRAINT: &str = "invoices_organization_number_unique";

#[derive(Debug, FromRow)]
struct InvoiceRow {
  id: Uuid,
  organization_id: Uuid,
  customer_id: Uuid,
  invoice_number: String,
  invoice_type: String,
  status: String,
  currency: String,
  invoice_date: NaiveDate,
  due_date: Option<NaiveDate>,
  tax_percentage: Option<Decimal>,
  discount_percentage: Option<Decimal>,
  subtotal_amount: Decimal,
  tax_amount: Decimal,
  discount_amount: Decimal,
  total_amount: Decimal,
  amount_paid: Decimal,
  comments: Option<String>,
  container_number: Option<String>,
  seal_number: Option<String>,
  hs_code: Option<String>,
  bl_number: Option<String>,
  source_invoice_id: Option<Uuid>,
  created_at: DateTime<Utc>,
  updated_at: DateTime<Utc>,
}

impl InvoiceRow {
  fn into_invoice(self, line_items: Vec<LineItem>) -> Result<Invoice, InvoiceError> {
    Ok(Invoice {
      id: self.id,
      organization_id: self.organization_id,
      customer_id: self.customer_id,
      invoice_number: InvoiceNumber::new(self.invoice_number)?,
      invoice_type: InvoiceType::from_str(&self.invoice_type)?,
      status: InvoiceStatus::from_str(&self.status)?,
      currency: CurrencyCode::new(&self.currency)?,
      invoice_date: self.invoice_date,
      due_date: self.due_date,
      tax_percentage: self.tax_percentage.map(Percentage::new).transpose()?,
      discount_percentage: self.discount_percentage.map(Percentage::new).transpose()?,
      subtotal_amount: self.subtotal_amount,
      tax_amount: self.tax_amount,
      discount_amount: self.discount_amount,
      total_amount: self.total_amount,
      amount_paid: self.amount_paid,
      comments: self.comments,
      shipping: ShippingDetails {
        container_number: self.container_number,
        seal_number: self.seal_number,
        hs_code: self.hs_code,
        bl_number: self.bl_number,
      },
      source_invoice_id: self.source_invoice_id,
      line_items,
      created_at: self.created_at,
      updated_at: self.updated_at,
    })
  }
}

#[derive(Debug, FromRow)]
struct LineItemRow {
  id: Uuid,
  invoice_id: Uuid,
  line_order: i32,
  description: String,
  quantity_units: Option<Decimal>,
  quantity_cartons: Option<Decimal>,
  unit_basis: String,
  unit_label: String,
  price: Decimal,
  currency: String,
  line_total: Decimal,
  net_weight_kg: Option<Decimal>,
  gross_weight_kg: Option<Decimal>,
  volume_cbm: Option<Decimal>,
  comments: Option<String>,
  catalog_item_id: Option<Uuid>,
}

impl TryFrom<LineItemRow> for LineItem {
  type Error = InvoiceError;

  fn try_from(row: LineItemRow) -> Result<Self, Self::Error> {
    Ok(LineItem {
      id: row.id,
      invoice_id: row.invoice_id,
      line_order: row.line_order,
      details: LineItemDetails {
        description: LineItemDescription::new(row.description)?,
        quantity_units: row.quantity_units,
        quantity_cartons: row.quantity_cartons,
        unit_basis: UnitBasis::from_str(&row.unit_basis)?,
        unit_label: row.unit_label,
        price: row.price,
        currency: CurrencyCode::new(&row.currency)?,
        net_weight_kg: row.net_weight_kg,
        gross_weight_kg: row.gross_weight_kg,
        volume_cbm: row.volume_cbm,
        comments: row.comments,
        catalog_item_id: row.catalog_item_id,
      },
      line_total: row.line_total,
    })
  }
}

fn map_write_error(e: sqlx::Error, invoice_number: &InvoiceNumber) -> InvoiceError {
  if let sqlx::Error::Database(db_err) = &e {
    // PostgreSQL unique violation code
    if db_err.code().as_deref() == Some("23505")
      && db_err.constraint() == Some(UNIQUE_NUMBER_CONSTRAINT)
    {
      return InvoiceError::InvoiceNumberAlreadyExists(invoice_number.to_string());
    }
  }
  InvoiceError::Database(e)
}

pub struct PostgresInvoiceRepository {
  pool: PgPool,
}

impl PostgresInvoiceRepository {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  async fn insert_header(conn: &mut PgConnection, invoice: &Invoice) -> Result<(), InvoiceError> {
    sqlx::query(
      r#"
            INSERT INTO invoices (
                id, organization_id, customer_id, invoice_number, invoice_type, status,
                currency, invoice_date, due_date, tax_percentage, discount_percentage,
                subtotal_amount, tax_amount, discount_amount, total_amount, amount_paid,
                comments, container_number, seal_number, hs_code, bl_number,
                source_invoice_id, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                    $17, $18, $19, $20, $21, $22, $23, $24)
            "#,
    )
    .bind(invoice.id)
    .bind(invoice.organization_id)
    .bind(invoice.customer_id)
    .bind(invoice.invoice_number.value())
    .bind(invoice.invoice_type.as_str())
    .bind(invoice.status.as_str())
    .bind(invoice.currency.as_str())
    .bind(invoice.invoice_date)
    .bind(invoice.due_date)
    .bind(invoice.tax_percentage.map(|rate| rate.value()))
    .bind(invoice.discount_percentage.map(|rate| rate.value()))
    .bind(invoice.subtotal_amount)
    .bind(invoice.tax_amount)
    .bind(invoice.discount_amount)
    .bind(invoice.total_amount)
    .bind(invoice.amount_paid)
    .bind(invoice.comments.as_deref())
    .bind(invoice.shipping.container_number.as_deref())
    .bind(invoice.shipping.seal_number.as_deref())
    .bind(invoice.shipping.hs_code.as_deref())
    .bind(invoice.shipping.bl_number.as_deref())
    .bind(invoice.source_invoice_id)
    .bind(invoice.created_at)
    .bind(invoice.updated_at)
    .execute(&mut *conn)
    .await
    .map_err(|e| map_write_error(e, &invoice.invoice_number))?;

    Ok(())
  }

  async fn update_header(conn: &mut PgConnection, invoice: &Invoice) -> Result<(), InvoiceError> {
    let result = sqlx::query(
      r#"
            UPDATE invoices
            SET customer_id = $2, invoice_number = $3, status = $4, invoice_date = $5,
                due_date = $6, tax_percentage = $7, discount_percentage = $8,
                subtotal_amount = $9, tax_amount = $10, discount_amount = $11,
                total_amount = $12, amount_paid = $13, comments = $14,
                container_number = $15, seal_number = $16, hs_code = $17, bl_number = $18,
                updated_at = $19
            WHERE id = $1
            "#,
    )
    .bind(invoice.id)
    .bind(invoice.customer_id)
    .bind(invoice.invoice_number.value())
    .bind(invoice.status.as_str())
    .bind(invoice.invoice_date)
    .bind(invoice.due_date)
    .bind(invoice.tax_percentage.map(|rate| rate.value()))
    .bind(invoice.discount_percentage.map(|rate| rate.value()))
    .bind(invoice.subtotal_amount)
    .bind(invoice.tax_amount)
    .bind(invoice.discount_amount)
    .bind(invoice.total_amount)
    .bind(invoice.amount_paid)
    .bind(invoice.comments.as_deref())
    .bind(invoice.shipping.container_number.as_deref())
    .bind(invoice.shipping.seal_number.as_deref())
    .bind(invoice.shipping.hs_code.as_deref())
    .bind(invoice.shipping.bl_number.as_deref())
    .bind(invoice.updated_at)
    .execute(&mut *conn)
    .await
    .map_err(|e| map_write_error(e, &invoice.invoice_number))?;

    if result.rows_affected() == 0 {
      return Err(InvoiceError::InvoiceNotFound(invoice.id));
    }
    Ok(())
  }

  /// Makes the stored collection exactly `invoice.line_items`.
  async fn replace_line_items(
    conn: &mut PgConnection,
    invoice: &Invoice,
  ) -> Result<(), InvoiceError> {
    sqlx::query("DELETE FROM invoice_line_items WHERE invoice_id = $1")
      .bind(invoice.id)
      .execute(&mut *conn)
      .await?;

    for item in &invoice.line_items {
      let details = &item.details;
      sqlx::query(
        r#"
            INSERT INTO invoice_line_items (
                id, invoice_id, line_order, description, quantity_units, quantity_cartons,
                unit_basis, unit_label, price, currency, line_total, net_weight_kg,
                gross_weight_kg, volume_cbm, comments, catalog_item_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
      )
      .bind(item.id)
      .bind(invoice.id)
      .bind(item.line_order)
      .bind(details.description.value())
      .bind(details.quantity_units)
      .bind(details.quantity_cartons)
      .bind(details.unit_basis.as_str())
      .bind(&details.unit_label)
      .bind(details.price)
      .bind(details.currency.as_str())
      .bind(item.line_total)
      .bind(details.net_weight_kg)
      .bind(details.gross_weight_kg)
      .bind(details.volume_cbm)
      .bind(details.comments.as_deref())
      .bind(details.catalog_item_id)
      .execute(&mut *conn)
      .await?;
    }

    Ok(())
  }

  async fn load_line_items(
    conn: &mut PgConnection,
    invoice_ids: &[Uuid],
  ) -> Result<HashMap<Uuid, Vec<LineItem>>, InvoiceError> {
    let rows = sqlx::query_as::<_, LineItemRow>(
      r#"
            SELECT id, invoice_id, line_order, description, quantity_units, quantity_cartons,
                   unit_basis, unit_label, price, currency, line_total, net_weight_kg,
                   gross_weight_kg, volume_cbm, comments, catalog_item_id
            FROM invoice_line_items
            WHERE invoice_id = ANY($1)
            ORDER BY invoice_id, line_order
            "#,
    )
    .bind(invoice_ids)
    .fetch_all(&mut *conn)
    .await?;

    let mut grouped: HashMap<Uuid, Vec<LineItem>> = HashMap::new();
    for row in rows {
      let item = LineItem::try_from(row)?;
      grouped.entry(item.invoice_id).or_default().push(item);
    }
    Ok(grouped)
  }

  async fn assemble(
    conn: &mut PgConnection,
    rows: Vec<InvoiceRow>,
  ) -> Result<Vec<Invoice>, InvoiceError> {
    let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
    let mut line_items = Self::load_line_items(conn, &ids).await?;

    rows
      .into_iter()
      .map(|row| {
        let items = line_items.remove(&row.id).unwrap_or_default();
        row.into_invoice(items)
      })
      .collect()
  }

  async fn fetch(conn: &mut PgConnection, id: Uuid) -> Result<Option<Invoice>, InvoiceError> {
    let row = sqlx::query_as::<_, InvoiceRow>(
      r#"
            SELECT id, organization_id, customer_id, invoice_number, invoice_type, status,
                   currency, invoice_date, due_date, tax_percentage, discount_percentage,
                   subtotal_amount, tax_amount, discount_amount, total_amount, amount_paid,
                   comments, container_number, seal_number, hs_code, bl_number,
                   source_invoice_id, created_at, updated_at
            FROM invoices
            WHERE id = $1
            "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    match row {
      Some(row) => Ok(Self::assemble(conn, vec![row]).await?.pop()),
      None => Ok(None),
    }
  }

  /// Reads back what was written inside the same transaction.
  async fn fetch_written(conn: &mut PgConnection, id: Uuid) -> Result<Invoice, InvoiceError> {
    Self::fetch(conn, id)
      .await?
      .ok_or(InvoiceError::InvoiceNotFound(id))
  }
}

#[async_trait]
impl InvoiceRepository for PostgresInvoiceRepository {
  async fn create(&self, invoice: Invoice) -> Result<Invoice, InvoiceError> {
    let mut tx = self.pool.begin().await?;

    Self::insert_header(&mut tx, &invoice).await?;
    Self::replace_line_items(&mut tx, &invoice).await?;
    let stored = Self::fetch_written(&mut tx, invoice.id).await?;

    tx.commit().await?;
    tracing::debug!(invoice_id = %stored.id, line_items = stored.line_items.len(), "Inserted invoice");
    Ok(stored)
  }

  async fn update(&self, invoice: Invoice) -> Result<Invoice, InvoiceError> {
    let mut tx = self.pool.begin().await?;

    Self::update_header(&mut tx, &invoice).await?;
    Self::replace_line_items(&mut tx, &invoice).await?;
    let stored = Self::fetch_written(&mut tx, invoice.id).await?;

    tx.commit().await?;
    tracing::debug!(invoice_id = %stored.id, line_items = stored.line_items.len(), "Updated invoice");
    Ok(stored)
  }

  async fn find_by_id(&self, id: Uuid) -> Result<Option<Invoice>, InvoiceError> {
    let mut conn = self.pool.acquire().await?;
    Self::fetch(&mut conn, id).await
  }

  async fn find_by_organization(
    &self,
    organization_id: Uuid,
    filter: &InvoiceFilter,
  ) -> Result<Vec<Invoice>, InvoiceError> {
    let mut conn = self.pool.acquire().await?;
    let rows = sqlx::query_as::<_, InvoiceRow>(
      r#"
            SELECT id, organization_id, customer_id, invoice_number, invoice_type, status,
                   currency, invoice_date, due_date, tax_percentage, discount_percentage,
                   subtotal_amount, tax_amount, discount_amount, total_amount, amount_paid,
                   comments, container_number, seal_number, hs_code, bl_number,
                   source_invoice_id, created_at, updated_at
            FROM invoices
            WHERE organization_id = $1
              AND ($2::text IS NULL OR status = $2)
              AND ($3::uuid IS NULL OR customer_id = $3)
              AND ($4::text IS NULL OR invoice_type = $4)
              AND ($5::text IS NULL OR strpos(lower(invoice_number), lower($5)) > 0)
            ORDER BY invoice_date DESC, invoice_number DESC
            "#,
    )
    .bind(organization_id)
    .bind(filter.status.map(|status| status.as_str()))
    .bind(filter.customer_id)
    .bind(filter.invoice_type.map(|invoice_type| invoice_type.as_str()))
    .bind(filter.number_contains.as_deref())
    .fetch_all(&mut *conn)
    .await?;

    Self::assemble(&mut conn, rows).await
  }

  async fn find_overdue(
    &self,
    organization_id: Uuid,
    current_date: NaiveDate,
  ) -> Result<Vec<Invoice>, InvoiceError> {
    let mut conn = self.pool.acquire().await?;
    let rows = sqlx::query_as::<_, InvoiceRow>(
      r#"
            SELECT id, organization_id, customer_id, invoice_number, invoice_type, status,
                   currency, invoice_date, due_date, tax_percentage, discount_percentage,
                   subtotal_amount, tax_amount, discount_amount, total_amount, amount_paid,
                   comments, container_number, seal_number, hs_code, bl_number,
                   source_invoice_id, created_at, updated_at
            FROM invoices
            WHERE organization_id = $1
              AND status IN ('UNPAID', 'PARTIALLY_PAID')
              AND due_date < $2
            ORDER BY due_date ASC
            "#,
    )
    .bind(organization_id)
    .bind(current_date)
    .fetch_all(&mut *conn)
    .await?;

    Self::assemble(&mut conn, rows).await
  }

  async fn delete(&self, id: Uuid) -> Result<(), InvoiceError> {
    let mut tx = self.pool.begin().await?;

    sqlx::query("DELETE FROM invoice_line_items WHERE invoice_id = $1")
      .bind(id)
      .execute(&mut *tx)
      .await?;

    sqlx::query("DELETE FROM invoices WHERE id = $1")
      .bind(id)
      .execute(&mut *tx)
      .await?;

    tx.commit().await?;
    Ok(())
  }
}
