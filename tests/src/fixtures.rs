//! Test fixtures: raw record builders, staging seeding, and Parquet batches.
//!
//! Staged batches are built through SQL `SELECT` clauses with DuckDB struct
//! literals for the `Customer`/`Product` sub-records, matching the layout of
//! a real generated batch file. Parquet files are produced by DuckDB itself
//! via `COPY ... (FORMAT PARQUET)`.

use std::path::Path;

use chrono::{DateTime, TimeZone, Utc};
use duckdb::Connection;
use duckdb_store::StoreConfig;
use pipeline_core::{Customer, OrderStatus, Product, RawOrderRecord};
use tempfile::TempDir;

/// A well-formed (36-char) order id derived from a small number.
pub fn order_uuid(n: u32) -> String {
    format!("{n:08x}-0000-0000-0000-000000000000")
}

pub fn customer(id: i64) -> Customer {
    Customer {
        id,
        name: format!("Customer {id}"),
        email: format!("c{id}@example.com"),
        address: format!("{id} Main St"),
        status: "ReturningCustomer".into(),
    }
}

pub fn product(id: i64) -> Product {
    Product {
        id,
        name: format!("Product {id}"),
        category: "Gadgets".into(),
        price: 19.99,
    }
}

/// A raw staged record with sensible defaults; tweak fields as needed.
pub fn record(order_id: &str, customer_id: i64, product_id: i64) -> RawOrderRecord {
    RawOrderRecord {
        customer: customer(customer_id),
        product: product(product_id),
        id: order_id.to_string(),
        date: Utc.with_ymd_and_hms(2024, 3, 5, 12, 0, 0).unwrap(),
        payment: "{'TransactionId': tx-1}".into(),
        status: OrderStatus::Completed,
        discount: 0.0,
        quantity: 1,
        total: 19.99,
    }
}

pub fn record_with(
    order_id: &str,
    customer_id: i64,
    product_id: i64,
    status: OrderStatus,
    total: f64,
    date: DateTime<Utc>,
) -> RawOrderRecord {
    let mut r = record(order_id, customer_id, product_id);
    r.status = status;
    r.total = total;
    r.date = date;
    r
}

/// Store config pointing at a database file inside the temp dir.
pub fn store_config(dir: &TempDir) -> StoreConfig {
    StoreConfig {
        path: dir
            .path()
            .join("orders.duckdb")
            .to_string_lossy()
            .into_owned(),
        ..StoreConfig::default()
    }
}

fn sql_str(s: &str) -> String {
    s.replace('\'', "''")
}

/// One `SELECT` clause producing a staged row, with the status rendered from
/// an arbitrary string so tests can stage malformed records.
pub fn select_with_status(r: &RawOrderRecord, status: &str) -> String {
    format!(
        "SELECT '{id}' AS Id, \
         {{'Id': {cid}, 'Name': '{cname}', 'Email': '{cemail}', 'Address': '{caddr}', \
           'Status': '{cstatus}'}} AS Customer, \
         {{'Id': {pid}, 'Name': '{pname}', 'Category': '{pcat}', 'Price': {pprice}}} AS Product, \
         TIMESTAMP '{date}' AS Date, \
         '{payment}' AS Payment, \
         '{status}' AS Status, \
         {discount} AS Discount, \
         {quantity} AS Quantity, \
         {total} AS Total",
        id = sql_str(&r.id),
        cid = r.customer.id,
        cname = sql_str(&r.customer.name),
        cemail = sql_str(&r.customer.email),
        caddr = sql_str(&r.customer.address),
        cstatus = sql_str(&r.customer.status),
        pid = r.product.id,
        pname = sql_str(&r.product.name),
        pcat = sql_str(&r.product.category),
        pprice = r.product.price,
        date = r.date.naive_utc().format("%Y-%m-%d %H:%M:%S"),
        payment = sql_str(&r.payment),
        status = sql_str(status),
        discount = r.discount,
        quantity = r.quantity,
        total = r.total,
    )
}

pub fn select_for(r: &RawOrderRecord) -> String {
    select_with_status(r, r.status.as_str())
}

fn batch_query(records: &[RawOrderRecord]) -> String {
    if records.is_empty() {
        // Zero rows, full schema
        let template = select_for(&record("template", 0, 0));
        return format!("{template} WHERE 1 = 0");
    }
    records
        .iter()
        .map(select_for)
        .collect::<Vec<_>>()
        .join(" UNION ALL ")
}

/// Creates the staging table directly on the store connection, as if the
/// ingest stage had run over a batch with these records.
pub fn seed_staging(conn: &Connection, records: &[RawOrderRecord]) {
    conn.execute_batch(&format!(
        "CREATE OR REPLACE TABLE incoming_orders AS {}",
        batch_query(records)
    ))
    .expect("Failed to seed staging table");
}

/// Stages raw rows from explicit `SELECT` clauses (malformed-record tests).
pub fn seed_staging_selects(conn: &Connection, selects: &[String]) {
    conn.execute_batch(&format!(
        "CREATE OR REPLACE TABLE incoming_orders AS {}",
        selects.join(" UNION ALL ")
    ))
    .expect("Failed to seed staging table");
}

/// Writes a raw batch Parquet file for the ingest stage to pick up.
pub fn write_parquet_batch(path: &Path, records: &[RawOrderRecord]) {
    let conn = Connection::open_in_memory().expect("Failed to open in-memory database");
    let escaped = path.to_string_lossy().replace('\'', "''");
    conn.execute_batch(&format!(
        "COPY ({}) TO '{escaped}' (FORMAT PARQUET)",
        batch_query(records)
    ))
    .expect("Failed to write Parquet batch");
}
