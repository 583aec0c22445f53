//! Staging table helpers.
//!
//! The staging table holds one raw ingested batch and is ephemeral: created
//! by the ingest stage from the Parquet file, read and dropped by the
//! normalize stage.

use chrono::{DateTime, NaiveDateTime, Utc};
use duckdb::Connection;
use pipeline_core::{Customer, Error, Product, RawOrderRecord, Result};

use crate::client::store_err;

/// Name of the transient staging table.
pub const STAGING_TABLE: &str = "incoming_orders";

/// Projection flattening the nested `Customer`/`Product` sub-records.
///
/// `Payment` is a struct column in the raw batch; the VARCHAR cast copies
/// its rendering verbatim, matching how the orders table stores it.
const STAGING_SELECT: &str = r#"
SELECT
    o.Customer.Id,
    o.Customer.Name,
    o.Customer.Email,
    o.Customer.Address,
    o.Customer.Status,
    o.Product.Id,
    o.Product.Name,
    o.Product.Category,
    o.Product.Price,
    o.Id,
    o.Date,
    CAST(o.Payment AS VARCHAR),
    o.Status,
    o.Discount,
    o.Quantity,
    o.Total
FROM incoming_orders o
"#;

/// (Re)creates the staging table from a Parquet batch file.
///
/// Returns the number of staged rows.
pub fn load_from_parquet(conn: &Connection, path: &str) -> Result<usize> {
    // Paths go through SQL string literals; the only metacharacter is '.
    let escaped = path.replace('\'', "''");
    conn.execute_batch(&format!(
        "CREATE OR REPLACE TABLE {STAGING_TABLE} AS SELECT * FROM read_parquet('{escaped}')"
    ))
    .map_err(store_err)?;

    let rows: i64 = conn
        .query_row(&format!("SELECT count(*) FROM {STAGING_TABLE}"), [], |row| {
            row.get(0)
        })
        .map_err(store_err)?;

    Ok(rows as usize)
}

/// Whether a staged batch is present.
pub fn staging_exists(conn: &Connection) -> Result<bool> {
    let count: i64 = conn
        .query_row(
            "SELECT count(*) FROM information_schema.tables WHERE table_name = ?",
            [STAGING_TABLE],
            |row| row.get(0),
        )
        .map_err(store_err)?;
    Ok(count > 0)
}

/// Reads the whole staged batch into memory, in staging order.
///
/// A row with an unrecognized status string aborts the read: malformed
/// records fail the stage rather than being silently coerced.
pub fn fetch_staging(conn: &Connection) -> Result<Vec<RawOrderRecord>> {
    // Raw column values; status strings are parsed into the closed enum in
    // a second pass so the error carries our own diagnostics.
    struct StagedRow {
        customer: Customer,
        product: Product,
        id: String,
        date: NaiveDateTime,
        payment: String,
        status: String,
        discount: f64,
        quantity: i32,
        total: f64,
    }

    let mut stmt = conn.prepare(STAGING_SELECT).map_err(store_err)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(StagedRow {
                customer: Customer {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    email: row.get(2)?,
                    address: row.get(3)?,
                    status: row.get(4)?,
                },
                product: Product {
                    id: row.get(5)?,
                    name: row.get(6)?,
                    category: row.get(7)?,
                    price: row.get(8)?,
                },
                id: row.get(9)?,
                date: row.get(10)?,
                payment: row.get(11)?,
                status: row.get(12)?,
                discount: row.get(13)?,
                quantity: row.get(14)?,
                total: row.get(15)?,
            })
        })
        .map_err(store_err)?
        .collect::<duckdb::Result<Vec<_>>>()
        .map_err(|e| Error::malformed(format!("staged record: {e}")))?;

    rows.into_iter()
        .map(|row| {
            let status = row
                .status
                .parse()
                .map_err(|e| Error::malformed(format!("order {}: {e}", row.id)))?;
            Ok(RawOrderRecord {
                customer: row.customer,
                product: row.product,
                id: row.id,
                date: DateTime::<Utc>::from_naive_utc_and_offset(row.date, Utc),
                payment: row.payment,
                status,
                discount: row.discount,
                quantity: row.quantity,
                total: row.total,
            })
        })
        .collect()
}

/// Drops the staging table. The staged batch is ephemeral; this runs
/// unconditionally at the end of normalization, even for an empty batch.
pub fn drop_staging(conn: &Connection) -> Result<()> {
    conn.execute_batch(&format!("DROP TABLE IF EXISTS {STAGING_TABLE}"))
        .map_err(store_err)
}
