//! Normalize stage: staged raw records → flat entity tables.
//!
//! Splits each nested record into customer, product, and order rows.
//! Customers and products are dedup-inserted by id; orders are also
//! dedup-inserted by id so that re-running the pipeline over the same batch
//! is idempotent. All inserts and the staging drop happen in one
//! transaction: a mid-stage failure leaves the store in its pre-stage state.

use std::collections::HashSet;

use duckdb_store::{insert, snapshot, staging, Store};
use pipeline_core::{Customer, Order, Product, RawOrderRecord, Result};
use tracing::info;

/// Row counts produced by one normalization run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeSummary {
    pub customers_inserted: usize,
    pub products_inserted: usize,
    pub orders_inserted: usize,
    /// Staged orders whose id was already present (in the table or earlier
    /// in the batch) and were skipped.
    pub duplicate_orders_skipped: usize,
}

/// Normalizes the staged batch, returning `None` when nothing is staged.
pub fn run(store: &mut Store) -> Result<Option<NormalizeSummary>> {
    if !staging::staging_exists(store.conn())? {
        info!("No staged batch present; nothing to normalize");
        return Ok(None);
    }

    let summary = store.with_tx(|tx| {
        let records = staging::fetch_staging(tx)?;

        let customers = dedup_customers(&records, &snapshot::customer_ids(tx)?);
        let products = dedup_products(&records, &snapshot::product_ids(tx)?);
        let (orders, duplicate_orders_skipped) = dedup_orders(&records, &snapshot::order_ids(tx)?);

        insert::insert_customers(tx, &customers)?;
        insert::insert_products(tx, &products)?;
        insert::insert_orders(tx, &orders)?;

        // Staging is ephemeral: dropped even when the batch was empty.
        staging::drop_staging(tx)?;

        Ok(NormalizeSummary {
            customers_inserted: customers.len(),
            products_inserted: products.len(),
            orders_inserted: orders.len(),
            duplicate_orders_skipped,
        })
    })?;

    info!(
        customers = summary.customers_inserted,
        products = summary.products_inserted,
        orders = summary.orders_inserted,
        duplicates_skipped = summary.duplicate_orders_skipped,
        "Normalized staged batch"
    );

    Ok(Some(summary))
}

/// Customers to insert: one row per customer id that is neither already in
/// the customers table nor seen earlier in the batch. First occurrence in
/// batch order wins, keeping the id-uniqueness invariant even when two
/// staged records disagree on the other fields.
pub fn dedup_customers(records: &[RawOrderRecord], existing: &HashSet<i64>) -> Vec<Customer> {
    let mut seen = HashSet::new();
    records
        .iter()
        .filter(|r| !existing.contains(&r.customer.id) && seen.insert(r.customer.id))
        .map(|r| r.customer.clone())
        .collect()
}

/// Products to insert; identical policy to [`dedup_customers`].
pub fn dedup_products(records: &[RawOrderRecord], existing: &HashSet<i64>) -> Vec<Product> {
    let mut seen = HashSet::new();
    records
        .iter()
        .filter(|r| !existing.contains(&r.product.id) && seen.insert(r.product.id))
        .map(|r| r.product.clone())
        .collect()
}

/// Orders to insert, deduplicated by order id against the orders table and
/// earlier rows of the same batch. Returns the flattened orders and the
/// number of duplicates skipped.
pub fn dedup_orders(
    records: &[RawOrderRecord],
    existing: &HashSet<String>,
) -> (Vec<Order>, usize) {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut orders = Vec::new();
    let mut skipped = 0;

    for record in records {
        if existing.contains(&record.id) || !seen.insert(&record.id) {
            skipped += 1;
            continue;
        }
        orders.push(record.to_order());
    }

    (orders, skipped)
}
