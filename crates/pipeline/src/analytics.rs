//! Analytics stage: six derived tables recomputed from one entity snapshot.
//!
//! Each derivation is a pure function of the snapshot, independent of the
//! others, and idempotent under drop-and-rebuild semantics. Joins use
//! inner-join semantics: an order referencing an unknown customer or
//! product silently drops out of the joined derivations.
//!
//! Sort orders are fully specified (no "arbitrary engine ordering"):
//! rankings break ties by ascending entity id, everything else is ordered
//! by its natural key.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, NaiveDate};
use duckdb_store::{insert, Snapshot, Store};
use pipeline_core::{
    CancelReason, Customer, CustomerAnomalySummary, DerivedTables, MonthlyOrderVolume, Order,
    OrderAnomaly, OrderStatus, Product, ProductReturnRate, Result, TopProduct, TopSpender,
};
use tracing::info;

/// Maximum number of rows in the top_spenders table.
const TOP_SPENDERS_LIMIT: usize = 10;

/// Derived row counts from one analytics run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnalyzeSummary {
    pub order_anomalies: usize,
    pub customer_anomalies: usize,
    pub product_return_rates: usize,
    pub monthly_order_volume: usize,
    pub top_spenders: usize,
    pub top_product: usize,
}

/// Recomputes all six derived tables from the current entity tables.
///
/// The snapshot read, the drops, and the inserts share one transaction, so
/// concurrent inspection of the store never sees a half-rebuilt table set.
pub fn run(store: &mut Store) -> Result<AnalyzeSummary> {
    let summary = store.with_tx(|tx| {
        let snapshot = Snapshot::read(tx)?;
        let derived = derive_all(&snapshot);
        insert::write_derived(tx, &derived)?;

        Ok(AnalyzeSummary {
            order_anomalies: derived.order_anomalies.len(),
            customer_anomalies: derived.customer_anomalies.len(),
            product_return_rates: derived.product_return_rates.len(),
            monthly_order_volume: derived.monthly_order_volume.len(),
            top_spenders: derived.top_spenders.len(),
            top_product: derived.top_product.len(),
        })
    })?;

    info!(
        anomalies = summary.order_anomalies,
        customer_anomalies = summary.customer_anomalies,
        return_rates = summary.product_return_rates,
        months = summary.monthly_order_volume,
        top_spenders = summary.top_spenders,
        top_products = summary.top_product,
        "Rebuilt derived tables"
    );

    Ok(summary)
}

/// Computes all six derivations from one snapshot.
pub fn derive_all(snapshot: &Snapshot) -> DerivedTables {
    let anomalies = classify_anomalies(&snapshot.orders);
    let customer_anomalies = summarize_customer_anomalies(&anomalies, &snapshot.customers);

    DerivedTables {
        customer_anomalies,
        product_return_rates: product_return_rates(&snapshot.orders, &snapshot.products),
        monthly_order_volume: monthly_order_volume(&snapshot.orders),
        top_spenders: top_spenders(&snapshot.orders, &snapshot.customers),
        top_product: top_products(&snapshot.orders, &snapshot.products),
        order_anomalies: anomalies,
    }
}

/// Every cancelled order, tagged with its heuristic reason.
///
/// Total over cancelled orders: each appears exactly once, with `BadId` iff
/// the identifier is not UUID-shaped and `BadCard` otherwise.
pub fn classify_anomalies(orders: &[Order]) -> Vec<OrderAnomaly> {
    orders
        .iter()
        .filter(|o| o.status == OrderStatus::Cancelled)
        .map(|o| OrderAnomaly {
            reason: CancelReason::classify(&o.id),
            order: o.clone(),
        })
        .collect()
}

/// Anomaly counts per customer, descending by count.
///
/// `BadCard` anomalies are excluded: a card decline is not attributed to
/// the customer. Ties are broken by ascending customer id.
pub fn summarize_customer_anomalies(
    anomalies: &[OrderAnomaly],
    customers: &[Customer],
) -> Vec<CustomerAnomalySummary> {
    let names: HashMap<i64, &str> = customers.iter().map(|c| (c.id, c.name.as_str())).collect();

    let mut counts: BTreeMap<i64, i64> = BTreeMap::new();
    for anomaly in anomalies {
        if anomaly.reason == CancelReason::BadCard {
            continue;
        }
        *counts.entry(anomaly.order.customer_id).or_default() += 1;
    }

    let mut rows: Vec<CustomerAnomalySummary> = counts
        .into_iter()
        .filter_map(|(customer_id, anomaly_count)| {
            names.get(&customer_id).map(|name| CustomerAnomalySummary {
                customer_id,
                customer_name: name.to_string(),
                anomaly_count,
            })
        })
        .collect();

    rows.sort_by(|a, b| {
        b.anomaly_count
            .cmp(&a.anomaly_count)
            .then(a.customer_id.cmp(&b.customer_id))
    });
    rows
}

/// Per-product order and return counts, ordered by product id.
///
/// Only products appearing in at least one order are included, so the rate
/// is always a defined value in `[0, 1]`.
pub fn product_return_rates(orders: &[Order], products: &[Product]) -> Vec<ProductReturnRate> {
    let names: HashMap<i64, &str> = products.iter().map(|p| (p.id, p.name.as_str())).collect();

    let mut counts: BTreeMap<i64, (i64, i64)> = BTreeMap::new();
    for order in orders {
        let entry = counts.entry(order.product_id).or_default();
        entry.0 += 1;
        if order.status.is_returned() {
            entry.1 += 1;
        }
    }

    counts
        .into_iter()
        .filter_map(|(product_id, (total_orders, returned_orders))| {
            names.get(&product_id).map(|name| ProductReturnRate {
                product_id,
                product_name: name.to_string(),
                total_orders,
                returned_orders,
                return_rate: returned_orders as f64 / total_orders as f64,
            })
        })
        .collect()
}

/// Order counts bucketed by calendar month, ordered by month.
///
/// Cancelled and refunded orders never contribute.
pub fn monthly_order_volume(orders: &[Order]) -> Vec<MonthlyOrderVolume> {
    let mut counts: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    for order in orders {
        if order.status.is_returned() {
            continue;
        }
        let date = order.date.date_naive();
        // Truncate to the first of the containing month.
        if let Some(month) = NaiveDate::from_ymd_opt(date.year(), date.month(), 1) {
            *counts.entry(month).or_default() += 1;
        }
    }

    counts
        .into_iter()
        .map(|(month, order_count)| MonthlyOrderVolume { month, order_count })
        .collect()
}

/// Top customers by total spend, excluding cancelled and refunded orders.
///
/// Sorted descending by spend; ties (including at the cutoff) break by
/// ascending customer id, then truncated to ten rows.
pub fn top_spenders(orders: &[Order], customers: &[Customer]) -> Vec<TopSpender> {
    let names: HashMap<i64, &str> = customers.iter().map(|c| (c.id, c.name.as_str())).collect();

    let mut spend: BTreeMap<i64, f64> = BTreeMap::new();
    for order in orders {
        if order.status.is_returned() {
            continue;
        }
        *spend.entry(order.customer_id).or_default() += order.total;
    }

    let mut rows: Vec<TopSpender> = spend
        .into_iter()
        .filter_map(|(customer_id, total_spent)| {
            names.get(&customer_id).map(|name| TopSpender {
                customer_id,
                customer_name: name.to_string(),
                total_spent,
            })
        })
        .collect();

    rows.sort_by(|a, b| {
        b.total_spent
            .partial_cmp(&a.total_spent)
            .unwrap_or(Ordering::Equal)
            .then(a.customer_id.cmp(&b.customer_id))
    });
    rows.truncate(TOP_SPENDERS_LIMIT);
    rows
}

/// Every product tied at the maximum order count, ordered by product id.
///
/// Cancelled and refunded orders are excluded from the counts. Multi-winner
/// by design: no arbitrary single pick among ties. Empty when there are no
/// countable orders.
pub fn top_products(orders: &[Order], products: &[Product]) -> Vec<TopProduct> {
    let names: HashMap<i64, &str> = products.iter().map(|p| (p.id, p.name.as_str())).collect();

    let mut counts: BTreeMap<i64, i64> = BTreeMap::new();
    for order in orders {
        if order.status.is_returned() {
            continue;
        }
        if names.contains_key(&order.product_id) {
            *counts.entry(order.product_id).or_default() += 1;
        }
    }

    let max_count = match counts.values().max() {
        Some(max) => *max,
        None => return Vec::new(),
    };

    counts
        .into_iter()
        .filter(|(_, count)| *count == max_count)
        .filter_map(|(product_id, count)| {
            names.get(&product_id).map(|name| TopProduct {
                product_id,
                product_name: name.to_string(),
                count,
            })
        })
        .collect()
}
