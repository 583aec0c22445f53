//! Row types for the derived analytics tables.
//!
//! Each derived table is recomputed from scratch on every analytics run;
//! these are plain value types with no identity beyond their contents.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::orders::{CancelReason, Order};

/// A cancelled order tagged with its heuristic cancellation reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderAnomaly {
    pub order: Order,
    pub reason: CancelReason,
}

/// Per-customer count of anomalies attributed to the customer.
///
/// `BadCard` anomalies are deliberately excluded upstream: a card decline is
/// not the customer's fault.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerAnomalySummary {
    pub customer_id: i64,
    pub customer_name: String,
    pub anomaly_count: i64,
}

/// Ratio of returned orders to all orders for a product.
///
/// Only products that appear in at least one order are included, so
/// `return_rate` is always a defined value in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductReturnRate {
    pub product_id: i64,
    pub product_name: String,
    pub total_orders: i64,
    pub returned_orders: i64,
    pub return_rate: f64,
}

/// Order count per calendar month, excluding cancelled and refunded orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyOrderVolume {
    /// First day of the month the orders fall into.
    pub month: NaiveDate,
    pub order_count: i64,
}

/// Total spend per customer, for the top-10 ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopSpender {
    pub customer_id: i64,
    pub customer_name: String,
    pub total_spent: f64,
}

/// A product tied at the maximum order count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopProduct {
    pub product_id: i64,
    pub product_name: String,
    pub count: i64,
}

/// The full set of derived tables produced by one analytics run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivedTables {
    pub order_anomalies: Vec<OrderAnomaly>,
    pub customer_anomalies: Vec<CustomerAnomalySummary>,
    pub product_return_rates: Vec<ProductReturnRate>,
    pub monthly_order_volume: Vec<MonthlyOrderVolume>,
    pub top_spenders: Vec<TopSpender>,
    pub top_product: Vec<TopProduct>,
}
