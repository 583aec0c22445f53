//! Domain types for raw and normalized order data.
//!
//! The raw batch carries one record per order with the customer and product
//! embedded as sub-records; normalization splits those out into flat entity
//! rows. Status values are closed enums rather than free strings so a typo
//! in the data surfaces as a hard error instead of a silently empty group.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Expected length of a well-formed order identifier (UUID text form).
pub const ORDER_ID_LEN: usize = 36;

/// Lifecycle status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Completed,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    /// Whether the order counts as returned money: cancelled or refunded.
    ///
    /// Orders in these states are excluded from volume, spend, and
    /// popularity derivations and count toward product return rates.
    pub fn is_returned(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Refunded)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
            Self::Refunded => "Refunded",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Completed" => Ok(Self::Completed),
            "Cancelled" => Ok(Self::Cancelled),
            "Refunded" => Ok(Self::Refunded),
            other => Err(Error::InvalidStatus(other.to_string())),
        }
    }
}

/// Heuristic reason assigned to a cancelled order.
///
/// Binary classifier: an identifier that is not UUID-shaped is one failure
/// class (`BadId`), everything else is treated as a card decline (`BadCard`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CancelReason {
    BadId,
    BadCard,
}

impl CancelReason {
    /// Classify a cancelled order by the shape of its identifier.
    pub fn classify(order_id: &str) -> Self {
        if order_id.len() != ORDER_ID_LEN {
            Self::BadId
        } else {
            Self::BadCard
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BadId => "BadId",
            Self::BadCard => "BadCard",
        }
    }
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CancelReason {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BadId" => Ok(Self::BadId),
            "BadCard" => Ok(Self::BadCard),
            other => Err(Error::malformed(format!("unknown cancel reason: {other}"))),
        }
    }
}

/// A customer entity row, deduplicated by `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub address: String,
    pub status: String,
}

/// A product entity row, deduplicated by `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub price: f64,
}

/// A flattened order entity row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub customer_id: i64,
    pub product_id: i64,
    pub date: DateTime<Utc>,
    pub payment: String,
    pub status: OrderStatus,
    pub discount: f64,
    pub quantity: i32,
    pub total: f64,
}

/// A raw staged order record with embedded customer and product sub-records.
///
/// Mirrors the Parquet layout of the batch file: `Customer.*` and
/// `Product.*` struct columns plus the order-level fields. `payment` is the
/// VARCHAR rendering of the raw payment struct, copied verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawOrderRecord {
    pub customer: Customer,
    pub product: Product,
    pub id: String,
    pub date: DateTime<Utc>,
    pub payment: String,
    pub status: OrderStatus,
    pub discount: f64,
    pub quantity: i32,
    pub total: f64,
}

impl RawOrderRecord {
    /// Flatten the order-level fields, extracting the entity ids from the
    /// embedded sub-records.
    pub fn to_order(&self) -> Order {
        Order {
            id: self.id.clone(),
            customer_id: self.customer.id,
            product_id: self.product.id,
            date: self.date,
            payment: self.payment.clone(),
            status: self.status,
            discount: self.discount,
            quantity: self.quantity,
            total: self.total,
        }
    }
}
