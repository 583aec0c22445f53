//! Snapshot readers over the normalized entity tables and, for verification,
//! the derived tables.
//!
//! Every derivation is a pure function of one snapshot, so the analytics
//! stage reads all three entity tables once and works entirely in memory.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use duckdb::Connection;
use pipeline_core::{
    CancelReason, Customer, CustomerAnomalySummary, Error, MonthlyOrderVolume, Order, Product,
    ProductReturnRate, Result, TopProduct, TopSpender,
};

use crate::client::store_err;

/// An immutable snapshot of the normalized entity tables.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub customers: Vec<Customer>,
    pub products: Vec<Product>,
    pub orders: Vec<Order>,
}

impl Snapshot {
    /// Reads all three entity tables at once.
    pub fn read(conn: &Connection) -> Result<Self> {
        Ok(Self {
            customers: fetch_customers(conn)?,
            products: fetch_products(conn)?,
            orders: fetch_orders(conn)?,
        })
    }
}

/// All customer rows, in insertion order.
pub fn fetch_customers(conn: &Connection) -> Result<Vec<Customer>> {
    let mut stmt = conn
        .prepare("SELECT Id, Name, Email, Address, Status FROM customers")
        .map_err(store_err)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(Customer {
                id: row.get(0)?,
                name: row.get(1)?,
                email: row.get(2)?,
                address: row.get(3)?,
                status: row.get(4)?,
            })
        })
        .map_err(store_err)?
        .collect::<duckdb::Result<Vec<_>>>()
        .map_err(store_err)?;
    Ok(rows)
}

/// All product rows, in insertion order.
pub fn fetch_products(conn: &Connection) -> Result<Vec<Product>> {
    let mut stmt = conn
        .prepare("SELECT Id, Name, Category, Price FROM products")
        .map_err(store_err)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(Product {
                id: row.get(0)?,
                name: row.get(1)?,
                category: row.get(2)?,
                price: row.get(3)?,
            })
        })
        .map_err(store_err)?
        .collect::<duckdb::Result<Vec<_>>>()
        .map_err(store_err)?;
    Ok(rows)
}

/// All order rows, in insertion order.
pub fn fetch_orders(conn: &Connection) -> Result<Vec<Order>> {
    let mut stmt = conn
        .prepare(
            "SELECT Id, CustomerId, ProductId, Date, Payment, Status, Discount, Quantity, Total \
             FROM orders",
        )
        .map_err(store_err)?;
    // Status strings are parsed into the closed enum in a second pass so the
    // error carries our own diagnostics instead of the engine's.
    let rows = stmt
        .query_map([], |row| {
            let id: String = row.get(0)?;
            let customer_id: i64 = row.get(1)?;
            let product_id: i64 = row.get(2)?;
            let date: NaiveDateTime = row.get(3)?;
            let payment: String = row.get(4)?;
            let status: String = row.get(5)?;
            let discount: f64 = row.get(6)?;
            let quantity: i32 = row.get(7)?;
            let total: f64 = row.get(8)?;
            Ok((
                id,
                customer_id,
                product_id,
                date,
                payment,
                status,
                discount,
                quantity,
                total,
            ))
        })
        .map_err(store_err)?
        .collect::<duckdb::Result<Vec<_>>>()
        .map_err(store_err)?;

    rows.into_iter()
        .map(
            |(id, customer_id, product_id, date, payment, status, discount, quantity, total)| {
                let status = status
                    .parse()
                    .map_err(|e| Error::malformed(format!("order {id}: {e}")))?;
                Ok(Order {
                    id,
                    customer_id,
                    product_id,
                    date: DateTime::<Utc>::from_naive_utc_and_offset(date, Utc),
                    payment,
                    status,
                    discount,
                    quantity,
                    total,
                })
            },
        )
        .collect()
}

/// Ids already present in the customers table.
pub fn customer_ids(conn: &Connection) -> Result<HashSet<i64>> {
    fetch_id_set(conn, "SELECT Id FROM customers")
}

/// Ids already present in the products table.
pub fn product_ids(conn: &Connection) -> Result<HashSet<i64>> {
    fetch_id_set(conn, "SELECT Id FROM products")
}

/// Order ids already present in the orders table.
pub fn order_ids(conn: &Connection) -> Result<HashSet<String>> {
    let mut stmt = conn.prepare("SELECT Id FROM orders").map_err(store_err)?;
    let ids = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .map_err(store_err)?
        .collect::<duckdb::Result<HashSet<_>>>()
        .map_err(store_err)?;
    Ok(ids)
}

fn fetch_id_set(conn: &Connection, sql: &str) -> Result<HashSet<i64>> {
    let mut stmt = conn.prepare(sql).map_err(store_err)?;
    let ids = stmt
        .query_map([], |row| row.get::<_, i64>(0))
        .map_err(store_err)?
        .collect::<duckdb::Result<HashSet<_>>>()
        .map_err(store_err)?;
    Ok(ids)
}

/// Row count of one of the known tables.
pub fn table_count(conn: &Connection, table: &str) -> Result<i64> {
    conn.query_row(&format!("SELECT count(*) FROM {table}"), [], |row| {
        row.get(0)
    })
    .map_err(store_err)
}

/// Order id and reason per anomaly row, ordered by order id.
pub fn fetch_order_anomalies(conn: &Connection) -> Result<Vec<(String, CancelReason)>> {
    let mut stmt = conn
        .prepare("SELECT Id, CancelReason FROM order_anomalies ORDER BY Id")
        .map_err(store_err)?;
    let rows = stmt
        .query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })
        .map_err(store_err)?
        .collect::<duckdb::Result<Vec<_>>>()
        .map_err(store_err)?;

    rows.into_iter()
        .map(|(id, reason)| Ok((id, reason.parse()?)))
        .collect()
}

/// The customer_anomalies table in stored order.
pub fn fetch_customer_anomalies(conn: &Connection) -> Result<Vec<CustomerAnomalySummary>> {
    let mut stmt = conn
        .prepare("SELECT CustomerId, CustomerName, AnomalyCount FROM customer_anomalies")
        .map_err(store_err)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(CustomerAnomalySummary {
                customer_id: row.get(0)?,
                customer_name: row.get(1)?,
                anomaly_count: row.get(2)?,
            })
        })
        .map_err(store_err)?
        .collect::<duckdb::Result<Vec<_>>>()
        .map_err(store_err)?;
    Ok(rows)
}

/// The product_return_rates table in stored order.
pub fn fetch_return_rates(conn: &Connection) -> Result<Vec<ProductReturnRate>> {
    let mut stmt = conn
        .prepare(
            "SELECT ProductId, ProductName, TotalOrders, ReturnedOrders, ReturnRate \
             FROM product_return_rates",
        )
        .map_err(store_err)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(ProductReturnRate {
                product_id: row.get(0)?,
                product_name: row.get(1)?,
                total_orders: row.get(2)?,
                returned_orders: row.get(3)?,
                return_rate: row.get(4)?,
            })
        })
        .map_err(store_err)?
        .collect::<duckdb::Result<Vec<_>>>()
        .map_err(store_err)?;
    Ok(rows)
}

/// The monthly_order_volume table in stored order.
pub fn fetch_monthly_volume(conn: &Connection) -> Result<Vec<MonthlyOrderVolume>> {
    let mut stmt = conn
        .prepare("SELECT Month, OrderCount FROM monthly_order_volume")
        .map_err(store_err)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(MonthlyOrderVolume {
                month: row.get::<_, NaiveDate>(0)?,
                order_count: row.get(1)?,
            })
        })
        .map_err(store_err)?
        .collect::<duckdb::Result<Vec<_>>>()
        .map_err(store_err)?;
    Ok(rows)
}

/// The top_spenders table in stored order.
pub fn fetch_top_spenders(conn: &Connection) -> Result<Vec<TopSpender>> {
    let mut stmt = conn
        .prepare("SELECT CustomerId, CustomerName, TotalSpent FROM top_spenders")
        .map_err(store_err)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(TopSpender {
                customer_id: row.get(0)?,
                customer_name: row.get(1)?,
                total_spent: row.get(2)?,
            })
        })
        .map_err(store_err)?
        .collect::<duckdb::Result<Vec<_>>>()
        .map_err(store_err)?;
    Ok(rows)
}

/// The top_product table in stored order.
pub fn fetch_top_product(conn: &Connection) -> Result<Vec<TopProduct>> {
    let mut stmt = conn
        .prepare("SELECT ProductId, ProductName, Count FROM top_product")
        .map_err(store_err)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(TopProduct {
                product_id: row.get(0)?,
                product_name: row.get(1)?,
                count: row.get(2)?,
            })
        })
        .map_err(store_err)?
        .collect::<duckdb::Result<Vec<_>>>()
        .map_err(store_err)?;
    Ok(rows)
}
