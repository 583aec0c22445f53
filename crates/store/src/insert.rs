//! Insert helpers for entity and derived tables.
//!
//! Callers run these inside a stage transaction ([`Store::with_tx`]); a
//! `Transaction` derefs to `Connection`, so every function takes `&Connection`.
//!
//! [`Store::with_tx`]: crate::client::Store::with_tx

use duckdb::{params, Connection};
use pipeline_core::{Customer, DerivedTables, Order, Product, Result};
use tracing::debug;

use crate::client::store_err;
use crate::schema;

/// Appends customer rows.
pub fn insert_customers(conn: &Connection, customers: &[Customer]) -> Result<()> {
    let mut stmt = conn
        .prepare("INSERT INTO customers (Id, Name, Email, Address, Status) VALUES (?, ?, ?, ?, ?)")
        .map_err(store_err)?;
    for customer in customers {
        stmt.execute(params![
            customer.id,
            customer.name,
            customer.email,
            customer.address,
            customer.status,
        ])
        .map_err(store_err)?;
    }
    debug!(rows = customers.len(), "Inserted customers");
    Ok(())
}

/// Appends product rows.
pub fn insert_products(conn: &Connection, products: &[Product]) -> Result<()> {
    let mut stmt = conn
        .prepare("INSERT INTO products (Id, Name, Category, Price) VALUES (?, ?, ?, ?)")
        .map_err(store_err)?;
    for product in products {
        stmt.execute(params![
            product.id,
            product.name,
            product.category,
            product.price,
        ])
        .map_err(store_err)?;
    }
    debug!(rows = products.len(), "Inserted products");
    Ok(())
}

/// Appends order rows.
pub fn insert_orders(conn: &Connection, orders: &[Order]) -> Result<()> {
    let mut stmt = conn
        .prepare(
            "INSERT INTO orders \
             (Id, CustomerId, ProductId, Date, Payment, Status, Discount, Quantity, Total) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .map_err(store_err)?;
    for order in orders {
        stmt.execute(params![
            order.id,
            order.customer_id,
            order.product_id,
            order.date.naive_utc(),
            order.payment,
            order.status.as_str(),
            order.discount,
            order.quantity,
            order.total,
        ])
        .map_err(store_err)?;
    }
    debug!(rows = orders.len(), "Inserted orders");
    Ok(())
}

/// Drops and recreates all six derived tables from the computed rows.
///
/// Run inside one transaction so a failure partway leaves the previous
/// derived tables in place.
pub fn write_derived(conn: &Connection, derived: &DerivedTables) -> Result<()> {
    replace_table(conn, "order_anomalies", schema::CREATE_ORDER_ANOMALIES)?;
    let mut stmt = conn
        .prepare(
            "INSERT INTO order_anomalies \
             (Id, CustomerId, ProductId, Date, Payment, Status, Discount, Quantity, Total, \
              CancelReason) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .map_err(store_err)?;
    for anomaly in &derived.order_anomalies {
        let order = &anomaly.order;
        stmt.execute(params![
            order.id,
            order.customer_id,
            order.product_id,
            order.date.naive_utc(),
            order.payment,
            order.status.as_str(),
            order.discount,
            order.quantity,
            order.total,
            anomaly.reason.as_str(),
        ])
        .map_err(store_err)?;
    }

    replace_table(conn, "customer_anomalies", schema::CREATE_CUSTOMER_ANOMALIES)?;
    let mut stmt = conn
        .prepare(
            "INSERT INTO customer_anomalies (CustomerId, CustomerName, AnomalyCount) \
             VALUES (?, ?, ?)",
        )
        .map_err(store_err)?;
    for summary in &derived.customer_anomalies {
        stmt.execute(params![
            summary.customer_id,
            summary.customer_name,
            summary.anomaly_count,
        ])
        .map_err(store_err)?;
    }

    replace_table(
        conn,
        "product_return_rates",
        schema::CREATE_PRODUCT_RETURN_RATES,
    )?;
    let mut stmt = conn
        .prepare(
            "INSERT INTO product_return_rates \
             (ProductId, ProductName, TotalOrders, ReturnedOrders, ReturnRate) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .map_err(store_err)?;
    for rate in &derived.product_return_rates {
        stmt.execute(params![
            rate.product_id,
            rate.product_name,
            rate.total_orders,
            rate.returned_orders,
            rate.return_rate,
        ])
        .map_err(store_err)?;
    }

    replace_table(
        conn,
        "monthly_order_volume",
        schema::CREATE_MONTHLY_ORDER_VOLUME,
    )?;
    let mut stmt = conn
        .prepare("INSERT INTO monthly_order_volume (Month, OrderCount) VALUES (?, ?)")
        .map_err(store_err)?;
    for volume in &derived.monthly_order_volume {
        stmt.execute(params![volume.month, volume.order_count])
            .map_err(store_err)?;
    }

    replace_table(conn, "top_spenders", schema::CREATE_TOP_SPENDERS)?;
    let mut stmt = conn
        .prepare("INSERT INTO top_spenders (CustomerId, CustomerName, TotalSpent) VALUES (?, ?, ?)")
        .map_err(store_err)?;
    for spender in &derived.top_spenders {
        stmt.execute(params![
            spender.customer_id,
            spender.customer_name,
            spender.total_spent,
        ])
        .map_err(store_err)?;
    }

    replace_table(conn, "top_product", schema::CREATE_TOP_PRODUCT)?;
    let mut stmt = conn
        .prepare("INSERT INTO top_product (ProductId, ProductName, Count) VALUES (?, ?, ?)")
        .map_err(store_err)?;
    for product in &derived.top_product {
        stmt.execute(params![
            product.product_id,
            product.product_name,
            product.count,
        ])
        .map_err(store_err)?;
    }

    Ok(())
}

fn replace_table(conn: &Connection, name: &str, create_sql: &str) -> Result<()> {
    conn.execute_batch(&format!("DROP TABLE IF EXISTS {name}"))
        .map_err(store_err)?;
    conn.execute_batch(create_sql).map_err(store_err)?;
    Ok(())
}
