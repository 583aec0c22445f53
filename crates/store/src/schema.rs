//! DuckDB table schemas.
//!
//! Entity tables (`customers`, `products`, `orders`) are created once with
//! `IF NOT EXISTS` and grow across runs. Derived tables are dropped and
//! recreated wholesale on every analytics run, so their DDL lives here as
//! plain `CREATE TABLE` statements executed after a `DROP TABLE IF EXISTS`.

/// Initialization SQL executed at database open time via `execute_batch`.
///
/// All statements are idempotent so they are safe to re-run on every open.
/// Engine settings are applied first; `memory_limit` and `threads` come from
/// [`StoreConfig`](crate::config::StoreConfig).
pub fn init_sql(memory_limit: &str, threads: u32) -> String {
    format!(
        r#"SET memory_limit = '{memory_limit}';
SET threads = {threads};

CREATE TABLE IF NOT EXISTS customers (
    Id          BIGINT,
    Name        VARCHAR,
    Email       VARCHAR,
    Address     VARCHAR,
    Status      VARCHAR
);

CREATE TABLE IF NOT EXISTS products (
    Id          BIGINT,
    Name        VARCHAR,
    Category    VARCHAR,
    Price       DOUBLE
);

CREATE TABLE IF NOT EXISTS orders (
    Id          VARCHAR,
    CustomerId  BIGINT,
    ProductId   BIGINT,
    Date        TIMESTAMP,
    Payment     VARCHAR,
    Status      VARCHAR,
    Discount    DOUBLE,
    Quantity    INTEGER,
    Total       DOUBLE
);
"#
    )
}

/// SQL for creating the order_anomalies table: all order columns plus the
/// heuristic cancellation reason.
pub const CREATE_ORDER_ANOMALIES: &str = r#"
CREATE TABLE order_anomalies (
    Id           VARCHAR,
    CustomerId   BIGINT,
    ProductId    BIGINT,
    Date         TIMESTAMP,
    Payment      VARCHAR,
    Status       VARCHAR,
    Discount     DOUBLE,
    Quantity     INTEGER,
    Total        DOUBLE,
    CancelReason VARCHAR
)
"#;

/// SQL for creating the customer_anomalies table.
pub const CREATE_CUSTOMER_ANOMALIES: &str = r#"
CREATE TABLE customer_anomalies (
    CustomerId   BIGINT,
    CustomerName VARCHAR,
    AnomalyCount BIGINT
)
"#;

/// SQL for creating the product_return_rates table.
pub const CREATE_PRODUCT_RETURN_RATES: &str = r#"
CREATE TABLE product_return_rates (
    ProductId      BIGINT,
    ProductName    VARCHAR,
    TotalOrders    BIGINT,
    ReturnedOrders BIGINT,
    ReturnRate     DOUBLE
)
"#;

/// SQL for creating the monthly_order_volume table.
pub const CREATE_MONTHLY_ORDER_VOLUME: &str = r#"
CREATE TABLE monthly_order_volume (
    Month      DATE,
    OrderCount BIGINT
)
"#;

/// SQL for creating the top_spenders table.
pub const CREATE_TOP_SPENDERS: &str = r#"
CREATE TABLE top_spenders (
    CustomerId   BIGINT,
    CustomerName VARCHAR,
    TotalSpent   DOUBLE
)
"#;

/// SQL for creating the top_product table.
pub const CREATE_TOP_PRODUCT: &str = r#"
CREATE TABLE top_product (
    ProductId   BIGINT,
    ProductName VARCHAR,
    Count       BIGINT
)
"#;
