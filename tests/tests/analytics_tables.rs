//! Analyze-stage tests against a real store: derived tables are rebuilt
//! from scratch, round-trip faithfully, and rebuilding is idempotent.

use chrono::{TimeZone, Utc};
use duckdb_store::{insert, snapshot, Store};
use integration_tests::fixtures;
use pipeline_core::OrderStatus;

fn seeded_store() -> (tempfile::TempDir, Store) {
    let dir = tempfile::tempdir().unwrap();
    let mut store = Store::open(fixtures::store_config(&dir)).unwrap();

    let records = vec![
        fixtures::record_with(
            &fixtures::order_uuid(1),
            1,
            10,
            OrderStatus::Completed,
            40.0,
            Utc.with_ymd_and_hms(2024, 1, 15, 8, 0, 0).unwrap(),
        ),
        fixtures::record_with(
            &fixtures::order_uuid(2),
            2,
            10,
            OrderStatus::Completed,
            25.0,
            Utc.with_ymd_and_hms(2024, 2, 2, 9, 30, 0).unwrap(),
        ),
        fixtures::record_with(
            "bad-id",
            2,
            11,
            OrderStatus::Cancelled,
            10.0,
            Utc.with_ymd_and_hms(2024, 2, 3, 10, 0, 0).unwrap(),
        ),
    ];

    store
        .with_tx(|tx| {
            insert::insert_customers(tx, &[fixtures::customer(1), fixtures::customer(2)])?;
            insert::insert_products(tx, &[fixtures::product(10), fixtures::product(11)])?;
            insert::insert_orders(tx, &records.iter().map(|r| r.to_order()).collect::<Vec<_>>())?;
            Ok(())
        })
        .unwrap();

    (dir, store)
}

#[test]
fn derived_tables_round_trip_through_the_store() {
    let (_dir, mut store) = seeded_store();

    let summary = pipeline::analytics::run(&mut store).unwrap();
    assert_eq!(summary.order_anomalies, 1);
    assert_eq!(summary.customer_anomalies, 1);
    assert_eq!(summary.product_return_rates, 2);
    assert_eq!(summary.monthly_order_volume, 2);
    assert_eq!(summary.top_spenders, 2);
    assert_eq!(summary.top_product, 1);

    let conn = store.conn();

    let anomalies = snapshot::fetch_order_anomalies(conn).unwrap();
    assert_eq!(anomalies[0].0, "bad-id");

    let customer_anomalies = snapshot::fetch_customer_anomalies(conn).unwrap();
    assert_eq!(customer_anomalies[0].customer_id, 2);
    assert_eq!(customer_anomalies[0].customer_name, "Customer 2");

    let volume = snapshot::fetch_monthly_volume(conn).unwrap();
    assert_eq!(
        volume.iter().map(|v| v.order_count).collect::<Vec<_>>(),
        vec![1, 1]
    );

    let spenders = snapshot::fetch_top_spenders(conn).unwrap();
    assert_eq!(spenders[0].customer_id, 1);
    assert!((spenders[0].total_spent - 40.0).abs() < 1e-9);
    assert_eq!(spenders[1].customer_id, 2);

    let top = snapshot::fetch_top_product(conn).unwrap();
    assert_eq!(top[0].product_id, 10);
    assert_eq!(top[0].product_name, "Product 10");
    assert_eq!(top[0].count, 2);
}

#[test]
fn rebuilding_twice_yields_identical_tables() {
    let (_dir, mut store) = seeded_store();

    pipeline::analytics::run(&mut store).unwrap();
    let first = (
        snapshot::fetch_order_anomalies(store.conn()).unwrap(),
        snapshot::fetch_customer_anomalies(store.conn()).unwrap(),
        snapshot::fetch_return_rates(store.conn()).unwrap(),
        snapshot::fetch_monthly_volume(store.conn()).unwrap(),
        snapshot::fetch_top_spenders(store.conn()).unwrap(),
        snapshot::fetch_top_product(store.conn()).unwrap(),
    );

    pipeline::analytics::run(&mut store).unwrap();
    let second = (
        snapshot::fetch_order_anomalies(store.conn()).unwrap(),
        snapshot::fetch_customer_anomalies(store.conn()).unwrap(),
        snapshot::fetch_return_rates(store.conn()).unwrap(),
        snapshot::fetch_monthly_volume(store.conn()).unwrap(),
        snapshot::fetch_top_spenders(store.conn()).unwrap(),
        snapshot::fetch_top_product(store.conn()).unwrap(),
    );

    assert_eq!(first, second);
}

#[test]
fn analyze_on_empty_entities_creates_empty_tables() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = Store::open(fixtures::store_config(&dir)).unwrap();

    let summary = pipeline::analytics::run(&mut store).unwrap();
    assert_eq!(summary.order_anomalies, 0);
    assert_eq!(summary.top_product, 0);

    for table in [
        "order_anomalies",
        "customer_anomalies",
        "product_return_rates",
        "monthly_order_volume",
        "top_spenders",
        "top_product",
    ] {
        assert_eq!(snapshot::table_count(store.conn(), table).unwrap(), 0);
    }
}
