//! Normalize-stage tests against a real store: dedup invariants, staging
//! lifecycle, and transactional rollback on malformed records.

use duckdb_store::{snapshot, staging, Store};
use integration_tests::fixtures;
use pipeline_core::Error;

#[test]
fn customers_and_products_stay_unique_across_batches() {
    let dir = tempfile::tempdir().unwrap();
    let config = fixtures::store_config(&dir);
    let mut store = Store::open(config).unwrap();

    fixtures::seed_staging(
        store.conn(),
        &[
            fixtures::record(&fixtures::order_uuid(1), 1, 10),
            fixtures::record(&fixtures::order_uuid(2), 1, 10),
        ],
    );
    let summary = pipeline::normalize::run(&mut store).unwrap().unwrap();
    assert_eq!(summary.customers_inserted, 1);
    assert_eq!(summary.products_inserted, 1);
    assert_eq!(summary.orders_inserted, 2);

    // Second batch reuses customer 1 / product 10, adds customer 2
    fixtures::seed_staging(
        store.conn(),
        &[
            fixtures::record(&fixtures::order_uuid(3), 1, 10),
            fixtures::record(&fixtures::order_uuid(4), 2, 10),
        ],
    );
    let summary = pipeline::normalize::run(&mut store).unwrap().unwrap();
    assert_eq!(summary.customers_inserted, 1);
    assert_eq!(summary.products_inserted, 0);
    assert_eq!(summary.orders_inserted, 2);

    let customers = snapshot::fetch_customers(store.conn()).unwrap();
    assert_eq!(
        customers.iter().filter(|c| c.id == 1).count(),
        1,
        "Customer id 1 must appear exactly once"
    );
    assert_eq!(snapshot::table_count(store.conn(), "customers").unwrap(), 2);
    assert_eq!(snapshot::table_count(store.conn(), "products").unwrap(), 1);
    assert_eq!(snapshot::table_count(store.conn(), "orders").unwrap(), 4);
}

#[test]
fn staging_is_dropped_even_for_an_empty_batch() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = Store::open(fixtures::store_config(&dir)).unwrap();

    fixtures::seed_staging(store.conn(), &[]);
    assert!(staging::staging_exists(store.conn()).unwrap());

    let summary = pipeline::normalize::run(&mut store).unwrap().unwrap();
    assert_eq!(summary.orders_inserted, 0);
    assert!(!staging::staging_exists(store.conn()).unwrap());
}

#[test]
fn normalize_without_staging_is_a_reported_noop() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = Store::open(fixtures::store_config(&dir)).unwrap();

    assert!(pipeline::normalize::run(&mut store).unwrap().is_none());
}

#[test]
fn malformed_status_aborts_and_rolls_back_the_stage() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = Store::open(fixtures::store_config(&dir)).unwrap();

    let good = fixtures::record(&fixtures::order_uuid(1), 1, 10);
    let bad = fixtures::record(&fixtures::order_uuid(2), 2, 11);
    fixtures::seed_staging_selects(
        store.conn(),
        &[
            fixtures::select_for(&good),
            fixtures::select_with_status(&bad, "Shipped"),
        ],
    );

    let err = pipeline::normalize::run(&mut store).unwrap_err();
    assert!(matches!(err, Error::MalformedRecord(_)));

    // Nothing committed: no partial entity rows, staging still present
    assert_eq!(snapshot::table_count(store.conn(), "customers").unwrap(), 0);
    assert_eq!(snapshot::table_count(store.conn(), "orders").unwrap(), 0);
    assert!(staging::staging_exists(store.conn()).unwrap());
}

#[test]
fn order_rows_survive_reopening_the_store() {
    let dir = tempfile::tempdir().unwrap();
    let config = fixtures::store_config(&dir);

    {
        let mut store = Store::open(config.clone()).unwrap();
        fixtures::seed_staging(
            store.conn(),
            &[fixtures::record(&fixtures::order_uuid(1), 1, 10)],
        );
        pipeline::normalize::run(&mut store).unwrap();
    }

    let store = Store::open(config).unwrap();
    let orders = snapshot::fetch_orders(store.conn()).unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].id, fixtures::order_uuid(1));
    assert_eq!(orders[0].customer_id, 1);
    assert_eq!(orders[0].product_id, 10);
}
