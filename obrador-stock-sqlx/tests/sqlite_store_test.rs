#![cfg(feature = "sqlite")]

use obrador_core::{Product, ProductId, StockPolicy, WeekId};
use obrador_stock::{MaxStockMode, MemoryCatalog, StockKey, StockLedger, StockStore};
use obrador_stock_sqlx::{schema, SqliteStockStore};
use sqlx::sqlite::SqlitePoolOptions;

// ── Fixtures ───────────────────────────────────────────────────────────────

fn week() -> WeekId {
    "2026-W08".parse().unwrap()
}

fn key(id: i64) -> StockKey {
    StockKey::new(ProductId(id), week())
}

async fn store() -> SqliteStockStore {
    // A single connection keeps every statement on the same in-memory
    // database.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    schema::apply(&pool).await.unwrap();
    SqliteStockStore::new(pool)
}

// ── Store contract ─────────────────────────────────────────────────────────

#[tokio::test]
async fn materialize_seeds_once_and_is_idempotent() {
    let store = store().await;
    let row = store.materialize(&key(1), 10).await.unwrap();
    assert_eq!((row.max_stock, row.current_stock, row.reserved_stock), (10, 10, 0));

    // A second materialize with a different allotment must not re-seed.
    let row = store.materialize(&key(1), 99).await.unwrap();
    assert_eq!(row.max_stock, 10);
}

#[tokio::test]
async fn fetch_returns_none_for_missing_rows() {
    let store = store().await;
    assert_eq!(store.fetch(&key(1)).await.unwrap(), None);
}

#[tokio::test]
async fn try_reserve_is_conditional() {
    let store = store().await;
    store.materialize(&key(1), 5).await.unwrap();

    assert!(store.try_reserve(&key(1), 4).await.unwrap());
    assert!(!store.try_reserve(&key(1), 2).await.unwrap());
    assert!(store.try_reserve(&key(1), 1).await.unwrap());

    let row = store.fetch(&key(1)).await.unwrap().unwrap();
    assert_eq!(row.reserved_stock, 5);
    assert!(row.invariant_holds());
}

#[tokio::test]
async fn try_reserve_on_missing_row_is_not_found() {
    let store = store().await;
    assert!(store.try_reserve(&key(9), 1).await.is_err());
}

#[tokio::test]
async fn release_clamps_at_zero() {
    let store = store().await;
    store.materialize(&key(1), 5).await.unwrap();
    store.try_reserve(&key(1), 2).await.unwrap();

    let row = store.release(&key(1), 7).await.unwrap();
    assert_eq!(row.reserved_stock, 0);
    assert!(row.invariant_holds());
}

#[tokio::test]
async fn confirm_decrements_both_counters() {
    let store = store().await;
    store.materialize(&key(1), 10).await.unwrap();
    store.try_reserve(&key(1), 4).await.unwrap();

    let row = store.confirm(&key(1), 4).await.unwrap();
    assert_eq!((row.current_stock, row.reserved_stock), (6, 0));
    assert_eq!(row.sold(), 4);
}

#[tokio::test]
async fn apply_max_stock_preserves_sold_and_reserved() {
    let store = store().await;
    store.materialize(&key(1), 10).await.unwrap();
    store.try_reserve(&key(1), 4).await.unwrap();
    store.confirm(&key(1), 2).await.unwrap();

    // sold = 2, reserved = 2.
    let row = store
        .apply_max_stock(&key(1), 14, MaxStockMode::Reject)
        .await
        .unwrap();
    assert_eq!(row.max_stock, 14);
    assert_eq!(row.sold(), 2);
    assert_eq!(row.reserved_stock, 2);
    assert_eq!(row.available(), 10);
}

#[tokio::test]
async fn apply_max_stock_rejects_below_obligations() {
    let store = store().await;
    store.materialize(&key(1), 15).await.unwrap();
    store.try_reserve(&key(1), 3).await.unwrap();

    let err = store
        .apply_max_stock(&key(1), 2, MaxStockMode::Reject)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        obrador_stock::StockError::Capacity {
            requested: 2,
            required: 3
        }
    ));
    let row = store.fetch(&key(1)).await.unwrap().unwrap();
    assert_eq!((row.max_stock, row.current_stock), (15, 15));
}

#[tokio::test]
async fn apply_max_stock_clamp_raises_to_the_obligation_floor() {
    let store = store().await;
    store.materialize(&key(1), 10).await.unwrap();
    store.try_reserve(&key(1), 4).await.unwrap();
    store.confirm(&key(1), 2).await.unwrap();

    // sold = 2, reserved = 2: the floor is 4.
    let row = store
        .apply_max_stock(&key(1), 1, MaxStockMode::Clamp)
        .await
        .unwrap();
    assert_eq!((row.max_stock, row.current_stock, row.reserved_stock), (4, 2, 2));
    assert_eq!(row.sold(), 2);
    assert!(row.invariant_holds());
}

#[tokio::test]
async fn apply_max_stock_on_missing_row_is_not_found() {
    let store = store().await;
    let err = store
        .apply_max_stock(&key(9), 5, MaxStockMode::Reject)
        .await
        .unwrap_err();
    assert!(matches!(err, obrador_stock::StockError::NotFound(_)));
}

// ── Through the ledger ─────────────────────────────────────────────────────

#[tokio::test]
async fn ledger_scenario_over_sqlite() {
    let catalog = MemoryCatalog::new();
    catalog.upsert(Product {
        id: ProductId(1),
        name: "rye loaf".into(),
        unit_price_cents: 520,
        stock_policy: StockPolicy::Weekly,
        weekly_stock: 10,
        active: true,
    });
    let ledger = StockLedger::new(store().await, catalog);

    assert!(ledger.reserve(ProductId(1), 4, week()).await.unwrap());
    ledger.confirm_sale(ProductId(1), 4, week()).await.unwrap();

    let row = ledger.store().fetch(&key(1)).await.unwrap().unwrap();
    assert_eq!((row.current_stock, row.reserved_stock), (6, 0));
}
