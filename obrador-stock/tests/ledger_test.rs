use obrador_core::{Product, ProductId, StockPolicy, WeekId};
use obrador_stock::{
    MemoryCatalog, MemoryStockStore, StockError, StockKey, StockLedger, StockStore,
};

// ── Fixtures ───────────────────────────────────────────────────────────────

const WEEK: &str = "2026-W08";

fn week() -> WeekId {
    WEEK.parse().unwrap()
}

fn weekly_product(id: i64, allotment: i64) -> Product {
    Product {
        id: ProductId(id),
        name: format!("sourdough-{id}"),
        unit_price_cents: 450,
        stock_policy: StockPolicy::Weekly,
        weekly_stock: allotment,
        active: true,
    }
}

fn ledger_with(products: &[Product]) -> StockLedger<MemoryStockStore, MemoryCatalog> {
    let catalog = MemoryCatalog::new();
    for p in products {
        catalog.upsert(p.clone());
    }
    StockLedger::new(MemoryStockStore::new(), catalog)
}

async fn row_of(
    ledger: &StockLedger<MemoryStockStore, MemoryCatalog>,
    id: i64,
) -> obrador_stock::WeeklyStockRecord {
    ledger
        .store()
        .fetch(&StockKey::new(ProductId(id), week()))
        .await
        .unwrap()
        .expect("row materialized")
}

// ── Reserve / confirm arithmetic ───────────────────────────────────────────

#[tokio::test]
async fn reserve_then_confirm_depletes_current_stock() {
    let ledger = ledger_with(&[weekly_product(1, 10)]);

    assert!(ledger.reserve(ProductId(1), 4, week()).await.unwrap());
    let row = row_of(&ledger, 1).await;
    assert_eq!((row.current_stock, row.reserved_stock), (10, 4));

    ledger.confirm_sale(ProductId(1), 4, week()).await.unwrap();
    let row = row_of(&ledger, 1).await;
    assert_eq!((row.current_stock, row.reserved_stock), (6, 0));
    assert_eq!(row.sold(), 4);
    assert!(row.invariant_holds());
}

#[tokio::test]
async fn reserve_release_round_trip_is_exact() {
    let ledger = ledger_with(&[weekly_product(1, 10)]);
    assert!(ledger.reserve(ProductId(1), 3, week()).await.unwrap());
    let before = row_of(&ledger, 1).await;
    assert!(ledger.reserve(ProductId(1), 2, week()).await.unwrap());
    ledger.release(ProductId(1), 2, week()).await.unwrap();
    assert_eq!(row_of(&ledger, 1).await, before);
}

#[tokio::test]
async fn reserving_the_last_unit_succeeds() {
    let ledger = ledger_with(&[weekly_product(1, 5)]);
    assert!(ledger.reserve(ProductId(1), 5, week()).await.unwrap());
    let row = row_of(&ledger, 1).await;
    assert_eq!(row.reserved_stock, 5);
    assert_eq!(row.available(), 0);
}

#[tokio::test]
async fn reserving_beyond_available_fails_and_leaves_counters_unchanged() {
    let ledger = ledger_with(&[weekly_product(1, 5)]);
    assert!(ledger.reserve(ProductId(1), 3, week()).await.unwrap());
    let before = row_of(&ledger, 1).await;

    assert!(!ledger.reserve(ProductId(1), 3, week()).await.unwrap());
    assert_eq!(row_of(&ledger, 1).await, before);
}

#[tokio::test]
async fn release_clamps_at_zero() {
    let ledger = ledger_with(&[weekly_product(1, 5)]);
    assert!(ledger.reserve(ProductId(1), 2, week()).await.unwrap());
    ledger.release(ProductId(1), 9, week()).await.unwrap();
    let row = row_of(&ledger, 1).await;
    assert_eq!(row.reserved_stock, 0);
    assert!(row.invariant_holds());
}

#[tokio::test]
async fn raw_double_confirm_double_decrements() {
    // The ledger op is a plain decrement pair; the idempotence guard lives
    // in the checkout orchestrator. Applied twice it depletes twice.
    let ledger = ledger_with(&[weekly_product(1, 10)]);
    assert!(ledger.reserve(ProductId(1), 4, week()).await.unwrap());
    ledger.confirm_sale(ProductId(1), 4, week()).await.unwrap();
    ledger.confirm_sale(ProductId(1), 4, week()).await.unwrap();
    let row = row_of(&ledger, 1).await;
    assert_eq!(row.current_stock, 2);
    assert_eq!(row.reserved_stock, 0);
}

// ── Availability ───────────────────────────────────────────────────────────

#[tokio::test]
async fn check_availability_reports_current_free_pool() {
    let ledger = ledger_with(&[weekly_product(1, 8)]);
    assert!(ledger.reserve(ProductId(1), 3, week()).await.unwrap());

    let availability = ledger
        .check_availability(ProductId(1), 5, week())
        .await
        .unwrap();
    assert!(availability.available);
    assert_eq!(availability.current_available, Some(5));

    let availability = ledger
        .check_availability(ProductId(1), 6, week())
        .await
        .unwrap();
    assert!(!availability.available);
}

#[tokio::test]
async fn check_availability_materializes_the_row_lazily() {
    let ledger = ledger_with(&[weekly_product(1, 8)]);
    ledger
        .check_availability(ProductId(1), 1, week())
        .await
        .unwrap();
    assert_eq!(row_of(&ledger, 1).await.max_stock, 8);
}

#[tokio::test]
async fn unknown_product_is_not_found() {
    let ledger = ledger_with(&[]);
    let err = ledger
        .check_availability(ProductId(99), 1, week())
        .await
        .unwrap_err();
    assert!(matches!(err, StockError::NotFound(_)));
}

#[tokio::test]
async fn non_positive_quantity_is_rejected_before_touching_the_store() {
    let ledger = ledger_with(&[weekly_product(1, 8)]);
    let err = ledger.reserve(ProductId(1), 0, week()).await.unwrap_err();
    assert!(matches!(err, StockError::Validation(_)));
    assert_eq!(ledger.store().row_count(), 0);
}

// ── Unlimited products ─────────────────────────────────────────────────────

#[tokio::test]
async fn unlimited_products_never_materialize_a_row() {
    let mut p = weekly_product(7, 0);
    p.stock_policy = StockPolicy::Unlimited;
    let ledger = ledger_with(&[p]);

    let availability = ledger
        .check_availability(ProductId(7), 500, week())
        .await
        .unwrap();
    assert!(availability.available);
    assert_eq!(availability.current_available, None);

    assert!(ledger.reserve(ProductId(7), 500, week()).await.unwrap());
    ledger.confirm_sale(ProductId(7), 500, week()).await.unwrap();
    ledger.release(ProductId(7), 500, week()).await.unwrap();
    assert_eq!(ledger.store().row_count(), 0);
}

// ── The last-unit race ─────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_reservations_for_the_last_unit_have_one_winner() {
    let ledger = ledger_with(&[weekly_product(1, 5)]);
    assert!(ledger.reserve(ProductId(1), 4, week()).await.unwrap());

    let a = {
        let ledger = ledger.clone();
        tokio::spawn(async move { ledger.reserve(ProductId(1), 1, week()).await.unwrap() })
    };
    let b = {
        let ledger = ledger.clone();
        tokio::spawn(async move { ledger.reserve(ProductId(1), 1, week()).await.unwrap() })
    };
    let (a, b) = (a.await.unwrap(), b.await.unwrap());

    assert!(a ^ b, "exactly one racer may win the last unit");
    let row = row_of(&ledger, 1).await;
    assert_eq!(row.reserved_stock, 5);
    assert!(row.invariant_holds());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn oversubscribed_hammer_never_oversells() {
    let ledger = ledger_with(&[weekly_product(1, 10)]);
    ledger
        .check_availability(ProductId(1), 1, week())
        .await
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..100 {
        let ledger = ledger.clone();
        handles.push(tokio::spawn(async move {
            ledger.reserve(ProductId(1), 1, week()).await.unwrap()
        }));
    }
    let mut wins = 0;
    for handle in handles {
        if handle.await.unwrap() {
            wins += 1;
        }
    }

    assert_eq!(wins, 10);
    let row = row_of(&ledger, 1).await;
    assert_eq!(row.reserved_stock, 10);
    assert_eq!(row.available(), 0);
    assert!(row.invariant_holds());
}

// ── Resync and max-stock edits ─────────────────────────────────────────────

#[tokio::test]
async fn resync_creates_missing_rows_and_reseats_existing_ones() {
    let catalog = MemoryCatalog::new();
    catalog.upsert(weekly_product(1, 10));
    catalog.upsert(weekly_product(2, 6));
    let ledger = StockLedger::new(MemoryStockStore::new(), catalog.clone());

    // Product 1 already has a row with activity; product 2 has none.
    assert!(ledger.reserve(ProductId(1), 2, week()).await.unwrap());
    ledger.confirm_sale(ProductId(1), 2, week()).await.unwrap();

    // Admin raises product 1's weekly allotment to 14.
    catalog.upsert(weekly_product(1, 14));
    let summary = ledger.resync_weekly_stock(week()).await.unwrap();
    assert_eq!((summary.created, summary.updated), (1, 1));

    let row = row_of(&ledger, 1).await;
    assert_eq!(row.max_stock, 14);
    assert_eq!(row.sold(), 2);
    assert_eq!(row.current_stock, 12);
    assert_eq!(row_of(&ledger, 2).await.max_stock, 6);
}

#[tokio::test]
async fn resync_twice_is_a_noop_on_current_stock() {
    let catalog = MemoryCatalog::new();
    catalog.upsert(weekly_product(1, 10));
    let ledger = StockLedger::new(MemoryStockStore::new(), catalog);

    assert!(ledger.reserve(ProductId(1), 3, week()).await.unwrap());
    ledger.resync_weekly_stock(week()).await.unwrap();
    let first = row_of(&ledger, 1).await;
    ledger.resync_weekly_stock(week()).await.unwrap();
    assert_eq!(row_of(&ledger, 1).await, first);
}

#[tokio::test]
async fn resync_preserves_in_flight_holds() {
    let catalog = MemoryCatalog::new();
    catalog.upsert(weekly_product(1, 10));
    let ledger = StockLedger::new(MemoryStockStore::new(), catalog.clone());

    assert!(ledger.reserve(ProductId(1), 4, week()).await.unwrap());
    catalog.upsert(weekly_product(1, 12));
    ledger.resync_weekly_stock(week()).await.unwrap();

    let row = row_of(&ledger, 1).await;
    assert_eq!(row.reserved_stock, 4);
    assert_eq!(row.max_stock, 12);
    assert_eq!(row.available(), 8);
}

#[tokio::test]
async fn set_max_stock_with_nothing_sold() {
    let ledger = ledger_with(&[weekly_product(1, 20)]);
    let row = ledger
        .set_max_stock(ProductId(1), week(), 15)
        .await
        .unwrap();
    assert_eq!((row.max_stock, row.current_stock), (15, 15));
}

#[tokio::test]
async fn set_max_stock_below_obligations_is_rejected() {
    let ledger = ledger_with(&[weekly_product(1, 15)]);
    assert!(ledger.reserve(ProductId(1), 3, week()).await.unwrap());

    let err = ledger
        .set_max_stock(ProductId(1), week(), 2)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StockError::Capacity {
            requested: 2,
            required: 3
        }
    ));
    // Counters untouched by the rejected edit.
    let row = row_of(&ledger, 1).await;
    assert_eq!((row.max_stock, row.current_stock, row.reserved_stock), (15, 15, 3));
}

#[tokio::test]
async fn set_max_stock_rejects_negative_values() {
    let ledger = ledger_with(&[weekly_product(1, 5)]);
    let err = ledger
        .set_max_stock(ProductId(1), week(), -1)
        .await
        .unwrap_err();
    assert!(matches!(err, StockError::Validation(_)));
}

// ── Week isolation ─────────────────────────────────────────────────────────

#[tokio::test]
async fn different_weeks_are_independent() {
    let ledger = ledger_with(&[weekly_product(1, 5)]);
    let next_week: WeekId = "2026-W09".parse().unwrap();

    assert!(ledger.reserve(ProductId(1), 5, week()).await.unwrap());
    assert!(!ledger.reserve(ProductId(1), 1, week()).await.unwrap());
    assert!(ledger.reserve(ProductId(1), 5, next_week).await.unwrap());
}
