//! Signal ledger tests against real SQLite files

use chrono::{Duration, TimeZone, Utc};
use coinclerk::services::SignalStore;
use coinclerk::types::{NewSignalRecord, Signal};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

struct ScratchDb(PathBuf);

impl ScratchDb {
    fn new() -> Self {
        Self(std::env::temp_dir().join(format!("coinclerk-it-{}.db", uuid::Uuid::new_v4())))
    }

    fn store(&self) -> SignalStore {
        let store = SignalStore::new(&self.0);
        store.init().unwrap();
        store
    }
}

impl Drop for ScratchDb {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}

#[test]
fn test_append_then_recent_returns_it_first() {
    let db = ScratchDb::new();
    let store = db.store();

    store
        .append(&NewSignalRecord::new("AAPL", 189.5, 41.0, -0.3, Signal::Hold))
        .unwrap();
    let id = store
        .append(&NewSignalRecord::new("AAPL", 190.25, 28.5, 0.7, Signal::Buy))
        .unwrap();

    let records = store.recent_for("AAPL", 50).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].id, id);
    assert_eq!(records[0].signal, Signal::Buy);
}

#[test]
fn test_limit_returns_most_recent_first() {
    let db = ScratchDb::new();
    let store = db.store();
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();

    for i in 0..12 {
        store
            .append(
                &NewSignalRecord::new("PL=F", 900.0 + i as f64, 50.0, 0.0, Signal::Hold)
                    .at(start + Duration::minutes(i)),
            )
            .unwrap();
    }

    let records = store.recent_for("PL=F", 5).unwrap();
    assert_eq!(records.len(), 5);

    let prices: Vec<f64> = records.iter().map(|r| r.price).collect();
    assert_eq!(prices, vec![911.0, 910.0, 909.0, 908.0, 907.0]);
    assert!(records
        .windows(2)
        .all(|w| w[0].created_at >= w[1].created_at));
}

#[test]
fn test_order_follows_created_at_not_insertion() {
    let db = ScratchDb::new();
    let store = db.store();
    let now = Utc.with_ymd_and_hms(2024, 8, 1, 0, 0, 0).unwrap();

    let later = store
        .append(&NewSignalRecord::new("ZC=F", 4.1, 50.0, 0.0, Signal::Hold).at(now))
        .unwrap();
    let earlier = store
        .append(
            &NewSignalRecord::new("ZC=F", 4.0, 50.0, 0.0, Signal::Hold)
                .at(now - Duration::hours(1)),
        )
        .unwrap();

    let ids: Vec<i64> = store
        .recent_for("ZC=F", 50)
        .unwrap()
        .iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(ids, vec![later, earlier]);
}

#[test]
fn test_unknown_ticker_is_empty() {
    let db = ScratchDb::new();
    let store = db.store();

    store
        .append(&NewSignalRecord::new("AAPL", 190.0, 50.0, 0.0, Signal::Hold))
        .unwrap();

    assert!(store.recent_for("MSFT", 50).unwrap().is_empty());
    assert_eq!(store.count_for("MSFT").unwrap(), 0);
}

#[test]
fn test_round_trip_is_exact() {
    let db = ScratchDb::new();
    let store = db.store();
    let at = Utc.with_ymd_and_hms(2025, 2, 14, 8, 15, 30).unwrap() + Duration::nanoseconds(987_654_321);

    let id = store
        .append(&NewSignalRecord::new(
            "NG=F",
            2.718281828459045,
            71.23456789012345,
            -0.000123456789,
            Signal::Sell,
        )
        .at(at))
        .unwrap();

    let record = store.get(id).unwrap().unwrap();
    assert_eq!(record.ticker, "NG=F");
    assert_eq!(record.price, 2.718281828459045);
    assert_eq!(record.rsi, 71.23456789012345);
    assert_eq!(record.macd, -0.000123456789);
    assert_eq!(record.signal, Signal::Sell);
    assert_eq!(record.created_at, at);
}

#[test]
fn test_records_survive_reopen() {
    let db = ScratchDb::new();
    let id = db
        .store()
        .append(&NewSignalRecord::new("GC=F", 2010.0, 65.0, 1.2, Signal::Hold))
        .unwrap();

    // A fresh handle on the same file, as after a restart
    let reopened = db.store();
    assert_eq!(reopened.get(id).unwrap().unwrap().price, 2010.0);
}

#[test]
fn test_concurrent_writers() {
    let db = ScratchDb::new();
    db.store();
    let path = Arc::new(db.0.clone());

    let handles: Vec<_> = (0..4)
        .map(|writer| {
            let path = Arc::clone(&path);
            thread::spawn(move || {
                let store = SignalStore::new(path.as_path());
                (0..25)
                    .map(|i| {
                        store
                            .append(&NewSignalRecord::new(
                                "SPY",
                                500.0 + writer as f64 + i as f64 / 100.0,
                                50.0,
                                0.0,
                                Signal::Hold,
                            ))
                            .unwrap()
                    })
                    .collect::<Vec<i64>>()
            })
        })
        .collect();

    let mut ids: Vec<i64> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    ids.sort_unstable();
    ids.dedup();

    let store = SignalStore::new(path.as_path());
    assert_eq!(ids.len(), 100);
    assert_eq!(store.count_for("SPY").unwrap(), 100);
    assert_eq!(store.recent_for("SPY", 1000).unwrap().len(), 100);
}
