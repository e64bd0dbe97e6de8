//! SQLite persistence layer for the append-only signal ledger.
//!
//! Every operation opens its own connection and drops it when done, so the
//! store holds no state between calls and several processes can share one
//! file. Writers are serialized by SQLite's file lock.

use crate::error::{AppError, Result};
use crate::types::{NewSignalRecord, Signal, SignalRecord};
use chrono::{DateTime, Local, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

const SELECT_COLUMNS: &str = "SELECT id, ticker, price, rsi, macd, signal, created_at FROM signals";

/// SQLite-backed signal ledger.
#[derive(Debug, Clone)]
pub struct SignalStore {
    path: PathBuf,
    busy_timeout: Duration,
}

impl SignalStore {
    /// Create a store for the database file at `path`. Nothing is opened
    /// until the first operation.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            busy_timeout: Duration::from_secs(5),
        }
    }

    /// Set how long an operation waits for another writer's lock.
    pub fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout;
        self
    }

    fn open(&self) -> rusqlite::Result<Connection> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(self.busy_timeout)?;
        Ok(conn)
    }

    /// Create the ledger table if it does not exist yet. Safe to call on
    /// every start.
    pub fn init(&self) -> Result<()> {
        self.init_schema().map_err(AppError::StorageWrite)?;
        info!("Signal ledger ready at {}", self.path.display());
        Ok(())
    }

    fn init_schema(&self) -> rusqlite::Result<()> {
        let conn = self.open()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS signals (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                ticker TEXT,
                price REAL,
                rsi REAL,
                macd REAL,
                signal TEXT,
                created_at TEXT
            )",
            [],
        )?;

        // Index for per-ticker history queries
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_signals_ticker_created
             ON signals(ticker, created_at DESC)",
            [],
        )?;

        Ok(())
    }

    /// Durably append one record and return its id.
    ///
    /// `created_at` defaults to the current time. The write is committed
    /// before this returns.
    pub fn append(&self, record: &NewSignalRecord) -> Result<i64> {
        let created_at = record.created_at.unwrap_or_else(Utc::now);
        let id = self
            .insert(record, created_at)
            .map_err(AppError::StorageWrite)?;

        debug!(
            "Appended signal {} for {} ({})",
            id, record.ticker, record.signal
        );
        Ok(id)
    }

    fn insert(&self, record: &NewSignalRecord, created_at: DateTime<Utc>) -> rusqlite::Result<i64> {
        let mut conn = self.open()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        tx.execute(
            "INSERT INTO signals (ticker, price, rsi, macd, signal, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                record.ticker,
                record.price,
                record.rsi,
                record.macd,
                record.signal.as_str(),
                format_timestamp(&created_at),
            ],
        )?;
        let id = tx.last_insert_rowid();

        tx.commit()?;
        Ok(id)
    }

    /// Up to `limit` records for `ticker`, newest first. Ties on
    /// `created_at` go to the higher id.
    pub fn recent_for(&self, ticker: &str, limit: usize) -> Result<Vec<SignalRecord>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.query(
            &format!(
                "{} WHERE ticker = ?1 ORDER BY created_at DESC, id DESC LIMIT ?2",
                SELECT_COLUMNS
            ),
            params![ticker, limit],
        )
    }

    /// Records for `ticker` created within `[from, to]`, newest first.
    pub fn range_for(
        &self,
        ticker: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<SignalRecord>> {
        self.query(
            &format!(
                "{} WHERE ticker = ?1 AND created_at >= ?2 AND created_at <= ?3
                 ORDER BY created_at DESC, id DESC",
                SELECT_COLUMNS
            ),
            params![ticker, format_timestamp(&from), format_timestamp(&to)],
        )
    }

    /// Get a record by id.
    pub fn get(&self, id: i64) -> Result<Option<SignalRecord>> {
        let read = || -> rusqlite::Result<Option<SignalRecord>> {
            let conn = self.open()?;
            conn.query_row(
                &format!("{} WHERE id = ?1", SELECT_COLUMNS),
                params![id],
                record_from_row,
            )
            .optional()
        };

        read().map_err(AppError::StorageRead)
    }

    /// Number of records stored for `ticker`.
    pub fn count_for(&self, ticker: &str) -> Result<u64> {
        let read = || -> rusqlite::Result<i64> {
            let conn = self.open()?;
            conn.query_row(
                "SELECT COUNT(*) FROM signals WHERE ticker = ?1",
                params![ticker],
                |row| row.get(0),
            )
        };

        read()
            .map(|count| count.max(0) as u64)
            .map_err(AppError::StorageRead)
    }

    fn query<P: rusqlite::Params>(&self, sql: &str, params: P) -> Result<Vec<SignalRecord>> {
        let read = || -> rusqlite::Result<Vec<SignalRecord>> {
            let conn = self.open()?;
            let mut stmt = conn.prepare(sql)?;
            let records = stmt
                .query_map(params, record_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(records)
        };

        read().map_err(AppError::StorageRead)
    }
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<SignalRecord> {
    let signal_text: String = row.get(5)?;
    let signal = Signal::parse(&signal_text).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            5,
            Type::Text,
            format!("unknown signal label {:?}", signal_text).into(),
        )
    })?;

    let created_text: String = row.get(6)?;
    let created_at = parse_timestamp(&created_text).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            6,
            Type::Text,
            format!("unparseable created_at {:?}", created_text).into(),
        )
    })?;

    Ok(SignalRecord {
        id: row.get(0)?,
        ticker: row.get(1)?,
        price: row.get(2)?,
        rsi: row.get(3)?,
        macd: row.get(4)?,
        signal,
        created_at,
    })
}

/// Fixed-width RFC 3339 in UTC, so text order matches time order.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Parse a stored timestamp.
///
/// Naive ISO 8601 values (no offset) come from older ledgers that stamped
/// rows in host local time, so they are read in the local zone. SQL ordering
/// still compares the raw text, which can misplace such rows against newer
/// UTC rows by the host's offset.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.with_timezone(&Utc));
    }

    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").ok()?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|ts| ts.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, NaiveDate};

    struct ScratchDb(PathBuf);

    impl ScratchDb {
        fn new() -> Self {
            Self(std::env::temp_dir().join(format!("coinclerk-{}.db", uuid::Uuid::new_v4())))
        }
    }

    impl Drop for ScratchDb {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(&self.0);
        }
    }

    fn ready_store(db: &ScratchDb) -> SignalStore {
        let store = SignalStore::new(&db.0);
        store.init().unwrap();
        store
    }

    #[test]
    fn test_init_is_idempotent() {
        let db = ScratchDb::new();
        let store = ready_store(&db);
        store.init().unwrap();
        store.init().unwrap();
        assert_eq!(store.count_for("AAPL").unwrap(), 0);
    }

    #[test]
    fn test_append_assigns_increasing_ids() {
        let db = ScratchDb::new();
        let store = ready_store(&db);

        let first = store
            .append(&NewSignalRecord::new("AAPL", 190.0, 45.0, 0.2, Signal::Hold))
            .unwrap();
        let second = store
            .append(&NewSignalRecord::new("AAPL", 191.0, 46.0, 0.3, Signal::Hold))
            .unwrap();

        assert!(second > first);
    }

    #[test]
    fn test_append_stamps_created_at() {
        let db = ScratchDb::new();
        let store = ready_store(&db);
        let before = Utc::now();

        let id = store
            .append(&NewSignalRecord::new("SI=F", 24.5, 28.0, 0.1, Signal::Buy))
            .unwrap();
        let record = store.get(id).unwrap().unwrap();

        assert!(record.created_at >= before);
        assert!(record.created_at <= Utc::now());
    }

    #[test]
    fn test_get_missing_id() {
        let db = ScratchDb::new();
        let store = ready_store(&db);
        assert!(store.get(42).unwrap().is_none());
    }

    #[test]
    fn test_ties_break_by_id() {
        let db = ScratchDb::new();
        let store = ready_store(&db);
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

        let a = store
            .append(&NewSignalRecord::new("CL=F", 80.0, 50.0, 0.0, Signal::Hold).at(at))
            .unwrap();
        let b = store
            .append(&NewSignalRecord::new("CL=F", 81.0, 50.0, 0.0, Signal::Hold).at(at))
            .unwrap();

        let ids: Vec<i64> = store
            .recent_for("CL=F", 50)
            .unwrap()
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![b, a]);
    }

    #[test]
    fn test_range_for() {
        let db = ScratchDb::new();
        let store = ready_store(&db);
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        for day in 0..10 {
            store
                .append(
                    &NewSignalRecord::new("ZW=F", 600.0 + day as f64, 50.0, 0.0, Signal::Hold)
                        .at(start + ChronoDuration::days(day)),
                )
                .unwrap();
        }

        let records = store
            .range_for(
                "ZW=F",
                start + ChronoDuration::days(3),
                start + ChronoDuration::days(5),
            )
            .unwrap();

        let prices: Vec<f64> = records.iter().map(|r| r.price).collect();
        assert_eq!(prices, vec![605.0, 604.0, 603.0]);
    }

    #[test]
    fn test_reads_legacy_rows() {
        let db = ScratchDb::new();
        let store = ready_store(&db);

        let conn = Connection::open(&db.0).unwrap();
        conn.execute(
            "INSERT INTO signals(ticker, price, rsi, macd, signal, created_at)
             VALUES ('GC=F', 2001.5, 72.0, -1.5, 'BÁN', '2024-02-03T04:05:06.789012')",
            [],
        )
        .unwrap();

        let records = store.recent_for("GC=F", 50).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].signal, Signal::Sell);
        let stamped = NaiveDate::from_ymd_opt(2024, 2, 3)
            .unwrap()
            .and_hms_micro_opt(4, 5, 6, 789_012)
            .unwrap();
        assert_eq!(
            records[0].created_at,
            Local
                .from_local_datetime(&stamped)
                .earliest()
                .unwrap()
                .with_timezone(&Utc)
        );
    }

    #[test]
    fn test_parse_naive_timestamp_is_local_time() {
        let stamped = NaiveDate::from_ymd_opt(2023, 7, 14)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        let expected = Local
            .from_local_datetime(&stamped)
            .earliest()
            .unwrap()
            .with_timezone(&Utc);

        assert_eq!(parse_timestamp("2023-07-14T09:30:00"), Some(expected));
        assert_eq!(
            parse_timestamp("2023-07-14T09:30:00Z"),
            Some(Utc.with_ymd_and_hms(2023, 7, 14, 9, 30, 0).unwrap())
        );
    }

    #[test]
    fn test_corrupt_row_is_read_error() {
        let db = ScratchDb::new();
        let store = ready_store(&db);

        let conn = Connection::open(&db.0).unwrap();
        conn.execute(
            "INSERT INTO signals(ticker, price, rsi, macd, signal, created_at)
             VALUES ('HG=F', 4.0, 50.0, 0.0, 'MAYBE', '2024-02-03T04:05:06Z')",
            [],
        )
        .unwrap();

        let err = store.recent_for("HG=F", 50).unwrap_err();
        assert!(matches!(err, AppError::StorageRead(_)));
    }

    #[test]
    fn test_unavailable_medium() {
        let missing_dir = std::env::temp_dir()
            .join(format!("coinclerk-missing-{}", uuid::Uuid::new_v4()))
            .join("signals.db");
        let store = SignalStore::new(&missing_dir);

        let write = store
            .append(&NewSignalRecord::new("AAPL", 1.0, 50.0, 0.0, Signal::Hold))
            .unwrap_err();
        assert!(matches!(write, AppError::StorageWrite(_)));

        let read = store.recent_for("AAPL", 50).unwrap_err();
        assert!(matches!(read, AppError::StorageRead(_)));
    }

    #[test]
    fn test_timestamp_format_round_trip() {
        let ts = Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 59).unwrap()
            + ChronoDuration::nanoseconds(123_456_789);
        let text = format_timestamp(&ts);

        assert_eq!(text, "2024-12-31T23:59:59.123456789Z");
        assert_eq!(parse_timestamp(&text), Some(ts));
        assert_eq!(parse_timestamp("not a date"), None);
    }
}
