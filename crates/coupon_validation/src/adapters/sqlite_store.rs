// Rust guideline compliant 2026-10-12

//! SQLite adapter for the `PromotionLookup` and `ScanLog` ports.
//!
//! One database file holds two tables: `promotions` (read by the engine,
//! written by `seed`) and `scan_logs` (append-only audit trail, read by
//! `history`). Times of day are stored as `HH:MM` text, dates as
//! `YYYY-MM-DD`, scan timestamps as `YYYY-MM-DD HH:MM:SS` so that text
//! ordering matches chronological ordering.
//!
//! # Corrupt rows
//!
//! A promotion whose start or end time cannot be parsed is served with that
//! bound missing, which the engine classifies as `NOT_FOUND`. An unparsable
//! `validity_until` is reported as `LookupError::Unavailable`, which the
//! engine also classifies as `NOT_FOUND`.

use chrono::{NaiveDate, NaiveTime};
use domain::{
    Coordinate, LookupError, PromotionLookup, PromotionRecord, ScanAttempt, ScanLog,
    ScanLogError, Status,
};

const TIME_FORMAT: &str = "%H:%M";
const DATE_FORMAT: &str = "%Y-%m-%d";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Raw `promotions` row as selected by [`SqliteStore::lookup`].
type PromotionRow = (
    String,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    f64,
    f64,
    String,
);

/// One line of the scan history report.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanHistoryEntry {
    /// Scan timestamp as stored.
    pub scanned_at: String,
    /// Identifier the scan resolved to (may be empty).
    pub promotion_id: String,
    /// Title of the promotion, if it still exists.
    pub title: Option<String>,
    /// Returned status; `None` if the stored code is unknown.
    pub status: Option<Status>,
    /// Returned message.
    pub reason: String,
}

/// Store backed by a SQLite database file via `sqlx`.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: sqlx::SqlitePool,
}

impl SqliteStore {
    /// Open or create a SQLite database and initialize the schema.
    ///
    /// Both tables are created with `CREATE TABLE IF NOT EXISTS`, making
    /// repeated calls safe.
    ///
    /// # Errors
    ///
    /// Returns `sqlx::Error` when the connection or schema creation fails.
    pub async fn new(db_url: &str) -> Result<Self, sqlx::Error> {
        // sqlx 0.8 defaults to create_if_missing(false) for file databases.
        Self::connect(db_url, true).await
    }

    /// Open a database that must already exist; a missing file is an error.
    ///
    /// Used by read-only commands so a mistyped URL does not leave an empty
    /// database behind.
    ///
    /// # Errors
    ///
    /// Returns `sqlx::Error` when the file is missing, or when the connection
    /// or schema check fails.
    pub async fn open_existing(db_url: &str) -> Result<Self, sqlx::Error> {
        Self::connect(db_url, false).await
    }

    async fn connect(db_url: &str, create: bool) -> Result<Self, sqlx::Error> {
        let opts = db_url
            .parse::<sqlx::sqlite::SqliteConnectOptions>()?
            .create_if_missing(create);
        let pool = sqlx::SqlitePool::connect_with(opts).await?;
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS promotions (
                id              TEXT    PRIMARY KEY,
                title           TEXT    NOT NULL,
                start_time      TEXT,             -- HH:MM, NULL = not configured
                end_time        TEXT,             -- HH:MM, NULL = not configured
                validity_until  TEXT,             -- YYYY-MM-DD
                latitude        REAL    NOT NULL,
                longitude       REAL    NOT NULL,
                image_reference TEXT    NOT NULL DEFAULT ''
            )",
        )
        .execute(&pool)
        .await?;
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS scan_logs (
                id           TEXT    PRIMARY KEY,
                promotion_id TEXT    NOT NULL,
                scanned_at   TEXT    NOT NULL,
                latitude     REAL,
                longitude    REAL,
                status       INTEGER NOT NULL,  -- 1..=5
                is_valid     INTEGER NOT NULL,
                reason       TEXT    NOT NULL
            )",
        )
        .execute(&pool)
        .await?;
        Ok(Self { pool })
    }

    /// Insert `record`, replacing any promotion with the same id.
    ///
    /// # Errors
    ///
    /// Returns `sqlx::Error` on any database failure.
    pub async fn upsert_promotion(&self, record: &PromotionRecord) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT OR REPLACE INTO promotions
             (id, title, start_time, end_time, validity_until,
              latitude, longitude, image_reference)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.id)
        .bind(&record.title)
        .bind(record.start_time.map(|t| t.format(TIME_FORMAT).to_string()))
        .bind(record.end_time.map(|t| t.format(TIME_FORMAT).to_string()))
        .bind(record.validity_until.map(|d| d.format(DATE_FORMAT).to_string()))
        .bind(record.location.latitude)
        .bind(record.location.longitude)
        .bind(&record.image_reference)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Most recent scan attempts first, joined with promotion titles.
    ///
    /// # Errors
    ///
    /// Returns `sqlx::Error` on any database failure.
    pub async fn recent_scans(&self, limit: u32) -> Result<Vec<ScanHistoryEntry>, sqlx::Error> {
        let rows: Vec<(String, String, Option<String>, i64, String)> = sqlx::query_as(
            "SELECT s.scanned_at, s.promotion_id, p.title, s.status, s.reason
             FROM scan_logs s
             LEFT JOIN promotions p ON p.id = s.promotion_id
             ORDER BY s.scanned_at DESC, s.rowid DESC
             LIMIT ?",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(scanned_at, promotion_id, title, status, reason)| ScanHistoryEntry {
                scanned_at,
                promotion_id,
                title,
                status: u8::try_from(status).ok().and_then(Status::from_code),
                reason,
            })
            .collect())
    }
}

/// Accepts `HH:MM` and `HH:MM:SS`.
fn parse_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, TIME_FORMAT))
        .ok()
}

fn parse_bound(id: &str, column: &str, raw: Option<String>) -> Option<NaiveTime> {
    let raw = raw?;
    let parsed = parse_time(&raw);
    if parsed.is_none() {
        tracing::warn!(promotion_id = %id, column, value = %raw, "sqlite.lookup.bad_time");
    }
    parsed
}

impl PromotionLookup for SqliteStore {
    /// Fetch the promotion with the given `id`.
    ///
    /// # Errors
    ///
    /// Returns `LookupError::NotFound` when no row matches, or
    /// `LookupError::Unavailable` on any `sqlx` error or an unparsable
    /// `validity_until`. The underlying error is logged at `error` level.
    async fn lookup(&self, id: &str) -> Result<PromotionRecord, LookupError> {
        let row: Option<PromotionRow> = sqlx::query_as(
            "SELECT id, title, start_time, end_time, validity_until,
                    latitude, longitude, image_reference
             FROM promotions WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("sqlite.lookup: {e}");
            LookupError::Unavailable { reason: e.to_string() }
        })?;

        let Some((id, title, start, end, until, latitude, longitude, image_reference)) = row else {
            return Err(LookupError::NotFound { id: id.to_owned() });
        };

        let validity_until = until
            .map(|raw| {
                NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|e| {
                    tracing::error!("sqlite.lookup: bad validity_until {raw:?} for {id}: {e}");
                    LookupError::Unavailable {
                        reason: format!("corrupt validity_until for promotion {id}"),
                    }
                })
            })
            .transpose()?;

        Ok(PromotionRecord {
            start_time: parse_bound(&id, "start_time", start),
            end_time: parse_bound(&id, "end_time", end),
            id,
            title,
            validity_until,
            location: Coordinate::new(latitude, longitude),
            image_reference,
        })
    }
}

impl ScanLog for SqliteStore {
    /// Append `attempt` to the `scan_logs` table.
    ///
    /// # Errors
    ///
    /// Returns `ScanLogError::Unavailable` on any `sqlx` error. The
    /// underlying error is logged at `error` level before mapping.
    async fn append(&self, attempt: &ScanAttempt) -> Result<(), ScanLogError> {
        sqlx::query(
            "INSERT INTO scan_logs
             (id, promotion_id, scanned_at, latitude, longitude, status, is_valid, reason)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(attempt.id.to_string())
        .bind(&attempt.promotion_id)
        .bind(attempt.timestamp.format(TIMESTAMP_FORMAT).to_string())
        .bind(attempt.reported_location.map(|c| c.latitude))
        .bind(attempt.reported_location.map(|c| c.longitude))
        .bind(i64::from(attempt.status.code()))
        .bind(i64::from(attempt.is_valid()))
        .bind(&attempt.reason)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("sqlite.append: {e}");
            ScanLogError::Unavailable { reason: e.to_string() }
        })?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::SqliteStore;
    use crate::adapters::in_memory_catalog::demo_promotions;
    use chrono::{NaiveDate, NaiveDateTime};
    use domain::{
        Coordinate, LookupError, Outcome, PromotionLookup as _, ScanAttempt, ScanLog as _,
        ScanRequest, Status, Validation,
    };
    use redemption::{Validator, ValidatorConfig};

    // Each call opens a fresh pool on its own in-memory database, so tests
    // are isolated and leave nothing on disk.
    async fn make_store() -> SqliteStore {
        SqliteStore::new("sqlite::memory:")
            .await
            .expect("in-memory SQLite should open")
    }

    async fn seeded_store() -> SqliteStore {
        let store = make_store().await;
        for record in demo_promotions() {
            store.upsert_promotion(&record).await.unwrap();
        }
        store
    }

    fn at(hour: u32, minute: u32, second: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 18)
            .and_then(|d| d.and_hms_opt(hour, minute, second))
            .unwrap()
    }

    fn attempt(promotion_id: &str, now: NaiveDateTime, outcome: Outcome) -> ScanAttempt {
        let request = ScanRequest {
            payload: promotion_id.to_owned(),
            location: Some(Coordinate::new(-17.3930, -66.1572)),
            now,
        };
        ScanAttempt::record(promotion_id, &request, &Validation::new(outcome, "test"))
    }

    #[tokio::test]
    async fn open_existing_does_not_create_missing_file() {
        let path = std::env::temp_dir()
            .join(format!("coupon_validation_missing_{}.db", std::process::id()));
        let url = format!("sqlite://{}", path.display());

        assert!(SqliteStore::open_existing(&url).await.is_err());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn open_existing_reads_seeded_file() {
        let path = std::env::temp_dir()
            .join(format!("coupon_validation_seeded_{}.db", std::process::id()));
        let url = format!("sqlite://{}", path.display());
        let store = SqliteStore::new(&url).await.unwrap();
        store.upsert_promotion(&demo_promotions()[0]).await.unwrap();
        drop(store);

        let reopened = SqliteStore::open_existing(&url).await.unwrap();
        let found = reopened.lookup(&demo_promotions()[0].id).await;
        drop(reopened);
        let _ = std::fs::remove_file(&path);

        assert!(found.is_ok());
    }

    #[tokio::test]
    async fn promotion_round_trips() {
        let store = seeded_store().await;
        for expected in demo_promotions() {
            let actual = store.lookup(&expected.id).await.unwrap();
            assert_eq!(actual, expected);
        }
    }

    #[tokio::test]
    async fn unknown_promotion_is_not_found() {
        let store = seeded_store().await;
        let result = store.lookup("nope").await;
        assert!(matches!(result, Err(LookupError::NotFound { .. })), "got {result:?}");
    }

    #[tokio::test]
    async fn seconds_in_stored_times_are_accepted() {
        let store = make_store().await;
        sqlx::query(
            "INSERT INTO promotions (id, title, start_time, end_time, latitude, longitude)
             VALUES ('P', 'T', '09:00:00', '21:00:00', 0.0, 0.0)",
        )
        .execute(&store.pool)
        .await
        .unwrap();

        let record = store.lookup("P").await.unwrap();
        assert!(record.daily_window().is_some());
        assert_eq!(record.image_reference, "");
    }

    #[tokio::test]
    async fn garbage_time_is_served_as_unconfigured() {
        let store = make_store().await;
        sqlx::query(
            "INSERT INTO promotions (id, title, start_time, end_time, latitude, longitude)
             VALUES ('P', 'T', 'nine', '21:00', 0.0, 0.0)",
        )
        .execute(&store.pool)
        .await
        .unwrap();

        let record = store.lookup("P").await.unwrap();
        assert_eq!(record.start_time, None);
        assert!(record.end_time.is_some());
    }

    #[tokio::test]
    async fn garbage_validity_date_is_unavailable() {
        let store = make_store().await;
        sqlx::query(
            "INSERT INTO promotions (id, title, start_time, end_time, validity_until, latitude, longitude)
             VALUES ('P', 'T', '09:00', '21:00', 'someday', 0.0, 0.0)",
        )
        .execute(&store.pool)
        .await
        .unwrap();

        let result = store.lookup("P").await;
        assert!(matches!(result, Err(LookupError::Unavailable { .. })), "got {result:?}");
    }

    #[tokio::test]
    async fn append_stores_status_and_validity_flag() {
        let store = make_store().await;
        let valid = attempt("P1", at(10, 0, 0), Outcome::Valid {
            title: "t".to_owned(),
            image_reference: "i".to_owned(),
        });
        store.append(&valid).await.unwrap();

        let (status, is_valid): (i64, i64) =
            sqlx::query_as("SELECT status, is_valid FROM scan_logs WHERE id = ?")
                .bind(valid.id.to_string())
                .fetch_one(&store.pool)
                .await
                .unwrap();
        assert_eq!(status, 1);
        assert_eq!(is_valid, 1);
    }

    #[tokio::test]
    async fn history_is_newest_first_with_titles() {
        let store = seeded_store().await;
        store.append(&attempt("EXPIRED-001", at(10, 0, 0), Outcome::Expired)).await.unwrap();
        store.append(&attempt("ghost", at(11, 0, 0), Outcome::NotFound)).await.unwrap();
        store.append(&attempt("EXPIRED-001", at(9, 0, 0), Outcome::Expired)).await.unwrap();

        let history = store.recent_scans(2).await.unwrap();

        assert_eq!(history.len(), 2);
        assert_eq!(history[0].promotion_id, "ghost");
        assert_eq!(history[0].title, None);
        assert_eq!(history[0].status, Some(Status::NotFound));
        assert_eq!(history[1].scanned_at, "2026-10-18 10:00:00");
        assert_eq!(history[1].title.as_deref(), Some("Promo Expirada"));
    }

    #[tokio::test]
    async fn validator_writes_through_both_ports() {
        let store = seeded_store().await;
        let validator = Validator::new(ValidatorConfig::builder().build().unwrap());
        let request = ScanRequest {
            payload: "https://cupones.example/v?id=115a13c3-bb80-4cd3-8a8f-3afcf5fb7584".to_owned(),
            location: Some(Coordinate::new(-17.3930, -66.1572)),
            now: at(10, 0, 0),
        };

        let result = validator.validate(&store, &store, &request).await;

        assert_eq!(result.status(), Status::Valid);
        let history = store.recent_scans(10).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].title.as_deref(), Some("Combo Estudiantil 2x1"));
    }
}
