//! Storage layer for caffeine logs.
//!
//! Persists consumption events, sleep check-ins, preferences and the set of
//! badges the user has already been shown, using `rusqlite`. [`Database`]
//! implements the `cf-core` source traits so the engine can read from it
//! directly.
//!
//! # Thread Safety
//!
//! [`Database`] wraps a `rusqlite::Connection`, which is `Send` but not
//! `Sync`. Move it between threads freely; share it behind a `Mutex`.
//!
//! # Schema
//!
//! Timestamps are TEXT in RFC 3339 with millisecond precision and a `Z`
//! suffix (e.g. `2025-01-15T08:30:00.000Z`), so lexicographic order matches
//! chronological order and range queries can compare strings. Check-in dates
//! are local calendar dates as `YYYY-MM-DD`.
//!
//! Rows that cannot be read back (bad timestamps, empty IDs, negative amounts,
//! values of the wrong type) are skipped with a warning rather than failing
//! the whole listing.

use std::collections::HashSet;
use std::path::Path;

use cf_core::{
    BadgeId, CheckinSource, ConsumptionEvent, EventId, EventSource, PreferenceSource, Preferences,
    SensitivityPreference, SleepCheckin, SleepQuality, SubstanceId, format_time_of_day,
    parse_time_of_day,
};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::{Connection, ErrorCode, OptionalExtension, params};
use thiserror::Error;

const DATE_FORMAT: &str = "%Y-%m-%d";

const PREF_BEDTIME: &str = "bedtime";
const PREF_DAILY_LIMIT: &str = "daily_limit_mg";
const PREF_SENSITIVITY: &str = "sensitivity";

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A check-in already exists for this date.
    #[error("a sleep check-in already exists for {date}")]
    DuplicateCheckin { date: NaiveDate },
    /// An event with this ID already exists.
    #[error("event {id} already exists")]
    DuplicateEvent { id: String },
    /// No event with this ID.
    #[error("no event with id {id}")]
    UnknownEvent { id: String },
    /// Failed to parse a stored timestamp.
    #[error("invalid timestamp for {record}: {timestamp}")]
    TimestampParse {
        record: String,
        timestamp: String,
        #[source]
        source: chrono::ParseError,
    },
    /// A stored value that does not fit the domain.
    #[error("invalid value for {record}: {message}")]
    InvalidValue { record: String, message: String },
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

/// An event row as stored.
struct EventRow {
    id: String,
    substance_id: String,
    display_name: String,
    caffeine_mg: f64,
    consumed_at: String,
    logged_at: String,
}

impl EventRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            substance_id: row.get(1)?,
            display_name: row.get(2)?,
            caffeine_mg: row.get(3)?,
            consumed_at: row.get(4)?,
            logged_at: row.get(5)?,
        })
    }

    fn into_event(self) -> Result<ConsumptionEvent, DbError> {
        let record = format!("event {}", self.id);
        let invalid = |message: String| DbError::InvalidValue {
            record: record.clone(),
            message,
        };
        let consumed_at = parse_timestamp(&self.consumed_at, &record)?;
        let logged_at = parse_timestamp(&self.logged_at, &record)?;
        let id = EventId::new(self.id.as_str()).map_err(|e| invalid(e.to_string()))?;
        let substance_id =
            SubstanceId::new(self.substance_id.as_str()).map_err(|e| invalid(e.to_string()))?;
        ConsumptionEvent::new(
            id,
            substance_id,
            self.display_name,
            self.caffeine_mg,
            consumed_at,
            logged_at,
        )
        .map_err(|e| invalid(e.to_string()))
    }
}

/// A check-in row as stored.
struct CheckinRow {
    date: String,
    quality: String,
    yesterday_caffeine_mg: f64,
    yesterday_last_coffee_hour: Option<u32>,
    created_at: String,
}

impl CheckinRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            date: row.get(0)?,
            quality: row.get(1)?,
            yesterday_caffeine_mg: row.get(2)?,
            yesterday_last_coffee_hour: row.get(3)?,
            created_at: row.get(4)?,
        })
    }

    fn into_checkin(self) -> Result<SleepCheckin, DbError> {
        let record = format!("check-in {}", self.date);
        let invalid = |message: String| DbError::InvalidValue {
            record: record.clone(),
            message,
        };
        let date = NaiveDate::parse_from_str(&self.date, DATE_FORMAT).map_err(|source| {
            DbError::TimestampParse {
                record: record.clone(),
                timestamp: self.date.clone(),
                source,
            }
        })?;
        let created_at = parse_timestamp(&self.created_at, &record)?;
        let quality = self
            .quality
            .parse::<SleepQuality>()
            .map_err(|e| invalid(e.to_string()))?;
        SleepCheckin::new(
            date,
            quality,
            self.yesterday_caffeine_mg,
            self.yesterday_last_coffee_hour,
            created_at,
        )
        .map_err(|e| invalid(e.to_string()))
    }
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch(
            "
            -- One logged dose per row.
            -- consumed_at: when it was drunk; logged_at: when it was recorded
            CREATE TABLE IF NOT EXISTS consumption_events (
                id TEXT PRIMARY KEY,
                substance_id TEXT NOT NULL,
                display_name TEXT NOT NULL,
                caffeine_mg REAL NOT NULL,
                consumed_at TEXT NOT NULL,
                logged_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_consumption_events_consumed_at
                ON consumption_events(consumed_at);

            -- At most one check-in per local date.
            CREATE TABLE IF NOT EXISTS sleep_checkins (
                date TEXT PRIMARY KEY,
                quality TEXT NOT NULL,
                yesterday_caffeine_mg REAL NOT NULL,
                yesterday_last_coffee_hour INTEGER,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS preferences (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS seen_badges (
                badge_id TEXT PRIMARY KEY,
                seen_at TEXT NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    /// Inserts a new event.
    pub fn insert_event(&self, event: &ConsumptionEvent) -> Result<(), DbError> {
        self.conn
            .execute(
                "
                INSERT INTO consumption_events
                    (id, substance_id, display_name, caffeine_mg, consumed_at, logged_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ",
                params![
                    event.id.as_str(),
                    event.substance_id.as_str(),
                    event.display_name,
                    event.caffeine_mg,
                    format_timestamp(event.consumed_at),
                    format_timestamp(event.logged_at),
                ],
            )
            .map_err(|err| {
                if is_constraint_violation(&err) {
                    DbError::DuplicateEvent {
                        id: event.id.to_string(),
                    }
                } else {
                    err.into()
                }
            })?;
        tracing::debug!(id = %event.id, mg = event.caffeine_mg, "inserted event");
        Ok(())
    }

    /// Fetches one event by ID.
    pub fn get_event(&self, id: &str) -> Result<Option<ConsumptionEvent>, DbError> {
        let row = self
            .conn
            .query_row(
                "
                SELECT id, substance_id, display_name, caffeine_mg, consumed_at, logged_at
                FROM consumption_events
                WHERE id = ?1
                ",
                [id],
                EventRow::from_row,
            )
            .optional()?;
        row.map(EventRow::into_event).transpose()
    }

    /// Replaces the amount and consumption time of an existing event.
    pub fn update_event(&self, event: &ConsumptionEvent) -> Result<(), DbError> {
        let changed = self.conn.execute(
            "
            UPDATE consumption_events
            SET caffeine_mg = ?2, consumed_at = ?3
            WHERE id = ?1
            ",
            params![
                event.id.as_str(),
                event.caffeine_mg,
                format_timestamp(event.consumed_at),
            ],
        )?;
        if changed == 0 {
            return Err(DbError::UnknownEvent {
                id: event.id.to_string(),
            });
        }
        tracing::debug!(id = %event.id, "updated event");
        Ok(())
    }

    /// Deletes an event.
    pub fn delete_event(&self, id: &str) -> Result<(), DbError> {
        let changed = self
            .conn
            .execute("DELETE FROM consumption_events WHERE id = ?1", [id])?;
        if changed == 0 {
            return Err(DbError::UnknownEvent { id: id.to_string() });
        }
        tracing::debug!(id, "deleted event");
        Ok(())
    }

    /// Lists all events ordered by consumption time then ID.
    pub fn list_events(&self) -> Result<Vec<ConsumptionEvent>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT id, substance_id, display_name, caffeine_mg, consumed_at, logged_at
            FROM consumption_events
            ORDER BY consumed_at ASC, id ASC
            ",
        )?;
        let rows = stmt.query_map([], EventRow::from_row)?;
        collect_readable(rows, EventRow::into_event)
    }

    /// Lists events within a time range.
    ///
    /// The range is inclusive of `start` and exclusive of `end`.
    pub fn list_events_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ConsumptionEvent>, DbError> {
        if end <= start {
            return Ok(Vec::new());
        }
        let mut stmt = self.conn.prepare(
            "
            SELECT id, substance_id, display_name, caffeine_mg, consumed_at, logged_at
            FROM consumption_events
            WHERE consumed_at >= ?1 AND consumed_at < ?2
            ORDER BY consumed_at ASC, id ASC
            ",
        )?;
        let rows = stmt.query_map(
            [format_timestamp(start), format_timestamp(end)],
            EventRow::from_row,
        )?;
        collect_readable(rows, EventRow::into_event)
    }

    /// Records a sleep check-in.
    ///
    /// Returns [`DbError::DuplicateCheckin`] if one already exists for the date.
    pub fn insert_checkin(&self, checkin: &SleepCheckin) -> Result<(), DbError> {
        self.conn
            .execute(
                "
                INSERT INTO sleep_checkins
                    (date, quality, yesterday_caffeine_mg, yesterday_last_coffee_hour, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ",
                params![
                    checkin.date.format(DATE_FORMAT).to_string(),
                    checkin.quality.as_str(),
                    checkin.yesterday_caffeine_mg,
                    checkin.yesterday_last_coffee_hour,
                    format_timestamp(checkin.created_at),
                ],
            )
            .map_err(|err| {
                if is_constraint_violation(&err) {
                    DbError::DuplicateCheckin { date: checkin.date }
                } else {
                    err.into()
                }
            })?;
        tracing::debug!(date = %checkin.date, quality = %checkin.quality, "inserted check-in");
        Ok(())
    }

    /// Lists check-ins ordered by date.
    pub fn list_checkins(&self) -> Result<Vec<SleepCheckin>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT date, quality, yesterday_caffeine_mg, yesterday_last_coffee_hour, created_at
            FROM sleep_checkins
            ORDER BY date ASC
            ",
        )?;
        let rows = stmt.query_map([], CheckinRow::from_row)?;
        collect_readable(rows, CheckinRow::into_checkin)
    }

    /// Loads preferences, falling back to defaults for unset or unreadable keys.
    pub fn load_preferences(&self) -> Result<Preferences, DbError> {
        let mut prefs = Preferences::default();
        let mut stmt = self.conn.prepare("SELECT key, value FROM preferences")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        for row in rows {
            let (key, value) = row?;
            if let Err(err) = apply_preference(&mut prefs, &key, &value) {
                tracing::warn!(%err, "ignoring stored preference");
            }
        }
        Ok(prefs)
    }

    /// Stores all preferences.
    pub fn store_preferences(&mut self, prefs: &Preferences) -> Result<(), DbError> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "
                INSERT INTO preferences (key, value) VALUES (?1, ?2)
                ON CONFLICT(key) DO UPDATE SET value = excluded.value
                ",
            )?;
            stmt.execute([PREF_BEDTIME, format_time_of_day(prefs.bedtime).as_str()])?;
            stmt.execute([PREF_DAILY_LIMIT, prefs.daily_limit_mg.to_string().as_str()])?;
            stmt.execute([PREF_SENSITIVITY, prefs.sensitivity.as_str()])?;
        }
        tx.commit()?;
        tracing::debug!(?prefs, "stored preferences");
        Ok(())
    }

    /// Badges the user has already been told about.
    pub fn seen_badges(&self) -> Result<HashSet<BadgeId>, DbError> {
        let mut stmt = self.conn.prepare("SELECT badge_id FROM seen_badges")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut seen = HashSet::new();
        for row in rows {
            let raw = row?;
            match raw.parse::<BadgeId>() {
                Ok(id) => {
                    seen.insert(id);
                }
                Err(err) => tracing::warn!(%err, "ignoring unknown seen badge"),
            }
        }
        Ok(seen)
    }

    /// Records badges as seen. Already-seen badges keep their first timestamp.
    pub fn mark_badges_seen(
        &mut self,
        ids: &[BadgeId],
        at: DateTime<Utc>,
    ) -> Result<usize, DbError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO seen_badges (badge_id, seen_at) VALUES (?1, ?2)",
            )?;
            let at = format_timestamp(at);
            for id in ids {
                inserted += stmt.execute([id.as_str(), at.as_str()])?;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }
}

impl EventSource for Database {
    type Error = DbError;

    fn all_events(&self) -> Result<Vec<ConsumptionEvent>, DbError> {
        self.list_events()
    }

    fn events_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ConsumptionEvent>, DbError> {
        self.list_events_in_range(start, end)
    }
}

impl CheckinSource for Database {
    type Error = DbError;

    fn checkins(&self) -> Result<Vec<SleepCheckin>, DbError> {
        self.list_checkins()
    }
}

impl PreferenceSource for Database {
    type Error = DbError;

    fn preferences(&self) -> Result<Preferences, DbError> {
        self.load_preferences()
    }
}

/// Converts rows, skipping the ones that do not parse.
fn collect_readable<R, T>(
    rows: impl Iterator<Item = rusqlite::Result<R>>,
    convert: impl Fn(R) -> Result<T, DbError>,
) -> Result<Vec<T>, DbError> {
    let mut out = Vec::new();
    for row in rows {
        let row = match row {
            Ok(row) => row,
            Err(err) if is_column_mismatch(&err) => {
                tracing::warn!(%err, "skipping unreadable row");
                continue;
            }
            Err(err) => return Err(err.into()),
        };
        match convert(row) {
            Ok(item) => out.push(item),
            Err(err) => tracing::warn!(%err, "skipping unreadable row"),
        }
    }
    Ok(out)
}

/// True for errors caused by a stored value that does not fit its column's
/// Rust type, as opposed to the query itself failing.
fn is_column_mismatch(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::InvalidColumnType(..)
            | rusqlite::Error::IntegralValueOutOfRange(..)
            | rusqlite::Error::FromSqlConversionFailure(..)
    )
}

fn apply_preference(prefs: &mut Preferences, key: &str, value: &str) -> Result<(), DbError> {
    let invalid = |message: String| DbError::InvalidValue {
        record: format!("preference {key}"),
        message,
    };
    match key {
        PREF_BEDTIME => {
            prefs.bedtime = parse_time_of_day(value).map_err(|e| invalid(e.to_string()))?;
        }
        PREF_DAILY_LIMIT => {
            prefs.daily_limit_mg = value
                .parse()
                .map_err(|_| invalid(format!("not a whole number of mg: {value}")))?;
        }
        PREF_SENSITIVITY => {
            prefs.sensitivity = value
                .parse::<SensitivityPreference>()
                .map_err(|e| invalid(e.to_string()))?;
        }
        _ => return Err(invalid("unknown key".to_string())),
    }
    Ok(())
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    err.sqlite_error_code() == Some(ErrorCode::ConstraintViolation)
}

fn parse_timestamp(timestamp: &str, record: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|source| DbError::TimestampParse {
            record: record.to_string(),
            timestamp: timestamp.to_string(),
            source,
        })
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}
