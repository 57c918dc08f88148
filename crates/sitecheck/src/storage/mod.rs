//! Storage layer for sitecheck.
//!
//! This module provides `SQLite`-based persistent storage for inspections
//! and visitor permits. Records are only ever created and read; each create
//! runs in its own transaction.

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::form::{DATE_FORMAT, TIME_FORMAT};
use crate::record::{Answers, Inspection, NewInspection, NewPermit, Permit, Shift};

const INSPECTION_COLUMNS: &str = "id, site, date, shift, answers_json, notes, created_at";

const PERMIT_COLUMNS: &str = "id, name, identification, company, reason, equipment, \
     entry_date, entry_time, exit_date, exit_time, authorizer, notes, \
     provider_signature, manager_signature, escort_signature, created_at";

/// Filter for inspection listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InspectionFilter {
    /// Only inspections of this site.
    pub site: Option<String>,
    /// Only inspections of this calendar day.
    pub date: Option<NaiveDate>,
}

/// Filter for permit listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermitFilter {
    /// Only permits with this entry date.
    pub entry_date: Option<NaiveDate>,
}

/// Storage engine for inspection and permit records.
///
/// The connection sits behind a mutex so a single handle can be shared
/// across request handlers.
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Mutex<Connection>,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    /// Initializes the schema if this is a new database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        migrations::initialize_schema(&conn)?;

        info!("Database opened successfully at {}", path.display());
        Ok(Self {
            path,
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory storage instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn: Mutex::new(conn),
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::internal("storage connection lock poisoned"))
    }

    /// Store a new inspection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConstraintViolation`] if an inspection already exists
    /// for the same site, date and shift; nothing is written in that case.
    pub fn insert_inspection(&self, new: &NewInspection) -> Result<Inspection> {
        let created_at = Utc::now().trunc_subsecs(6);
        let answers_json = serde_json::to_string(&new.answers)?;

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let inserted = tx.execute(
            r"
            INSERT INTO inspections (site, date, shift, answers_json, notes, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
            params![
                new.site,
                format_date(new.date),
                new.shift.as_str(),
                answers_json,
                new.notes,
                format_timestamp(created_at),
            ],
        );

        match inserted {
            Ok(_) => {}
            Err(err) if is_unique_violation(&err) => {
                debug!(
                    "Rejected duplicate inspection {} {} {}",
                    new.site, new.date, new.shift
                );
                return Err(Error::constraint_violation(format!(
                    "an inspection for {} on {} ({} shift) already exists",
                    new.site, new.date, new.shift
                )));
            }
            Err(err) => return Err(err.into()),
        }

        let id = tx.last_insert_rowid();
        tx.commit()?;
        debug!("Inserted inspection with id {}", id);

        Ok(Inspection {
            id,
            site: new.site.clone(),
            date: new.date,
            shift: new.shift,
            answers: new.answers.clone(),
            notes: new.notes.clone(),
            created_at,
        })
    }

    /// Store a new visitor permit.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn insert_permit(&self, new: &NewPermit) -> Result<Permit> {
        let created_at = Utc::now().trunc_subsecs(6);

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute(
            r"
            INSERT INTO permits (
                name, identification, company, reason, equipment,
                entry_date, entry_time, exit_date, exit_time,
                authorizer, notes, provider_signature, manager_signature,
                escort_signature, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            ",
            params![
                new.name,
                new.identification,
                new.company,
                new.reason,
                new.equipment,
                new.entry_date.map(format_date),
                new.entry_time.map(format_time),
                new.exit_date.map(format_date),
                new.exit_time.map(format_time),
                new.authorizer,
                new.notes,
                new.provider_signature,
                new.manager_signature,
                new.escort_signature,
                format_timestamp(created_at),
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        debug!("Inserted permit with id {}", id);

        Ok(Permit {
            id,
            details: new.clone(),
            created_at,
        })
    }

    /// Get an inspection by its ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_inspection(&self, id: i64) -> Result<Option<Inspection>> {
        let conn = self.conn()?;
        let result = conn
            .query_row(
                &format!("SELECT {INSPECTION_COLUMNS} FROM inspections WHERE id = ?1"),
                [id],
                Self::row_to_inspection,
            )
            .optional()
            .map_err(|e| row_error("inspections", e))?;
        Ok(result)
    }

    /// Get a permit by its ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_permit(&self, id: i64) -> Result<Option<Permit>> {
        let conn = self.conn()?;
        let result = conn
            .query_row(
                &format!("SELECT {PERMIT_COLUMNS} FROM permits WHERE id = ?1"),
                [id],
                Self::row_to_permit,
            )
            .optional()
            .map_err(|e| row_error("permits", e))?;
        Ok(result)
    }

    /// List inspections newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_inspections(
        &self,
        filter: &InspectionFilter,
        limit: usize,
    ) -> Result<Vec<Inspection>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            r"
            SELECT {INSPECTION_COLUMNS} FROM inspections
            WHERE (?1 IS NULL OR site = ?1) AND (?2 IS NULL OR date = ?2)
            ORDER BY created_at DESC, id DESC LIMIT ?3
            "
        ))?;

        let limit_i64 = i64::try_from(limit).unwrap_or(i64::MAX);
        let inspections = stmt
            .query_map(
                params![filter.site, filter.date.map(format_date), limit_i64],
                Self::row_to_inspection,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| row_error("inspections", e))?;

        Ok(inspections)
    }

    /// List permits newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_permits(&self, filter: &PermitFilter, limit: usize) -> Result<Vec<Permit>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            r"
            SELECT {PERMIT_COLUMNS} FROM permits
            WHERE (?1 IS NULL OR entry_date = ?1)
            ORDER BY created_at DESC, id DESC LIMIT ?2
            "
        ))?;

        let limit_i64 = i64::try_from(limit).unwrap_or(i64::MAX);
        let permits = stmt
            .query_map(
                params![filter.entry_date.map(format_date), limit_i64],
                Self::row_to_permit,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| row_error("permits", e))?;

        Ok(permits)
    }

    /// Check whether an inspection exists for the site, date and shift.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn inspection_exists(&self, site: &str, date: NaiveDate, shift: Shift) -> Result<bool> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM inspections WHERE site = ?1 AND date = ?2 AND shift = ?3",
            params![site, format_date(date), shift.as_str()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Count stored inspections.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count_inspections(&self) -> Result<i64> {
        let conn = self.conn()?;
        let count = conn.query_row("SELECT COUNT(*) FROM inspections", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Count stored permits.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count_permits(&self) -> Result<i64> {
        let conn = self.conn()?;
        let count = conn.query_row("SELECT COUNT(*) FROM permits", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Get database statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StorageStats> {
        let total_inspections = self.count_inspections()?;
        let total_permits = self.count_permits()?;

        let newest: Option<String> = self
            .conn()?
            .query_row(
                "SELECT created_at FROM inspections ORDER BY created_at DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;
        let schema_version = migrations::get_schema_version(&*self.conn()?)?;
        let newest_inspection = newest
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        let db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map_or(0, |m| m.len())
        };

        Ok(StorageStats {
            total_inspections,
            total_permits,
            newest_inspection,
            schema_version,
            db_size_bytes,
        })
    }

    fn row_to_inspection(row: &rusqlite::Row) -> rusqlite::Result<Inspection> {
        let date: String = row.get(2)?;
        let shift: String = row.get(3)?;
        let answers_json: String = row.get(4)?;
        let created_at: String = row.get(6)?;
        let id: i64 = row.get(0)?;

        Ok(Inspection {
            id,
            site: row.get(1)?,
            date: decode(id, 2, &date, parse_stored_date)?,
            shift: decode(id, 3, &shift, |v| v.parse::<Shift>())?,
            answers: decode(id, 4, &answers_json, |v| {
                serde_json::from_str::<Answers>(v)
            })?,
            notes: row.get(5)?,
            created_at: decode(id, 6, &created_at, parse_timestamp)?,
        })
    }

    fn row_to_permit(row: &rusqlite::Row) -> rusqlite::Result<Permit> {
        let id: i64 = row.get(0)?;
        let optional_date = |idx: usize| -> rusqlite::Result<Option<NaiveDate>> {
            row.get::<_, Option<String>>(idx)?
                .map(|s| decode(id, idx, &s, parse_stored_date))
                .transpose()
        };
        let optional_time = |idx: usize| -> rusqlite::Result<Option<NaiveTime>> {
            row.get::<_, Option<String>>(idx)?
                .map(|s| decode(id, idx, &s, |v| NaiveTime::parse_from_str(v, TIME_FORMAT)))
                .transpose()
        };
        let created_at: String = row.get(15)?;

        Ok(Permit {
            id,
            details: NewPermit {
                name: row.get(1)?,
                identification: row.get(2)?,
                company: row.get(3)?,
                reason: row.get(4)?,
                equipment: row.get(5)?,
                entry_date: optional_date(6)?,
                entry_time: optional_time(7)?,
                exit_date: optional_date(8)?,
                exit_time: optional_time(9)?,
                authorizer: row.get(10)?,
                notes: row.get(11)?,
                provider_signature: row.get(12)?,
                manager_signature: row.get(13)?,
                escort_signature: row.get(14)?,
            },
            created_at: decode(id, 15, &created_at, parse_timestamp)?,
        })
    }
}

/// Statistics about the storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageStats {
    /// Total number of inspections stored.
    pub total_inspections: i64,
    /// Total number of permits stored.
    pub total_permits: i64,
    /// Creation time of the most recent inspection.
    pub newest_inspection: Option<DateTime<Utc>>,
    /// Schema version recorded in the metadata table.
    pub schema_version: i32,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

/// A stored column that no longer parses as its record field.
#[derive(Debug, thiserror::Error)]
#[error("column {column}: {message}")]
struct ColumnDecodeError {
    id: i64,
    column: usize,
    message: String,
}

fn decode<T, E, F>(id: i64, column: usize, raw: &str, parse: F) -> rusqlite::Result<T>
where
    F: FnOnce(&str) -> std::result::Result<T, E>,
    E: std::fmt::Display,
{
    parse(raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            column,
            rusqlite::types::Type::Text,
            Box::new(ColumnDecodeError {
                id,
                column,
                message: format!("{e} (stored value `{raw}`)"),
            }),
        )
    })
}

/// Turn a row-mapping failure into [`Error::CorruptRecord`] when it came from
/// [`decode`], otherwise into a query error.
fn row_error(table: &'static str, err: rusqlite::Error) -> Error {
    match err {
        rusqlite::Error::FromSqlConversionFailure(column, ty, source) => {
            match source.downcast::<ColumnDecodeError>() {
                Ok(bad) => Error::CorruptRecord {
                    table,
                    id: bad.id,
                    message: bad.to_string(),
                },
                Err(source) => Error::DatabaseQuery(
                    rusqlite::Error::FromSqlConversionFailure(column, ty, source),
                ),
            }
        }
        other => Error::DatabaseQuery(other),
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn format_time(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_stored_date(raw: &str) -> std::result::Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
}

fn parse_timestamp(raw: &str) -> std::result::Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw).map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::record::Answer;

    fn create_test_storage() -> Storage {
        Storage::open_in_memory().expect("failed to create test storage")
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    fn create_test_inspection(site: &str, date: NaiveDate, shift: Shift) -> NewInspection {
        let mut answers = Answers::new();
        answers.insert("ambient_temp_c".to_string(), Some(Answer::Number(22.5)));
        answers.insert("ups_status".to_string(), Some(Answer::Text("OK".to_string())));
        answers.insert("cameras_working".to_string(), None);
        NewInspection {
            site: site.to_string(),
            date,
            shift,
            answers,
            notes: String::new(),
        }
    }

    fn create_test_permit(name: &str) -> NewPermit {
        NewPermit {
            name: name.to_string(),
            ..NewPermit::default()
        }
    }

    #[test]
    fn test_open_in_memory() {
        assert!(Storage::open_in_memory().is_ok());
    }

    #[test]
    fn test_insert_and_get_inspection() {
        let storage = create_test_storage();
        let new = create_test_inspection("DC1", day(1), Shift::Morning);

        let stored = storage.insert_inspection(&new).unwrap();
        let retrieved = storage.get_inspection(stored.id).unwrap().unwrap();

        assert_eq!(retrieved, stored);
        assert_eq!(retrieved.answer("ambient_temp_c"), Some(&Answer::Number(22.5)));
        assert_eq!(retrieved.answers.get("cameras_working"), Some(&None));
    }

    #[test]
    fn test_duplicate_inspection_rejected() {
        let storage = create_test_storage();
        let new = create_test_inspection("DC1", day(1), Shift::Morning);

        storage.insert_inspection(&new).unwrap();
        let err = storage.insert_inspection(&new).unwrap_err();

        assert!(err.is_constraint_violation());
        assert_eq!(storage.count_inspections().unwrap(), 1);
    }

    #[test]
    fn test_same_day_other_shift_or_site_allowed() {
        let storage = create_test_storage();

        storage
            .insert_inspection(&create_test_inspection("DC1", day(1), Shift::Morning))
            .unwrap();
        storage
            .insert_inspection(&create_test_inspection("DC1", day(1), Shift::Afternoon))
            .unwrap();
        storage
            .insert_inspection(&create_test_inspection("DC2", day(1), Shift::Morning))
            .unwrap();

        assert_eq!(storage.count_inspections().unwrap(), 3);
    }

    #[test]
    fn test_concurrent_duplicates_only_one_succeeds() {
        let storage = Arc::new(create_test_storage());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let storage = Arc::clone(&storage);
                std::thread::spawn(move || {
                    storage.insert_inspection(&create_test_inspection(
                        "DC2",
                        day(3),
                        Shift::Afternoon,
                    ))
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let successes = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1);
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(Error::is_constraint_violation));
        assert_eq!(storage.count_inspections().unwrap(), 1);
    }

    #[test]
    fn test_get_nonexistent() {
        let storage = create_test_storage();
        assert!(storage.get_inspection(99999).unwrap().is_none());
        assert!(storage.get_permit(99999).unwrap().is_none());
    }

    #[test]
    fn test_list_inspections_newest_first() {
        let storage = create_test_storage();
        for d in 1..=3 {
            storage
                .insert_inspection(&create_test_inspection("DC1", day(d), Shift::Morning))
                .unwrap();
        }

        let listed = storage
            .list_inspections(&InspectionFilter::default(), 10)
            .unwrap();
        let dates: Vec<_> = listed.iter().map(|i| i.date).collect();
        assert_eq!(dates, vec![day(3), day(2), day(1)]);
    }

    #[test]
    fn test_list_inspections_by_site() {
        let storage = create_test_storage();
        storage
            .insert_inspection(&create_test_inspection("DC1", day(1), Shift::Morning))
            .unwrap();
        storage
            .insert_inspection(&create_test_inspection("DC2", day(1), Shift::Morning))
            .unwrap();
        storage
            .insert_inspection(&create_test_inspection("DC2", day(2), Shift::Morning))
            .unwrap();

        let filter = InspectionFilter {
            site: Some("DC2".to_string()),
            date: None,
        };
        let listed = storage.list_inspections(&filter, 10).unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().all(|i| i.site == "DC2"));
        assert_eq!(listed[0].date, day(2));
    }

    #[test]
    fn test_list_inspections_by_date() {
        let storage = create_test_storage();
        storage
            .insert_inspection(&create_test_inspection("DC1", day(1), Shift::Morning))
            .unwrap();
        storage
            .insert_inspection(&create_test_inspection("DC1", day(2), Shift::Morning))
            .unwrap();

        let filter = InspectionFilter {
            site: None,
            date: Some(day(2)),
        };
        let listed = storage.list_inspections(&filter, 10).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].date, day(2));
    }

    #[test]
    fn test_list_inspections_limit() {
        let storage = create_test_storage();
        for d in 1..=5 {
            storage
                .insert_inspection(&create_test_inspection("DC1", day(d), Shift::Morning))
                .unwrap();
        }

        let listed = storage
            .list_inspections(&InspectionFilter::default(), 3)
            .unwrap();
        assert_eq!(listed.len(), 3);
        assert_eq!(listed[0].date, day(5));

        let none = storage
            .list_inspections(&InspectionFilter::default(), 0)
            .unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_inspection_exists() {
        let storage = create_test_storage();
        storage
            .insert_inspection(&create_test_inspection("DC1", day(1), Shift::Morning))
            .unwrap();

        assert!(storage.inspection_exists("DC1", day(1), Shift::Morning).unwrap());
        assert!(!storage
            .inspection_exists("DC1", day(1), Shift::Afternoon)
            .unwrap());
        assert!(!storage.inspection_exists("DC2", day(1), Shift::Morning).unwrap());
    }

    #[test]
    fn test_insert_and_get_permit() {
        let storage = create_test_storage();
        let new = NewPermit {
            name: "Jane Roe".to_string(),
            company: Some("Acme".to_string()),
            entry_date: Some(day(4)),
            entry_time: NaiveTime::from_hms_opt(9, 15, 0),
            exit_time: None,
            authorizer: "J. Smith, Facilities".to_string(),
            ..NewPermit::default()
        };

        let stored = storage.insert_permit(&new).unwrap();
        let retrieved = storage.get_permit(stored.id).unwrap().unwrap();

        assert_eq!(retrieved, stored);
        assert_eq!(retrieved.details.entry_time, NaiveTime::from_hms_opt(9, 15, 0));
        assert_eq!(retrieved.details.exit_time, None);
    }

    #[test]
    fn test_duplicate_permits_allowed() {
        let storage = create_test_storage();
        let new = create_test_permit("Same Visitor");

        let first = storage.insert_permit(&new).unwrap();
        let second = storage.insert_permit(&new).unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(storage.count_permits().unwrap(), 2);
    }

    #[test]
    fn test_list_permits_newest_first_and_filtered() {
        let storage = create_test_storage();
        storage.insert_permit(&create_test_permit("First")).unwrap();
        storage
            .insert_permit(&NewPermit {
                entry_date: Some(day(9)),
                ..create_test_permit("Second")
            })
            .unwrap();

        let all = storage.list_permits(&PermitFilter::default(), 10).unwrap();
        let names: Vec<_> = all.iter().map(|p| p.details.name.as_str()).collect();
        assert_eq!(names, vec!["Second", "First"]);

        let filter = PermitFilter {
            entry_date: Some(day(9)),
        };
        let filtered = storage.list_permits(&filter, 10).unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].details.name, "Second");
    }

    #[test]
    fn test_stats() {
        let storage = create_test_storage();
        let empty = storage.stats().unwrap();
        assert_eq!(empty.total_inspections, 0);
        assert!(empty.newest_inspection.is_none());
        assert_eq!(empty.db_size_bytes, 0);
        assert_eq!(empty.schema_version, migrations::CURRENT_VERSION);

        storage
            .insert_inspection(&create_test_inspection("DC1", day(1), Shift::Morning))
            .unwrap();
        storage.insert_permit(&create_test_permit("Visitor")).unwrap();

        let stats = storage.stats().unwrap();
        assert_eq!(stats.total_inspections, 1);
        assert_eq!(stats.total_permits, 1);
        assert!(stats.newest_inspection.is_some());
    }

    #[test]
    fn test_unicode_notes_round_trip() {
        let storage = create_test_storage();
        let mut new = create_test_inspection("DC1", day(1), Shift::Morning);
        new.notes = "Revisión de temperatura: 23 °C".to_string();

        let stored = storage.insert_inspection(&new).unwrap();
        let retrieved = storage.get_inspection(stored.id).unwrap().unwrap();
        assert_eq!(retrieved.notes, "Revisión de temperatura: 23 °C");
    }

    #[test]
    fn test_corrupt_row_reported() {
        let storage = create_test_storage();
        let stored = storage
            .insert_inspection(&create_test_inspection("DC1", day(1), Shift::Morning))
            .unwrap();
        storage
            .conn()
            .unwrap()
            .execute(
                "UPDATE inspections SET shift = 'Night' WHERE id = ?1",
                [stored.id],
            )
            .unwrap();

        let err = storage.get_inspection(stored.id).unwrap_err();
        match err {
            Error::CorruptRecord { table, id, message } => {
                assert_eq!(table, "inspections");
                assert_eq!(id, stored.id);
                assert!(message.contains("column 3"), "{message}");
                assert!(message.contains("Night"), "{message}");
            }
            other => panic!("expected CorruptRecord, got {other:?}"),
        }

        let err = storage
            .list_inspections(&InspectionFilter::default(), 10)
            .unwrap_err();
        assert!(matches!(err, Error::CorruptRecord { id, .. } if id == stored.id));
    }

    #[test]
    fn test_corrupt_permit_date_reported() {
        let storage = create_test_storage();
        let stored = storage
            .insert_permit(&create_test_permit("Ana"))
            .unwrap();
        storage
            .conn()
            .unwrap()
            .execute(
                "UPDATE permits SET entry_date = '31/12/2024' WHERE id = ?1",
                [stored.id],
            )
            .unwrap();

        let err = storage.get_permit(stored.id).unwrap_err();
        assert!(matches!(
            err,
            Error::CorruptRecord { table: "permits", id, .. } if id == stored.id
        ));
        assert!(matches!(
            storage.list_permits(&PermitFilter::default(), 10),
            Err(Error::CorruptRecord { .. })
        ));
    }

    #[test]
    fn test_open_file_based() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("records.db");

        let storage = Storage::open(&db_path).unwrap();
        storage
            .insert_inspection(&create_test_inspection("DC1", day(1), Shift::Morning))
            .unwrap();
        assert_eq!(storage.path(), db_path);
        assert!(storage.stats().unwrap().db_size_bytes > 0);
        drop(storage);

        let reopened = Storage::open(&db_path).unwrap();
        assert_eq!(reopened.count_inspections().unwrap(), 1);
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let nested_path = dir.path().join("nested/deeper/records.db");

        let storage = Storage::open(&nested_path).unwrap();
        assert!(nested_path.exists());
        drop(storage);
    }
}
