//! SQLite-backed job store.

use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;
use jobhunt_search::JobListing;
use jobhunt_search::orchestrator::url_normalize::normalize_url;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::info;

use super::JobStore;
use super::schema::apply_schema;
use crate::error::{HuntError, Result};

/// Job store in a single SQLite file.
///
/// All access goes through an internal `Mutex<Connection>`.
pub struct SqliteJobStore {
    conn: Mutex<Connection>,
}

impl SqliteJobStore {
    /// Open (or create) the database at `path`, creating parent directories.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        apply_schema(&conn)?;
        info!("job store opened: {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        apply_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Number of stored listings.
    pub fn count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM jobs", [], |row| row.get(0))?;
        Ok(usize::try_from(n).unwrap_or(0))
    }

    /// Title and source of the listing stored under `url`.
    pub fn title_and_source(&self, url: &str) -> Result<Option<(String, String)>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT title, source FROM jobs WHERE url = ?1",
                params![normalize_url(url)],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        Ok(row)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| HuntError::Storage(e.to_string()))
    }
}

/// Row id: source-scoped listing id when known, else a fresh UUID.
fn row_id(listing: &JobListing) -> String {
    match listing.id.as_deref() {
        Some(id) if !id.is_empty() => format!("{}:{id}", listing.source),
        _ => uuid::Uuid::new_v4().to_string(),
    }
}

impl JobStore for SqliteJobStore {
    fn exists(&self, url: &str) -> Result<bool> {
        let conn = self.lock()?;
        let found: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM jobs WHERE url = ?1",
                params![normalize_url(url)],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// The `url` column holds the canonical URL. A row whose url or
    /// `source:id` already exists is ignored and reported as not inserted.
    fn save(&self, listing: &JobListing) -> Result<bool> {
        let parsed_data = serde_json::to_string(&listing.raw)
            .map_err(|e| HuntError::Storage(format!("failed to encode raw payload: {e}")))?;
        let conn = self.lock()?;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO jobs (
                id, title, company, description, location, job_type, url, source,
                salary, posted_date, experience_level, parsed_data, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                row_id(listing),
                listing.title,
                listing.company,
                listing.description,
                listing.location,
                listing.job_type.as_str(),
                normalize_url(&listing.url),
                listing.source,
                listing.salary,
                listing.posted_at.to_rfc3339(),
                listing.experience_level.as_str(),
                parsed_data,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(inserted > 0)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;
    use crate::store::save_new_listings;

    fn listing(url: &str, source: &str, id: Option<&str>) -> JobListing {
        let mut job = JobListing::new("Rust Engineer", "Ferris Inc", url, source);
        job.id = id.map(str::to_owned);
        job.raw = serde_json::json!({"tags": ["rust"]});
        job
    }

    #[test]
    fn save_then_exists() {
        let store = SqliteJobStore::open_in_memory().unwrap();
        assert!(!store.exists("https://a.dev/1").unwrap());
        store.save(&listing("https://a.dev/1", "remoteok", Some("42"))).unwrap();
        assert!(store.exists("https://a.dev/1").unwrap());
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn duplicate_url_ignored() {
        let store = SqliteJobStore::open_in_memory().unwrap();
        assert!(store.save(&listing("https://a.dev/1", "github", None)).unwrap());
        let mut again = listing("https://a.dev/1", "indeed", None);
        again.title = "Other".into();
        assert!(!store.save(&again).unwrap());

        assert_eq!(store.count().unwrap(), 1);
        let (title, source) = store.title_and_source("https://a.dev/1").unwrap().unwrap();
        assert_eq!(title, "Rust Engineer");
        assert_eq!(source, "github");
    }

    #[test]
    fn same_id_from_different_sources_kept() {
        let store = SqliteJobStore::open_in_memory().unwrap();
        store.save(&listing("https://a.dev/1", "remoteok", Some("7"))).unwrap();
        store.save(&listing("https://b.dev/1", "linkedin", Some("7"))).unwrap();
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn tracking_variants_saved_once() {
        let store = SqliteJobStore::open_in_memory().unwrap();
        let first = save_new_listings(
            &store,
            &[listing("https://www.linkedin.com/jobs/view/42?trk=a", "linkedin", Some("42"))],
        )
        .unwrap();
        let second = save_new_listings(
            &store,
            &[listing("https://www.linkedin.com/jobs/view/42?trk=b", "linkedin", Some("42"))],
        )
        .unwrap();
        assert_eq!(first, 1);
        assert_eq!(second, 0);
        assert_eq!(store.count().unwrap(), 1);
        assert!(store.exists("https://www.linkedin.com/jobs/view/42").unwrap());
    }

    #[test]
    fn id_conflict_is_not_counted_as_saved() {
        let store = SqliteJobStore::open_in_memory().unwrap();
        // Same source id under a URL that is not a tracking variant.
        let saved = save_new_listings(
            &store,
            &[
                listing("https://a.dev/jobs/7", "github", Some("7")),
                listing("https://a.dev/jobs/7?lang=en", "github", Some("7")),
            ],
        )
        .unwrap();
        assert_eq!(saved, 1);
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn persists_across_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("data").join("jobs.db");
        {
            let store = SqliteJobStore::open(&path).unwrap();
            let saved = save_new_listings(
                &store,
                &[
                    listing("https://a.dev/1", "github", Some("1")),
                    listing("https://a.dev/2", "github", Some("2")),
                ],
            )
            .unwrap();
            assert_eq!(saved, 2);
        }
        let reopened = SqliteJobStore::open(&path).unwrap();
        assert_eq!(reopened.count().unwrap(), 2);
        let saved = save_new_listings(&reopened, &[listing("https://a.dev/2", "github", Some("2"))])
            .unwrap();
        assert_eq!(saved, 0);
    }

    #[test]
    fn raw_payload_stored_as_json() {
        let store = SqliteJobStore::open_in_memory().unwrap();
        store.save(&listing("https://a.dev/1", "remoteok", Some("9"))).unwrap();
        let conn = store.lock().unwrap();
        let raw: String = conn
            .query_row(
                "SELECT parsed_data FROM jobs WHERE url = 'https://a.dev/1'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["tags"][0], "rust");
    }
}
