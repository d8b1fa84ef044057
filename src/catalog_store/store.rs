//! SQLite-backed catalog store implementation.

use super::schema::{create_table_sql, COLLECTIONS};
use super::trait_def::{CatalogCounts, CatalogStore, UpsertOutcome};
use crate::catalog::{Album, Book, CatalogRecord, Movie, Single};
use crate::query::Filter;
use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::info;

/// SQLite-backed catalog store. Documents are stored as JSON rows and
/// matched against the compiled filter after decoding; collections are
/// personal-catalog sized, so a scan is fine.
#[derive(Clone)]
pub struct SqliteCatalogStore {
    read_conn: Arc<Mutex<Connection>>,
    write_conn: Arc<Mutex<Connection>>,
}

impl SqliteCatalogStore {
    /// Open (creating if needed) the catalog database at `db_path`.
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path_ref = db_path.as_ref();

        let write_conn = Connection::open_with_flags(
            db_path_ref,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI
                | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .context("Failed to open catalog database")?;

        for collection in COLLECTIONS {
            write_conn
                .execute(&create_table_sql(collection), [])
                .with_context(|| format!("Failed to create {collection} table"))?;
        }

        write_conn
            .pragma_update(None, "journal_mode", "WAL")
            .context("Failed to set WAL mode on catalog write connection")?;

        let read_conn = Connection::open_with_flags(
            db_path_ref,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY
                | rusqlite::OpenFlags::SQLITE_OPEN_URI
                | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .context("Failed to open catalog database for reading")?;

        read_conn
            .pragma_update(None, "journal_mode", "WAL")
            .context("Failed to set WAL mode on catalog read connection")?;

        let store = Self {
            read_conn: Arc::new(Mutex::new(read_conn)),
            write_conn: Arc::new(Mutex::new(write_conn)),
        };

        let counts = store.counts()?;
        info!(
            "Catalog store ready: {} albums, {} singles, {} books, {} movies",
            counts.albums, counts.singles, counts.books, counts.movies
        );

        Ok(store)
    }

    fn find<T: CatalogRecord>(&self, filter: &Filter) -> Result<Vec<T>> {
        let compiled = filter.compile().context("Failed to compile filter")?;
        let conn = self.read_conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(&format!("SELECT doc FROM {}", T::COLLECTION))?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut matches = Vec::new();
        for doc in rows {
            let doc = doc?;
            let value: serde_json::Value = serde_json::from_str(&doc)
                .with_context(|| format!("Malformed document in {}", T::COLLECTION))?;
            if compiled.matches(&value) {
                matches.push(
                    serde_json::from_value(value)
                        .with_context(|| format!("Failed to decode {} record", T::COLLECTION))?,
                );
            }
        }
        Ok(matches)
    }

    fn upsert<T: CatalogRecord>(&self, record: &T) -> Result<UpsertOutcome> {
        let key = serde_json::to_string(&record.natural_key())?;
        let conn = self.write_conn.lock().unwrap();
        let existing: Option<String> = conn
            .query_row(
                &format!("SELECT doc FROM {} WHERE natural_key = ?1", T::COLLECTION),
                params![key],
                |r| r.get(0),
            )
            .optional()?;

        match existing {
            None => {
                conn.execute(
                    &format!(
                        "INSERT INTO {} (natural_key, doc) VALUES (?1, ?2)",
                        T::COLLECTION
                    ),
                    params![key, serde_json::to_string(record)?],
                )?;
                Ok(UpsertOutcome::Created)
            }
            Some(doc) => {
                let mut current: T = serde_json::from_str(&doc)
                    .with_context(|| format!("Malformed document in {}", T::COLLECTION))?;
                if current.apply_update(record) {
                    conn.execute(
                        &format!("UPDATE {} SET doc = ?1 WHERE natural_key = ?2", T::COLLECTION),
                        params![serde_json::to_string(&current)?, key],
                    )?;
                    Ok(UpsertOutcome::Updated)
                } else {
                    Ok(UpsertOutcome::Unchanged)
                }
            }
        }
    }

    fn delete<T: CatalogRecord>(&self, record: &T) -> Result<bool> {
        let key = serde_json::to_string(&record.natural_key())?;
        let conn = self.write_conn.lock().unwrap();
        let deleted = conn.execute(
            &format!("DELETE FROM {} WHERE natural_key = ?1", T::COLLECTION),
            params![key],
        )?;
        Ok(deleted > 0)
    }

    fn count(&self, collection: &str) -> Result<usize> {
        let conn = self.read_conn.lock().unwrap();
        let count: usize =
            conn.query_row(&format!("SELECT COUNT(*) FROM {collection}"), [], |r| {
                r.get(0)
            })?;
        Ok(count)
    }
}

impl CatalogStore for SqliteCatalogStore {
    fn find_albums(&self, filter: &Filter) -> Result<Vec<Album>> {
        self.find(filter)
    }

    fn upsert_album(&self, album: &Album) -> Result<UpsertOutcome> {
        self.upsert(album)
    }

    fn delete_album(&self, album: &Album) -> Result<bool> {
        self.delete(album)
    }

    fn find_books(&self, filter: &Filter) -> Result<Vec<Book>> {
        self.find(filter)
    }

    fn upsert_book(&self, book: &Book) -> Result<UpsertOutcome> {
        self.upsert(book)
    }

    fn delete_book(&self, book: &Book) -> Result<bool> {
        self.delete(book)
    }

    fn find_movies(&self, filter: &Filter) -> Result<Vec<Movie>> {
        self.find(filter)
    }

    fn upsert_movie(&self, movie: &Movie) -> Result<UpsertOutcome> {
        self.upsert(movie)
    }

    fn delete_movie(&self, movie: &Movie) -> Result<bool> {
        self.delete(movie)
    }

    fn find_singles(&self, filter: &Filter) -> Result<Vec<Single>> {
        self.find(filter)
    }

    fn insert_single(&self, single: &Single) -> Result<UpsertOutcome> {
        // apply_update is a no-op for singles, so an existing record
        // reports Unchanged rather than being rewritten.
        self.upsert(single)
    }

    fn delete_single(&self, single: &Single) -> Result<bool> {
        self.delete(single)
    }

    fn counts(&self) -> Result<CatalogCounts> {
        Ok(CatalogCounts {
            albums: self.count(Album::COLLECTION)?,
            singles: self.count(Single::COLLECTION)?,
            books: self.count(Book::COLLECTION)?,
            movies: self.count(Movie::COLLECTION)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{FilterBuilder, QueryItem, QueryParams};
    use chrono::{Duration, Utc};

    fn temp_store() -> (tempfile::TempDir, SqliteCatalogStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteCatalogStore::new(dir.path().join("catalog.db")).unwrap();
        (dir, store)
    }

    fn album(title: &str, artist: &str, year: i64) -> Album {
        Album {
            title: title.to_string(),
            artist: artist.to_string(),
            year,
            ..Default::default()
        }
    }

    fn params(pairs: &[(&str, &str)]) -> QueryParams {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn upsert_creates_then_updates() {
        let (_dir, store) = temp_store();
        let mut rec = album("Abbey Road", "The Beatles", 1969);
        assert_eq!(store.upsert_album(&rec).unwrap(), UpsertOutcome::Created);

        rec.rating = 5;
        assert_eq!(store.upsert_album(&rec).unwrap(), UpsertOutcome::Updated);
        assert_eq!(store.upsert_album(&rec).unwrap(), UpsertOutcome::Unchanged);

        let found = store.find_albums(&Filter::new()).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].rating, 5);
        assert_eq!(found[0].year, 1969);
    }

    #[test]
    fn update_preserves_fields_absent_from_the_body() {
        let (_dir, store) = temp_store();
        let mut rec = album("Kind of Blue", "Miles Davis", 1959);
        rec.genre = "Jazz".to_string();
        store.upsert_album(&rec).unwrap();

        let partial = Album {
            title: "Kind of Blue".to_string(),
            artist: "Miles Davis".to_string(),
            comment: "modal".to_string(),
            ..Default::default()
        };
        assert_eq!(store.upsert_album(&partial).unwrap(), UpsertOutcome::Updated);

        let found = store.find_albums(&Filter::new()).unwrap();
        assert_eq!(found[0].genre, "Jazz");
        assert_eq!(found[0].year, 1959);
        assert_eq!(found[0].comment, "modal");
    }

    #[test]
    fn find_with_filter_conditions() {
        let (_dir, store) = temp_store();
        let mut abbey = album("Abbey Road", "The Beatles", 1969);
        abbey.cuts = vec!["Come Together".to_string(), "Something".to_string()];
        store.upsert_album(&abbey).unwrap();
        store
            .upsert_album(&album("Led Zeppelin IV", "Led Zeppelin", 1971))
            .unwrap();

        let q = params(&[("artist", "beatles")]);
        let filter = FilterBuilder::new().with_string_field(&q, "artist").build();
        let found = store.find_albums(&filter).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "Abbey Road");

        let q = params(&[("year", "1971")]);
        let filter = FilterBuilder::new().with_int_field(&q, "year").build();
        let found = store.find_albums(&filter).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "Led Zeppelin IV");

        let q = params(&[("cuts", "Something, Come Together")]);
        let filter = FilterBuilder::new().with_array_field(&q, "cuts").build();
        let found = store.find_albums(&filter).unwrap();
        assert_eq!(found.len(), 1);

        let q = params(&[("cuts", "Stairway")]);
        let filter = FilterBuilder::new().with_array_field(&q, "cuts").build();
        assert!(store.find_albums(&filter).unwrap().is_empty());
    }

    #[test]
    fn delete_by_natural_key() {
        let (_dir, store) = temp_store();
        let rec = album("Abbey Road", "The Beatles", 1969);
        store.upsert_album(&rec).unwrap();

        let missing = album("Abbey Road", "Oasis", 0);
        assert!(!store.delete_album(&missing).unwrap());
        assert!(store.delete_album(&rec).unwrap());
        assert!(store.find_albums(&Filter::new()).unwrap().is_empty());
    }

    #[test]
    fn singles_are_insert_only() {
        let (_dir, store) = temp_store();
        let single = Single {
            title: "Something".to_string(),
            artists: vec!["The Beatles".to_string()],
            album: "Abbey Road".to_string(),
            last_modified: Utc::now(),
        };
        assert_eq!(
            store.insert_single(&single).unwrap(),
            UpsertOutcome::Created
        );

        let mut again = single.clone();
        again.last_modified = Utc::now() + Duration::hours(1);
        assert_eq!(
            store.insert_single(&again).unwrap(),
            UpsertOutcome::Unchanged
        );
        assert_eq!(store.find_singles(&Filter::new()).unwrap().len(), 1);
    }

    #[test]
    fn singles_time_window_query() {
        let (_dir, store) = temp_store();
        let now = Utc::now();
        let fresh = Single {
            title: "Fresh".to_string(),
            artists: vec!["A".to_string()],
            album: "X".to_string(),
            last_modified: now - Duration::hours(1),
        };
        let stale = Single {
            title: "Stale".to_string(),
            artists: vec!["B".to_string()],
            album: "Y".to_string(),
            last_modified: now - Duration::days(30),
        };
        store.insert_single(&fresh).unwrap();
        store.insert_single(&stale).unwrap();

        let item = QueryItem {
            duration: "7h".parse().unwrap(),
            ..Default::default()
        };
        let found = store.find_singles(&item.to_filter()).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "Fresh");
    }

    #[test]
    fn counts_reflect_contents() {
        let (_dir, store) = temp_store();
        store
            .upsert_album(&album("Abbey Road", "The Beatles", 1969))
            .unwrap();
        store
            .upsert_book(&Book {
                title: "Dune".to_string(),
                author: "Frank Herbert".to_string(),
                ..Default::default()
            })
            .unwrap();

        let counts = store.counts().unwrap();
        assert_eq!(counts.albums, 1);
        assert_eq!(counts.books, 1);
        assert_eq!(counts.movies, 0);
        assert_eq!(counts.singles, 0);
    }
}
