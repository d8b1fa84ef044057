//! SQLite schema for the catalog database.
//!
//! Each collection is a table of JSON documents keyed by the record's
//! natural key (serialized key fields), mirroring the unique indexes the
//! service has always enforced per collection.

pub const COLLECTIONS: &[&str] = &["albums", "singles", "books", "movies"];

pub fn create_table_sql(collection: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {collection} (
            id INTEGER PRIMARY KEY,
            natural_key TEXT NOT NULL UNIQUE,
            doc TEXT NOT NULL
        )"
    )
}
