//! In-memory catalog store, for tests and for running the server without
//! a database file.

use super::trait_def::{CatalogCounts, CatalogStore, UpsertOutcome};
use crate::catalog::{Album, Book, CatalogRecord, Movie, Single};
use crate::query::Filter;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::sync::Mutex;

/// Per-collection vectors of (natural key, document) pairs behind a lock.
#[derive(Default)]
pub struct InMemoryCatalogStore {
    collections: Mutex<HashMap<&'static str, Vec<(String, serde_json::Value)>>>,
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn find<T: CatalogRecord>(&self, filter: &Filter) -> Result<Vec<T>> {
        let compiled = filter.compile().context("Failed to compile filter")?;
        let collections = self.collections.lock().unwrap();
        let docs = collections.get(T::COLLECTION).map(Vec::as_slice).unwrap_or(&[]);
        docs.iter()
            .filter(|(_, doc)| compiled.matches(doc))
            .map(|(_, doc)| {
                serde_json::from_value(doc.clone())
                    .with_context(|| format!("Failed to decode {} record", T::COLLECTION))
            })
            .collect()
    }

    fn upsert<T: CatalogRecord>(&self, record: &T) -> Result<UpsertOutcome> {
        let key = serde_json::to_string(&record.natural_key())?;
        let mut collections = self.collections.lock().unwrap();
        let docs = collections.entry(T::COLLECTION).or_default();

        match docs.iter().position(|(k, _)| *k == key) {
            None => {
                docs.push((key, serde_json::to_value(record)?));
                Ok(UpsertOutcome::Created)
            }
            Some(i) => {
                let mut current: T = serde_json::from_value(docs[i].1.clone())
                    .with_context(|| format!("Malformed document in {}", T::COLLECTION))?;
                if current.apply_update(record) {
                    docs[i].1 = serde_json::to_value(&current)?;
                    Ok(UpsertOutcome::Updated)
                } else {
                    Ok(UpsertOutcome::Unchanged)
                }
            }
        }
    }

    fn delete<T: CatalogRecord>(&self, record: &T) -> Result<bool> {
        let key = serde_json::to_string(&record.natural_key())?;
        let mut collections = self.collections.lock().unwrap();
        let docs = collections.entry(T::COLLECTION).or_default();
        let before = docs.len();
        docs.retain(|(k, _)| *k != key);
        Ok(docs.len() < before)
    }

    fn count(&self, collection: &str) -> usize {
        self.collections
            .lock()
            .unwrap()
            .get(collection)
            .map(Vec::len)
            .unwrap_or(0)
    }
}

impl CatalogStore for InMemoryCatalogStore {
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
        self.upsert(single)
    }

    fn delete_single(&self, single: &Single) -> Result<bool> {
        self.delete(single)
    }

    fn counts(&self) -> Result<CatalogCounts> {
        Ok(CatalogCounts {
            albums: self.count(Album::COLLECTION),
            singles: self.count(Single::COLLECTION),
            books: self.count(Book::COLLECTION),
            movies: self.count(Movie::COLLECTION),
        })
    }
}
