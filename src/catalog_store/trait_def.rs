//! CatalogStore trait definition.

use crate::catalog::{Album, Book, Movie, Single};
use crate::query::Filter;
use anyhow::Result;

/// What an upsert did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
    Unchanged,
}

/// Record counts per collection, for startup logging and stats.
#[derive(Debug, Clone, Copy, Default)]
pub struct CatalogCounts {
    pub albums: usize,
    pub singles: usize,
    pub books: usize,
    pub movies: usize,
}

/// Trait for catalog storage backends. Deletes address a record by its
/// natural key; the other fields of the passed record are ignored.
pub trait CatalogStore: Send + Sync {
    fn find_albums(&self, filter: &Filter) -> Result<Vec<Album>>;
    fn upsert_album(&self, album: &Album) -> Result<UpsertOutcome>;
    fn delete_album(&self, album: &Album) -> Result<bool>;

    fn find_books(&self, filter: &Filter) -> Result<Vec<Book>>;
    fn upsert_book(&self, book: &Book) -> Result<UpsertOutcome>;
    fn delete_book(&self, book: &Book) -> Result<bool>;

    fn find_movies(&self, filter: &Filter) -> Result<Vec<Movie>>;
    fn upsert_movie(&self, movie: &Movie) -> Result<UpsertOutcome>;
    fn delete_movie(&self, movie: &Movie) -> Result<bool>;

    fn find_singles(&self, filter: &Filter) -> Result<Vec<Single>>;
    /// Insert-if-absent: singles never change once pinned.
    fn insert_single(&self, single: &Single) -> Result<UpsertOutcome>;
    fn delete_single(&self, single: &Single) -> Result<bool>;

    fn counts(&self) -> Result<CatalogCounts>;
}
