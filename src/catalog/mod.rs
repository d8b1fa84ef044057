//! Catalog entity models.
//!
//! Each record type carries a natural key (the fields that identify it
//! uniquely within its collection) and knows how to fold a partial update
//! into itself: blank strings and zero numbers in the update leave the
//! existing value alone.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A record stored in one of the catalog collections.
pub trait CatalogRecord: Serialize + DeserializeOwned + PartialEq + Clone + Send + Sync {
    /// Collection (table) the record lives in.
    const COLLECTION: &'static str;

    /// Natural-key values, in schema column order.
    fn natural_key(&self) -> Vec<String>;

    /// Whether the natural-key fields are all present.
    fn has_natural_key(&self) -> bool {
        self.natural_key().iter().all(|k| !k.is_empty())
    }

    /// Fold the non-blank fields of `update` into self; returns true when
    /// anything changed.
    fn apply_update(&mut self, update: &Self) -> bool;
}

fn set_string(target: &mut String, value: &str, changed: &mut bool) {
    if !value.is_empty() && target != value {
        *target = value.to_string();
        *changed = true;
    }
}

fn set_int(target: &mut i64, value: i64, changed: &mut bool) {
    if value != 0 && *target != value {
        *target = value;
        *changed = true;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Album {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub genre: String,
    #[serde(default)]
    pub year: i64,
    #[serde(default)]
    pub cuts: Vec<String>,
    #[serde(default)]
    pub url: String,
    /// URL of the cover artwork.
    #[serde(default)]
    pub artwork: String,
    #[serde(default)]
    pub comment: String,
    /// 0 to 5.
    #[serde(default)]
    pub rating: i64,
}

impl CatalogRecord for Album {
    const COLLECTION: &'static str = "albums";

    fn natural_key(&self) -> Vec<String> {
        vec![self.title.clone(), self.artist.clone()]
    }

    fn apply_update(&mut self, update: &Self) -> bool {
        let mut changed = false;
        set_string(&mut self.genre, &update.genre, &mut changed);
        set_int(&mut self.year, update.year, &mut changed);
        if !update.cuts.is_empty() && self.cuts != update.cuts {
            self.cuts = update.cuts.clone();
            changed = true;
        }
        set_string(&mut self.url, &update.url, &mut changed);
        set_string(&mut self.artwork, &update.artwork, &mut changed);
        set_string(&mut self.comment, &update.comment, &mut changed);
        set_int(&mut self.rating, update.rating, &mut changed);
        changed
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Book {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub genre: String,
    #[serde(default)]
    pub year: i64,
    #[serde(default)]
    pub url: String,
    /// URL of the cover image.
    #[serde(default)]
    pub cover: String,
    #[serde(default)]
    pub comment: String,
    /// 0 to 5.
    #[serde(default)]
    pub rating: i64,
}

impl CatalogRecord for Book {
    const COLLECTION: &'static str = "books";

    fn natural_key(&self) -> Vec<String> {
        vec![self.title.clone(), self.author.clone()]
    }

    fn apply_update(&mut self, update: &Self) -> bool {
        let mut changed = false;
        set_string(&mut self.genre, &update.genre, &mut changed);
        set_int(&mut self.year, update.year, &mut changed);
        set_string(&mut self.url, &update.url, &mut changed);
        set_string(&mut self.cover, &update.cover, &mut changed);
        set_string(&mut self.comment, &update.comment, &mut changed);
        set_int(&mut self.rating, update.rating, &mut changed);
        changed
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub director: String,
    #[serde(default)]
    pub genre: String,
    #[serde(default)]
    pub year: i64,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub rating: i64,
}

impl CatalogRecord for Movie {
    const COLLECTION: &'static str = "movies";

    fn natural_key(&self) -> Vec<String> {
        vec![self.title.clone(), self.director.clone()]
    }

    fn apply_update(&mut self, update: &Self) -> bool {
        let mut changed = false;
        set_string(&mut self.genre, &update.genre, &mut changed);
        set_int(&mut self.year, update.year, &mut changed);
        set_string(&mut self.url, &update.url, &mut changed);
        set_string(&mut self.comment, &update.comment, &mut changed);
        set_int(&mut self.rating, update.rating, &mut changed);
        changed
    }
}

/// A single track pinned from an album, stamped on insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Single {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub artists: Vec<String>,
    #[serde(default)]
    pub album: String,
    #[serde(default = "Utc::now")]
    pub last_modified: DateTime<Utc>,
}

impl Default for Single {
    fn default() -> Self {
        Single {
            title: String::new(),
            artists: Vec::new(),
            album: String::new(),
            last_modified: Utc::now(),
        }
    }
}

impl CatalogRecord for Single {
    const COLLECTION: &'static str = "singles";

    fn natural_key(&self) -> Vec<String> {
        vec![
            self.title.clone(),
            serde_json::to_string(&self.artists).unwrap_or_default(),
            self.album.clone(),
        ]
    }

    fn has_natural_key(&self) -> bool {
        !self.title.is_empty() && !self.artists.is_empty() && !self.album.is_empty()
    }

    // Singles are insert-only; an existing record never changes.
    fn apply_update(&mut self, _update: &Self) -> bool {
        false
    }
}
