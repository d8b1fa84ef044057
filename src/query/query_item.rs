//! Structured query parameters for the singles collection, used by the
//! assistant's `query_singles` tool.

use super::duration::HumanDuration;
use super::filter::{Condition, Filter};
use super::window::resolve_window;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tool-facing query parameters. Every field is optional; blank fields
/// contribute nothing to the resulting filter. `start_point` must be
/// `null` when absent, not an empty string.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryItem {
    #[serde(default)]
    pub album: String,
    #[serde(default)]
    pub artists: Vec<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub duration: HumanDuration,
    #[serde(default)]
    pub start_point: Option<DateTime<Utc>>,
}

impl QueryItem {
    /// Build the filter for this query, sampling the clock now.
    pub fn to_filter(&self) -> Filter {
        self.to_filter_at(Utc::now())
    }

    /// Pure variant of [`to_filter`](Self::to_filter) with an injected
    /// evaluation instant.
    pub fn to_filter_at(&self, now: DateTime<Utc>) -> Filter {
        let mut filter = Filter::new();

        let album = self.album.trim();
        if !album.is_empty() {
            filter.insert("album", Condition::Contains(album.to_string()));
        }

        let artists: Vec<String> = self
            .artists
            .iter()
            .map(|a| a.trim())
            .filter(|a| !a.is_empty())
            .map(str::to_string)
            .collect();
        if !artists.is_empty() {
            filter.insert("artists", Condition::ContainsAll(artists));
        }

        let title = self.title.trim();
        if !title.is_empty() {
            filter.insert("title", Condition::Contains(title.to_string()));
        }

        if let Some(window) = resolve_window(self.start_point, self.duration, now) {
            window.apply(&mut filter);
        }

        filter
    }
}
