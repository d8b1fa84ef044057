//! Filter predicates and the chainable builder that assembles them from
//! raw request parameters.
//!
//! Every malformed filter input degrades to "no condition for this field";
//! the builder never errors. See [`crate::query::duration`] for the one
//! place where strictness is deliberate.

use chrono::{DateTime, Utc};
use regex::{Regex, RegexBuilder};
use std::collections::{BTreeMap, HashMap};

/// Raw request parameters: field name to raw string value.
pub type QueryParams = HashMap<String, String>;

/// A single per-field match condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Case-insensitive substring match on a string field.
    Contains(String),
    /// Exact equality on an integer field.
    Equals(i64),
    /// Array field must contain every one of these elements.
    ContainsAll(Vec<String>),
    /// Inclusive timestamp range; the lower bound is always present.
    Range {
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
    },
}

/// A set of per-field conditions, all of which must hold for a document
/// to match. An empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: BTreeMap<String, Condition>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn get(&self, field: &str) -> Option<&Condition> {
        self.conditions.get(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, condition: Condition) {
        self.conditions.insert(field.into(), condition);
    }

    /// Insert unless a condition already exists under `field` (first wins).
    pub fn insert_if_absent(&mut self, field: impl Into<String>, condition: Condition) {
        self.conditions.entry(field.into()).or_insert(condition);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Condition)> {
        self.conditions.iter()
    }

    /// Compile into a matcher usable against decoded JSON documents.
    pub fn compile(&self) -> Result<CompiledFilter, regex::Error> {
        let mut predicates = Vec::with_capacity(self.conditions.len());
        for (field, condition) in &self.conditions {
            let predicate = match condition {
                Condition::Contains(needle) => {
                    // Escaped, so user input is a literal substring and
                    // never an injectable pattern.
                    let re = RegexBuilder::new(&regex::escape(needle))
                        .case_insensitive(true)
                        .build()?;
                    Predicate::Matches(re)
                }
                Condition::Equals(n) => Predicate::Equals(*n),
                Condition::ContainsAll(items) => Predicate::ContainsAll(items.clone()),
                Condition::Range { start, end } => Predicate::Range {
                    start: *start,
                    end: *end,
                },
            };
            predicates.push((field.clone(), predicate));
        }
        Ok(CompiledFilter { predicates })
    }
}

enum Predicate {
    Matches(Regex),
    Equals(i64),
    ContainsAll(Vec<String>),
    Range {
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
    },
}

/// A [`Filter`] with its regexes compiled, ready to test documents.
pub struct CompiledFilter {
    predicates: Vec<(String, Predicate)>,
}

impl CompiledFilter {
    /// Whether `doc` satisfies every condition. A field that is missing
    /// or has the wrong shape fails its condition.
    pub fn matches(&self, doc: &serde_json::Value) -> bool {
        self.predicates.iter().all(|(field, predicate)| {
            let value = match doc.get(field) {
                Some(v) => v,
                None => return false,
            };
            match predicate {
                Predicate::Matches(re) => value.as_str().is_some_and(|s| re.is_match(s)),
                Predicate::Equals(n) => value.as_i64() == Some(*n),
                Predicate::ContainsAll(items) => value.as_array().is_some_and(|arr| {
                    items
                        .iter()
                        .all(|item| arr.iter().any(|v| v.as_str() == Some(item)))
                }),
                Predicate::Range { start, end } => match value.as_str() {
                    Some(s) => match DateTime::parse_from_rfc3339(s) {
                        Ok(t) => {
                            let t = t.with_timezone(&Utc);
                            t >= *start && end.map(|e| t <= e).unwrap_or(true)
                        }
                        Err(_) => false,
                    },
                    None => false,
                },
            }
        })
    }
}

/// Accumulates field conditions from raw parameters, one call per field.
/// Single use: `build` consumes the builder.
#[derive(Debug, Default)]
pub struct FilterBuilder {
    filter: Filter,
}

impl FilterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Case-insensitive substring condition from a string parameter.
    /// Blank or absent values add nothing.
    pub fn with_string_field(mut self, params: &QueryParams, field: &str) -> Self {
        if let Some(v) = params.get(field).map(|v| v.trim()) {
            if !v.is_empty() {
                self.filter.insert(field, Condition::Contains(v.to_string()));
            }
        }
        self
    }

    /// Exact-equality condition from an integer parameter. Unparseable
    /// values are treated like absent ones.
    pub fn with_int_field(mut self, params: &QueryParams, field: &str) -> Self {
        if let Some(v) = params.get(field).map(|v| v.trim()) {
            if let Ok(n) = v.parse::<i64>() {
                self.filter.insert(field, Condition::Equals(n));
            }
        }
        self
    }

    /// Contains-all condition from a comma-separated parameter. Blank
    /// parts are dropped; an all-blank list adds nothing.
    pub fn with_array_field(mut self, params: &QueryParams, field: &str) -> Self {
        if let Some(raw) = params.get(field) {
            let parts: Vec<String> = raw
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect();
            if !parts.is_empty() {
                self.filter.insert(field, Condition::ContainsAll(parts));
            }
        }
        self
    }

    /// Like [`with_string_field`](Self::with_string_field) but reads the
    /// value from `param` and files the condition under `field`. Does not
    /// overwrite a condition already present under `field`.
    pub fn with_mapped_string_field(
        mut self,
        params: &QueryParams,
        param: &str,
        field: &str,
    ) -> Self {
        if self.filter.get(field).is_some() {
            return self;
        }
        if let Some(v) = params.get(param).map(|v| v.trim()) {
            if !v.is_empty() {
                self.filter
                    .insert_if_absent(field, Condition::Contains(v.to_string()));
            }
        }
        self
    }

    pub fn build(self) -> Filter {
        self.filter
    }
}
