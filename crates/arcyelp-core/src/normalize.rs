//! Display normalisation for business documents.
//!
//! Turns the nested `location.display_address` and `categories` structures
//! into single strings and projects the document onto an allow-list of keys.
//! `h3_XX` cell fields and `geometry` always survive the projection.
//!
//! Normalising an already-normalised record is a no-op.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::EnrichError;
use crate::record::{Document, ToDocument};
use crate::spatial::is_cell_field;

/// Keys kept for display when no explicit allow-list is given.
pub const DEFAULT_KEEP_KEYS: &[&str] = &[
    "id",
    "name",
    "image_url",
    "url",
    "review_count",
    "categories",
    "rating",
    "price",
    "address",
];

const ADDRESS_SEPARATOR: &str = ", ";
const CATEGORY_SEPARATOR: &str = ", ";

/// Allow-list of document keys retained by [`normalize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeepKeys(BTreeSet<String>);

impl KeepKeys {
    /// Whether `key` survives projection.
    pub fn retains(&self, key: &str) -> bool {
        self.0.contains(key) || key == "geometry" || is_cell_field(key)
    }

    /// Explicitly listed keys, sorted.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl Default for KeepKeys {
    fn default() -> Self {
        DEFAULT_KEEP_KEYS.iter().copied().collect()
    }
}

impl<S: Into<String>> FromIterator<S> for KeepKeys {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// A display-ready projection of a business document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedDisplayRecord(Document);

impl NormalizedDisplayRecord {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn id(&self) -> Option<&str> {
        self.get("id").and_then(Value::as_str)
    }

    pub fn address(&self) -> Option<&str> {
        self.get("address").and_then(Value::as_str)
    }

    pub fn categories(&self) -> Option<&str> {
        self.get("categories").and_then(Value::as_str)
    }

    pub fn as_document(&self) -> &Document {
        &self.0
    }

    pub fn into_document(self) -> Document {
        self.0
    }
}

impl ToDocument for NormalizedDisplayRecord {
    fn to_document(&self) -> Result<Document, EnrichError> {
        Ok(self.0.clone())
    }
}

/// Normalise one record for display.
///
/// 1. `location.display_address`, when present, becomes `address` joined with `", "`.
/// 2. `categories`, when a list, becomes its titles sorted ascending and joined
///    with `", "`. An empty list yields `""`.
/// 3. Keys outside `keep_keys` (plus `h3_XX` and `geometry`) are dropped.
///    Kept keys missing from the record stay missing.
pub fn normalize<R>(record: &R, keep_keys: &KeepKeys) -> Result<NormalizedDisplayRecord, EnrichError>
where
    R: ToDocument + ?Sized,
{
    let mut doc = record.to_document()?;

    if let Some(address) = display_address(&doc) {
        doc.insert("address".into(), Value::String(address));
    }

    if let Some(categories) = doc.get("categories").and_then(category_titles) {
        doc.insert("categories".into(), Value::String(categories));
    }

    doc.retain(|key, _| keep_keys.retains(key));
    Ok(NormalizedDisplayRecord(doc))
}

fn display_address(doc: &Document) -> Option<String> {
    let lines = doc.get("location")?.get("display_address")?.as_array()?;
    let lines: Vec<&str> = lines.iter().filter_map(Value::as_str).collect();
    Some(lines.join(ADDRESS_SEPARATOR))
}

/// Sorted, joined titles for a category list. Anything but a list (including
/// an already-joined string) is left alone.
fn category_titles(categories: &Value) -> Option<String> {
    let items = categories.as_array()?;
    let mut titles: Vec<&str> = items
        .iter()
        .map(|c| c.get("title").and_then(Value::as_str).unwrap_or_default())
        .collect();
    titles.sort();
    Some(titles.join(CATEGORY_SEPARATOR))
}
