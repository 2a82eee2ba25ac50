//! Business records at each stage of the pipeline.
//!
//! A [`RawBusinessRecord`] is what the search API hands back. Enrichment
//! produces an [`EnrichedBusinessRecord`], and display normalisation works on
//! the flat JSON [`Document`] form of either.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::EnrichError;
use crate::geometry::GeometryValue;
use crate::spatial::{cell_field_name, is_cell_field};

/// A flat JSON object, the shape records take in the document store and on the wire.
pub type Document = Map<String, Value>;

/// Conversion into the flat [`Document`] form.
pub trait ToDocument {
    fn to_document(&self) -> Result<Document, EnrichError>;
}

impl ToDocument for Document {
    fn to_document(&self) -> Result<Document, EnrichError> {
        Ok(self.clone())
    }
}

/// Latitude/longitude pair. Either half may be null upstream.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coordinates {
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude: Some(latitude),
            longitude: Some(longitude),
        }
    }

    /// `(latitude, longitude)`, or `None` unless both halves are present.
    pub fn pair(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Location {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_address: Option<Vec<String>>,
    /// Street, city, zip and the rest, passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Category {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default)]
    pub title: String,
}

impl Category {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            alias: None,
            title: title.into(),
        }
    }
}

/// One business exactly as returned by the search API.
///
/// Fields the pipeline reads are typed; everything else the upstream sends
/// (`alias`, `phone`, `distance`, `transactions`, ...) rides along in `extra`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawBusinessRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<Category>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RawBusinessRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// `(latitude, longitude)` when the record carries a complete pair.
    pub fn lat_lng(&self) -> Option<(f64, f64)> {
        self.coordinates.as_ref().and_then(Coordinates::pair)
    }
}

impl ToDocument for RawBusinessRecord {
    fn to_document(&self) -> Result<Document, EnrichError> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            _ => Err(EnrichError::NotAnObject),
        }
    }
}

/// A raw record plus its H3 cells, point geometry, and batch timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedBusinessRecord {
    pub record: RawBusinessRecord,
    /// Resolution → cell identifier, ascending by resolution.
    pub cells: BTreeMap<u8, String>,
    pub geometry: GeometryValue,
    /// ISO-8601, shared by every record enriched in the same call.
    pub retrieval_timestamp: String,
}

impl EnrichedBusinessRecord {
    pub fn id(&self) -> &str {
        &self.record.id
    }

    pub fn cell(&self, resolution: u8) -> Option<&str> {
        self.cells.get(&resolution).map(String::as_str)
    }
}

impl ToDocument for EnrichedBusinessRecord {
    /// Raw fields first, then `h3_XX`, `geometry` and `retrieval_timestamp`.
    ///
    /// Derived keys left over from an earlier enrichment of the same record
    /// are replaced, never duplicated.
    fn to_document(&self) -> Result<Document, EnrichError> {
        let mut doc = self.record.to_document()?;
        doc.retain(|key, _| !is_cell_field(key));
        for (&resolution, cell) in &self.cells {
            doc.insert(cell_field_name(resolution), Value::String(cell.clone()));
        }
        doc.insert("geometry".into(), serde_json::to_value(&self.geometry)?);
        doc.insert(
            "retrieval_timestamp".into(),
            Value::String(self.retrieval_timestamp.clone()),
        );
        Ok(doc)
    }
}

impl Serialize for EnrichedBusinessRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_document()
            .map_err(serde::ser::Error::custom)?
            .serialize(serializer)
    }
}
