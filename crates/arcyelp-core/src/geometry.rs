//! Point geometry in either GeoJSON or ArcGIS-native JSON form.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EnrichError;

/// WGS 84 geographic coordinates (EPSG:4326).
pub const WKID_WGS84: u32 = 4326;

/// Which geometry dialect a pipeline invocation emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GeometryFormat {
    /// `{"type": "Point", "coordinates": [lon, lat]}`
    #[default]
    GeoJson,
    /// ArcGIS JSON point tagged with WKID 4326.
    Native,
}

impl GeometryFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            GeometryFormat::GeoJson => "geojson",
            GeometryFormat::Native => "arcgis",
        }
    }
}

impl fmt::Display for GeometryFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GeometryFormat {
    type Err = EnrichError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "geojson" => Ok(GeometryFormat::GeoJson),
            "arcgis" | "native" | "esri" => Ok(GeometryFormat::Native),
            _ => Err(EnrichError::UnsupportedGeometryFormat(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpatialReference {
    pub wkid: u32,
    #[serde(
        rename = "latestWkid",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub latest_wkid: Option<u32>,
}

impl SpatialReference {
    pub fn wgs84() -> Self {
        Self {
            wkid: WKID_WGS84,
            latest_wkid: None,
        }
    }

    /// WGS 84 with `latestWkid`, as feature-service metadata spells it.
    pub fn wgs84_latest() -> Self {
        Self {
            wkid: WKID_WGS84,
            latest_wkid: Some(WKID_WGS84),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeoJsonType {
    Point,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoJsonPoint {
    #[serde(rename = "type")]
    pub kind: GeoJsonType,
    /// `[longitude, latitude]`
    pub coordinates: [f64; 2],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NativePoint {
    pub x: f64,
    pub y: f64,
    #[serde(rename = "spatialReference")]
    pub spatial_reference: SpatialReference,
}

/// A point in one of the two supported dialects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GeometryValue {
    GeoJson(GeoJsonPoint),
    Native(NativePoint),
}

impl GeometryValue {
    pub fn format(&self) -> GeometryFormat {
        match self {
            GeometryValue::GeoJson(_) => GeometryFormat::GeoJson,
            GeometryValue::Native(_) => GeometryFormat::Native,
        }
    }

    /// `(longitude, latitude)` regardless of dialect.
    pub fn lon_lat(&self) -> (f64, f64) {
        match self {
            GeometryValue::GeoJson(p) => (p.coordinates[0], p.coordinates[1]),
            GeometryValue::Native(p) => (p.x, p.y),
        }
    }

    /// The same point re-expressed in `format`.
    pub fn to_format(&self, format: GeometryFormat) -> GeometryValue {
        let (longitude, latitude) = self.lon_lat();
        build_point(longitude, latitude, format)
    }
}

/// Build a point from `(longitude, latitude)`. Note the x-then-y argument order.
pub fn build_point(longitude: f64, latitude: f64, format: GeometryFormat) -> GeometryValue {
    match format {
        GeometryFormat::GeoJson => GeometryValue::GeoJson(GeoJsonPoint {
            kind: GeoJsonType::Point,
            coordinates: [longitude, latitude],
        }),
        GeometryFormat::Native => GeometryValue::Native(NativePoint {
            x: longitude,
            y: latitude,
            spatial_reference: SpatialReference::wgs84(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn geojson_point_is_lon_lat() {
        let pt = build_point(-122.33, 47.6, GeometryFormat::GeoJson);
        assert_eq!(
            serde_json::to_value(&pt).unwrap(),
            json!({"type": "Point", "coordinates": [-122.33, 47.6]})
        );
    }

    #[test]
    fn native_point_carries_wkid() {
        let pt = build_point(-122.33, 47.6, GeometryFormat::Native);
        assert_eq!(
            serde_json::to_value(&pt).unwrap(),
            json!({"x": -122.33, "y": 47.6, "spatialReference": {"wkid": 4326}})
        );
    }

    #[test]
    fn untagged_parse_recovers_dialect() {
        let geojson: GeometryValue =
            serde_json::from_value(json!({"type": "Point", "coordinates": [1.0, 2.0]})).unwrap();
        assert_eq!(geojson.format(), GeometryFormat::GeoJson);

        let native: GeometryValue = serde_json::from_value(
            json!({"x": 1.0, "y": 2.0, "spatialReference": {"wkid": 4326}}),
        )
        .unwrap();
        assert_eq!(native.format(), GeometryFormat::Native);
        assert_eq!(native.lon_lat(), (1.0, 2.0));
    }

    #[test]
    fn conversion_preserves_coordinates() {
        let pt = build_point(-122.33, 47.6, GeometryFormat::GeoJson);
        let native = pt.to_format(GeometryFormat::Native);
        assert_eq!(native.lon_lat(), (-122.33, 47.6));
        assert_eq!(native.to_format(GeometryFormat::GeoJson), pt);
    }

    #[test]
    fn format_names() {
        assert_eq!("geojson".parse::<GeometryFormat>().unwrap(), GeometryFormat::GeoJson);
        assert_eq!("ArcGIS".parse::<GeometryFormat>().unwrap(), GeometryFormat::Native);
        assert_eq!("native".parse::<GeometryFormat>().unwrap(), GeometryFormat::Native);
        assert!(matches!(
            "wkt".parse::<GeometryFormat>(),
            Err(EnrichError::UnsupportedGeometryFormat(name)) if name == "wkt"
        ));
    }
}
