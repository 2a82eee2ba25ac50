//! ArcGIS feature-service JSON: server and layer descriptions, feature sets.

use arcyelp_core::esri::{self, OBJECT_ID_FIELD};
use arcyelp_core::{GeometryFormat, GeometryValue, NormalizedDisplayRecord, SpatialReference};
use serde_json::{Map, Value, json};

use crate::ServiceSettings;

/// The only layer this service exposes.
pub const LAYER_ID: u32 = 0;

const GEOMETRY_TYPE: &str = "esriGeometryPoint";

fn world_extent() -> Value {
    json!({
        "xmin": -180.0,
        "ymin": -90.0,
        "xmax": 180.0,
        "ymax": 90.0,
        "spatialReference": SpatialReference::wgs84_latest(),
    })
}

/// Response for the service root.
pub fn service_info(settings: &ServiceSettings) -> Value {
    json!({
        "serviceDescription": settings.description,
        "description": settings.description,
        "hasStaticData": false,
        "supportedQueryFormats": "JSON",
        "capabilities": "Query",
        "copyrightText": "",
        "spatialReference": SpatialReference::wgs84_latest(),
        "initialExtent": world_extent(),
        "fullExtent": world_extent(),
        "units": "esriDecimalDegrees",
        "layers": [{
            "id": LAYER_ID,
            "name": settings.name,
            "parentLayerId": -1,
            "defaultVisibility": true,
            "subLayerIds": null,
            "minScale": 0,
            "maxScale": 0,
            "geometryType": GEOMETRY_TYPE,
        }],
        "tables": [],
    })
}

/// Response for the layer endpoint.
pub fn layer_info(settings: &ServiceSettings) -> Value {
    json!({
        "id": LAYER_ID,
        "name": settings.name,
        "type": "Feature Layer",
        "description": settings.description,
        "geometryType": GEOMETRY_TYPE,
        "objectIdField": OBJECT_ID_FIELD,
        "displayField": "name",
        "fields": esri::business_fields(&settings.keep_keys, &settings.resolutions),
        "extent": world_extent(),
        "spatialReference": SpatialReference::wgs84_latest(),
        "capabilities": "Query",
        "supportedQueryFormats": "JSON, geoJSON",
        "hasAttachments": false,
        "minScale": 0,
        "maxScale": 0,
    })
}

/// Attributes (everything but `geometry`, plus a 1-based object id) and the
/// point in `format`, if the record has one.
fn split_record(
    index: usize,
    record: &NormalizedDisplayRecord,
    format: GeometryFormat,
) -> (Map<String, Value>, Option<GeometryValue>) {
    let mut attributes = record.as_document().clone();
    let geometry = attributes
        .remove("geometry")
        .and_then(|g| serde_json::from_value::<GeometryValue>(g).ok())
        .map(|g| g.to_format(format));
    attributes.insert(OBJECT_ID_FIELD.into(), json!(index + 1));
    (attributes, geometry)
}

/// Esri JSON feature set for `records`.
pub fn feature_set(settings: &ServiceSettings, records: &[NormalizedDisplayRecord]) -> Value {
    let features: Vec<Value> = records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let (attributes, geometry) = split_record(i, record, GeometryFormat::Native);
            json!({ "attributes": attributes, "geometry": geometry })
        })
        .collect();

    json!({
        "objectIdFieldName": OBJECT_ID_FIELD,
        "geometryType": GEOMETRY_TYPE,
        "spatialReference": SpatialReference::wgs84_latest(),
        "fields": esri::business_fields(&settings.keep_keys, &settings.resolutions),
        "features": features,
        "exceededTransferLimit": false,
    })
}

/// GeoJSON feature collection for `records`.
pub fn feature_collection(records: &[NormalizedDisplayRecord]) -> Value {
    let features: Vec<Value> = records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let (properties, geometry) = split_record(i, record, GeometryFormat::GeoJson);
            json!({
                "type": "Feature",
                "id": i + 1,
                "geometry": geometry,
                "properties": properties,
            })
        })
        .collect();

    json!({ "type": "FeatureCollection", "features": features })
}
