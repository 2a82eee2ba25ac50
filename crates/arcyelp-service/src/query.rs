//! The layer query endpoint.

use arcyelp_core::{
    Document, EnrichOptions, GeometryFormat, NormalizedDisplayRecord, ToDocument, enrich,
    normalize,
};
use arcyelp_fusion::SearchParams;
use axum::Json;
use axum::extract::State;
use serde_json::Value;
use tracing::{info, warn};

use crate::error::ServiceError;
use crate::params::QueryParams;
use crate::{AppState, layer};

/// Yelp search parameters forwarded verbatim when present.
const PASSTHROUGH: &[&str] = &["categories", "price", "open_now", "open_at", "attributes", "locale"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Esri,
    GeoJson,
}

/// `where` must be present; `1=1` is the only clause understood.
fn check_where(params: &QueryParams) -> Result<(), ServiceError> {
    let clause = params.get("where").ok_or(ServiceError::MissingWhere)?;
    let compact: String = clause.chars().filter(|c| !c.is_whitespace()).collect();
    if compact == "1=1" {
        Ok(())
    } else {
        Err(ServiceError::UnsupportedWhere(clause.to_string()))
    }
}

fn output_format(params: &QueryParams) -> OutputFormat {
    match params.get("f") {
        Some(f) if f.eq_ignore_ascii_case("geojson") => OutputFormat::GeoJson,
        _ => OutputFormat::Esri,
    }
}

fn search_params(longitude: f64, latitude: f64, params: &QueryParams) -> Result<SearchParams, ServiceError> {
    let mut search = SearchParams::new(longitude, latitude);
    if let Some(term) = params.get("term") {
        search = search.term(term);
    }
    if let Some(sort_by) = params.get("sort_by") {
        search = search.sort_by(sort_by);
    }
    if let Some(radius) = params.parse(&["radius"])? {
        search = search.radius(radius);
    }
    if let Some(limit) = params.parse(&["limit", "resultRecordCount"])? {
        search = search.limit(limit);
    }
    for &key in PASSTHROUGH {
        if let Some(value) = params.get(key) {
            search = search.param(key, value);
        }
    }
    Ok(search)
}

/// Search upstream, enrich, and write the enriched documents to the store.
async fn live_documents(
    state: &AppState,
    search: &SearchParams,
    geometry_format: GeometryFormat,
) -> Result<Vec<Document>, ServiceError> {
    let client = state.fusion.as_ref().ok_or(ServiceError::NotConfigured("Yelp API client"))?;
    let records = client.search(search).await?;

    let options = EnrichOptions::new(state.settings.resolutions.iter().copied(), geometry_format);
    let outcome = enrich(&records, &options)?;
    if !outcome.is_complete() {
        warn!(
            skipped = ?outcome.failed_ids().collect::<Vec<_>>(),
            "businesses without coordinates left out of the response"
        );
    }

    let documents = outcome
        .records
        .iter()
        .map(|r| r.to_document())
        .collect::<Result<Vec<_>, _>>()?;

    if let Some(store) = &state.store {
        store.upsert(&documents).await?;
    }
    Ok(documents)
}

async fn stored_documents(state: &AppState) -> Result<Vec<Document>, ServiceError> {
    let store = state.store.as_ref().ok_or(ServiceError::NotConfigured("document store"))?;
    Ok(store.list().await?)
}

pub(crate) async fn layer_query(
    State(state): State<AppState>,
    params: QueryParams,
) -> Result<Json<Value>, ServiceError> {
    check_where(&params)?;
    let format = output_format(&params);
    let geometry_format = match format {
        OutputFormat::Esri => GeometryFormat::Native,
        OutputFormat::GeoJson => GeometryFormat::GeoJson,
    };

    let longitude = params.parse::<f64>(&["longitude", "x"])?;
    let latitude = params.parse::<f64>(&["latitude", "y"])?;
    let documents = match (longitude, latitude) {
        (Some(lon), Some(lat)) => {
            let search = search_params(lon, lat, &params)?;
            live_documents(&state, &search, geometry_format).await?
        }
        (None, None) => stored_documents(&state).await?,
        _ => {
            return Err(ServiceError::invalid(
                "longitude/latitude",
                "both or neither must be given",
            ));
        }
    };

    let records = documents
        .iter()
        .map(|doc| normalize(doc, &state.settings.keep_keys))
        .collect::<Result<Vec<NormalizedDisplayRecord>, _>>()?;
    info!(count = records.len(), ?format, "answered layer query");

    Ok(Json(match format {
        OutputFormat::Esri => layer::feature_set(&state.settings, &records),
        OutputFormat::GeoJson => layer::feature_collection(&records),
    }))
}
