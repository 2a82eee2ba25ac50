//! Enrichment pipeline: H3 cells, point geometry, and a batch timestamp.
//!
//! Records without a usable coordinate pair are reported back as
//! [`RecordFailure`]s while the rest of the batch goes through. Invalid
//! resolutions and out-of-range coordinates abort the whole call.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::RangeInclusive;

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{info, warn};

use crate::error::EnrichError;
use crate::geometry::{GeometryFormat, build_point};
use crate::record::{EnrichedBusinessRecord, RawBusinessRecord};
use crate::spatial;

/// Resolutions indexed when none are configured.
pub const DEFAULT_RESOLUTIONS: RangeInclusive<u8> = 4..=10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichOptions {
    /// Indexed in ascending order.
    pub resolutions: BTreeSet<u8>,
    pub geometry_format: GeometryFormat,
}

impl EnrichOptions {
    pub fn new(resolutions: impl IntoIterator<Item = u8>, geometry_format: GeometryFormat) -> Self {
        Self {
            resolutions: resolutions.into_iter().collect(),
            geometry_format,
        }
    }
}

impl Default for EnrichOptions {
    fn default() -> Self {
        Self::new(DEFAULT_RESOLUTIONS, GeometryFormat::default())
    }
}

/// A record that could not be enriched.
#[derive(Debug)]
pub struct RecordFailure {
    /// Position in the input batch.
    pub index: usize,
    pub id: String,
    pub error: EnrichError,
}

/// Successfully enriched records plus the ones that were left out.
#[derive(Debug)]
pub struct EnrichmentOutcome {
    pub records: Vec<EnrichedBusinessRecord>,
    pub failures: Vec<RecordFailure>,
    pub retrieval_timestamp: String,
}

impl EnrichmentOutcome {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failed_ids(&self) -> impl Iterator<Item = &str> {
        self.failures.iter().map(|f| f.id.as_str())
    }
}

/// Enrich a batch, stamping it with the current time.
pub fn enrich(
    records: &[RawBusinessRecord],
    options: &EnrichOptions,
) -> Result<EnrichmentOutcome, EnrichError> {
    enrich_at(records, options, Utc::now())
}

/// Enrich a batch, stamping every record with `retrieved_at`.
///
/// Input records are never modified; each output owns a fresh copy.
pub fn enrich_at(
    records: &[RawBusinessRecord],
    options: &EnrichOptions,
    retrieved_at: DateTime<Utc>,
) -> Result<EnrichmentOutcome, EnrichError> {
    for &res in &options.resolutions {
        spatial::resolution(res)?;
    }
    let timestamp = retrieved_at.to_rfc3339_opts(SecondsFormat::Micros, true);

    let mut enriched = Vec::with_capacity(records.len());
    let mut failures = Vec::new();

    for (index, record) in records.iter().enumerate() {
        match enrich_one(record, options, &timestamp) {
            Ok(r) => enriched.push(r),
            Err(error) if !error.is_batch_fatal() => {
                warn!(id = %record.id, index, %error, "skipping business");
                failures.push(RecordFailure {
                    index,
                    id: record.id.clone(),
                    error,
                });
            }
            Err(error) => return Err(error),
        }
    }

    info!(
        count = enriched.len(),
        failed = failures.len(),
        resolutions = options.resolutions.len(),
        format = %options.geometry_format,
        "enriched batch"
    );
    Ok(EnrichmentOutcome {
        records: enriched,
        failures,
        retrieval_timestamp: timestamp,
    })
}

fn enrich_one(
    record: &RawBusinessRecord,
    options: &EnrichOptions,
    timestamp: &str,
) -> Result<EnrichedBusinessRecord, EnrichError> {
    let (latitude, longitude) = record
        .lat_lng()
        .ok_or_else(|| EnrichError::MissingCoordinates {
            id: record.id.clone(),
        })?;
    spatial::lat_lng(latitude, longitude)?;

    let cells = options
        .resolutions
        .iter()
        .map(|&res| Ok((res, spatial::cell_id(latitude, longitude, res)?)))
        .collect::<Result<BTreeMap<_, _>, EnrichError>>()?;

    Ok(EnrichedBusinessRecord {
        record: record.clone(),
        cells,
        geometry: build_point(longitude, latitude, options.geometry_format),
        retrieval_timestamp: timestamp.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::GeometryValue;
    use crate::record::{Coordinates, ToDocument};
    use chrono::TimeZone;

    fn located(id: &str, latitude: f64, longitude: f64) -> RawBusinessRecord {
        let mut record = RawBusinessRecord::new(id);
        record.coordinates = Some(Coordinates::new(latitude, longitude));
        record
    }

    fn batch() -> Vec<RawBusinessRecord> {
        vec![
            located("a", 47.6, -122.33),
            located("b", 47.61, -122.34),
            located("c", 47.62, -122.35),
        ]
    }

    #[test]
    fn every_record_shares_one_timestamp() {
        let records = batch();
        let options = EnrichOptions::new([9], GeometryFormat::GeoJson);
        let outcome = enrich(&records, &options).unwrap();

        assert_eq!(outcome.records.len(), records.len());
        assert!(outcome.is_complete());
        for r in &outcome.records {
            assert_eq!(r.retrieval_timestamp, outcome.retrieval_timestamp);
        }
    }

    #[test]
    fn timestamp_is_iso8601() {
        let at = Utc.with_ymd_and_hms(2026, 10, 18, 12, 30, 0).unwrap();
        let outcome = enrich_at(&batch(), &EnrichOptions::default(), at).unwrap();
        assert_eq!(outcome.retrieval_timestamp, "2026-10-18T12:30:00.000000Z");
    }

    #[test]
    fn one_cell_per_resolution() {
        let options = EnrichOptions::new([11, 7, 9], GeometryFormat::GeoJson);
        let outcome = enrich(&batch(), &options).unwrap();

        let record = &outcome.records[0];
        assert_eq!(record.cells.keys().copied().collect::<Vec<_>>(), vec![7, 9, 11]);
        assert_eq!(
            record.cell(9).unwrap(),
            spatial::cell_id(47.6, -122.33, 9).unwrap()
        );

        let doc = record.to_document().unwrap();
        assert!(doc.contains_key("h3_07"));
        assert!(doc.contains_key("h3_09"));
        assert!(doc.contains_key("h3_11"));
    }

    #[test]
    fn default_resolutions_four_through_ten() {
        let outcome = enrich(&batch(), &EnrichOptions::default()).unwrap();
        let cells: Vec<u8> = outcome.records[0].cells.keys().copied().collect();
        assert_eq!(cells, (4..=10).collect::<Vec<_>>());
    }

    #[test]
    fn geometry_format_fixed_per_batch() {
        let options = EnrichOptions::new([9], GeometryFormat::Native);
        let outcome = enrich(&batch(), &options).unwrap();
        assert!(
            outcome
                .records
                .iter()
                .all(|r| matches!(r.geometry, GeometryValue::Native(_)))
        );
        assert_eq!(outcome.records[1].geometry.lon_lat(), (-122.34, 47.61));
    }

    #[test]
    fn missing_coordinates_reported_not_dropped() {
        let mut records = batch();
        records.insert(1, RawBusinessRecord::new("no-coords"));
        let mut half = RawBusinessRecord::new("half-coords");
        half.coordinates = Some(Coordinates {
            latitude: Some(47.6),
            longitude: None,
        });
        records.push(half);

        let outcome = enrich(&records, &EnrichOptions::new([9], GeometryFormat::GeoJson)).unwrap();

        assert_eq!(outcome.records.len(), 3);
        assert_eq!(
            outcome.failed_ids().collect::<Vec<_>>(),
            vec!["no-coords", "half-coords"]
        );
        assert_eq!(outcome.failures[0].index, 1);
        assert!(matches!(
            &outcome.failures[0].error,
            EnrichError::MissingCoordinates { id } if id == "no-coords"
        ));
        let ids: Vec<&str> = outcome.records.iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn invalid_resolution_is_batch_fatal() {
        let options = EnrichOptions::new([9, 16], GeometryFormat::GeoJson);
        assert!(matches!(
            enrich(&batch(), &options),
            Err(EnrichError::InvalidResolution(16))
        ));
    }

    #[test]
    fn invalid_resolution_fails_even_for_empty_batch() {
        let options = EnrichOptions::new([42], GeometryFormat::GeoJson);
        assert!(enrich(&[], &options).is_err());
    }

    #[test]
    fn invalid_coordinate_is_batch_fatal() {
        let mut records = batch();
        records.push(located("bad", 123.0, 0.0));
        assert!(matches!(
            enrich(&records, &EnrichOptions::default()),
            Err(EnrichError::InvalidCoordinate { .. })
        ));
    }

    #[test]
    fn coordinates_checked_without_resolutions() {
        let records = vec![located("nowhere", 123.0, 500.0)];
        let options = EnrichOptions::new(std::iter::empty(), GeometryFormat::GeoJson);
        assert!(matches!(
            enrich(&records, &options),
            Err(EnrichError::InvalidCoordinate { .. })
        ));
    }

    #[test]
    fn inputs_untouched_and_outputs_independent() {
        let records = batch();
        let before = records.clone();
        let mut outcome = enrich(&records, &EnrichOptions::default()).unwrap();
        assert_eq!(records, before);

        outcome.records[0].record.name = Some("changed".into());
        assert_eq!(records[0].name, None);
        assert_eq!(outcome.records[1].record.name, None);
    }
}
