//! H3 cell indexing for business locations.
//!
//! Cells are computed with `h3o`; this module only validates inputs and
//! fixes the naming of the `h3_XX` fields that carry them.

use h3o::{LatLng, Resolution};

use crate::error::EnrichError;

/// Finest resolution H3 supports.
pub const MAX_RESOLUTION: u8 = 15;

/// Validate a resolution number.
pub fn resolution(resolution: u8) -> Result<Resolution, EnrichError> {
    Resolution::try_from(resolution).map_err(|_| EnrichError::InvalidResolution(resolution))
}

/// The H3 cell containing `(latitude, longitude)` at `resolution`, as a hex string.
pub fn cell_id(latitude: f64, longitude: f64, resolution: u8) -> Result<String, EnrichError> {
    let res = self::resolution(resolution)?;
    let point = lat_lng(latitude, longitude)?;
    Ok(point.to_cell(res).to_string())
}

/// Check that `(latitude, longitude)` lies on the globe (NaN does not).
pub fn lat_lng(latitude: f64, longitude: f64) -> Result<LatLng, EnrichError> {
    let invalid = || EnrichError::InvalidCoordinate {
        latitude,
        longitude,
    };
    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return Err(invalid());
    }
    LatLng::new(latitude, longitude).map_err(|_| invalid())
}

/// Field name holding the cell at `resolution`: `h3_09`, `h3_10`, ...
pub fn cell_field_name(resolution: u8) -> String {
    format!("h3_{resolution:02}")
}

/// Whether `key` is an `h3_<digits>` cell field.
pub fn is_cell_field(key: &str) -> bool {
    key.strip_prefix("h3_")
        .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use h3o::CellIndex;

    const SEATTLE: (f64, f64) = (47.6, -122.33);

    #[test]
    fn deterministic_across_calls() {
        for res in 0..=MAX_RESOLUTION {
            let a = cell_id(SEATTLE.0, SEATTLE.1, res).unwrap();
            let b = cell_id(SEATTLE.0, SEATTLE.1, res).unwrap();
            assert_eq!(a, b, "resolution {res}");
        }
    }

    #[test]
    fn cell_string_encodes_resolution() {
        let cell = cell_id(SEATTLE.0, SEATTLE.1, 9).unwrap();
        assert_eq!(cell.len(), 15);
        assert!(cell.starts_with("89"), "{cell}");
        // Unused digits below resolution 9 are all set.
        assert!(cell.ends_with("ffff"), "{cell}");

        let finer = cell_id(SEATTLE.0, SEATTLE.1, 10).unwrap();
        assert!(finer.starts_with("8a"), "{finer}");
    }

    #[test]
    fn finer_cell_nests_in_coarser() {
        let coarse = cell_id(SEATTLE.0, SEATTLE.1, 7).unwrap();
        let fine: CellIndex = cell_id(SEATTLE.0, SEATTLE.1, 11).unwrap().parse().unwrap();
        let parent = fine.parent(Resolution::Seven).unwrap();
        assert_eq!(parent.to_string(), coarse);
    }

    #[test]
    fn resolution_out_of_range() {
        assert!(matches!(
            cell_id(SEATTLE.0, SEATTLE.1, 16),
            Err(EnrichError::InvalidResolution(16))
        ));
    }

    #[test]
    fn coordinates_out_of_range() {
        assert!(matches!(
            cell_id(91.0, 0.0, 9),
            Err(EnrichError::InvalidCoordinate { .. })
        ));
        assert!(matches!(
            cell_id(0.0, -180.5, 9),
            Err(EnrichError::InvalidCoordinate { .. })
        ));
        assert!(matches!(
            cell_id(f64::NAN, 0.0, 9),
            Err(EnrichError::InvalidCoordinate { .. })
        ));
    }

    #[test]
    fn boundary_coordinates_are_valid() {
        assert!(cell_id(90.0, 180.0, 5).is_ok());
        assert!(cell_id(-90.0, -180.0, 5).is_ok());
    }

    #[test]
    fn field_names_are_zero_padded() {
        assert_eq!(cell_field_name(4), "h3_04");
        assert_eq!(cell_field_name(10), "h3_10");
    }

    #[test]
    fn cell_field_pattern() {
        assert!(is_cell_field("h3_09"));
        assert!(is_cell_field("h3_123"));
        assert!(!is_cell_field("h3_"));
        assert!(!is_cell_field("h3_x1"));
        assert!(!is_cell_field("geometry"));
    }
}
