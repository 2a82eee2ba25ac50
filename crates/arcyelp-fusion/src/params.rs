use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::FusionError;

/// Orderings the search endpoint accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortBy {
    BestMatch,
    Rating,
    ReviewCount,
    #[default]
    Distance,
}

impl SortBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortBy::BestMatch => "best_match",
            SortBy::Rating => "rating",
            SortBy::ReviewCount => "review_count",
            SortBy::Distance => "distance",
        }
    }
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortBy {
    type Err = FusionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "best_match" => Ok(SortBy::BestMatch),
            "rating" => Ok(SortBy::Rating),
            "review_count" => Ok(SortBy::ReviewCount),
            "distance" => Ok(SortBy::Distance),
            other => Err(FusionError::InvalidSortOption(other.to_string())),
        }
    }
}

/// Parameters for one business search.
///
/// `extra` is passed through verbatim and wins over the named fields when
/// keys collide.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchParams {
    pub longitude: f64,
    pub latitude: f64,
    pub limit: u32,
    /// Kept as text so that bad values are rejected at request time.
    pub sort_by: String,
    /// Straight-line search radius in metres.
    pub radius: u32,
    pub term: String,
    pub extra: BTreeMap<String, String>,
}

impl SearchParams {
    pub const DEFAULT_LIMIT: u32 = 50;
    pub const DEFAULT_RADIUS: u32 = 1600;
    pub const DEFAULT_TERM: &'static str = "food, bar";

    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
            limit: Self::DEFAULT_LIMIT,
            sort_by: SortBy::default().as_str().to_string(),
            radius: Self::DEFAULT_RADIUS,
            term: Self::DEFAULT_TERM.to_string(),
            extra: BTreeMap::new(),
        }
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn sort_by(mut self, sort_by: impl Into<String>) -> Self {
        self.sort_by = sort_by.into();
        self
    }

    pub fn radius(mut self, radius: u32) -> Self {
        self.radius = radius;
        self
    }

    pub fn term(mut self, term: impl Into<String>) -> Self {
        self.term = term.into();
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Merged query pairs, with `sort_by` validated after the merge.
    pub fn to_query(&self) -> Result<Vec<(String, String)>, FusionError> {
        let mut query: BTreeMap<String, String> = BTreeMap::from([
            ("limit".into(), self.limit.to_string()),
            ("sort_by".into(), self.sort_by.clone()),
            ("radius".into(), self.radius.to_string()),
            ("longitude".into(), self.longitude.to_string()),
            ("latitude".into(), self.latitude.to_string()),
            ("term".into(), self.term.clone()),
        ]);
        query.extend(self.extra.iter().map(|(k, v)| (k.clone(), v.clone())));

        if let Some(sort_by) = query.get("sort_by") {
            sort_by.parse::<SortBy>()?;
        }
        Ok(query.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup<'a>(query: &'a [(String, String)], key: &str) -> Option<&'a str> {
        query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn defaults() {
        let query = SearchParams::new(-122.33, 47.6).to_query().unwrap();
        assert_eq!(lookup(&query, "limit"), Some("50"));
        assert_eq!(lookup(&query, "sort_by"), Some("distance"));
        assert_eq!(lookup(&query, "radius"), Some("1600"));
        assert_eq!(lookup(&query, "term"), Some("food, bar"));
        assert_eq!(lookup(&query, "longitude"), Some("-122.33"));
        assert_eq!(lookup(&query, "latitude"), Some("47.6"));
    }

    #[test]
    fn extra_params_override_defaults() {
        let query = SearchParams::new(-122.33, 47.6)
            .param("limit", "10")
            .param("open_now", "true")
            .to_query()
            .unwrap();
        assert_eq!(lookup(&query, "limit"), Some("10"));
        assert_eq!(lookup(&query, "open_now"), Some("true"));
        assert_eq!(query.iter().filter(|(k, _)| k == "limit").count(), 1);
    }

    #[test]
    fn invalid_sort_rejected() {
        let err = SearchParams::new(0.0, 0.0).sort_by("invalid").to_query();
        assert!(matches!(err, Err(FusionError::InvalidSortOption(s)) if s == "invalid"));
    }

    #[test]
    fn invalid_sort_via_passthrough_rejected() {
        let err = SearchParams::new(0.0, 0.0).param("sort_by", "newest").to_query();
        assert!(matches!(err, Err(FusionError::InvalidSortOption(_))));
    }

    #[test]
    fn every_sort_option_round_trips() {
        for s in ["best_match", "rating", "review_count", "distance"] {
            assert_eq!(s.parse::<SortBy>().unwrap().as_str(), s);
        }
    }
}
