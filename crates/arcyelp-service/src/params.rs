//! Request parameters gathered from the query string and the request body.
//!
//! Sources are consulted in order (query string, then a form or JSON body)
//! and the first one holding a non-blank value for a key wins.

use std::collections::HashMap;
use std::str::FromStr;

use axum::extract::{FromRequest, Query, Request};
use axum::http::header::CONTENT_TYPE;
use axum::{Form, Json, async_trait};
use serde_json::{Map, Value};

use crate::error::ServiceError;

#[derive(Debug, Default, Clone)]
pub struct QueryParams {
    sources: Vec<HashMap<String, String>>,
}

impl QueryParams {
    pub fn from_sources(sources: Vec<HashMap<String, String>>) -> Self {
        Self { sources }
    }

    /// First non-blank value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.sources
            .iter()
            .filter_map(|source| source.get(key))
            .map(|v| v.trim())
            .find(|v| !v.is_empty())
    }

    /// First non-blank value under any of `keys`, with the key it came from.
    pub fn get_any<'k>(&self, keys: &[&'k str]) -> Option<(&'k str, &str)> {
        keys.iter().find_map(|&k| self.get(k).map(|v| (k, v)))
    }

    /// Parse the value under any of `keys`.
    pub fn parse<T>(&self, keys: &[&str]) -> Result<Option<T>, ServiceError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get_any(keys) {
            Some((key, raw)) => raw
                .parse()
                .map(Some)
                .map_err(|e| ServiceError::invalid(key, format!("{raw:?}: {e}"))),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl<S> FromRequest<S> for QueryParams
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Query(query) = Query::<HashMap<String, String>>::try_from_uri(req.uri())
            .map_err(|e| ServiceError::invalid("query string", e.body_text()))?;
        let mut sources = vec![query];

        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("application/json") {
            let Json(body) = Json::<Map<String, Value>>::from_request(req, state)
                .await
                .map_err(|e| ServiceError::invalid("body", e.body_text()))?;
            sources.push(body.into_iter().map(|(k, v)| (k, scalar_text(v))).collect());
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(body) = Form::<HashMap<String, String>>::from_request(req, state)
                .await
                .map_err(|e| ServiceError::invalid("body", e.body_text()))?;
            sources.push(body);
        }

        Ok(Self { sources })
    }
}

/// JSON body values as the text they would have in a query string.
fn scalar_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(sources: &[&[(&str, &str)]]) -> QueryParams {
        QueryParams::from_sources(
            sources
                .iter()
                .map(|s| s.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect())
                .collect(),
        )
    }

    #[test]
    fn first_source_wins() {
        let p = params(&[&[("where", "1=1")], &[("where", "name = 'x'"), ("f", "json")]]);
        assert_eq!(p.get("where"), Some("1=1"));
        assert_eq!(p.get("f"), Some("json"));
    }

    #[test]
    fn blank_values_fall_through() {
        let p = params(&[&[("where", "  ")], &[("where", "1=1")]]);
        assert_eq!(p.get("where"), Some("1=1"));
        assert_eq!(params(&[&[("where", "")]]).get("where"), None);
    }

    #[test]
    fn aliases_in_priority_order() {
        let p = params(&[&[("x", "-122.3"), ("longitude", "-122.4")]]);
        assert_eq!(p.get_any(&["longitude", "x"]), Some(("longitude", "-122.4")));
        assert_eq!(p.parse::<f64>(&["lon", "x"]).unwrap(), Some(-122.3));
    }

    #[test]
    fn parse_reports_the_key() {
        let p = params(&[&[("radius", "far")]]);
        let err = p.parse::<u32>(&["radius"]).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidParameter { name, .. } if name == "radius"));
    }

    #[test]
    fn json_scalars_as_text() {
        assert_eq!(scalar_text(Value::from(47.6)), "47.6");
        assert_eq!(scalar_text(Value::from("1=1")), "1=1");
        assert_eq!(scalar_text(Value::Null), "");
    }
}
