//! Distance/duration lookup against a Distance Matrix style routing provider.
//!
//! Every failure collapses into [`GeoResolution::Unresolved`]; nothing here
//! returns an error to the caller.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/distancematrix/json";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Distance and duration of one trip, always taken together from a single
/// source (the provider or the fallback).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Route {
    pub distance_km: f64,
    pub duration_min: f64,
}

/// Outcome of one origin/destination lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeoResolution {
    Resolved(Route),
    Unresolved,
}

// ---------- Provider wire format ----------

#[derive(Deserialize, Debug)]
struct MatrixResponse {
    rows: Vec<MatrixRow>,
}

#[derive(Deserialize, Debug)]
struct MatrixRow {
    elements: Vec<MatrixElement>,
}

#[derive(Deserialize, Debug)]
struct MatrixElement {
    status: Option<String>,
    distance: Option<MatrixValue>,
    duration: Option<MatrixValue>,
}

#[derive(Deserialize, Debug)]
struct MatrixValue {
    value: f64,
}

#[derive(Debug, Error)]
enum GeoError {
    #[error("transport: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("response has no rows[0].elements[0]")]
    Empty,
    #[error("element status {0}")]
    Status(String),
    #[error("element missing {0}")]
    Missing(&'static str),
    #[error("non-positive or non-finite route: {distance_m}m / {duration_s}s")]
    Degenerate { distance_m: f64, duration_s: f64 },
}

// ---------- Resolver ----------

pub struct GeoResolver {
    client: reqwest::Client,
    api_key: Option<String>,
    endpoint: String,
}

impl GeoResolver {
    /// A blank key is treated as no key.
    pub fn new(api_key: Option<String>, endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build routing HTTP client")?;
        let api_key = api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());
        Ok(Self {
            client,
            api_key,
            endpoint: endpoint.into(),
        })
    }

    /// Resolver with no credential: always `Unresolved`, never touches the network.
    pub fn unconfigured() -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    pub async fn resolve(&self, origin: &str, destination: &str) -> GeoResolution {
        let Some(key) = self.api_key.as_deref() else {
            tracing::debug!("routing provider not configured; route unresolved");
            return GeoResolution::Unresolved;
        };

        match self.fetch(origin, destination, key).await {
            Ok(route) => {
                tracing::debug!(
                    "resolved route origin={:?} destination={:?} km={:.3} min={:.2}",
                    origin, destination, route.distance_km, route.duration_min
                );
                GeoResolution::Resolved(route)
            }
            Err(e) => {
                tracing::warn!(
                    "route unresolved origin={:?} destination={:?}: {}",
                    origin, destination, e
                );
                GeoResolution::Unresolved
            }
        }
    }

    async fn fetch(&self, origin: &str, destination: &str, key: &str) -> Result<Route, GeoError> {
        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("origins", origin),
                ("destinations", destination),
                ("key", key),
                ("units", "metric"),
            ])
            .send()
            .await?
            .error_for_status()?;

        let body: MatrixResponse = resp.json().await?;
        parse_element(body)
    }
}

/// Provider units are meters and seconds.
fn parse_element(body: MatrixResponse) -> Result<Route, GeoError> {
    let elem = body
        .rows
        .into_iter()
        .next()
        .and_then(|r| r.elements.into_iter().next())
        .ok_or(GeoError::Empty)?;

    match elem.status.as_deref() {
        Some("OK") => {}
        other => return Err(GeoError::Status(other.unwrap_or("<missing>").to_string())),
    }

    let distance_m = elem.distance.ok_or(GeoError::Missing("distance"))?.value;
    let duration_s = elem.duration.ok_or(GeoError::Missing("duration"))?.value;
    let valid = |x: f64| x.is_finite() && x > 0.0;
    if !valid(distance_m) || !valid(duration_s) {
        return Err(GeoError::Degenerate {
            distance_m,
            duration_s,
        });
    }

    Ok(Route {
        distance_km: distance_m / 1000.0,
        duration_min: duration_s / 60.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(v: serde_json::Value) -> Result<Route, GeoError> {
        parse_element(serde_json::from_value(v).expect("wire shape"))
    }

    #[test]
    fn test_unit_conversion() {
        let route = parse(serde_json::json!({
            "rows": [{ "elements": [{
                "status": "OK",
                "distance": { "value": 12345.0, "text": "12.3 km" },
                "duration": { "value": 1530.0, "text": "26 mins" }
            }]}]
        }))
        .unwrap();
        assert!((route.distance_km - 12.345).abs() < 1e-9);
        assert!((route.duration_min - 25.5).abs() < 1e-9);
    }

    #[test]
    fn test_non_ok_element() {
        let err = parse(serde_json::json!({
            "rows": [{ "elements": [{ "status": "ZERO_RESULTS" }] }]
        }))
        .unwrap_err();
        assert!(matches!(err, GeoError::Status(s) if s == "ZERO_RESULTS"));
    }

    #[test]
    fn test_empty_rows_and_missing_fields() {
        assert!(matches!(parse(serde_json::json!({ "rows": [] })), Err(GeoError::Empty)));
        assert!(matches!(
            parse(serde_json::json!({ "rows": [{ "elements": [] }] })),
            Err(GeoError::Empty)
        ));
        assert!(matches!(
            parse(serde_json::json!({
                "rows": [{ "elements": [{ "status": "OK", "distance": { "value": 10.0 } }] }]
            })),
            Err(GeoError::Missing("duration"))
        ));
    }

    #[test]
    fn test_zero_length_route_is_degenerate() {
        let err = parse(serde_json::json!({
            "rows": [{ "elements": [{
                "status": "OK",
                "distance": { "value": 0.0 },
                "duration": { "value": 0.0 }
            }]}]
        }))
        .unwrap_err();
        assert!(matches!(err, GeoError::Degenerate { .. }));
    }

    #[test]
    fn test_blank_key_is_unconfigured() {
        let r = GeoResolver::new(Some("   ".into()), DEFAULT_ENDPOINT, DEFAULT_TIMEOUT).unwrap();
        assert!(!r.is_configured());
        assert!(!GeoResolver::unconfigured().is_configured());
        let r = GeoResolver::new(Some(" abc ".into()), DEFAULT_ENDPOINT, DEFAULT_TIMEOUT).unwrap();
        assert!(r.is_configured());
    }

    #[tokio::test]
    async fn test_unconfigured_resolves_without_network() {
        let r = GeoResolver::unconfigured();
        assert_eq!(r.resolve("A", "B").await, GeoResolution::Unresolved);
    }
}
