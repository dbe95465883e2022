use std::{str::FromStr, time::Duration};

use crate::geo::{Route, DEFAULT_ENDPOINT, DEFAULT_TIMEOUT};
use crate::service::FALLBACK_ROUTE;

/// Origins of the hosted web client and its local dev server.
pub const DEFAULT_CORS_ORIGINS: [&str; 2] = [
    "https://vishakha-pricing-ai.netlify.app",
    "http://localhost:5500",
];

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub model_path: String,
    pub meta_path: String,
    pub google_api_key: Option<String>,
    pub routing_endpoint: String,
    pub routing_timeout: Duration,
    pub cors_origins: Vec<String>,
    pub fallback: Route,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            model_path: "model/dynamic_pricing_pipeline.pt".to_string(),
            meta_path: "model/dynamic_pricing_pipeline.meta.json".to_string(),
            google_api_key: None,
            routing_endpoint: DEFAULT_ENDPOINT.to_string(),
            routing_timeout: DEFAULT_TIMEOUT,
            cors_origins: DEFAULT_CORS_ORIGINS.iter().map(|o| o.to_string()).collect(),
            fallback: FALLBACK_ROUTE,
        }
    }
}

impl AppConfig {
    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();

        if let Some(host) = get("HOST") {
            cfg.host = host;
        }
        cfg.port = parsed(&get, "PORT", cfg.port);
        if let Some(p) = get("MODEL_PATH") {
            cfg.model_path = p;
        }
        if let Some(p) = get("META_PATH") {
            cfg.meta_path = p;
        }

        cfg.google_api_key = get("GOOGLE_API_KEY")
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());
        if let Some(url) = get("ROUTING_ENDPOINT") {
            cfg.routing_endpoint = url;
        }
        let secs = parsed(&get, "ROUTING_TIMEOUT_SECS", DEFAULT_TIMEOUT.as_secs());
        if secs == 0 {
            tracing::warn!("ROUTING_TIMEOUT_SECS must be positive, keeping {:?}", DEFAULT_TIMEOUT);
        } else {
            cfg.routing_timeout = Duration::from_secs(secs);
        }

        if let Some(origins) = get("CORS_ORIGINS") {
            cfg.cors_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }

        cfg.fallback = Route {
            distance_km: fallback_value(&get, "FALLBACK_DISTANCE_KM", FALLBACK_ROUTE.distance_km),
            duration_min: fallback_value(&get, "FALLBACK_DURATION_MIN", FALLBACK_ROUTE.duration_min),
        };

        cfg
    }
}

fn parsed<T: FromStr + Copy>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match get(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("ignoring unparseable {}={:?}", key, raw);
            default
        }),
        None => default,
    }
}

fn fallback_value(get: &impl Fn(&str) -> Option<String>, key: &str, default: f64) -> f64 {
    let v = parsed(get, key, default);
    if v.is_finite() && v >= 0.0 {
        v
    } else {
        tracing::warn!("{} must be finite and non-negative, keeping {}", key, default);
        default
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from(pairs: &[(&str, &str)]) -> AppConfig {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|k| env.get(k).cloned())
    }

    #[test]
    fn test_defaults() {
        let cfg = from(&[]);
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.google_api_key, None);
        assert_eq!(cfg.routing_timeout, Duration::from_secs(10));
        assert_eq!(cfg.fallback, FALLBACK_ROUTE);
        assert_eq!(
            cfg.cors_origins,
            vec!["https://vishakha-pricing-ai.netlify.app", "http://localhost:5500"]
        );
    }

    #[test]
    fn test_overrides() {
        let cfg = from(&[
            ("PORT", "9000"),
            ("GOOGLE_API_KEY", "  secret \n"),
            ("ROUTING_TIMEOUT_SECS", "3"),
            ("CORS_ORIGINS", "https://a.example, http://localhost:5500,"),
            ("FALLBACK_DISTANCE_KM", "7.5"),
        ]);
        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.google_api_key.as_deref(), Some("secret"));
        assert_eq!(cfg.routing_timeout, Duration::from_secs(3));
        assert_eq!(cfg.cors_origins, vec!["https://a.example", "http://localhost:5500"]);
        assert_eq!(cfg.fallback.distance_km, 7.5);
        assert_eq!(cfg.fallback.duration_min, 15.0);
    }

    #[test]
    fn test_bad_values_keep_defaults() {
        let cfg = from(&[
            ("PORT", "eighty"),
            ("GOOGLE_API_KEY", "   "),
            ("ROUTING_TIMEOUT_SECS", "0"),
            ("FALLBACK_DISTANCE_KM", "-1"),
            ("FALLBACK_DURATION_MIN", "NaN"),
        ]);
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.google_api_key, None);
        assert_eq!(cfg.routing_timeout, DEFAULT_TIMEOUT);
        assert_eq!(cfg.fallback, FALLBACK_ROUTE);
    }

    #[test]
    fn test_empty_cors_list_disables_defaults() {
        let cfg = from(&[("CORS_ORIGINS", "")]);
        assert!(cfg.cors_origins.is_empty());
    }
}
