use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{PredictionError, PricingError};
use crate::fare::estimate_base_cost;
use crate::features;
use crate::geo::{GeoResolution, GeoResolver, Route};
use crate::model::PricingModel;
use crate::time_bucket::{current_hour, infer_bucket};

// ---------- Request/Response types ----------

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct RideRequest {
    pub origin: String,
    pub destination: String,
    #[serde(default = "defaults::vehicle_type")]
    pub vehicle_type: String,
    #[serde(default = "defaults::riders")]
    pub number_of_riders: u32,
    #[serde(default = "defaults::drivers")]
    pub number_of_drivers: u32,
    #[serde(default = "defaults::past_rides")]
    pub number_of_past_rides: u32,
    #[serde(default = "defaults::ratings")]
    pub average_ratings: f64,
    #[serde(default = "defaults::location_category")]
    pub location_category: String,
    #[serde(default = "defaults::loyalty_status")]
    pub customer_loyalty_status: String,
    #[serde(default)]
    pub time_of_booking: Option<String>,
}

mod defaults {
    pub fn vehicle_type() -> String {
        "Economy".into()
    }
    pub fn riders() -> u32 {
        60
    }
    pub fn drivers() -> u32 {
        25
    }
    pub fn past_rides() -> u32 {
        10
    }
    pub fn ratings() -> f64 {
        4.3
    }
    pub fn location_category() -> String {
        "Urban".into()
    }
    pub fn loyalty_status() -> String {
        "Regular".into()
    }
}

impl RideRequest {
    pub fn validate(&self) -> Result<(), PricingError> {
        if self.origin.trim().is_empty() {
            return Err(PricingError::InvalidRequest("origin must not be empty".into()));
        }
        if self.destination.trim().is_empty() {
            return Err(PricingError::InvalidRequest("destination must not be empty".into()));
        }
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PriceQuote {
    pub origin: String,
    pub destination: String,
    pub vehicle_type: String,
    pub time_of_booking: String,
    pub distance_km: f64,
    pub duration_min: f64,
    pub base_cost: f64,
    pub predicted_dynamic_price: f64,
    /// False when the fallback route was used.
    pub route_resolved: bool,
}

/// Rounds half away from zero (`f64::round`), not half to even.
fn round_to(x: f64, decimals: i32) -> f64 {
    let p = 10f64.powi(decimals);
    (x * p).round() / p
}

// ---------- Service ----------

/// Substitute route used when the provider cannot resolve one. The default
/// 5 km / 15 min is a tunable, not a property of the domain.
pub const FALLBACK_ROUTE: Route = Route {
    distance_km: 5.0,
    duration_min: 15.0,
};

/// End-to-end request pipeline. Holding a `PricingService` implies a loaded
/// model; there is no unloaded state to check.
pub struct PricingService {
    geo: GeoResolver,
    model: Arc<dyn PricingModel>,
    fallback: Route,
}

impl PricingService {
    pub fn new(geo: GeoResolver, model: Arc<dyn PricingModel>) -> Self {
        Self {
            geo,
            model,
            fallback: FALLBACK_ROUTE,
        }
    }

    pub fn with_fallback(mut self, fallback: Route) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn provider_configured(&self) -> bool {
        self.geo.is_configured()
    }

    /// Prices the ride using the local wall-clock hour for the time bucket.
    pub async fn quote(&self, req: &RideRequest) -> Result<PriceQuote, PricingError> {
        self.quote_at(req, current_hour()).await
    }

    /// Same as [`quote`](Self::quote) with an explicit hour; the hour is
    /// ignored when the request names its own time of booking.
    pub async fn quote_at(&self, req: &RideRequest, hour: u32) -> Result<PriceQuote, PricingError> {
        req.validate()?;

        let (route, route_resolved) = match self.geo.resolve(&req.origin, &req.destination).await {
            GeoResolution::Resolved(route) => (route, true),
            GeoResolution::Unresolved => {
                tracing::info!(
                    "using fallback route km={} min={}",
                    self.fallback.distance_km, self.fallback.duration_min
                );
                (self.fallback, false)
            }
        };

        let base_cost = estimate_base_cost(&req.vehicle_type, route.distance_km, route.duration_min);

        let time_bucket = match req.time_of_booking.as_deref() {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => infer_bucket(hour).as_str().to_string(),
        };

        let row = features::assemble(req, &route, base_cost, &time_bucket);
        tracing::debug!("feature row {:?}", row);

        // The forward pass is CPU-bound; keep it off the async workers.
        let model = Arc::clone(&self.model);
        let predicted = tokio::task::spawn_blocking(move || model.predict(&row))
            .await
            .unwrap_or_else(|e| Err(PredictionError::Inference(format!("prediction task failed: {}", e))));
        let price = predicted.map_err(|e| {
            tracing::warn!("prediction failed: {}", e);
            PricingError::from(e)
        })?;

        Ok(PriceQuote {
            origin: req.origin.clone(),
            destination: req.destination.clone(),
            vehicle_type: req.vehicle_type.clone(),
            time_of_booking: time_bucket,
            distance_km: round_to(route.distance_km, 2),
            duration_min: round_to(route.duration_min, 1),
            base_cost: round_to(base_cost, 2),
            predicted_dynamic_price: round_to(price, 2),
            route_resolved,
        })
    }
}
