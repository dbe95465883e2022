//! Dynamic ride price estimation.
//!
//! A request flows through route resolution (with a fixed fallback when the
//! routing provider is unavailable), the rule-based base cost, time-bucket
//! inference and feature assembly before a pre-trained regression pipeline
//! produces the final price.

pub mod api;
pub mod config;
pub mod error;
pub mod fare;
pub mod features;
pub mod geo;
pub mod model;
pub mod service;
pub mod time_bucket;

pub use error::{PredictionError, PricingError};
pub use features::FeatureRow;
pub use geo::{GeoResolution, GeoResolver, Route};
pub use model::{PricingModel, TorchPricingModel};
pub use service::{PriceQuote, PricingService, RideRequest};
