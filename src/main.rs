use anyhow::Context;
use axum::http::{HeaderValue, Method};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::EnvFilter;

use ride_pricer::{
    api::{self, AppState},
    config::AppConfig,
    GeoResolver, PricingService, TorchPricingModel,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = AppConfig::from_env();
    tracing::info!(
        "config: model={} meta={} routing_key_set={} routing_timeout={:?} fallback={:?}",
        cfg.model_path,
        cfg.meta_path,
        cfg.google_api_key.is_some(),
        cfg.routing_timeout,
        cfg.fallback
    );

    // No listener is bound until the model is loaded and has run once.
    let mdl = TorchPricingModel::load(&cfg.model_path, &cfg.meta_path)?;
    let warm = mdl.warmup().context("model warmup failed")?;
    tracing::info!("warmup forward ok (price={:.2})", warm);
    tracing::info!(
        "loaded model version={} columns={} in_dim={}",
        mdl.schema().version(),
        mdl.schema().column_count(),
        mdl.schema().in_dim()
    );

    let geo = GeoResolver::new(
        cfg.google_api_key.clone(),
        cfg.routing_endpoint.clone(),
        cfg.routing_timeout,
    )?;
    if !geo.is_configured() {
        tracing::warn!("GOOGLE_API_KEY not set; every quote uses the fallback route");
    }

    let service = PricingService::new(geo, Arc::new(mdl)).with_fallback(cfg.fallback);
    let state = AppState {
        service: Arc::new(service),
    };

    let app = api::router(state)
        .layer(cors_layer(&cfg.cors_origins))
        .layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", cfg.host, cfg.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!("ignoring invalid CORS origin {:?}", o);
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(tower_http::cors::Any)
}
