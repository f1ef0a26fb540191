//! HTTP API.
//!
//! This module is organized into submodules:
//! - `alerts` - incident alerts (/api/alerts/*)
//! - `evacuation` - zones and routes (/api/evacuation/*)
//! - `resources` - inventory and allocations (/api/resources/*)
//! - `communication` - broadcasts (/api/communication/*)
//! - `monitoring` - sensors, realtime snapshot, system health
//! - `auth` - operator sessions (/api/auth/*) and the `CurrentOperator` extractor
//! - `chat` - assistant proxy (/api/chat)
//! - `health` - liveness check (/healthz)
//! - `openapi` - OpenAPI/Utoipa configuration

pub mod alerts;
pub mod auth;
pub mod chat;
pub mod communication;
pub mod evacuation;
pub mod health;
pub mod monitoring;
pub mod openapi;
pub mod resources;

use crate::AppResources;
use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_axum::{router::OpenApiRouter, routes};
use utoipa_redoc::{Redoc, Servable};

/// Full application router with documentation at `/api-docs`.
pub fn app(resources: AppResources) -> Router {
    let (router, api) = OpenApiRouter::with_openapi(openapi::ApiDoc::openapi())
        .routes(routes!(health::health))
        .merge(auth::router())
        .merge(alerts::router())
        .merge(evacuation::router())
        .merge(resources::router())
        .merge(communication::router())
        .merge(monitoring::router())
        .merge(chat::router())
        .layer(axum::Extension(resources))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .split_for_parts();

    router.merge(Redoc::with_url("/api-docs", api))
}

/// Starts the web server on the configured bind address.
#[tracing::instrument(skip(resources))]
pub async fn start_webserver(resources: AppResources) -> color_eyre::Result<()> {
    let addr = resources.config.bind_address.clone();
    let router = app(resources);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "Server running");
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await
    .map_err(|e| color_eyre::Report::msg(format!("Failed to start server: {e}")))?;

    Ok(())
}
