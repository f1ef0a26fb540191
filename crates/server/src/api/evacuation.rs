//! Evacuation endpoints.
//!
//! - `GET /api/evacuation` - zones, routes and shelters
//! - `POST /api/evacuation/zones/{zone_id}/initiate` - order a zone evacuated
//! - `POST /api/evacuation/zones/{zone_id}/progress` - report residents out
//! - `POST /api/evacuation/zones/{zone_id}/warning` - put a safe zone on alert
//! - `PATCH /api/evacuation/routes/{route_id}` - update a route's status

use crate::AppResources;
use crate::api::auth::CurrentOperator;
use crate::entity::{evacuation_route, evacuation_zone};
use crate::error::{ErrorBody, OpsError};
use crate::services::evacuation::{
    EvacuationOrder, EvacuationService, InitiatedEvacuation, ProgressReport, ProgressUpdate,
    RouteUpdate,
};
use axum::{Extension, Json, extract::Path};
use serde::Serialize;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

pub const EVACUATION_TAG: &str = "Evacuation";

#[derive(Debug, Serialize, ToSchema)]
pub struct EvacuationOverview {
    pub zones: Vec<evacuation_zone::Model>,
    pub routes: Vec<evacuation_route::Model>,
    /// No shelter registry exists yet; always empty
    #[schema(value_type = Vec<Object>)]
    pub shelters: Vec<serde_json::Value>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ZoneResponse {
    pub zone: evacuation_zone::Model,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RouteResponse {
    pub route: evacuation_route::Model,
}

pub fn router() -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(overview))
        .routes(routes!(initiate_evacuation))
        .routes(routes!(report_progress))
        .routes(routes!(issue_warning))
        .routes(routes!(update_route))
}

#[tracing::instrument(skip(resources))]
#[utoipa::path(
    get,
    path = "/api/evacuation",
    tag = EVACUATION_TAG,
    operation_id = "Evacuation Overview",
    summary = "Zones by priority, routes and shelters",
    responses(
        (status = 200, description = "Evacuation overview", body = EvacuationOverview),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn overview(
    Extension(resources): Extension<AppResources>,
) -> Result<Json<EvacuationOverview>, OpsError> {
    let service = EvacuationService::new(resources.db.clone());
    Ok(Json(EvacuationOverview {
        zones: service.zones().await?,
        routes: service.routes().await?,
        shelters: Vec::new(),
    }))
}

#[tracing::instrument(skip(resources, operator, payload), fields(user_id = %operator.id))]
#[utoipa::path(
    post,
    path = "/api/evacuation/zones/{zone_id}/initiate",
    tag = EVACUATION_TAG,
    operation_id = "Initiate Evacuation",
    summary = "Order a zone evacuated",
    description = "Moves the zone to `evacuating`, broadcasts the evacuation order to `zone_<zone_id>` \
                   on mobile, radio and TV, and reserves transport for the zone.",
    params(("zone_id" = String, Path, description = "Zone code")),
    request_body = EvacuationOrder,
    security(("session" = []), ("bearer" = [])),
    responses(
        (status = 200, description = "Evacuation under way", body = InitiatedEvacuation),
        (status = 400, description = "Invalid priority or zone already evacuated", body = ErrorBody),
        (status = 401, description = "No valid session", body = ErrorBody),
        (status = 404, description = "Zone not found", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn initiate_evacuation(
    Extension(resources): Extension<AppResources>,
    CurrentOperator(operator): CurrentOperator,
    Path(zone_id): Path<String>,
    Json(payload): Json<EvacuationOrder>,
) -> Result<Json<InitiatedEvacuation>, OpsError> {
    let initiated = EvacuationService::new(resources.db.clone())
        .initiate(&operator, &zone_id, payload)
        .await?;
    Ok(Json(initiated))
}

#[tracing::instrument(skip(resources, operator, payload), fields(user_id = %operator.id))]
#[utoipa::path(
    post,
    path = "/api/evacuation/zones/{zone_id}/progress",
    tag = EVACUATION_TAG,
    operation_id = "Report Evacuation Progress",
    summary = "Record how many residents have left",
    description = "At 95% of the population the zone becomes `evacuated`, otherwise it stays `evacuating`.",
    params(("zone_id" = String, Path, description = "Zone code")),
    request_body = ProgressUpdate,
    security(("session" = []), ("bearer" = [])),
    responses(
        (status = 200, description = "Progress recorded", body = ProgressReport),
        (status = 400, description = "Count out of range or zone already evacuated", body = ErrorBody),
        (status = 401, description = "No valid session", body = ErrorBody),
        (status = 404, description = "Zone not found", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn report_progress(
    Extension(resources): Extension<AppResources>,
    CurrentOperator(operator): CurrentOperator,
    Path(zone_id): Path<String>,
    Json(payload): Json<ProgressUpdate>,
) -> Result<Json<ProgressReport>, OpsError> {
    let report = EvacuationService::new(resources.db.clone())
        .report_progress(&operator, &zone_id, payload.evacuated_count)
        .await?;
    Ok(Json(report))
}

#[tracing::instrument(skip(resources, operator), fields(user_id = %operator.id))]
#[utoipa::path(
    post,
    path = "/api/evacuation/zones/{zone_id}/warning",
    tag = EVACUATION_TAG,
    operation_id = "Issue Zone Warning",
    summary = "Move a safe zone to warning",
    params(("zone_id" = String, Path, description = "Zone code")),
    security(("session" = []), ("bearer" = [])),
    responses(
        (status = 200, description = "Zone on warning", body = ZoneResponse),
        (status = 400, description = "Zone is not safe", body = ErrorBody),
        (status = 401, description = "No valid session", body = ErrorBody),
        (status = 404, description = "Zone not found", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn issue_warning(
    Extension(resources): Extension<AppResources>,
    CurrentOperator(operator): CurrentOperator,
    Path(zone_id): Path<String>,
) -> Result<Json<ZoneResponse>, OpsError> {
    let zone = EvacuationService::new(resources.db.clone())
        .issue_warning(&operator, &zone_id)
        .await?;
    Ok(Json(ZoneResponse { zone }))
}

#[tracing::instrument(skip(resources, operator, payload), fields(user_id = %operator.id))]
#[utoipa::path(
    patch,
    path = "/api/evacuation/routes/{route_id}",
    tag = EVACUATION_TAG,
    operation_id = "Update Route Status",
    summary = "Mark a route open, congested or closed",
    params(("route_id" = String, Path, description = "Route code")),
    request_body = RouteUpdate,
    security(("session" = []), ("bearer" = [])),
    responses(
        (status = 200, description = "Updated route", body = RouteResponse),
        (status = 400, description = "Invalid status or usage", body = ErrorBody),
        (status = 401, description = "No valid session", body = ErrorBody),
        (status = 404, description = "Route not found", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn update_route(
    Extension(resources): Extension<AppResources>,
    CurrentOperator(operator): CurrentOperator,
    Path(route_id): Path<String>,
    Json(payload): Json<RouteUpdate>,
) -> Result<Json<RouteResponse>, OpsError> {
    let route = EvacuationService::new(resources.db.clone())
        .update_route_status(&operator, &route_id, payload)
        .await?;
    Ok(Json(RouteResponse { route }))
}
