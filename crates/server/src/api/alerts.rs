//! Alert endpoints.
//!
//! - `GET /api/alerts` - active and monitoring alerts
//! - `POST /api/alerts` - record an alert and run the automatic response
//! - `PATCH /api/alerts/{id}/status` - move an alert along its lifecycle

use crate::AppResources;
use crate::api::auth::CurrentOperator;
use crate::entity::alert;
use crate::error::{ErrorBody, OpsError};
use crate::services::alerts::{AlertService, AlertView, CreatedAlert, NewAlert};
use axum::{Extension, Json, extract::Path};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};
use uuid::Uuid;

pub const ALERTS_TAG: &str = "Alerts";

#[derive(Debug, Serialize, ToSchema)]
pub struct AlertList {
    pub alerts: Vec<AlertView>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct StatusChange {
    /// `active`, `monitoring` or `resolved`
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AlertResponse {
    pub alert: alert::Model,
}

pub fn router() -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(list_alerts, create_alert))
        .routes(routes!(update_alert_status))
}

#[tracing::instrument(skip(resources))]
#[utoipa::path(
    get,
    path = "/api/alerts",
    tag = ALERTS_TAG,
    operation_id = "List Active Alerts",
    summary = "Active and monitoring alerts, newest first",
    responses(
        (status = 200, description = "Alerts with the creator's name", body = AlertList),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn list_alerts(
    Extension(resources): Extension<AppResources>,
) -> Result<Json<AlertList>, OpsError> {
    let alerts = AlertService::new(resources.db.clone()).list_active().await?;
    Ok(Json(AlertList { alerts }))
}

#[tracing::instrument(skip(resources, operator, payload), fields(user_id = %operator.id))]
#[utoipa::path(
    post,
    path = "/api/alerts",
    tag = ALERTS_TAG,
    operation_id = "Create Alert",
    summary = "Record an incident alert",
    description = "Records the alert as `active`.\n\n\
                   **Automatic response** (same transaction):\n\
                   - every `critical` alert is broadcast publicly on mobile, radio and TV\n\
                   - a critical `flood` additionally moves every `safe` zone whose location contains the alert location to `warning`\n\
                   - each of those zones gets up to three vehicle resources reserved, two units each",
    request_body = NewAlert,
    security(("session" = []), ("bearer" = [])),
    responses(
        (status = 200, description = "Alert recorded", body = CreatedAlert),
        (status = 400, description = "Invalid input", body = ErrorBody),
        (status = 401, description = "No valid session", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn create_alert(
    Extension(resources): Extension<AppResources>,
    CurrentOperator(operator): CurrentOperator,
    Json(payload): Json<NewAlert>,
) -> Result<Json<CreatedAlert>, OpsError> {
    let created = AlertService::new(resources.db.clone())
        .create(&operator, payload)
        .await?;
    Ok(Json(created))
}

#[tracing::instrument(skip(resources, operator, payload), fields(user_id = %operator.id))]
#[utoipa::path(
    patch,
    path = "/api/alerts/{id}/status",
    tag = ALERTS_TAG,
    operation_id = "Update Alert Status",
    summary = "Move an alert to monitoring or resolved",
    description = "Status only moves forward: `active -> monitoring -> resolved`. Resolving stamps `resolved_at`.",
    params(("id" = Uuid, Path, description = "Alert id")),
    request_body = StatusChange,
    security(("session" = []), ("bearer" = [])),
    responses(
        (status = 200, description = "Updated alert", body = AlertResponse),
        (status = 400, description = "Unknown status or backwards transition", body = ErrorBody),
        (status = 401, description = "No valid session", body = ErrorBody),
        (status = 404, description = "Alert not found", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn update_alert_status(
    Extension(resources): Extension<AppResources>,
    CurrentOperator(operator): CurrentOperator,
    Path(id): Path<Uuid>,
    Json(payload): Json<StatusChange>,
) -> Result<Json<AlertResponse>, OpsError> {
    let alert = AlertService::new(resources.db.clone())
        .update_status(&operator, id, &payload.status)
        .await?;
    Ok(Json(AlertResponse { alert }))
}
