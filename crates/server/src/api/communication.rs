//! Communication endpoints.
//!
//! - `GET /api/communication` - message log and channel catalogue
//! - `POST /api/communication/broadcast` - send a message

use crate::AppResources;
use crate::api::auth::CurrentOperator;
use crate::entity::message;
use crate::error::{ErrorBody, OpsError};
use crate::services::communication::{BroadcastChannel, BroadcastRequest, CommunicationService};
use axum::{Extension, Json};
use serde::Serialize;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

pub const COMMUNICATION_TAG: &str = "Communication";

#[derive(Debug, Serialize, ToSchema)]
pub struct CommunicationOverview {
    pub messages: Vec<message::Model>,
    pub channels: Vec<BroadcastChannel>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: message::Model,
}

pub fn router() -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(overview))
        .routes(routes!(broadcast))
}

#[tracing::instrument(skip(resources))]
#[utoipa::path(
    get,
    path = "/api/communication",
    tag = COMMUNICATION_TAG,
    operation_id = "Communication Overview",
    summary = "The 50 newest messages and the broadcast channels",
    responses(
        (status = 200, description = "Messages and channels", body = CommunicationOverview),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn overview(
    Extension(resources): Extension<AppResources>,
) -> Result<Json<CommunicationOverview>, OpsError> {
    let messages = CommunicationService::new(resources.db.clone())
        .logs()
        .await?;
    Ok(Json(CommunicationOverview {
        messages,
        channels: CommunicationService::channels(),
    }))
}

#[tracing::instrument(skip(resources, operator, payload), fields(user_id = %operator.id))]
#[utoipa::path(
    post,
    path = "/api/communication/broadcast",
    tag = COMMUNICATION_TAG,
    operation_id = "Broadcast Message",
    summary = "Send a message on one or more channels",
    request_body = BroadcastRequest,
    security(("session" = []), ("bearer" = [])),
    responses(
        (status = 200, description = "Message sent", body = MessageResponse),
        (status = 400, description = "Missing title, no channels or unknown channel", body = ErrorBody),
        (status = 401, description = "No valid session", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn broadcast(
    Extension(resources): Extension<AppResources>,
    CurrentOperator(operator): CurrentOperator,
    Json(payload): Json<BroadcastRequest>,
) -> Result<Json<MessageResponse>, OpsError> {
    let message = CommunicationService::new(resources.db.clone())
        .broadcast(&operator, payload)
        .await?;
    Ok(Json(MessageResponse { message }))
}
