//! Assistant chat endpoint.

use crate::AppResources;
use crate::assistant::ChatMessage;
use axum::{Extension, Json, http::StatusCode};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

pub const CHAT_TAG: &str = "Assistant";

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChatReply {
    pub reply: String,
}

pub fn router() -> OpenApiRouter {
    OpenApiRouter::new().routes(routes!(chat))
}

#[tracing::instrument(skip(resources, payload), fields(turns = payload.messages.len()))]
#[utoipa::path(
    post,
    path = "/api/chat",
    tag = CHAT_TAG,
    operation_id = "Chat",
    summary = "Ask the disaster-management assistant",
    description = "Forwards the conversation to the configured generative model, prefixed with the \
                   assistant's system prompt. `assistant` turns are sent as `model` turns.",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Assistant reply", body = ChatReply),
        (status = 500, description = "Assistant unavailable, reply carries the error", body = ChatReply)
    )
)]
pub async fn chat(
    Extension(resources): Extension<AppResources>,
    Json(payload): Json<ChatRequest>,
) -> (StatusCode, Json<ChatReply>) {
    match resources.assistant.reply(&payload.messages).await {
        Ok(reply) => (StatusCode::OK, Json(ChatReply { reply })),
        Err(e) => {
            tracing::error!(error = %e, "Assistant request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ChatReply { reply: e.reply() }),
            )
        }
    }
}
