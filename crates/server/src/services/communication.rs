//! Broadcast messages and the communication log.

use crate::audit::{AuditAction, AuditEvent, AuditLog, AuditTarget};
use crate::auth::Operator;
use crate::domain::{Channel, join_channels};
use crate::entity::message;
use crate::error::OpsError;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ConnectionTrait, DatabaseConnection, EntityTrait,
    QueryOrder, QuerySelect, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;

/// How many messages the communication log returns.
pub const LOG_LIMIT: u64 = 50;

/// Message kind used for automatic critical-alert broadcasts.
pub const EMERGENCY_ALERT_KIND: &str = "emergency_alert";
/// Message kind used for evacuation orders.
pub const EVACUATION_ORDER_KIND: &str = "evacuation_order";
/// Audience of automatic critical-alert broadcasts.
pub const PUBLIC_AUDIENCE: &str = "public";

const SENT_STATUS: &str = "sent";

/// A message about to be recorded as sent.
#[derive(Debug, Clone)]
pub struct OutgoingMessage {
    pub kind: String,
    pub title: String,
    pub content: String,
    pub channels: Vec<Channel>,
    pub audience: String,
    pub sent_by: Option<Uuid>,
}

/// Persist a sent message. A sent message must go out on at least one
/// channel.
pub async fn record_message<C: ConnectionTrait>(
    conn: &C,
    outgoing: OutgoingMessage,
) -> Result<message::Model, OpsError> {
    if outgoing.channels.is_empty() {
        return Err(OpsError::validation(
            "a broadcast needs at least one channel",
        ));
    }
    let mut channels = outgoing.channels;
    channels.sort();
    channels.dedup();

    let row = message::ActiveModel {
        id: Set(Uuid::new_v4()),
        kind: Set(outgoing.kind),
        title: Set(outgoing.title),
        content: Set(outgoing.content),
        channels: Set(join_channels(&channels)),
        target_audience: Set(outgoing.audience),
        status: Set(SENT_STATUS.to_string()),
        sent_by: Set(outgoing.sent_by),
        sent_at: Set(OffsetDateTime::now_utc()),
    };
    Ok(row.insert(conn).await?)
}

/// Operator-initiated broadcast.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct BroadcastRequest {
    /// Message kind, defaults to `general`
    #[serde(rename = "type", default = "default_kind")]
    pub kind: String,
    pub title: String,
    pub content: String,
    /// Channel names, e.g. `["mobile", "radio"]`
    pub channels: Vec<String>,
    /// Audience tag, defaults to `public`
    #[serde(alias = "targetAudience", default = "default_audience")]
    pub target_audience: String,
}

fn default_kind() -> String {
    "general".to_string()
}

fn default_audience() -> String {
    PUBLIC_AUDIENCE.to_string()
}

/// Entry of the fixed broadcast channel catalogue.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BroadcastChannel {
    pub id: &'static str,
    pub name: &'static str,
    #[serde(rename = "type")]
    pub kind: Channel,
    pub status: &'static str,
    pub coverage: &'static str,
}

pub struct CommunicationService {
    db: Arc<DatabaseConnection>,
}

impl CommunicationService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[tracing::instrument(skip(self, actor, request), fields(actor = %actor.id, kind = %request.kind))]
    pub async fn broadcast(
        &self,
        actor: &Operator,
        request: BroadcastRequest,
    ) -> Result<message::Model, OpsError> {
        if request.title.trim().is_empty() {
            return Err(OpsError::validation("title is required"));
        }
        let channels = request
            .channels
            .iter()
            .map(|c| c.parse::<Channel>())
            .collect::<Result<Vec<_>, _>>()?;

        let txn = self.db.begin().await?;
        let message = record_message(
            &txn,
            OutgoingMessage {
                kind: request.kind,
                title: request.title,
                content: request.content,
                channels,
                audience: request.target_audience,
                sent_by: Some(actor.id),
            },
        )
        .await?;
        AuditLog::on(&txn)
            .append(
                AuditEvent::new(actor.id, AuditAction::BroadcastMessage)
                    .on(AuditTarget::Message, message.id)
                    .details(json!({
                        "type": message.kind,
                        "channels": message.channels,
                        "target_audience": message.target_audience,
                    })),
            )
            .await?;
        txn.commit().await?;

        tracing::info!(message_id = %message.id, channels = %message.channels, "Broadcast sent");
        Ok(message)
    }

    /// Newest messages first.
    #[tracing::instrument(skip(self))]
    pub async fn logs(&self) -> Result<Vec<message::Model>, OpsError> {
        Ok(message::Entity::find()
            .order_by_desc(message::Column::SentAt)
            .limit(LOG_LIMIT)
            .all(self.db.as_ref())
            .await?)
    }

    pub fn channels() -> Vec<BroadcastChannel> {
        vec![
            BroadcastChannel {
                id: "1",
                name: "Emergency Radio Network",
                kind: Channel::Radio,
                status: "active",
                coverage: "95%",
            },
            BroadcastChannel {
                id: "2",
                name: "Mobile Alert System",
                kind: Channel::Mobile,
                status: "active",
                coverage: "98%",
            },
            BroadcastChannel {
                id: "3",
                name: "Television Emergency Broadcast",
                kind: Channel::Tv,
                status: "active",
                coverage: "92%",
            },
        ]
    }
}
