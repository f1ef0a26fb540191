//! Automatic response to severe alerts.
//!
//! Runs inside the transaction that records the alert:
//!
//! 1. every critical alert is broadcast to the public on mobile, radio and TV;
//! 2. critical floods additionally escalate every `safe` zone whose location
//!    contains the alert location (case-insensitive) to `warning`;
//! 3. each escalated zone gets emergency transport reserved.

use crate::domain::{EMERGENCY_CHANNELS, Severity, ZoneStatus, is_flood, location_matches};
use crate::entity::{alert, evacuation_zone, resource_allocation};
use crate::error::OpsError;
use crate::services::communication::{
    EMERGENCY_ALERT_KIND, OutgoingMessage, PUBLIC_AUDIENCE, record_message,
};
use crate::services::resources::reserve_vehicles;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use serde::Serialize;
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;

/// What the automatic response did for one alert.
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct ResponseOutcome {
    /// Id of the public broadcast, when one was sent
    pub broadcast_message_id: Option<Uuid>,
    /// Codes of the zones moved from `safe` to `warning`
    pub escalated_zones: Vec<String>,
    /// Transport reserved for the escalated zones
    pub allocations: Vec<resource_allocation::Model>,
}

impl ResponseOutcome {
    pub fn is_empty(&self) -> bool {
        self.broadcast_message_id.is_none()
            && self.escalated_zones.is_empty()
            && self.allocations.is_empty()
    }
}

pub struct ResponseCoordinator<'c, C: ConnectionTrait> {
    conn: &'c C,
    actor: Uuid,
}

impl<'c, C: ConnectionTrait> ResponseCoordinator<'c, C> {
    pub fn new(conn: &'c C, actor: Uuid) -> Self {
        Self { conn, actor }
    }

    #[tracing::instrument(skip(self, alert), fields(alert_id = %alert.id, category = %alert.category, severity = %severity))]
    pub async fn respond(
        &self,
        alert: &alert::Model,
        severity: Severity,
    ) -> Result<ResponseOutcome, OpsError> {
        let mut outcome = ResponseOutcome::default();
        if severity != Severity::Critical {
            return Ok(outcome);
        }

        let broadcast = record_message(
            self.conn,
            OutgoingMessage {
                kind: EMERGENCY_ALERT_KIND.to_string(),
                title: alert.title.clone(),
                content: alert.description.clone(),
                channels: EMERGENCY_CHANNELS.to_vec(),
                audience: PUBLIC_AUDIENCE.to_string(),
                sent_by: Some(self.actor),
            },
        )
        .await?;
        outcome.broadcast_message_id = Some(broadcast.id);

        if is_flood(&alert.category) {
            for zone in self.escalate_zones(&alert.location).await? {
                let allocations = reserve_vehicles(self.conn, &zone.name, Some(self.actor)).await?;
                outcome.allocations.extend(allocations);
                outcome.escalated_zones.push(zone.zone_id);
            }
        }

        tracing::info!(
            broadcast = %broadcast.id,
            escalated = outcome.escalated_zones.len(),
            allocations = outcome.allocations.len(),
            "Automatic response completed"
        );
        Ok(outcome)
    }

    /// Move matching `safe` zones to `warning`. Returns the zones this call
    /// actually transitioned.
    async fn escalate_zones(&self, location: &str) -> Result<Vec<evacuation_zone::Model>, OpsError> {
        let candidates = evacuation_zone::Entity::find()
            .filter(evacuation_zone::Column::Status.eq(ZoneStatus::Safe.as_str()))
            .all(self.conn)
            .await?;

        let now = OffsetDateTime::now_utc();
        let mut escalated = Vec::new();
        for zone in candidates
            .into_iter()
            .filter(|z| location_matches(&z.location, location))
        {
            let result = evacuation_zone::Entity::update_many()
                .col_expr(
                    evacuation_zone::Column::Status,
                    Expr::value(ZoneStatus::Warning.as_str()),
                )
                .col_expr(evacuation_zone::Column::UpdatedAt, Expr::value(now))
                .filter(evacuation_zone::Column::Id.eq(zone.id))
                .filter(evacuation_zone::Column::Status.eq(ZoneStatus::Safe.as_str()))
                .exec(self.conn)
                .await?;
            if result.rows_affected == 1 {
                tracing::info!(zone = %zone.zone_id, "Zone escalated to warning");
                escalated.push(zone);
            }
        }
        Ok(escalated)
    }
}
