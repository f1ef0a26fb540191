//! Evacuation zones and routes.
//!
//! Zone status only moves forward (`safe -> warning -> evacuating ->
//! evacuated`); `evacuated` is terminal and refuses further orders or
//! progress reports.

use crate::audit::{AuditAction, AuditEvent, AuditLog, AuditTarget};
use crate::auth::Operator;
use crate::domain::{
    EMERGENCY_CHANNELS, Priority, RouteStatus, ZoneStatus, evacuation_notice,
    evacuation_percentage, zone_audience,
};
use crate::entity::{evacuation_route, evacuation_zone, resource_allocation};
use crate::error::OpsError;
use crate::services::communication::{EVACUATION_ORDER_KIND, OutgoingMessage, record_message};
use crate::services::resources::reserve_vehicles;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct EvacuationOrder {
    /// `low`, `medium`, `high` or `critical`
    pub priority: String,
    pub reason: String,
    /// Free text, e.g. `6 hours`
    #[serde(alias = "estimatedDuration")]
    pub estimated_duration: String,
}

/// Everything an evacuation order produced.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct InitiatedEvacuation {
    pub zone: evacuation_zone::Model,
    pub notice_message_id: Uuid,
    pub allocations: Vec<resource_allocation::Model>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ProgressUpdate {
    #[serde(alias = "evacuatedCount")]
    pub evacuated_count: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProgressReport {
    pub zone_id: String,
    pub evacuated_count: i64,
    pub percentage: f64,
    pub status: ZoneStatus,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RouteUpdate {
    /// `open`, `congested` or `closed`
    pub status: String,
    #[serde(default, alias = "currentUsage")]
    pub current_usage: Option<i32>,
}

async fn find_zone<C: ConnectionTrait>(
    conn: &C,
    zone_code: &str,
) -> Result<evacuation_zone::Model, OpsError> {
    evacuation_zone::Entity::find()
        .filter(evacuation_zone::Column::ZoneId.eq(zone_code))
        .one(conn)
        .await?
        .ok_or_else(|| OpsError::not_found("Evacuation zone"))
}

pub struct EvacuationService {
    db: Arc<DatabaseConnection>,
}

impl EvacuationService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Highest priority first, then newest.
    #[tracing::instrument(skip(self))]
    pub async fn zones(&self) -> Result<Vec<evacuation_zone::Model>, OpsError> {
        let mut zones = evacuation_zone::Entity::find()
            .order_by_desc(evacuation_zone::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?;
        // Priority is stored as text, so sort on the parsed value. The sort is
        // stable and keeps the created_at order within a priority.
        zones.sort_by_key(|z| std::cmp::Reverse(z.priority().ok()));
        Ok(zones)
    }

    #[tracing::instrument(skip(self))]
    pub async fn routes(&self) -> Result<Vec<evacuation_route::Model>, OpsError> {
        Ok(evacuation_route::Entity::find()
            .order_by_desc(evacuation_route::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?)
    }

    /// Order a zone evacuated: the zone moves to `evacuating`, the order is
    /// broadcast to the zone's residents and transport is reserved.
    #[tracing::instrument(skip(self, actor, order), fields(actor = %actor.id, priority = %order.priority))]
    pub async fn initiate(
        &self,
        actor: &Operator,
        zone_code: &str,
        order: EvacuationOrder,
    ) -> Result<InitiatedEvacuation, OpsError> {
        let priority: Priority = order.priority.parse()?;

        let txn = self.db.begin().await?;
        let zone = find_zone(&txn, zone_code).await?;
        let current = zone.status()?;
        if current.is_terminal() {
            return Err(OpsError::validation(format!(
                "zone {zone_code} is already evacuated"
            )));
        }

        let (title, content) =
            evacuation_notice(&zone.name, priority, &order.reason, &order.estimated_duration);
        let notice = record_message(
            &txn,
            OutgoingMessage {
                kind: EVACUATION_ORDER_KIND.to_string(),
                title,
                content,
                channels: EMERGENCY_CHANNELS.to_vec(),
                audience: zone_audience(&zone.zone_id),
                sent_by: Some(actor.id),
            },
        )
        .await?;

        let allocations = reserve_vehicles(&txn, &zone.name, Some(actor.id)).await?;

        let mut active: evacuation_zone::ActiveModel = zone.into();
        active.status = Set(ZoneStatus::Evacuating.to_string());
        active.priority = Set(priority.to_string());
        active.updated_at = Set(OffsetDateTime::now_utc());
        let zone = active.update(&txn).await?;

        AuditLog::on(&txn)
            .append(
                AuditEvent::new(actor.id, AuditAction::InitiateEvacuation)
                    .on(AuditTarget::EvacuationZone, &zone.zone_id)
                    .details(json!({
                        "previous_status": current,
                        "priority": priority,
                        "reason": order.reason,
                        "estimated_duration": order.estimated_duration,
                        "notice_message_id": notice.id,
                        "allocations": allocations.iter().map(|a| a.id).collect::<Vec<_>>(),
                    })),
            )
            .await?;
        txn.commit().await?;

        tracing::info!(zone = %zone.zone_id, allocations = allocations.len(), "Evacuation initiated");
        Ok(InitiatedEvacuation {
            zone,
            notice_message_id: notice.id,
            allocations,
        })
    }

    /// Record how many residents have left a zone. At 95% the zone counts as
    /// evacuated.
    #[tracing::instrument(skip(self, actor), fields(actor = %actor.id))]
    pub async fn report_progress(
        &self,
        actor: &Operator,
        zone_code: &str,
        evacuated_count: i64,
    ) -> Result<ProgressReport, OpsError> {
        let txn = self.db.begin().await?;
        let zone = find_zone(&txn, zone_code).await?;
        if zone.status()?.is_terminal() {
            return Err(OpsError::validation(format!(
                "zone {zone_code} is already evacuated"
            )));
        }

        let population = i64::from(zone.population);
        if evacuated_count < 0 || evacuated_count > population {
            return Err(OpsError::validation(format!(
                "evacuated count must be between 0 and the zone population ({population})"
            )));
        }
        let evacuated = i32::try_from(evacuated_count)
            .map_err(|_| OpsError::validation("evacuated count out of range"))?;

        let status = ZoneStatus::after_progress(evacuated_count, population);
        let percentage = evacuation_percentage(evacuated_count, population);

        let mut active: evacuation_zone::ActiveModel = zone.into();
        active.evacuated = Set(evacuated);
        active.status = Set(status.to_string());
        active.updated_at = Set(OffsetDateTime::now_utc());
        let zone = active.update(&txn).await?;

        AuditLog::on(&txn)
            .append(
                AuditEvent::new(actor.id, AuditAction::UpdateEvacuationProgress)
                    .on(AuditTarget::EvacuationZone, &zone.zone_id)
                    .details(json!({
                        "evacuated_count": evacuated_count,
                        "percentage": percentage,
                        "status": status,
                    })),
            )
            .await?;
        txn.commit().await?;

        tracing::info!(zone = %zone.zone_id, percentage, %status, "Evacuation progress recorded");
        Ok(ProgressReport {
            zone_id: zone.zone_id,
            evacuated_count,
            percentage,
            status,
        })
    }

    /// Put a `safe` zone on alert.
    #[tracing::instrument(skip(self, actor), fields(actor = %actor.id))]
    pub async fn issue_warning(
        &self,
        actor: &Operator,
        zone_code: &str,
    ) -> Result<evacuation_zone::Model, OpsError> {
        let txn = self.db.begin().await?;
        let zone = find_zone(&txn, zone_code).await?;
        let current = zone.status()?;
        if current != ZoneStatus::Safe {
            return Err(OpsError::validation(format!(
                "zone {zone_code} is {current}, only safe zones can be warned"
            )));
        }

        let mut active: evacuation_zone::ActiveModel = zone.into();
        active.status = Set(ZoneStatus::Warning.to_string());
        active.updated_at = Set(OffsetDateTime::now_utc());
        let zone = active.update(&txn).await?;

        AuditLog::on(&txn)
            .append(
                AuditEvent::new(actor.id, AuditAction::IssueZoneWarning)
                    .on(AuditTarget::EvacuationZone, &zone.zone_id)
                    .details(json!({ "status": ZoneStatus::Warning })),
            )
            .await?;
        txn.commit().await?;
        Ok(zone)
    }

    #[tracing::instrument(skip(self, actor, update), fields(actor = %actor.id, status = %update.status))]
    pub async fn update_route_status(
        &self,
        actor: &Operator,
        route_code: &str,
        update: RouteUpdate,
    ) -> Result<evacuation_route::Model, OpsError> {
        let status: RouteStatus = update.status.parse()?;
        if update.current_usage.is_some_and(|u| u < 0) {
            return Err(OpsError::validation("current usage cannot be negative"));
        }

        let txn = self.db.begin().await?;
        let route = evacuation_route::Entity::find()
            .filter(evacuation_route::Column::RouteId.eq(route_code))
            .one(&txn)
            .await?
            .ok_or_else(|| OpsError::not_found("Evacuation route"))?;

        let mut active: evacuation_route::ActiveModel = route.into();
        active.status = Set(status.to_string());
        if let Some(usage) = update.current_usage {
            active.current_usage = Set(usage);
        }
        active.updated_at = Set(OffsetDateTime::now_utc());
        let route = active.update(&txn).await?;

        AuditLog::on(&txn)
            .append(
                AuditEvent::new(actor.id, AuditAction::UpdateRouteStatus)
                    .on(AuditTarget::EvacuationRoute, &route.route_id)
                    .details(json!({
                        "status": status,
                        "current_usage": update.current_usage,
                    })),
            )
            .await?;
        txn.commit().await?;
        Ok(route)
    }
}
