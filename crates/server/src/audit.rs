//! Audit sink for state-changing actions.
//!
//! Every mutating operation describes what it did as an [`AuditEvent`] and
//! hands it to [`AuditLog::append`] on the same connection or transaction it
//! used for the change, so the log row commits or rolls back with it.

use crate::entity::system_log;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, ConnectionTrait, DbErr};
use serde_json::Value;
use std::fmt;
use time::OffsetDateTime;
use uuid::Uuid;

/// Action names recorded in `system_logs.action`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    Login,
    CreateAlert,
    UpdateAlertStatus,
    AutomaticResponse,
    InitiateEvacuation,
    IssueZoneWarning,
    UpdateEvacuationProgress,
    UpdateRouteStatus,
    RequestResource,
    ApproveAllocation,
    ConfirmDelivery,
    UpdateInventory,
    BroadcastMessage,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Login => "login",
            AuditAction::CreateAlert => "create_alert",
            AuditAction::UpdateAlertStatus => "update_alert_status",
            AuditAction::AutomaticResponse => "automatic_response",
            AuditAction::InitiateEvacuation => "initiate_evacuation",
            AuditAction::IssueZoneWarning => "issue_zone_warning",
            AuditAction::UpdateEvacuationProgress => "update_evacuation_progress",
            AuditAction::UpdateRouteStatus => "update_route_status",
            AuditAction::RequestResource => "request_resource",
            AuditAction::ApproveAllocation => "approve_allocation",
            AuditAction::ConfirmDelivery => "confirm_delivery",
            AuditAction::UpdateInventory => "update_inventory",
            AuditAction::BroadcastMessage => "broadcast_message",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of record an audit entry refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditTarget {
    Alert,
    EvacuationZone,
    EvacuationRoute,
    Resource,
    ResourceAllocation,
    Message,
}

impl AuditTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditTarget::Alert => "alert",
            AuditTarget::EvacuationZone => "evacuation_zone",
            AuditTarget::EvacuationRoute => "evacuation_route",
            AuditTarget::Resource => "resource",
            AuditTarget::ResourceAllocation => "resource_allocation",
            AuditTarget::Message => "message",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuditEvent {
    pub actor: Option<Uuid>,
    pub action: AuditAction,
    pub target: Option<(AuditTarget, String)>,
    pub details: Value,
}

impl AuditEvent {
    pub fn new(actor: Uuid, action: AuditAction) -> Self {
        Self {
            actor: Some(actor),
            action,
            target: None,
            details: Value::Object(Default::default()),
        }
    }

    pub fn on(mut self, target: AuditTarget, id: impl ToString) -> Self {
        self.target = Some((target, id.to_string()));
        self
    }

    pub fn details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }
}

/// Append-only writer over `system_logs`.
pub struct AuditLog<'c, C: ConnectionTrait> {
    conn: &'c C,
}

impl<'c, C: ConnectionTrait> AuditLog<'c, C> {
    pub fn on(conn: &'c C) -> Self {
        Self { conn }
    }

    #[tracing::instrument(skip(self, event), fields(action = %event.action))]
    pub async fn append(&self, event: AuditEvent) -> Result<system_log::Model, DbErr> {
        let (resource_type, resource_id) = match event.target {
            Some((target, id)) => (Some(target.as_str().to_string()), Some(id)),
            None => (None, None),
        };
        let entry = system_log::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(event.actor),
            action: Set(event.action.as_str().to_string()),
            resource_type: Set(resource_type),
            resource_id: Set(resource_id),
            details: Set(event.details),
            created_at: Set(OffsetDateTime::now_utc()),
        };
        entry.insert(self.conn).await
    }
}
