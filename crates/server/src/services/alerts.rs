//! Alert lifecycle: creation (with automatic response), status updates and
//! the active listing.

use crate::audit::{AuditAction, AuditEvent, AuditLog, AuditTarget};
use crate::auth::Operator;
use crate::domain::{AlertStatus, Severity};
use crate::entity::{alert, user};
use crate::error::OpsError;
use crate::services::response::{ResponseCoordinator, ResponseOutcome};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;

/// Alert as submitted by an operator. Enumerated fields arrive as text and
/// are validated here.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct NewAlert {
    /// Incident category, e.g. `flood`
    #[serde(rename = "type")]
    pub category: String,
    /// One of `low`, `medium`, `high`, `critical`
    pub severity: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub location: String,
    /// Estimated number of people affected, defaults to 0
    #[serde(default, alias = "affectedPopulation")]
    pub affected_population: Option<i64>,
}

struct ValidAlert {
    category: String,
    severity: Severity,
    title: String,
    description: String,
    location: String,
    affected_population: i32,
}

impl NewAlert {
    fn validate(&self) -> Result<ValidAlert, OpsError> {
        let severity: Severity = self.severity.parse()?;
        let category = self.category.trim();
        if category.is_empty() {
            return Err(OpsError::validation("type is required"));
        }
        let title = self.title.trim();
        if title.is_empty() {
            return Err(OpsError::validation("title is required"));
        }
        let location = self.location.trim();
        if location.is_empty() {
            return Err(OpsError::validation("location is required"));
        }
        let affected = self.affected_population.unwrap_or(0);
        let affected_population = i32::try_from(affected)
            .ok()
            .filter(|n| *n >= 0)
            .ok_or_else(|| {
                OpsError::validation("affected population must be a non-negative integer")
            })?;

        Ok(ValidAlert {
            category: category.to_lowercase(),
            severity,
            title: title.to_string(),
            description: self.description.trim().to_string(),
            location: location.to_string(),
            affected_population,
        })
    }
}

/// A freshly created alert and what the automatic response did for it.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CreatedAlert {
    pub alert: alert::Model,
    pub response: ResponseOutcome,
}

/// Alert annotated with its creator's name.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AlertView {
    #[serde(flatten)]
    pub alert: alert::Model,
    pub created_by_name: Option<String>,
}

pub struct AlertService {
    db: Arc<DatabaseConnection>,
}

impl AlertService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Record a new `active` alert. High and critical alerts run the
    /// automatic response in the same transaction, so either everything is
    /// recorded or nothing is.
    #[tracing::instrument(skip(self, actor, input), fields(actor = %actor.id, severity = %input.severity, category = %input.category))]
    pub async fn create(&self, actor: &Operator, input: NewAlert) -> Result<CreatedAlert, OpsError> {
        let valid = input.validate()?;
        let now = OffsetDateTime::now_utc();

        let txn = self.db.begin().await?;
        let alert = alert::ActiveModel {
            id: Set(Uuid::new_v4()),
            category: Set(valid.category),
            severity: Set(valid.severity.to_string()),
            title: Set(valid.title),
            description: Set(valid.description),
            location: Set(valid.location),
            affected_population: Set(valid.affected_population),
            status: Set(AlertStatus::Active.to_string()),
            created_by: Set(Some(actor.id)),
            created_at: Set(now),
            updated_at: Set(now),
            resolved_at: Set(None),
        }
        .insert(&txn)
        .await?;

        let audit = AuditLog::on(&txn);
        audit
            .append(
                AuditEvent::new(actor.id, AuditAction::CreateAlert)
                    .on(AuditTarget::Alert, alert.id)
                    .details(json!(input)),
            )
            .await?;

        let response = if valid.severity.triggers_response() {
            let outcome = ResponseCoordinator::new(&txn, actor.id)
                .respond(&alert, valid.severity)
                .await?;
            if !outcome.is_empty() {
                audit
                    .append(
                        AuditEvent::new(actor.id, AuditAction::AutomaticResponse)
                            .on(AuditTarget::Alert, alert.id)
                            .details(json!({
                                "broadcast_message_id": outcome.broadcast_message_id,
                                "escalated_zones": outcome.escalated_zones,
                                "allocations": outcome.allocations.iter().map(|a| a.id).collect::<Vec<_>>(),
                            })),
                    )
                    .await?;
            }
            outcome
        } else {
            ResponseOutcome::default()
        };
        txn.commit().await?;

        tracing::info!(alert_id = %alert.id, "Alert created");
        Ok(CreatedAlert { alert, response })
    }

    /// Move an alert forward in its lifecycle. Resolving stamps `resolved_at`.
    #[tracing::instrument(skip(self, actor), fields(actor = %actor.id))]
    pub async fn update_status(
        &self,
        actor: &Operator,
        alert_id: Uuid,
        status: &str,
    ) -> Result<alert::Model, OpsError> {
        let next: AlertStatus = status.parse()?;

        let txn = self.db.begin().await?;
        let current = alert::Entity::find_by_id(alert_id)
            .one(&txn)
            .await?
            .ok_or_else(|| OpsError::not_found("Alert"))?;
        let previous = current.status()?;
        if !previous.can_transition_to(next) {
            return Err(OpsError::validation(format!(
                "cannot move alert from {previous} to {next}"
            )));
        }

        let now = OffsetDateTime::now_utc();
        let mut active: alert::ActiveModel = current.into();
        active.status = Set(next.to_string());
        active.updated_at = Set(now);
        if next == AlertStatus::Resolved {
            active.resolved_at = Set(Some(now));
        }
        let updated = active.update(&txn).await?;

        AuditLog::on(&txn)
            .append(
                AuditEvent::new(actor.id, AuditAction::UpdateAlertStatus)
                    .on(AuditTarget::Alert, alert_id)
                    .details(json!({ "from": previous, "status": next })),
            )
            .await?;
        txn.commit().await?;

        tracing::info!(alert_id = %alert_id, from = %previous, to = %next, "Alert status updated");
        Ok(updated)
    }

    /// Alerts still `active` or `monitoring`, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn list_active(&self) -> Result<Vec<AlertView>, OpsError> {
        let rows = alert::Entity::find()
            .filter(alert::Column::Status.is_in([
                AlertStatus::Active.as_str(),
                AlertStatus::Monitoring.as_str(),
            ]))
            .find_also_related(user::Entity)
            .order_by_desc(alert::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?;

        Ok(rows
            .into_iter()
            .map(|(alert, creator)| AlertView {
                alert,
                created_by_name: creator.map(|u| u.display_name()),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> NewAlert {
        NewAlert {
            category: "Flood".into(),
            severity: "critical".into(),
            title: "  River overflow ".into(),
            description: "Levee breach".into(),
            location: "Downtown".into(),
            affected_population: None,
        }
    }

    #[test]
    fn validation_normalises_fields() {
        let valid = input().validate().unwrap();
        assert_eq!(valid.category, "flood");
        assert_eq!(valid.severity, Severity::Critical);
        assert_eq!(valid.title, "River overflow");
        assert_eq!(valid.affected_population, 0);
    }

    #[test]
    fn validation_rejects_bad_input() {
        let mut bad = input();
        bad.severity = "apocalyptic".into();
        assert!(matches!(bad.validate(), Err(OpsError::Validation(_))));

        let mut bad = input();
        bad.title = "   ".into();
        assert!(matches!(bad.validate(), Err(OpsError::Validation(_))));

        let mut bad = input();
        bad.location = String::new();
        assert!(matches!(bad.validate(), Err(OpsError::Validation(_))));

        let mut bad = input();
        bad.affected_population = Some(-1);
        assert!(matches!(bad.validate(), Err(OpsError::Validation(_))));
    }

    #[test]
    fn input_accepts_camel_case_population() {
        let parsed: NewAlert = serde_json::from_value(json!({
            "type": "flood",
            "severity": "high",
            "title": "t",
            "location": "l",
            "affectedPopulation": 5000
        }))
        .unwrap();
        assert_eq!(parsed.affected_population, Some(5000));
        assert_eq!(parsed.description, "");
    }
}
