//! Inventory and allocation management.
//!
//! Availability only ever changes through [`take_inventory`] (conditional
//! decrement) or [`ResourceService::adjust_inventory`], so
//! `available_quantity` cannot go below zero even when two requests race for
//! the same stock.

use crate::audit::{AuditAction, AuditEvent, AuditLog, AuditTarget};
use crate::auth::Operator;
use crate::domain::{
    AllocationStatus, InventoryOperation, Priority, VEHICLE_RESOURCE_TYPE,
    VEHICLE_RESOURCES_PER_ZONE, vehicle_reservation_quantity,
};
use crate::entity::{resource, resource_allocation};
use crate::error::OpsError;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, FromQueryResult, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;

/// How many allocations the "recent" listing returns.
pub const RECENT_ALLOCATIONS_LIMIT: u64 = 20;

/// Allocation joined with the resource it draws from.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AllocationView {
    #[serde(flatten)]
    pub allocation: resource_allocation::Model,
    pub resource_name: Option<String>,
    pub unit: Option<String>,
}

/// Per-type inventory totals.
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult, Serialize, ToSchema)]
pub struct ResourceTypeSummary {
    #[serde(rename = "type")]
    pub kind: String,
    pub available: i64,
    pub total: i64,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AllocationRequest {
    #[serde(alias = "resourceId")]
    pub resource_id: Uuid,
    pub quantity: i32,
    pub destination: String,
    pub priority: String,
    #[serde(default)]
    pub justification: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct InventoryAdjustment {
    pub quantity: i32,
    /// `add` or `set`
    pub operation: String,
}

/// Atomically take `quantity` units from a resource. Fails with
/// [`OpsError::InsufficientResource`] without touching the row when fewer
/// units are available.
pub async fn take_inventory<C: ConnectionTrait>(
    conn: &C,
    resource_id: Uuid,
    quantity: i32,
) -> Result<(), OpsError> {
    let result = resource::Entity::update_many()
        .col_expr(
            resource::Column::AvailableQuantity,
            Expr::col(resource::Column::AvailableQuantity).sub(quantity),
        )
        .col_expr(
            resource::Column::UpdatedAt,
            Expr::value(OffsetDateTime::now_utc()),
        )
        .filter(resource::Column::Id.eq(resource_id))
        .filter(resource::Column::AvailableQuantity.gte(quantity))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        let available = resource::Entity::find_by_id(resource_id)
            .one(conn)
            .await?
            .ok_or_else(|| OpsError::not_found("Resource"))?
            .available_quantity;
        return Err(OpsError::InsufficientResource {
            requested: quantity,
            available,
        });
    }
    Ok(())
}

/// Reserve emergency transport for `destination`: up to three vehicle
/// resources with stock, largest first, two units each (or whatever is
/// left). Allocations are created already approved.
#[tracing::instrument(skip(conn))]
pub async fn reserve_vehicles<C: ConnectionTrait>(
    conn: &C,
    destination: &str,
    actor: Option<Uuid>,
) -> Result<Vec<resource_allocation::Model>, OpsError> {
    let vehicles = resource::Entity::find()
        .filter(resource::Column::Kind.eq(VEHICLE_RESOURCE_TYPE))
        .filter(resource::Column::AvailableQuantity.gt(0))
        .order_by_desc(resource::Column::AvailableQuantity)
        .limit(VEHICLE_RESOURCES_PER_ZONE)
        .all(conn)
        .await?;

    let mut allocations = Vec::with_capacity(vehicles.len());
    for vehicle in vehicles {
        let quantity = vehicle_reservation_quantity(vehicle.available_quantity);
        match take_inventory(conn, vehicle.id, quantity).await {
            Ok(()) => {}
            Err(OpsError::InsufficientResource { available, .. }) => {
                tracing::warn!(
                    resource_id = %vehicle.id,
                    requested = quantity,
                    available,
                    "Vehicle stock changed during reservation, skipping"
                );
                continue;
            }
            Err(e) => return Err(e),
        }

        let now = OffsetDateTime::now_utc();
        let allocation = resource_allocation::ActiveModel {
            id: Set(Uuid::new_v4()),
            resource_id: Set(vehicle.id),
            quantity: Set(quantity),
            destination: Set(destination.to_string()),
            requested_by: Set(actor),
            approved_by: Set(actor),
            priority: Set(Priority::High.to_string()),
            status: Set(AllocationStatus::Approved.to_string()),
            justification: Set(Some("Automatic evacuation transport".to_string())),
            requested_at: Set(now),
            approved_at: Set(Some(now)),
            delivered_at: Set(None),
        }
        .insert(conn)
        .await?;

        tracing::info!(
            allocation_id = %allocation.id,
            resource = %vehicle.name,
            quantity,
            destination,
            "Reserved vehicles"
        );
        allocations.push(allocation);
    }
    Ok(allocations)
}

/// Approve a pending allocation on `conn`, taking the stock it asks for.
async fn approve_in<C: ConnectionTrait>(
    conn: &C,
    allocation: resource_allocation::Model,
    approver: Uuid,
) -> Result<resource_allocation::Model, OpsError> {
    if allocation.status()? != AllocationStatus::Pending {
        return Err(OpsError::validation(format!(
            "allocation is {}, only pending allocations can be approved",
            allocation.status
        )));
    }
    take_inventory(conn, allocation.resource_id, allocation.quantity).await?;

    let quantity = allocation.quantity;
    let mut active: resource_allocation::ActiveModel = allocation.into();
    active.status = Set(AllocationStatus::Approved.to_string());
    active.approved_by = Set(Some(approver));
    active.approved_at = Set(Some(OffsetDateTime::now_utc()));
    let approved = active.update(conn).await?;

    AuditLog::on(conn)
        .append(
            AuditEvent::new(approver, AuditAction::ApproveAllocation)
                .on(AuditTarget::ResourceAllocation, approved.id)
                .details(json!({ "quantity": quantity })),
        )
        .await?;
    Ok(approved)
}

async fn find_allocation<C: ConnectionTrait>(
    conn: &C,
    allocation_id: Uuid,
) -> Result<resource_allocation::Model, OpsError> {
    resource_allocation::Entity::find_by_id(allocation_id)
        .one(conn)
        .await?
        .ok_or_else(|| OpsError::not_found("Allocation"))
}

pub struct ResourceService {
    db: Arc<DatabaseConnection>,
}

impl ResourceService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// All resources, grouped by type then name.
    #[tracing::instrument(skip(self))]
    pub async fn inventory(&self) -> Result<Vec<resource::Model>, OpsError> {
        Ok(resource::Entity::find()
            .order_by_asc(resource::Column::Kind)
            .order_by_asc(resource::Column::Name)
            .all(self.db.as_ref())
            .await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn recent_allocations(&self) -> Result<Vec<AllocationView>, OpsError> {
        let rows = resource_allocation::Entity::find()
            .find_also_related(resource::Entity)
            .order_by_desc(resource_allocation::Column::RequestedAt)
            .limit(RECENT_ALLOCATIONS_LIMIT)
            .all(self.db.as_ref())
            .await?;
        Ok(rows
            .into_iter()
            .map(|(allocation, resource)| AllocationView {
                allocation,
                resource_name: resource.as_ref().map(|r| r.name.clone()),
                unit: resource.map(|r| r.unit),
            })
            .collect())
    }

    /// SUM of available and total quantity per resource type.
    #[tracing::instrument(skip(self))]
    pub async fn type_summary(&self) -> Result<Vec<ResourceTypeSummary>, OpsError> {
        Ok(resource::Entity::find()
            .select_only()
            .column_as(resource::Column::Kind, "kind")
            .column_as(Expr::col(resource::Column::AvailableQuantity).sum(), "available")
            .column_as(Expr::col(resource::Column::TotalQuantity).sum(), "total")
            .group_by(resource::Column::Kind)
            .order_by_asc(resource::Column::Kind)
            .into_model::<ResourceTypeSummary>()
            .all(self.db.as_ref())
            .await?)
    }

    /// Request stock for a destination. Critical requests are approved on the
    /// spot.
    #[tracing::instrument(skip(self, actor, request), fields(actor = %actor.id, resource_id = %request.resource_id, quantity = request.quantity))]
    pub async fn request_allocation(
        &self,
        actor: &Operator,
        request: AllocationRequest,
    ) -> Result<resource_allocation::Model, OpsError> {
        let priority: Priority = request.priority.parse()?;
        if request.quantity <= 0 {
            return Err(OpsError::validation("quantity must be positive"));
        }
        if request.destination.trim().is_empty() {
            return Err(OpsError::validation("destination is required"));
        }

        let txn = self.db.begin().await?;
        let resource = resource::Entity::find_by_id(request.resource_id)
            .one(&txn)
            .await?
            .ok_or_else(|| OpsError::not_found("Resource"))?;
        if resource.available_quantity < request.quantity {
            return Err(OpsError::InsufficientResource {
                requested: request.quantity,
                available: resource.available_quantity,
            });
        }

        let pending = resource_allocation::ActiveModel {
            id: Set(Uuid::new_v4()),
            resource_id: Set(resource.id),
            quantity: Set(request.quantity),
            destination: Set(request.destination.trim().to_string()),
            requested_by: Set(Some(actor.id)),
            approved_by: Set(None),
            priority: Set(priority.to_string()),
            status: Set(AllocationStatus::Pending.to_string()),
            justification: Set(request.justification.clone()),
            requested_at: Set(OffsetDateTime::now_utc()),
            approved_at: Set(None),
            delivered_at: Set(None),
        }
        .insert(&txn)
        .await?;

        AuditLog::on(&txn)
            .append(
                AuditEvent::new(actor.id, AuditAction::RequestResource)
                    .on(AuditTarget::Resource, resource.id)
                    .details(json!({
                        "allocation_id": pending.id,
                        "quantity": request.quantity,
                        "destination": pending.destination,
                        "priority": priority,
                        "justification": request.justification,
                    })),
            )
            .await?;

        let allocation = if priority == Priority::Critical {
            approve_in(&txn, pending, actor.id).await?
        } else {
            pending
        };
        txn.commit().await?;

        tracing::info!(allocation_id = %allocation.id, status = %allocation.status, "Allocation requested");
        Ok(allocation)
    }

    #[tracing::instrument(skip(self, actor), fields(actor = %actor.id))]
    pub async fn approve_allocation(
        &self,
        actor: &Operator,
        allocation_id: Uuid,
    ) -> Result<resource_allocation::Model, OpsError> {
        let txn = self.db.begin().await?;
        let allocation = find_allocation(&txn, allocation_id).await?;
        let approved = approve_in(&txn, allocation, actor.id).await?;
        txn.commit().await?;

        tracing::info!(allocation_id = %approved.id, quantity = approved.quantity, "Allocation approved");
        Ok(approved)
    }

    /// Operator confirms an approved allocation reached its destination.
    #[tracing::instrument(skip(self, actor), fields(actor = %actor.id))]
    pub async fn confirm_delivery(
        &self,
        actor: &Operator,
        allocation_id: Uuid,
    ) -> Result<resource_allocation::Model, OpsError> {
        let txn = self.db.begin().await?;
        let allocation = find_allocation(&txn, allocation_id).await?;
        if allocation.status()? != AllocationStatus::Approved {
            return Err(OpsError::validation(format!(
                "allocation is {}, only approved allocations can be delivered",
                allocation.status
            )));
        }

        let mut active: resource_allocation::ActiveModel = allocation.into();
        active.status = Set(AllocationStatus::Delivered.to_string());
        active.delivered_at = Set(Some(OffsetDateTime::now_utc()));
        let delivered = active.update(&txn).await?;

        AuditLog::on(&txn)
            .append(
                AuditEvent::new(actor.id, AuditAction::ConfirmDelivery)
                    .on(AuditTarget::ResourceAllocation, delivered.id)
                    .details(json!({ "status": delivered.status })),
            )
            .await?;
        txn.commit().await?;
        Ok(delivered)
    }

    /// Restock (`add`) or recount (`set`) a resource.
    #[tracing::instrument(skip(self, actor, adjustment), fields(actor = %actor.id, quantity = adjustment.quantity, operation = %adjustment.operation))]
    pub async fn adjust_inventory(
        &self,
        actor: &Operator,
        resource_id: Uuid,
        adjustment: InventoryAdjustment,
    ) -> Result<resource::Model, OpsError> {
        let operation: InventoryOperation = adjustment.operation.parse()?;

        let txn = self.db.begin().await?;
        let resource = resource::Entity::find_by_id(resource_id)
            .one(&txn)
            .await?
            .ok_or_else(|| OpsError::not_found("Resource"))?;

        let (total, available) = match operation {
            InventoryOperation::Add => {
                let add = |current: i32| {
                    current
                        .checked_add(adjustment.quantity)
                        .ok_or_else(|| OpsError::validation("inventory quantity out of range"))
                };
                (add(resource.total_quantity)?, add(resource.available_quantity)?)
            }
            InventoryOperation::Set => (adjustment.quantity, adjustment.quantity),
        };
        if total < 0 || available < 0 {
            return Err(OpsError::validation(
                "inventory quantities cannot become negative",
            ));
        }

        let mut active: resource::ActiveModel = resource.into();
        active.total_quantity = Set(total);
        active.available_quantity = Set(available);
        active.updated_at = Set(OffsetDateTime::now_utc());
        let updated = active.update(&txn).await?;

        AuditLog::on(&txn)
            .append(
                AuditEvent::new(actor.id, AuditAction::UpdateInventory)
                    .on(AuditTarget::Resource, updated.id)
                    .details(json!({
                        "quantity": adjustment.quantity,
                        "operation": operation,
                    })),
            )
            .await?;
        txn.commit().await?;
        Ok(updated)
    }
}
