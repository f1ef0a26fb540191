//! Resource endpoints.
//!
//! - `GET /api/resources` - inventory and recent allocations
//! - `POST /api/resources/allocations` - request stock for a destination
//! - `POST /api/resources/allocations/{id}/approve` - approve a pending request
//! - `POST /api/resources/allocations/{id}/deliver` - confirm delivery
//! - `POST /api/resources/{id}/inventory` - restock or recount

use crate::AppResources;
use crate::api::auth::CurrentOperator;
use crate::entity::{resource, resource_allocation};
use crate::error::{ErrorBody, OpsError};
use crate::services::resources::{
    AllocationRequest, AllocationView, InventoryAdjustment, ResourceService,
};
use axum::{Extension, Json, extract::Path};
use serde::Serialize;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};
use uuid::Uuid;

pub const RESOURCES_TAG: &str = "Resources";

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResourceOverview {
    pub resources: Vec<resource::Model>,
    pub recent_allocations: Vec<AllocationView>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AllocationResponse {
    pub allocation: resource_allocation::Model,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ResourceResponse {
    pub resource: resource::Model,
}

pub fn router() -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(overview))
        .routes(routes!(request_allocation))
        .routes(routes!(approve_allocation))
        .routes(routes!(confirm_delivery))
        .routes(routes!(adjust_inventory))
}

#[tracing::instrument(skip(resources))]
#[utoipa::path(
    get,
    path = "/api/resources",
    tag = RESOURCES_TAG,
    operation_id = "Resource Overview",
    summary = "Inventory and the 20 newest allocations",
    responses(
        (status = 200, description = "Resource overview", body = ResourceOverview),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn overview(
    Extension(resources): Extension<AppResources>,
) -> Result<Json<ResourceOverview>, OpsError> {
    let service = ResourceService::new(resources.db.clone());
    Ok(Json(ResourceOverview {
        resources: service.inventory().await?,
        recent_allocations: service.recent_allocations().await?,
    }))
}

#[tracing::instrument(skip(resources, operator, payload), fields(user_id = %operator.id))]
#[utoipa::path(
    post,
    path = "/api/resources/allocations",
    tag = RESOURCES_TAG,
    operation_id = "Request Allocation",
    summary = "Request stock for a destination",
    description = "Creates a `pending` allocation. `critical` requests are approved immediately \
                   and take their stock in the same transaction.",
    request_body = AllocationRequest,
    security(("session" = []), ("bearer" = [])),
    responses(
        (status = 200, description = "Allocation recorded", body = AllocationResponse),
        (status = 400, description = "Invalid input", body = ErrorBody),
        (status = 401, description = "No valid session", body = ErrorBody),
        (status = 404, description = "Resource not found", body = ErrorBody),
        (status = 409, description = "Not enough stock", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn request_allocation(
    Extension(resources): Extension<AppResources>,
    CurrentOperator(operator): CurrentOperator,
    Json(payload): Json<AllocationRequest>,
) -> Result<Json<AllocationResponse>, OpsError> {
    let allocation = ResourceService::new(resources.db.clone())
        .request_allocation(&operator, payload)
        .await?;
    Ok(Json(AllocationResponse { allocation }))
}

#[tracing::instrument(skip(resources, operator), fields(user_id = %operator.id))]
#[utoipa::path(
    post,
    path = "/api/resources/allocations/{id}/approve",
    tag = RESOURCES_TAG,
    operation_id = "Approve Allocation",
    summary = "Approve a pending allocation",
    description = "Takes the requested quantity from stock. Fails with 409 and leaves stock \
                   untouched when not enough is available.",
    params(("id" = Uuid, Path, description = "Allocation id")),
    security(("session" = []), ("bearer" = [])),
    responses(
        (status = 200, description = "Allocation approved", body = AllocationResponse),
        (status = 400, description = "Allocation is not pending", body = ErrorBody),
        (status = 401, description = "No valid session", body = ErrorBody),
        (status = 404, description = "Allocation not found", body = ErrorBody),
        (status = 409, description = "Not enough stock", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn approve_allocation(
    Extension(resources): Extension<AppResources>,
    CurrentOperator(operator): CurrentOperator,
    Path(id): Path<Uuid>,
) -> Result<Json<AllocationResponse>, OpsError> {
    let allocation = ResourceService::new(resources.db.clone())
        .approve_allocation(&operator, id)
        .await?;
    Ok(Json(AllocationResponse { allocation }))
}

#[tracing::instrument(skip(resources, operator), fields(user_id = %operator.id))]
#[utoipa::path(
    post,
    path = "/api/resources/allocations/{id}/deliver",
    tag = RESOURCES_TAG,
    operation_id = "Confirm Delivery",
    summary = "Mark an approved allocation delivered",
    params(("id" = Uuid, Path, description = "Allocation id")),
    security(("session" = []), ("bearer" = [])),
    responses(
        (status = 200, description = "Allocation delivered", body = AllocationResponse),
        (status = 400, description = "Allocation is not approved", body = ErrorBody),
        (status = 401, description = "No valid session", body = ErrorBody),
        (status = 404, description = "Allocation not found", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn confirm_delivery(
    Extension(resources): Extension<AppResources>,
    CurrentOperator(operator): CurrentOperator,
    Path(id): Path<Uuid>,
) -> Result<Json<AllocationResponse>, OpsError> {
    let allocation = ResourceService::new(resources.db.clone())
        .confirm_delivery(&operator, id)
        .await?;
    Ok(Json(AllocationResponse { allocation }))
}

#[tracing::instrument(skip(resources, operator, payload), fields(user_id = %operator.id))]
#[utoipa::path(
    post,
    path = "/api/resources/{id}/inventory",
    tag = RESOURCES_TAG,
    operation_id = "Adjust Inventory",
    summary = "Restock or recount a resource",
    description = "`add` increases total and available quantity, `set` overwrites both.",
    params(("id" = Uuid, Path, description = "Resource id")),
    request_body = InventoryAdjustment,
    security(("session" = []), ("bearer" = [])),
    responses(
        (status = 200, description = "Updated resource", body = ResourceResponse),
        (status = 400, description = "Invalid operation or negative result", body = ErrorBody),
        (status = 401, description = "No valid session", body = ErrorBody),
        (status = 404, description = "Resource not found", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn adjust_inventory(
    Extension(resources): Extension<AppResources>,
    CurrentOperator(operator): CurrentOperator,
    Path(id): Path<Uuid>,
    Json(payload): Json<InventoryAdjustment>,
) -> Result<Json<ResourceResponse>, OpsError> {
    let resource = ResourceService::new(resources.db.clone())
        .adjust_inventory(&operator, id, payload)
        .await?;
    Ok(Json(ResourceResponse { resource }))
}
