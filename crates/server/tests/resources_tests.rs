mod common;

use common::{create_operator, create_resource, reload_resource, setup_db};
use disaster_ops::{
    entity::{resource_allocation, system_log},
    error::OpsError,
    services::resources::{AllocationRequest, InventoryAdjustment, ResourceService},
};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use uuid::Uuid;

fn request(resource_id: Uuid, quantity: i32, priority: &str) -> AllocationRequest {
    AllocationRequest {
        resource_id,
        quantity,
        destination: "Shelter 4".into(),
        priority: priority.into(),
        justification: Some("Night shift".into()),
    }
}

fn adjustment(quantity: i32, operation: &str) -> InventoryAdjustment {
    InventoryAdjustment {
        quantity,
        operation: operation.into(),
    }
}

#[tokio::test]
async fn test_request_is_pending_and_keeps_stock() {
    let db = setup_db().await;
    let operator = create_operator(&db).await;
    let blankets = create_resource(&db, "Blankets", "supplies", 20).await;

    let allocation = ResourceService::new(db.clone())
        .request_allocation(&operator, request(blankets.id, 10, "medium"))
        .await
        .expect("request");

    assert_eq!(allocation.status, "pending");
    assert_eq!(allocation.requested_by, Some(operator.id));
    assert!(allocation.approved_at.is_none());
    assert_eq!(reload_resource(&db, blankets.id).await.available_quantity, 20);
}

#[tokio::test]
async fn test_request_over_stock_is_rejected() {
    let db = setup_db().await;
    let operator = create_operator(&db).await;
    let blankets = create_resource(&db, "Blankets", "supplies", 5).await;

    let err = ResourceService::new(db.clone())
        .request_allocation(&operator, request(blankets.id, 6, "low"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        OpsError::InsufficientResource {
            requested: 6,
            available: 5
        }
    ));
    assert_eq!(resource_allocation::Entity::find().count(db.as_ref()).await.unwrap(), 0);
}

#[tokio::test]
async fn test_request_validation() {
    let db = setup_db().await;
    let operator = create_operator(&db).await;
    let blankets = create_resource(&db, "Blankets", "supplies", 5).await;
    let service = ResourceService::new(db.clone());

    let err = service
        .request_allocation(&operator, request(blankets.id, 0, "low"))
        .await
        .unwrap_err();
    assert!(matches!(err, OpsError::Validation(_)));

    let err = service
        .request_allocation(&operator, request(blankets.id, 1, "whenever"))
        .await
        .unwrap_err();
    assert!(matches!(err, OpsError::Validation(_)));

    let err = service
        .request_allocation(&operator, request(Uuid::new_v4(), 1, "low"))
        .await
        .unwrap_err();
    assert!(matches!(err, OpsError::NotFound(_)));
}

#[tokio::test]
async fn test_critical_request_is_approved_immediately() {
    let db = setup_db().await;
    let operator = create_operator(&db).await;
    let kits = create_resource(&db, "Medical kits", "medical", 30).await;

    let allocation = ResourceService::new(db.clone())
        .request_allocation(&operator, request(kits.id, 12, "critical"))
        .await
        .expect("request");

    assert_eq!(allocation.status, "approved");
    assert_eq!(allocation.approved_by, Some(operator.id));
    assert!(allocation.approved_at.is_some());
    assert_eq!(reload_resource(&db, kits.id).await.available_quantity, 18);
}

#[tokio::test]
async fn test_approval_fails_when_stock_shrank() {
    let db = setup_db().await;
    let operator = create_operator(&db).await;
    let cots = create_resource(&db, "Cots", "supplies", 20).await;
    let service = ResourceService::new(db.clone());

    let pending = service
        .request_allocation(&operator, request(cots.id, 10, "high"))
        .await
        .expect("request");
    service
        .adjust_inventory(&operator, cots.id, adjustment(5, "set"))
        .await
        .expect("recount");

    let err = service
        .approve_allocation(&operator, pending.id)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        OpsError::InsufficientResource {
            requested: 10,
            available: 5
        }
    ));

    assert_eq!(reload_resource(&db, cots.id).await.available_quantity, 5);
    let stored = resource_allocation::Entity::find_by_id(pending.id)
        .one(db.as_ref())
        .await
        .unwrap()
        .expect("allocation");
    assert_eq!(stored.status, "pending");
}

#[tokio::test]
async fn test_allocation_lifecycle() {
    let db = setup_db().await;
    let operator = create_operator(&db).await;
    let water = create_resource(&db, "Water", "supplies", 100).await;
    let service = ResourceService::new(db.clone());

    let pending = service
        .request_allocation(&operator, request(water.id, 40, "high"))
        .await
        .expect("request");

    // Delivery needs an approved allocation
    let err = service.confirm_delivery(&operator, pending.id).await.unwrap_err();
    assert!(matches!(err, OpsError::Validation(_)));

    let approved = service
        .approve_allocation(&operator, pending.id)
        .await
        .expect("approve");
    assert_eq!(approved.status, "approved");
    assert_eq!(reload_resource(&db, water.id).await.available_quantity, 60);

    let err = service.approve_allocation(&operator, pending.id).await.unwrap_err();
    assert!(matches!(err, OpsError::Validation(_)));
    assert_eq!(reload_resource(&db, water.id).await.available_quantity, 60);

    let delivered = service
        .confirm_delivery(&operator, pending.id)
        .await
        .expect("deliver");
    assert_eq!(delivered.status, "delivered");
    assert!(delivered.delivered_at.is_some());

    let err = service.confirm_delivery(&operator, pending.id).await.unwrap_err();
    assert!(matches!(err, OpsError::Validation(_)));

    let err = service
        .approve_allocation(&operator, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, OpsError::NotFound(_)));

    for action in ["request_resource", "approve_allocation", "confirm_delivery"] {
        let count = system_log::Entity::find()
            .filter(system_log::Column::Action.eq(action))
            .count(db.as_ref())
            .await
            .unwrap();
        assert_eq!(count, 1, "{action}");
    }
}

#[tokio::test]
async fn test_inventory_adjustments() {
    let db = setup_db().await;
    let operator = create_operator(&db).await;
    let sandbags = create_resource(&db, "Sandbags", "equipment", 50).await;
    let service = ResourceService::new(db.clone());

    let added = service
        .adjust_inventory(&operator, sandbags.id, adjustment(25, "add"))
        .await
        .expect("add");
    assert_eq!(added.total_quantity, 75);
    assert_eq!(added.available_quantity, 75);

    let removed = service
        .adjust_inventory(&operator, sandbags.id, adjustment(-70, "add"))
        .await
        .expect("remove");
    assert_eq!(removed.available_quantity, 5);

    let err = service
        .adjust_inventory(&operator, sandbags.id, adjustment(-6, "add"))
        .await
        .unwrap_err();
    assert!(matches!(err, OpsError::Validation(_)));

    let err = service
        .adjust_inventory(&operator, sandbags.id, adjustment(-1, "set"))
        .await
        .unwrap_err();
    assert!(matches!(err, OpsError::Validation(_)));

    let err = service
        .adjust_inventory(&operator, sandbags.id, adjustment(1, "multiply"))
        .await
        .unwrap_err();
    assert!(matches!(err, OpsError::Validation(_)));

    let set = service
        .adjust_inventory(&operator, sandbags.id, adjustment(200, "set"))
        .await
        .expect("set");
    assert_eq!(set.total_quantity, 200);
    assert_eq!(set.available_quantity, 200);
}

#[tokio::test]
async fn test_inventory_add_out_of_range_is_rejected() {
    let db = setup_db().await;
    let operator = create_operator(&db).await;
    let cots = create_resource(&db, "Cots", "shelter", 5).await;
    let service = ResourceService::new(db.clone());

    let err = service
        .adjust_inventory(&operator, cots.id, adjustment(i32::MAX, "add"))
        .await
        .unwrap_err();
    assert!(matches!(err, OpsError::Validation(_)));
    assert!(err.to_string().contains("out of range"));

    let err = service
        .adjust_inventory(&operator, cots.id, adjustment(i32::MIN, "add"))
        .await
        .unwrap_err();
    assert!(matches!(err, OpsError::Validation(_)));

    let after = reload_resource(&db, cots.id).await;
    assert_eq!(after.total_quantity, 5);
    assert_eq!(after.available_quantity, 5);
}

#[tokio::test]
async fn test_type_summary_and_recent_allocations() {
    let db = setup_db().await;
    let operator = create_operator(&db).await;
    let buses = create_resource(&db, "Buses", "vehicles", 10).await;
    create_resource(&db, "Boats", "vehicles", 3).await;
    create_resource(&db, "Water", "supplies", 100).await;
    let service = ResourceService::new(db.clone());

    service
        .request_allocation(&operator, request(buses.id, 4, "critical"))
        .await
        .expect("request");

    let summary = service.type_summary().await.expect("summary");
    assert_eq!(summary.len(), 2);
    assert_eq!(summary[0].kind, "supplies");
    assert_eq!((summary[0].available, summary[0].total), (100, 100));
    assert_eq!(summary[1].kind, "vehicles");
    assert_eq!((summary[1].available, summary[1].total), (9, 13));

    let recent = service.recent_allocations().await.expect("recent");
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].resource_name.as_deref(), Some("Buses"));
    assert_eq!(recent[0].unit.as_deref(), Some("units"));

    let inventory = service.inventory().await.expect("inventory");
    let names: Vec<_> = inventory.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Water", "Boats", "Buses"]);
}
