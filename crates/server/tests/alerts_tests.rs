//! Alert lifecycle and automatic response tests against an in-memory store.

mod common;

use common::{create_operator, create_resource, create_zone, reload_resource, reload_zone, setup_db};
use disaster_ops::{
    domain::ZoneStatus,
    entity::{alert, message, resource_allocation, system_log},
    error::OpsError,
    services::alerts::{AlertService, NewAlert},
};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use uuid::Uuid;

fn new_alert(category: &str, severity: &str, location: &str) -> NewAlert {
    NewAlert {
        category: category.into(),
        severity: severity.into(),
        title: format!("{severity} {category} at {location}"),
        description: "Reported by field team".into(),
        location: location.into(),
        affected_population: Some(5000),
    }
}

// =============================================================================
// Automatic response
// =============================================================================

#[tokio::test]
async fn test_low_and_medium_alerts_trigger_nothing() {
    let db = setup_db().await;
    let operator = create_operator(&db).await;
    let zone = create_zone(&db, "DT-01", "Downtown", "Downtown District", 1000, "safe", "low").await;
    let service = AlertService::new(db.clone());

    for severity in ["low", "medium"] {
        let created = service
            .create(&operator, new_alert("flood", severity, "Downtown"))
            .await
            .expect("create alert");
        assert!(created.response.is_empty());
    }

    assert_eq!(message::Entity::find().count(db.as_ref()).await.unwrap(), 0);
    assert_eq!(reload_zone(&db, zone.id).await.status, "safe");
}

#[tokio::test]
async fn test_high_alert_does_not_broadcast() {
    let db = setup_db().await;
    let operator = create_operator(&db).await;
    let zone = create_zone(&db, "DT-01", "Downtown", "Downtown District", 1000, "safe", "low").await;

    let created = AlertService::new(db.clone())
        .create(&operator, new_alert("flood", "high", "Downtown"))
        .await
        .expect("create alert");

    assert!(created.response.is_empty());
    assert_eq!(message::Entity::find().count(db.as_ref()).await.unwrap(), 0);
    assert_eq!(reload_zone(&db, zone.id).await.status, "safe");
}

#[tokio::test]
async fn test_critical_alert_broadcasts_once_on_emergency_channels() {
    let db = setup_db().await;
    let operator = create_operator(&db).await;
    let zone = create_zone(&db, "DT-01", "Downtown", "Downtown District", 1000, "safe", "low").await;

    let created = AlertService::new(db.clone())
        .create(&operator, new_alert("earthquake", "critical", "Downtown"))
        .await
        .expect("create alert");

    let messages = message::Entity::find().all(db.as_ref()).await.unwrap();
    assert_eq!(messages.len(), 1);
    let broadcast = &messages[0];
    assert_eq!(created.response.broadcast_message_id, Some(broadcast.id));
    assert_eq!(broadcast.kind, "emergency_alert");
    assert_eq!(broadcast.target_audience, "public");
    assert_eq!(broadcast.channels, "mobile radio tv");
    assert_eq!(broadcast.title, created.alert.title);
    assert_eq!(broadcast.sent_by, Some(operator.id));

    // Not a flood: zones stay as they are
    assert!(created.response.escalated_zones.is_empty());
    assert_eq!(reload_zone(&db, zone.id).await.status, "safe");
}

#[tokio::test]
async fn test_critical_downtown_flood_escalates_matching_safe_zones_only() {
    let db = setup_db().await;
    let operator = create_operator(&db).await;

    let district = create_zone(&db, "DT-01", "Downtown District", "Downtown District", 1200, "safe", "medium").await;
    let north = create_zone(&db, "DT-02", "North Downtown", "north DOWNTOWN", 800, "safe", "low").await;
    let riverside = create_zone(&db, "RS-01", "Riverside", "Riverside", 600, "safe", "low").await;
    let core = create_zone(&db, "DT-03", "Downtown Core", "Downtown Core", 3000, "evacuating", "high").await;

    let buses = create_resource(&db, "City buses", "vehicles", 10).await;
    let trucks = create_resource(&db, "Army trucks", "vehicles", 5).await;
    let boats = create_resource(&db, "Rescue boats", "vehicles", 3).await;
    let ambulance = create_resource(&db, "Ambulance", "vehicles", 1).await;
    let generators = create_resource(&db, "Generators", "equipment", 7).await;

    let created = AlertService::new(db.clone())
        .create(&operator, new_alert("flood", "critical", "Downtown"))
        .await
        .expect("create alert");

    let mut escalated = created.response.escalated_zones.clone();
    escalated.sort();
    assert_eq!(escalated, vec!["DT-01".to_string(), "DT-02".to_string()]);

    assert_eq!(reload_zone(&db, district.id).await.status, "warning");
    assert_eq!(reload_zone(&db, north.id).await.status, "warning");
    assert_eq!(reload_zone(&db, riverside.id).await.status, "safe");
    assert_eq!(reload_zone(&db, core.id).await.status, "evacuating");

    // Three vehicle resources per zone, at most two units each
    let allocations = resource_allocation::Entity::find().all(db.as_ref()).await.unwrap();
    assert_eq!(allocations.len(), 6);
    assert_eq!(created.response.allocations.len(), 6);
    for allocation in &allocations {
        assert_eq!(allocation.status, "approved");
        assert_eq!(allocation.priority, "high");
        assert!(allocation.quantity >= 1 && allocation.quantity <= 2);
        assert_ne!(allocation.resource_id, generators.id);
        assert!(
            allocation.destination == "Downtown District" || allocation.destination == "North Downtown"
        );
    }

    let mut remaining = 0;
    for vehicle in [&buses, &trucks, &boats, &ambulance] {
        let after = reload_resource(&db, vehicle.id).await;
        assert!(after.available_quantity >= 0);
        remaining += after.available_quantity;
    }
    // 19 units, 2+2+2 for the first zone, 2+2+1 for the second
    assert_eq!(remaining, 8);
    assert_eq!(reload_resource(&db, buses.id).await.available_quantity, 6);
    assert_eq!(reload_resource(&db, generators.id).await.available_quantity, 7);

    // Exactly one broadcast for the alert itself
    assert_eq!(message::Entity::find().count(db.as_ref()).await.unwrap(), 1);
}

#[tokio::test]
async fn test_critical_flood_without_vehicles_still_escalates() {
    let db = setup_db().await;
    let operator = create_operator(&db).await;
    let zone = create_zone(&db, "HB-01", "Harbor", "Harbor Front", 400, "safe", "low").await;

    let created = AlertService::new(db.clone())
        .create(&operator, new_alert("Flood", "critical", "harbor"))
        .await
        .expect("create alert");

    assert_eq!(created.response.escalated_zones, vec!["HB-01".to_string()]);
    assert!(created.response.allocations.is_empty());
    let zone = reload_zone(&db, zone.id).await;
    assert_eq!(zone.status().unwrap(), ZoneStatus::Warning);
}

#[tokio::test]
async fn test_create_and_response_are_audited() {
    let db = setup_db().await;
    let operator = create_operator(&db).await;
    create_zone(&db, "DT-01", "Downtown", "Downtown", 1000, "safe", "low").await;

    let created = AlertService::new(db.clone())
        .create(&operator, new_alert("flood", "critical", "Downtown"))
        .await
        .expect("create alert");

    let logs = system_log::Entity::find()
        .filter(system_log::Column::ResourceId.eq(created.alert.id.to_string()))
        .all(db.as_ref())
        .await
        .unwrap();
    let mut actions: Vec<_> = logs.iter().map(|l| l.action.as_str()).collect();
    actions.sort();
    assert_eq!(actions, vec!["automatic_response", "create_alert"]);
    assert!(logs.iter().all(|l| l.user_id == Some(operator.id)));
    assert!(logs.iter().all(|l| l.resource_type.as_deref() == Some("alert")));
}

#[tokio::test]
async fn test_invalid_severity_records_nothing() {
    let db = setup_db().await;
    let operator = create_operator(&db).await;

    let err = AlertService::new(db.clone())
        .create(&operator, new_alert("flood", "catastrophic", "Downtown"))
        .await
        .unwrap_err();

    assert!(matches!(err, OpsError::Validation(_)));
    assert_eq!(alert::Entity::find().count(db.as_ref()).await.unwrap(), 0);
    assert_eq!(system_log::Entity::find().count(db.as_ref()).await.unwrap(), 0);
}

// =============================================================================
// Listing and status
// =============================================================================

#[tokio::test]
async fn test_created_alert_is_listed_as_active() {
    let db = setup_db().await;
    let operator = create_operator(&db).await;
    let service = AlertService::new(db.clone());

    let created = service
        .create(&operator, new_alert("fire", "medium", "Old Town"))
        .await
        .expect("create alert");

    let active = service.list_active().await.expect("list");
    assert_eq!(active.len(), 1);
    let listed = &active[0];
    assert_eq!(listed.alert.id, created.alert.id);
    assert_eq!(listed.alert.title, "medium fire at Old Town");
    assert_eq!(listed.alert.severity, "medium");
    assert_eq!(listed.alert.location, "Old Town");
    assert_eq!(listed.alert.status, "active");
    assert_eq!(listed.alert.affected_population, 5000);
    assert_eq!(listed.created_by_name.as_deref(), Some("Dana Reyes"));
}

#[tokio::test]
async fn test_status_moves_forward_only() {
    let db = setup_db().await;
    let operator = create_operator(&db).await;
    let service = AlertService::new(db.clone());
    let created = service
        .create(&operator, new_alert("storm", "low", "Coast"))
        .await
        .expect("create alert");
    let id = created.alert.id;

    let monitoring = service
        .update_status(&operator, id, "monitoring")
        .await
        .expect("to monitoring");
    assert_eq!(monitoring.status, "monitoring");
    assert!(monitoring.resolved_at.is_none());

    let err = service.update_status(&operator, id, "active").await.unwrap_err();
    assert!(matches!(err, OpsError::Validation(_)));

    let resolved = service
        .update_status(&operator, id, "resolved")
        .await
        .expect("to resolved");
    assert_eq!(resolved.status, "resolved");
    assert!(resolved.resolved_at.is_some());

    // Resolved alerts drop out of the active listing
    assert!(service.list_active().await.unwrap().is_empty());

    let updates = system_log::Entity::find()
        .filter(system_log::Column::Action.eq("update_alert_status"))
        .count(db.as_ref())
        .await
        .unwrap();
    assert_eq!(updates, 2);
}

#[tokio::test]
async fn test_status_update_errors() {
    let db = setup_db().await;
    let operator = create_operator(&db).await;
    let service = AlertService::new(db.clone());

    let err = service
        .update_status(&operator, Uuid::new_v4(), "resolved")
        .await
        .unwrap_err();
    assert!(matches!(err, OpsError::NotFound(_)));

    let created = service
        .create(&operator, new_alert("storm", "low", "Coast"))
        .await
        .expect("create alert");
    let err = service
        .update_status(&operator, created.alert.id, "archived")
        .await
        .unwrap_err();
    assert!(matches!(err, OpsError::Validation(_)));
}
