//! Shared fixtures: in-memory SQLite with the full schema, seeded operators,
//! zones, resources and sensors.

#![allow(dead_code)]

use disaster_ops::{
    AppResources,
    assistant::AssistantClient,
    auth::{Operator, hash_password, issue_token},
    config::{AppConfig, AssistantConfig, SessionConfig},
    entity::{
        alert, evacuation_route, evacuation_zone, message, resource, resource_allocation, sensor,
        sensor_reading, system_log, user,
    },
};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ConnectionTrait, Database, DatabaseConnection, EntityTrait,
    Schema,
};
use std::sync::{Arc, OnceLock};
use time::OffsetDateTime;
use uuid::Uuid;

pub const TEST_SECRET: &str = "0123456789abcdef0123456789abcdef";
pub const TEST_PASSWORD: &str = "correct horse battery";

/// Fresh in-memory database with every table created from the entities.
pub async fn setup_db() -> Arc<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:").await.expect("connect");
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    // Parents before children so foreign keys resolve.
    let statements = [
        schema.create_table_from_entity(user::Entity),
        schema.create_table_from_entity(alert::Entity),
        schema.create_table_from_entity(evacuation_zone::Entity),
        schema.create_table_from_entity(evacuation_route::Entity),
        schema.create_table_from_entity(resource::Entity),
        schema.create_table_from_entity(resource_allocation::Entity),
        schema.create_table_from_entity(message::Entity),
        schema.create_table_from_entity(system_log::Entity),
        schema.create_table_from_entity(sensor::Entity),
        schema.create_table_from_entity(sensor_reading::Entity),
    ];
    for statement in statements {
        db.execute(backend.build(&statement))
            .await
            .expect("create table");
    }
    Arc::new(db)
}

pub fn session_config() -> SessionConfig {
    SessionConfig {
        secret: TEST_SECRET.into(),
        ttl_hours: 24,
        secure_cookie: false,
    }
}

pub fn test_config(assistant: AssistantConfig) -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".into(),
        bind_address: "127.0.0.1:0".into(),
        session: session_config(),
        assistant,
    }
}

pub fn test_resources(db: Arc<DatabaseConnection>, assistant: AssistantConfig) -> AppResources {
    let client = AssistantClient::new(assistant.clone()).expect("assistant client");
    AppResources {
        db,
        config: Arc::new(test_config(assistant)),
        assistant: Arc::new(client),
    }
}

/// Argon2 is slow in debug builds; hash the shared test password once.
fn test_password_hash() -> String {
    static HASH: OnceLock<String> = OnceLock::new();
    HASH.get_or_init(|| hash_password(TEST_PASSWORD).expect("hash"))
        .clone()
}

pub async fn create_user(db: &DatabaseConnection, email: &str, active: bool) -> user::Model {
    let now = OffsetDateTime::now_utc();
    user::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(email.to_string()),
        password_hash: Set(test_password_hash()),
        first_name: Set("Dana".into()),
        last_name: Set("Reyes".into()),
        role: Set("coordinator".into()),
        department: Set(Some("Operations".into())),
        phone: Set(None),
        is_active: Set(active),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("insert user")
}

/// An active operator backed by a real user row.
pub async fn create_operator(db: &DatabaseConnection) -> Operator {
    let email = format!("ops-{}@example.org", Uuid::new_v4().simple());
    let user = create_user(db, &email, true).await;
    Operator::from(&user)
}

/// A valid session token for `operator`.
pub async fn token_for(db: &DatabaseConnection, operator: &Operator) -> String {
    let user = user::Entity::find_by_id(operator.id)
        .one(db)
        .await
        .expect("query")
        .expect("user exists");
    issue_token(&user, &session_config()).expect("token")
}

pub async fn create_zone(
    db: &DatabaseConnection,
    code: &str,
    name: &str,
    location: &str,
    population: i32,
    status: &str,
    priority: &str,
) -> evacuation_zone::Model {
    let now = OffsetDateTime::now_utc();
    evacuation_zone::ActiveModel {
        id: Set(Uuid::new_v4()),
        zone_id: Set(code.to_string()),
        name: Set(name.to_string()),
        location: Set(location.to_string()),
        population: Set(population),
        evacuated: Set(0),
        status: Set(status.to_string()),
        priority: Set(priority.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("insert zone")
}

pub async fn create_route(db: &DatabaseConnection, code: &str, from_zone: &str) -> evacuation_route::Model {
    let now = OffsetDateTime::now_utc();
    evacuation_route::ActiveModel {
        id: Set(Uuid::new_v4()),
        route_id: Set(code.to_string()),
        name: Set(format!("Route {code}")),
        from_zone: Set(from_zone.to_string()),
        to_location: Set("Regional Stadium".into()),
        status: Set("open".into()),
        capacity: Set(500),
        current_usage: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("insert route")
}

pub async fn create_resource(
    db: &DatabaseConnection,
    name: &str,
    kind: &str,
    available: i32,
) -> resource::Model {
    let now = OffsetDateTime::now_utc();
    resource::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        kind: Set(kind.to_string()),
        total_quantity: Set(available),
        available_quantity: Set(available),
        unit: Set("units".into()),
        location: Set("Central Depot".into()),
        status: Set("available".into()),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("insert resource")
}

pub async fn create_sensor(
    db: &DatabaseConnection,
    code: &str,
    name: &str,
    status: Option<&str>,
) -> sensor::Model {
    sensor::ActiveModel {
        id: Set(Uuid::new_v4()),
        sensor_id: Set(code.to_string()),
        name: Set(name.to_string()),
        kind: Set("water_level".into()),
        location: Set("Riverside".into()),
        status: Set(status.map(str::to_string)),
        battery_level: Set(Some(80)),
        created_at: Set(OffsetDateTime::now_utc()),
    }
    .insert(db)
    .await
    .expect("insert sensor")
}

pub async fn create_reading(
    db: &DatabaseConnection,
    sensor_id: Uuid,
    value: f64,
    recorded_at: OffsetDateTime,
) -> sensor_reading::Model {
    sensor_reading::ActiveModel {
        id: Set(Uuid::new_v4()),
        sensor_id: Set(sensor_id),
        reading_type: Set("water_level".into()),
        value: Set(value),
        unit: Set("m".into()),
        status: Set("normal".into()),
        recorded_at: Set(recorded_at),
    }
    .insert(db)
    .await
    .expect("insert reading")
}

pub async fn reload_zone(db: &DatabaseConnection, id: Uuid) -> evacuation_zone::Model {
    evacuation_zone::Entity::find_by_id(id)
        .one(db)
        .await
        .expect("query")
        .expect("zone exists")
}

pub async fn reload_resource(db: &DatabaseConnection, id: Uuid) -> resource::Model {
    resource::Entity::find_by_id(id)
        .one(db)
        .await
        .expect("query")
        .expect("resource exists")
}
