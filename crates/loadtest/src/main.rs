use goose::prelude::*;
use serde_json::json;
use std::env;

async fn health_check(user: &mut GooseUser) -> TransactionResult {
    let _goose_metrics = user.get("/healthz").await?;
    Ok(())
}

async fn list_alerts(user: &mut GooseUser) -> TransactionResult {
    let _goose_metrics = user.get("/api/alerts").await?;
    Ok(())
}

async fn realtime_snapshot(user: &mut GooseUser) -> TransactionResult {
    let _goose_metrics = user.get("/api/realtime").await?;
    Ok(())
}

async fn evacuation_overview(user: &mut GooseUser) -> TransactionResult {
    let _goose_metrics = user.get("/api/evacuation").await?;
    Ok(())
}

async fn resource_overview(user: &mut GooseUser) -> TransactionResult {
    let _goose_metrics = user.get("/api/resources").await?;
    Ok(())
}

/// Low-severity alerts only, so the load test never triggers the automatic
/// response.
async fn create_low_alert(user: &mut GooseUser) -> TransactionResult {
    let token = env::var("SESSION_TOKEN").unwrap_or_default();
    let payload = json!({
        "type": "loadtest",
        "severity": "low",
        "title": "Load test alert",
        "description": "Generated by the load test",
        "location": "Nowhere",
        "affectedPopulation": 0
    });
    let request_builder = user
        .get_request_builder(&GooseMethod::Post, "/api/alerts")?
        .bearer_auth(token)
        .json(&payload);
    let goose_request = GooseRequest::builder()
        .set_request_builder(request_builder)
        .build();
    let _goose_metrics = user.request(goose_request).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), GooseError> {
    let mut attack = GooseAttack::initialize()?
        .register_scenario(
            scenario!("HealthCheck").register_transaction(transaction!(health_check)),
        )
        .register_scenario(
            scenario!("Dashboard")
                .register_transaction(transaction!(list_alerts))
                .register_transaction(transaction!(realtime_snapshot))
                .register_transaction(transaction!(evacuation_overview))
                .register_transaction(transaction!(resource_overview)),
        );

    if env::var("SESSION_TOKEN").is_ok() {
        println!("SESSION_TOKEN set, including the alert creation scenario");
        attack = attack.register_scenario(
            scenario!("AlertIntake").register_transaction(transaction!(create_low_alert)),
        );
    } else {
        println!("No SESSION_TOKEN environment variable set, running read-only scenarios");
    }

    attack.execute().await?;

    Ok(())
}
