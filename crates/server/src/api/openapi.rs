//! OpenAPI/Utoipa configuration.

use crate::api::{
    alerts::ALERTS_TAG, auth::AUTH_TAG, chat::CHAT_TAG, communication::COMMUNICATION_TAG,
    evacuation::EVACUATION_TAG, health::MISC_TAG, monitoring::MONITORING_TAG,
    resources::RESOURCES_TAG,
};
use crate::auth::SESSION_COOKIE;
use utoipa::{
    Modify, OpenApi,
    openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme},
};

/// Security addon for OpenAPI documentation.
pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "session",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    SESSION_COOKIE,
                    "HTTP-only session cookie set by `/api/auth/login`.",
                ))),
            );

            let bearer = HttpBuilder::new()
                .scheme(HttpAuthScheme::Bearer)
                .bearer_format("JWT")
                .description(Some(
                    "The session token from `/api/auth/login`, for clients that cannot keep cookies.",
                ))
                .build();
            components.add_security_scheme("bearer", SecurityScheme::Http(bearer));
        }
    }
}

/// OpenAPI documentation configuration.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Disaster Operations API",
        version = "1.0.0",
        description = "Operations-center backend: alerts with automatic response, evacuation zones, \
                       resource allocation, public broadcasts and sensor monitoring."
    ),
    tags(
        (name = MISC_TAG, description = "Miscellaneous endpoints"),
        (name = AUTH_TAG, description = "Operator accounts and sessions"),
        (name = ALERTS_TAG, description = "Incident alerts"),
        (name = EVACUATION_TAG, description = "Evacuation zones and routes"),
        (name = RESOURCES_TAG, description = "Inventory and allocations"),
        (name = COMMUNICATION_TAG, description = "Broadcast messages"),
        (name = MONITORING_TAG, description = "Sensors, dashboard and system health"),
        (name = CHAT_TAG, description = "Disaster-management assistant")
    )
)]
pub struct ApiDoc;
