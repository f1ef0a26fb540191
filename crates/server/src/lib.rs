//! Backend for a disaster-response operations center.
//!
//! Operators record incident alerts, coordinate zone evacuations, allocate
//! emergency resources and broadcast public messages. Critical alerts trigger
//! an automatic response (public broadcast, zone escalation, transport
//! reservation) inside the same transaction that records them.

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::assistant::AssistantClient;
use crate::config::AppConfig;

pub mod api;
pub mod assistant;
pub mod audit;
pub mod auth;
pub mod config;
pub mod domain;
pub mod entity;
pub mod error;
pub mod services;

#[derive(Clone)]
pub struct AppResources {
    pub db: Arc<DatabaseConnection>,
    pub config: Arc<AppConfig>,
    pub assistant: Arc<AssistantClient>,
}

impl std::fmt::Debug for AppResources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppResources")
            .field("db", &self.db)
            .field("bind_address", &self.config.bind_address)
            .finish_non_exhaustive()
    }
}
