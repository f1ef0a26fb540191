//! SeaORM entities, one module per table.

pub mod alert;
pub mod evacuation_route;
pub mod evacuation_zone;
pub mod message;
pub mod resource;
pub mod resource_allocation;
pub mod sensor;
pub mod sensor_reading;
pub mod system_log;
pub mod user;
