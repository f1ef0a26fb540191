//! Operations over the store. Each service owns a shared connection and
//! wraps every multi-step mutation in a single transaction.

pub mod accounts;
pub mod alerts;
pub mod communication;
pub mod evacuation;
pub mod realtime;
pub mod resources;
pub mod response;
pub mod sensors;
