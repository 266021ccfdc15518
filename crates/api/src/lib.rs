//! HTTP surface of the model-lifecycle orchestration service.
//!
//! Exposes the building blocks (config, state, error mapping, router,
//! routes) so integration tests and the binary entrypoint can both
//! access them.

pub mod config;
pub mod error;
pub mod handlers;
pub mod router;
pub mod routes;
pub mod state;
