//! Domain logic for the model-lifecycle orchestration service.
//!
//! Everything HTTP-agnostic lives here: the error taxonomy, artifact
//! naming conventions, trained-model metadata, CSV helpers, the
//! filesystem artifact store, and the worker invocation gateway.
//! The `modelhub-api` crate maps these onto the HTTP surface.

pub mod dataset;
pub mod error;
pub mod metadata;
pub mod naming;
pub mod store;
pub mod worker;
