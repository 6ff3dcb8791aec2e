//! Typed operation surface for the agora engine.
//!
//! Transport-agnostic: every exposed operation is a method on
//! [`EngineService`] taking a serde request struct and returning a serde
//! response struct, so a GraphQL resolver, JSON-RPC handler, or test can
//! call them directly. Errors carry a [`kind`](error::ApiError::kind) so
//! transports can map the taxonomy (validation / state / conflict / not
//! found) mechanically.

pub mod error;
pub mod handlers;
pub mod service;

pub use error::{ApiError, ErrorKind};
pub use service::EngineService;
