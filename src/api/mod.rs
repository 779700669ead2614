//! # Case HTTP API
//!
//! Axum server exposing the case store as JSON.
//!
//! # Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /{base}/cases` - List cases (optional filter and sort parameters)
//! - `GET /{base}/cases/stats` - Counts by status and priority
//! - `GET /{base}/cases/{id}` - Fetch one case
//! - `POST /{base}/cases` - Create a case
//! - `PUT /{base}/cases/{id}` - Merge fields into a case
//! - `DELETE /{base}/cases/{id}` - Delete a case
//!
//! Every response body is an envelope: `{success, data}`, `{success, message}`
//! or `{success: false, error}`.

pub mod envelope;
pub mod routes;
pub mod server;

pub use envelope::{ApiError, DataEnvelope, ErrorEnvelope, MessageEnvelope, GENERIC_ERROR};
pub use routes::{AppState, ListParams, DELETED_MESSAGE};
pub use server::CaseServer;
