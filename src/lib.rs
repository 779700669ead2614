pub mod api;
pub mod cli;
pub mod config;
pub mod entity;
pub mod error;
pub mod search;
pub mod stats;
pub mod storage;

pub use api::CaseServer;
pub use config::ServerConfig;
pub use error::{CaseError, Result};
pub use storage::CaseStore;
