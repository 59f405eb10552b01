//! HTTP server for PragmaDB.
//!
//! Exposes collections and their documents over a small REST API. Each
//! request is turned into a command for the collection's storage engine and
//! answered once the engine has processed it.

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;

pub use config::ServerConfig;
pub use error::{ErrorBody, ServerError, ServerResult};
pub use handler::AppState;
pub use server::{PragmaServer, DEMO_COLLECTION};
