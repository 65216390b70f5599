//! # HTTP Server Module
//!
//! Axum server exposing record file operations.
//!
//! # Endpoints
//!
//! - `GET /health` - Health check
//! - `POST /tables/:table/:id/StorageToken` - Issue an access token
//! - `GET /tables/:table/:id/MobileServiceFiles` - List the files of a record
//! - `DELETE /tables/:table/:id/MobileServiceFiles/:name` - Delete one file
//!
//! Each path is also served in all-lowercase form.

pub mod config;
pub mod server;
pub mod storage_routes;

pub use config::HttpServerConfig;
pub use server::HttpServer;
pub use storage_routes::{storage_routes, ErrorResponse, StorageState};
