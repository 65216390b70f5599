//! recordfiles
//!
//! Scoped, time-limited access tokens for files attached to table records,
//! plus listing and deletion of those files.

pub mod cli;
pub mod file_storage;
pub mod http_server;
pub mod observability;
