//! Companion web client. Holds the backend credential in an encrypted
//! cookie and proxies every business operation to the backend API.

pub mod client;
pub mod config;
pub mod cookies;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;
