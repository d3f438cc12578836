//! HTTP request handlers (route handlers).
//!
//! Handlers extract the request, delegate to `services`, and map the result
//! onto a status code and JSON (or file) body. Authorization decisions live
//! in the services, not here.

/// DFSP directory
pub mod dfsps;
/// License document upload/download
pub mod documents;
pub mod health;
/// Merchant registration workflow
pub mod merchants;
/// Locations, contact persons, business owners, checkout counters
pub mod profile;
pub mod users;
