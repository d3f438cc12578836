//! Business logic services.
//!
//! Services contain core business logic separated from HTTP handlers.
//! They handle database transactions, validation, and workflow rules.

pub mod alias_service;
pub mod document_service;
pub mod merchant_query;
pub mod merchant_service;
pub mod profile_service;
