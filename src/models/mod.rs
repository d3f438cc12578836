//! Data models representing database entities.
//!
//! This module contains all data structures that map to database tables,
//! together with the request and response bodies built on them.

/// Merchant license and uploaded document metadata
pub mod business_license;
/// Beneficial owners of a merchant business
pub mod business_owner;
/// Payment-collection alias records
pub mod checkout_counter;
/// Merchant contact persons
pub mod contact_person;
/// Digital Financial Service Providers
pub mod dfsp;
/// Physical and virtual merchant locations
pub mod location;
/// Merchant application and its workflow status
pub mod merchant;
/// Portal users (makers, checkers, hub operators)
pub mod portal_user;
