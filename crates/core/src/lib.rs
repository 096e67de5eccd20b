//! Core identity logic for Agrichain.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Persistence is reached through the [`identity::IdentityRepository`] trait,
//! which the db crate implements.
//!
//! # Modules
//!
//! - `auth` - Password hashing and verification
//! - `identity` - Accounts, role details, and the operations that keep them consistent
//! - `storage` - Profile photo files

pub mod auth;
pub mod identity;
pub mod storage;
