//! Identity management for the four marketplace roles.
//!
//! Every account lives in the shared account table and has exactly one
//! detail record in the store selected by its role. The service keeps
//! both records and the profile photo consistent across register, update
//! and delete.

mod error;
mod role;
mod service;
mod types;

pub use error::IdentityError;
pub use role::RoleKind;
pub use service::{IdentityRepository, IdentityService};
pub use types::{
    Account, AccountProfile, AccountSummary, DeleteOutcome, RegisterInput, RoleDetail,
    UpdateInput, UpdateOutcome,
};
