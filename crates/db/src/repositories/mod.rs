//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod role_detail;
pub mod user;

pub use role_detail::DetailTable;
pub use user::UserRepository;
