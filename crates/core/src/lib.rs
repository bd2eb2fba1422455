//! Domain logic for the YaMDb review catalog.
//!
//! Everything here is pure: no database, no HTTP, no I/O. The `db` and `api`
//! crates build on these types and rules.

pub mod confirmation;
pub mod error;
pub mod pagination;
pub mod permissions;
pub mod rating;
pub mod roles;
pub mod signup;
pub mod types;
pub mod validation;
