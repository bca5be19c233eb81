//! Repository implementations for data access.
//!
//! Repositories implement the persistence ports of the core crate,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod custody;

pub use custody::PgCustodyRepository;
