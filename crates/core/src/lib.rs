//! Core business logic for Custodian.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and the repository port live here.
//!
//! # Modules
//!
//! - `custody` - Custody accumulation, queries and period closing

pub mod custody;
