//! Persistence for departments and employees.
//!
//! The [`Database`] owns both tables, assigns identifiers, joins employees
//! onto their department when loading, enforces the name, not-null and
//! foreign key constraints, and scopes every unit of work in a transaction
//! that either commits as a whole or not at all.

mod database;
mod seed;

pub use database::{Database, Transaction};
