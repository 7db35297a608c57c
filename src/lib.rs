//! Department and employee management.
//!
//! This crate keeps a registry of departments and the employees working in
//! them, validates every change against the record rules, and serves it
//! both as HTML pages and as a JSON API.

#![warn(missing_docs)]

use axum::Router;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod store;
pub mod web;

pub use api::AppState;

/// Builds the full application: the JSON API under `/api` and the HTML
/// pages everywhere else.
pub fn create_app(state: AppState) -> Router {
    api::create_router(state.clone()).merge(web::create_router(state))
}
