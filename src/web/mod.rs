//! Server-rendered HTML interface.
//!
//! Browser-facing pages for listing, viewing, creating, editing and
//! deleting departments and employees, plus the birth date search form.
//! Forms post back to the page they were served from and redirect on
//! success.

mod handlers;
pub mod pages;

pub use handlers::create_router;
