//! Application state shared by the API and the HTML interface.
//!
//! This module defines the context object every request handler receives.

use std::sync::Arc;

use crate::store::Database;

/// Shared application state.
///
/// Built once at start-up and handed to the routers; there are no
/// process-wide globals.
#[derive(Clone)]
pub struct AppState {
    /// The record store.
    db: Arc<Database>,
}

impl AppState {
    /// Creates a new application state around the given store.
    pub fn new(db: Database) -> Self {
        Self { db: Arc::new(db) }
    }

    /// Returns a reference to the store.
    pub fn db(&self) -> &Database {
        &self.db
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_state_is_clone() {
        // Verify AppState can be cloned (required for axum state)
        fn assert_clone<T: Clone>() {}
        assert_clone::<AppState>();
    }

    #[tokio::test]
    async fn test_clones_share_one_store() {
        let state = AppState::new(Database::open_in_memory().unwrap());
        let other = state.clone();

        other
            .db()
            .transaction(|tx| {
                let mut department = crate::models::Department {
                    name: "Accounting".to_string(),
                    ..Default::default()
                };
                tx.save_department(&mut department)
            })
            .await
            .unwrap();

        let count = state
            .db()
            .transaction(|tx| Ok(tx.departments()?.len()))
            .await
            .unwrap();
        assert_eq!(count, 1);
    }
}
