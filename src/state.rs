//! Shared application state handed to every handler.

use std::sync::Arc;

use axum::extract::FromRef;

use crate::{config::Config, db::DbPool, storage::DocumentStore};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub documents: DocumentStore,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(pool: DbPool, config: Config) -> Self {
        Self {
            pool,
            documents: DocumentStore::new(&config.document_storage_path),
            config: Arc::new(config),
        }
    }
}

/// Lets handlers and middleware that only need the pool keep extracting
/// `State<DbPool>`.
impl FromRef<AppState> for DbPool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}
