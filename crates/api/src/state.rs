use std::sync::Arc;

use leasevault_core::cache::TtlCache;
use leasevault_notify::Mailer;
use leasevault_storage::ObjectStorage;

use crate::config::ServerConfig;
use crate::handlers::admin::VaultStats;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: leasevault_db::DbPool,
    /// Server configuration (accessed by middleware and handlers).
    pub config: Arc<ServerConfig>,
    /// Transactional email collaborator.
    pub mailer: Arc<dyn Mailer>,
    /// Object storage collaborator.
    pub storage: Arc<dyn ObjectStorage>,
    /// Cached admin vault stats, owned per server instance.
    pub stats_cache: Arc<TtlCache<&'static str, VaultStats>>,
}
