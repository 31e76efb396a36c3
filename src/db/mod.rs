mod schema;
pub mod from_row;
pub mod queries;

pub use schema::init_db;

use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::gateway::PaymentGateway;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Application state: database pool, the injected gateway client, and the
/// URLs handlers derive callback/redirect targets from.
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    /// Gateway seam - production: Przelewy24, tests: recording mock.
    pub gateway: Arc<dyn PaymentGateway>,
    /// Public URL of this API (callback/webhook URLs).
    pub base_url: String,
    /// Public URL of the parish frontend (redirect targets).
    pub frontend_url: String,
}

pub fn create_pool(database_path: &str) -> Result<DbPool, r2d2::Error> {
    let manager = SqliteConnectionManager::file(database_path);
    Pool::builder().max_size(10).build(manager)
}
