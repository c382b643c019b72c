//! Process-wide database connection pool
//!
//! `init` connects once; later calls hand back the same pool. `teardown`
//! closes it and allows a fresh `init` afterwards.

use parking_lot::Mutex;
use sea_orm::{Database, DatabaseConnection, DbErr};
use std::future::Future;
use std::sync::Arc;

lazy_static::lazy_static! {
    static ref POOL: tokio::sync::Mutex<Option<Arc<DatabaseConnection>>> = tokio::sync::Mutex::new(None);
    static ref INIT_COUNT: Mutex<u32> = Mutex::new(0);
}

/// Connect if no pool exists yet, otherwise return the existing one
pub async fn init(database_url: &str) -> Result<Arc<DatabaseConnection>, DbErr> {
    init_with(|| Database::connect(database_url)).await
}

pub async fn init_with<F, Fut>(connect: F) -> Result<Arc<DatabaseConnection>, DbErr>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<DatabaseConnection, DbErr>>,
{
    // Held across the connect so concurrent callers wait instead of racing
    let mut pool = POOL.lock().await;

    if let Some(db) = pool.as_ref() {
        tracing::debug!("Database pool already initialized, reusing it");
        return Ok(Arc::clone(db));
    }

    tracing::info!("Connecting to database...");
    let db = Arc::new(connect().await?);
    *pool = Some(Arc::clone(&db));
    *INIT_COUNT.lock() += 1;

    Ok(db)
}

/// Current pool, if initialized
pub async fn handle() -> Option<Arc<DatabaseConnection>> {
    POOL.lock().await.clone()
}

/// Close the pool. No-op when it was never initialized. If handles are
/// still held elsewhere the pool closes when the last one drops.
pub async fn teardown() -> Result<(), DbErr> {
    let Some(db) = POOL.lock().await.take() else {
        return Ok(());
    };

    match Arc::try_unwrap(db) {
        Ok(db) => {
            tracing::info!("Closing database pool");
            db.close().await
        }
        Err(_) => {
            tracing::warn!("Database pool still in use, it will close when the last handle drops");
            Ok(())
        }
    }
}

/// Number of pools opened by this process
pub fn init_count() -> u32 {
    *INIT_COUNT.lock()
}
