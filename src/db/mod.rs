pub mod users;

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::time::Duration;

pub type DbPool = SqlitePool;

/// Inizializza il database SQLite
pub async fn init_db(database_url: &str) -> Result<DbPool, sqlx::Error> {
    // Crea il pool di connessioni
    let pool = SqlitePoolOptions::new()
        .max_connections(20)
        .idle_timeout(Duration::from_secs(60))
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await?;

    // Esegui le migrazioni
    run_migrations(&pool).await?;

    Ok(pool)
}

/// Esegue le migrazioni del database
async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::Error> {
    // Crea tabella utenti (una riga per identity, mai eliminata)
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            identity TEXT PRIMARY KEY,
            tier TEXT NOT NULL DEFAULT 'FREE',
            requests_made INTEGER NOT NULL DEFAULT 0,
            last_request_at TEXT,
            premium_expires_at TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Pool SQLite in memoria per i test (una sola connessione, il database
/// in-memory è per-connessione)
#[cfg(test)]
pub async fn memory_pool() -> DbPool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("connessione sqlite in memoria");
    run_migrations(&pool).await.expect("migrazioni di test");
    pool
}
