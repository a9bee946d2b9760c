pub mod categories;
pub mod questions;

#[cfg(test)]
pub(crate) mod test_pool {
    use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

    // A single connection that never expires, otherwise the in-memory database vanishes.
    pub async fn memory_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        crate::db::run_migrations(&pool).await.unwrap();
        pool
    }
}
