// ABOUTME: Stats source backed by an sqlx SQLite connection pool.
// ABOUTME: Maps the counters sqlx exposes onto PoolStats.
use pw_core::{PoolStats, StatsGetter};
use sqlx::SqlitePool;

/// sqlx only tracks pool size and idle count; wait and churn counters read zero.
impl StatsGetter for SqlitePool {
    fn stats(&self) -> PoolStats {
        let open = u64::from(self.size());
        let idle = (self.num_idle() as u64).min(open);

        PoolStats {
            max_open_connections: u64::from(self.options().get_max_connections()),
            open_connections: open,
            in_use: open - idle,
            idle,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    #[tokio::test]
    async fn test_sqlite_pool_stats() {
        let pool = SqlitePoolOptions::new()
            .max_connections(3)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory sqlite should open");

        let stats = pool.stats();
        assert_eq!(stats.max_open_connections, 3);
        assert_eq!(stats.in_use + stats.idle, stats.open_connections);
        assert_eq!(stats.wait_count, 0);

        let conn = pool.acquire().await.unwrap();
        let busy = pool.stats();
        assert!(busy.in_use >= 1);
        drop(conn);

        pool.close().await;
    }
}
