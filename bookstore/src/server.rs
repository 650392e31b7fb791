use std::future::Future;
use std::sync::Arc;

use common_database::{get_pool, PostgresReader, PostgresWriter};
use common_redis::RedisClient;
use tokio::net::TcpListener;

use crate::books::book_operations::CachedBookModel;
use crate::books::book_store::PostgresBookStore;
use crate::config::Config;
use crate::router;

pub async fn serve<F>(config: Config, listener: TcpListener, shutdown: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    let redis_client = match RedisClient::new(config.redis_url.clone()).await {
        Ok(client) => Arc::new(client),
        Err(e) => {
            tracing::error!(
                "Failed to create Redis client for URL {}: {}",
                config.redis_url,
                e
            );
            return;
        }
    };

    let reader: PostgresReader = match get_pool(
        &config.read_database_url,
        config.max_pg_connections,
    )
    .await
    {
        Ok(pool) => Arc::new(pool),
        Err(e) => {
            tracing::error!("Failed to create read Postgres pool: {}", e);
            return;
        }
    };

    let writer: PostgresWriter = match get_pool(
        &config.write_database_url,
        config.max_pg_connections,
    )
    .await
    {
        Ok(pool) => Arc::new(pool),
        Err(e) => {
            tracing::error!("Failed to create write Postgres pool: {}", e);
            return;
        }
    };

    let store = Arc::new(PostgresBookStore::new(reader, writer));
    let book_model = Arc::new(CachedBookModel::new(
        store,
        redis_client,
        config.cache_ttl(),
    ));

    let app = router::router(book_model, config);

    tracing::info!("listening on {:?}", listener.local_addr().unwrap());
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .unwrap()
}
