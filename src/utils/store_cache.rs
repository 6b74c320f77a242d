use crate::model::store::StoreLocation;
use anyhow::Result;
use futures_util::StreamExt;
use moka::future::Cache;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::time::Duration;

/// store_id => registered coordinates.
/// Store coordinates change rarely; the TTL bounds how long a moved store
/// keeps geofencing against its old position.
pub static STORE_CACHE: Lazy<Cache<u64, StoreLocation>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(10_000)
        .time_to_live(Duration::from_secs(3600)) // 1h TTL
        .build()
});

/// Cache a single store's coordinates
pub async fn remember(location: &StoreLocation) {
    STORE_CACHE.insert(location.id, *location).await;
}

/// Look up cached coordinates for a store
pub async fn cached(store_id: u64) -> Option<StoreLocation> {
    STORE_CACHE.get(&store_id).await
}

/// Batch insert store locations
async fn batch_remember(locations: &[StoreLocation]) {
    let futures: Vec<_> = locations
        .iter()
        .map(|loc| STORE_CACHE.insert(loc.id, *loc))
        .collect();

    // Await all insertions concurrently
    futures::future::join_all(futures).await;
}

/// Load every registered store into the in-memory cache (batched)
pub async fn warmup_store_cache(pool: &MySqlPool, batch_size: usize) -> Result<()> {
    let mut stream = sqlx::query_as::<_, StoreLocation>(
        r#"
        SELECT id, latitude, longitude
        FROM stores
        "#,
    )
    .fetch(pool);

    let mut batch = Vec::with_capacity(batch_size);
    let mut total_count = 0usize;

    while let Some(row) = stream.next().await {
        let location = row?;
        batch.push(location);
        total_count += 1;

        if batch.len() >= batch_size {
            batch_remember(&batch).await;
            batch.clear();
        }
    }

    // Insert any remaining stores
    if !batch.is_empty() {
        batch_remember(&batch).await;
    }

    log::info!("Store cache warmup complete: {} stores", total_count);

    Ok(())
}
