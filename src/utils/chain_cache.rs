use anyhow::Result;
use moka::future::Cache;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::sync::Arc;
use std::time::Duration;

use crate::service::hierarchy::OrgChart;

/// user id -> resolved upward management chain (nearest manager first).
///
/// Read paths (can_view checks) may serve from here; the cycle check on
/// manager reassignment must NOT — it always recomputes from a fresh
/// snapshot, and any reassignment drops the whole cache.
static CHAIN_CACHE: Lazy<Cache<u64, Arc<Vec<u64>>>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(100_000)
        .time_to_live(Duration::from_secs(3600)) // 1h TTL
        .build()
});

/// Resolve a user's ancestor chain, caching the result.
pub async fn management_chain(pool: &MySqlPool, user_id: u64) -> Result<Arc<Vec<u64>>> {
    if let Some(chain) = CHAIN_CACHE.get(&user_id).await {
        return Ok(chain);
    }

    let chart = OrgChart::load(pool).await?;
    let chain = Arc::new(chart.management_chain(user_id)?);

    CHAIN_CACHE.insert(user_id, chain.clone()).await;
    Ok(chain)
}

/// A single reassignment can change the chain of every descendant, so there
/// is no per-key invalidation worth doing.
pub fn invalidate_all() {
    CHAIN_CACHE.invalidate_all();
}

/// Pre-resolve every user's chain from one snapshot (batched inserts)
pub async fn warmup_chain_cache(pool: &MySqlPool, batch_size: usize) -> Result<()> {
    let chart = OrgChart::load(pool).await?;

    let mut batch = Vec::with_capacity(batch_size);
    let mut total = 0usize;

    for &user_id in chart.user_ids() {
        match chart.management_chain(user_id) {
            Ok(chain) => {
                batch.push((user_id, Arc::new(chain)));
                total += 1;
            }
            Err(e) => {
                // Warmup tolerates corrupt rows; writes are where we refuse.
                log::warn!("skipping chain warmup for user {}: {}", user_id, e);
            }
        }

        if batch.len() >= batch_size {
            insert_batch(&mut batch).await;
        }
    }

    if !batch.is_empty() {
        insert_batch(&mut batch).await;
    }

    log::info!("Management chain cache warmup complete: {} users", total);

    Ok(())
}

async fn insert_batch(batch: &mut Vec<(u64, Arc<Vec<u64>>)>) {
    let inserts: Vec<_> = batch
        .drain(..)
        .map(|(user_id, chain)| CHAIN_CACHE.insert(user_id, chain))
        .collect();

    futures::future::join_all(inserts).await;
}
