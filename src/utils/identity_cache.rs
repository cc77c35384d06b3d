use anyhow::Result;
use futures_util::StreamExt;
use moka::future::Cache;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::time::Duration;

use crate::model::person::{Employee, ScanTarget, Student};

/// Identity code -> scan target, for the scan hot path. Entries are
/// invalidated whenever the administrative CRUD touches the person.
pub static IDENTITY_CACHE: Lazy<Cache<String, ScanTarget>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(50_000)
        .time_to_live(Duration::from_secs(3600)) // 1h TTL
        .build()
});

pub async fn get(code: &str) -> Option<ScanTarget> {
    IDENTITY_CACHE.get(&code.to_lowercase()).await
}

pub async fn insert(target: ScanTarget) {
    IDENTITY_CACHE.insert(target.identity_code(), target).await;
}

pub async fn invalidate(code: &str) {
    IDENTITY_CACHE.invalidate(&code.to_lowercase()).await;
}

/// Batch insert targets concurrently.
async fn batch_insert(targets: Vec<ScanTarget>) {
    let futures: Vec<_> = targets
        .into_iter()
        .map(|t| IDENTITY_CACHE.insert(t.identity_code(), t))
        .collect();

    futures::future::join_all(futures).await;
}

/// Preload every scan target so the first scan of the day skips the DB.
pub async fn warmup_identity_cache(pool: &MySqlPool, batch_size: usize) -> Result<()> {
    let mut total = 0usize;

    let mut students = sqlx::query_as::<_, Student>(
        "SELECT id, student_no, name, class_id, guardian_phone FROM students",
    )
    .fetch(pool);

    let mut batch = Vec::with_capacity(batch_size);
    while let Some(row) = students.next().await {
        batch.push(ScanTarget::Student(row?));
        total += 1;
        if batch.len() == batch_size {
            batch_insert(std::mem::take(&mut batch)).await;
        }
    }
    if !batch.is_empty() {
        batch_insert(std::mem::take(&mut batch)).await;
    }

    let mut employees = sqlx::query_as::<_, Employee>(
        "SELECT id, code, name, role, default_shift FROM employees",
    )
    .fetch(pool);

    let mut batch = Vec::with_capacity(batch_size);
    while let Some(row) = employees.next().await {
        batch.push(ScanTarget::Employee(row?));
        total += 1;
        if batch.len() == batch_size {
            batch_insert(std::mem::take(&mut batch)).await;
        }
    }
    if !batch.is_empty() {
        batch_insert(std::mem::take(&mut batch)).await;
    }

    log::info!("Identity cache warmup complete: {} persons", total);
    Ok(())
}
