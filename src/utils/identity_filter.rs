use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{anyhow, Result};
use autoscale_cuckoo_filter::CuckooFilter;
use futures::StreamExt;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;

/// Expected capacity and false-positive rate.
/// Sized for a large school plus staff, with headroom.
const FILTER_CAPACITY: usize = 50_000;
const FALSE_POSITIVE_RATE: f64 = 0.001;

static IDENTITY_FILTER: Lazy<RwLock<CuckooFilter<String>>> =
    Lazy::new(|| RwLock::new(CuckooFilter::new(FILTER_CAPACITY, FALSE_POSITIVE_RATE)));

/// Negatives are only trustworthy once the warmup has streamed every known
/// code in; before that the filter is empty and would reject every scan.
static WARMED: AtomicBool = AtomicBool::new(false);

#[inline]
fn normalize(code: &str) -> String {
    code.to_lowercase()
}

pub fn is_warmed() -> bool {
    WARMED.load(Ordering::Acquire)
}

/// Check if an identity code might exist (false positives possible).
pub fn might_exist(code: &str) -> bool {
    let code = normalize(code);
    IDENTITY_FILTER
        .read()
        .expect("identity filter poisoned")
        .contains(&code)
}

/// Insert a single prefixed identity code into the filter.
pub fn insert(code: &str) {
    let code = normalize(code);
    IDENTITY_FILTER
        .write()
        .expect("identity filter poisoned")
        .add(&code);
}

/// Remove an identity code from the filter.
pub fn remove(code: &str) {
    let code = normalize(code);
    IDENTITY_FILTER
        .write()
        .expect("identity filter poisoned")
        .remove(&code);
}

/// Warm up the filter from both populations using streaming + batching.
/// Codes are stored prefixed the way QR payloads carry them.
pub async fn warmup_identity_filter(pool: &MySqlPool, batch_size: usize) -> Result<()> {
    let mut total = 0usize;

    for sql in [
        "SELECT CONCAT('s', LOWER(student_no)) FROM students",
        "SELECT CONCAT('p', LOWER(code)) FROM employees",
    ] {
        let mut stream = sqlx::query_as::<_, (String,)>(sql).fetch(pool);
        let mut batch = Vec::with_capacity(batch_size);

        while let Some(row) = stream.next().await {
            let (code,) = row.map_err(|e| anyhow!("DB row fetch failed: {}", e))?;
            batch.push(code);
            total += 1;

            if batch.len() == batch_size {
                insert_batch(&batch);
                batch.clear();
            }
        }

        if !batch.is_empty() {
            insert_batch(&batch);
        }
    }

    WARMED.store(true, Ordering::Release);
    log::info!("Identity filter warmup complete: {} codes", total);
    Ok(())
}

fn insert_batch(codes: &[String]) {
    let mut filter = IDENTITY_FILTER.write().expect("identity filter poisoned");

    for code in codes {
        filter.add(code);
    }
}
