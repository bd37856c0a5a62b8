use chrono::NaiveDate;
use tracing::debug;

use super::cache::CacheStore;

/// Split of a candidate plan into what the cache has and what must be fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
    /// Candidates without a cached record, in the caller's order
    pub missing: Vec<NaiveDate>,
    /// Candidates already cached, in the caller's order
    pub cached: Vec<NaiveDate>,
}

impl Reconciled {
    pub fn is_empty(&self) -> bool {
        self.missing.is_empty() && self.cached.is_empty()
    }
}

/// `candidates - cached`, preserving the order of `candidates`.
///
/// An unavailable cache reconciles to "everything missing".
pub async fn reconcile(cache: &CacheStore, player_key: &str, candidates: &[NaiveDate]) -> Reconciled {
    let have = match (candidates.iter().min(), candidates.iter().max()) {
        // Contiguous plans use the range query, anything else the point query
        (Some(lo), Some(hi)) if is_contiguous(candidates, *lo, *hi) => {
            cache.dates_in_range(player_key, *lo, *hi).await
        }
        _ => cache.get(player_key, candidates).await,
    };

    let (cached, missing): (Vec<NaiveDate>, Vec<NaiveDate>) =
        candidates.iter().copied().partition(|d| have.contains(d));

    debug!(
        "Reconciled {}: {} candidates, {} cached, {} missing",
        player_key,
        candidates.len(),
        cached.len(),
        missing.len()
    );

    Reconciled { missing, cached }
}

fn is_contiguous(dates: &[NaiveDate], lo: NaiveDate, hi: NaiveDate) -> bool {
    (hi - lo).num_days() + 1 == dates.len() as i64
}
