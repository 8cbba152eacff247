//! Bounded concurrent fan-out with a join barrier.
//!
//! Every request is driven to completion before the caller sees any result,
//! and results come back in input order regardless of arrival order.

use std::future::Future;
use std::pin::Pin;

use futures::stream::{FuturesUnordered, StreamExt};
use log::debug;

use crate::error::Result;

/// Type alias for boxed futures used in parallel fetching
type IndexedFuture<T> = Pin<Box<dyn Future<Output = (usize, Result<T>)> + Send>>;

/// Run `fetch` for every input, at most `max_concurrent` at a time, and wait
/// for all of them to settle.
///
/// A failing request does not cancel the others. The returned vector holds
/// one result per input, in input order.
///
/// # Example
///
/// ```ignore
/// let reports = settle_all(
///     report_ids,
///     |rid| {
///         let c = client.clone();
///         let h = hash.clone();
///         async move { c.get_report(&h, &rid).await }
///     },
///     8,
/// )
/// .await;
/// ```
pub async fn settle_all<I, T, F, Fut>(
    inputs: Vec<I>,
    fetch: F,
    max_concurrent: usize,
) -> Vec<Result<T>>
where
    T: Send + 'static,
    F: Fn(I) -> Fut,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    if inputs.is_empty() {
        return Vec::new();
    }

    let total = inputs.len();
    let max_concurrent = max_concurrent.max(1);
    debug!(
        "Fetching {} items with max {} concurrent",
        total, max_concurrent
    );

    let mut slots: Vec<Option<Result<T>>> = (0..total).map(|_| None).collect();
    let mut futures: FuturesUnordered<IndexedFuture<T>> = FuturesUnordered::new();
    let mut pending = inputs.into_iter().enumerate();

    let make_future = |idx: usize, input: I| -> IndexedFuture<T> {
        let fut = fetch(input);
        Box::pin(async move { (idx, fut.await) })
    };

    for (idx, input) in pending.by_ref().take(max_concurrent) {
        futures.push(make_future(idx, input));
    }

    while let Some((idx, result)) = futures.next().await {
        if let Err(ref e) = result {
            debug!("Request {} failed: {}", idx, e);
        }
        slots[idx] = Some(result);

        if let Some((next_idx, input)) = pending.next() {
            futures.push(make_future(next_idx, input));
        }
    }

    debug!("All {} requests settled", total);
    slots.into_iter().flatten().collect()
}
