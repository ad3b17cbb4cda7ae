//! Bounded-concurrency execution of independent async calls.

use std::{future::Future, num::NonZeroUsize};

use futures::{StreamExt, TryStreamExt, stream};

/// Run `worker` over `items` with at most `limit` futures in flight.
///
/// A new item starts as soon as any running one finishes. The output has one entry per
/// input, in input order, regardless of completion order.
pub async fn run_bounded<T, R, F, Fut>(limit: NonZeroUsize, items: Vec<T>, mut worker: F) -> Vec<R>
where
    F: FnMut(T) -> Fut,
    Fut: Future<Output = R>,
{
    let total = items.len();
    let mut slots: Vec<Option<R>> = std::iter::repeat_with(|| None).take(total).collect();

    let mut completed = std::pin::pin!(
        stream::iter(items.into_iter().enumerate().map(|(index, item)| {
            let fut = worker(item);
            async move { (index, fut.await) }
        }))
        .buffer_unordered(limit.get())
    );

    while let Some((index, result)) = completed.next().await {
        slots[index] = Some(result);
    }

    slots.into_iter().flatten().collect()
}

/// Like [`run_bounded`] for fallible workers: the first error aborts the batch.
///
/// Work still in flight when an error arrives is dropped. Callers that need to keep
/// partial results should catch errors inside the worker and use [`run_bounded`].
pub async fn try_run_bounded<T, R, E, F, Fut>(
    limit: NonZeroUsize,
    items: Vec<T>,
    mut worker: F,
) -> Result<Vec<R>, E>
where
    F: FnMut(T) -> Fut,
    Fut: Future<Output = Result<R, E>>,
{
    let total = items.len();
    let mut slots: Vec<Option<R>> = std::iter::repeat_with(|| None).take(total).collect();

    let mut completed = std::pin::pin!(
        stream::iter(items.into_iter().enumerate().map(|(index, item)| {
            let fut = worker(item);
            async move { fut.await.map(|value| (index, value)) }
        }))
        .buffer_unordered(limit.get())
    );

    while let Some((index, value)) = completed.try_next().await? {
        slots[index] = Some(value);
    }

    Ok(slots.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
        time::Duration,
    };

    use super::*;

    fn limit(value: usize) -> NonZeroUsize {
        NonZeroUsize::new(value).expect("non-zero limit")
    }

    #[tokio::test(start_paused = true)]
    async fn keeps_input_order_and_caps_in_flight() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let items: Vec<u64> = (0..10).collect();
        let results = run_bounded(limit(3), items, |item| {
            let in_flight = Arc::clone(&in_flight);
            let peak = Arc::clone(&peak);
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                // later items finish first
                tokio::time::sleep(Duration::from_millis(100 - item * 5)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                item * 2
            }
        })
        .await;

        assert_eq!(results, (0..10).map(|i| i * 2).collect::<Vec<_>>());
        assert_eq!(peak.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn large_limit_starts_everything_at_once() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let results = run_bounded(limit(16), vec![1, 2, 3, 4], |item| {
            let in_flight = Arc::clone(&in_flight);
            let peak = Arc::clone(&peak);
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                item
            }
        })
        .await;

        assert_eq!(results, vec![1, 2, 3, 4]);
        assert_eq!(peak.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn empty_input_yields_empty_output() {
        let results: Vec<u8> =
            run_bounded(limit(3), Vec::<u8>::new(), |item| async move { item }).await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn workers_mapping_errors_to_none_keep_partial_results() {
        let results = run_bounded(limit(3), vec![1, 2, 3, 4, 5], |item| async move {
            (item % 2 == 1).then_some(item)
        })
        .await;

        let kept: Vec<i32> = results.into_iter().flatten().collect();
        assert_eq!(kept, vec![1, 3, 5]);
    }

    #[tokio::test]
    async fn try_variant_collects_in_order() {
        let results: Result<Vec<u32>, String> =
            try_run_bounded(limit(2), vec![3, 1, 2], |item| async move { Ok(item + 10) }).await;
        assert_eq!(results, Ok(vec![13, 11, 12]));
    }

    #[tokio::test]
    async fn try_variant_fails_fast() {
        let results: Result<Vec<u32>, String> =
            try_run_bounded(limit(2), vec![1, 2, 3], |item| async move {
                if item == 2 {
                    Err(format!("item {item} failed"))
                } else {
                    Ok(item)
                }
            })
            .await;
        assert_eq!(results, Err("item 2 failed".to_string()));
    }
}
