//! Paged fan-out for the dataset API list endpoints.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::task::JoinSet;

use super::UpstreamError;
use crate::models::Page;

/// Fetch every item of a paged endpoint.
///
/// The first page is fetched alone to learn `total_count`. At most `max_workers` tasks then
/// claim the remaining offsets from a shared cursor, so the task count never depends on what
/// the upstream reports. Items come back in offset order. The first failure aborts the
/// outstanding pages.
pub(crate) async fn fetch_in_batches<T, F, Fut>(
    service: &'static str,
    batch_size: usize,
    max_workers: usize,
    fetch: F,
) -> Result<Vec<T>, UpstreamError>
where
    T: Send + 'static,
    F: Fn(usize, usize) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Page<T>, UpstreamError>> + Send + 'static,
{
    let batch_size = batch_size.max(1);

    let first = fetch(0, batch_size).await?;
    let total = first.total_count;
    let mut pages = vec![(0, first.items)];

    let remaining = total.saturating_sub(batch_size).div_ceil(batch_size);
    let workers = max_workers.max(1).min(remaining);

    let fetch = Arc::new(fetch);
    let cursor = Arc::new(AtomicUsize::new(batch_size));
    let mut tasks = JoinSet::new();

    for _ in 0..workers {
        let fetch = Arc::clone(&fetch);
        let cursor = Arc::clone(&cursor);
        tasks.spawn(async move {
            let mut fetched = Vec::new();
            loop {
                let offset = cursor.fetch_add(batch_size, Ordering::SeqCst);
                if offset >= total {
                    break;
                }
                let page = (fetch.as_ref())(offset, batch_size).await?;
                fetched.push((offset, page.items));
            }
            Ok::<_, UpstreamError>(fetched)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        let fetched = joined.map_err(|e| UpstreamError::Batch {
            service,
            message: e.to_string(),
        })??;
        pages.extend(fetched);
    }

    pages.sort_by_key(|(offset, _)| *offset);
    Ok(pages.into_iter().flat_map(|(_, items)| items).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use std::time::Duration;

    fn page_of(offset: usize, limit: usize, total: usize) -> Page<usize> {
        let items: Vec<usize> = (offset..(offset + limit).min(total)).collect();
        Page {
            count: items.len(),
            items,
            offset,
            limit,
            total_count: total,
        }
    }

    #[tokio::test]
    async fn test_fetches_all_pages_in_order() {
        let items = fetch_in_batches("test", 3, 2, |offset, limit| async move {
            // Later pages answer first to prove reassembly is by offset.
            tokio::time::sleep(Duration::from_millis(20u64.saturating_sub(offset as u64))).await;
            Ok(page_of(offset, limit, 10))
        })
        .await
        .unwrap();

        assert_eq!(items, (0..10).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_single_page_makes_one_call() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let items = fetch_in_batches("test", 100, 4, move |offset, limit| {
            counter.fetch_add(1, Ordering::SeqCst);
            async move { Ok(page_of(offset, limit, 5)) }
        })
        .await
        .unwrap();

        assert_eq!(items.len(), 5);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_page_failure_aborts() {
        let result = fetch_in_batches("test", 2, 2, |offset, limit| async move {
            if offset == 4 {
                return Err(UpstreamError::Status {
                    service: "test",
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    url: "http://localhost/datasets".to_string(),
                });
            }
            Ok(page_of(offset, limit, 8))
        })
        .await;

        let err = result.unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
    }

    #[tokio::test]
    async fn test_zero_batch_size_is_clamped() {
        let items = fetch_in_batches("test", 0, 0, |offset, limit| async move {
            Ok(page_of(offset, limit, 3))
        })
        .await
        .unwrap();

        assert_eq!(items, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_in_flight_pages_bounded_by_workers() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let calls = Arc::new(AtomicUsize::new(0));
        let (in_flight_c, peak_c, calls_c) =
            (Arc::clone(&in_flight), Arc::clone(&peak), Arc::clone(&calls));

        let items = fetch_in_batches("test", 1, 3, move |offset, limit| {
            let in_flight = Arc::clone(&in_flight_c);
            let peak = Arc::clone(&peak_c);
            calls_c.fetch_add(1, Ordering::SeqCst);
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(2)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                Ok(page_of(offset, limit, 40))
            }
        })
        .await
        .unwrap();

        assert_eq!(items, (0..40).collect::<Vec<_>>());
        assert_eq!(calls.load(Ordering::SeqCst), 40);
        assert!(peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn test_huge_total_count_stops_at_first_failure() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let result = fetch_in_batches("test", 10, 2, move |offset, limit| {
            counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if offset >= 30 {
                    return Err(UpstreamError::Status {
                        service: "test",
                        status: StatusCode::BAD_GATEWAY,
                        url: "http://localhost/datasets".to_string(),
                    });
                }
                Ok(page_of(offset, limit, usize::MAX / 2))
            }
        })
        .await;

        assert!(result.is_err());
        // One failing page per worker at most, not one task per reported page
        assert!(calls.load(Ordering::SeqCst) <= 1 + 2 + 2);
    }
}
