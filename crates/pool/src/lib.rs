//! Worker Pool (C9): runs a list of jobs to completion, bounding
//! concurrency at `max_workers`, never preempting a running job, and
//! collecting every error regardless of where it happened.

use std::{future::Future, sync::Arc};

use tokio::{sync::Semaphore, task::JoinSet};

/// Run every job in `jobs` to completion, at most `max_workers` (clamped to
/// at least 1) running concurrently at any moment. Errors are collected in
/// completion order, not submission order — execution order is never
/// guaranteed, only that every job ran exactly once and the pool waited
/// for all of them.
pub async fn run_pool<F, Fut, E>(max_workers: usize, jobs: Vec<F>) -> Vec<E>
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), E>> + Send + 'static,
    E: Send + 'static,
{
    let max_workers = max_workers.max(1);
    let semaphore = Arc::new(Semaphore::new(max_workers));
    let mut join_set = JoinSet::new();

    for job in jobs {
        let semaphore = Arc::clone(&semaphore);
        join_set.spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .expect("pool semaphore is never closed");
            job().await
        });
    }

    let mut errors = Vec::new();
    while let Some(result) = join_set.join_next().await {
        match result {
            Ok(Ok(())) => {}
            Ok(Err(job_error)) => errors.push(job_error),
            Err(join_error) => {
                // A panicking job is not itself a job error in the caller's
                // error type, so it cannot be collected here; propagating
                // the panic matches the "don't preempt on one error, but
                // don't swallow it either" spirit of the pool's error handling.
                std::panic::resume_unwind(join_error.into_panic());
            }
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[tokio::test]
    async fn runs_every_job_exactly_once() {
        let counter = Arc::new(AtomicUsize::new(0));
        let jobs: Vec<_> = (0..20)
            .map(|_| {
                let counter = Arc::clone(&counter);
                move || {
                    let counter = Arc::clone(&counter);
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        Ok::<(), ()>(())
                    }
                }
            })
            .collect();

        let errors = run_pool(4, jobs).await;
        assert!(errors.is_empty());
        assert_eq!(counter.load(Ordering::SeqCst), 20);
    }

    #[tokio::test]
    async fn errors_are_collected_without_aborting_other_jobs() {
        let jobs: Vec<_> = (0..10)
            .map(|i| move || async move { if i % 3 == 0 { Err(i) } else { Ok(()) } })
            .collect();

        let mut errors = run_pool(3, jobs).await;
        errors.sort_unstable();
        assert_eq!(errors, vec![0, 3, 6, 9]);
    }

    #[tokio::test]
    async fn max_workers_zero_is_clamped_to_one() {
        let active = Arc::new(AtomicUsize::new(0));
        let max_active = Arc::new(AtomicUsize::new(0));

        let jobs: Vec<_> = (0..5)
            .map(|_| {
                let active = Arc::clone(&active);
                let max_active = Arc::clone(&max_active);
                move || {
                    let active = Arc::clone(&active);
                    let max_active = Arc::clone(&max_active);
                    async move {
                        let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                        max_active.fetch_max(now, Ordering::SeqCst);
                        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
                        active.fetch_sub(1, Ordering::SeqCst);
                        Ok::<(), ()>(())
                    }
                }
            })
            .collect();

        run_pool(0, jobs).await;
        assert_eq!(max_active.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn serial_case_runs_one_at_a_time() {
        let active = Arc::new(AtomicUsize::new(0));
        let max_active = Arc::new(AtomicUsize::new(0));

        let jobs: Vec<_> = (0..5)
            .map(|_| {
                let active = Arc::clone(&active);
                let max_active = Arc::clone(&max_active);
                move || {
                    let active = Arc::clone(&active);
                    let max_active = Arc::clone(&max_active);
                    async move {
                        let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                        max_active.fetch_max(now, Ordering::SeqCst);
                        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
                        active.fetch_sub(1, Ordering::SeqCst);
                        Ok::<(), ()>(())
                    }
                }
            })
            .collect();

        run_pool(1, jobs).await;
        assert_eq!(max_active.load(Ordering::SeqCst), 1);
    }
}
