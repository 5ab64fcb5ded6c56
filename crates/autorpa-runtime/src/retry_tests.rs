use super::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

fn timeout_error(selector: &str) -> ProviderError {
    ProviderError::SelectorTimeout {
        selector: selector.to_string(),
        timeout_ms: 10,
    }
}

#[tokio::test]
async fn test_succeeds_first_attempt() {
    let policy = RetryPolicy::new(2, 0, 10);
    let cancel = CancellationToken::new();

    let (value, attempts) = policy
        .run("#a", &cancel, |_| async { Ok::<_, ProviderError>(7) })
        .await
        .unwrap();

    assert_eq!(value, 7);
    assert_eq!(attempts, 1);
}

#[tokio::test]
async fn test_succeeds_on_kth_attempt() {
    let policy = RetryPolicy::new(3, 1, 10);
    let cancel = CancellationToken::new();
    let calls = Arc::new(AtomicU32::new(0));

    let counter = calls.clone();
    let (_, attempts) = policy
        .run("#late", &cancel, move |attempt| {
            counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt < 3 {
                    Err(timeout_error("#late"))
                } else {
                    Ok(())
                }
            }
        })
        .await
        .unwrap();

    assert_eq!(attempts, 3);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_exhaustion_reports_retry_count() {
    let policy = RetryPolicy::new(2, 1, 10);
    let cancel = CancellationToken::new();
    let calls = Arc::new(AtomicU32::new(0));

    let counter = calls.clone();
    let err = policy
        .run("#never", &cancel, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(timeout_error("#never")) }
        })
        .await
        .unwrap_err();

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    match &err {
        StepError::RetriesExhausted {
            attempts,
            retry_count,
            ..
        } => {
            assert_eq!(*attempts, 3);
            assert_eq!(*retry_count, 2);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.to_string().contains("retryCount=2"));
}

#[tokio::test]
async fn test_non_transient_error_is_not_retried() {
    let policy = RetryPolicy::new(5, 1, 10);
    let cancel = CancellationToken::new();
    let calls = Arc::new(AtomicU32::new(0));

    let counter = calls.clone();
    let err = policy
        .run("#x", &cancel, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(ProviderError::PageNotFound("P1".to_string())) }
        })
        .await
        .unwrap_err();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(matches!(err, StepError::Provider(ProviderError::PageNotFound(_))));
}

#[tokio::test]
async fn test_zero_retries_makes_one_attempt() {
    let policy = RetryPolicy::once(10);
    let cancel = CancellationToken::new();

    let err = policy
        .run("#y", &cancel, |_| async { Err::<(), _>(timeout_error("#y")) })
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        StepError::RetriesExhausted {
            attempts: 1,
            retry_count: 0,
            ..
        }
    ));
}

#[tokio::test(start_paused = true)]
async fn test_cancel_interrupts_retry_sleep() {
    let policy = RetryPolicy::new(3, 60_000, 10);
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let err = policy
        .run("#z", &cancel, |_| async { Err::<(), _>(timeout_error("#z")) })
        .await
        .unwrap_err();

    assert!(matches!(err, StepError::Cancelled));
}

#[tokio::test]
async fn test_already_cancelled_makes_no_attempt() {
    let policy = RetryPolicy::default();
    let cancel = CancellationToken::new();
    cancel.cancel();
    let calls = Arc::new(AtomicU32::new(0));

    let counter = calls.clone();
    let err = policy
        .run("#a", &cancel, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, ProviderError>(()) }
        })
        .await
        .unwrap_err();

    assert!(matches!(err, StepError::Cancelled));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_max_attempts() {
    assert_eq!(RetryPolicy::default().max_attempts(), 3);
    assert_eq!(RetryPolicy::once(5).max_attempts(), 1);
    assert_eq!(RetryPolicy::new(u32::MAX, 0, 0).max_attempts(), u32::MAX);
}
