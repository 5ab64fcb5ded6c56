use super::*;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

fn offline_provider() -> PlaywrightProvider {
    PlaywrightProvider::new(PlaywrightBridgeConfig {
        node_path: Some(PathBuf::from("/nonexistent/bin/node")),
        ..Default::default()
    })
}

#[tokio::test]
async fn test_launch_without_node_is_launch_failure() {
    let provider = offline_provider();
    let err = provider
        .launch(EngineKind::Chromium, &LaunchOptions::default())
        .await
        .unwrap_err();
    match err {
        ProviderError::LaunchFailed(message) => assert!(message.contains("Node.js")),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!provider.bridge().is_running().await);
}

#[tokio::test]
async fn test_page_calls_without_node_report_bridge_error() {
    let provider = offline_provider();
    let err = provider
        .wait_for_selector(&PageHandle::new("page_1"), "#a", 100)
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Bridge(_)));
    assert!(!err.is_transient());
}

#[tokio::test]
async fn test_page_closed_event_fires_listeners_once() {
    let provider = offline_provider();
    let fired = Arc::new(AtomicUsize::new(0));
    let counter = fired.clone();
    provider
        .on_page_closed(
            &PageHandle::new("page_4"),
            Arc::new(move |page: PageHandle| {
                assert_eq!(page.as_str(), "page_4");
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        )
        .await
        .unwrap();

    let handler = page_closed_handler(provider.listeners.clone());
    handler(BridgeEvent::PageClosed {
        page_id: "page_5".to_string(),
    });
    assert_eq!(fired.load(Ordering::SeqCst), 0);

    handler(BridgeEvent::PageClosed {
        page_id: "page_4".to_string(),
    });
    handler(BridgeEvent::PageClosed {
        page_id: "page_4".to_string(),
    });
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_wait_sleeps_locally() {
    let provider = offline_provider();
    let started = std::time::Instant::now();
    provider.wait(Duration::from_millis(20)).await.unwrap();
    assert!(started.elapsed() >= Duration::from_millis(20));
}

#[test]
fn test_navigation_errors_are_normalized() {
    let err = as_navigation_error(ProviderError::Timeout("30000ms".to_string()));
    assert!(matches!(err, ProviderError::NavigationFailed(m) if m.contains("30000ms")));

    let err = as_navigation_error(ProviderError::PageNotFound("page_1".to_string()));
    assert!(matches!(err, ProviderError::PageNotFound(_)));
}

#[test]
fn test_decode_reports_method() {
    let err = decode::<Vec<PageHandle>>("listPages", json!("oops")).unwrap_err();
    assert!(err.to_string().contains("listPages"));

    let pages: Vec<PageHandle> = decode("listPages", json!(["page_1", "page_2"])).unwrap();
    assert_eq!(pages, vec![PageHandle::new("page_1"), PageHandle::new("page_2")]);
}

#[test]
fn test_provider_name() {
    assert_eq!(offline_provider().name(), "playwright");
}
