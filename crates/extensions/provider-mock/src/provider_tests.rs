use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;

async fn open(provider: &MockProvider) -> (BrowserHandle, ContextHandle, PageHandle) {
    let browser = provider
        .launch(EngineKind::Chromium, &LaunchOptions::default())
        .await
        .unwrap();
    let context = provider
        .new_context(&browser, &ContextOptions::default())
        .await
        .unwrap();
    let page = provider.new_page(&context).await.unwrap();
    (browser, context, page)
}

#[tokio::test]
async fn test_default_text_is_derived_from_selector() {
    let provider = MockProvider::new();
    let (_, _, page) = open(&provider).await;
    let text = provider.text_content(&page, "h1").await.unwrap();
    assert_eq!(text.as_deref(), Some("mocked h1 text"));
}

#[tokio::test]
async fn test_scripted_text() {
    let provider = MockProvider::new().with_text("h1", "Welcome");
    let (_, _, page) = open(&provider).await;
    let text = provider.text_content(&page, "h1").await.unwrap();
    assert_eq!(text.as_deref(), Some("Welcome"));
}

#[tokio::test]
async fn test_selector_available_after_attempts() {
    let provider = MockProvider::new().with_selector_available_after("#late", 3);
    let (_, _, page) = open(&provider).await;

    assert!(provider.wait_for_selector(&page, "#late", 10).await.is_err());
    assert!(provider.wait_for_selector(&page, "#late", 10).await.is_err());
    assert!(provider.wait_for_selector(&page, "#late", 10).await.is_ok());
    assert_eq!(provider.wait_attempts("#late"), 3);
}

#[tokio::test]
async fn test_missing_selector_times_out() {
    let provider = MockProvider::new().with_missing_selector("#never");
    let (_, _, page) = open(&provider).await;
    let err = provider
        .wait_for_selector(&page, "#never", 250)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ProviderError::SelectorTimeout { timeout_ms: 250, .. }
    ));
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_launch_failure() {
    let provider = MockProvider::new().with_launch_failure("no display");
    let err = provider
        .launch(EngineKind::Firefox, &LaunchOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::LaunchFailed(ref m) if m == "no display"));
    assert_eq!(provider.open_browsers(), 0);
    assert_eq!(provider.launch_count(), 1);
}

#[tokio::test]
async fn test_fill_and_type() {
    let provider = MockProvider::new();
    let (_, _, page) = open(&provider).await;
    provider.fill(&page, "#q", "rust").await.unwrap();
    provider.type_text(&page, "#q", " lang").await.unwrap();
    assert_eq!(provider.input_value_of("#q").as_deref(), Some("rust lang"));
    assert_eq!(provider.input_value(&page, "#q").await.unwrap(), "rust lang");
}

#[tokio::test]
async fn test_goto_records_url() {
    let provider = MockProvider::new();
    let (_, _, page) = open(&provider).await;
    provider
        .goto(&page, "https://x.test", &GotoOptions::default())
        .await
        .unwrap();
    assert_eq!(provider.page_url(&page).as_deref(), Some("https://x.test"));
}

#[tokio::test]
async fn test_query_all_and_element_details() {
    let provider = MockProvider::new().with_elements(
        "a",
        vec![
            MockElement::new("a")
                .with_text("Home")
                .with_attribute("href", "/")
                .with_box(0.0, 0.0, 40.0, 20.0),
            MockElement::new("a").detached(),
        ],
    );
    let (_, _, page) = open(&provider).await;
    let handles = provider.query_all(&page, "a").await.unwrap();
    assert_eq!(handles.len(), 2);

    assert_eq!(provider.element_tag_name(&handles[0]).await.unwrap(), "a");
    assert_eq!(
        provider.element_attributes(&handles[0]).await.unwrap()["href"],
        "/"
    );
    assert!(provider.element_text_content(&handles[1]).await.is_err());
}

#[tokio::test]
async fn test_close_page_fires_callback_once() {
    let provider = MockProvider::new();
    let (_, context, page) = open(&provider).await;
    let fired = Arc::new(AtomicUsize::new(0));
    let counter = fired.clone();
    provider
        .on_page_closed(
            &page,
            Arc::new(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        )
        .await
        .unwrap();

    provider.close_page(&page);
    provider.close_page(&page);
    assert_eq!(fired.load(Ordering::SeqCst), 1);
    assert!(provider.list_pages(&context).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_close_browser_releases_everything() {
    let provider = MockProvider::new();
    let (browser, context, page) = open(&provider).await;
    let fired = Arc::new(AtomicUsize::new(0));
    let counter = fired.clone();
    provider
        .on_page_closed(
            &page,
            Arc::new(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        )
        .await
        .unwrap();

    provider.close(&browser).await.unwrap();
    assert_eq!(provider.open_browsers(), 0);
    assert_eq!(fired.load(Ordering::SeqCst), 1);
    assert!(provider.list_pages(&context).await.is_err());
    assert!(provider.close(&browser).await.is_err());
}

#[tokio::test(start_paused = true)]
async fn test_wait_sleeps() {
    let provider = MockProvider::new();
    let start = tokio::time::Instant::now();
    provider.wait(Duration::from_millis(500)).await.unwrap();
    assert!(start.elapsed() >= Duration::from_millis(500));
    assert_eq!(provider.calls(), vec![MockCall::Wait { millis: 500 }]);
}

#[tokio::test]
async fn test_operations_on_unknown_page_fail() {
    let provider = MockProvider::new();
    let page = PageHandle::new("P404");
    assert!(matches!(
        provider.click(&page, "#x", &ClickOptions::default()).await,
        Err(ProviderError::PageNotFound(_))
    ));
}
