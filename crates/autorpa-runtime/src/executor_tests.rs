use super::*;
use autorpa_core::SessionRegistry;
use autorpa_protocols::{CapabilityProvider, MemoryLogSink};
use autorpa_provider_mock::{MockCall, MockElement, MockProvider};
use serde_json::json;

use crate::settings::ExecutorSettings;

struct Harness {
    provider: Arc<MockProvider>,
    executor: StepExecutor,
    log: Arc<MemoryLogSink>,
    ctx: ExecutionContext,
}

fn harness(provider: MockProvider) -> Harness {
    let provider = Arc::new(provider);
    let sessions = SessionRegistry::new(provider.clone() as Arc<dyn CapabilityProvider>);
    let log = Arc::new(MemoryLogSink::new());
    let ctx = ExecutionContext::new(sessions).with_log(log.clone());
    Harness {
        provider,
        executor: StepExecutor::new(Arc::new(StepTypeRegistry::with_builtins().unwrap())),
        log,
        ctx,
    }
}

fn open_step() -> StepInstance {
    StepInstance::new("open", "BROWSER_OPEN")
        .with_param("url", json!("https://x.test"))
        .with_param("openMode", json!("new"))
}

impl Harness {
    async fn run(&mut self, step: &StepInstance) -> ExecutionResult {
        self.executor.execute(step, &mut self.ctx).await.unwrap()
    }

    async fn open(&mut self) -> String {
        let result = self.run(&open_step()).await;
        assert!(result.success, "{:?}", result.error);
        result.session_id().unwrap().to_string()
    }
}

#[tokio::test]
async fn test_unknown_type_is_a_hard_error() {
    let mut h = harness(MockProvider::new());
    let step = StepInstance::new("s1", "TELEPORT");

    let err = h.executor.execute(&step, &mut h.ctx).await.unwrap_err();
    assert!(matches!(err, StepError::UnknownType(ref id) if id == "TELEPORT"));
    assert!(h.provider.calls().is_empty());
    assert!(h.log.contains(LogLevel::Error, "TELEPORT"));
}

#[tokio::test]
async fn test_validation_failure_never_reaches_provider() {
    let mut h = harness(MockProvider::new());
    let step = StepInstance::new("w", "WAIT").with_param("seconds", json!(-1));

    let result = h.run(&step).await;
    assert!(!result.success);
    assert!(result.error.unwrap().contains("seconds"));
    assert!(h.provider.calls().is_empty());
}

#[tokio::test]
async fn test_oversized_wait_fails_without_panicking() {
    let mut h = harness(MockProvider::new());
    let step = StepInstance::new("w", "WAIT").with_param("seconds", json!(1e20));

    let result = h.run(&step).await;
    assert!(!result.success);
    assert!(result.error.unwrap().contains("too large"));
    assert!(h.provider.calls().is_empty());
}

#[tokio::test]
async fn test_blank_selector_is_rejected_before_running() {
    let mut h = harness(MockProvider::new());
    h.open().await;
    let before = h.provider.calls().len();

    let step = StepInstance::new("c", "CLICK_ELEMENT").with_param("selector", json!("   "));
    let result = h.run(&step).await;
    assert!(!result.success);
    assert!(result.error.unwrap().contains("selector"));
    assert_eq!(h.provider.calls().len(), before);
}

#[tokio::test]
async fn test_open_adopts_session_and_close_clears_it() {
    let mut h = harness(MockProvider::new());

    let id = h.open().await;
    assert_eq!(id, "S1");
    assert_eq!(h.ctx.session_id.as_deref(), Some("S1"));

    let result = h.run(&StepInstance::new("close", "BROWSER_CLOSE")).await;
    assert!(result.success);
    assert!(h.ctx.session_id.is_none());
    assert!(h.ctx.sessions().is_empty());
    assert_eq!(h.provider.open_browsers(), 0);
}

#[tokio::test]
async fn test_open_applies_wait_condition_and_timeout() {
    let mut h = harness(MockProvider::new());
    let step = open_step()
        .with_param("waitUntil", json!("domcontentloaded"))
        .with_param("timeout", json!(1234));

    assert!(h.run(&step).await.success);
    assert!(h.provider.calls().iter().any(|c| matches!(
        c,
        MockCall::Goto { url, wait_until, timeout_ms: 1234, .. }
            if url == "https://x.test" && wait_until == "domcontentloaded"
    )));
}

#[tokio::test]
async fn test_open_incognito_custom_window() {
    let mut h = harness(MockProvider::new());
    let step = open_step()
        .with_param("incognito", json!(true))
        .with_param("windowSize", json!("custom"))
        .with_param("customWidth", json!(800))
        .with_param("customHeight", json!(600));

    assert!(h.run(&step).await.success);
    let launch = h.provider.last_launch().unwrap();
    assert!(launch.args.contains(&"--window-size=800,600".to_string()));
    assert!(h.provider.calls().iter().any(|c| matches!(
        c,
        MockCall::NewContext { isolated: true, .. }
    )));
}

#[tokio::test]
async fn test_open_forces_headless_from_settings() {
    let mut h = harness(MockProvider::new());
    let settings = ExecutorSettings {
        force_headless: true,
        ..ExecutorSettings::default()
    };
    h.ctx = ExecutionContext::new(h.ctx.sessions().clone())
        .with_log(h.log.clone())
        .with_settings(settings);

    assert!(h.run(&open_step()).await.success);
    assert!(h.provider.last_launch().unwrap().headless);
}

#[tokio::test]
async fn test_open_edge_warns_about_alias() {
    let mut h = harness(MockProvider::new());
    let step = open_step().with_param("browserType", json!("edge"));

    assert!(h.run(&step).await.success);
    assert!(h.log.contains(LogLevel::Warn, "edge"));
    assert!(h.provider.calls().iter().any(|c| matches!(
        c,
        MockCall::Launch { engine: autorpa_protocols::EngineKind::Chromium, .. }
    )));
}

#[tokio::test]
async fn test_open_unknown_browser_uses_system_handler() {
    let mut h = harness(MockProvider::new());
    let step = open_step().with_param("browserType", json!("opera"));

    let result = h.run(&step).await;
    assert!(result.success);
    assert!(result.session_id().is_none());
    assert_eq!(h.provider.launch_count(), 0);
    assert!(h.provider.calls().contains(&MockCall::OpenExternal {
        url: "https://x.test".to_string()
    }));
}

#[tokio::test]
async fn test_open_launch_failure_is_reported() {
    let mut h = harness(MockProvider::new().with_launch_failure("no chromium installed"));

    let result = h.run(&open_step()).await;
    assert!(!result.success);
    assert!(result.error.unwrap().contains("no chromium installed"));
    assert!(h.ctx.sessions().is_empty());
    assert!(h.ctx.session_id.is_none());
}

#[tokio::test]
async fn test_open_navigation_failure_keeps_session_for_cleanup() {
    let mut h = harness(MockProvider::new().with_navigation_failure("net::ERR_NAME_NOT_RESOLVED"));

    let result = h.run(&open_step()).await;
    assert!(!result.success);
    assert!(result.error.as_ref().unwrap().contains("ERR_NAME_NOT_RESOLVED"));
    assert_eq!(result.session_id(), Some("S1"));
    assert_eq!(h.ctx.session_id.as_deref(), Some("S1"));
}

#[tokio::test]
async fn test_close_unknown_session_is_soft_failure() {
    let mut h = harness(MockProvider::new());
    let step = StepInstance::new("close", "BROWSER_CLOSE").with_param("browserId", json!("S9"));

    let result = h.run(&step).await;
    assert!(!result.success);
    assert!(result.error.unwrap().contains("S9"));
    assert!(h.log.contains(LogLevel::Warn, "S9"));
}

#[tokio::test]
async fn test_step_without_session_fails_softly() {
    let mut h = harness(MockProvider::new());
    let step = StepInstance::new("c", "CLICK_ELEMENT").with_param("selector", json!("#go"));

    let result = h.run(&step).await;
    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("No active browser session"));
    assert!(h.log.contains(LogLevel::Warn, "No active browser session"));
}

#[tokio::test]
async fn test_click_succeeds_on_kth_attempt() {
    let mut h = harness(MockProvider::new().with_selector_available_after("#late", 3));
    h.open().await;

    let step = StepInstance::new("c", "CLICK_ELEMENT")
        .with_param("selector", json!("#late"))
        .with_param("retryCount", json!(2))
        .with_param("retryDelay", json!(1));

    let result = h.run(&step).await;
    assert!(result.success, "{:?}", result.error);
    assert_eq!(h.provider.wait_attempts("#late"), 3);
    assert_eq!(result.data.unwrap()["attempts"], json!(3));
    assert!(h.provider.calls().iter().any(|c| matches!(
        c,
        MockCall::Click { selector, click_count: 1, wait_for_navigation: true } if selector == "#late"
    )));
}

#[tokio::test]
async fn test_click_exhaustion_mentions_retry_count() {
    let mut h = harness(MockProvider::new().with_missing_selector("#never"));
    h.open().await;

    let step = StepInstance::new("c", "CLICK_ELEMENT")
        .with_param("selector", json!("#never"))
        .with_param("retryCount", json!(2))
        .with_param("retryDelay", json!(1))
        .with_param("timeout", json!(10));

    let result = h.run(&step).await;
    assert!(!result.success);
    let error = result.error.unwrap();
    assert!(error.contains("retryCount=2"), "{error}");
    assert!(error.contains("3 attempts"), "{error}");
    assert_eq!(h.provider.wait_attempts("#never"), 3);
    assert!(!h.provider.calls().iter().any(|c| matches!(c, MockCall::Click { .. })));
}

#[tokio::test]
async fn test_click_dry_run_only_waits() {
    let mut h = harness(MockProvider::new());
    h.open().await;

    let step = StepInstance::new("c", "CLICK_ELEMENT")
        .with_param("selector", json!("#banner"))
        .with_param("dryRun", json!(true));

    let result = h.run(&step).await;
    assert!(result.success);
    assert_eq!(result.data.unwrap()["clicked"], json!(false));
    assert_eq!(h.provider.wait_attempts("#banner"), 1);
    assert!(!h.provider.calls().iter().any(|c| matches!(c, MockCall::Click { .. })));
}

#[tokio::test]
async fn test_input_fill_versus_type() {
    let mut h = harness(MockProvider::new());
    h.open().await;

    let fill = StepInstance::new("i1", "INPUT_TEXT")
        .with_param("selector", json!("#q"))
        .with_param("text", json!("rust"));
    assert!(h.run(&fill).await.success);

    let append = StepInstance::new("i2", "INPUT_TEXT")
        .with_param("selector", json!("#q"))
        .with_param("text", json!(" lang"))
        .with_param("clearBefore", json!(false));
    assert!(h.run(&append).await.success);

    let calls = h.provider.calls();
    assert!(calls.contains(&MockCall::Fill {
        selector: "#q".to_string(),
        text: "rust".to_string()
    }));
    assert!(calls.contains(&MockCall::Type {
        selector: "#q".to_string(),
        text: " lang".to_string()
    }));
    assert_eq!(h.provider.input_value_of("#q").as_deref(), Some("rust lang"));
}

#[tokio::test]
async fn test_extract_stores_variable_and_feeds_later_steps() {
    let mut h = harness(MockProvider::new().with_text("h1", "Example Domain"));
    h.open().await;

    let extract = StepInstance::new("e", "EXTRACT_DATA")
        .with_param("selector", json!("h1"))
        .with_param("variableName", json!("title"));
    let result = h.run(&extract).await;
    assert_eq!(result.data, Some(json!("Example Domain")));
    assert_eq!(h.ctx.variables.get("title"), Some(&json!("Example Domain")));

    let input = StepInstance::new("i", "INPUT_TEXT")
        .with_param("selector", json!("#q"))
        .with_param("text", json!("about ${title}"));
    assert!(h.run(&input).await.success);
    assert_eq!(
        h.provider.input_value_of("#q").as_deref(),
        Some("about Example Domain")
    );
}

#[tokio::test]
async fn test_extract_unknown_kind_falls_back_to_text() {
    let mut h = harness(MockProvider::new());
    h.open().await;

    let step = StepInstance::new("e", "EXTRACT_DATA")
        .with_param("selector", json!("h1"))
        .with_param("extractType", json!("outerText"));
    let result = h.run(&step).await;
    assert!(result.success);
    assert_eq!(result.data, Some(json!("mocked h1 text")));
}

#[tokio::test]
async fn test_extract_waits_once_without_retry() {
    let mut h = harness(MockProvider::new().with_missing_selector("#gone"));
    h.open().await;

    let step = StepInstance::new("e", "EXTRACT_DATA")
        .with_param("selector", json!("#gone"))
        .with_param("timeout", json!(5));
    let result = h.run(&step).await;
    assert!(!result.success);
    assert_eq!(h.provider.wait_attempts("#gone"), 1);
}

#[tokio::test]
async fn test_page_elements_skip_failures_and_keep_order() {
    let elements = vec![
        MockElement::new("A")
            .with_text(" First ")
            .with_attribute("href", "/one")
            .with_box(0.0, 0.0, 10.0, 10.0),
        MockElement::new("A").with_text("broken").detached(),
        MockElement::new("BUTTON").with_text("Third"),
    ];
    let mut h = harness(MockProvider::new().with_elements("a, button", elements));
    h.open().await;

    let step = StepInstance::new("g", "GET_PAGE_ELEMENTS").with_param("selector", json!("a, button"));
    let result = h.run(&step).await;
    assert!(result.success);

    let data = result.data.unwrap();
    let items = data.as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["tagName"], json!("a"));
    assert_eq!(items[0]["textContent"], json!("First"));
    assert_eq!(items[0]["attributes"]["href"], json!("/one"));
    assert_eq!(items[0]["boundingBox"]["width"], json!(10.0));
    assert_eq!(items[1]["index"], json!(2));
    assert_eq!(items[1]["tagName"], json!("button"));
    assert!(h.log.contains(LogLevel::Warn, "Skipping element 1"));
    assert_eq!(h.ctx.variables.get("pageElements"), Some(&data));
}

#[tokio::test]
async fn test_declared_type_is_not_executable() {
    let mut h = harness(MockProvider::new());
    let result = h.run(&StepInstance::new("loop", "LOOP_FOR")).await;
    assert!(!result.success);
    assert!(result.error.unwrap().contains("cannot be executed"));
}

#[tokio::test]
async fn test_run_time_override_wins() {
    let mut h = harness(MockProvider::new());
    h.ctx.set_override("open", "url", json!("https://override.test"));

    assert!(h.run(&open_step()).await.success);
    assert!(h.provider.calls().iter().any(|c| matches!(
        c,
        MockCall::Goto { url, .. } if url == "https://override.test"
    )));
}

#[tokio::test]
async fn test_configured_timeout_applies_when_step_omits_it() {
    let mut h = harness(MockProvider::new());
    let settings = ExecutorSettings {
        click_timeout_ms: 4321,
        ..ExecutorSettings::default()
    };
    h.ctx = ExecutionContext::new(h.ctx.sessions().clone())
        .with_log(h.log.clone())
        .with_settings(settings);
    h.open().await;

    let step = StepInstance::new("c", "CLICK_ELEMENT").with_param("selector", json!("#go"));
    assert!(h.run(&step).await.success);
    assert!(h.provider.calls().contains(&MockCall::WaitForSelector {
        selector: "#go".to_string(),
        timeout_ms: 4321
    }));
}

#[tokio::test]
async fn test_cancelled_context_runs_nothing() {
    let mut h = harness(MockProvider::new());
    h.ctx.cancellation().cancel();

    let result = h.run(&open_step()).await;
    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("Execution was cancelled"));
    assert!(h.provider.calls().is_empty());
}

#[tokio::test]
async fn test_refresh_and_navigate() {
    let mut h = harness(MockProvider::new());
    h.open().await;

    let navigate = StepInstance::new("n", "BROWSER_NAVIGATE")
        .with_param("url", json!("https://x.test/next"))
        .with_param("waitForLoad", json!(false));
    assert!(h.run(&navigate).await.success);

    assert!(h.run(&StepInstance::new("r", "BROWSER_REFRESH")).await.success);

    let calls = h.provider.calls();
    assert!(calls.iter().any(|c| matches!(
        c,
        MockCall::Goto { url, wait_until, .. } if url == "https://x.test/next" && wait_until == "commit"
    )));
    assert!(calls.iter().any(|c| matches!(c, MockCall::Reload { .. })));
}
