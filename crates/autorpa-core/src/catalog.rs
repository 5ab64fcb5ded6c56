//! Built-in step type catalog.
//!
//! Validators here check structure only (kinds, ranges, cross-field rules).
//! Whether a selector or path is actually filled in is checked when the step
//! is about to run, so that every schema's defaults validate standalone.

use autorpa_protocols::{
    ParamDescriptor as P, ParamValues, StepCategory, StepTypeDefinition, ValidationResult,
};

/// Default per-attempt timeout for selector waits that retry.
pub const DEFAULT_CLICK_TIMEOUT_MS: u64 = 60_000;
/// Default timeout for navigation and single waits.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
/// Default number of additional selector-wait attempts.
pub const DEFAULT_RETRY_COUNT: u64 = 2;
/// Default delay between selector-wait attempts.
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1_000;

pub const OPEN_MODES: &[&str] = &["useExisting", "newBrowser", "new"];
pub const BROWSER_TYPES: &[&str] = &["chrome", "firefox", "safari", "edge"];
pub const WINDOW_SIZES: &[&str] = &["default", "maximized", "fullscreen", "custom"];
pub const WAIT_CONDITIONS: &[&str] = &["load", "domcontentloaded", "networkidle", "commit"];
pub const EXTRACT_TYPES: &[&str] = &["text", "attribute", "html", "value"];
pub const FILE_FORMATS: &[&str] = &["txt", "json", "csv"];
const SCROLL_TYPES: &[&str] = &["up", "down", "toTop", "toBottom", "toElement"];
const ENCODINGS: &[&str] = &["utf8", "ascii", "base64"];
const DATA_OPERATIONS: &[&str] = &["uppercase", "lowercase", "trim", "parseJson", "stringify"];
const COMPARE_OPERATORS: &[&str] = &["equal", "notEqual", "greaterThan", "lessThan"];

/// All built-in definitions, in registration order.
pub fn builtin_definitions() -> Vec<StepTypeDefinition> {
    vec![
        // browser
        browser_open(),
        StepTypeDefinition::new("BROWSER_CLOSE", "Close Browser", StepCategory::Browser)
            .with_description("Close the browser session and release its resources")
            .with_icon("Close")
            .with_param(browser_id()),
        StepTypeDefinition::new("BROWSER_REFRESH", "Refresh Page", StepCategory::Browser)
            .with_description("Reload the current page")
            .with_icon("Refresh")
            .with_param(P::boolean("waitForLoad", "Wait for load", true))
            .with_param(timeout(DEFAULT_TIMEOUT_MS))
            .with_param(browser_id())
            .with_validator(validate_timing),
        StepTypeDefinition::new("BROWSER_NAVIGATE", "Navigate to URL", StepCategory::Browser)
            .with_description("Navigate the current page to a URL")
            .with_icon("ArrowRight")
            .with_param(P::string("url", "URL", "https://www.example.com").required())
            .with_param(P::boolean("waitForLoad", "Wait for load", true))
            .with_param(timeout(DEFAULT_TIMEOUT_MS))
            .with_param(browser_id())
            .with_validator(validate_timing),
        // interaction
        StepTypeDefinition::new("CLICK_ELEMENT", "Click Element", StepCategory::Interaction)
            .with_description("Wait for an element and click it")
            .with_icon("Pointer")
            .with_param(selector())
            .with_param(P::boolean("waitForNavigation", "Wait for navigation", true))
            .with_param(P::number("clickCount", "Click count", 1))
            .with_param(timeout(DEFAULT_CLICK_TIMEOUT_MS))
            .with_param(retry_count())
            .with_param(retry_delay())
            .with_param(
                P::boolean("dryRun", "Dry run", false)
                    .describe("Only wait for the element, do not click"),
            )
            .with_param(browser_id())
            .with_validator(validate_click),
        StepTypeDefinition::new("INPUT_TEXT", "Input Text", StepCategory::Interaction)
            .with_description("Type text into an input field")
            .with_icon("Edit")
            .with_param(selector())
            .with_param(P::string("text", "Text", "").required())
            .with_param(P::boolean("clearBefore", "Clear before typing", true))
            .with_param(timeout(DEFAULT_CLICK_TIMEOUT_MS))
            .with_param(retry_count())
            .with_param(retry_delay())
            .with_param(browser_id())
            .with_validator(validate_timing),
        StepTypeDefinition::new("SELECT_OPTION", "Select Option", StepCategory::Interaction)
            .with_description("Choose an option of a select element")
            .with_icon("Select")
            .with_param(selector())
            .with_param(P::string("optionText", "Option text", ""))
            .with_param(P::string("optionValue", "Option value", "")),
        StepTypeDefinition::new("SCROLL_PAGE", "Scroll Page", StepCategory::Interaction)
            .with_description("Scroll the page or scroll an element into view")
            .with_icon("RefreshRight")
            .with_param(P::enumeration("scrollType", "Scroll type", SCROLL_TYPES, "down").required())
            .with_param(P::string("selector", "Element selector", ""))
            .with_validator(validate_scroll),
        StepTypeDefinition::new("HOVER_ELEMENT", "Hover Element", StepCategory::Interaction)
            .with_description("Move the mouse over an element")
            .with_icon("Mouse")
            .with_param(selector()),
        // data
        StepTypeDefinition::new("EXTRACT_DATA", "Extract Data", StepCategory::Data)
            .with_description("Read text, markup, an attribute or a form value from an element")
            .with_icon("DataAnalysis")
            .with_param(selector())
            .with_param(
                P::string("extractType", "Extract type", "text").with_suggestions(EXTRACT_TYPES),
            )
            .with_param(P::string("attributeName", "Attribute name", "href"))
            .with_param(P::string("variableName", "Variable name", "extractedData").required())
            .with_param(timeout(DEFAULT_TIMEOUT_MS))
            .with_param(browser_id())
            .with_validator(validate_timing),
        StepTypeDefinition::new("GET_PAGE_ELEMENTS", "Get Page Elements", StepCategory::Data)
            .with_description("Collect tag, text, attributes and geometry of matching elements")
            .with_icon("DataAnalysis")
            .with_param(browser_id().required())
            .with_param(P::string("selector", "Element selector", "*"))
            .with_param(P::boolean("extractDetails", "Extract details", true))
            .with_param(P::string("variableName", "Variable name", "pageElements").required())
            .with_param(timeout(DEFAULT_TIMEOUT_MS))
            .with_validator(validate_timing),
        StepTypeDefinition::new("PROCESS_DATA", "Process Data", StepCategory::Data)
            .with_description("Transform a variable")
            .with_icon("Operation")
            .with_param(P::string("inputVariable", "Input variable", "").required())
            .with_param(P::enumeration(
                "operationType",
                "Operation",
                DATA_OPERATIONS,
                "uppercase",
            ))
            .with_param(P::string("outputVariable", "Output variable", "processedData").required()),
        StepTypeDefinition::new("COMPARE_DATA", "Compare Data", StepCategory::Data)
            .with_description("Compare two values")
            .with_icon("Operation")
            .with_param(P::string("value1", "First value", "").required())
            .with_param(P::string("value2", "Second value", "").required())
            .with_param(
                P::enumeration("operator", "Operator", COMPARE_OPERATORS, "equal").required(),
            )
            .with_param(P::string("resultVariable", "Result variable", "compareResult").required()),
        // logic
        StepTypeDefinition::new("WAIT", "Wait", StepCategory::Logic)
            .with_description("Pause the run for a number of seconds")
            .with_icon("Clock")
            .with_param(P::number("seconds", "Seconds", 2).required())
            .with_validator(validate_wait),
        StepTypeDefinition::new("IF_CONDITION", "If Condition", StepCategory::Logic)
            .with_description("Branch on a condition")
            .with_icon("Switch")
            .with_param(P::string("condition", "Condition", "").required())
            .with_param(P::string("trueBranchId", "Run when true", ""))
            .with_param(P::string("falseBranchId", "Run when false", "")),
        StepTypeDefinition::new("LOOP_FOR", "Loop", StepCategory::Logic)
            .with_description("Repeat a block a fixed number of times")
            .with_icon("RefreshLeft")
            .with_param(P::number("loopCount", "Loop count", 5).required())
            .with_param(P::string("loopVariable", "Loop variable", "i"))
            .with_validator(validate_loop),
        StepTypeDefinition::new("TRY_CATCH", "Try Catch", StepCategory::Logic)
            .with_description("Capture errors of a block")
            .with_icon("Warning")
            .with_param(P::string("errorVariable", "Error variable", "error")),
        // file
        StepTypeDefinition::new("SAVE_FILE", "Save File", StepCategory::File)
            .with_description("Write data to a file")
            .with_icon("Download")
            .with_param(P::string("data", "Data", "").required())
            .with_param(P::string("filePath", "File path", "").required())
            .with_param(P::enumeration("format", "Format", FILE_FORMATS, "txt")),
        StepTypeDefinition::new("READ_FILE", "Read File", StepCategory::File)
            .with_description("Read a file into a variable")
            .with_icon("Document")
            .with_param(P::string("filePath", "File path", "").required())
            .with_param(P::enumeration("encoding", "Encoding", ENCODINGS, "utf8"))
            .with_param(P::string("outputVariable", "Output variable", "fileContent").required()),
        StepTypeDefinition::new("WRITE_FILE", "Write File", StepCategory::File)
            .with_description("Write or append text to a file")
            .with_icon("EditPen")
            .with_param(P::string("filePath", "File path", "").required())
            .with_param(P::string("content", "Content", "").required())
            .with_param(P::enumeration("encoding", "Encoding", ENCODINGS, "utf8"))
            .with_param(P::boolean("append", "Append", false)),
        StepTypeDefinition::new("DOWNLOAD_FILE", "Download File", StepCategory::File)
            .with_description("Download a URL to disk")
            .with_icon("Download")
            .with_param(P::string("url", "File URL", "").required())
            .with_param(P::string("savePath", "Save path", "").required()),
        StepTypeDefinition::new("UPLOAD_FILE", "Upload File", StepCategory::File)
            .with_description("Set a file on an upload input")
            .with_icon("Upload")
            .with_param(P::string("selector", "Upload input selector", "").required())
            .with_param(P::string("filePath", "File path", "").required()),
    ]
}

fn browser_open() -> StepTypeDefinition {
    StepTypeDefinition::new("BROWSER_OPEN", "Open Browser", StepCategory::Browser)
        .with_description("Open a URL in a browser session")
        .with_icon("ChromeFilled")
        .with_param(P::string("url", "URL", "https://www.example.com").required())
        .with_param(
            P::enumeration("openMode", "Open mode", OPEN_MODES, "useExisting")
                .describe("Reuse an open browser of the same kind, or start a new one"),
        )
        .with_param(
            P::string("browserType", "Browser", "chrome")
                .with_suggestions(BROWSER_TYPES)
                .describe("Unsupported browsers are opened with the system default handler"),
        )
        .with_param(P::boolean("headless", "Headless", false))
        .with_param(P::boolean("incognito", "Incognito", false))
        .with_param(P::enumeration("windowSize", "Window size", WINDOW_SIZES, "default"))
        .with_param(P::number("customWidth", "Custom width", 1280))
        .with_param(P::number("customHeight", "Custom height", 800))
        .with_param(P::enumeration(
            "waitUntil",
            "Wait until",
            WAIT_CONDITIONS,
            "networkidle",
        ))
        .with_param(timeout(DEFAULT_TIMEOUT_MS))
        .with_validator(validate_open)
}

fn selector() -> P {
    P::string("selector", "Selector", "").required()
}

fn browser_id() -> P {
    P::string("browserId", "Browser ID", "").describe("Session to use; empty means the run's session")
}

fn timeout(default_ms: u64) -> P {
    P::number("timeout", "Timeout (ms)", default_ms)
}

fn retry_count() -> P {
    P::number("retryCount", "Retry count", DEFAULT_RETRY_COUNT)
}

fn retry_delay() -> P {
    P::number("retryDelay", "Retry delay (ms)", DEFAULT_RETRY_DELAY_MS)
}

fn number(params: &ParamValues, key: &str) -> Option<f64> {
    params.get(key).and_then(|v| v.as_f64())
}

fn non_negative(params: &ParamValues, key: &str) -> Result<(), String> {
    match number(params, key) {
        Some(n) if n < 0.0 => Err(format!("'{key}' must be non-negative, got {n}")),
        _ => Ok(()),
    }
}

fn at_least_one(params: &ParamValues, key: &str) -> Result<(), String> {
    match number(params, key) {
        Some(n) if n < 1.0 => Err(format!("'{key}' must be at least 1, got {n}")),
        _ => Ok(()),
    }
}

fn check(results: &[Result<(), String>]) -> ValidationResult {
    match results.iter().find_map(|r| r.as_ref().err()) {
        Some(e) => ValidationResult::fail(e.clone()),
        None => ValidationResult::ok(),
    }
}

fn validate_timing(params: &ParamValues) -> ValidationResult {
    check(&[
        non_negative(params, "timeout"),
        non_negative(params, "retryCount"),
        non_negative(params, "retryDelay"),
    ])
}

fn validate_click(params: &ParamValues) -> ValidationResult {
    check(&[
        non_negative(params, "timeout"),
        non_negative(params, "retryCount"),
        non_negative(params, "retryDelay"),
        at_least_one(params, "clickCount"),
    ])
}

fn validate_open(params: &ParamValues) -> ValidationResult {
    let custom = params.get("windowSize").and_then(|v| v.as_str()) == Some("custom");
    let mut results = vec![non_negative(params, "timeout")];
    if custom {
        results.push(at_least_one(params, "customWidth"));
        results.push(at_least_one(params, "customHeight"));
    }
    check(&results)
}

fn validate_scroll(params: &ParamValues) -> ValidationResult {
    let to_element = params.get("scrollType").and_then(|v| v.as_str()) == Some("toElement");
    let selector = params.get("selector").and_then(|v| v.as_str()).unwrap_or("");
    if to_element && selector.trim().is_empty() {
        return ValidationResult::fail("'selector' is required when scrolling to an element");
    }
    ValidationResult::ok()
}

fn validate_wait(params: &ParamValues) -> ValidationResult {
    check(&[non_negative(params, "seconds")])
}

fn validate_loop(params: &ParamValues) -> ValidationResult {
    check(&[at_least_one(params, "loopCount")])
}

#[cfg(test)]
#[path = "catalog_tests.rs"]
mod tests;
