//! Hand URLs to the operating system's default handler.

use std::process::Stdio;

use tokio::process::Command;
use tracing::info;

use autorpa_protocols::ProviderError;

#[cfg(target_os = "macos")]
fn opener(url: &str) -> (&'static str, Vec<String>) {
    ("open", vec![url.to_string()])
}

#[cfg(target_os = "windows")]
fn opener(url: &str) -> (&'static str, Vec<String>) {
    (
        "cmd",
        vec![
            "/C".to_string(),
            "start".to_string(),
            String::new(),
            url.to_string(),
        ],
    )
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn opener(url: &str) -> (&'static str, Vec<String>) {
    ("xdg-open", vec![url.to_string()])
}

/// Open `url` in whatever the desktop considers the default browser.
pub async fn open_with_default_handler(url: &str) -> Result<(), ProviderError> {
    let (program, args) = opener(url);
    let program = which::which(program).map_err(|_| {
        ProviderError::ActionFailed(format!("no default URL handler found ('{}')", program))
    })?;

    let status = Command::new(&program)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await?;

    if status.success() {
        info!("Opened {} with the system handler", url);
        Ok(())
    } else {
        Err(ProviderError::ActionFailed(format!(
            "{} exited with {} for {}",
            program.display(),
            status,
            url
        )))
    }
}
