//! Subcommand implementations.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use autorpa_config::Config;
use autorpa_core::Workflow;
use autorpa_protocols::{ParamValues, StepCategory, StepError};
use autorpa_provider_mock::MockProvider;
use autorpa_runtime::{Engine, RunState, Step, Variables};

/// Parse `name=value` pairs. Values that parse as JSON keep their type,
/// anything else is a string.
pub(crate) fn parse_vars(pairs: &[String]) -> Result<Variables> {
    let mut variables = Variables::new();
    for pair in pairs {
        let Some((name, raw)) = pair.split_once('=') else {
            bail!("--var expects NAME=VALUE, got '{}'", pair);
        };
        let name = name.trim();
        if name.is_empty() {
            bail!("--var has an empty name: '{}'", pair);
        }
        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        variables.set(name, value);
    }
    Ok(variables)
}

pub(crate) async fn run(
    config: &Config,
    workflow_path: &Path,
    vars: &[String],
    json: bool,
) -> Result<bool> {
    let workflow = Workflow::load(workflow_path)
        .with_context(|| format!("loading {}", workflow_path.display()))?;
    let engine = Engine::from_config(config)?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling run");
            on_signal.cancel();
        }
    });

    let mut ctx = engine
        .context()
        .with_variables(parse_vars(vars)?)
        .with_cancellation(cancel);

    let outcome = engine.run_workflow(&workflow, &mut ctx).await;
    engine.shutdown().await;
    let report = outcome?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for step in &report.steps {
            let status = if step.result.success { "ok" } else { "FAILED" };
            println!(
                "{:<8} {:<20} {:<18} {:>6}ms {}",
                status,
                step.step_id,
                step.type_id,
                step.duration_ms,
                step.result.error.as_deref().unwrap_or("")
            );
        }
        println!("{}", "-".repeat(80));
        println!("Run {}: {:?}", report.run_id, report.state);
    }

    Ok(report.state == RunState::Succeeded)
}

/// Check graph shape, step types and parameters. Returns whether the
/// workflow is runnable.
pub(crate) fn validate(config: &Config, workflow_path: &Path) -> Result<bool> {
    let workflow = Workflow::load(workflow_path)
        .with_context(|| format!("loading {}", workflow_path.display()))?;
    let engine = Engine::new(Arc::new(MockProvider::new()), config)?;
    let ctx = engine.context();

    let order = workflow.execution_order()?;
    let mut problems = 0;
    for step in &order {
        let definition = match engine.registry().get(&step.type_id) {
            Ok(definition) => definition,
            Err(e) => {
                println!("{}: {}", step.id, e);
                problems += 1;
                continue;
            }
        };

        let params = engine.executor().merged_params(&definition, step, &ctx);
        if let Err(reason) = definition.validate(&params).into_result() {
            println!("{}: {}", step.id, StepError::validation(&step.type_id, reason));
            problems += 1;
            continue;
        }

        // References resolve at run time; typed checks only apply to literal params.
        if !has_references(&params) {
            match Step::from_params(&definition, &params) {
                Ok(typed) if !typed.is_executable() => {
                    println!("{}: {} is declared but cannot run", step.id, step.type_id);
                    problems += 1;
                }
                Ok(_) => {}
                Err(e) => {
                    println!("{}: {}", step.id, e);
                    problems += 1;
                }
            }
        }
    }

    if problems == 0 {
        info!("{} steps checked", order.len());
        println!("{}: ok ({} steps)", workflow_path.display(), order.len());
    }
    Ok(problems == 0)
}

fn has_references(params: &ParamValues) -> bool {
    params
        .values()
        .any(|v| v.as_str().is_some_and(|s| s.contains("${")))
}

pub(crate) fn types(config: &Config, category: Option<&str>, format: &str) -> Result<()> {
    let category = match category {
        Some(name) => match StepCategory::parse(name) {
            Some(category) => Some(category),
            None => bail!("Unknown category '{}'", name),
        },
        None => None,
    };

    let engine = Engine::new(Arc::new(MockProvider::new()), config)?;
    let definitions = match category {
        Some(category) => engine.registry().list_by_category(category),
        None => engine.registry().list(),
    };

    match format {
        "json" => {
            let list: Vec<_> = definitions.iter().map(Arc::as_ref).collect();
            println!("{}", serde_json::to_string_pretty(&list)?);
        }
        _ => {
            println!("{:<20} {:<12} {:<24} {}", "TYPE", "CATEGORY", "NAME", "PARAMETERS");
            println!("{}", "-".repeat(80));
            for definition in definitions {
                let params = definition
                    .parameter_schema
                    .iter()
                    .map(|p| p.key.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                println!(
                    "{:<20} {:<12} {:<24} {}",
                    definition.type_id,
                    definition.category.as_str(),
                    definition.display_name,
                    params
                );
            }
        }
    }
    Ok(())
}
