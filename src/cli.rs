//! CLI definitions for AutoRPA.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// AutoRPA CLI.
#[derive(Parser)]
#[command(name = "autorpa")]
#[command(about = "Browser RPA workflow engine")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path (default: ~/.autorpa/config.toml)
    #[arg(short, long, global = true, env = "AUTORPA_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Run a workflow document
    Run {
        /// Path to the workflow JSON
        workflow: PathBuf,

        /// Capability provider (mock, playwright)
        #[arg(long)]
        backend: Option<String>,

        /// Seed a variable, as name=value (value parsed as JSON when possible)
        #[arg(long = "var", value_name = "NAME=VALUE")]
        vars: Vec<String>,

        /// Force every browser headless
        #[arg(long)]
        headless: bool,

        /// Keep going after a failed step
        #[arg(long)]
        keep_going: bool,

        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check a workflow document without running it
    Validate {
        /// Path to the workflow JSON
        workflow: PathBuf,
    },

    /// List the registered step types
    Types {
        /// Only this category (browser, interaction, data, logic, file)
        #[arg(long)]
        category: Option<String>,

        /// Output format (table, json)
        #[arg(long, default_value = "table")]
        format: String,
    },
}
