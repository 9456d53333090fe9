use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use intentflow_models::{ExecutionPath, FallbackPath};
use std::path::PathBuf;

use crate::output::OutputFormat;

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PathArg {
    Ai,
    Snippet,
}

impl From<PathArg> for ExecutionPath {
    fn from(value: PathArg) -> Self {
        match value {
            PathArg::Ai => ExecutionPath::Ai,
            PathArg::Snippet => ExecutionPath::Snippet,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FallbackArg {
    Ai,
    Snippet,
    None,
}

impl From<FallbackArg> for FallbackPath {
    fn from(value: FallbackArg) -> Self {
        match value {
            FallbackArg::Ai => FallbackPath::Ai,
            FallbackArg::Snippet => FallbackPath::Snippet,
            FallbackArg::None => FallbackPath::None,
        }
    }
}

#[derive(Parser)]
#[command(name = "intentflow")]
#[command(version, about = "IntentFlow - AI-first browser workflow execution")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (defaults to ~/.config/intentflow/config.toml)
    #[arg(long, global = true, env = "INTENTFLOW_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Execute an intent spec and print the report
    Run(RunArgs),

    /// Check an intent spec for structural problems
    Validate(ValidateArgs),

    /// Re-render a saved JSON report
    Render(RenderArgs),

    /// Check the Node.js / Playwright runtime used for snippet steps
    Probe,

    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args)]
pub struct RunArgs {
    /// Spec file (.yaml, .yml or .json)
    pub spec: PathBuf,

    /// Variable binding, repeatable (NAME=value)
    #[arg(long = "var", value_name = "NAME=VALUE", value_parser = parse_key_val)]
    pub vars: Vec<(String, String)>,

    /// Write the report here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// AI agent endpoint
    #[arg(long, env = "INTENTFLOW_AGENT_URL")]
    pub agent_url: Option<String>,

    /// Screenshot comparator endpoint
    #[arg(long, env = "INTENTFLOW_COMPARATOR_URL")]
    pub comparator_url: Option<String>,

    /// Bearer token sent to the agent and comparator
    #[arg(long, env = "INTENTFLOW_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Directory searched for success-state screenshots
    #[arg(long)]
    pub recordings_dir: Option<PathBuf>,

    /// Per-executor-call timeout in milliseconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Never try the fallback path
    #[arg(long)]
    pub no_fallback: bool,

    /// Skip the success-state screenshot comparison
    #[arg(long)]
    pub no_comparison: bool,

    /// Do not capture screenshots
    #[arg(long)]
    pub no_screenshots: bool,

    /// Halt after the first step that fails
    #[arg(long)]
    pub stop_on_failure: bool,

    /// Force every step onto this path
    #[arg(long, value_enum)]
    pub prefer: Option<PathArg>,

    /// Fallback used with --prefer
    #[arg(long, value_enum, requires = "prefer")]
    pub fallback: Option<FallbackArg>,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Do not keep a copy of the report in the reports directory
    #[arg(long)]
    pub no_save: bool,
}

#[derive(Args)]
pub struct ValidateArgs {
    /// Spec file (.yaml, .yml or .json)
    pub spec: PathBuf,
}

#[derive(Args)]
pub struct RenderArgs {
    /// Report file written by `intentflow run --format json`
    pub report: PathBuf,

    /// Write the rendering here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

fn parse_key_val(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("invalid variable '{raw}': expected NAME=VALUE"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("invalid variable '{raw}': empty name"));
    }
    Ok((name.to_string(), value.to_string()))
}
