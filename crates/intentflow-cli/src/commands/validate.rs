use anyhow::Result;
use colored::Colorize;
use intentflow_core::{SpecError, load_spec, validate};
use serde_json::json;

use crate::cli::ValidateArgs;
use crate::output::{OutputFormat, json::print_json};

/// Returns whether the spec is valid. Unreadable files are errors.
pub fn run(args: ValidateArgs, format: OutputFormat) -> Result<bool> {
    let spec = load_spec(&args.spec)?;

    let problems = match validate(&spec) {
        Ok(()) => Vec::new(),
        Err(SpecError::Invalid(problems)) => problems,
        Err(other) => return Err(other.into()),
    };
    let valid = problems.is_empty();

    if format.is_json() {
        print_json(&json!({
            "spec": args.spec.display().to_string(),
            "name": spec.name,
            "steps": spec.steps.len(),
            "params": spec.params,
            "valid": valid,
            "problems": problems,
        }))?;
        return Ok(valid);
    }

    if valid {
        println!(
            "{} {} ({} steps)",
            "Valid:".green().bold(),
            spec.name,
            spec.steps.len()
        );
    } else {
        println!("{} {}", "Invalid:".red().bold(), args.spec.display());
        for problem in &problems {
            println!("  - {problem}");
        }
    }

    Ok(valid)
}
