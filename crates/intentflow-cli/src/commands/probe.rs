use anyhow::Result;
use colored::Colorize;
use intentflow_browser::{RuntimeProbe, probe_runtime};

use crate::output::table::{key_value_table, print_table};
use crate::output::{OutputFormat, json::print_json};

pub async fn run(format: OutputFormat) -> Result<()> {
    let probe = probe_runtime().await;

    if format.is_json() {
        return print_json(&probe);
    }

    print_table(key_value_table(rows(&probe)));
    if probe.ready {
        println!("{}", "Browser runtime ready".green().bold());
    } else {
        println!("{}", "Browser runtime not ready".red().bold());
    }
    for note in &probe.notes {
        println!("  - {note}");
    }
    Ok(())
}

fn rows(probe: &RuntimeProbe) -> Vec<(&'static str, String)> {
    vec![
        (
            "Node.js",
            match (&probe.node_available, &probe.node_version) {
                (true, Some(version)) => version.clone(),
                (true, None) => "available".to_string(),
                (false, _) => "missing".to_string(),
            },
        ),
        ("Playwright package", yes_no(probe.playwright_package_available)),
        ("Chromium cache", yes_no(probe.chromium_cache_detected)),
    ]
}

fn yes_no(value: bool) -> String {
    if value { "found" } else { "missing" }.to_string()
}
