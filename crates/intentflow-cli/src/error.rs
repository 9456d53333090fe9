use colored::Colorize;

pub fn handle_error(err: anyhow::Error) -> ! {
    eprintln!("{} {:#}", "Error:".red().bold(), err);

    for suggestion in suggestions(&format!("{err:#}")) {
        eprintln!("\n{}", "Suggestion:".yellow().bold());
        eprintln!("  {}", suggestion.hint);
        if let Some(command) = suggestion.command {
            eprintln!("  {} {command}", "$".dimmed());
        }
    }

    std::process::exit(1);
}

struct Suggestion {
    hint: &'static str,
    command: Option<&'static str>,
}

fn suggestions(message: &str) -> Vec<Suggestion> {
    let msg = message.to_lowercase();
    let mut found = Vec::new();

    if msg.contains("node.js") || msg.contains("playwright") || msg.contains("chromium") {
        found.push(Suggestion {
            hint: "Check the browser runtime with:",
            command: Some("intentflow probe"),
        });
    }

    if msg.contains("invalid spec") || msg.contains("failed to parse spec") {
        found.push(Suggestion {
            hint: "List every problem in the spec with:",
            command: Some("intentflow validate <spec>"),
        });
    }

    if msg.contains("unsupported spec format") {
        found.push(Suggestion {
            hint: "Specs must be .yaml, .yml or .json files.",
            command: None,
        });
    }

    if msg.contains("connection refused") || msg.contains("request failed") {
        found.push(Suggestion {
            hint: "Check that the agent is running, or point at it with:",
            command: Some("intentflow run <spec> --agent-url http://localhost:4100"),
        });
    }

    found
}
