use intentflow_models::{IntentStep, Variables};
use tracing::warn;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Replace `{{NAME}}` placeholders in a single pass.
///
/// Names are trimmed before lookup, so `{{ NAME }}` resolves like `{{NAME}}`.
/// Unknown placeholders are kept unchanged (and logged) so a missing binding
/// stays visible downstream. Substituted values are never rescanned.
pub fn substitute(template: &str, variables: &Variables) -> String {
    let mut rendered = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find(OPEN) {
        rendered.push_str(&rest[..start]);
        let Some(end_offset) = rest[start..].find(CLOSE) else {
            rendered.push_str(&rest[start..]);
            rest = "";
            break;
        };

        // `{{a {{B}}`: the marker starts at the innermost opening brace.
        if let Some(inner) = rest[start + OPEN.len()..start + end_offset].rfind(OPEN) {
            let restart = start + OPEN.len() + inner;
            rendered.push_str(&rest[start..restart]);
            rest = &rest[restart..];
            continue;
        }

        let marker = &rest[start..start + end_offset + CLOSE.len()];
        let name = marker[OPEN.len()..marker.len() - CLOSE.len()].trim();
        match variables.get(name) {
            Some(value) => rendered.push_str(value),
            None => {
                warn!(placeholder = %name, "Unresolved variable placeholder left in place");
                rendered.push_str(marker);
            }
        }
        rest = &rest[start + end_offset + CLOSE.len()..];
    }
    rendered.push_str(rest);
    rendered
}

/// Names referenced by `{{NAME}}` markers, in order of appearance.
pub fn placeholders(template: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut rest = template;

    while let Some(start) = rest.find(OPEN) {
        let Some(end_offset) = rest[start..].find(CLOSE) else {
            break;
        };
        if let Some(inner) = rest[start + OPEN.len()..start + end_offset].rfind(OPEN) {
            rest = &rest[start + OPEN.len() + inner..];
            continue;
        }
        let name = rest[start + OPEN.len()..start + end_offset].trim();
        if !name.is_empty() {
            names.push(name.to_string());
        }
        rest = &rest[start + end_offset + CLOSE.len()..];
    }
    names
}

/// Copy of `step` with variables substituted into every executor-facing text field.
pub fn substitute_step(step: &IntentStep, variables: &Variables) -> IntentStep {
    IntentStep {
        ai_instruction: substitute(&step.ai_instruction, variables),
        snippet: substitute(&step.snippet, variables),
        selector: step
            .selector
            .as_deref()
            .map(|selector| substitute(selector, variables)),
        value: step.value.as_deref().map(|value| substitute(value, variables)),
        ..step.clone()
    }
}
