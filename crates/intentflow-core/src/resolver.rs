//! Path preference resolution.
//!
//! [`resolve`] decides which path runs a step first and what it falls back
//! to. It is pure: the same inputs always give the same [`PathDecision`].

use intentflow_models::{ExecutionPath, FallbackPath, IntentStep};
use intentflow_traits::StepClassifier;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::config::ExecutionStrategy;

/// Category for navigation and wait steps.
pub const SIMPLE_STEPS: &str = "simple_steps";
/// Category for free-text targets without a stable selector.
pub const DYNAMIC_ELEMENTS: &str = "dynamic_elements";

const SIMPLE_ACTIONS: &[&str] = &[
    "navigate", "goto", "go_to", "open", "visit", "wait", "wait_for", "sleep", "reload",
];
const SIMPLE_PHRASES: &[&str] = &[
    "navigate to",
    "go to",
    "open the page",
    "open the url",
    "visit ",
    "wait for",
    "wait until",
    "reload the page",
];
const FREE_TEXT_WORDS: &[&str] = &[
    "text", "containing", "contains", "labeled", "labelled", "named", "titled", "says",
    "saying", "reading", "called",
];

/// Which rule produced a decision.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DecisionSource {
    Override,
    Step,
    Category,
    Default,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct PathDecision {
    pub primary: ExecutionPath,
    pub fallback: FallbackPath,
    pub source: DecisionSource,
}

impl PathDecision {
    fn new(primary: ExecutionPath, fallback: FallbackPath, source: DecisionSource) -> Self {
        // A fallback onto the same path would just retry the primary.
        let fallback = if fallback.target() == Some(primary) {
            FallbackPath::None
        } else {
            fallback
        };
        Self {
            primary,
            fallback,
            source,
        }
    }

    pub fn fallback_path(&self) -> Option<ExecutionPath> {
        self.fallback.target()
    }
}

/// Resolve the initial path and fallback for `step`.
///
/// First match wins:
/// 1. caller strategy with `override_preferences` and a `preferred_path`
/// 2. the step's own `prefer` / `fallback`
/// 3. the spec preference for the step's category
/// 4. `ai` with no fallback
pub fn resolve(
    step: &IntentStep,
    preferences: &BTreeMap<String, ExecutionPath>,
    strategy: Option<&ExecutionStrategy>,
    classifier: &dyn StepClassifier,
) -> PathDecision {
    if let Some(strategy) = strategy
        && strategy.override_preferences
        && let Some(preferred) = strategy.preferred_path
    {
        return PathDecision::new(
            preferred,
            strategy.fallback.unwrap_or_default(),
            DecisionSource::Override,
        );
    }

    if let Some(prefer) = step.prefer {
        return PathDecision::new(prefer, step.fallback, DecisionSource::Step);
    }

    if let Some(path) = classifier
        .classify(step)
        .and_then(|category| preferences.get(&category).copied())
    {
        return PathDecision::new(path, FallbackPath::None, DecisionSource::Category);
    }

    PathDecision::new(ExecutionPath::Ai, FallbackPath::None, DecisionSource::Default)
}

/// Keyword-based categorizer.
///
/// Navigation and wait steps are `simple_steps`. Steps whose instruction
/// targets free text and whose selector is not a stable `#id` or `[data-*]`
/// selector are `dynamic_elements`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicClassifier;

impl HeuristicClassifier {
    pub fn new() -> Self {
        Self
    }

    fn is_simple(step: &IntentStep) -> bool {
        if let Some(action) = step.action.as_deref() {
            let action = action.trim().to_lowercase();
            if SIMPLE_ACTIONS.contains(&action.as_str()) {
                return true;
            }
        }

        let instruction = step.ai_instruction.to_lowercase();
        SIMPLE_PHRASES
            .iter()
            .any(|phrase| instruction.contains(phrase))
    }

    fn mentions_free_text(instruction: &str) -> bool {
        if instruction.contains('"') || instruction.contains('\'') || instruction.contains('“') {
            return true;
        }
        instruction
            .split(|c: char| !c.is_alphanumeric())
            .any(|word| FREE_TEXT_WORDS.contains(&word.to_lowercase().as_str()))
    }

    fn has_stable_selector(step: &IntentStep) -> bool {
        let Some(selector) = step.selector.as_deref().map(str::trim) else {
            return false;
        };
        let is_id = selector.starts_with('#')
            && selector.len() > 1
            && !selector.contains(char::is_whitespace);
        is_id || selector.contains("[data-")
    }
}

impl StepClassifier for HeuristicClassifier {
    fn classify(&self, step: &IntentStep) -> Option<String> {
        if Self::is_simple(step) {
            return Some(SIMPLE_STEPS.to_string());
        }
        if Self::mentions_free_text(&step.ai_instruction) && !Self::has_stable_selector(step) {
            return Some(DYNAMIC_ELEMENTS.to_string());
        }
        None
    }
}
