//! Step categorization used for preference lookup.

use intentflow_models::IntentStep;

/// Maps a step to a preference category such as `simple_steps` or
/// `dynamic_elements`. `None` means the step fits no known category.
pub trait StepClassifier: Send + Sync {
    fn classify(&self, step: &IntentStep) -> Option<String>;
}

impl<F> StepClassifier for F
where
    F: Fn(&IntentStep) -> Option<String> + Send + Sync,
{
    fn classify(&self, step: &IntentStep) -> Option<String> {
        self(step)
    }
}
