pub mod config;
pub mod events;
pub mod history;
pub mod orchestrator;
pub mod paths;
pub mod reporter;
pub mod resolver;
pub mod spec;
pub mod success_state;
pub mod template;
pub mod verification;

pub use config::{ConfigOverrides, DEFAULT_TIMEOUT_MS, ExecutionConfig, ExecutionStrategy};
pub use events::EventBus;
pub use history::InMemoryExecutionHistory;
pub use orchestrator::{Orchestrator, generate_execution_id};
pub use reporter::{ReportError, ReportFormat, render};
pub use resolver::{DecisionSource, HeuristicClassifier, PathDecision, resolve};
pub use spec::{SpecError, load_spec, missing_variables, validate};
pub use success_state::SuccessStateResolver;
pub use template::{substitute, substitute_step};
