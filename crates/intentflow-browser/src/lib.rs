//! Playwright-backed script step executor.
//!
//! Snippet steps run as JavaScript with a Playwright `page` in scope, one
//! Node.js process per step. Browser state carries over between steps
//! through the session's storage state and the last visited URL.

mod executor;
mod runtime;
mod script;
mod session;

pub use executor::PlaywrightScriptExecutor;
pub use runtime::{NodeJobOutput, NodeProcessRunner, NodeRunner, RuntimeProbe, probe_runtime};
pub use session::BrowserSession;
