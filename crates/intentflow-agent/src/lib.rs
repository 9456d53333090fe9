//! HTTP-backed collaborators: the AI step executor and the screenshot
//! comparator, each talking to a remote service.

mod ai;
mod comparator;
mod http_client;

pub use ai::HttpAiExecutor;
pub use comparator::HttpScreenshotComparator;
pub use http_client::build_http_client;
