// Export modules for use in tests
pub mod app;
pub mod event_source;
pub mod panic_handler;
pub mod settings;
pub mod viewer;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use app::{App, run_app_with_event_source};
pub use viewer::{RenderOutcome, ViewerError, ViewerSession};
