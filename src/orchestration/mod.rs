//! End-to-end run: discover stakes, resolve the window, attribute every pool, build the report.

pub mod discovery;
pub mod runner;

pub use discovery::discover_stakes;
pub use runner::{FeeShareRunner, RunError};
