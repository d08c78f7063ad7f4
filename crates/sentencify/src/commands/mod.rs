//! Command handlers for the sentencify CLI.

pub mod history;
pub mod logging;

pub use history::*;
pub use logging::*;
