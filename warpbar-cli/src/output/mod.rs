//! Output formatting for CLI.

mod json;
mod text;

pub use json::{CandidateOutput, JsonFormatter, LocateOutput};
pub use text::TextFormatter;
