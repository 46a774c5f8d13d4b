//! Console reporting and JSON serialization of loaded tables

mod json;
mod terminal;

pub use json::{cell_value_to_json, JsonOutput};
pub use terminal::{TerminalOutput, SEPARATOR_WIDTH};
