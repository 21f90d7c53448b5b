//! Support code for the `seabrief` command-line tool: layered settings and result rendering.

pub mod report;
pub mod settings;

pub use settings::{API_KEY_VAR, Settings, load_settings};
