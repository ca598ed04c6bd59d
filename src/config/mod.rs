//! Configuration and CLI handling

pub mod cli;
pub mod settings;

pub use cli::{Cli, Command};
pub use settings::Settings;
