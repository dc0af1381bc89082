//! CLI commands

mod completions;
mod detect;
mod run;

pub use completions::CompletionsCommand;
pub use detect::DetectCommand;
pub use run::RunCommand;
