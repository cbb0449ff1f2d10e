pub mod app;
pub mod cli;

pub use cli::Cli;
