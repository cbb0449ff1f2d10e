pub mod once;
pub mod printer;
pub mod repl;
pub mod setup;

pub use once::run_once_mode;
pub use repl::run_repl_mode;
pub use setup::{setup_from_cli, AppConfig};
