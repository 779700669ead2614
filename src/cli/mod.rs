mod commands;
mod handlers;

pub use commands::{Cli, Commands, ServerArgs};
pub use handlers::{handle_config, handle_seed, handle_serve};
