use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::ConfigOverrides;

#[derive(Parser, Debug)]
#[command(name = "casetrack")]
#[command(version, about = "A small case-tracking service with a JSON REST API")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the case API server until interrupted
    Serve(ServerArgs),

    /// Print the effective configuration as YAML
    Config(ServerArgs),

    /// Print the demo cases a seeded store starts with
    Seed {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug, Default)]
pub struct ServerArgs {
    /// YAML configuration file
    #[arg(long, short = 'c', value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to
    #[arg(long, short = 'p')]
    pub port: Option<u16>,

    /// Path prefix for the case routes (e.g. /api/v1)
    #[arg(long, value_name = "PATH")]
    pub base_path: Option<String>,

    /// Answer 404/400 for missing or malformed case ids
    #[arg(long)]
    pub strict_not_found: bool,

    /// Start with an empty store instead of the demo cases
    #[arg(long)]
    pub no_seed: bool,

    /// Log filter when RUST_LOG is unset (error, warn, info, debug, trace)
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,
}

impl ServerArgs {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            host: self.host.clone(),
            port: self.port,
            base_path: self.base_path.clone(),
            strict_not_found: self.strict_not_found,
            no_seed: self.no_seed,
            log_level: self.log_level.clone(),
        }
    }
}
