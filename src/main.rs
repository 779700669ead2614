use clap::Parser;
use casetrack::cli::{handle_config, handle_seed, handle_serve, Cli, Commands};

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve(args) => handle_serve(args),
        Commands::Config(args) => handle_config(args),
        Commands::Seed { json } => handle_seed(json),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
