use std::future::Future;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use super::commands::ServerArgs;
use crate::api::CaseServer;
use crate::config::ServerConfig;
use crate::error::Result;
use crate::storage::seed_cases;

/// Cancel `token` once `signal` fires. If listening fails the server keeps running.
async fn cancel_on_signal<F>(signal: F, token: CancellationToken)
where
    F: Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => {
            info!("shutdown requested");
            token.cancel();
        }
        Err(e) => warn!(error = %e, "failed to listen for ctrl-c; stop the process another way"),
    }
}

fn load_config(args: &ServerArgs) -> Result<ServerConfig> {
    ServerConfig::load(args.config.as_deref(), args.overrides())
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

pub fn handle_serve(args: ServerArgs) -> Result<()> {
    let config = load_config(&args)?;
    init_tracing(&config.log_level);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        let shutdown = CancellationToken::new();

        tokio::spawn(cancel_on_signal(tokio::signal::ctrl_c(), shutdown.clone()));

        info!(
            seed = config.seed,
            strict_not_found = config.strict_not_found,
            "starting casetrack"
        );
        CaseServer::new(config).run(shutdown).await
    })
}

pub fn handle_config(args: ServerArgs) -> Result<()> {
    let config = load_config(&args)?;
    print!("{}", config.to_yaml()?);
    Ok(())
}

pub fn handle_seed(json: bool) -> Result<()> {
    let cases = seed_cases();

    if json {
        println!("{}", serde_json::to_string_pretty(&cases)?);
        return Ok(());
    }

    println!("Seed cases:\n");
    for case in cases {
        let fields = &case.fields;
        println!(
            "  {:03} {} [{}|{}] {}",
            case.id,
            fields.case_number.as_deref().unwrap_or("-"),
            fields.status.as_deref().unwrap_or("-"),
            fields.priority.as_deref().unwrap_or("-"),
            fields.title.as_deref().unwrap_or("(untitled)"),
        );
        if let (Some(owner), Some(customer)) = (&fields.owner, &fields.customer) {
            println!("      owner: {}  customer: {}", owner, customer);
        }
    }

    Ok(())
}
