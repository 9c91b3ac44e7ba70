//! groupaudit CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use tracing::info;

use groupaudit_client::cli::Cli;
use groupaudit_client::commands::audit::{self, AuditOptions};
use groupaudit_client::error::ClientResult;
use groupaudit_core::{TracingConfig, init_tracing};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ClientResult<()> {
    // --debug wins over RUST_LOG
    let tracing_config = if cli.debug {
        let config = TracingConfig::cli_debug();
        let directive = config.default_directive();
        config.with_env_filter(directive)
    } else {
        TracingConfig::cli()
    };
    init_tracing(tracing_config)?;

    let options = AuditOptions::from_cli(&cli)?;
    let summary = audit::run(options).await?;

    if summary.failures > 0 {
        info!(
            "{} group(s) could not be audited; see warnings above",
            summary.failures
        );
    }
    Ok(())
}
