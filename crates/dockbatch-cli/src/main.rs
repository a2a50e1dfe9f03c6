mod cli;
mod commands;
mod config;
mod error;
mod invocation;
mod logging;
mod pdb;
mod utils;

use crate::cli::{Cli, Commands};
use crate::config::PartialSettings;
use crate::error::{CliError, Result};
use clap::Parser;
use tracing::{debug, error, info};

#[tokio::main]
async fn main() {
    if let Err(e) = run_app().await {
        eprintln!("\n❌ Error: {}", e);
        std::process::exit(1);
    }
}

async fn run_app() -> Result<()> {
    let mut cli = Cli::parse();
    logging::setup_logging(cli.verbose, cli.quiet, cli.log_file.as_deref())?;

    let (panic_hook, eyre_hook) = color_eyre::config::HookBuilder::default().into_hooks();
    eyre_hook.install().map_err(|e| CliError::Other(e.into()))?;
    std::panic::set_hook(Box::new(move |pi| {
        error!("{}", panic_hook.panic_report(pi));
    }));

    info!("🚀 dockbatch v{} starting up.", env!("CARGO_PKG_VERSION"));
    debug!("Full CLI arguments parsed: {:?}", &cli);

    let settings = PartialSettings::load(cli.settings.as_deref())?;

    let command_result = match cli.command.take() {
        Some(Commands::Prepare(args)) => {
            info!("Dispatching to 'prepare' command.");
            commands::prepare::run(args, &settings).await
        }
        None => {
            let payload = cli.config_json.clone().ok_or_else(|| {
                CliError::Invocation("missing JSON configuration argument".to_string())
            })?;
            let engine_settings = settings.merge_with_cli(&cli)?;
            info!("Dispatching to docking batch.");
            commands::dock::run(&payload, engine_settings).await
        }
    };

    match &command_result {
        Ok(_) => info!("✅ Command completed successfully."),
        Err(e) => error!("❌ Command failed: {}", e),
    }
    command_result
}
