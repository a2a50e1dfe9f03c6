use crate::error::Result;
use crate::invocation::parse_run_configs;
use crate::utils::progress::CliProgressHandler;
use dockbatch::{
    core::io::history::RunStatus,
    engine::{
        config::{EngineSettings, available_parallelism},
        normalize::ConfigNormalizer,
        progress::ProgressReporter,
        runner::VinaEngine,
    },
    workflows::{self, batch::BatchEnvironment},
};
use tracing::{error, info, warn};

pub async fn run(payload: &str, settings: EngineSettings) -> Result<()> {
    let configs = parse_run_configs(payload)?;
    info!("Received {} configuration(s).", configs.len());

    let base_dir = std::env::current_dir()?;
    let normalizer = ConfigNormalizer::new(base_dir, available_parallelism());
    let engine = VinaEngine::new(settings.vina_path.clone());
    info!("Using AutoDock Vina at {}", engine.executable().display());

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    let env = BatchEnvironment {
        settings: &settings,
        normalizer: &normalizer,
        engine: &engine,
    };

    println!("Docking {} receptor configuration(s)...", configs.len());
    let summary =
        tokio::task::block_in_place(|| workflows::batch::run(&configs, &env, &reporter))
            .inspect_err(|e| {
                if e.is_precondition() {
                    error!("Batch aborted: a configuration failed its precondition checks.");
                }
            })?;

    for receptor in &summary.receptors {
        for warning in &receptor.warnings {
            println!("⚠ {}: {}", receptor.receptor, warning);
        }
        match (&receptor.status, &receptor.reports) {
            (RunStatus::Ok, Some(reports)) => {
                println!(
                    "✓ {}: {} ligand(s), {} failed. Results: {}",
                    receptor.receptor,
                    receptor.ligands,
                    receptor.failed_ligands,
                    reports.results_csv.display()
                );
                if let Some((ligand, energy)) = &receptor.best_ligand {
                    println!("  Best ligand: {} ({:.1} kcal/mol)", ligand, energy);
                }
            }
            _ => {
                println!("✗ {}: {}", receptor.receptor, receptor.message);
            }
        }
    }

    let failed = summary.failed_receptors();
    if failed > 0 {
        warn!("{} of {} receptor(s) failed.", failed, summary.receptors.len());
    }
    println!("Run history: {}", summary.history.display());

    Ok(())
}
