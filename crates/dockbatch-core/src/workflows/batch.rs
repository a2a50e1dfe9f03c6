use crate::core::io::history::{HistoryEntry, RunHistory, RunStatus};
use crate::core::io::pdbqt::{discover_ligands, molecule_identity};
use crate::core::io::reports::{ReportPaths, write_reports};
use crate::core::models::config::{RawRunConfig, RunConfig};
use crate::engine::config::EngineSettings;
use crate::engine::error::EngineError;
use crate::engine::normalize::ConfigNormalizer;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::runner::DockingEngine;
use crate::engine::scheduler::BatchScheduler;
use crate::engine::validate::validate;
use chrono::{Local, NaiveDateTime};
use std::path::PathBuf;
use tracing::{error, info, instrument};

/// Collaborators shared by every receptor of a batch.
pub struct BatchEnvironment<'a> {
    pub settings: &'a EngineSettings,
    pub normalizer: &'a ConfigNormalizer,
    pub engine: &'a dyn DockingEngine,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReceptorSummary {
    pub receptor: String,
    pub status: RunStatus,
    pub ligands: usize,
    pub failed_ligands: usize,
    /// Lowest-energy ligand of the receptor and its best binding energy in kcal/mol.
    pub best_ligand: Option<(String, f64)>,
    /// Non-fatal findings of the precondition checks.
    pub warnings: Vec<String>,
    /// Present only when the reports were written.
    pub reports: Option<ReportPaths>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchSummary {
    pub receptors: Vec<ReceptorSummary>,
    pub history: PathBuf,
}

impl BatchSummary {
    pub fn failed_receptors(&self) -> usize {
        self.receptors
            .iter()
            .filter(|r| r.status == RunStatus::Error)
            .count()
    }
}

/// Docks every configuration in turn, one receptor at a time.
///
/// A receptor whose scheduling or reporting fails is recorded as an `Error`
/// row in the run history and the batch moves on. A configuration that fails
/// normalization or validation is recorded the same way, but then ends the
/// batch with that error.
#[instrument(skip_all, name = "batch_workflow")]
pub fn run(
    configs: &[RawRunConfig],
    env: &BatchEnvironment,
    reporter: &ProgressReporter,
) -> Result<BatchSummary, EngineError> {
    let history = RunHistory::in_working_root(&env.settings.working_root);
    info!(
        configurations = configs.len(),
        history = %history.path().display(),
        "Starting docking batch."
    );

    let mut receptors = Vec::with_capacity(configs.len());
    for raw in configs {
        reporter.report(Progress::PhaseStart {
            name: format!("Receptor {}", raw.receptor_label()),
        });
        let summary = run_receptor(raw, env, reporter, &history)?;
        reporter.report(Progress::PhaseFinish);
        receptors.push(summary);
    }

    let summary = BatchSummary {
        receptors,
        history: history.path().to_path_buf(),
    };
    info!(
        receptors = summary.receptors.len(),
        failed = summary.failed_receptors(),
        "Docking batch complete."
    );
    Ok(summary)
}

fn run_receptor(
    raw: &RawRunConfig,
    env: &BatchEnvironment,
    reporter: &ProgressReporter,
    history: &RunHistory,
) -> Result<ReceptorSummary, EngineError> {
    let started_at = Local::now().naive_local();

    let config = match env.normalizer.normalize(raw) {
        Ok(config) => config,
        Err(e) => {
            history.append(&HistoryEntry {
                started_at,
                receptor: raw.receptor.clone(),
                ligands: Vec::new(),
                exhaustiveness: None,
                workers: None,
                output_dir: PathBuf::from(&raw.output_base),
                status: RunStatus::Error,
                observations: e.to_string(),
            })?;
            return Err(e);
        }
    };

    let validation = match validate(&config, env.engine) {
        Ok(validation) => validation,
        Err(e) => {
            let failed = entry(&config, started_at, Vec::new(), RunStatus::Error, e.to_string());
            history.append(&failed)?;
            return Err(e);
        }
    };
    for warning in &validation.warnings {
        reporter.report(Progress::Message(warning.clone()));
    }

    let receptor = config.receptor_name();
    info!(
        %receptor,
        ligands = validation.ligand_count,
        engine_version = ?validation.engine_version,
        "Preconditions satisfied."
    );
    let (ligands, outcome) = match discover_ligands(&config.ligand_dir) {
        Ok(ligands) => {
            let scheduler = BatchScheduler::new(env.engine, reporter, env.settings.default_workers);
            let outcome = scheduler.run(&config, &ligands).and_then(|run| {
                let best = run
                    .best_ligand()
                    .map(|(ligand, energy)| (ligand.to_string(), energy));
                Ok((write_reports(&run)?, run.failed_count(), best))
            });
            (ligands, outcome)
        }
        Err(source) => (
            Vec::new(),
            Err(EngineError::LigandDiscovery {
                path: config.ligand_dir.clone(),
                source,
            }),
        ),
    };
    let names: Vec<String> = ligands.iter().map(|path| molecule_identity(path)).collect();
    let ligand_count = names.len();

    let summary = match outcome {
        Ok((reports, failed_ligands, best_ligand)) => {
            let message = format!("Execution completed successfully for {}", receptor);
            history.append(&entry(&config, started_at, names, RunStatus::Ok, message.clone()))?;
            info!(%receptor, ligands = ligand_count, failed_ligands, "Receptor completed.");
            ReceptorSummary {
                receptor,
                status: RunStatus::Ok,
                ligands: ligand_count,
                failed_ligands,
                best_ligand,
                warnings: validation.warnings,
                reports: Some(reports),
                message,
            }
        }
        Err(e) => {
            let message = format!("{} (config: {})", e, receptor);
            history.append(&entry(&config, started_at, names, RunStatus::Error, message.clone()))?;
            error!(
                %receptor,
                error = %e,
                "Receptor failed; continuing with the next configuration."
            );
            reporter.report(Progress::Message(format!("Error in {}: {}", receptor, e)));
            ReceptorSummary {
                receptor,
                status: RunStatus::Error,
                ligands: ligand_count,
                failed_ligands: 0,
                best_ligand: None,
                warnings: validation.warnings,
                reports: None,
                message,
            }
        }
    };
    Ok(summary)
}

fn entry(
    config: &RunConfig,
    started_at: NaiveDateTime,
    ligands: Vec<String>,
    status: RunStatus,
    observations: String,
) -> HistoryEntry {
    HistoryEntry {
        started_at,
        receptor: config.receptor.display().to_string(),
        ligands,
        exhaustiveness: Some(config.exhaustiveness),
        workers: config.workers.count(),
        output_dir: config.output_base.clone(),
        status,
        observations,
    }
}
