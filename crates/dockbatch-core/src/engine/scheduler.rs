use crate::core::io::pdbqt::molecule_identity;
use crate::core::models::config::RunConfig;
use crate::core::models::records::{LigandOutcome, LigandResult, ReceptorRun};
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::runner::DockingEngine;
use crate::engine::tasks::ligand::{self, LigandContext};
use rayon::prelude::*;
use std::any::Any;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{info, instrument, warn};

/// Runs every ligand task of one receptor on a dedicated worker pool.
pub struct BatchScheduler<'a> {
    engine: &'a dyn DockingEngine,
    reporter: &'a ProgressReporter<'a>,
    default_workers: usize,
}

impl<'a> BatchScheduler<'a> {
    /// `default_workers` bounds the pool when a configuration leaves the worker
    /// count unbounded.
    pub fn new(
        engine: &'a dyn DockingEngine,
        reporter: &'a ProgressReporter<'a>,
        default_workers: usize,
    ) -> Self {
        Self {
            engine,
            reporter,
            default_workers,
        }
    }

    /// Docks every ligand in `ligands` and returns one result per ligand, in
    /// the order given.
    ///
    /// The receptor output directory is wiped and recreated first. Failures of
    /// individual ligands, panics included, are recorded as failed outcomes and
    /// never abort the run.
    #[instrument(skip_all, name = "batch_scheduler", fields(receptor = %config.receptor_name()))]
    pub fn run(
        &self,
        config: &RunConfig,
        ligands: &[PathBuf],
    ) -> Result<ReceptorRun, EngineError> {
        let receptor_dir = config.receptor_dir();
        reset_directory(&receptor_dir)?;

        let workers = config.workers.resolve(self.default_workers);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("dockbatch-worker-{}", i))
            .build()
            .map_err(|e| EngineError::WorkerPool(e.to_string()))?;
        info!(
            ligands = ligands.len(),
            workers, "Dispatching ligand tasks."
        );

        let total = ligands.len() as u64;
        self.reporter.report(Progress::TaskStart { total_steps: total });

        let ctx = LigandContext {
            config,
            receptor_dir: &receptor_dir,
            engine: self.engine,
        };
        let completed = Mutex::new(0u64);

        let mut results: Vec<LigandResult> = pool.install(|| {
            ligands
                .par_iter()
                .enumerate()
                .map(|(index, path)| {
                    let name = molecule_identity(path);
                    let outcome = panic::catch_unwind(AssertUnwindSafe(|| ligand::run(&ctx, path)))
                        .unwrap_or_else(|payload| {
                            let reason = panic_message(payload.as_ref());
                            warn!(ligand = %name, %reason, "Ligand task panicked.");
                            LigandOutcome::failed(format!("Ligand task panicked: {}", reason))
                        });

                    // Reporting under the lock keeps the counter strictly increasing
                    // in the order callbacks observe it.
                    let mut done = completed.lock().unwrap_or_else(|p| p.into_inner());
                    *done += 1;
                    self.reporter.report(Progress::LigandFinished {
                        ligand: name.clone(),
                        completed: *done,
                        total,
                        succeeded: outcome.is_success(),
                    });
                    drop(done);

                    LigandResult {
                        index,
                        ligand: name,
                        outcome,
                    }
                })
                .collect()
        });
        self.reporter.report(Progress::TaskFinish);

        results.sort_by_key(|result| result.index);
        let mut run = ReceptorRun::new(config.receptor_name(), receptor_dir);
        for result in results {
            run.push(result);
        }
        info!(
            failed = run.failed_count(),
            poses = run.pose_count(),
            "Receptor batch finished."
        );
        Ok(run)
    }
}

fn reset_directory(dir: &Path) -> Result<(), EngineError> {
    let to_err = |source| EngineError::OutputDirectory {
        path: dir.to_path_buf(),
        source,
    };
    if dir.exists() {
        fs::remove_dir_all(dir).map_err(to_err)?;
    }
    fs::create_dir_all(dir).map_err(to_err)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
