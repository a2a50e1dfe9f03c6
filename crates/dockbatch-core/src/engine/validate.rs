use crate::core::io::pdbqt::discover_ligands;
use crate::core::models::config::RunConfig;
use crate::engine::error::EngineError;
use crate::engine::runner::DockingEngine;
use std::fs;
use tracing::{debug, info, instrument, warn};

/// Engine versions older than this still work but are noticeably slower.
pub const RECOMMENDED_ENGINE_VERSION: (u32, u32) = (1, 2);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub engine_version: Option<(u32, u32)>,
    pub ligand_count: usize,
    pub warnings: Vec<String>,
}

/// Checks every precondition of a receptor run, collecting all violations.
///
/// The output base directory is created when missing. The error, if any, lists
/// every problem found rather than only the first.
#[instrument(skip_all, fields(receptor = %config.receptor.display()))]
pub fn validate(
    config: &RunConfig,
    engine: &dyn DockingEngine,
) -> Result<ValidationReport, EngineError> {
    let mut errors = Vec::new();
    let mut report = ValidationReport::default();

    if !config.receptor.is_file() {
        errors.push(format!(
            "Receptor file not found (absolute path): {}",
            config.receptor.display()
        ));
    }

    if !config.ligand_dir.is_dir() {
        errors.push(format!(
            "Ligand directory not found (absolute path): {}",
            config.ligand_dir.display()
        ));
    } else {
        match discover_ligands(&config.ligand_dir) {
            Ok(ligands) if ligands.is_empty() => errors.push(format!(
                "No PDBQT files in (absolute path): {}",
                config.ligand_dir.display()
            )),
            Ok(ligands) => report.ligand_count = ligands.len(),
            Err(e) => errors.push(format!(
                "Could not read ligand directory {}: {}",
                config.ligand_dir.display(),
                e
            )),
        }
    }

    if !config.output_base.is_dir() {
        if let Err(e) = fs::create_dir_all(&config.output_base) {
            errors.push(format!(
                "Could not create output directory: {} ({})",
                config.output_base.display(),
                e
            ));
        }
    }

    match engine.probe() {
        Ok(probe) => {
            debug!(banner = %probe.banner, "AutoDock Vina responded.");
            report.engine_version = probe.version;
            if let Some(version) = probe.version {
                if version < RECOMMENDED_ENGINE_VERSION {
                    let message = format!(
                        "Detected AutoDock Vina version {}.{}. \
                         Consider upgrading to Vina >= {}.{} for improved performance.",
                        version.0,
                        version.1,
                        RECOMMENDED_ENGINE_VERSION.0,
                        RECOMMENDED_ENGINE_VERSION.1
                    );
                    warn!("{}", message);
                    report.warnings.push(message);
                }
            }
        }
        Err(reason) => errors.push(reason),
    }

    if errors.is_empty() {
        info!(ligands = report.ligand_count, "Environment validated.");
        Ok(report)
    } else {
        Err(EngineError::Validation(errors))
    }
}
