use crate::core::models::records::{
    ERROR_MODE, LigandOutcome, LigandResult, NOT_APPLICABLE, ReceptorRun,
};
use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

const BANNER_WIDTH: usize = 60;
const TABLE_RULE_WIDTH: usize = 50;

const RESULTS_HEADER: [&str; 5] = ["Ligand", "Mode", "Energy (kcal/mol)", "Protein", "Error"];
const EXTRA_HEADER: [&str; 4] = ["Ligand", "Mode", "RMSD lower", "RMSD upper"];

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to create report directory '{path}': {source}", path = path.display())]
    Directory { path: PathBuf, source: io::Error },
    #[error("Failed to write CSV report '{path}': {source}", path = path.display())]
    Csv { path: PathBuf, source: csv::Error },
    #[error("Failed to write report '{path}': {source}", path = path.display())]
    Io { path: PathBuf, source: io::Error },
}

/// Locations of the three reports written for a receptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    pub results_csv: PathBuf,
    pub extra_csv: PathBuf,
    pub narrative: PathBuf,
}

impl ReportPaths {
    pub fn for_receptor(output_dir: &Path, receptor: &str) -> Self {
        Self {
            results_csv: output_dir.join(format!("{}_results.csv", receptor)),
            extra_csv: output_dir.join(format!("{}_extra.csv", receptor)),
            narrative: output_dir.join(format!("{}_results.txt", receptor)),
        }
    }
}

/// Writes the energy table, the RMSD table and the narrative report for `run`.
///
/// Output depends only on `run`: rows follow ligand discovery order, so writing
/// the same run twice produces identical files.
pub fn write_reports(run: &ReceptorRun) -> Result<ReportPaths, ReportError> {
    fs::create_dir_all(&run.output_dir).map_err(|source| ReportError::Directory {
        path: run.output_dir.clone(),
        source,
    })?;

    let paths = ReportPaths::for_receptor(&run.output_dir, &run.receptor);
    let ordered = run.ordered();

    write_csv(&paths.results_csv, &RESULTS_HEADER, results_rows(run, &ordered))?;
    info!(path = %paths.results_csv.display(), "Results CSV written.");

    write_csv(&paths.extra_csv, &EXTRA_HEADER, extra_rows(&ordered))?;
    info!(path = %paths.extra_csv.display(), "RMSD CSV written.");

    fs::write(&paths.narrative, render_narrative(run)).map_err(|source| ReportError::Io {
        path: paths.narrative.clone(),
        source,
    })?;
    info!(path = %paths.narrative.display(), "Narrative report written.");

    Ok(paths)
}

fn results_rows<'a>(run: &'a ReceptorRun, ordered: &[&'a LigandResult]) -> Vec<Vec<&'a str>> {
    let mut rows = Vec::new();
    for result in ordered {
        match &result.outcome {
            LigandOutcome::Docked { poses, .. } => {
                for pose in poses {
                    rows.push(vec![
                        result.ligand.as_str(),
                        pose.mode.as_str(),
                        pose.energy.as_str(),
                        run.receptor.as_str(),
                        "",
                    ]);
                }
            }
            LigandOutcome::Failed { reason } => rows.push(vec![
                result.ligand.as_str(),
                ERROR_MODE,
                NOT_APPLICABLE,
                run.receptor.as_str(),
                reason.as_str(),
            ]),
        }
    }
    rows
}

fn extra_rows<'a>(ordered: &[&'a LigandResult]) -> Vec<Vec<&'a str>> {
    let mut rows = Vec::new();
    for result in ordered {
        match &result.outcome {
            LigandOutcome::Docked { poses, .. } => {
                for pose in poses {
                    rows.push(vec![
                        result.ligand.as_str(),
                        pose.mode.as_str(),
                        pose.rmsd_lower.as_str(),
                        pose.rmsd_upper.as_str(),
                    ]);
                }
            }
            LigandOutcome::Failed { .. } => rows.push(vec![
                result.ligand.as_str(),
                ERROR_MODE,
                NOT_APPLICABLE,
                NOT_APPLICABLE,
            ]),
        }
    }
    rows
}

fn write_csv(path: &Path, header: &[&str], rows: Vec<Vec<&str>>) -> Result<(), ReportError> {
    let csv_err = |source| ReportError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(csv_err)?;
    writer.write_record(header).map_err(csv_err)?;
    for row in rows {
        writer.write_record(&row).map_err(csv_err)?;
    }
    writer.flush().map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Human-readable report: poses grouped under one header per ligand.
pub fn render_narrative(run: &ReceptorRun) -> String {
    let banner = "=".repeat(BANNER_WIDTH);
    let mut out = String::new();
    let _ = writeln!(out, "{}", banner);
    let _ = writeln!(out, "Docking Results - {}", run.receptor);
    let _ = writeln!(out, "{}", banner);
    let _ = writeln!(out);

    for result in run.ordered() {
        let _ = writeln!(out);
        let _ = writeln!(out, "▶ Ligand: {}", result.ligand);
        let _ = writeln!(out, "| mode | affinity | dist from best mode |");
        let _ = writeln!(out, "{}", "-".repeat(TABLE_RULE_WIDTH));
        match &result.outcome {
            LigandOutcome::Docked { poses, .. } => {
                for pose in poses {
                    let _ = writeln!(out, "{}  {}    {}", pose.mode, pose.energy, pose.rmsd_lower);
                }
            }
            LigandOutcome::Failed { reason } => {
                let _ = writeln!(out, "⚠ Error: {}", reason);
            }
        }
    }
    out
}
