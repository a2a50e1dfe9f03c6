use crate::core::io::pdbqt::{PDBQT_EXTENSION, has_coordinate_records, molecule_identity};
use crate::engine::config::ToolPaths;
use crate::engine::progress::{Progress, ProgressReporter};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;
use tracing::{info, instrument, warn};

#[derive(Debug, Error)]
pub enum PrepareError {
    #[error("Failed to create output directory '{path}': {source}", path = path.display())]
    OutputDir { path: PathBuf, source: io::Error },
    #[error("Required tool not found: {tool}", tool = tool.display())]
    ToolMissing { tool: PathBuf },
    #[error("Failed to launch '{tool}': {source}", tool = tool.display())]
    ToolLaunch { tool: PathBuf, source: io::Error },
    #[error("'{tool}' failed with {status}: {stderr}", tool = tool.display())]
    ToolFailed {
        tool: PathBuf,
        status: String,
        stderr: String,
    },
    #[error(
        "'{tool}' finished but did not produce '{path}'",
        tool = tool.display(),
        path = path.display()
    )]
    MissingOutput { tool: PathBuf, path: PathBuf },
    #[error("Failed to read '{path}': {source}", path = path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("Failed to write '{path}': {source}", path = path.display())]
    Write { path: PathBuf, source: io::Error },
    #[error("Unsupported ligand format: {}", .0.display())]
    UnsupportedFormat(PathBuf),
    #[error("Invalid ligand name '{0}': names must not contain path separators")]
    InvalidName(String),
}

/// The bucket an input item arrived in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    Receptor,
    Smiles,
    Sdf,
    Mol2,
    Pdbqt,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreparedItem {
    pub source: String,
    pub kind: InputKind,
    pub output: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedItem {
    pub source: String,
    pub kind: InputKind,
    pub reason: String,
}

/// Per-item results of a preparation request. Partial success is normal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PreparationReport {
    pub prepared: Vec<PreparedItem>,
    pub failed: Vec<FailedItem>,
}

impl PreparationReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    fn record(&mut self, source: String, kind: InputKind, result: Result<PathBuf, PrepareError>) {
        match result {
            Ok(output) => {
                info!(%source, output = %output.display(), "Prepared.");
                self.prepared.push(PreparedItem {
                    source,
                    kind,
                    output,
                });
            }
            Err(e) => {
                warn!(%source, error = %e, "Preparation failed.");
                self.failed.push(FailedItem {
                    source,
                    kind,
                    reason: e.to_string(),
                });
            }
        }
    }
}

/// Inputs to convert, grouped by format.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreparationRequest {
    /// Receptor structures in PDB format.
    pub receptors: Vec<PathBuf>,
    /// Text files with one `SMILES [name]` entry per line.
    pub smiles_files: Vec<PathBuf>,
    pub sdf: Vec<PathBuf>,
    pub mol2: Vec<PathBuf>,
    /// Already docking-ready files, copied as they are.
    pub pdbqt: Vec<PathBuf>,
}

impl PreparationRequest {
    pub fn len(&self) -> usize {
        self.receptors.len()
            + self.smiles_files.len()
            + self.sdf.len()
            + self.mol2.len()
            + self.pdbqt.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmilesEntry {
    pub smiles: String,
    pub name: String,
}

/// Parses a SMILES list: one `SMILES [name]` per line, blank lines and `#`
/// comments skipped. Unnamed entries are called `ligand_<line number>`.
pub fn parse_smiles_list(text: &str) -> Vec<SmilesEntry> {
    text.lines()
        .enumerate()
        .filter_map(|(i, line)| {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                return None;
            }
            let mut parts = line.split_whitespace();
            let smiles = parts.next()?.to_string();
            let name = parts
                .next()
                .map(str::to_string)
                .unwrap_or_else(|| format!("ligand_{}", i + 1));
            Some(SmilesEntry { smiles, name })
        })
        .collect()
}

/// Converts receptors and ligands into PDBQT files with external converters.
pub struct MoleculePreparer {
    tools: ToolPaths,
    output_dir: PathBuf,
}

impl MoleculePreparer {
    pub fn new(tools: ToolPaths, output_dir: PathBuf) -> Result<Self, PrepareError> {
        fs::create_dir_all(&output_dir).map_err(|source| PrepareError::OutputDir {
            path: output_dir.clone(),
            source,
        })?;
        Ok(Self { tools, output_dir })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Produces `<stem>_receptor.pdbqt`, adding hydrogens first when `reduce` is configured.
    pub fn prepare_receptor(&self, pdb: &Path) -> Result<PathBuf, PrepareError> {
        let stem = molecule_identity(pdb);
        let input = match &self.tools.reduce {
            Some(reduce) => self.add_hydrogens(reduce, pdb, &stem)?,
            None => pdb.to_path_buf(),
        };
        let output = self.output_dir.join(format!("{}_receptor.pdbqt", stem));
        run_tool(
            &self.tools.mk_prepare_receptor,
            &[
                "-r".as_ref(),
                input.as_os_str(),
                "-o".as_ref(),
                output.as_os_str(),
            ],
        )?;
        expect_output(&self.tools.mk_prepare_receptor, output)
    }

    /// Converts one SMILES string into `<name>.pdbqt`, going through an SDF.
    pub fn prepare_ligand_from_smiles(
        &self,
        smiles: &str,
        name: &str,
    ) -> Result<PathBuf, PrepareError> {
        if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(PrepareError::InvalidName(name.to_string()));
        }
        let sdf = self.output_dir.join(format!("{}.sdf", name));
        run_tool(
            &self.tools.scrub,
            &[smiles.as_ref(), "-o".as_ref(), sdf.as_os_str()],
        )?;
        let sdf = expect_output(&self.tools.scrub, sdf)?;
        self.convert_ligand(&sdf, name)
    }

    /// Converts an SDF or MOL2 file into `<stem>.pdbqt`.
    pub fn prepare_ligand_from_file(&self, input: &Path) -> Result<PathBuf, PrepareError> {
        let supported = input
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| matches!(ext.to_ascii_lowercase().as_str(), "sdf" | "mol2"));
        if !supported {
            return Err(PrepareError::UnsupportedFormat(input.to_path_buf()));
        }
        self.convert_ligand(input, &molecule_identity(input))
    }

    /// Copies an already docking-ready file into the output directory.
    pub fn adopt_pdbqt(&self, input: &Path) -> Result<PathBuf, PrepareError> {
        let content = fs::read_to_string(input).map_err(|source| PrepareError::Read {
            path: input.to_path_buf(),
            source,
        })?;
        if !has_coordinate_records(&content) {
            warn!(
                path = %input.display(),
                "PDBQT file has no ATOM/HETATM records; docking it will fail."
            );
        }
        let output = self
            .output_dir
            .join(format!("{}.{}", molecule_identity(input), PDBQT_EXTENSION));
        if output != input {
            fs::write(&output, content).map_err(|source| PrepareError::Write {
                path: output.clone(),
                source,
            })?;
        }
        Ok(output)
    }

    /// Prepares every item of `request`, never stopping at the first failure.
    #[instrument(skip_all, name = "prepare_workflow")]
    pub fn prepare(
        &self,
        request: &PreparationRequest,
        reporter: &ProgressReporter,
    ) -> PreparationReport {
        let mut report = PreparationReport::default();
        reporter.report(Progress::PhaseStart {
            name: "Preparation".to_string(),
        });

        for pdb in &request.receptors {
            reporter.report(Progress::Message(format!("Preparing receptor {}", pdb.display())));
            report.record(display(pdb), InputKind::Receptor, self.prepare_receptor(pdb));
        }

        for list in &request.smiles_files {
            let text = match fs::read_to_string(list) {
                Ok(text) => text,
                Err(source) => {
                    let e = PrepareError::Read {
                        path: list.clone(),
                        source,
                    };
                    report.record(display(list), InputKind::Smiles, Err(e));
                    continue;
                }
            };
            for entry in parse_smiles_list(&text) {
                reporter.report(Progress::Message(format!("Converting SMILES {}", entry.name)));
                let result = self.prepare_ligand_from_smiles(&entry.smiles, &entry.name);
                report.record(entry.smiles, InputKind::Smiles, result);
            }
        }

        for (files, kind) in [(&request.sdf, InputKind::Sdf), (&request.mol2, InputKind::Mol2)] {
            for file in files {
                reporter.report(Progress::Message(format!("Preparing ligand {}", file.display())));
                report.record(display(file), kind, self.prepare_ligand_from_file(file));
            }
        }

        for file in &request.pdbqt {
            report.record(display(file), InputKind::Pdbqt, self.adopt_pdbqt(file));
        }

        reporter.report(Progress::PhaseFinish);
        info!(
            prepared = report.prepared.len(),
            failed = report.failed.len(),
            "Preparation finished."
        );
        report
    }

    fn convert_ligand(&self, input: &Path, name: &str) -> Result<PathBuf, PrepareError> {
        let output = self.output_dir.join(format!("{}.{}", name, PDBQT_EXTENSION));
        run_tool(
            &self.tools.mk_prepare_ligand,
            &[
                "-i".as_ref(),
                input.as_os_str(),
                "-o".as_ref(),
                output.as_os_str(),
            ],
        )?;
        expect_output(&self.tools.mk_prepare_ligand, output)
    }

    /// `reduce` writes the protonated structure to stdout and exits non-zero for
    /// mere warnings, so its output is judged by content instead of status.
    fn add_hydrogens(
        &self,
        reduce: &Path,
        pdb: &Path,
        stem: &str,
    ) -> Result<PathBuf, PrepareError> {
        let output = Command::new(reduce)
            .arg("-BUILD")
            .arg(pdb)
            .output()
            .map_err(|source| launch_error(reduce, source))?;
        let protonated = String::from_utf8_lossy(&output.stdout);
        if !has_coordinate_records(&protonated) {
            return Err(PrepareError::ToolFailed {
                tool: reduce.to_path_buf(),
                status: status_description(output.status.code()),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        let path = self.output_dir.join(format!("{}_H.pdb", stem));
        fs::write(&path, protonated.as_bytes()).map_err(|source| PrepareError::Write {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}

fn run_tool(tool: &Path, args: &[&std::ffi::OsStr]) -> Result<(), PrepareError> {
    let output = Command::new(tool)
        .args(args)
        .output()
        .map_err(|source| launch_error(tool, source))?;
    if output.status.success() {
        Ok(())
    } else {
        Err(PrepareError::ToolFailed {
            tool: tool.to_path_buf(),
            status: status_description(output.status.code()),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

fn expect_output(tool: &Path, path: PathBuf) -> Result<PathBuf, PrepareError> {
    if path.is_file() {
        Ok(path)
    } else {
        Err(PrepareError::MissingOutput {
            tool: tool.to_path_buf(),
            path,
        })
    }
}

fn launch_error(tool: &Path, source: io::Error) -> PrepareError {
    if source.kind() == io::ErrorKind::NotFound {
        PrepareError::ToolMissing {
            tool: tool.to_path_buf(),
        }
    } else {
        PrepareError::ToolLaunch {
            tool: tool.to_path_buf(),
            source,
        }
    }
}

fn status_description(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exit status {}", code),
        None => "termination by signal".to_string(),
    }
}

fn display(path: &Path) -> String {
    path.display().to_string()
}
