use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

const AFTER_HELP: &str = "\
Example:
  dockbatch '{\"receptor\": \"1abc.pdbqt\", \"ligand_dir\": \"ligands\", \"output_base\": \"results\", \"exhaustiveness\": 16}'";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "dockbatch - Batch docking of ligand libraries against receptors with AutoDock Vina.",
    help_template = HELP_TEMPLATE,
    after_help = AFTER_HELP,
    args_conflicts_with_subcommands = true,
)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Run configuration as JSON: one object, or an array of objects docked in order.
    #[arg(value_name = "CONFIG_JSON")]
    pub config_json: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Number of concurrent docking jobs for configurations that do not set
    /// `parallel_workers`. Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub workers: Option<usize>,

    /// AutoDock Vina executable.
    #[arg(long, env = "VINA_PATH", global = true, value_name = "PATH")]
    pub vina: Option<PathBuf>,

    /// Working directory holding the run history.
    #[arg(long, env = "WORKDIR", global = true, value_name = "PATH")]
    pub workdir: Option<PathBuf>,

    /// Settings file in TOML format (tool paths, working directory, worker count).
    #[arg(long, global = true, value_name = "PATH")]
    pub settings: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert receptors and ligands into docking-ready PDBQT files.
    Prepare(PrepareArgs),
}

/// Arguments for the `prepare` subcommand.
#[derive(Args, Debug)]
pub struct PrepareArgs {
    /// Directory receiving the prepared files.
    #[arg(short, long, required = true, value_name = "DIR")]
    pub output_dir: PathBuf,

    // --- Receptors ---
    /// Download a receptor from the RCSB PDB by its 4-character identifier.
    #[arg(long = "pdb-id", value_name = "CODE")]
    pub pdb_ids: Vec<String>,

    /// Receptor structure in PDB format.
    #[arg(short, long = "receptor", value_name = "PATH")]
    pub receptors: Vec<PathBuf>,

    /// Add hydrogens to receptors with this `reduce` executable before conversion.
    #[arg(long, value_name = "PATH")]
    pub reduce: Option<PathBuf>,

    // --- Ligands ---
    /// Text file with one `SMILES [name]` entry per line.
    #[arg(long = "smiles", value_name = "PATH")]
    pub smiles_files: Vec<PathBuf>,

    /// Ligand in SDF format.
    #[arg(long, value_name = "PATH")]
    pub sdf: Vec<PathBuf>,

    /// Ligand in MOL2 format.
    #[arg(long, value_name = "PATH")]
    pub mol2: Vec<PathBuf>,

    /// Ligand that is already in PDBQT format; copied as is.
    #[arg(long, value_name = "PATH")]
    pub pdbqt: Vec<PathBuf>,

    /// Exit with an error if any item fails to prepare.
    #[arg(long)]
    pub strict: bool,
}
