use crate::core::io::pdbqt::{self, PdbqtError};
use crate::core::io::vina::parse_energy_table;
use crate::core::models::config::RunConfig;
use crate::core::models::records::LigandOutcome;
use crate::engine::runner::{DockingEngine, DockingJob, EngineOutput};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, instrument, warn};

pub const STDOUT_CAPTURE: &str = "vina_output.txt";
pub const STDERR_CAPTURE: &str = "vina_stderr.txt";

/// Shared, read-only inputs of every ligand task of one receptor.
pub struct LigandContext<'a> {
    pub config: &'a RunConfig,
    pub receptor_dir: &'a Path,
    pub engine: &'a dyn DockingEngine,
}

#[derive(Debug, Error)]
enum TaskError {
    #[error("Could not create ligand output directory '{path}': {source}", path = path.display())]
    OutputDir { path: PathBuf, source: io::Error },
    #[error("Could not read ligand file '{path}': {source}", path = path.display())]
    Unreadable { path: PathBuf, source: io::Error },
    #[error("Empty .pdbqt file or no ATOM/HETATM lines")]
    NoCoordinates,
    #[error("Could not launch AutoDock Vina: {0}")]
    Launch(io::Error),
    #[error("AutoDock Vina failed with {status}: {stderr}")]
    EngineFailed { status: String, stderr: String },
    #[error("Could not save engine output '{path}': {source}", path = path.display())]
    Capture { path: PathBuf, source: io::Error },
    #[error(transparent)]
    Split(#[from] PdbqtError),
}

/// Docks one ligand against the receptor of `ctx` and returns its outcome.
#[instrument(skip_all, fields(ligand = %pdbqt::molecule_identity(ligand)))]
pub fn run(ctx: &LigandContext, ligand: &Path) -> LigandOutcome {
    match dock(ctx, ligand) {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!(error = %e, "Ligand failed.");
            LigandOutcome::failed(e.to_string())
        }
    }
}

fn dock(ctx: &LigandContext, ligand: &Path) -> Result<LigandOutcome, TaskError> {
    let stem = pdbqt::molecule_identity(ligand);
    let ligand_dir = ctx.receptor_dir.join(&stem);
    fs::create_dir_all(&ligand_dir).map_err(|source| TaskError::OutputDir {
        path: ligand_dir.clone(),
        source,
    })?;

    let content = fs::read_to_string(ligand).map_err(|source| TaskError::Unreadable {
        path: ligand.to_path_buf(),
        source,
    })?;
    if !pdbqt::has_coordinate_records(&content) {
        return Err(TaskError::NoCoordinates);
    }

    let job = DockingJob {
        receptor: ctx.config.receptor.clone(),
        ligand: ligand.to_path_buf(),
        center: ctx.config.center,
        size: ctx.config.size,
        exhaustiveness: ctx.config.exhaustiveness,
        output: ligand_dir.join(format!("{}_docked.pdbqt", stem)),
    };
    let output = ctx.engine.dock(&job).map_err(TaskError::Launch)?;
    write_captures(&ligand_dir, &output)?;

    if !output.success() {
        return Err(TaskError::EngineFailed {
            status: output.status_description(),
            stderr: output.stderr.trim().to_string(),
        });
    }

    let poses = parse_energy_table(&output.stdout);
    let model_files = pdbqt::split_models(&job.output)?;
    debug!(
        poses = poses.len(),
        models = model_files.len(),
        "Ligand docked."
    );
    Ok(LigandOutcome::Docked { poses, model_files })
}

fn write_captures(dir: &Path, output: &EngineOutput) -> Result<(), TaskError> {
    for (name, text) in [
        (STDOUT_CAPTURE, &output.stdout),
        (STDERR_CAPTURE, &output.stderr),
    ] {
        let path = dir.join(name);
        fs::write(&path, text).map_err(|source| TaskError::Capture { path, source })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::config::{Vec3, Workers};
    use crate::core::models::records::PoseRecord;
    use crate::engine::runner::EngineProbe;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::{TempDir, tempdir};

    const STDOUT: &str = "\
mode |   affinity | dist from best mode
     | (kcal/mol) | rmsd l.b.| rmsd u.b.
-----+------------+----------+----------
   1       -7.2          0          0
   2       -6.8      1.912      2.533
";

    const DOCKED: &str = "\
MODEL 1
REMARK VINA RESULT:    -7.2      0.000      0.000
ATOM      1  C   UNL     1       1.000   2.000   3.000  0.00  0.00    +0.000 C
ENDMDL
MODEL 2
REMARK VINA RESULT:    -6.8      1.912      2.533
ATOM      1  C   UNL     1       1.500   2.500   3.500  0.00  0.00    +0.000 C
ENDMDL
";

    struct FakeVina {
        exit_code: Option<i32>,
        calls: AtomicUsize,
    }

    impl FakeVina {
        fn exiting_with(exit_code: Option<i32>) -> Self {
            Self {
                exit_code,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl DockingEngine for FakeVina {
        fn dock(&self, job: &DockingJob) -> io::Result<EngineOutput> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.exit_code == Some(0) {
                fs::write(&job.output, DOCKED)?;
            }
            Ok(EngineOutput {
                stdout: STDOUT.to_string(),
                stderr: "warning: something odd\n".to_string(),
                exit_code: self.exit_code,
            })
        }

        fn probe(&self) -> Result<EngineProbe, String> {
            Ok(EngineProbe {
                banner: "AutoDock Vina v1.2.5".into(),
                version: Some((1, 2)),
            })
        }
    }

    struct Fixture {
        dir: TempDir,
        config: RunConfig,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempdir().unwrap();
            fs::create_dir(dir.path().join("ligands")).unwrap();
            let config = RunConfig {
                receptor: dir.path().join("rec.pdbqt"),
                ligand_dir: dir.path().join("ligands"),
                output_base: dir.path().join("out"),
                center: Vec3::new(0.0, 0.0, 0.0),
                size: Vec3::new(20.0, 20.0, 20.0),
                exhaustiveness: 8,
                workers: Workers::Unbounded,
            };
            Self { dir, config }
        }

        fn ligand(&self, name: &str, content: &str) -> PathBuf {
            let path = self.dir.path().join("ligands").join(name);
            fs::write(&path, content).unwrap();
            path
        }

        fn run(&self, engine: &dyn DockingEngine, ligand: &Path) -> LigandOutcome {
            let receptor_dir = self.config.receptor_dir();
            let ctx = LigandContext {
                config: &self.config,
                receptor_dir: &receptor_dir,
                engine,
            };
            run(&ctx, ligand)
        }
    }

    #[test]
    fn successful_docking_yields_poses_and_model_files() {
        let fx = Fixture::new();
        let ligand = fx.ligand("aspirin.pdbqt", "ATOM      1  C\n");
        let engine = FakeVina::exiting_with(Some(0));

        let outcome = fx.run(&engine, &ligand);

        let LigandOutcome::Docked { poses, model_files } = outcome else {
            panic!("expected a docked outcome");
        };
        assert_eq!(
            poses,
            vec![
                PoseRecord::new("1", "-7.2", "0", "0"),
                PoseRecord::new("2", "-6.8", "1.912", "2.533"),
            ]
        );
        let ligand_dir = fx.dir.path().join("out/rec/aspirin");
        assert_eq!(
            model_files,
            vec![
                ligand_dir.join("aspirin_docked_model_1.pdb"),
                ligand_dir.join("aspirin_docked_model_2.pdb"),
            ]
        );
        assert_eq!(
            fs::read_to_string(ligand_dir.join(STDOUT_CAPTURE)).unwrap(),
            STDOUT
        );
        assert_eq!(
            fs::read_to_string(ligand_dir.join(STDERR_CAPTURE)).unwrap(),
            "warning: something odd\n"
        );
    }

    #[test]
    fn ligand_without_coordinates_never_reaches_the_engine() {
        let fx = Fixture::new();
        let ligand = fx.ligand("bad.pdbqt", "REMARK nothing here\n");
        let engine = FakeVina::exiting_with(Some(0));

        let outcome = fx.run(&engine, &ligand);

        assert_eq!(
            outcome.failure_reason(),
            Some("Empty .pdbqt file or no ATOM/HETATM lines")
        );
        assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unreadable_ligand_is_a_failure() {
        let fx = Fixture::new();
        let missing = fx.dir.path().join("ligands/ghost.pdbqt");
        let engine = FakeVina::exiting_with(Some(0));

        let outcome = fx.run(&engine, &missing);

        assert!(
            outcome
                .failure_reason()
                .unwrap()
                .starts_with("Could not read ligand file")
        );
        assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn non_zero_exit_is_a_failure_but_captures_are_kept() {
        let fx = Fixture::new();
        let ligand = fx.ligand("a.pdbqt", "HETATM    1  C\n");
        let engine = FakeVina::exiting_with(Some(1));

        let outcome = fx.run(&engine, &ligand);

        assert_eq!(
            outcome.failure_reason(),
            Some("AutoDock Vina failed with exit status 1: warning: something odd")
        );
        assert!(fx.dir.path().join("out/rec/a").join(STDERR_CAPTURE).is_file());
    }

    #[test]
    fn missing_docked_output_is_a_failure() {
        struct SilentVina;
        impl DockingEngine for SilentVina {
            fn dock(&self, _job: &DockingJob) -> io::Result<EngineOutput> {
                Ok(EngineOutput {
                    stdout: STDOUT.to_string(),
                    stderr: String::new(),
                    exit_code: Some(0),
                })
            }
            fn probe(&self) -> Result<EngineProbe, String> {
                Err("unused".into())
            }
        }

        let fx = Fixture::new();
        let ligand = fx.ligand("a.pdbqt", "ATOM      1  C\n");

        let outcome = fx.run(&SilentVina, &ligand);

        assert!(outcome.failure_reason().unwrap().starts_with("Failed to read"));
    }
}
