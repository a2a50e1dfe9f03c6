use crate::cli::Cli;
use crate::error::{CliError, Result};
use directories::ProjectDirs;
use dockbatch::engine::config::{self as core_config, EngineSettings, ToolPaths};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

const SETTINGS_FILE_NAME: &str = "settings.toml";

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialToolPaths {
    mk_prepare_receptor: Option<PathBuf>,
    mk_prepare_ligand: Option<PathBuf>,
    scrub: Option<PathBuf>,
    reduce: Option<PathBuf>,
}

/// Settings as read from the TOML file; every field may be absent.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct PartialSettings {
    vina_path: Option<PathBuf>,
    working_root: Option<PathBuf>,
    default_workers: Option<usize>,
    tools: Option<PartialToolPaths>,
}

impl PartialSettings {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading settings from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Reads `explicit` when given; otherwise the per-user settings file if it
    /// exists, or empty settings.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match default_settings_path() {
            Some(path) if path.is_file() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Command-line flags (and their environment variables) win over the file;
    /// the file wins over built-in defaults.
    pub fn merge_with_cli(&self, cli: &Cli) -> Result<EngineSettings> {
        let working_root = match cli.workdir.clone().or_else(|| self.working_root.clone()) {
            Some(root) => root,
            None => default_working_root()?,
        };

        let mut builder = core_config::EngineSettingsBuilder::new().working_root(working_root);
        if let Some(vina) = cli.vina.clone().or_else(|| self.vina_path.clone()) {
            builder = builder.vina_path(vina);
        }
        if let Some(workers) = cli.workers.or(self.default_workers) {
            builder = builder.default_workers(workers);
        }
        builder.build().map_err(|e| CliError::Config(e.to_string()))
    }

    /// Converter locations, with `reduce` taken from the command line when given.
    pub fn tool_paths(&self, reduce_override: Option<PathBuf>) -> ToolPaths {
        let tools = self.tools.clone().unwrap_or_default();
        let defaults = ToolPaths::default();
        ToolPaths {
            mk_prepare_receptor: tools
                .mk_prepare_receptor
                .unwrap_or(defaults.mk_prepare_receptor),
            mk_prepare_ligand: tools
                .mk_prepare_ligand
                .unwrap_or(defaults.mk_prepare_ligand),
            scrub: tools.scrub.unwrap_or(defaults.scrub),
            reduce: reduce_override.or(tools.reduce),
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("org", "dockbatch", "dockbatch")
}

fn default_settings_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(SETTINGS_FILE_NAME))
}

fn default_working_root() -> Result<PathBuf> {
    project_dirs()
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| {
            CliError::Config(
                "Could not determine a default working directory; pass --workdir or set WORKDIR."
                    .to_string(),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write_settings(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join(SETTINGS_FILE_NAME);
        fs::write(&path, content).unwrap();
        path
    }

    /// Built directly so that VINA_PATH / WORKDIR in the test environment cannot leak in.
    fn cli(workdir: Option<&str>, workers: Option<usize>, vina: Option<&str>) -> Cli {
        Cli {
            config_json: Some("{}".to_string()),
            command: None,
            verbose: 0,
            quiet: false,
            log_file: None,
            workers,
            vina: vina.map(PathBuf::from),
            workdir: workdir.map(PathBuf::from),
            settings: None,
        }
    }

    #[test]
    fn settings_file_values_are_used_when_cli_is_silent() {
        let dir = tempdir().unwrap();
        let path = write_settings(
            dir.path(),
            r#"
            vina-path = "/opt/vina/bin/vina"
            working-root = "/srv/docking"
            default-workers = 6

            [tools]
            scrub = "/opt/meeko/scrub.py"
            reduce = "/usr/bin/reduce"
            "#,
        );
        let settings = PartialSettings::from_file(&path).unwrap();
        let cli = cli(None, None, None);

        let engine = settings.merge_with_cli(&cli).unwrap();
        assert_eq!(engine.working_root, PathBuf::from("/srv/docking"));
        assert_eq!(engine.default_workers, 6);
        assert_eq!(engine.vina_path, PathBuf::from("/opt/vina/bin/vina"));

        let tools = settings.tool_paths(None);
        assert_eq!(tools.scrub, PathBuf::from("/opt/meeko/scrub.py"));
        assert_eq!(tools.mk_prepare_ligand, PathBuf::from("mk_prepare_ligand.py"));
        assert_eq!(tools.reduce, Some(PathBuf::from("/usr/bin/reduce")));
    }

    #[test]
    fn cli_flags_override_the_settings_file() {
        let dir = tempdir().unwrap();
        let path = write_settings(
            dir.path(),
            r#"
            working-root = "/srv/docking"
            default-workers = 6
            "#,
        );
        let settings = PartialSettings::from_file(&path).unwrap();
        let cli = cli(Some("/tmp/work"), Some(2), Some("/usr/local/bin/vina"));

        let engine = settings.merge_with_cli(&cli).unwrap();
        assert_eq!(engine.working_root, PathBuf::from("/tmp/work"));
        assert_eq!(engine.default_workers, 2);
        assert_eq!(engine.vina_path, PathBuf::from("/usr/local/bin/vina"));

        let tools = settings.tool_paths(Some(PathBuf::from("/bin/reduce")));
        assert_eq!(tools.reduce, Some(PathBuf::from("/bin/reduce")));
    }

    #[test]
    fn zero_workers_is_a_configuration_error() {
        let cli = cli(Some("/tmp/work"), Some(0), None);
        let result = PartialSettings::default().merge_with_cli(&cli);
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempdir().unwrap();
        let path = write_settings(dir.path(), "vina = \"typo\"\n");
        let result = PartialSettings::from_file(&path);
        assert!(matches!(result, Err(CliError::FileParsing { .. })));
    }

    #[test]
    fn explicit_missing_settings_file_is_an_error() {
        let dir = tempdir().unwrap();
        let result = PartialSettings::load(Some(&dir.path().join("absent.toml")));
        assert!(matches!(result, Err(CliError::Io(_))));
    }
}
