use crate::core::io::vina::parse_version;
use crate::core::models::config::Vec3;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

/// Upper bound on each `--version` / `--help` availability call.
pub const DEFAULT_AVAILABILITY_TIMEOUT: Duration = Duration::from_secs(5);

const AVAILABILITY_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Everything the docking engine needs to dock one ligand.
#[derive(Debug, Clone, PartialEq)]
pub struct DockingJob {
    pub receptor: PathBuf,
    pub ligand: PathBuf,
    pub center: Vec3,
    pub size: Vec3,
    pub exhaustiveness: u32,
    pub output: PathBuf,
}

impl DockingJob {
    /// Command-line flags understood by AutoDock Vina.
    pub fn arguments(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::with_capacity(20);
        let mut flag = |name: &str, value: OsString| {
            args.push(OsString::from(name));
            args.push(value);
        };
        flag("--receptor", self.receptor.clone().into_os_string());
        flag("--ligand", self.ligand.clone().into_os_string());
        flag("--center_x", self.center.x.to_string().into());
        flag("--center_y", self.center.y.to_string().into());
        flag("--center_z", self.center.z.to_string().into());
        flag("--size_x", self.size.x.to_string().into());
        flag("--size_y", self.size.y.to_string().into());
        flag("--size_z", self.size.z.to_string().into());
        flag("--exhaustiveness", self.exhaustiveness.to_string().into());
        flag("--out", self.output.clone().into_os_string());
        args
    }
}

/// Raw result of one engine invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
}

impl EngineOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    pub fn status_description(&self) -> String {
        match self.exit_code {
            Some(code) => format!("exit status {}", code),
            None => "termination by signal".to_string(),
        }
    }
}

impl From<Output> for EngineOutput {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
        }
    }
}

/// What an availability check learned about the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineProbe {
    pub banner: String,
    pub version: Option<(u32, u32)>,
}

/// The boundary to the external docking program.
///
/// Implementations submit a job and hand back its raw text and exit status; all
/// interpretation of that text happens on this side of the boundary.
pub trait DockingEngine: Send + Sync {
    /// Runs one docking job to completion. `Err` means the engine could not be launched.
    fn dock(&self, job: &DockingJob) -> io::Result<EngineOutput>;

    /// Checks that the engine can be invoked. `Err` carries a human-readable reason.
    fn probe(&self) -> Result<EngineProbe, String>;
}

/// AutoDock Vina invoked as a subprocess.
#[derive(Debug, Clone)]
pub struct VinaEngine {
    executable: PathBuf,
    availability_timeout: Duration,
}

impl VinaEngine {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            availability_timeout: DEFAULT_AVAILABILITY_TIMEOUT,
        }
    }

    pub fn with_availability_timeout(mut self, timeout: Duration) -> Self {
        self.availability_timeout = timeout;
        self
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Runs the engine with a single informational flag, killing it once the
    /// availability timeout elapses. Docking runs are never bounded this way.
    fn invoke(&self, flag: &str) -> io::Result<Output> {
        let mut child = Command::new(&self.executable)
            .arg(flag)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let deadline = Instant::now() + self.availability_timeout;
        while child.try_wait()?.is_none() {
            if Instant::now() >= deadline {
                let _ = child.kill();
                let _ = child.wait();
                return Err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!(
                        "{} {} did not respond within {:.1}s",
                        self.executable.display(),
                        flag,
                        self.availability_timeout.as_secs_f64()
                    ),
                ));
            }
            thread::sleep(AVAILABILITY_POLL_INTERVAL);
        }
        child.wait_with_output()
    }

    fn not_found(&self) -> String {
        format!("AutoDock Vina not found at: {}", self.executable.display())
    }
}

impl DockingEngine for VinaEngine {
    fn dock(&self, job: &DockingJob) -> io::Result<EngineOutput> {
        debug!(
            executable = %self.executable.display(),
            ligand = %job.ligand.display(),
            "Launching docking engine."
        );
        let output = Command::new(&self.executable)
            .args(job.arguments())
            .output()?;
        Ok(output.into())
    }

    fn probe(&self) -> Result<EngineProbe, String> {
        // Older builds lack --version, so --help is tried before giving up.
        let output = match self.invoke("--version") {
            Ok(out) if out.status.success() => out,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(self.not_found()),
            _ => match self.invoke("--help") {
                Ok(out) if out.status.success() => out,
                Ok(_) => {
                    return Err(format!(
                        "AutoDock Vina is not available at: {}",
                        self.executable.display()
                    ));
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(self.not_found()),
                Err(e) => return Err(format!("Error checking AutoDock Vina: {}", e)),
            },
        };

        let output = EngineOutput::from(output);
        let banner = if output.stdout.trim().is_empty() {
            output.stderr
        } else {
            output.stdout
        };
        Ok(EngineProbe {
            version: parse_version(&banner),
            banner: banner.trim().to_string(),
        })
    }
}
