use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// A scalar value as it arrives in an invocation payload.
///
/// Callers upstream of the normalizer are free to send numbers either as JSON
/// numbers or as strings, so both shapes are accepted here and interpreted later.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawScalar {
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for RawScalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawScalar::Int(value) => write!(f, "{}", value),
            RawScalar::Float(value) => write!(f, "{}", value),
            RawScalar::Text(value) => write!(f, "{}", value),
        }
    }
}

impl From<&str> for RawScalar {
    fn from(value: &str) -> Self {
        RawScalar::Text(value.to_string())
    }
}

impl From<i64> for RawScalar {
    fn from(value: i64) -> Self {
        RawScalar::Int(value)
    }
}

impl From<f64> for RawScalar {
    fn from(value: f64) -> Self {
        RawScalar::Float(value)
    }
}

/// One receptor/ligand-directory configuration exactly as received.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawRunConfig {
    pub receptor: String,
    pub ligand_dir: String,
    pub output_base: String,
    pub center_x: Option<RawScalar>,
    pub center_y: Option<RawScalar>,
    pub center_z: Option<RawScalar>,
    pub size_x: Option<RawScalar>,
    pub size_y: Option<RawScalar>,
    pub size_z: Option<RawScalar>,
    pub exhaustiveness: Option<RawScalar>,
    pub parallel_workers: Option<RawScalar>,
}

impl RawRunConfig {
    pub fn new(receptor: &str, ligand_dir: &str, output_base: &str) -> Self {
        Self {
            receptor: receptor.to_string(),
            ligand_dir: ligand_dir.to_string(),
            output_base: output_base.to_string(),
            ..Default::default()
        }
    }

    /// Best-effort receptor label for messages emitted before normalization succeeds.
    pub fn receptor_label(&self) -> String {
        Path::new(&self.receptor)
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.receptor.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

impl fmt::Display for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}]", self.x, self.y, self.z)
    }
}

/// How many ligand tasks may run at once for a receptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Workers {
    /// No explicit limit; the scheduler sizes itself from the available parallelism.
    Unbounded,
    Fixed(usize),
}

impl Workers {
    pub fn count(self) -> Option<usize> {
        match self {
            Workers::Unbounded => None,
            Workers::Fixed(n) => Some(n),
        }
    }

    pub fn resolve(self, default_bound: usize) -> usize {
        match self {
            Workers::Unbounded => default_bound.max(1),
            Workers::Fixed(n) => n.max(1),
        }
    }
}

impl fmt::Display for Workers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Workers::Unbounded => write!(f, "unbounded"),
            Workers::Fixed(n) => write!(f, "{}", n),
        }
    }
}

/// A normalized run configuration: absolute paths and typed docking parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub receptor: PathBuf,
    pub ligand_dir: PathBuf,
    pub output_base: PathBuf,
    pub center: Vec3,
    pub size: Vec3,
    pub exhaustiveness: u32,
    pub workers: Workers,
}

impl RunConfig {
    pub fn receptor_name(&self) -> String {
        self.receptor
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.receptor.to_string_lossy().into_owned())
    }

    /// The directory holding every artifact of this receptor's batch.
    pub fn receptor_dir(&self) -> PathBuf {
        self.output_base.join(self.receptor_name())
    }
}
