use crate::core::models::config::{RawRunConfig, RawScalar, RunConfig, Vec3, Workers};
use crate::core::utils::paths::resolve_path;
use crate::engine::error::EngineError;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_CENTER: f64 = 0.0;
pub const DEFAULT_SIZE: f64 = 20.0;
pub const DEFAULT_EXHAUSTIVENESS: u32 = 8;

const UNBOUNDED_SENTINELS: [&str; 2] = ["", "None"];

/// Turns raw configurations into [`RunConfig`]s.
///
/// Relative paths are resolved against `base_dir`, and explicit worker counts
/// are clamped to `[1, available_parallelism]`.
#[derive(Debug, Clone)]
pub struct ConfigNormalizer {
    base_dir: PathBuf,
    available_parallelism: usize,
}

impl ConfigNormalizer {
    pub fn new(base_dir: PathBuf, available_parallelism: usize) -> Self {
        Self {
            base_dir,
            available_parallelism: available_parallelism.max(1),
        }
    }

    pub fn normalize(&self, raw: &RawRunConfig) -> Result<RunConfig, EngineError> {
        let center = Vec3::new(
            parse_float("center_x", raw.center_x.as_ref(), DEFAULT_CENTER)?,
            parse_float("center_y", raw.center_y.as_ref(), DEFAULT_CENTER)?,
            parse_float("center_z", raw.center_z.as_ref(), DEFAULT_CENTER)?,
        );
        let size = Vec3::new(
            parse_float("size_x", raw.size_x.as_ref(), DEFAULT_SIZE)?,
            parse_float("size_y", raw.size_y.as_ref(), DEFAULT_SIZE)?,
            parse_float("size_z", raw.size_z.as_ref(), DEFAULT_SIZE)?,
        );
        let exhaustiveness = parse_exhaustiveness(raw.exhaustiveness.as_ref())?;
        let workers = parse_workers(raw.parallel_workers.as_ref(), self.available_parallelism)?;

        let config = RunConfig {
            receptor: self.resolve("receptor", &raw.receptor)?,
            ligand_dir: self.resolve("ligand_dir", &raw.ligand_dir)?,
            output_base: self.resolve("output_base", &raw.output_base)?,
            center,
            size,
            exhaustiveness,
            workers,
        };
        debug!(?config, "Configuration normalized.");
        Ok(config)
    }

    fn resolve(&self, field: &'static str, value: &str) -> Result<PathBuf, EngineError> {
        resolve_path(Path::new(value), &self.base_dir).map_err(|source| {
            EngineError::PathResolution {
                field,
                value: value.to_string(),
                source,
            }
        })
    }
}

/// Clamps a requested worker count into `[1, available]`.
pub fn clamp_workers(requested: i64, available: usize) -> usize {
    let available = available.max(1);
    if requested < 1 {
        1
    } else {
        usize::try_from(requested).map_or(available, |n| n.min(available))
    }
}

fn parse_float(
    field: &'static str,
    value: Option<&RawScalar>,
    default: f64,
) -> Result<f64, EngineError> {
    let invalid = || EngineError::InvalidParameter {
        field,
        expected: "a numeric value",
        value: value.map(ToString::to_string).unwrap_or_default(),
    };
    let parsed = match value {
        None => return Ok(default),
        Some(RawScalar::Int(n)) => *n as f64,
        Some(RawScalar::Float(f)) => *f,
        Some(RawScalar::Text(s)) => s.trim().parse::<f64>().map_err(|_| invalid())?,
    };
    if parsed.is_finite() {
        Ok(parsed)
    } else {
        Err(invalid())
    }
}

fn parse_integer(field: &'static str, value: &RawScalar) -> Result<i64, EngineError> {
    let invalid = || EngineError::InvalidParameter {
        field,
        expected: "an integer",
        value: value.to_string(),
    };
    match value {
        RawScalar::Int(n) => Ok(*n),
        RawScalar::Float(f) if f.fract() == 0.0 && f.is_finite() => Ok(*f as i64),
        RawScalar::Float(_) => Err(invalid()),
        RawScalar::Text(s) => s.trim().parse::<i64>().map_err(|_| invalid()),
    }
}

fn parse_exhaustiveness(value: Option<&RawScalar>) -> Result<u32, EngineError> {
    let Some(value) = value else {
        return Ok(DEFAULT_EXHAUSTIVENESS);
    };
    let parsed = parse_integer("exhaustiveness", value)?;
    u32::try_from(parsed)
        .ok()
        .filter(|&n| n >= 1)
        .ok_or_else(|| EngineError::InvalidParameter {
            field: "exhaustiveness",
            expected: "a positive integer",
            value: value.to_string(),
        })
}

fn parse_workers(value: Option<&RawScalar>, available: usize) -> Result<Workers, EngineError> {
    match value {
        None => Ok(Workers::Unbounded),
        Some(RawScalar::Text(s)) if UNBOUNDED_SENTINELS.contains(&s.trim()) => {
            Ok(Workers::Unbounded)
        }
        Some(value) => {
            let requested = parse_integer("parallel_workers", value)?;
            Ok(Workers::Fixed(clamp_workers(requested, available)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn normalizer(base: &Path) -> ConfigNormalizer {
        ConfigNormalizer::new(base.to_path_buf(), 4)
    }

    fn raw() -> RawRunConfig {
        RawRunConfig::new("rec.pdbqt", "ligands", "out")
    }

    #[test]
    fn defaults_apply_when_fields_are_absent() {
        let dir = tempdir().unwrap();
        let config = normalizer(dir.path()).normalize(&raw()).unwrap();

        assert_eq!(config.center, Vec3::new(0.0, 0.0, 0.0));
        assert_eq!(config.size, Vec3::new(20.0, 20.0, 20.0));
        assert_eq!(config.exhaustiveness, 8);
        assert_eq!(config.workers, Workers::Unbounded);
    }

    #[test]
    fn numeric_strings_are_parsed() {
        let dir = tempdir().unwrap();
        let mut raw = raw();
        raw.center_x = Some("1.5".into());
        raw.center_y = Some(RawScalar::Int(-2));
        raw.size_z = Some(" 22.5 ".into());
        raw.exhaustiveness = Some("16".into());

        let config = normalizer(dir.path()).normalize(&raw).unwrap();
        assert_eq!(config.center, Vec3::new(1.5, -2.0, 0.0));
        assert_eq!(config.size.z, 22.5);
        assert_eq!(config.exhaustiveness, 16);
    }

    #[test]
    fn non_numeric_coordinate_is_rejected_with_field_name() {
        let dir = tempdir().unwrap();
        let mut raw = raw();
        raw.size_y = Some("wide".into());

        let err = normalizer(dir.path()).normalize(&raw).unwrap_err();
        assert!(matches!(
            err,
            EngineError::InvalidParameter { field: "size_y", .. }
        ));
        assert!(err.to_string().contains("'size_y'"));
        assert!(err.to_string().contains("wide"));
    }

    #[test]
    fn non_integer_exhaustiveness_is_rejected() {
        let dir = tempdir().unwrap();
        let mut raw = raw();
        raw.exhaustiveness = Some("abc".into());

        let err = normalizer(dir.path()).normalize(&raw).unwrap_err();
        assert!(matches!(
            err,
            EngineError::InvalidParameter {
                field: "exhaustiveness",
                ..
            }
        ));
        assert_eq!(
            err.to_string(),
            "Parameter 'exhaustiveness' must be an integer (received: abc)"
        );
        assert!(err.is_precondition());
    }

    #[test]
    fn exhaustiveness_must_be_positive() {
        let dir = tempdir().unwrap();
        let mut raw = raw();
        raw.exhaustiveness = Some(RawScalar::Int(0));
        assert!(normalizer(dir.path()).normalize(&raw).is_err());

        raw.exhaustiveness = Some(RawScalar::Float(8.5));
        assert!(normalizer(dir.path()).normalize(&raw).is_err());

        raw.exhaustiveness = Some(RawScalar::Float(32.0));
        assert_eq!(
            normalizer(dir.path()).normalize(&raw).unwrap().exhaustiveness,
            32
        );
    }

    #[test]
    fn worker_count_sentinels_mean_unbounded() {
        let dir = tempdir().unwrap();
        for sentinel in ["", "None", "  "] {
            let mut raw = raw();
            raw.parallel_workers = Some(sentinel.into());
            let config = normalizer(dir.path()).normalize(&raw).unwrap();
            assert_eq!(config.workers, Workers::Unbounded, "sentinel {:?}", sentinel);
        }
    }

    #[test]
    fn worker_count_is_clamped_to_available_parallelism() {
        let dir = tempdir().unwrap();
        let cases = [
            (RawScalar::Int(0), 1),
            (RawScalar::Int(-3), 1),
            (RawScalar::Int(2), 2),
            (RawScalar::Int(64), 4),
            (RawScalar::Text("3".into()), 3),
        ];
        for (value, expected) in cases {
            let mut raw = raw();
            raw.parallel_workers = Some(value.clone());
            let config = normalizer(dir.path()).normalize(&raw).unwrap();
            assert_eq!(config.workers, Workers::Fixed(expected), "value {:?}", value);
        }
    }

    #[test]
    fn non_integer_worker_count_is_rejected() {
        let dir = tempdir().unwrap();
        let mut raw = raw();
        raw.parallel_workers = Some("many".into());
        let err = normalizer(dir.path()).normalize(&raw).unwrap_err();
        assert!(matches!(
            err,
            EngineError::InvalidParameter {
                field: "parallel_workers",
                ..
            }
        ));
    }

    #[test]
    fn clamp_workers_bounds() {
        assert_eq!(clamp_workers(0, 8), 1);
        assert_eq!(clamp_workers(-1, 8), 1);
        assert_eq!(clamp_workers(5, 8), 5);
        assert_eq!(clamp_workers(9, 8), 8);
        assert_eq!(clamp_workers(i64::MAX, 8), 8);
        assert_eq!(clamp_workers(3, 0), 1);
    }

    #[test]
    fn paths_become_absolute_and_canonical() {
        let dir = tempdir().unwrap();
        let base = fs::canonicalize(dir.path()).unwrap();
        fs::write(base.join("rec.pdbqt"), "").unwrap();
        fs::create_dir(base.join("ligands")).unwrap();

        let mut raw = raw();
        raw.ligand_dir = "./ligands/.".into();
        let config = normalizer(&base).normalize(&raw).unwrap();

        assert_eq!(config.receptor, base.join("rec.pdbqt"));
        assert_eq!(config.ligand_dir, base.join("ligands"));
        assert_eq!(config.output_base, base.join("out"));
        assert!(!base.join("out").exists());
    }
}
