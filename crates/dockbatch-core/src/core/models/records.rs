use std::path::PathBuf;

/// Placeholder written wherever a value does not apply (failed ligands, empty tables).
pub const NOT_APPLICABLE: &str = "N/A";

/// Mode label used in tabular reports for ligands whose docking failed.
pub const ERROR_MODE: &str = "ERROR";

/// One scored binding pose as reported by the docking engine.
///
/// Values are the verbatim tokens from the engine's result table so that reports
/// reproduce the engine's own formatting; parse the energy for arithmetic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoseRecord {
    pub mode: String,
    pub energy: String,
    pub rmsd_lower: String,
    pub rmsd_upper: String,
}

impl PoseRecord {
    pub fn new(mode: &str, energy: &str, rmsd_lower: &str, rmsd_upper: &str) -> Self {
        Self {
            mode: mode.to_string(),
            energy: energy.to_string(),
            rmsd_lower: rmsd_lower.to_string(),
            rmsd_upper: rmsd_upper.to_string(),
        }
    }

    pub fn not_applicable() -> Self {
        Self::new(NOT_APPLICABLE, NOT_APPLICABLE, NOT_APPLICABLE, NOT_APPLICABLE)
    }

    pub fn is_placeholder(&self) -> bool {
        self.mode == NOT_APPLICABLE
            && self.energy == NOT_APPLICABLE
            && self.rmsd_lower == NOT_APPLICABLE
            && self.rmsd_upper == NOT_APPLICABLE
    }

    pub fn energy_kcal_mol(&self) -> Option<f64> {
        self.energy.parse().ok()
    }
}

/// The result of docking one ligand: either its poses or the reason it failed.
#[derive(Debug, Clone, PartialEq)]
pub enum LigandOutcome {
    Docked {
        poses: Vec<PoseRecord>,
        model_files: Vec<PathBuf>,
    },
    Failed {
        reason: String,
    },
}

impl LigandOutcome {
    pub fn failed(reason: impl Into<String>) -> Self {
        LigandOutcome::Failed {
            reason: reason.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, LigandOutcome::Docked { .. })
    }

    pub fn poses(&self) -> &[PoseRecord] {
        match self {
            LigandOutcome::Docked { poses, .. } => poses,
            LigandOutcome::Failed { .. } => &[],
        }
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match self {
            LigandOutcome::Docked { .. } => None,
            LigandOutcome::Failed { reason } => Some(reason),
        }
    }

    /// Lowest predicted binding energy among the poses, if any parsed.
    pub fn best_energy(&self) -> Option<f64> {
        self.poses()
            .iter()
            .filter_map(PoseRecord::energy_kcal_mol)
            .min_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
    }
}

/// A ligand outcome tagged with the ligand's identity and discovery position.
#[derive(Debug, Clone, PartialEq)]
pub struct LigandResult {
    pub index: usize,
    pub ligand: String,
    pub outcome: LigandOutcome,
}

/// Every ligand outcome of one receptor's batch.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceptorRun {
    pub receptor: String,
    pub output_dir: PathBuf,
    pub results: Vec<LigandResult>,
}

impl ReceptorRun {
    pub fn new(receptor: impl Into<String>, output_dir: PathBuf) -> Self {
        Self {
            receptor: receptor.into(),
            output_dir,
            results: Vec::new(),
        }
    }

    pub fn push(&mut self, result: LigandResult) {
        self.results.push(result);
    }

    /// Results in ligand discovery order, independent of completion order.
    pub fn ordered(&self) -> Vec<&LigandResult> {
        let mut ordered: Vec<&LigandResult> = self.results.iter().collect();
        ordered.sort_by_key(|result| result.index);
        ordered
    }

    pub fn failed_count(&self) -> usize {
        self.results
            .iter()
            .filter(|result| !result.outcome.is_success())
            .count()
    }

    /// The ligand with the lowest best energy, first in discovery order on ties.
    pub fn best_ligand(&self) -> Option<(&str, f64)> {
        self.ordered()
            .into_iter()
            .filter_map(|result| Some((result.ligand.as_str(), result.outcome.best_energy()?)))
            .fold(None, |best, candidate| match best {
                Some((_, energy)) if energy <= candidate.1 => best,
                _ => Some(candidate),
            })
    }

    pub fn pose_count(&self) -> usize {
        self.results
            .iter()
            .map(|result| result.outcome.poses().len())
            .sum()
    }
}
