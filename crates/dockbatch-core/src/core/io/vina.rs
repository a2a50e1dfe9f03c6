use crate::core::models::records::PoseRecord;
use regex::Regex;
use std::sync::LazyLock;

static VERSION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[Vv]ina\s*v?([0-9]+)\.([0-9]+)").expect("valid version regex"));

/// Extracts the scored-pose table from the docking engine's standard output.
///
/// A line is a table row iff its first token is a mode index from 1 to 9 and the
/// line has at least four whitespace-separated fields; (mode, energy, rmsd-lower,
/// rmsd-upper) are read positionally. Banners, headers and progress bars are
/// skipped. A successful run never yields an empty set: when no row qualifies a
/// single [`PoseRecord::not_applicable`] is returned.
pub fn parse_energy_table(stdout: &str) -> Vec<PoseRecord> {
    let mut poses: Vec<PoseRecord> = stdout.lines().filter_map(parse_table_row).collect();
    if poses.is_empty() {
        poses.push(PoseRecord::not_applicable());
    }
    poses
}

fn parse_table_row(line: &str) -> Option<PoseRecord> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 4 || !is_mode_index(fields[0]) {
        return None;
    }
    Some(PoseRecord::new(fields[0], fields[1], fields[2], fields[3]))
}

fn is_mode_index(token: &str) -> bool {
    let mut chars = token.chars();
    matches!((chars.next(), chars.next()), (Some('1'..='9'), None))
}

/// Finds a `major.minor` engine version in a `--version` or `--help` banner.
pub fn parse_version(banner: &str) -> Option<(u32, u32)> {
    let captures = VERSION_PATTERN.captures(banner)?;
    let major = captures.get(1)?.as_str().parse().ok()?;
    let minor = captures.get(2)?.as_str().parse().ok()?;
    Some((major, minor))
}
