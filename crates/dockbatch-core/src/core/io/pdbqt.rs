use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File extension of docking-ready ligand and receptor inputs.
pub const PDBQT_EXTENSION: &str = "pdbqt";

/// Coordinate records are cut to this many columns when poses are split out;
/// the engine appends partial charges and atom types beyond it.
pub const COORDINATE_COLUMNS: usize = 66;

const MODEL_START: &str = "MODEL";
const MODEL_END: &str = "ENDMDL";

#[derive(Debug, Error)]
pub enum PdbqtError {
    #[error("Failed to read '{path}': {source}", path = path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("Failed to write '{path}': {source}", path = path.display())]
    Write { path: PathBuf, source: io::Error },
}

pub fn is_coordinate_record(line: &str) -> bool {
    line.starts_with("ATOM") || line.starts_with("HETATM")
}

pub fn has_coordinate_records(content: &str) -> bool {
    content.lines().any(is_coordinate_record)
}

/// The identity of a ligand or receptor: its file stem.
pub fn molecule_identity(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Lists the `.pdbqt` files directly inside `dir`, sorted by file name.
///
/// The position of a ligand in this list is its discovery index.
pub fn discover_ligands(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut ligands = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_pdbqt = path
            .extension()
            .is_some_and(|ext| ext == PDBQT_EXTENSION);
        if is_pdbqt && path.is_file() {
            ligands.push(path);
        }
    }
    ligands.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(ligands)
}

/// Path of the file holding model `index` (1-based) split out of `source`.
pub fn model_file_path(source: &Path, index: usize) -> PathBuf {
    let stem = molecule_identity(source);
    source.with_file_name(format!("{}_model_{}.pdb", stem, index))
}

/// Groups the lines between each `MODEL` / `ENDMDL` pair.
///
/// Lines outside a model block are dropped. The returned groups keep model order,
/// including empty ones, so that group `i` is model `i + 1`.
pub fn read_models(reader: impl BufRead) -> io::Result<Vec<Vec<String>>> {
    let mut models = Vec::new();
    let mut current = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.starts_with(MODEL_START) {
            current.clear();
        } else if line.starts_with(MODEL_END) {
            models.push(std::mem::take(&mut current));
        } else {
            current.push(line);
        }
    }
    Ok(models)
}

/// Writes one model group, truncating coordinate records to [`COORDINATE_COLUMNS`].
pub fn write_model(lines: &[String], writer: &mut impl Write) -> io::Result<()> {
    for line in lines {
        if is_coordinate_record(line) {
            writeln!(writer, "{}", truncate_columns(line, COORDINATE_COLUMNS))?;
        } else {
            writeln!(writer, "{}", line)?;
        }
    }
    Ok(())
}

/// Splits a multi-model docking output into one `<stem>_model_<i>.pdb` per model.
///
/// Models without any lines are skipped; the returned paths are the files written.
pub fn split_models(path: &Path) -> Result<Vec<PathBuf>, PdbqtError> {
    let read_err = |source| PdbqtError::Read {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(read_err)?;
    let models = read_models(BufReader::new(file)).map_err(read_err)?;

    let mut written = Vec::new();
    for (i, model) in models.iter().enumerate() {
        if model.is_empty() {
            continue;
        }
        let model_path = model_file_path(path, i + 1);
        let write_err = |source| PdbqtError::Write {
            path: model_path.clone(),
            source,
        };
        let mut writer = BufWriter::new(File::create(&model_path).map_err(write_err)?);
        write_model(model, &mut writer).map_err(write_err)?;
        writer.flush().map_err(write_err)?;
        written.push(model_path);
    }
    Ok(written)
}

fn truncate_columns(line: &str, columns: usize) -> &str {
    match line.char_indices().nth(columns) {
        Some((byte_idx, _)) => &line[..byte_idx],
        None => line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::tempdir;

    const ATOM_1: &str = "ATOM      1  C   UNL     1       1.234   2.345   3.456  0.00  0.00    +0.123 C ";
    const ATOM_2: &str = "HETATM    2  O   UNL     1      -1.000   0.500   2.250  0.00  0.00    -0.456 OA";

    #[test]
    fn coordinate_records_are_atom_and_hetatm_lines() {
        assert!(is_coordinate_record(ATOM_1));
        assert!(is_coordinate_record(ATOM_2));
        assert!(!is_coordinate_record("REMARK VINA RESULT: -7.2 0.000 0.000"));
        assert!(!is_coordinate_record("  ATOM indented"));
        assert!(has_coordinate_records(&format!("ROOT\n{}\nENDROOT\n", ATOM_1)));
        assert!(!has_coordinate_records("ROOT\nENDROOT\nTORSDOF 0\n"));
    }

    #[test]
    fn truncate_columns_handles_short_lines() {
        assert_eq!(truncate_columns("ATOM", 66), "ATOM");
        assert_eq!(truncate_columns(ATOM_1, 66).len(), 66);
    }

    #[test]
    fn read_models_drops_lines_outside_blocks() {
        let text = "REMARK before\nMODEL 1\nA\nENDMDL\nstray\nMODEL 2\nB\nC\nENDMDL\nafter\n";
        let models = read_models(Cursor::new(text)).unwrap();
        assert_eq!(
            models,
            vec![vec!["A".to_string()], vec!["B".to_string(), "C".to_string()]]
        );
    }

    #[test]
    fn split_models_writes_one_truncated_file_per_model() {
        let dir = tempdir().unwrap();
        let docked = dir.path().join("aspirin_docked.pdbqt");
        fs::write(
            &docked,
            format!(
                "MODEL 1\n{a1}\n{a2}\nENDMDL\nMODEL 2\n{a2}\nENDMDL\n",
                a1 = ATOM_1,
                a2 = ATOM_2
            ),
        )
        .unwrap();

        let files = split_models(&docked).unwrap();
        assert_eq!(
            files,
            vec![
                dir.path().join("aspirin_docked_model_1.pdb"),
                dir.path().join("aspirin_docked_model_2.pdb"),
            ]
        );

        let first = fs::read_to_string(&files[0]).unwrap();
        let lines: Vec<&str> = first.lines().collect();
        assert_eq!(lines, vec![&ATOM_1[..66], &ATOM_2[..66]]);
        assert!(lines.iter().all(|l| l.len() == COORDINATE_COLUMNS));

        let second = fs::read_to_string(&files[1]).unwrap();
        assert_eq!(second, format!("{}\n", &ATOM_2[..66]));
    }

    #[test]
    fn split_models_keeps_non_coordinate_lines_verbatim() {
        let dir = tempdir().unwrap();
        let docked = dir.path().join("lig_docked.pdbqt");
        fs::write(
            &docked,
            format!(
                "MODEL 1\nREMARK VINA RESULT:    -7.2      0.000      0.000\nROOT\n{}\nENDROOT\nENDMDL\n",
                ATOM_1
            ),
        )
        .unwrap();

        let files = split_models(&docked).unwrap();
        let content = fs::read_to_string(&files[0]).unwrap();
        assert_eq!(
            content,
            format!(
                "REMARK VINA RESULT:    -7.2      0.000      0.000\nROOT\n{}\nENDROOT\n",
                &ATOM_1[..66]
            )
        );
    }

    #[test]
    fn empty_model_produces_no_file_but_keeps_numbering() {
        let dir = tempdir().unwrap();
        let docked = dir.path().join("lig_docked.pdbqt");
        fs::write(
            &docked,
            format!("MODEL 1\nENDMDL\nMODEL 2\n{}\nENDMDL\n", ATOM_1),
        )
        .unwrap();

        let files = split_models(&docked).unwrap();
        assert_eq!(files, vec![dir.path().join("lig_docked_model_2.pdb")]);
        assert!(!dir.path().join("lig_docked_model_1.pdb").exists());
    }

    #[test]
    fn split_models_reports_missing_input() {
        let dir = tempdir().unwrap();
        let result = split_models(&dir.path().join("missing.pdbqt"));
        assert!(matches!(result, Err(PdbqtError::Read { .. })));
    }

    #[test]
    fn discover_ligands_lists_pdbqt_files_in_name_order() {
        let dir = tempdir().unwrap();
        for name in ["b.pdbqt", "a.pdbqt", "notes.txt", "c.PDB"] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        fs::create_dir(dir.path().join("nested.pdbqt")).unwrap();

        let ligands = discover_ligands(dir.path()).unwrap();
        let names: Vec<String> = ligands.iter().map(|p| molecule_identity(p)).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn model_file_path_uses_stem_and_one_based_index() {
        assert_eq!(
            model_file_path(Path::new("/out/rec/lig/lig_docked.pdbqt"), 3),
            PathBuf::from("/out/rec/lig/lig_docked_model_3.pdb")
        );
    }
}
