use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Resolves `path` against `base_dir` into an absolute, canonical path.
///
/// The longest existing prefix is canonicalized (symlinks followed), and any
/// components past it are appended with `.` and `..` folded lexically, so paths
/// that do not exist yet, like a fresh output directory, still resolve.
pub fn resolve_path(path: &Path, base_dir: &Path) -> io::Result<PathBuf> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    };

    let mut resolved = PathBuf::new();
    let mut on_disk = true;
    for component in joined.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => resolved.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
                on_disk = resolved.exists();
            }
            Component::Normal(name) => {
                resolved.push(name);
                if on_disk {
                    match fs::canonicalize(&resolved) {
                        Ok(canonical) => resolved = canonical,
                        Err(e) if e.kind() == io::ErrorKind::NotFound => on_disk = false,
                        Err(e) => return Err(e),
                    }
                }
            }
        }
    }
    Ok(resolved)
}
