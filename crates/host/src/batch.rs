//! Batch enumeration: which files a content directory serves.

use std::path::{Path, PathBuf};

use crate::HostError;

/// Lists the files a content directory serves as one batch.
///
/// Plain files only, non-recursive; hidden files (starting with `.`) are
/// excluded. Sorted case-insensitively by name so the batch order is
/// stable across platforms.
pub fn batch_paths(dir: &Path) -> Result<Vec<PathBuf>, HostError> {
    if !dir.is_dir() {
        return Err(HostError::NotADirectory(dir.display().to_string()));
    }

    let mut entries: Vec<(String, PathBuf)> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let metadata = entry.metadata().ok()?;
            if !metadata.is_file() {
                return None;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with('.') {
                return None;
            }
            Some((name, entry.path()))
        })
        .collect();

    entries.sort_by(|a, b| a.0.to_lowercase().cmp(&b.0.to_lowercase()));

    Ok(entries.into_iter().map(|(_, path)| path).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn files_only_sorted() {
        let tmp = tempfile::tempdir().unwrap();
        let base = tmp.path();

        std::fs::write(base.join("Zeta.bin"), b"z").unwrap();
        std::fs::write(base.join("alpha.txt"), b"a").unwrap();
        std::fs::write(base.join(".hidden"), b"h").unwrap();
        std::fs::create_dir(base.join("subdir")).unwrap();

        let paths = batch_paths(base).unwrap();
        let names: Vec<_> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();

        assert_eq!(names, vec!["alpha.txt", "Zeta.bin"]);
    }

    #[test]
    fn empty_directory_is_empty_batch() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(batch_paths(tmp.path()).unwrap().is_empty());
    }

    #[test]
    fn missing_directory_is_error() {
        let result = batch_paths(Path::new("/definitely/not/real"));
        assert!(matches!(result, Err(HostError::NotADirectory(_))));
    }
}
