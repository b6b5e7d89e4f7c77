//! Source PDF discovery.

use crate::error::{AssembleError, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Collect every PDF under `dir`, recursively, in sorted order.
///
/// `exclude` names a subtree to skip, used to keep a previous run's output
/// directory out of the inputs.
///
/// # Errors
///
/// Returns [`AssembleError::FileNotFound`] when `dir` is not a directory and
/// [`AssembleError::NoPdfFiles`] when nothing was found.
pub fn find_pdfs(dir: &Path, exclude: Option<&Path>) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(AssembleError::FileNotFound {
            path: dir.to_path_buf(),
        });
    }

    let mut paths: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| exclude.map_or(true, |ex| e.path() != ex))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| {
            p.extension()
                .map_or(false, |ext| ext.eq_ignore_ascii_case("pdf"))
        })
        .collect();
    paths.sort();

    if paths.is_empty() {
        return Err(AssembleError::NoPdfFiles {
            dir: dir.to_path_buf(),
        });
    }
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"stub").unwrap();
    }

    #[test]
    fn test_finds_pdfs_recursively_sorted() {
        let tmp = TempDir::new().unwrap();
        let sub = tmp.path().join("LC");
        fs::create_dir(&sub).unwrap();
        touch(tmp.path(), "b.pdf");
        touch(tmp.path(), "a.PDF");
        touch(&sub, "c.pdf");
        touch(tmp.path(), "notes.txt");

        let found = find_pdfs(tmp.path(), None).unwrap();
        assert_eq!(found.len(), 3);
        assert!(found[0].ends_with("LC/c.pdf"));
        assert!(found[1].ends_with("a.PDF"));
        assert!(found[2].ends_with("b.pdf"));
    }

    #[test]
    fn test_excludes_output_subtree() {
        let tmp = TempDir::new().unwrap();
        let merged = tmp.path().join("merged");
        fs::create_dir(&merged).unwrap();
        touch(tmp.path(), "a.pdf");
        touch(&merged, "Unit01.pdf");

        let found = find_pdfs(tmp.path(), Some(&merged)).unwrap();
        assert_eq!(found.len(), 1);
        assert!(found[0].ends_with("a.pdf"));
    }

    #[test]
    fn test_empty_directory_is_an_error() {
        let tmp = TempDir::new().unwrap();
        assert!(matches!(
            find_pdfs(tmp.path(), None),
            Err(AssembleError::NoPdfFiles { .. })
        ));
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        assert!(matches!(
            find_pdfs(Path::new("/definitely/not/here"), None),
            Err(AssembleError::FileNotFound { .. })
        ));
    }
}
