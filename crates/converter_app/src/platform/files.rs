//! Terminal counterpart of the file picker.
//!
//! Explicit file arguments are taken as-is, whatever their extension.
//! Directory arguments are expanded to the `.sql` and `.txt` files directly
//! inside them, which is the only place the extension filter applies.

use std::fs;
use std::path::{Path, PathBuf};

use converter_core::SelectedFile;
use converter_logging::converter_debug;

const PICKER_EXTENSIONS: &[&str] = &["sql", "txt"];

#[derive(Debug, Default)]
pub struct Selection {
    pub files: Vec<SelectedFile>,
    pub skipped: Vec<SkippedPath>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedPath {
    pub path: PathBuf,
    pub reason: String,
}

pub fn select_paths(paths: &[PathBuf]) -> Selection {
    let mut selection = Selection::default();
    for path in paths {
        if path.is_dir() {
            match picker_entries(path) {
                Ok(entries) => {
                    for entry in entries {
                        read_into(&entry, &mut selection);
                    }
                }
                Err(err) => selection.skipped.push(SkippedPath {
                    path: path.clone(),
                    reason: err.to_string(),
                }),
            }
        } else {
            read_into(path, &mut selection);
        }
    }
    selection
}

fn picker_entries(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && has_picker_extension(path))
        .collect::<Vec<_>>();
    entries.sort();
    converter_debug!("{:?} expanded to {} file(s)", dir, entries.len());
    Ok(entries)
}

fn has_picker_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            PICKER_EXTENSIONS
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(ext))
        })
}

fn read_into(path: &Path, selection: &mut Selection) {
    match fs::read(path) {
        Ok(contents) => {
            let name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            selection.files.push(SelectedFile::new(name, contents));
        }
        Err(err) => selection.skipped.push(SkippedPath {
            path: path.to_path_buf(),
            reason: err.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn names(selection: &Selection) -> Vec<&str> {
        selection.files.iter().map(|f| f.name.as_str()).collect()
    }

    #[test]
    fn directories_expand_to_sql_and_txt_sorted() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("b.sql"), "select 2").unwrap();
        fs::write(temp.path().join("a.TXT"), "select 1").unwrap();
        fs::write(temp.path().join("notes.md"), "# notes").unwrap();
        fs::create_dir(temp.path().join("nested.sql")).unwrap();

        let selection = select_paths(&[temp.path().to_path_buf()]);
        assert_eq!(names(&selection), vec!["a.TXT", "b.sql"]);
        assert!(selection.skipped.is_empty());
    }

    #[test]
    fn explicit_files_skip_the_extension_filter() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("legacy.proc");
        fs::write(&path, "create proc p as select 1").unwrap();

        let selection = select_paths(&[path]);
        assert_eq!(names(&selection), vec!["legacy.proc"]);
        assert_eq!(selection.files[0].size(), 25);
    }

    #[test]
    fn unreadable_paths_are_reported() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("missing.sql");
        let selection = select_paths(&[missing.clone()]);

        assert!(selection.files.is_empty());
        assert_eq!(selection.skipped.len(), 1);
        assert_eq!(selection.skipped[0].path, missing);
    }

    #[test]
    fn empty_input_is_an_empty_selection() {
        let selection = select_paths(&[]);
        assert!(selection.files.is_empty());
        assert!(selection.skipped.is_empty());
    }
}
