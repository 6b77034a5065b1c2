use std::collections::HashSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use converter_logging::converter_info;
use tempfile::NamedTempFile;
use thiserror::Error;

/// Byte budget for a saved name, well under the 255-byte limit of common filesystems.
const MAX_NAME_BYTES: usize = 120;
/// Longer suffixes are not treated as an extension when truncating.
const MAX_EXTENSION_BYTES: usize = 16;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Ensure output directory exists; create if missing.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(PersistError::OutputDir(format!(
                "{} is not a directory",
                dir.display()
            )));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
    }
    Ok(())
}

/// Makes a service-provided name safe to use as a single file name.
///
/// Path separators and characters Windows rejects become `_`, runs of `_`
/// collapse, reserved device names get a trailing `_`, and an empty result
/// falls back to `fallback`. The result is at most 120 bytes plus the
/// reserved-name marker, cut on a char boundary.
pub fn sanitize_file_name(name: &str, fallback: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect();

    let mut compacted = String::with_capacity(replaced.len());
    let mut prev_underscore = false;
    for c in replaced.chars() {
        if c == '_' && prev_underscore {
            continue;
        }
        prev_underscore = c == '_';
        compacted.push(c);
    }

    let trimmed = compacted.trim_matches(&['_', ' ', '.'][..]);
    if trimmed.is_empty() {
        return fallback.to_string();
    }

    let mut cleaned = truncate_keeping_extension(trimmed, MAX_NAME_BYTES);
    let (stem, _) = split_extension(&cleaned);
    if is_reserved_windows_name(stem) {
        let at = stem.len();
        cleaned.insert(at, '_');
    }
    cleaned
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}

fn is_reserved_windows_name(stem: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(stem))
}

/// Splits `name.ext` into `("name", Some("ext"))`; a leading dot is not an extension.
fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        Some(0) | None => (name, None),
        Some(idx) => (&name[..idx], Some(&name[idx + 1..])),
    }
}

fn truncate_keeping_extension(name: &str, max_bytes: usize) -> String {
    if name.len() <= max_bytes {
        return name.to_string();
    }
    let (stem, ext) = match split_extension(name) {
        (stem, Some(ext)) if ext.len() <= MAX_EXTENSION_BYTES => (stem, Some(ext)),
        _ => (name, None),
    };
    let ext_len = ext.map_or(0, |e| e.len() + 1);
    let cut = floor_char_boundary(stem, max_bytes.saturating_sub(ext_len));
    let trimmed = cut.trim_end_matches(&['_', ' ', '.'][..]);
    let kept = if trimmed.is_empty() { cut } else { trimmed };
    let mut out = kept.to_string();
    if let Some(ext) = ext {
        out.push('.');
        out.push_str(ext);
    }
    out
}

/// Longest prefix of `s` that is at most `max_bytes` long and ends on a char boundary.
fn floor_char_boundary(s: &str, max_bytes: usize) -> &str {
    let mut end = max_bytes.min(s.len());
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Atomically writes `content` to `{dir}/{file_name}` via a temp file and rename,
/// replacing any existing file. `file_name` is used as given.
pub fn write_atomic(dir: &Path, file_name: &str, content: &str) -> Result<PathBuf, PersistError> {
    ensure_output_dir(dir)?;

    let target = dir.join(file_name);
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.flush()?;
    tmp.as_file_mut().sync_all()?;

    if target.exists() {
        fs::remove_file(&target)?;
    }
    tmp.persist(&target).map_err(|e| PersistError::Io(e.error))?;
    Ok(target)
}

/// Writes converted results into one directory, the terminal counterpart of
/// a browser download.
///
/// Names written through the same `Downloader` never collide: a repeated name
/// becomes `name-2.ext`, `name-3.ext` and so on.
pub struct Downloader {
    dir: PathBuf,
    fallback_name: String,
    used: HashSet<String>,
}

impl Downloader {
    /// `fallback_name` replaces names that sanitize to nothing.
    pub fn new(dir: PathBuf, fallback_name: impl Into<String>) -> Self {
        Self {
            dir,
            fallback_name: fallback_name.into(),
            used: HashSet::new(),
        }
    }

    pub fn save(&mut self, name: &str, content: &str) -> Result<PathBuf, PersistError> {
        let file_name = self.unique_name(&sanitize_file_name(name, &self.fallback_name));
        let target = write_atomic(&self.dir, &file_name, content)?;
        converter_info!("Saved {} ({} bytes)", target.display(), content.len());
        self.used.insert(file_name);
        Ok(target)
    }

    fn unique_name(&self, candidate: &str) -> String {
        if !self.used.contains(candidate) {
            return candidate.to_string();
        }
        let (stem, ext) = split_extension(candidate);
        (2..)
            .map(|n| match ext {
                Some(ext) => format!("{stem}-{n}.{ext}"),
                None => format!("{stem}-{n}"),
            })
            .find(|name| !self.used.contains(name))
            .unwrap_or_else(|| candidate.to_string())
    }
}
