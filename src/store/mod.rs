mod atomic;
mod expectations;
mod validations;
mod checkpoints;

use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use glob::{glob, Pattern};
use regex::Regex;
use crate::error::{DqError, Result};

pub use atomic::{write_bytes_atomic, write_json_atomic, write_yaml_atomic};
pub use expectations::ExpectationsStore;
pub use validations::{ValidationResultIdentifier, ValidationsStore};
pub use checkpoints::CheckpointStore;

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.-]*$").expect("valid name pattern"))
}

fn unsafe_chars() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[^A-Za-z0-9_.-]").expect("valid path segment pattern"))
}

/// Names become file names, so they are limited to a path-safe alphabet.
pub fn validate_name(kind: &str, name: &str) -> Result<()> {
    if name_pattern().is_match(name) {
        Ok(())
    } else {
        Err(DqError::InvalidName(format!(
            "{} name '{}' must start with a letter or digit and contain only letters, digits, '_', '.' or '-'",
            kind, name
        )))
    }
}

/// Replace anything outside the path-safe alphabet with '_'.
pub(crate) fn path_segment(raw: &str) -> String {
    let cleaned = unsafe_chars().replace_all(raw, "_").to_string();
    match cleaned.as_str() {
        "" | "." | ".." => "_".to_string(),
        _ => cleaned,
    }
}

/// `dir` as a glob prefix that matches only itself.
pub(crate) fn escaped_dir(dir: &Path) -> PathBuf {
    PathBuf::from(Pattern::escape(&dir.to_string_lossy()))
}

/// File stems of `<dir>/*.<extension>`, sorted.
pub(crate) fn list_stems(dir: &Path, extension: &str) -> Result<Vec<String>> {
    let pattern = escaped_dir(dir).join(format!("*.{}", extension));
    let pattern_str = pattern.to_string_lossy();

    let mut names: Vec<String> = glob(&pattern_str)?
        .filter_map(|r| r.ok())
        .filter_map(|path| path.file_stem().map(|s| s.to_string_lossy().to_string()))
        .filter(|stem| !stem.starts_with('.'))
        .collect();
    names.sort();
    Ok(names)
}
