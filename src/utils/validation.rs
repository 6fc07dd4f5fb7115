//! Centralized validation and helper functions.

use std::path::Path;

use crate::search::config::ConfigError;

/// Parse a non-negative integer setting.
///
/// Used as a clap value parser so that malformed numbers surface as
/// [`ConfigError::InvalidInteger`].
///
/// # Examples
///
/// ```
/// use palindrome_search::utils::validation::parse_count;
///
/// assert_eq!(parse_count("10").unwrap(), 10);
/// assert_eq!(parse_count(" 7 ").unwrap(), 7);
/// assert!(parse_count("ten").is_err());
/// assert!(parse_count("-1").is_err());
/// ```
///
/// # Errors
///
/// Returns [`ConfigError::InvalidInteger`] if `value` is not a non-negative
/// integer.
pub fn parse_count(value: &str) -> Result<usize, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidInteger {
            value: value.to_string(),
        })
}

/// Check that `path` can be created as a new output file.
///
/// The file must not exist yet, and its parent directory must exist and not
/// be read-only.
///
/// # Errors
///
/// Returns [`ConfigError::OutputNotWritable`] naming the problem.
pub fn check_output_writable(path: &Path) -> Result<(), ConfigError> {
    let not_writable = |reason: &str| ConfigError::OutputNotWritable {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    };

    if path.exists() {
        return Err(not_writable("file already exists"));
    }

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let metadata = std::fs::metadata(parent)
        .map_err(|_| not_writable("parent directory does not exist"))?;
    if !metadata.is_dir() {
        return Err(not_writable("parent is not a directory"));
    }
    if metadata.permissions().readonly() {
        return Err(not_writable("parent directory is read-only"));
    }

    Ok(())
}
