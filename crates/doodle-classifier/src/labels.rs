//! Class label files: one label per line, in model output order.

use crate::error::{ClassifierError, ClassifierResult};
use std::fs;
use std::path::Path;

/// Parse label text. Blank lines are skipped and labels are trimmed.
pub fn parse_labels(text: &str) -> ClassifierResult<Vec<String>> {
    let labels: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();
    if labels.is_empty() {
        return Err(ClassifierError::Labels("no labels found".to_string()));
    }
    Ok(labels)
}

/// Read and parse a label file.
pub fn load_labels(path: &Path) -> ClassifierResult<Vec<String>> {
    let text = fs::read_to_string(path)
        .map_err(|e| ClassifierError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
    let labels = parse_labels(&text)?;
    log::info!("Loaded {} labels from {}", labels.len(), path.display());
    Ok(labels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_labels() {
        let labels = parse_labels("cat\n\n  house \r\nsun\n").unwrap();
        assert_eq!(labels, ["cat", "house", "sun"]);
    }

    #[test]
    fn test_empty_labels_rejected() {
        assert!(matches!(parse_labels(" \n\n"), Err(ClassifierError::Labels(_))));
    }

    #[test]
    fn test_load_labels_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "apple\nbanana").unwrap();
        let labels = load_labels(file.path()).unwrap();
        assert_eq!(labels, ["apple", "banana"]);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_labels(&dir.path().join("missing.txt"));
        assert!(matches!(result, Err(ClassifierError::Io(_))));
    }
}
