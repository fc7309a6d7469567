//! Human-readable class names for WordNet-indexed datasets.
//!
//! Tiny ImageNet ships a `words.txt` mapping each WordNet id to a label,
//! one `<wnid><whitespace><label>` entry per line.

use std::collections::HashMap;
use std::path::Path;

use crate::error::{Error, Result};

/// Parse `words.txt` content into a wnid → label map.
///
/// Lines without a label are skipped.
pub fn parse_class_names(content: &str) -> HashMap<String, String> {
    content
        .lines()
        .filter_map(|line| {
            let line = line.trim_end();
            let (id, name) = line.split_once(char::is_whitespace)?;
            let name = name.trim_start();
            (!name.is_empty()).then(|| (id.to_string(), name.to_string()))
        })
        .collect()
}

/// Map class ids to names using a `words.txt` file.
pub fn lookup_class_names<S: AsRef<str>>(
    path: impl AsRef<Path>,
    ids: &[S],
) -> Result<Vec<String>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::io(format!("reading class names: {}", path.display()), e))?;
    let names = parse_class_names(&content);

    ids.iter()
        .map(|id| {
            let id = id.as_ref();
            names.get(id).cloned().ok_or_else(|| {
                Error::InvalidParameter(format!("class id '{id}' not found in {}", path.display()))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const WORDS: &str = "n02085620\tChihuahua\nn02085782\tJapanese spaniel\nn00000000\n";

    #[test]
    fn test_parse_class_names() {
        let names = parse_class_names(WORDS);
        assert_eq!(names.len(), 2);
        assert_eq!(names["n02085782"], "Japanese spaniel");
    }

    #[test]
    fn test_lookup_preserves_order() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("words.txt");
        std::fs::write(&path, WORDS).unwrap();

        let names = lookup_class_names(&path, &["n02085782", "n02085620"]).unwrap();
        assert_eq!(names, vec!["Japanese spaniel", "Chihuahua"]);
    }

    #[test]
    fn test_lookup_unknown_id() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("words.txt");
        std::fs::write(&path, WORDS).unwrap();

        let err = lookup_class_names(&path, &["n99999999"]).unwrap_err();
        assert!(err.to_string().contains("n99999999"));
    }
}
