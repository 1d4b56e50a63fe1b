//! Reading an exercise directory into a file map.

use anyhow::{Context, Result};
use gradekit_core::FileKind;
use indexmap::IndexMap;
use std::path::Path;

/// Every HTML, CSS and JavaScript file directly inside `dir`, keyed by file
/// name and sorted so `index.html` selection and report order are stable.
pub fn load_exercise(dir: &Path) -> Result<IndexMap<String, String>> {
    let mut entries = Vec::new();
    for entry in
        std::fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))?
    {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };
        if FileKind::from_file_name(&name).is_none() {
            continue;
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        entries.push((name, content));
    }

    entries.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(entries.into_iter().collect())
}
