use std::{fs, path::Path};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

pub fn progress_bar(len: u64) -> ProgressBar {
    ProgressBar::new(len).with_style(
        ProgressStyle::with_template("[{elapsed_precise}] {wide_bar} {pos}/{len} {msg}")
            .expect("hardcoded"),
    )
}

/// Lowercase, with every run of anything outside `a-z0-9` squashed to a single
/// underscore and no underscores at either end.
pub fn sanitize_filename(name: &str) -> String {
    let mut output = String::new();
    for c in name.to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            output.push(c);
        } else if !output.ends_with('_') {
            output.push('_');
        }
    }
    output.trim_matches('_').to_string()
}

pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let mut contents = serde_json::to_string_pretty(value)?;
    contents.push('\n');
    fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize() {
        assert_eq!(sanitize_filename("Road Ranger"), "road_ranger");
        assert_eq!(sanitize_filename("Casey's"), "casey_s");
        assert_eq!(sanitize_filename("  Kum & Go!! "), "kum_go");
        assert_eq!(sanitize_filename("7-Eleven"), "7_eleven");
        assert_eq!(sanitize_filename("Café"), "caf");
        assert_eq!(sanitize_filename("---"), "");
    }
}
