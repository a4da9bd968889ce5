//! Command implementations.

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use globset::GlobSet;

pub mod check;
pub mod fix;
pub mod info;

/// Read a file and validate its size against the configured limit.
///
/// Combines the file-read and size-validation steps that every command
/// needs.
pub fn read_input_file(path: &Utf8Path, max_bytes: Option<usize>) -> anyhow::Result<String> {
    // Preflight: check file size via metadata before reading into memory.
    let metadata =
        std::fs::metadata(path.as_std_path()).with_context(|| format!("failed to read {path}"))?;
    if let Some(max) = max_bytes {
        let size = metadata.len() as usize;
        if size > max {
            anyhow::bail!("input too large: {path} is {size} bytes (limit: {max} bytes)");
        }
    }

    let content = std::fs::read_to_string(path.as_std_path())
        .with_context(|| format!("failed to read {path}"))?;
    Ok(content)
}

/// Recursively discover markdown documents under `dir`.
///
/// Applies the configured exclusion globs against paths relative to `dir`
/// (README files are excluded by default). Results are sorted so output
/// is stable run to run.
pub fn discover_documents(dir: &Utf8Path, excludes: &GlobSet) -> anyhow::Result<Vec<Utf8PathBuf>> {
    if !dir.is_dir() {
        anyhow::bail!("directory '{dir}' does not exist");
    }

    let pattern = dir.join("**/*.md");
    let mut files = Vec::new();
    for entry in glob::glob(pattern.as_str())
        .with_context(|| format!("invalid discovery pattern {pattern}"))?
    {
        match entry {
            Ok(path) => {
                let Ok(path) = Utf8PathBuf::from_path_buf(path) else {
                    tracing::warn!("skipping non-UTF-8 path during discovery");
                    continue;
                };
                let relative = path.strip_prefix(dir).unwrap_or(&path);
                if excludes.is_match(relative.as_std_path()) {
                    tracing::debug!(path = %path, "excluded from discovery");
                    continue;
                }
                files.push(path);
            }
            Err(e) => {
                // Unreadable entries are skipped, not fatal.
                tracing::warn!(error = %e, "skipping unreadable path during discovery");
            }
        }
    }

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use slashlint_core::Config;

    #[test]
    fn discovery_finds_nested_markdown_and_skips_readme() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        std::fs::create_dir(root.join("nested")).unwrap();
        std::fs::write(root.join("a.md"), "body\n").unwrap();
        std::fs::write(root.join("nested/b.md"), "body\n").unwrap();
        std::fs::write(root.join("README.md"), "readme\n").unwrap();
        std::fs::write(root.join("notes.txt"), "not markdown\n").unwrap();

        let excludes = Config::default().exclude_globs();
        let files = discover_documents(&root, &excludes).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(&root).unwrap().as_str())
            .collect();
        assert_eq!(names, vec!["a.md", "nested/b.md"]);
    }

    #[test]
    fn discovery_errors_on_missing_directory() {
        let excludes = Config::default().exclude_globs();
        assert!(discover_documents(Utf8Path::new("/no/such/dir"), &excludes).is_err());
    }
}
