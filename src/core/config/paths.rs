use std::env;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub project_root: PathBuf,
    pub config_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl AppPaths {
    pub fn new() -> Self {
        Self::with_root(discover_project_root())
    }

    pub fn with_root(project_root: PathBuf) -> Self {
        let config_dir = project_root.join("config");
        let log_dir = project_root.join("logs");

        let _ = fs::create_dir_all(&log_dir);

        AppPaths {
            project_root,
            config_dir,
            log_dir,
        }
    }

    /// Resolves a configured path; relative paths hang off the project root.
    pub fn resolve(&self, raw: &str) -> PathBuf {
        let candidate = Path::new(raw);
        if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.project_root.join(candidate)
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

fn discover_project_root() -> PathBuf {
    if let Ok(root) = env::var("WASTE_RAG_ROOT") {
        if !root.trim().is_empty() {
            return PathBuf::from(root);
        }
    }

    let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    if looks_like_project_root(&cwd) {
        return cwd;
    }

    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    if has_config_file(&manifest_dir) {
        return manifest_dir;
    }

    cwd
}

/// Either config location `ConfigService` reads from counts.
fn has_config_file(dir: &Path) -> bool {
    dir.join("config.yml").exists() || dir.join("config").join("config.yml").exists()
}

fn looks_like_project_root(dir: &Path) -> bool {
    has_config_file(dir) || dir.join("warehouse").exists()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_keeps_absolute_and_roots_relative() {
        let dir = tempfile::tempdir().unwrap();
        let paths = AppPaths::with_root(dir.path().to_path_buf());

        assert_eq!(
            paths.resolve("warehouse/gemini"),
            dir.path().join("warehouse/gemini")
        );

        let absolute = dir.path().join("elsewhere");
        assert_eq!(paths.resolve(absolute.to_str().unwrap()), absolute);
        assert!(paths.log_dir.exists());
    }

    #[test]
    fn config_dir_file_marks_project_root() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!looks_like_project_root(dir.path()));

        fs::create_dir_all(dir.path().join("config")).unwrap();
        fs::write(dir.path().join("config").join("config.yml"), "query: {}\n").unwrap();

        assert!(looks_like_project_root(dir.path()));
    }

    #[test]
    fn root_config_or_corpus_marks_project_root() {
        let with_config = tempfile::tempdir().unwrap();
        fs::write(with_config.path().join("config.yml"), "").unwrap();
        assert!(looks_like_project_root(with_config.path()));

        let with_corpus = tempfile::tempdir().unwrap();
        fs::create_dir_all(with_corpus.path().join("warehouse")).unwrap();
        assert!(looks_like_project_root(with_corpus.path()));
    }
}
