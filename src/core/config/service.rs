use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Map, Value};

use super::paths::AppPaths;
use super::settings::RagSettings;
use super::validation::validate_config;
use crate::core::errors::ApiError;

const REDACT_PLACEHOLDER: &str = "****";

const SENSITIVE_PATTERNS: [&str; 8] = [
    "api_key",
    "secret",
    "password",
    "_token",
    "token_",
    "credential",
    "private_key",
    "bearer",
];

const SENSITIVE_WHITELIST: [&str; 3] = ["max_tokens", "token_count", "tokens"];

/// Environment variables that fill configuration values the files leave empty.
const ENV_OVERRIDES: [(&str, &[&str]); 2] = [
    ("GOOGLE_API_KEY", &["gemini", "api_key"]),
    ("WASTE_RAG_API_KEY", &["server", "api_key"]),
];

#[derive(Clone)]
pub struct ConfigService {
    paths: Arc<AppPaths>,
}

impl ConfigService {
    pub fn new(paths: Arc<AppPaths>) -> Self {
        Self { paths }
    }

    pub fn config_path(&self) -> PathBuf {
        if let Ok(path) = env::var("WASTE_RAG_CONFIG_PATH") {
            return PathBuf::from(path);
        }

        let user_config = self.paths.config_dir.join("config.yml");
        if user_config.exists() {
            return user_config;
        }

        self.paths.project_root.join("config.yml")
    }

    pub fn secrets_path(&self) -> PathBuf {
        self.paths.config_dir.join("secrets.yaml")
    }

    /// Public config with secrets merged over it and environment fallbacks
    /// applied. Missing or malformed files read as empty mappings.
    pub fn load_config(&self) -> Value {
        let public_config = load_yaml_file(&self.config_path());
        let secrets_config = load_yaml_file(&self.secrets_path());
        let mut merged = deep_merge(&public_config, &secrets_config);
        apply_env_overrides(&mut merged, |name| env::var(name).ok());
        merged
    }

    pub fn load_settings(&self) -> Result<RagSettings, ApiError> {
        let config = self.load_config();
        validate_config(&config)?;
        RagSettings::from_config(&config)
    }

    pub fn redact_sensitive_values(&self, value: &Value) -> Value {
        redact_sensitive_values(value)
    }
}

fn load_yaml_file(path: &Path) -> Value {
    if !path.exists() {
        return Value::Object(Map::new());
    }

    match fs::read_to_string(path) {
        Ok(contents) => match serde_yaml::from_str::<Value>(&contents) {
            Ok(value @ Value::Object(_)) => value,
            Ok(_) => Value::Object(Map::new()),
            Err(err) => {
                tracing::warn!("Ignoring malformed config {}: {}", path.display(), err);
                Value::Object(Map::new())
            }
        },
        Err(err) => {
            tracing::warn!("Failed to read config {}: {}", path.display(), err);
            Value::Object(Map::new())
        }
    }
}

fn apply_env_overrides<F>(config: &mut Value, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    for (var, path) in ENV_OVERRIDES {
        let Some(value) = lookup(var).filter(|v| !v.trim().is_empty()) else {
            continue;
        };
        let already_set = path
            .iter()
            .try_fold(&*config, |node, key| node.get(*key))
            .and_then(|v| v.as_str())
            .map(|s| !s.trim().is_empty())
            .unwrap_or(false);
        if !already_set {
            ensure_object_path(config, path, Value::String(value));
        }
    }
}

fn ensure_object_path(config: &mut Value, path: &[&str], value: Value) {
    if path.is_empty() {
        return;
    }

    let mut current = config;
    for (index, key) in path.iter().enumerate() {
        if index == path.len() - 1 {
            if let Some(map) = current.as_object_mut() {
                map.insert(key.to_string(), value);
            }
            return;
        }

        if !current.get(*key).map(|v| v.is_object()).unwrap_or(false) {
            let Some(map) = current.as_object_mut() else {
                return;
            };
            map.insert((*key).to_string(), Value::Object(Map::new()));
        }

        let Some(next) = current.get_mut(*key) else {
            return;
        };
        current = next;
    }
}

fn deep_merge(base: &Value, override_value: &Value) -> Value {
    match (base, override_value) {
        (Value::Object(base_map), Value::Object(override_map)) => {
            let mut merged: Map<String, Value> = base_map.clone();
            for (key, value) in override_map {
                let merged_value = match merged.get(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value.clone(),
                };
                merged.insert(key.clone(), merged_value);
            }
            Value::Object(merged)
        }
        _ => override_value.clone(),
    }
}

fn redact_sensitive_values(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut redacted = Map::new();
            for (key, val) in map {
                if is_sensitive_key(key) && !val.is_null() {
                    redacted.insert(key.clone(), Value::String(REDACT_PLACEHOLDER.to_string()));
                } else {
                    redacted.insert(key.clone(), redact_sensitive_values(val));
                }
            }
            Value::Object(redacted)
        }
        Value::Array(items) => Value::Array(items.iter().map(redact_sensitive_values).collect()),
        _ => value.clone(),
    }
}

fn is_sensitive_key(key: &str) -> bool {
    let key_lower = key.to_lowercase();
    if SENSITIVE_WHITELIST
        .iter()
        .any(|allowed| *allowed == key_lower)
    {
        return false;
    }
    SENSITIVE_PATTERNS
        .iter()
        .any(|pattern| key_lower.contains(pattern))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deep_merge_merges_objects_and_overrides_scalars() {
        let base = json!({
            "corpus": { "dir": "warehouse/gemini", "min_chunk_chars": 50 },
            "query": { "example_queries": ["a", "b"] }
        });
        let secrets = json!({
            "corpus": { "min_chunk_chars": 10 },
            "query": { "example_queries": ["c"] },
            "gemini": { "api_key": "k" }
        });

        let merged = deep_merge(&base, &secrets);

        assert_eq!(
            merged,
            json!({
                "corpus": { "dir": "warehouse/gemini", "min_chunk_chars": 10 },
                "query": { "example_queries": ["c"] },
                "gemini": { "api_key": "k" }
            })
        );
    }

    #[test]
    fn env_override_fills_missing_key_only() {
        let mut empty = json!({});
        apply_env_overrides(&mut empty, |name| {
            (name == "GOOGLE_API_KEY").then(|| "from-env".to_string())
        });
        assert_eq!(empty["gemini"]["api_key"], "from-env");

        let mut configured = json!({ "gemini": { "api_key": "from-file" } });
        apply_env_overrides(&mut configured, |_| Some("from-env".to_string()));
        assert_eq!(configured["gemini"]["api_key"], "from-file");
        assert_eq!(configured["server"]["api_key"], "from-env");
    }

    #[test]
    fn redact_sensitive_values_replaces_secrets_only() {
        let input = json!({
            "gemini": { "api_key": "secret", "base_url": "https://example" },
            "server": { "api_key": null, "port": 5000 },
            "generation": { "max_tokens": 42 }
        });

        let redacted = redact_sensitive_values(&input);

        assert_eq!(
            redacted,
            json!({
                "gemini": { "api_key": "****", "base_url": "https://example" },
                "server": { "api_key": null, "port": 5000 },
                "generation": { "max_tokens": 42 }
            })
        );
    }

    #[test]
    fn malformed_yaml_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yml");
        fs::write(&path, "corpus: [unclosed").unwrap();

        assert_eq!(load_yaml_file(&path), json!({}));
        assert_eq!(load_yaml_file(&dir.path().join("missing.yml")), json!({}));
    }

    #[test]
    fn secrets_file_is_merged_into_settings() {
        let dir = tempfile::tempdir().unwrap();
        let paths = Arc::new(AppPaths::with_root(dir.path().to_path_buf()));
        fs::create_dir_all(&paths.config_dir).unwrap();
        fs::write(
            paths.config_dir.join("config.yml"),
            "corpus:\n  dir: mail\ncache:\n  checkpoint_interval: 25\n",
        )
        .unwrap();
        fs::write(
            paths.config_dir.join("secrets.yaml"),
            "server:\n  api_key: s3cret\n",
        )
        .unwrap();

        let service = ConfigService::new(paths);
        let settings = service.load_settings().unwrap();

        assert_eq!(settings.corpus.dir, "mail");
        assert_eq!(settings.cache.checkpoint_interval, 25);
        assert_eq!(settings.server_api_key(), Some("s3cret"));
    }
}
