use serde_json::{Map, Value};

use super::defaults;
use crate::core::errors::ApiError;

pub fn validate_config(config: &Value) -> Result<(), ApiError> {
    let root = config
        .as_object()
        .ok_or_else(|| config_type_error("root", "object"))?;

    if let Some(corpus) = expect_optional_object(root, "corpus")? {
        validate_optional_string_field(corpus, "corpus.dir", "dir")?;
        validate_optional_string_field(corpus, "corpus.extension", "extension")?;
        validate_u64_field(corpus, "corpus.min_chunk_chars", "min_chunk_chars", 0, 100_000)?;
    }

    if let Some(cache) = expect_optional_object(root, "cache")? {
        validate_optional_string_field(cache, "cache.path", "path")?;
        validate_u64_field(
            cache,
            "cache.checkpoint_interval",
            "checkpoint_interval",
            1,
            100_000,
        )?;
        validate_u64_field(cache, "cache.preview_chars", "preview_chars", 0, 100_000)?;
    }

    if let Some(embedding) = expect_optional_object(root, "embedding")? {
        validate_optional_string_field(embedding, "embedding.model", "model")?;
        validate_u64_field(
            embedding,
            "embedding.max_input_chars",
            "max_input_chars",
            1,
            1_000_000,
        )?;
        validate_u64_field(embedding, "embedding.timeout_secs", "timeout_secs", 1, 3_600)?;
    }

    if let Some(generation) = expect_optional_object(root, "generation")? {
        validate_optional_string_field(generation, "generation.model", "model")?;
        validate_u64_field(generation, "generation.timeout_secs", "timeout_secs", 1, 3_600)?;
    }

    if let Some(gemini) = expect_optional_object(root, "gemini")? {
        validate_optional_string_field(gemini, "gemini.base_url", "base_url")?;
        validate_optional_string_field(gemini, "gemini.api_key", "api_key")?;
    }

    if let Some(query) = expect_optional_object(root, "query")? {
        validate_u64_field(query, "query.default_max_results", "default_max_results", 1, 100)?;
        validate_u64_field(query, "query.max_results_cap", "max_results_cap", 1, 100)?;
        validate_u64_field(
            query,
            "query.max_question_chars",
            "max_question_chars",
            1,
            100_000,
        )?;
        validate_string_array_field(query, "query.example_queries", "example_queries")?;

        let default = query
            .get("default_max_results")
            .and_then(Value::as_u64)
            .unwrap_or(defaults::DEFAULT_MAX_RESULTS as u64);
        let cap = query
            .get("max_results_cap")
            .and_then(Value::as_u64)
            .unwrap_or(defaults::MAX_RESULTS_CAP as u64);
        if default > cap {
            return Err(ApiError::BadRequest(
                "Invalid config at 'query.default_max_results': must not exceed max_results_cap"
                    .to_string(),
            ));
        }
    }

    if let Some(server) = expect_optional_object(root, "server")? {
        validate_optional_string_field(server, "server.host", "host")?;
        validate_u64_field(server, "server.port", "port", 0, 65_535)?;
        validate_string_array_field(
            server,
            "server.cors_allowed_origins",
            "cors_allowed_origins",
        )?;
        validate_optional_string_field(server, "server.api_key", "api_key")?;
    }

    Ok(())
}

fn expect_optional_object<'a>(
    root: &'a Map<String, Value>,
    key: &str,
) -> Result<Option<&'a Map<String, Value>>, ApiError> {
    match root.get(key) {
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(Value::Null) | None => Ok(None),
        Some(_) => Err(config_type_error(key, "object")),
    }
}

fn validate_u64_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    min: u64,
    max: u64,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(number) = value.as_u64() else {
        return Err(config_type_error(path, "integer"));
    };
    if number < min || number > max {
        return Err(ApiError::BadRequest(format!(
            "Invalid config at '{}': must be between {} and {}",
            path, min, max
        )));
    }
    Ok(())
}

fn validate_optional_string_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    match section.get(key) {
        None | Some(Value::Null) | Some(Value::String(_)) => Ok(()),
        Some(_) => Err(config_type_error(path, "string")),
    }
}

fn validate_string_array_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(items) = value.as_array() else {
        return Err(config_type_error(path, "array of strings"));
    };
    for (index, item) in items.iter().enumerate() {
        let Some(text) = item.as_str() else {
            return Err(config_type_error(&format!("{}[{}]", path, index), "string"));
        };
        if text.trim().is_empty() {
            return Err(ApiError::BadRequest(format!(
                "Invalid config at '{}[{}]': value cannot be empty",
                path, index
            )));
        }
    }
    Ok(())
}

fn config_type_error(path: &str, expected: &str) -> ApiError {
    ApiError::BadRequest(format!(
        "Invalid config at '{}': expected {}",
        path, expected
    ))
}
