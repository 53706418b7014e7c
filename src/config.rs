//! Per-source-directory configuration defaults.
//!
//! A source directory may carry a `tankobon.json` file supplying defaults
//! for the series name, naming pattern, regex overrides, worker count, and a
//! batch expression. Caller-supplied values always override file values. An
//! absent file is fine; an unreadable or malformed one is a hard startup
//! failure naming the file, never a warning.

use serde::Deserialize;
use std::path::Path;

use crate::error::{Error, Result};

/// File name looked up inside the source directory.
pub const SOURCE_CONFIG_FILE: &str = "tankobon.json";

/// Optional defaults read from [`SOURCE_CONFIG_FILE`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SourceConfig {
    /// Series name (`"serie"` accepted for compatibility with older files).
    #[serde(default, alias = "serie")]
    pub series: Option<String>,
    /// Named pattern from the registry.
    #[serde(default)]
    pub pattern: Option<String>,
    /// Explicit main-chapter regex override.
    #[serde(default)]
    pub chapter_regex: Option<String>,
    /// Explicit extra-chapter regex override.
    #[serde(default)]
    pub extra_regex: Option<String>,
    /// Worker count (`"nb_worker"` accepted as an alias).
    #[serde(default, alias = "nb_worker")]
    pub workers: Option<usize>,
    /// Batch expression, same grammar as `range::resolve_batch`.
    #[serde(default)]
    pub batch: Option<String>,
}

impl SourceConfig {
    /// Loads the config file from `source_dir`, if present.
    pub async fn load(source_dir: &Path) -> Result<Option<SourceConfig>> {
        let path = source_dir.join(SOURCE_CONFIG_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let contents = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| Error::ConfigParse {
                path: path.clone(),
                detail: e.to_string(),
            })?;
        parse(&path, &contents).map(Some)
    }
}

fn parse(path: &Path, contents: &str) -> Result<SourceConfig> {
    let value: serde_json::Value =
        serde_json::from_str(contents).map_err(|e| Error::ConfigParse {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
    if !value.is_object() {
        return Err(Error::ConfigParse {
            path: path.to_path_buf(),
            detail: "expected a JSON object".to_string(),
        });
    }
    serde_json::from_value(value).map_err(|e| Error::ConfigParse {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })
}
