#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use tagflow_core::{CheckOptions, Issue};

pub const CONFIG_FILE: &str = "tagflow.toml";

#[derive(Debug, Error, Diagnostic)]
#[error("config error: {message}")]
#[diagnostic(code(tagflow::config))]
pub struct ConfigError {
    pub message: String,
}

/// Driver policy for one issue; the checker itself never assigns severity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Ignore,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    check: CheckSection,
    #[serde(default)]
    issues: BTreeMap<String, Severity>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct CheckSection {
    #[serde(default)]
    max_chain_depth: Option<usize>,
    #[serde(default)]
    range_subsumption: Option<bool>,
    #[serde(default)]
    color_promotion: Option<bool>,
}

#[derive(Clone, Debug, Default)]
pub struct ResolvedConfig {
    pub config_path: Option<PathBuf>,
    pub options: CheckOptions,
    pub severities: BTreeMap<Issue, Severity>,
}

impl ResolvedConfig {
    /// Every issue is an error unless configured otherwise.
    pub fn severity(&self, issue: Issue) -> Severity {
        self.severities
            .get(&issue)
            .copied()
            .unwrap_or(Severity::Error)
    }
}

pub fn find_config(start: &Path) -> Option<PathBuf> {
    let mut cur = if start.is_file() {
        start.parent()?.to_path_buf()
    } else {
        start.to_path_buf()
    };

    loop {
        let candidate = cur.join(CONFIG_FILE);
        if candidate.is_file() {
            return Some(candidate);
        }
        if !cur.pop() {
            return None;
        }
    }
}

/// Loads `explicit` when given, otherwise the nearest `tagflow.toml` above `start`.
pub fn load_config(explicit: Option<&Path>, start: &Path) -> Result<ResolvedConfig, ConfigError> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => {
            let start = absolute(start);
            match find_config(&start) {
                Some(p) => p,
                None => return Ok(ResolvedConfig::default()),
            }
        }
    };

    let raw = fs::read_to_string(&path).map_err(|e| ConfigError {
        message: format!("failed to read {}: {e}", path.display()),
    })?;
    let mut resolved = parse_config(&raw).map_err(|e| ConfigError {
        message: format!("{}: {}", path.display(), e.message),
    })?;
    debug!(path = %path.display(), "config loaded");
    resolved.config_path = Some(path);
    Ok(resolved)
}

pub fn parse_config(raw: &str) -> Result<ResolvedConfig, ConfigError> {
    let parsed: ConfigFile = toml::from_str(raw).map_err(|e| ConfigError {
        message: format!("failed to parse: {e}"),
    })?;

    let mut options = CheckOptions::default();
    if let Some(depth) = parsed.check.max_chain_depth {
        options.max_chain_depth = depth;
    }
    if let Some(on) = parsed.check.range_subsumption {
        options.range_subsumption = on;
    }
    if let Some(on) = parsed.check.color_promotion {
        options.color_promotion = on;
    }

    let mut severities = BTreeMap::new();
    for (key, severity) in parsed.issues {
        let issue: Issue = key.parse().map_err(|message| ConfigError { message })?;
        severities.insert(issue, severity);
    }

    Ok(ResolvedConfig {
        config_path: None,
        options,
        severities,
    })
}

fn absolute(p: &Path) -> PathBuf {
    p.canonicalize().unwrap_or_else(|_| p.to_path_buf())
}
