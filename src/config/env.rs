use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use log::{debug, info};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use super::error::{ConfigError, Result};

pub const MODE_VAR: &str = "NODE_ENV";

// Variables exposed to client code must carry this prefix.
static REACT_APP_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^REACT_APP_").unwrap());

/// Set `NODE_ENV` and `BABEL_ENV` in the process environment.
///
/// Must run at startup, before any other thread exists.
pub fn force_mode(mode: &str) {
    std::env::set_var("BABEL_ENV", mode);
    std::env::set_var(MODE_VAR, mode);
}

fn process_mode() -> Result<String> {
    std::env::var_os(MODE_VAR)
        .filter(|mode| !mode.is_empty())
        .map(|mode| mode.to_string_lossy().into_owned())
        .ok_or(ConfigError::MissingMode)
}

/// Merge every existing `.env` candidate for the current mode into the
/// process environment.
///
/// Variables already set are never replaced, so earlier candidates win over
/// later ones. `$VAR`/`${VAR}` references expand against everything loaded so
/// far, the forced mode included. Returns the files that were read, in load
/// order.
pub fn load_dotenv_files(base: &Path) -> Result<Vec<PathBuf>> {
    let mode = process_mode()?;
    let mut loaded = Vec::new();

    for candidate in dotenv_candidates(base, &mode) {
        if !candidate.exists() {
            debug!("Skipping missing env file {}", candidate.display());
            continue;
        }
        dotenvy::from_path(&candidate).map_err(|source| ConfigError::Dotenv {
            path: candidate.clone(),
            source,
        })?;
        info!("Loaded {}", candidate.display());
        loaded.push(candidate);
    }

    Ok(loaded)
}

/// Environment of one invocation, captured once after loading and threaded
/// explicitly from then on.
///
/// Names and values that are not valid UTF-8 are kept and forwarded to the
/// child, but are invisible to lookups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    vars: BTreeMap<OsString, OsString>,
}

impl EnvSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_process() -> Self {
        std::env::vars_os().collect()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(OsStr::new(key)).and_then(|value| value.to_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.vars.contains_key(OsStr::new(key))
    }

    pub fn set(&mut self, key: impl Into<OsString>, value: impl Into<OsString>) {
        self.vars.insert(key.into(), value.into());
    }

    /// UTF-8 entries only.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars
            .iter()
            .filter_map(|(k, v)| Some((k.to_str()?, v.to_str()?)))
    }

    /// Every entry, as handed to a child process.
    pub fn iter_os(&self) -> impl Iterator<Item = (&OsStr, &OsStr)> {
        self.vars.iter().map(|(k, v)| (k.as_os_str(), v.as_os_str()))
    }

    /// Keep only relative `NODE_PATH` entries, resolved against the app directory.
    pub fn resolve_node_path(&mut self, app_dir: &Path) {
        let raw = self
            .vars
            .get(OsStr::new("NODE_PATH"))
            .cloned()
            .unwrap_or_default();
        let folders: Vec<PathBuf> = std::env::split_paths(&raw)
            .filter(|folder| !folder.as_os_str().is_empty() && !folder.is_absolute())
            .map(|folder| app_dir.join(folder))
            .collect();

        let joined = std::env::join_paths(&folders).unwrap_or_default();
        self.set("NODE_PATH", joined);
    }

    /// Values handed to client code through the bundler.
    pub fn client_environment(&self, public_url: &str) -> ClientEnvironment {
        let mut raw: BTreeMap<String, Value> = self
            .iter()
            .filter(|(key, _)| REACT_APP_REGEX.is_match(key))
            .map(|(key, value)| (key.to_string(), Value::from(value)))
            .collect();

        let optional = |key: &str| self.get(key).map_or(Value::Null, Value::from);

        raw.insert(
            MODE_VAR.to_string(),
            Value::from(self.get(MODE_VAR).unwrap_or("development")),
        );
        raw.insert("PUBLIC_URL".to_string(), Value::from(public_url));
        for key in ["WDS_SOCKET_HOST", "WDS_SOCKET_PATH", "WDS_SOCKET_PORT"] {
            raw.insert(key.to_string(), optional(key));
        }
        raw.insert(
            "FAST_REFRESH".to_string(),
            Value::Bool(self.get("FAST_REFRESH") != Some("false")),
        );

        ClientEnvironment { raw }
    }
}

impl FromIterator<(OsString, OsString)> for EnvSnapshot {
    fn from_iter<I: IntoIterator<Item = (OsString, OsString)>>(iter: I) -> Self {
        Self {
            vars: iter.into_iter().collect(),
        }
    }
}

impl FromIterator<(String, String)> for EnvSnapshot {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        iter.into_iter()
            .map(|(k, v)| (OsString::from(k), OsString::from(v)))
            .collect()
    }
}

/// `.env` files to consider for `mode`, highest precedence first.
pub fn dotenv_candidates(base: &Path, mode: &str) -> Vec<PathBuf> {
    let base = base.as_os_str().to_string_lossy();
    let mut candidates = vec![PathBuf::from(format!("{}.{}.local", base, mode))];
    // Tests should produce the same results for everyone.
    if mode != "test" {
        candidates.push(PathBuf::from(format!("{}.local", base)));
    }
    candidates.push(PathBuf::from(format!("{}.{}", base, mode)));
    candidates.push(PathBuf::from(base.as_ref()));
    candidates
}

#[derive(Debug, Clone, Serialize)]
pub struct ClientEnvironment {
    pub raw: BTreeMap<String, Value>,
}

impl ClientEnvironment {
    /// Every value encoded as a JS expression, keyed under `process.env`.
    pub fn stringified(&self) -> BTreeMap<String, BTreeMap<String, String>> {
        let encoded = self
            .raw
            .iter()
            .map(|(key, value)| {
                let expr = match value {
                    Value::Null => "undefined".to_string(),
                    other => other.to_string(),
                };
                (key.clone(), expr)
            })
            .collect();

        BTreeMap::from([("process.env".to_string(), encoded)])
    }
}
