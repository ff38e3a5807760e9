//! Configuration loading with env-var overrides.
//!
//! Reads `config/default.toml` relative to the current working directory,
//! then applies `ARALIYA_WORK_DIR`, `ARALIYA_LOG_LEVEL` and `ARALIYA_USER`
//! env overrides.

use std::{
    collections::BTreeMap,
    env, fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use serde::Deserialize;

use crate::error::AppError;
use crate::subsystems::knowledge::registry::Agent;

/// Which [`DocumentStore`](crate::subsystems::knowledge::store::DocumentStore)
/// backend the service opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// `{work_dir}/knowledge/knowledge.db`.
    Sqlite,
    /// In-process, gone on exit.
    Tmp,
}

impl FromStr for StoreBackend {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "tmp" => Ok(Self::Tmp),
            other => Err(AppError::Config(format!(
                "unknown store '{other}' (expected \"sqlite\" or \"tmp\")"
            ))),
        }
    }
}

/// Mention suggestion limits (`[knowledge.mentions]`).
#[derive(Debug, Clone)]
pub struct MentionsConfig {
    /// Documents considered by the flat ranker and listed for a bare `@knowledge/`.
    pub flat_document_cap: usize,
    pub flat_result_cap: usize,
    pub per_category: usize,
    pub empty_query_fill: usize,
}

/// Fully-resolved configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub name: String,
    pub work_dir: PathBuf,
    pub log_level: String,
    /// Acting user for documents created and edited through this process.
    pub user: String,
    pub store: StoreBackend,
    pub content_token_cap: usize,
    pub cache_capacity: usize,
    pub mentions: MentionsConfig,
    /// Enabled and disabled agents, sorted by id.
    pub agents: Vec<Agent>,
}

/// Raw TOML shape — `serde` target before resolution.
#[derive(Deserialize)]
struct RawConfig {
    knowledge: RawKnowledge,
    /// `[agents.<id>]` subsections.
    #[serde(default)]
    agents: BTreeMap<String, RawAgentEntry>,
}

#[derive(Deserialize)]
struct RawKnowledge {
    #[serde(default = "default_name")]
    name: String,
    work_dir: String,
    #[serde(default = "default_log_level")]
    log_level: String,
    #[serde(default = "default_user")]
    user: String,
    #[serde(default = "default_store")]
    store: String,
    #[serde(default)]
    index: RawIndex,
    #[serde(default)]
    cache: RawCache,
    #[serde(default)]
    mentions: RawMentions,
}

#[derive(Deserialize)]
struct RawIndex {
    #[serde(default = "default_content_token_cap")]
    content_token_cap: usize,
}

impl Default for RawIndex {
    fn default() -> Self {
        Self { content_token_cap: default_content_token_cap() }
    }
}

#[derive(Deserialize)]
struct RawCache {
    #[serde(default = "default_cache_capacity")]
    capacity: usize,
}

impl Default for RawCache {
    fn default() -> Self {
        Self { capacity: default_cache_capacity() }
    }
}

#[derive(Deserialize)]
struct RawMentions {
    #[serde(default = "default_flat_document_cap")]
    flat_document_cap: usize,
    #[serde(default = "default_flat_result_cap")]
    flat_result_cap: usize,
    #[serde(default = "default_per_category")]
    per_category: usize,
    #[serde(default = "default_empty_query_fill")]
    empty_query_fill: usize,
}

impl Default for RawMentions {
    fn default() -> Self {
        Self {
            flat_document_cap: default_flat_document_cap(),
            flat_result_cap: default_flat_result_cap(),
            per_category: default_per_category(),
            empty_query_fill: default_empty_query_fill(),
        }
    }
}

#[derive(Deserialize)]
struct RawAgentEntry {
    /// Defaults to the section id.
    name: Option<String>,
    #[serde(default)]
    description: String,
    icon: Option<String>,
    color: Option<String>,
    /// Defaults to `true`; set to `false` to disable without removing the section.
    #[serde(default = "default_true")]
    enabled: bool,
}

fn default_name() -> String { "araliya-knowledge".to_string() }
fn default_log_level() -> String { "info".to_string() }
fn default_user() -> String { "local".to_string() }
fn default_store() -> String { "sqlite".to_string() }
fn default_content_token_cap() -> usize { 1000 }
fn default_cache_capacity() -> usize { 10 }
fn default_flat_document_cap() -> usize { 20 }
fn default_flat_result_cap() -> usize { 15 }
fn default_per_category() -> usize { 3 }
fn default_empty_query_fill() -> usize { 10 }

fn default_true() -> bool {
    true
}

/// Env-var or CLI overrides applied on top of the TOML file.
#[derive(Debug, Clone, Copy, Default)]
pub struct Overrides<'a> {
    pub work_dir: Option<&'a str>,
    pub log_level: Option<&'a str>,
    pub user: Option<&'a str>,
}

/// Load config from `config/default.toml`, then apply env-var overrides.
pub fn load() -> Result<Config, AppError> {
    load_path(Path::new("config/default.toml"))
}

/// Like [`load`], with an explicit config path.
pub fn load_path(path: &Path) -> Result<Config, AppError> {
    let work_dir = env::var("ARALIYA_WORK_DIR").ok();
    let log_level = env::var("ARALIYA_LOG_LEVEL").ok();
    let user = env::var("ARALIYA_USER").ok();
    load_from(
        path,
        Overrides {
            work_dir: work_dir.as_deref(),
            log_level: log_level.as_deref(),
            user: user.as_deref(),
        },
    )
}

/// Internal loader — accepts an explicit path and optional overrides.
/// Tests pass overrides directly instead of mutating env vars.
pub fn load_from(path: &Path, overrides: Overrides<'_>) -> Result<Config, AppError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;

    let parsed: RawConfig = toml::from_str(&raw)
        .map_err(|e| AppError::Config(format!("parse error in {}: {e}", path.display())))?;

    let k = parsed.knowledge;

    if k.cache.capacity == 0 {
        return Err(AppError::Config("[knowledge.cache] capacity must be at least 1".into()));
    }

    Ok(Config {
        name: k.name,
        work_dir: expand_home(overrides.work_dir.unwrap_or(&k.work_dir)),
        log_level: overrides.log_level.unwrap_or(&k.log_level).to_string(),
        user: overrides.user.unwrap_or(&k.user).to_string(),
        store: k.store.parse()?,
        content_token_cap: k.index.content_token_cap,
        cache_capacity: k.cache.capacity,
        mentions: MentionsConfig {
            flat_document_cap: k.mentions.flat_document_cap,
            flat_result_cap: k.mentions.flat_result_cap,
            per_category: k.mentions.per_category,
            empty_query_fill: k.mentions.empty_query_fill,
        },
        agents: parsed
            .agents
            .into_iter()
            .map(|(id, e)| Agent {
                name: e.name.unwrap_or_else(|| id.clone()),
                id,
                description: e.description,
                icon: e.icon,
                color: e.color,
                enabled: e.enabled,
            })
            .collect(),
    })
}

/// Expand a leading `~` to the user's home directory.
/// Absolute or relative paths without `~` are returned unchanged.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

// ── test helpers ──────────────────────────────────────────────────────────────

impl Config {
    /// In-memory store, default limits, user `"tester"`.
    pub fn test_default(work_dir: &Path) -> Self {
        Self {
            name: "test".into(),
            work_dir: work_dir.to_path_buf(),
            log_level: "info".into(),
            user: "tester".into(),
            store: StoreBackend::Tmp,
            content_token_cap: default_content_token_cap(),
            cache_capacity: default_cache_capacity(),
            mentions: MentionsConfig {
                flat_document_cap: default_flat_document_cap(),
                flat_result_cap: default_flat_result_cap(),
                per_category: default_per_category(),
                empty_query_fill: default_empty_query_fill(),
            },
            agents: Vec::new(),
        }
    }
}
