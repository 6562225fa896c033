use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};

pub const PROJECT_CONFIG_FILE: &str = ".aia.toml";

fn default_base_branch() -> String {
    "main".to_string()
}

/// Repository the workflow operates on. Fixed for the lifetime of a coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowConfig {
    pub repo_owner: String,
    pub repo_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_number: Option<u64>,
    #[serde(default = "default_base_branch")]
    pub default_base_branch: String,
}

impl WorkflowConfig {
    pub fn new(repo_owner: impl Into<String>, repo_name: impl Into<String>) -> Self {
        Self {
            repo_owner: repo_owner.into(),
            repo_name: repo_name.into(),
            project_number: None,
            default_base_branch: default_base_branch(),
        }
    }

    pub fn with_project_number(mut self, project_number: u64) -> Self {
        self.project_number = Some(project_number);
        self
    }

    pub fn with_base_branch(mut self, branch: impl Into<String>) -> Self {
        self.default_base_branch = branch.into();
        self
    }

    /// `owner/name`
    pub fn repo_full_name(&self) -> String {
        format!("{}/{}", self.repo_owner, self.repo_name)
    }
}

/// Where a loaded configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Environment,
    File(PathBuf),
    GitRemote(String),
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::Environment => f.write_str("environment"),
            ConfigSource::File(path) => write!(f, "{}", path.display()),
            ConfigSource::GitRemote(url) => write!(f, "git remote {url}"),
        }
    }
}

pub fn project_config_path() -> PathBuf {
    PathBuf::from(PROJECT_CONFIG_FILE)
}

pub fn user_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".aia")
        .join("config.toml")
}

/// Resolves the configuration: environment, project file, user file, then
/// the `origin` remote. Returns `None` when nothing matched.
pub async fn load_config() -> Result<Option<(WorkflowConfig, ConfigSource)>> {
    resolve_config(
        |key| std::env::var(key).ok(),
        &[project_config_path(), user_config_path()],
        origin_url(),
    )
    .await
}

/// `remote` is only awaited when neither the environment nor a file matched.
pub async fn resolve_config(
    var: impl Fn(&str) -> Option<String>,
    files: &[PathBuf],
    remote: impl Future<Output = Option<String>>,
) -> Result<Option<(WorkflowConfig, ConfigSource)>> {
    if let Some(config) = config_from_env(var)? {
        return Ok(Some((config, ConfigSource::Environment)));
    }

    for path in files {
        if path.exists() {
            let config = load_file(path)?;
            return Ok(Some((config, ConfigSource::File(path.clone()))));
        }
    }

    if let Some(url) = remote.await {
        if let Some((owner, name)) = parse_remote_url(&url) {
            return Ok(Some((
                WorkflowConfig::new(owner, name),
                ConfigSource::GitRemote(url),
            )));
        }
    }

    Ok(None)
}

/// Reads `GITHUB_REPO_OWNER`/`GITHUB_REPO_NAME`, plus the optional
/// `GITHUB_PROJECT_NUMBER` and `DEFAULT_BASE_BRANCH`.
pub fn config_from_env(var: impl Fn(&str) -> Option<String>) -> Result<Option<WorkflowConfig>> {
    let (Some(owner), Some(name)) = (var("GITHUB_REPO_OWNER"), var("GITHUB_REPO_NAME")) else {
        return Ok(None);
    };
    if owner.is_empty() || name.is_empty() {
        return Ok(None);
    }

    let mut config = WorkflowConfig::new(owner, name);
    if let Some(raw) = var("GITHUB_PROJECT_NUMBER").filter(|v| !v.is_empty()) {
        let number = raw
            .parse()
            .with_context(|| format!("GITHUB_PROJECT_NUMBER is not a number: {raw}"))?;
        config = config.with_project_number(number);
    }
    if let Some(branch) = var("DEFAULT_BASE_BRANCH").filter(|v| !v.is_empty()) {
        config = config.with_base_branch(branch);
    }
    Ok(Some(config))
}

pub fn load_file(path: &Path) -> Result<WorkflowConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;
    let config: WorkflowConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(config)
}

pub fn save_config(path: &Path, config: &WorkflowConfig) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let contents = toml::to_string_pretty(config).context("Failed to serialize config")?;
    std::fs::write(path, contents)
        .with_context(|| format!("Failed to write config to {}", path.display()))?;
    Ok(())
}

async fn origin_url() -> Option<String> {
    let output = tokio::process::Command::new("git")
        .args(["remote", "get-url", "origin"])
        .output()
        .await
        .ok()?;
    if !output.status.success() {
        return None;
    }
    Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Owner and name from a GitHub HTTPS or SSH remote URL.
pub fn parse_remote_url(url: &str) -> Option<(String, String)> {
    let path = url
        .strip_prefix("https://github.com/")
        .or_else(|| url.strip_prefix("git@github.com:"))
        .or_else(|| url.strip_prefix("ssh://git@github.com/"))?;
    let path = path.trim_end_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);
    let (owner, name) = path.split_once('/')?;
    if owner.is_empty() || name.is_empty() || name.contains('/') {
        return None;
    }
    Some((owner.to_string(), name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn full_name_joins_owner_and_repo() {
        let config = WorkflowConfig::new("acme", "widgets");
        assert_eq!(config.repo_full_name(), "acme/widgets");
        assert_eq!(config.default_base_branch, "main");
        assert_eq!(config.project_number, None);
    }

    #[test]
    fn env_config_with_all_fields() {
        let config = config_from_env(env(&[
            ("GITHUB_REPO_OWNER", "acme"),
            ("GITHUB_REPO_NAME", "widgets"),
            ("GITHUB_PROJECT_NUMBER", "4"),
            ("DEFAULT_BASE_BRANCH", "develop"),
        ]))
        .unwrap()
        .unwrap();
        assert_eq!(
            config,
            WorkflowConfig::new("acme", "widgets")
                .with_project_number(4)
                .with_base_branch("develop")
        );
    }

    #[test]
    fn env_config_needs_owner_and_name() {
        assert!(config_from_env(env(&[("GITHUB_REPO_OWNER", "acme")]))
            .unwrap()
            .is_none());
        assert!(config_from_env(env(&[])).unwrap().is_none());
    }

    #[test]
    fn env_config_rejects_bad_project_number() {
        let result = config_from_env(env(&[
            ("GITHUB_REPO_OWNER", "acme"),
            ("GITHUB_REPO_NAME", "widgets"),
            ("GITHUB_PROJECT_NUMBER", "four"),
        ]));
        assert!(result.unwrap_err().to_string().contains("four"));
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(PROJECT_CONFIG_FILE);
        let config = WorkflowConfig::new("acme", "widgets").with_project_number(2);

        save_config(&path, &config).unwrap();
        assert_eq!(load_file(&path).unwrap(), config);
    }

    #[test]
    fn file_defaults_base_branch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PROJECT_CONFIG_FILE);
        std::fs::write(&path, "repo_owner = \"acme\"\nrepo_name = \"widgets\"\n").unwrap();

        let config = load_file(&path).unwrap();
        assert_eq!(config.default_base_branch, "main");
        assert_eq!(config.project_number, None);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PROJECT_CONFIG_FILE);
        std::fs::write(&path, "repo_owner = ").unwrap();
        assert!(load_file(&path).is_err());
    }

    #[test]
    fn parses_github_remotes() {
        let expected = Some(("acme".to_string(), "widgets".to_string()));
        assert_eq!(parse_remote_url("https://github.com/acme/widgets.git"), expected);
        assert_eq!(parse_remote_url("https://github.com/acme/widgets"), expected);
        assert_eq!(parse_remote_url("git@github.com:acme/widgets.git"), expected);
        assert_eq!(parse_remote_url("ssh://git@github.com/acme/widgets.git"), expected);
        assert_eq!(parse_remote_url("https://gitlab.com/acme/widgets.git"), None);
        assert_eq!(parse_remote_url("https://github.com/acme"), None);
    }

    #[tokio::test]
    async fn resolution_prefers_files_over_remote() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        let present = dir.path().join("config.toml");
        save_config(&present, &WorkflowConfig::new("acme", "widgets")).unwrap();

        let (config, source) = resolve_config(
            env(&[]),
            &[missing.clone(), present.clone()],
            async { Some("git@github.com:other/repo.git".to_string()) },
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(config.repo_full_name(), "acme/widgets");
        assert_eq!(source, ConfigSource::File(present));

        let (config, source) = resolve_config(
            env(&[]),
            &[missing.clone()],
            async { Some("https://github.com/other/repo.git".to_string()) },
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(config.repo_full_name(), "other/repo");
        assert_eq!(config.project_number, None);
        assert!(matches!(source, ConfigSource::GitRemote(_)));

        let nothing = resolve_config(env(&[]), &[missing], async { None }).await.unwrap();
        assert!(nothing.is_none());
    }

    #[tokio::test]
    async fn resolution_prefers_environment() {
        let resolved = resolve_config(
            env(&[("GITHUB_REPO_OWNER", "acme"), ("GITHUB_REPO_NAME", "widgets")]),
            &[],
            async { Some("git@github.com:other/repo.git".to_string()) },
        )
        .await
        .unwrap();
        assert_eq!(
            resolved,
            Some((WorkflowConfig::new("acme", "widgets"), ConfigSource::Environment))
        );
    }
}
