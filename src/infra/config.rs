use crate::domain::{DeploySettings, InfraProject, ServiceContainer, ServiceEnv};
use crate::infra::locator::{DEFAULT_RUNTIME_NAME, default_candidates};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_DECKHAND_TOML_NAME: &str = "deckhand.toml";
pub const DEFAULT_DECKHAND_TOML: &str = include_str!("../../config/default_deckhand.toml");

pub const DEFAULT_STATUS_FORMAT: &str = "table {{.Names}}\t{{.Status}}\t{{.Ports}}";
pub const DEFAULT_SERVICE_ONLY_FILE: &str = "docker-compose.study-only.yml";
pub const DEFAULT_CONTAINER_NAME: &str = "asyncsite-study-service";
pub const DEFAULT_IMAGE: &str = "asyncsite/study-service:latest";
pub const DEFAULT_NETWORK: &str = "asyncsite-network";
pub const DEFAULT_PORT: &str = "8083:8083";
pub const DEFAULT_INFRA_DIR: &str = "../core-platform";

pub fn default_config_dir() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(".config/deckhand")
}

pub fn ensure_config_dir(config_dir: &Path) -> Result<()> {
    fs::create_dir_all(config_dir).with_context(|| format!("creating {:?}", config_dir))
}

#[derive(Deserialize, Debug, Default)]
pub struct RuntimeConfig {
    pub program: Option<String>,
    pub candidates: Option<Vec<PathBuf>>,
    pub command_timeout_secs: Option<u64>,
    pub status_format: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct ProjectConfig {
    pub artifact_command: Option<Vec<String>>,
}

#[derive(Deserialize, Debug, Default)]
pub struct ComposeConfig {
    pub file: Option<PathBuf>,
    pub service_only_file: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default)]
pub struct ServiceEnvConfig {
    pub active_profile: Option<String>,
    pub registry_url: Option<String>,
    pub datasource_url: Option<String>,
    pub datasource_username: Option<String>,
    pub datasource_password: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct ServiceConfig {
    pub container_name: Option<String>,
    pub image: Option<String>,
    pub network: Option<String>,
    pub port: Option<String>,
    #[serde(default)]
    pub env: ServiceEnvConfig,
}

#[derive(Deserialize, Debug, Default)]
pub struct InfraConfig {
    pub dir: Option<PathBuf>,
    pub services: Option<Vec<String>>,
    pub endpoints: Option<Vec<String>>,
}

/// One `deckhand.toml`, every key optional.
#[derive(Deserialize, Debug, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub runtime: RuntimeConfig,
    #[serde(default)]
    pub project: ProjectConfig,
    #[serde(default)]
    pub compose: ComposeConfig,
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub infra: InfraConfig,
}

fn pick<T>(target: &mut Option<T>, other: Option<T>) {
    if other.is_some() {
        *target = other;
    }
}

impl AppConfig {
    /// Merges another AppConfig into self.
    /// Values from `other` overwrite values in `self` if present.
    pub fn merge(&mut self, other: AppConfig) {
        pick(&mut self.runtime.program, other.runtime.program);
        pick(&mut self.runtime.candidates, other.runtime.candidates);
        pick(
            &mut self.runtime.command_timeout_secs,
            other.runtime.command_timeout_secs,
        );
        pick(&mut self.runtime.status_format, other.runtime.status_format);

        pick(
            &mut self.project.artifact_command,
            other.project.artifact_command,
        );

        pick(&mut self.compose.file, other.compose.file);
        pick(
            &mut self.compose.service_only_file,
            other.compose.service_only_file,
        );

        pick(&mut self.service.container_name, other.service.container_name);
        pick(&mut self.service.image, other.service.image);
        pick(&mut self.service.network, other.service.network);
        pick(&mut self.service.port, other.service.port);

        let env = &mut self.service.env;
        let other_env = other.service.env;
        pick(&mut env.active_profile, other_env.active_profile);
        pick(&mut env.registry_url, other_env.registry_url);
        pick(&mut env.datasource_url, other_env.datasource_url);
        pick(&mut env.datasource_username, other_env.datasource_username);
        pick(&mut env.datasource_password, other_env.datasource_password);

        pick(&mut self.infra.dir, other.infra.dir);
        pick(&mut self.infra.services, other.infra.services);
        pick(&mut self.infra.endpoints, other.infra.endpoints);
    }

    /// Fills every unset key with its default and resolves paths.
    pub fn resolve(self, project_dir: &Path) -> Result<DeploySettings> {
        let runtime_program = self
            .runtime
            .program
            .unwrap_or_else(|| DEFAULT_RUNTIME_NAME.to_string());
        let runtime_candidates = match self.runtime.candidates {
            Some(paths) => paths
                .iter()
                .map(|p| expand_path(p).map(|expanded| project_dir.join(expanded)))
                .collect::<Result<Vec<_>>>()?,
            None => default_candidates(),
        };
        let command_timeout = self
            .runtime
            .command_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        let compose_file = self.compose.file.as_deref().map(expand_path).transpose()?;
        let service_only_file = match self.compose.service_only_file {
            Some(path) => expand_path(&path)?,
            None => PathBuf::from(DEFAULT_SERVICE_ONLY_FILE),
        };

        let infra_dir = match self.infra.dir {
            Some(dir) => expand_path(&dir)?,
            None => PathBuf::from(DEFAULT_INFRA_DIR),
        };

        let env = self.service.env;
        let service = ServiceContainer {
            name: or_default(self.service.container_name, DEFAULT_CONTAINER_NAME),
            image: or_default(self.service.image, DEFAULT_IMAGE),
            network: or_default(self.service.network, DEFAULT_NETWORK),
            port: or_default(self.service.port, DEFAULT_PORT),
            env: ServiceEnv {
                active_profile: or_default(env.active_profile, "docker"),
                registry_url: or_default(env.registry_url, "http://asyncsite-eureka:8761/eureka/"),
                datasource_url: or_default(
                    env.datasource_url,
                    "jdbc:mysql://asyncsite-mysql:3306/studydb?useSSL=false&serverTimezone=UTC&allowPublicKeyRetrieval=true",
                ),
                datasource_username: or_default(env.datasource_username, "root"),
                datasource_password: or_default(env.datasource_password, "asyncsite_root_2024!"),
            },
        };

        Ok(DeploySettings {
            project_dir: project_dir.to_path_buf(),
            runtime_program,
            runtime_candidates,
            command_timeout,
            status_format: or_default(self.runtime.status_format, DEFAULT_STATUS_FORMAT),
            artifact_command: self
                .project
                .artifact_command
                .unwrap_or_else(|| vec!["./gradlew".to_string(), "bootJar".to_string()]),
            compose_file,
            service_only_file,
            service,
            infra: InfraProject {
                dir: project_dir.join(infra_dir),
                services: self.infra.services.unwrap_or_else(|| {
                    ["mysql", "redis", "eureka-server"]
                        .map(String::from)
                        .to_vec()
                }),
                endpoints: self.infra.endpoints.unwrap_or_else(|| {
                    [
                        "MySQL: localhost:3306",
                        "Redis: localhost:6379",
                        "Eureka: http://localhost:8761",
                    ]
                    .map(String::from)
                    .to_vec()
                }),
            },
        })
    }
}

fn or_default(value: Option<String>, default: &str) -> String {
    value.unwrap_or_else(|| default.to_string())
}

/// Expands `~` and `$VAR` in a configured path.
fn expand_path(path: &Path) -> Result<PathBuf> {
    let raw = path.to_string_lossy();
    let expanded =
        shellexpand::full(&raw).with_context(|| format!("expanding path {:?}", path))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

fn read_config_file(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
    toml::from_str(&content).with_context(|| format!("parsing {:?}", path))
}

/// Loads the global config, layers the project-local one on top and fills
/// defaults. Missing files are not an error.
pub fn load_settings(config_dir: &Path, project_dir: &Path) -> Result<DeploySettings> {
    let mut app_config = AppConfig::default();

    let global_config_path = config_dir.join(DEFAULT_DECKHAND_TOML_NAME);
    if global_config_path.exists() {
        debug!("Loading global config {:?}", global_config_path);
        app_config = read_config_file(&global_config_path)?;
    }

    let local_config_path = project_dir.join(DEFAULT_DECKHAND_TOML_NAME);
    if local_config_path.exists() {
        debug!("Loading project config {:?}", local_config_path);
        app_config.merge(read_config_file(&local_config_path)?);
    }

    app_config.resolve(project_dir)
}

/// Writes the commented default config into `target_dir` unless one exists.
/// Returns the path when a file was written.
pub fn install_default_config(target_dir: &Path) -> Result<Option<PathBuf>> {
    ensure_config_dir(target_dir)?;

    let target = target_dir.join(DEFAULT_DECKHAND_TOML_NAME);
    if target.exists() {
        return Ok(None);
    }

    fs::write(&target, DEFAULT_DECKHAND_TOML)
        .with_context(|| format!("writing template to {:?}", target))?;

    Ok(Some(target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_when_no_files() {
        let config = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();

        let settings = load_settings(config.path(), project.path()).unwrap();

        assert_eq!(settings.runtime_program, "docker");
        assert_eq!(settings.runtime_candidates, default_candidates());
        assert_eq!(settings.command_timeout, None);
        assert_eq!(settings.compose_file, None);
        assert_eq!(
            settings.service_only_file,
            PathBuf::from("docker-compose.study-only.yml")
        );
        assert_eq!(settings.service.name, "asyncsite-study-service");
        assert_eq!(settings.service.network, "asyncsite-network");
        assert_eq!(settings.artifact_command, vec!["./gradlew", "bootJar"]);
        assert_eq!(settings.infra.dir, project.path().join("../core-platform"));
        assert_eq!(settings.infra.services, vec!["mysql", "redis", "eureka-server"]);
    }

    #[test]
    fn test_local_overrides_global() {
        let config = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();

        fs::write(
            config.path().join(DEFAULT_DECKHAND_TOML_NAME),
            r#"
[runtime]
program = "podman"
command_timeout_secs = 30

[service]
container_name = "global-name"
image = "global/image:1"
"#,
        )
        .unwrap();
        fs::write(
            project.path().join(DEFAULT_DECKHAND_TOML_NAME),
            r#"
[service]
container_name = "local-name"

[service.env]
active_profile = "local"
"#,
        )
        .unwrap();

        let settings = load_settings(config.path(), project.path()).unwrap();

        assert_eq!(settings.runtime_program, "podman");
        assert_eq!(settings.command_timeout, Some(Duration::from_secs(30)));
        assert_eq!(settings.service.name, "local-name");
        assert_eq!(settings.service.image, "global/image:1");
        assert_eq!(settings.service.env.active_profile, "local");
        assert_eq!(settings.service.env.datasource_username, "root");
    }

    #[test]
    fn test_relative_candidates_resolve_against_project_dir() {
        let config = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();

        fs::write(
            project.path().join(DEFAULT_DECKHAND_TOML_NAME),
            r#"
[runtime]
candidates = ["bin/docker", "/usr/bin/docker"]
"#,
        )
        .unwrap();

        let settings = load_settings(config.path(), project.path()).unwrap();

        assert_eq!(
            settings.runtime_candidates,
            vec![
                project.path().join("bin/docker"),
                PathBuf::from("/usr/bin/docker")
            ]
        );
    }

    #[test]
    fn test_zero_timeout_means_unbounded() {
        let config = AppConfig {
            runtime: RuntimeConfig {
                command_timeout_secs: Some(0),
                ..Default::default()
            },
            ..Default::default()
        };

        let settings = config.resolve(Path::new(".")).unwrap();
        assert_eq!(settings.command_timeout, None);
    }

    #[test]
    fn test_empty_artifact_command_is_kept() {
        let config: AppConfig = toml::from_str("[project]\nartifact_command = []\n").unwrap();
        let settings = config.resolve(Path::new(".")).unwrap();
        assert!(settings.artifact_command.is_empty());
    }

    #[test]
    fn test_invalid_toml_is_reported() {
        let config = TempDir::new().unwrap();
        fs::write(config.path().join(DEFAULT_DECKHAND_TOML_NAME), "[runtime\n").unwrap();

        let err = load_settings(config.path(), config.path()).unwrap_err();
        assert!(err.to_string().contains("parsing"));
    }

    #[test]
    fn test_default_template_parses_to_defaults() {
        let config: AppConfig = toml::from_str(DEFAULT_DECKHAND_TOML).unwrap();
        let from_template = config.resolve(Path::new("/srv/app")).unwrap();
        let from_nothing = AppConfig::default().resolve(Path::new("/srv/app")).unwrap();

        assert_eq!(from_template, from_nothing);
    }

    #[test]
    fn test_install_default_config_does_not_overwrite() {
        let dir = TempDir::new().unwrap();

        let written = install_default_config(dir.path()).unwrap();
        assert_eq!(written, Some(dir.path().join(DEFAULT_DECKHAND_TOML_NAME)));

        fs::write(dir.path().join(DEFAULT_DECKHAND_TOML_NAME), "# mine").unwrap();
        assert_eq!(install_default_config(dir.path()).unwrap(), None);
        assert_eq!(
            fs::read_to_string(dir.path().join(DEFAULT_DECKHAND_TOML_NAME)).unwrap(),
            "# mine"
        );
    }
}
