use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::manifest::AGENT_LAUNCHER_CLASS;

pub const SETTINGS_FILE: &str = "projector-build.toml";
pub const SETTINGS_ENV: &str = "PROJECTOR_BUILD_CONFIG";

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildSettings {
    pub project: ProjectSection,
    pub agent: AgentSection,
    pub server: ServerSection,
    pub fonts: FontsSection,
    pub download: DownloadSection,
    pub runtime: RuntimeSection,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectSection {
    /// Version stamped into produced jar names.
    pub version: String,
    /// Compiled class output, relative to each component directory.
    pub classes_dir: PathBuf,
    /// Resources packaged next to the classes, relative to each component directory.
    pub resources_dir: PathBuf,
    pub libs_dir: PathBuf,
}

impl Default for ProjectSection {
    fn default() -> Self {
        Self {
            version: "1.0-SNAPSHOT".to_string(),
            classes_dir: PathBuf::from("build/classes/kotlin/main"),
            resources_dir: PathBuf::from("src/main/resources"),
            libs_dir: PathBuf::from("build/libs"),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AgentSection {
    pub name: String,
    /// `Agent-Class` of the agent jar.
    pub agent_class: String,
    /// Main class of agent launches; attaches the agent, then starts the target.
    pub launcher_class: String,
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            name: "projector-agent".to_string(),
            agent_class: "org.jetbrains.projector.agent.MainAgent".to_string(),
            launcher_class: AGENT_LAUNCHER_CLASS.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSection {
    pub name: String,
    pub main_class: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            name: "projector-server".to_string(),
            main_class: "org.jetbrains.projector.server.ProjectorLauncher".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct FontsSection {
    /// Destination of provisioned fonts, relative to the project root.
    pub dir: PathBuf,
}

impl Default for FontsSection {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("projector-server/src/main/resources/fonts"),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DownloadSection {
    pub timeout_secs: u64,
}

impl Default for DownloadSection {
    fn default() -> Self {
        Self { timeout_secs: 600 }
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeSection {
    /// JDK root used for launches and to locate `tools.jar`; `JAVA_HOME` otherwise.
    pub java_home: Option<PathBuf>,
}

impl BuildSettings {
    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download.timeout_secs)
    }

    pub fn runtime_home(&self) -> Option<PathBuf> {
        self.runtime
            .java_home
            .clone()
            .or_else(|| std::env::var_os("JAVA_HOME").map(PathBuf::from))
    }

    fn validate(&self) -> Result<()> {
        let required = [
            ("project.version", &self.project.version),
            ("agent.name", &self.agent.name),
            ("agent.agent_class", &self.agent.agent_class),
            ("agent.launcher_class", &self.agent.launcher_class),
            ("server.name", &self.server.name),
            ("server.main_class", &self.server.main_class),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                bail!("setting `{key}` must not be empty");
            }
        }
        if self.download.timeout_secs == 0 {
            bail!("setting `download.timeout_secs` must be greater than zero");
        }
        Ok(())
    }
}

pub fn load(project_root: &Path, path_override: Option<&Path>) -> Result<BuildSettings> {
    let env_override = std::env::var_os(SETTINGS_ENV).map(PathBuf::from);
    let explicit = path_override.map(Path::to_path_buf).or(env_override);
    load_from(settings_path(project_root, explicit).as_deref())
}

pub fn load_from(path: Option<&Path>) -> Result<BuildSettings> {
    let Some(path) = path else {
        return Ok(BuildSettings::default());
    };

    if !path.exists() {
        return Ok(BuildSettings::default());
    }

    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read settings at {}", path.display()))?;
    parse(&raw).with_context(|| format!("invalid settings at {}", path.display()))
}

pub fn parse(raw: &str) -> Result<BuildSettings> {
    let settings: BuildSettings = toml::from_str(raw).context("failed to parse settings")?;
    settings.validate()?;
    Ok(settings)
}

/// Explicit path first, then `<root>/projector-build.toml`, then the user config dir.
pub fn settings_path(project_root: &Path, explicit: Option<PathBuf>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path);
    }
    let local = project_root.join(SETTINGS_FILE);
    if local.exists() {
        return Some(local);
    }
    dirs::config_dir().map(|mut dir| {
        dir.push("projector-build");
        dir.push("config.toml");
        dir
    })
}
