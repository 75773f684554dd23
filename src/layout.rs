use std::path::{Path, PathBuf};

use crate::manifest::{self, ManifestAttributes, Role};
use crate::settings::BuildSettings;

/// On-disk locations of one packaged component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentLayout {
    pub role: Role,
    pub name: String,
    pub entry_point: String,
    pub dir: PathBuf,
    pub classes_dir: PathBuf,
    pub resources_dir: PathBuf,
    pub jar_path: PathBuf,
}

impl ComponentLayout {
    fn resolve(
        root: &Path,
        role: Role,
        name: &str,
        entry_point: &str,
        settings: &BuildSettings,
    ) -> Self {
        let dir = root.join(name);
        let jar_name = format!("{name}-{}.jar", settings.project.version);
        Self {
            role,
            name: name.to_string(),
            entry_point: entry_point.to_string(),
            classes_dir: dir.join(&settings.project.classes_dir),
            resources_dir: dir.join(&settings.project.resources_dir),
            jar_path: dir.join(&settings.project.libs_dir).join(jar_name),
            dir,
        }
    }

    pub fn manifest(&self) -> ManifestAttributes {
        manifest::compose(self.role, &self.entry_point)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    pub root: PathBuf,
    pub agent: ComponentLayout,
    pub server: ComponentLayout,
    /// Main class of agent launches.
    pub agent_launcher: String,
    pub fonts_dir: PathBuf,
}

impl ProjectLayout {
    pub fn resolve(root: &Path, settings: &BuildSettings) -> Self {
        Self {
            root: root.to_path_buf(),
            agent: ComponentLayout::resolve(
                root,
                Role::Agent,
                &settings.agent.name,
                &settings.agent.agent_class,
                settings,
            ),
            server: ComponentLayout::resolve(
                root,
                Role::Server,
                &settings.server.name,
                &settings.server.main_class,
                settings,
            ),
            agent_launcher: settings.agent.launcher_class.clone(),
            fonts_dir: root.join(&settings.fonts.dir),
        }
    }

    pub fn component(&self, role: Role) -> &ComponentLayout {
        match role {
            Role::Agent => &self.agent,
            Role::Server => &self.server,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{AGENT_CLASS, MAIN_CLASS};

    #[test]
    fn resolves_default_layout() {
        let layout = ProjectLayout::resolve(Path::new("/work"), &BuildSettings::default());
        assert_eq!(
            layout.agent.jar_path,
            Path::new("/work/projector-agent/build/libs/projector-agent-1.0-SNAPSHOT.jar")
        );
        assert_eq!(
            layout.server.classes_dir,
            Path::new("/work/projector-server/build/classes/kotlin/main")
        );
        assert_eq!(
            layout.fonts_dir,
            Path::new("/work/projector-server/src/main/resources/fonts")
        );
    }

    #[test]
    fn component_manifest_uses_configured_entry_point() {
        let layout = ProjectLayout::resolve(Path::new("/work"), &BuildSettings::default());
        assert_eq!(
            layout.component(Role::Agent).manifest().get(AGENT_CLASS),
            Some("org.jetbrains.projector.agent.MainAgent")
        );
        assert_eq!(
            layout.component(Role::Server).manifest().get(MAIN_CLASS),
            Some("org.jetbrains.projector.server.ProjectorLauncher")
        );
    }
}
