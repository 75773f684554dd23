//! JVM argument sets shared by the launch tasks.

use std::path::Path;

pub const ALLOW_ATTACH_SELF: &str = "-Djdk.attach.allowAttachSelf=true";
pub const NO_BUFFER_PER_WINDOW: &str = "-Dswing.bufferPerWindow=false";

pub const AGENT_PATH_PROPERTY: &str = "org.jetbrains.projector.agent.path";
pub const AGENT_CLASS_TO_LAUNCH_PROPERTY: &str = "org.jetbrains.projector.agent.classToLaunch";
pub const SERVER_CLASS_TO_LAUNCH_PROPERTY: &str = "org.jetbrains.projector.server.classToLaunch";

pub const IDE_MAIN_CLASS: &str = "com.intellij.idea.Main";
pub const IDE_PATHS_SELECTOR_PROPERTY: &str = "idea.paths.selector";
pub const AGENT_IDE_PATHS_SELECTOR: &str = "ProjectorIntelliJIdea2019.3";
pub const SERVER_IDE_PATHS_SELECTOR: &str = "ProjectorIntelliJIdea";

pub const IDE_LIBRARIES: [&str; 6] = [
    "bootstrap.jar",
    "extensions.jar",
    "util.jar",
    "jdom.jar",
    "log4j.jar",
    "trove4j.jar",
];

pub const IDE_PROPERTIES: &[&str] = &["-Didea.jre.check=true", "-Didea.is.internal=true"];

pub const REFLECT_ACCESS: &str = "--add-opens=java.base/java.lang.reflect=ALL-UNNAMED";

/// Module exports and opens an IDE needs when its UI is intercepted.
pub const IDE_MODULE_ACCESS: &[&str] = &[
    "--add-exports=java.base/jdk.internal.vm=ALL-UNNAMED",
    "--add-opens=java.desktop/java.awt=ALL-UNNAMED",
    "--add-opens=java.desktop/sun.font=ALL-UNNAMED",
    "--add-opens=java.desktop/sun.awt=ALL-UNNAMED",
    "--add-opens=java.desktop/sun.swing=ALL-UNNAMED",
    "--add-opens=java.desktop/javax.swing=ALL-UNNAMED",
    "--add-opens=java.desktop/javax.swing.text.html=ALL-UNNAMED",
    "--add-opens=java.desktop/javax.swing.plaf.basic=ALL-UNNAMED",
    "--add-opens=java.base/java.lang=ALL-UNNAMED",
];

pub const SERVER_MODULE_ACCESS: &[&str] = &[
    "--add-opens=java.desktop/java.awt=ALL-UNNAMED",
    "--add-opens=java.desktop/sun.font=ALL-UNNAMED",
    REFLECT_ACCESS,
];

pub fn system_property(name: &str, value: impl std::fmt::Display) -> String {
    format!("-D{name}={value}")
}

/// Self-attach flags plus the agent jar and the class the agent hands control to.
pub fn agent_attach_args(agent_jar: &Path, class_to_launch: &str) -> Vec<String> {
    vec![
        ALLOW_ATTACH_SELF.to_string(),
        NO_BUFFER_PER_WINDOW.to_string(),
        system_property(AGENT_PATH_PROPERTY, agent_jar.display()),
        system_property(AGENT_CLASS_TO_LAUNCH_PROPERTY, class_to_launch),
    ]
}

pub fn ide_args(paths_selector: &str) -> Vec<String> {
    std::iter::once(system_property(IDE_PATHS_SELECTOR_PROPERTY, paths_selector))
        .chain(IDE_PROPERTIES.iter().map(|arg| arg.to_string()))
        .chain(IDE_MODULE_ACCESS.iter().map(|arg| arg.to_string()))
        .collect()
}
