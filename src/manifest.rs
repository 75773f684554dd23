//! JAR manifest attributes for the agent and server packages.

use indexmap::IndexMap;
use serde::Serialize;

pub const MANIFEST_PATH: &str = "META-INF/MANIFEST.MF";

pub const CAN_REDEFINE_CLASSES: &str = "Can-Redefine-Classes";
pub const CAN_RETRANSFORM_CLASSES: &str = "Can-Retransform-Classes";
pub const AGENT_CLASS: &str = "Agent-Class";
pub const MAIN_CLASS: &str = "Main-Class";

/// Entry point used when the agent jar is run directly.
pub const AGENT_LAUNCHER_CLASS: &str = "org.jetbrains.projector.agent.AgentLauncher";

const MANIFEST_VERSION: &str = "Manifest-Version: 1.0";
const MAX_LINE_BYTES: usize = 72;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Agent,
    Server,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Agent => f.write_str("agent"),
            Role::Server => f.write_str("server"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestAttributes {
    entries: IndexMap<&'static str, String>,
}

impl ManifestAttributes {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(name, value)| (*name, value.as_str()))
    }

    /// Renders the main section of `META-INF/MANIFEST.MF`.
    pub fn render(&self) -> String {
        let mut out = String::new();
        write_wrapped(&mut out, MANIFEST_VERSION);
        for (name, value) in &self.entries {
            write_wrapped(&mut out, &format!("{name}: {value}"));
        }
        out.push_str("\r\n");
        out
    }
}

pub fn compose(role: Role, entry_point_class: &str) -> ManifestAttributes {
    debug_assert!(
        !entry_point_class.is_empty(),
        "entry point class must be bound before composing a manifest"
    );
    let mut entries = IndexMap::new();
    match role {
        Role::Agent => {
            entries.insert(CAN_REDEFINE_CLASSES, true.to_string());
            entries.insert(CAN_RETRANSFORM_CLASSES, true.to_string());
            entries.insert(AGENT_CLASS, entry_point_class.to_string());
            entries.insert(MAIN_CLASS, AGENT_LAUNCHER_CLASS.to_string());
        }
        Role::Server => {
            entries.insert(MAIN_CLASS, entry_point_class.to_string());
        }
    }
    ManifestAttributes { entries }
}

/// Manifest lines are capped at 72 bytes; overflow continues on lines led by a space.
fn write_wrapped(out: &mut String, line: &str) {
    let mut rest = line;
    let mut limit = MAX_LINE_BYTES;
    while rest.len() > limit {
        let mut split = limit;
        while !rest.is_char_boundary(split) {
            split -= 1;
        }
        out.push_str(&rest[..split]);
        out.push_str("\r\n ");
        rest = &rest[split..];
        limit = MAX_LINE_BYTES - 1;
    }
    out.push_str(rest);
    out.push_str("\r\n");
}
