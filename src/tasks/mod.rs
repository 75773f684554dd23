//! Task graph synthesis.
//!
//! Font and packaging tasks are always registered. Launch tasks come from
//! [`rules::LAUNCH_RULES`]: each rule names the properties it needs and is
//! evaluated once against the loaded [`Configuration`]. A rule whose keys are
//! incomplete contributes nothing; that is a capability gate, not an error.

pub mod args;
pub mod rules;

use std::collections::HashSet;
use std::path::PathBuf;

use indexmap::IndexMap;
use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use petgraph::visit::{Dfs, Reversed};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::classpath::{self, Classpath};
use crate::config::Configuration;
use crate::layout::ProjectLayout;
use crate::manifest::Role;

pub use rules::{
    AGENT_JAR, LAUNCH_RULES, LaunchRule, RUN_IDE_SERVER, RUN_IDE_WITH_AGENT, RUN_SERVER,
    RUN_WITH_AGENT, SERVER_JAR,
};

/// Inputs the rules are evaluated against.
#[derive(Debug, Clone)]
pub struct BuildContext<'a> {
    pub config: &'a Configuration,
    pub layout: &'a ProjectLayout,
    /// JDK home used to locate `tools.jar`.
    pub runtime_home: Option<PathBuf>,
}

impl<'a> BuildContext<'a> {
    pub fn new(config: &'a Configuration, layout: &'a ProjectLayout) -> Self {
        Self {
            config,
            layout,
            runtime_home: None,
        }
    }

    pub fn with_runtime_home(mut self, home: Option<PathBuf>) -> Self {
        self.runtime_home = home;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "target")]
pub enum TaskAction {
    Launch,
    ProvisionFonts(String),
    Package(Role),
    Aggregate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskSpec {
    pub name: String,
    pub group: String,
    pub description: String,
    pub depends_on: Vec<String>,
    pub classpath: Vec<String>,
    pub main_class: Option<String>,
    pub jvm_args: Vec<String>,
    pub action: TaskAction,
}

impl TaskSpec {
    pub fn new(name: impl Into<String>, group: impl Into<String>, action: TaskAction) -> Self {
        Self {
            name: name.into(),
            group: group.into(),
            description: String::new(),
            depends_on: Vec::new(),
            classpath: Vec::new(),
            main_class: None,
            jvm_args: Vec::new(),
            action,
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn depends_on(mut self, task: impl Into<String>) -> Self {
        let task = task.into();
        if !self.depends_on.contains(&task) {
            self.depends_on.push(task);
        }
        self
    }

    pub fn classpath(mut self, classpath: Classpath) -> Self {
        self.classpath = classpath.into_fragments();
        self
    }

    pub fn main_class(mut self, class: impl Into<String>) -> Self {
        self.main_class = Some(class.into());
        self
    }

    pub fn jvm_args(mut self, args: Vec<String>) -> Self {
        self.jvm_args = args;
        self
    }

    pub fn classpath_string(&self) -> String {
        classpath::assemble(&self.classpath)
    }

    /// Arguments passed to `java` for launch tasks: JVM flags, classpath, main class.
    pub fn java_arguments(&self) -> Vec<String> {
        let mut argv = self.jvm_args.clone();
        let classpath = self.classpath_string();
        if !classpath.is_empty() {
            argv.push("-cp".to_string());
            argv.push(classpath);
        }
        argv.extend(self.main_class.clone());
        argv
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("task `{name}` is not registered (available: {available})")]
    UnknownTask { name: String, available: String },
    #[error("task `{task}` depends on unregistered task `{dependency}`")]
    MissingDependency { task: String, dependency: String },
    #[error("dependency cycle through task `{0}`")]
    Cycle(String),
}

/// Registry of every task synthesized for one configuration.
#[derive(Debug, Clone, Default)]
pub struct TaskGraph {
    tasks: IndexMap<String, TaskSpec>,
}

impl TaskGraph {
    pub fn build(ctx: &BuildContext<'_>) -> Self {
        let mut graph = Self::default();
        for spec in rules::unconditional(ctx) {
            graph.register(spec);
        }

        for rule in LAUNCH_RULES.iter() {
            let missing = rule.missing_keys(ctx.config);
            if missing.is_empty() {
                graph.register(rule.build(ctx));
            } else {
                info!(task = rule.name, missing = ?missing, "launch task not available: properties not set");
            }
        }
        graph
    }

    fn register(&mut self, spec: TaskSpec) {
        debug!(task = %spec.name, group = %spec.group, "registered task");
        self.tasks.insert(spec.name.clone(), spec);
    }

    pub fn get(&self, name: &str) -> Option<&TaskSpec> {
        self.tasks.get(name)
    }

    /// Like [`TaskGraph::get`], but an unknown name is an error listing what is registered.
    pub fn require(&self, name: &str) -> Result<&TaskSpec, GraphError> {
        self.tasks.get(name).ok_or_else(|| GraphError::UnknownTask {
            name: name.to_string(),
            available: self.names().collect::<Vec<_>>().join(", "),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tasks.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TaskSpec> {
        self.tasks.values()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// `name` and its transitive dependencies, dependencies first.
    pub fn execution_plan(&self, name: &str) -> Result<Vec<&TaskSpec>, GraphError> {
        self.require(name)?;

        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
        for spec in self.tasks.values() {
            graph.add_node(spec.name.as_str());
            for dependency in &spec.depends_on {
                if !self.contains(dependency) {
                    return Err(GraphError::MissingDependency {
                        task: spec.name.clone(),
                        dependency: dependency.clone(),
                    });
                }
                graph.add_edge(dependency.as_str(), spec.name.as_str(), ());
            }
        }

        let order = toposort(&graph, None)
            .map_err(|cycle| GraphError::Cycle(cycle.node_id().to_string()))?;

        let mut needed = HashSet::new();
        let reversed = Reversed(&graph);
        let mut dfs = Dfs::new(reversed, name);
        while let Some(node) = dfs.next(reversed) {
            needed.insert(node);
        }

        Ok(order
            .into_iter()
            .filter(|node| needed.contains(node))
            .filter_map(|node| self.tasks.get(node))
            .collect())
    }
}
