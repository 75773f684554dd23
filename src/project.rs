use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::debug;

use crate::config::{Configuration, PROPERTIES_FILE};
use crate::layout::ProjectLayout;
use crate::runner::TaskRunner;
use crate::settings::{self, BuildSettings};
use crate::tasks::{BuildContext, TaskGraph};

#[derive(Debug, Clone, Default)]
pub struct ProjectOptions {
    pub root: PathBuf,
    /// Properties file; `<root>/local.properties` when unset.
    pub properties: Option<PathBuf>,
    pub settings: Option<PathBuf>,
}

impl ProjectOptions {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }
}

/// Everything loaded once per invocation: settings, local properties and the
/// resolved layout.
#[derive(Debug)]
pub struct Project {
    pub root: PathBuf,
    pub settings: BuildSettings,
    pub config: Configuration,
    pub layout: ProjectLayout,
    pub properties_path: PathBuf,
}

impl Project {
    pub fn open(options: &ProjectOptions) -> Result<Self> {
        let root = if options.root.as_os_str().is_empty() {
            PathBuf::from(".")
        } else {
            options.root.clone()
        };
        let settings = settings::load(&root, options.settings.as_deref())?;
        let properties_path = options
            .properties
            .clone()
            .unwrap_or_else(|| root.join(PROPERTIES_FILE));
        let config = Configuration::load(&properties_path)
            .with_context(|| format!("failed to load project properties for {}", root.display()))?;
        debug!(
            properties = %properties_path.display(),
            keys = config.len(),
            "project properties loaded"
        );
        let layout = ProjectLayout::resolve(&root, &settings);

        Ok(Self {
            root,
            settings,
            config,
            layout,
            properties_path,
        })
    }

    pub fn context(&self) -> BuildContext<'_> {
        BuildContext::new(&self.config, &self.layout).with_runtime_home(self.settings.runtime_home())
    }

    pub fn task_graph(&self) -> TaskGraph {
        TaskGraph::build(&self.context())
    }

    pub fn runner<'a>(&'a self, graph: &'a TaskGraph, dry_run: bool) -> TaskRunner<'a> {
        TaskRunner::new(graph, &self.layout)
            .runtime_home(self.settings.runtime_home())
            .download_timeout(self.settings.download_timeout())
            .dry_run(dry_run)
    }
}
