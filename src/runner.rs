use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use tracing::{debug, info};

use crate::fonts::{FontAssetGroup, FontProvisioner, Provisioned, font_group};
use crate::layout::ProjectLayout;
use crate::package;
use crate::tasks::{TaskAction, TaskGraph, TaskSpec};
use crate::util::process::{self, CommandSpec};

const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(600);

/// Executes a task and everything it depends on, dependencies first.
pub struct TaskRunner<'a> {
    graph: &'a TaskGraph,
    layout: &'a ProjectLayout,
    runtime_home: Option<PathBuf>,
    download_timeout: Duration,
    dry_run: bool,
}

impl<'a> TaskRunner<'a> {
    pub fn new(graph: &'a TaskGraph, layout: &'a ProjectLayout) -> Self {
        Self {
            graph,
            layout,
            runtime_home: None,
            download_timeout: DEFAULT_DOWNLOAD_TIMEOUT,
            dry_run: false,
        }
    }

    pub fn runtime_home(mut self, home: Option<PathBuf>) -> Self {
        self.runtime_home = home;
        self
    }

    pub fn download_timeout(mut self, timeout: Duration) -> Self {
        self.download_timeout = timeout;
        self
    }

    /// Print each step instead of performing it.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Runs `name` and returns the names of the tasks that were executed.
    pub fn run(&self, name: &str) -> Result<Vec<String>> {
        let plan = self.graph.execution_plan(name)?;
        info!(task = name, steps = plan.len(), dry_run = self.dry_run, "running task");

        let mut executed = Vec::with_capacity(plan.len());
        for spec in plan {
            if self.dry_run {
                self.describe(spec)?;
            } else {
                self.execute(spec)
                    .with_context(|| format!("task `{}` failed", spec.name))?;
            }
            executed.push(spec.name.clone());
        }
        Ok(executed)
    }

    fn describe(&self, spec: &TaskSpec) -> Result<()> {
        match &spec.action {
            TaskAction::Launch => {
                let java = self
                    .java_binary()
                    .unwrap_or_else(|_| PathBuf::from(java_executable()));
                println!("> {}: {}", spec.name, self.launch_command(java, spec));
            }
            TaskAction::Package(role) => {
                let component = self.layout.component(*role);
                println!("> {}: package {}", spec.name, component.jar_path.display());
            }
            TaskAction::ProvisionFonts(group) => {
                let group = lookup_group(group)?;
                println!(
                    "> {}: fonts {} -> {}",
                    spec.name,
                    group.url,
                    self.layout.fonts_dir.display()
                );
            }
            TaskAction::Aggregate => println!("> {}", spec.name),
        }
        Ok(())
    }

    fn execute(&self, spec: &TaskSpec) -> Result<()> {
        debug!(task = %spec.name, action = ?spec.action, "executing");
        match &spec.action {
            TaskAction::ProvisionFonts(group) => {
                let group = lookup_group(group)?;
                let provisioner =
                    FontProvisioner::new(&self.layout.fonts_dir, self.download_timeout)?;
                match provisioner.ensure(group)? {
                    Provisioned::AlreadyPresent => {}
                    Provisioned::Downloaded { files, .. } => {
                        info!(task = %spec.name, files, "fonts provisioned");
                    }
                }
            }
            TaskAction::Package(role) => {
                package::build_jar(self.layout.component(*role))?;
            }
            TaskAction::Aggregate => {}
            TaskAction::Launch => {
                let command = self.launch_command(self.java_binary()?, spec);
                info!(task = %spec.name, command = %command, "launching");
                let status = process::run(&command)?;
                if !status.success() {
                    bail!("`{}` exited with {status}", command.program.to_string_lossy());
                }
            }
        }
        Ok(())
    }

    fn launch_command(&self, java: PathBuf, spec: &TaskSpec) -> CommandSpec {
        CommandSpec::new(java)
            .args(spec.java_arguments())
            .current_dir(&self.layout.root)
    }

    /// `<runtime home>/bin/java`, otherwise the first `java` on `PATH`.
    fn java_binary(&self) -> Result<PathBuf> {
        if let Some(home) = &self.runtime_home {
            let candidate = home.join("bin").join(java_executable());
            if candidate.is_file() {
                return Ok(candidate);
            }
            debug!(path = %candidate.display(), "no java under runtime home");
        }
        which::which("java").context("no `java` found; set runtime.java_home or JAVA_HOME")
    }
}

fn lookup_group(name: &str) -> Result<&'static FontAssetGroup> {
    font_group(name).ok_or_else(|| anyhow!("unknown font group `{name}`"))
}

fn java_executable() -> String {
    format!("java{}", std::env::consts::EXE_SUFFIX)
}
