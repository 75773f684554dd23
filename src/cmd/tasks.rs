use anyhow::{Context, Result};
use indexmap::IndexMap;
use projector_build::cli::{RunArgs, ShowArgs, TasksArgs};
use projector_build::manifest::Role;
use projector_build::project::Project;
use projector_build::tasks::TaskSpec;
use projector_build::tasks::rules::LAUNCH_GROUP;
use serde::Serialize;

pub fn list(project: &Project, args: &TasksArgs) -> Result<()> {
    let graph = project.task_graph();
    let visible: Vec<&TaskSpec> = graph
        .iter()
        .filter(|spec| args.all || spec.group == LAUNCH_GROUP)
        .collect();

    if args.json {
        let json =
            serde_json::to_string_pretty(&visible).context("failed to serialize task list")?;
        println!("{json}");
        return Ok(());
    }

    let mut groups: IndexMap<&str, Vec<&TaskSpec>> = IndexMap::new();
    for spec in &visible {
        groups.entry(spec.group.as_str()).or_default().push(spec);
    }
    if !groups.contains_key(LAUNCH_GROUP) {
        println!(
            "No launch tasks available; set projectorLauncher.* keys in {}",
            project.properties_path.display()
        );
    }
    for (group, specs) in groups {
        println!("{group}:");
        for spec in specs {
            println!("  {:<22} {}", spec.name, spec.description);
        }
    }
    if !args.all {
        println!("(build and font tasks hidden; pass --all)");
    }
    Ok(())
}

#[derive(Serialize)]
struct TaskView<'a> {
    #[serde(flatten)]
    spec: &'a TaskSpec,
    classpath_joined: String,
    java_arguments: Vec<String>,
}

pub fn show(project: &Project, args: &ShowArgs) -> Result<()> {
    let graph = project.task_graph();
    let spec = graph.require(&args.task)?;

    if args.json {
        let view = TaskView {
            spec,
            classpath_joined: spec.classpath_string(),
            java_arguments: spec.java_arguments(),
        };
        let json = serde_json::to_string_pretty(&view).context("failed to serialize task")?;
        println!("{json}");
        return Ok(());
    }

    println!("{} ({})", spec.name, spec.group);
    if !spec.description.is_empty() {
        println!("  {}", spec.description);
    }
    if !spec.depends_on.is_empty() {
        println!("depends on: {}", spec.depends_on.join(", "));
    }
    if let Some(main_class) = &spec.main_class {
        println!("main class: {main_class}");
    }
    if !spec.classpath.is_empty() {
        println!("classpath:");
        for fragment in &spec.classpath {
            println!("  {fragment}");
        }
    }
    if !spec.jvm_args.is_empty() {
        println!("jvm args:");
        for arg in &spec.jvm_args {
            println!("  {arg}");
        }
    }
    Ok(())
}

pub fn run(project: &Project, args: &RunArgs) -> Result<()> {
    let graph = project.task_graph();
    let executed = project.runner(&graph, args.dry_run).run(&args.task)?;
    if !args.dry_run {
        println!("{} finished ({} tasks)", args.task, executed.len());
    }
    Ok(())
}

pub fn manifest(project: &Project, role: Role) -> Result<()> {
    print!("{}", project.layout.component(role).manifest().render());
    Ok(())
}
