use std::path::{Path, PathBuf};

use crate::classpath::Classpath;
use crate::config::{CLASS_TO_LAUNCH, Configuration, IDEA_PATH, TARGET_CLASS_PATH};
use crate::fonts::{DOWNLOAD_FONTS_TASK, FONT_GROUPS};
use crate::layout::ComponentLayout;

use super::args::{
    self, ALLOW_ATTACH_SELF, IDE_LIBRARIES, IDE_MAIN_CLASS, REFLECT_ACCESS,
    SERVER_CLASS_TO_LAUNCH_PROPERTY, SERVER_MODULE_ACCESS,
};
use super::{BuildContext, TaskAction, TaskSpec};

pub const RUN_WITH_AGENT: &str = "runWithAgent";
pub const RUN_IDE_WITH_AGENT: &str = "runIdeWithAgent";
pub const RUN_SERVER: &str = "runServer";
pub const RUN_IDE_SERVER: &str = "runIdeServer";
pub const AGENT_JAR: &str = "agentJar";
pub const SERVER_JAR: &str = "serverJar";

pub const LAUNCH_GROUP: &str = "projector";
pub const BUILD_GROUP: &str = "build";
pub const FONTS_GROUP: &str = "fonts";

/// A launch task that only exists when every `required` key is configured.
pub struct LaunchRule {
    pub name: &'static str,
    pub required: &'static [&'static str],
    build: fn(&BuildContext<'_>) -> TaskSpec,
}

impl LaunchRule {
    pub fn missing_keys(&self, config: &Configuration) -> Vec<&'static str> {
        self.required
            .iter()
            .copied()
            .filter(|key| !config.is_set(key))
            .collect()
    }

    pub fn is_enabled(&self, config: &Configuration) -> bool {
        self.missing_keys(config).is_empty()
    }

    pub(super) fn build(&self, ctx: &BuildContext<'_>) -> TaskSpec {
        (self.build)(ctx)
    }
}

pub static LAUNCH_RULES: [LaunchRule; 4] = [
    LaunchRule {
        name: RUN_WITH_AGENT,
        required: &[TARGET_CLASS_PATH, CLASS_TO_LAUNCH],
        build: run_with_agent,
    },
    LaunchRule {
        name: RUN_IDE_WITH_AGENT,
        required: &[IDEA_PATH],
        build: run_ide_with_agent,
    },
    LaunchRule {
        name: RUN_SERVER,
        required: &[TARGET_CLASS_PATH, CLASS_TO_LAUNCH],
        build: run_server,
    },
    LaunchRule {
        name: RUN_IDE_SERVER,
        required: &[IDEA_PATH],
        build: run_ide_server,
    },
];

/// Font, aggregate and packaging tasks; present regardless of configuration.
pub(super) fn unconditional(ctx: &BuildContext<'_>) -> Vec<TaskSpec> {
    let mut specs = Vec::new();
    let mut download_fonts = TaskSpec::new(DOWNLOAD_FONTS_TASK, FONTS_GROUP, TaskAction::Aggregate)
        .describe("Downloads every font group used by the server");

    for group in FONT_GROUPS.iter() {
        specs.push(
            TaskSpec::new(
                &group.task,
                FONTS_GROUP,
                TaskAction::ProvisionFonts(group.name.clone()),
            )
            .describe(format!("Downloads {} fonts into the server resources", group.name)),
        );
        download_fonts = download_fonts.depends_on(&group.task);
    }
    specs.push(download_fonts);

    specs.push(
        package_task(SERVER_JAR, &ctx.layout.server)
            .depends_on(DOWNLOAD_FONTS_TASK),
    );
    specs.push(package_task(AGENT_JAR, &ctx.layout.agent).depends_on(SERVER_JAR));
    specs
}

fn package_task(name: &str, component: &ComponentLayout) -> TaskSpec {
    TaskSpec::new(name, BUILD_GROUP, TaskAction::Package(component.role))
        .describe(format!("Packages {}", component.jar_path.display()))
}

fn component_classpath(component: &ComponentLayout) -> Classpath {
    Classpath::new()
        .with_path(&component.classes_dir)
        .with_path(&component.jar_path)
}

fn configured<'a>(config: &'a Configuration, key: &str) -> &'a str {
    // Rules only build after their gate passed.
    config.get(key).unwrap_or_default()
}

fn ide_classpath(ctx: &BuildContext<'_>, idea_path: &str) -> Vec<String> {
    let lib = Path::new(idea_path).join("lib");
    IDE_LIBRARIES
        .iter()
        .map(|jar| lib.join(jar).display().to_string())
        .chain(std::iter::once(tools_archive(ctx, idea_path).display().to_string()))
        .collect()
}

/// `tools.jar` of the runtime home, a JDK root. A `jre` home is the nested JRE of
/// an older JDK, so its archive sits one level up. Without a runtime home the
/// IDE's bundled runtime is used.
fn tools_archive(ctx: &BuildContext<'_>, idea_path: &str) -> PathBuf {
    let Some(home) = &ctx.runtime_home else {
        return Path::new(idea_path).join("jbr").join("lib").join("tools.jar");
    };
    if home.file_name().is_some_and(|name| name == "jre") {
        home.join("..").join("lib").join("tools.jar")
    } else {
        home.join("lib").join("tools.jar")
    }
}

fn with_relay(ctx: &BuildContext<'_>, mut jvm_args: Vec<String>) -> Vec<String> {
    if let Some(relay) = ctx.config.relay_args() {
        jvm_args.extend(relay.jvm_args());
    }
    jvm_args
}

fn run_with_agent(ctx: &BuildContext<'_>) -> TaskSpec {
    let agent = &ctx.layout.agent;
    let class_to_launch = configured(ctx.config, CLASS_TO_LAUNCH);
    let classpath = component_classpath(agent).with(configured(ctx.config, TARGET_CLASS_PATH));
    let jvm_args = args::agent_attach_args(&agent.jar_path, class_to_launch);

    TaskSpec::new(RUN_WITH_AGENT, LAUNCH_GROUP, TaskAction::Launch)
        .describe(format!("Runs {class_to_launch} with the Projector agent attached"))
        .classpath(classpath)
        .main_class(&ctx.layout.agent_launcher)
        .jvm_args(with_relay(ctx, jvm_args))
        .depends_on(AGENT_JAR)
}

fn run_ide_with_agent(ctx: &BuildContext<'_>) -> TaskSpec {
    let agent = &ctx.layout.agent;
    let idea_path = configured(ctx.config, IDEA_PATH);
    let classpath = component_classpath(agent).with_all(ide_classpath(ctx, idea_path));
    let mut jvm_args = args::agent_attach_args(&agent.jar_path, IDE_MAIN_CLASS);
    jvm_args.extend(args::ide_args(args::AGENT_IDE_PATHS_SELECTOR));

    TaskSpec::new(RUN_IDE_WITH_AGENT, LAUNCH_GROUP, TaskAction::Launch)
        .describe(format!("Runs the IDE at {idea_path} with the Projector agent attached"))
        .classpath(classpath)
        .main_class(&ctx.layout.agent_launcher)
        .jvm_args(jvm_args)
        .depends_on(AGENT_JAR)
}

fn run_server(ctx: &BuildContext<'_>) -> TaskSpec {
    let server = &ctx.layout.server;
    let class_to_launch = configured(ctx.config, CLASS_TO_LAUNCH);
    let classpath = component_classpath(server).with(configured(ctx.config, TARGET_CLASS_PATH));
    let jvm_args = std::iter::once(args::system_property(
        SERVER_CLASS_TO_LAUNCH_PROPERTY,
        class_to_launch,
    ))
    .chain(SERVER_MODULE_ACCESS.iter().map(|arg| arg.to_string()))
    .collect();

    TaskSpec::new(RUN_SERVER, LAUNCH_GROUP, TaskAction::Launch)
        .describe(format!("Runs {class_to_launch} inside the Projector server"))
        .classpath(classpath)
        .main_class(&server.entry_point)
        .jvm_args(with_relay(ctx, jvm_args))
        .depends_on(SERVER_JAR)
}

fn run_ide_server(ctx: &BuildContext<'_>) -> TaskSpec {
    let server = &ctx.layout.server;
    let idea_path = configured(ctx.config, IDEA_PATH);
    let classpath = component_classpath(server).with_all(ide_classpath(ctx, idea_path));
    let mut jvm_args = vec![args::system_property(
        SERVER_CLASS_TO_LAUNCH_PROPERTY,
        IDE_MAIN_CLASS,
    )];
    jvm_args.extend(args::ide_args(args::SERVER_IDE_PATHS_SELECTOR));
    jvm_args.push(REFLECT_ACCESS.to_string());
    jvm_args.push(ALLOW_ATTACH_SELF.to_string());

    TaskSpec::new(RUN_IDE_SERVER, LAUNCH_GROUP, TaskAction::Launch)
        .describe(format!("Runs the IDE at {idea_path} inside the Projector server"))
        .classpath(classpath)
        .main_class(&server.entry_point)
        .jvm_args(with_relay(ctx, jvm_args))
        .depends_on(SERVER_JAR)
}
