use std::path::{Path, PathBuf};

use projector_build::config::{
    CLASS_TO_LAUNCH, Configuration, IDEA_PATH, RECOGNIZED_KEYS, RELAY_SERVER_ID, RELAY_URL,
    TARGET_CLASS_PATH,
};
use projector_build::layout::ProjectLayout;
use projector_build::settings::BuildSettings;
use projector_build::tasks::{
    AGENT_JAR, BuildContext, RUN_IDE_SERVER, RUN_IDE_WITH_AGENT, RUN_SERVER, RUN_WITH_AGENT,
    SERVER_JAR, TaskGraph,
};

const UNCONDITIONAL: [&str; 6] = [
    "downloadCjkFonts",
    "downloadDefaultFonts",
    "downloadMonoFonts",
    "downloadFonts",
    SERVER_JAR,
    AGENT_JAR,
];

fn layout() -> ProjectLayout {
    ProjectLayout::resolve(Path::new("/work"), &BuildSettings::default())
}

fn graph_for(pairs: &[(&str, &str)], runtime_home: Option<PathBuf>) -> TaskGraph {
    let config: Configuration = pairs.iter().copied().collect();
    let layout = layout();
    TaskGraph::build(&BuildContext::new(&config, &layout).with_runtime_home(runtime_home))
}

fn value_for(key: &str) -> &'static str {
    match key {
        IDEA_PATH => "/opt/ide",
        TARGET_CLASS_PATH => "/opt/app/app.jar",
        CLASS_TO_LAUNCH => "com.example.App",
        RELAY_URL => "wss://relay.example.com",
        RELAY_SERVER_ID => "srv-1",
        other => panic!("unexpected key {other}"),
    }
}

#[test]
fn gating_holds_for_every_subset_of_keys() {
    for mask in 0u32..32 {
        let pairs: Vec<(&str, &str)> = RECOGNIZED_KEYS
            .iter()
            .enumerate()
            .filter(|(bit, _)| mask & (1 << bit) != 0)
            .map(|(_, key)| (*key, value_for(key)))
            .collect();
        let graph = graph_for(&pairs, None);
        let has = |key: &str| pairs.iter().any(|(set, _)| *set == key);

        for name in UNCONDITIONAL {
            assert!(graph.contains(name), "mask {mask:05b}: {name} missing");
        }

        let ide = has(IDEA_PATH);
        let target = has(TARGET_CLASS_PATH) && has(CLASS_TO_LAUNCH);
        assert_eq!(graph.contains(RUN_IDE_WITH_AGENT), ide, "mask {mask:05b}");
        assert_eq!(graph.contains(RUN_IDE_SERVER), ide, "mask {mask:05b}");
        assert_eq!(graph.contains(RUN_WITH_AGENT), target, "mask {mask:05b}");
        assert_eq!(graph.contains(RUN_SERVER), target, "mask {mask:05b}");
        assert_eq!(
            graph.len(),
            UNCONDITIONAL.len() + 2 * usize::from(ide) + 2 * usize::from(target),
            "mask {mask:05b}"
        );
    }
}

#[test]
fn empty_value_counts_as_configured() {
    let graph = graph_for(&[(TARGET_CLASS_PATH, ""), (CLASS_TO_LAUNCH, "com.example.App")], None);
    assert!(graph.contains(RUN_WITH_AGENT));
    assert!(graph.contains(RUN_SERVER));
}

#[test]
fn idea_path_only_registers_ide_agent_launch() {
    let graph = graph_for(&[(IDEA_PATH, "/opt/ide")], None);
    assert!(graph.contains(RUN_IDE_WITH_AGENT));
    assert!(graph.contains("downloadFonts"));
    assert!(!graph.contains(RUN_WITH_AGENT));

    let task = graph.get(RUN_IDE_WITH_AGENT).unwrap();
    let layout = layout();
    let expected: Vec<String> = [
        layout.agent.classes_dir.clone(),
        layout.agent.jar_path.clone(),
        PathBuf::from("/opt/ide/lib/bootstrap.jar"),
        PathBuf::from("/opt/ide/lib/extensions.jar"),
        PathBuf::from("/opt/ide/lib/util.jar"),
        PathBuf::from("/opt/ide/lib/jdom.jar"),
        PathBuf::from("/opt/ide/lib/log4j.jar"),
        PathBuf::from("/opt/ide/lib/trove4j.jar"),
        PathBuf::from("/opt/ide/jbr/lib/tools.jar"),
    ]
    .iter()
    .map(|path| path.display().to_string())
    .collect();
    assert_eq!(task.classpath, expected);
    assert_eq!(
        task.main_class.as_deref(),
        Some("org.jetbrains.projector.agent.AgentLauncher")
    );
    assert_eq!(task.depends_on, vec![AGENT_JAR.to_string()]);
}

#[test]
fn runtime_home_locates_tools_archive() {
    let graph = graph_for(
        &[(IDEA_PATH, "/opt/ide")],
        Some(PathBuf::from("/usr/lib/jvm/java-8-openjdk")),
    );
    let task = graph.get(RUN_IDE_SERVER).unwrap();
    assert_eq!(
        task.classpath.last().map(String::as_str),
        Some("/usr/lib/jvm/java-8-openjdk/lib/tools.jar")
    );
}

#[test]
fn nested_jre_home_looks_one_level_up() {
    let graph = graph_for(&[(IDEA_PATH, "/opt/ide")], Some(PathBuf::from("/usr/lib/jvm/jdk/jre")));
    let task = graph.get(RUN_IDE_WITH_AGENT).unwrap();
    let tools = Path::new("/usr/lib/jvm/jdk/jre")
        .join("..")
        .join("lib")
        .join("tools.jar")
        .display()
        .to_string();
    assert_eq!(task.classpath.last(), Some(&tools));
}

#[test]
fn agent_launch_arguments() {
    let graph = graph_for(
        &[
            (TARGET_CLASS_PATH, "/opt/app/app.jar"),
            (CLASS_TO_LAUNCH, "com.example.App"),
        ],
        None,
    );
    let task = graph.get(RUN_WITH_AGENT).unwrap();
    let layout = layout();
    assert_eq!(
        task.jvm_args,
        vec![
            "-Djdk.attach.allowAttachSelf=true".to_string(),
            "-Dswing.bufferPerWindow=false".to_string(),
            format!(
                "-Dorg.jetbrains.projector.agent.path={}",
                layout.agent.jar_path.display()
            ),
            "-Dorg.jetbrains.projector.agent.classToLaunch=com.example.App".to_string(),
        ]
    );
    assert_eq!(task.classpath.last().map(String::as_str), Some("/opt/app/app.jar"));
}

#[test]
fn server_launch_arguments() {
    let graph = graph_for(
        &[
            (TARGET_CLASS_PATH, "/opt/app/app.jar"),
            (CLASS_TO_LAUNCH, "com.example.App"),
        ],
        None,
    );
    let task = graph.get(RUN_SERVER).unwrap();
    assert_eq!(
        task.main_class.as_deref(),
        Some("org.jetbrains.projector.server.ProjectorLauncher")
    );
    assert_eq!(
        task.jvm_args,
        vec![
            "-Dorg.jetbrains.projector.server.classToLaunch=com.example.App",
            "--add-opens=java.desktop/java.awt=ALL-UNNAMED",
            "--add-opens=java.desktop/sun.font=ALL-UNNAMED",
            "--add-opens=java.base/java.lang.reflect=ALL-UNNAMED",
        ]
    );
    assert_eq!(task.depends_on, vec![SERVER_JAR.to_string()]);
}

const IDE_MODULE_FLAGS: [&str; 9] = [
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

fn strings(args: &[&str]) -> Vec<String> {
    args.iter().map(|arg| arg.to_string()).collect()
}

#[test]
fn ide_agent_launch_arguments() {
    let graph = graph_for(&[(IDEA_PATH, "/opt/ide")], None);
    let task = graph.get(RUN_IDE_WITH_AGENT).unwrap();
    let layout = layout();

    let mut expected = vec![
        "-Djdk.attach.allowAttachSelf=true".to_string(),
        "-Dswing.bufferPerWindow=false".to_string(),
        format!(
            "-Dorg.jetbrains.projector.agent.path={}",
            layout.agent.jar_path.display()
        ),
        "-Dorg.jetbrains.projector.agent.classToLaunch=com.intellij.idea.Main".to_string(),
    ];
    expected.extend(strings(&[
        "-Didea.paths.selector=ProjectorIntelliJIdea2019.3",
        "-Didea.jre.check=true",
        "-Didea.is.internal=true",
    ]));
    expected.extend(strings(&IDE_MODULE_FLAGS));

    assert_eq!(task.jvm_args.len(), 16);
    assert_eq!(task.jvm_args, expected);
}

#[test]
fn ide_server_launch_arguments() {
    let graph = graph_for(&[(IDEA_PATH, "/opt/ide")], None);
    let task = graph.get(RUN_IDE_SERVER).unwrap();

    let mut expected = strings(&[
        "-Dorg.jetbrains.projector.server.classToLaunch=com.intellij.idea.Main",
        "-Didea.paths.selector=ProjectorIntelliJIdea",
        "-Didea.jre.check=true",
        "-Didea.is.internal=true",
    ]);
    expected.extend(strings(&IDE_MODULE_FLAGS));
    expected.extend(strings(&[
        "--add-opens=java.base/java.lang.reflect=ALL-UNNAMED",
        "-Djdk.attach.allowAttachSelf=true",
    ]));

    assert_eq!(task.jvm_args.len(), 15);
    assert_eq!(task.jvm_args, expected);
    assert_eq!(
        task.main_class.as_deref(),
        Some("org.jetbrains.projector.server.ProjectorLauncher")
    );
}

#[test]
fn relay_arguments_are_appended_verbatim() {
    let graph = graph_for(
        &[
            (IDEA_PATH, "/opt/ide"),
            (TARGET_CLASS_PATH, "/opt/app/app.jar"),
            (CLASS_TO_LAUNCH, "com.example.App"),
            (RELAY_URL, "wss://relay.example.com/a b"),
            (RELAY_SERVER_ID, "srv-1"),
        ],
        None,
    );
    let relay = [
        "-DORG_JETBRAINS_PROJECTOR_SERVER_RELAY_URL=wss://relay.example.com/a b".to_string(),
        "-DORG_JETBRAINS_PROJECTOR_SERVER_RELAY_SERVER_ID=srv-1".to_string(),
    ];
    for name in [RUN_WITH_AGENT, RUN_SERVER, RUN_IDE_SERVER] {
        let args = &graph.get(name).unwrap().jvm_args;
        assert_eq!(&args[args.len() - 2..], &relay, "{name}");
    }
    let ide_agent = &graph.get(RUN_IDE_WITH_AGENT).unwrap().jvm_args;
    assert!(!ide_agent.iter().any(|arg| arg.contains("RELAY")));
}

#[test]
fn relay_requires_both_values() {
    for pair in [(RELAY_URL, "wss://relay.example.com"), (RELAY_SERVER_ID, "srv-1")] {
        let graph = graph_for(
            &[
                (TARGET_CLASS_PATH, "/opt/app/app.jar"),
                (CLASS_TO_LAUNCH, "com.example.App"),
                pair,
            ],
            None,
        );
        for name in [RUN_WITH_AGENT, RUN_SERVER] {
            let args = &graph.get(name).unwrap().jvm_args;
            assert!(!args.iter().any(|arg| arg.contains("RELAY")), "{name}");
        }
    }
}

#[test]
fn agent_launch_plan_builds_everything_first() {
    let graph = graph_for(
        &[
            (TARGET_CLASS_PATH, "/opt/app/app.jar"),
            (CLASS_TO_LAUNCH, "com.example.App"),
        ],
        None,
    );
    let plan: Vec<&str> = graph
        .execution_plan(RUN_WITH_AGENT)
        .unwrap()
        .into_iter()
        .map(|spec| spec.name.as_str())
        .collect();

    assert_eq!(plan.len(), 7);
    let at = |name: &str| plan.iter().position(|step| *step == name).unwrap();
    for group in ["downloadCjkFonts", "downloadDefaultFonts", "downloadMonoFonts"] {
        assert!(at(group) < at("downloadFonts"));
    }
    assert!(at("downloadFonts") < at(SERVER_JAR));
    assert!(at(SERVER_JAR) < at(AGENT_JAR));
    assert_eq!(plan.last(), Some(&RUN_WITH_AGENT));
    assert!(!plan.contains(&RUN_SERVER));
}
