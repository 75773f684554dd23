use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use projector_build::cli::{ConfigSetArgs, ConfigShowArgs};
use projector_build::config::RECOGNIZED_KEYS;
use projector_build::project::{Project, ProjectOptions};
use projector_build::settings::{self, BuildSettings, SETTINGS_ENV, SETTINGS_FILE};
use projector_build::tasks::LAUNCH_RULES;
use serde_json::json;
use toml_edit::{DocumentMut, Item, Table, value};

pub fn show(project: &Project, args: &ConfigShowArgs) -> Result<()> {
    let gates: Vec<_> = LAUNCH_RULES
        .iter()
        .map(|rule| (rule.name, rule.missing_keys(&project.config)))
        .collect();

    if args.json {
        let properties: serde_json::Map<_, _> = project
            .config
            .iter()
            .map(|(key, value)| (key.to_string(), json!(value)))
            .collect();
        let tasks: Vec<_> = gates
            .iter()
            .map(|(name, missing)| {
                json!({ "task": name, "enabled": missing.is_empty(), "missing": missing })
            })
            .collect();
        let report = json!({
            "properties_file": project.properties_path,
            "properties": properties,
            "launch_tasks": tasks,
            "settings": project.settings,
        });
        let rendered =
            serde_json::to_string_pretty(&report).context("failed to serialize configuration")?;
        println!("{rendered}");
        return Ok(());
    }

    println!("properties: {}", project.properties_path.display());
    for key in RECOGNIZED_KEYS {
        match project.config.get(key) {
            Some(value) => println!("  {key} = {value}"),
            None => println!("  {key} (unset)"),
        }
    }
    for (key, value) in project.config.iter() {
        if !RECOGNIZED_KEYS.contains(&key) {
            println!("  {key} = {value} (ignored)");
        }
    }

    println!("launch tasks:");
    for (name, missing) in &gates {
        if missing.is_empty() {
            println!("  {name:<18} enabled");
        } else {
            println!("  {name:<18} needs {}", missing.join(", "));
        }
    }

    let rendered = toml::to_string_pretty(&project.settings).context("failed to render settings")?;
    println!("settings:");
    for line in rendered.lines() {
        println!("  {line}");
    }
    Ok(())
}

pub fn set_value(options: &ProjectOptions, args: &ConfigSetArgs) -> Result<()> {
    let path = target_path(options, args);
    ensure_parent(&path)?;

    let mut doc = if path.exists() {
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        if raw.trim().is_empty() {
            DocumentMut::new()
        } else {
            raw.parse::<DocumentMut>()
                .with_context(|| format!("failed to parse {}", path.display()))?
        }
    } else {
        DocumentMut::new()
    };

    apply_key(&mut doc, &args.key, &args.value)?;

    let rendered = doc.to_string();
    settings::parse(&rendered)
        .with_context(|| format!("refusing to write `{}` to {}", args.key, path.display()))?;
    fs::write(&path, rendered).with_context(|| format!("failed to write {}", path.display()))?;
    println!("Updated {}", path.display());
    Ok(())
}

/// `--file`, then `--settings`, then the settings env var, then the project file.
fn target_path(options: &ProjectOptions, args: &ConfigSetArgs) -> PathBuf {
    args.file
        .clone()
        .or_else(|| options.settings.clone())
        .or_else(|| std::env::var_os(SETTINGS_ENV).map(PathBuf::from))
        .unwrap_or_else(|| options.root.join(SETTINGS_FILE))
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    Ok(())
}

fn apply_key(doc: &mut DocumentMut, key: &str, value_str: &str) -> Result<()> {
    let segments = key
        .split('.')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>();
    let Some((last, parents)) = segments.split_last() else {
        bail!("settings key cannot be empty");
    };

    let item = typed_item(&segments, value_str)?;
    let mut current = doc.as_table_mut();
    for segment in parents {
        current = current
            .entry(segment)
            .or_insert(Item::Table(Table::new()))
            .as_table_mut()
            .ok_or_else(|| anyhow!("path `{segment}` is not a table in the settings"))?;
    }

    current.insert(last, item);
    Ok(())
}

/// Keys whose default is a number or a boolean keep that type; everything else is a string.
fn typed_item(segments: &[&str], raw: &str) -> Result<Item> {
    let defaults =
        toml::Value::try_from(BuildSettings::default()).context("failed to render defaults")?;
    let mut current = Some(&defaults);
    for segment in segments {
        current = current.and_then(|node| node.get(*segment));
    }

    match current {
        Some(toml::Value::Integer(_)) => {
            let parsed: i64 = raw
                .parse()
                .with_context(|| format!("`{}` expects an integer", segments.join(".")))?;
            Ok(value(parsed))
        }
        Some(toml::Value::Boolean(_)) => {
            let parsed: bool = raw
                .parse()
                .with_context(|| format!("`{}` expects true or false", segments.join(".")))?;
            Ok(value(parsed))
        }
        _ => Ok(value(raw)),
    }
}
