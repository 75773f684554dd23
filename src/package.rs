use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};
use walkdir::WalkDir;
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::layout::ComponentLayout;
use crate::manifest::{MANIFEST_PATH, ManifestAttributes};

/// Entries never copied into a produced jar.
const EXCLUDED_ENTRIES: &[&str] = &["META-INF/versions/9/module-info.class", MANIFEST_PATH];

/// Packs the component's classes and resources behind a freshly composed manifest.
pub fn build_jar(component: &ComponentLayout) -> Result<PathBuf> {
    write_jar(
        &component.jar_path,
        &component.manifest(),
        &[&component.classes_dir, &component.resources_dir],
    )?;
    Ok(component.jar_path.clone())
}

/// Writes `out` with the manifest first, then every file under `roots` in order.
/// When two roots provide the same entry the first one wins.
pub fn write_jar(out: &Path, manifest: &ManifestAttributes, roots: &[&Path]) -> Result<usize> {
    let parent = out
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)
        .with_context(|| format!("failed to create {}", parent.display()))?;

    let staged = NamedTempFile::new_in(parent)
        .with_context(|| format!("failed to stage jar in {}", parent.display()))?;
    let mut zip = ZipWriter::new(staged);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.start_file(MANIFEST_PATH, options)
        .context("failed to start manifest entry")?;
    zip.write_all(manifest.render().as_bytes())
        .context("failed to write manifest entry")?;

    let mut seen: HashSet<String> = HashSet::from([MANIFEST_PATH.to_string()]);
    let mut written = 1;
    for root in roots {
        if !root.is_dir() {
            warn!(dir = %root.display(), "package input missing, skipping");
            continue;
        }
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.with_context(|| format!("failed to walk {}", root.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry_name(root, entry.path())?;
            if EXCLUDED_ENTRIES.contains(&name.as_str()) {
                debug!(entry = %name, "excluded from jar");
                continue;
            }
            if !seen.insert(name.clone()) {
                warn!(entry = %name, jar = %out.display(), "duplicate jar entry, keeping the first copy");
                continue;
            }

            zip.start_file(name.as_str(), options)
                .with_context(|| format!("failed to start entry {name}"))?;
            let mut file = File::open(entry.path())
                .with_context(|| format!("failed to open {}", entry.path().display()))?;
            io::copy(&mut file, &mut zip)
                .with_context(|| format!("failed to write entry {name}"))?;
            written += 1;
        }
    }

    let staged = zip.finish().context("failed to finalize jar")?;
    staged
        .persist(out)
        .with_context(|| format!("failed to write {}", out.display()))?;
    info!(jar = %out.display(), entries = written, "package written");
    Ok(written)
}

fn entry_name(root: &Path, path: &Path) -> Result<String> {
    let relative = path
        .strip_prefix(root)
        .with_context(|| format!("{} is outside {}", path.display(), root.display()))?;
    let mut segments = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(segment) => segments.push(
                segment
                    .to_str()
                    .ok_or_else(|| anyhow!("non UTF-8 path {}", path.display()))?,
            ),
            other => {
                return Err(anyhow!(
                    "unexpected path component {other:?} in {}",
                    path.display()
                ));
            }
        }
    }
    Ok(segments.join("/"))
}
