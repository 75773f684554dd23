//! Font provisioning: download a remote zip and extract a curated set of
//! entries under renamed destinations.
//!
//! A group is provisioned when every destination exists. Extraction is staged
//! next to the destinations and only persisted once every entry of the group
//! was extracted, so a failed run leaves existing fonts untouched.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use once_cell::sync::Lazy;
use reqwest::blocking::Client;
use serde::Serialize;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info};
use zip::ZipArchive;
use zip::result::ZipError;

pub const DOWNLOAD_FONTS_TASK: &str = "downloadFonts";

pub static FONT_GROUPS: Lazy<Vec<FontAssetGroup>> = Lazy::new(|| {
    vec![
        FontAssetGroup::new(
            "CJK",
            "downloadCjkFonts",
            "https://noto-website-2.storage.googleapis.com/pkgs/NotoSansCJKjp-hinted.zip",
        )
        .entry("NotoSansCJKjp-Regular.otf", "CJK-R.otf"),
        FontAssetGroup::new(
            "default",
            "downloadDefaultFonts",
            "https://noto-website-2.storage.googleapis.com/pkgs/NotoSans-hinted.zip",
        )
        .entry("NotoSans-Regular.ttf", "Default-R.ttf")
        .entry("NotoSans-Italic.ttf", "Default-RI.ttf")
        .entry("NotoSans-Bold.ttf", "Default-B.ttf")
        .entry("NotoSans-BoldItalic.ttf", "Default-BI.ttf"),
        FontAssetGroup::new(
            "mono",
            "downloadMonoFonts",
            "https://download.jetbrains.com/fonts/JetBrainsMono-1.0.3.zip",
        )
        .entry("JetBrainsMono-1.0.3/ttf/JetBrainsMono-Regular.ttf", "Mono-R.ttf")
        .entry("JetBrainsMono-1.0.3/ttf/JetBrainsMono-Italic.ttf", "Mono-RI.ttf")
        .entry("JetBrainsMono-1.0.3/ttf/JetBrainsMono-Bold.ttf", "Mono-B.ttf")
        .entry("JetBrainsMono-1.0.3/ttf/JetBrainsMono-Bold-Italic.ttf", "Mono-BI.ttf"),
    ]
});

pub fn font_group(name: &str) -> Option<&'static FontAssetGroup> {
    FONT_GROUPS.iter().find(|group| group.name == name)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FontEntry {
    pub archive_path: String,
    pub file_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FontAssetGroup {
    pub name: String,
    pub task: String,
    pub url: String,
    pub entries: Vec<FontEntry>,
}

impl FontAssetGroup {
    pub fn new(name: impl Into<String>, task: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            task: task.into(),
            url: url.into(),
            entries: Vec::new(),
        }
    }

    pub fn entry(mut self, archive_path: impl Into<String>, file_name: impl Into<String>) -> Self {
        self.entries.push(FontEntry {
            archive_path: archive_path.into(),
            file_name: file_name.into(),
        });
        self
    }

    pub fn destinations(&self, fonts_dir: &Path) -> Vec<PathBuf> {
        self.entries
            .iter()
            .map(|entry| fonts_dir.join(&entry.file_name))
            .collect()
    }

    pub fn is_provisioned(&self, fonts_dir: &Path) -> bool {
        self.destinations(fonts_dir).iter().all(|path| path.exists())
    }
}

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("failed to download {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("download of {url} failed with status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("{url} is not a readable zip archive: {source}")]
    Archive {
        url: String,
        #[source]
        source: ZipError,
    },
    #[error("entry `{entry}` is missing from {url}")]
    Extraction { entry: String, url: String },
    #[error("i/o failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> ProvisionError + '_ {
    move |source| ProvisionError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provisioned {
    AlreadyPresent,
    Downloaded { files: usize, bytes: u64 },
}

pub struct FontProvisioner {
    fonts_dir: PathBuf,
    scratch_dir: PathBuf,
    http: Client,
}

impl FontProvisioner {
    pub fn new(fonts_dir: impl Into<PathBuf>, timeout: Duration) -> Result<Self, ProvisionError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ProvisionError::Client)?;
        Ok(Self {
            fonts_dir: fonts_dir.into(),
            scratch_dir: std::env::temp_dir(),
            http,
        })
    }

    /// Directory that receives the temporary archive while a group is extracted.
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = dir.into();
        self
    }

    pub fn fonts_dir(&self) -> &Path {
        &self.fonts_dir
    }

    pub fn ensure(&self, group: &FontAssetGroup) -> Result<Provisioned, ProvisionError> {
        let required = group.destinations(&self.fonts_dir);
        info!(group = %group.name, fonts = ?required, "checking fonts");

        if required.iter().all(|path| path.exists()) {
            info!(group = %group.name, "fonts already exist, skipping download");
            return Ok(Provisioned::AlreadyPresent);
        }

        info!(
            group = %group.name,
            url = %group.url,
            "some fonts are missing, downloading; existing files of this group will be replaced"
        );
        fs::create_dir_all(&self.fonts_dir).map_err(io_error(&self.fonts_dir))?;

        // The archive is removed when `archive` drops, on success and on every error path.
        let (archive, bytes) = self.download(group)?;
        let staged = self.extract(group, archive.path())?;

        let files = staged.len();
        for (file, destination) in staged {
            file.persist(&destination)
                .map_err(|err| ProvisionError::Io {
                    path: destination.clone(),
                    source: err.error,
                })?;
            debug!(path = %destination.display(), "font written");
        }

        info!(group = %group.name, files, bytes, "download complete");
        Ok(Provisioned::Downloaded { files, bytes })
    }

    fn download(&self, group: &FontAssetGroup) -> Result<(NamedTempFile, u64), ProvisionError> {
        fs::create_dir_all(&self.scratch_dir).map_err(io_error(&self.scratch_dir))?;
        let mut archive = tempfile::Builder::new()
            .prefix(&format!("{}-fonts", group.name))
            .suffix(".zip")
            .tempfile_in(&self.scratch_dir)
            .map_err(io_error(&self.scratch_dir))?;

        let mut response =
            self.http
                .get(&group.url)
                .send()
                .map_err(|source| ProvisionError::Download {
                    url: group.url.clone(),
                    source,
                })?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProvisionError::Status {
                url: group.url.clone(),
                status,
            });
        }

        let bytes = response
            .copy_to(&mut archive)
            .map_err(|source| ProvisionError::Download {
                url: group.url.clone(),
                source,
            })?;
        archive.flush().map_err(io_error(archive.path()))?;
        debug!(url = %group.url, bytes, path = %archive.path().display(), "archive downloaded");
        Ok((archive, bytes))
    }

    fn extract(
        &self,
        group: &FontAssetGroup,
        archive_path: &Path,
    ) -> Result<Vec<(NamedTempFile, PathBuf)>, ProvisionError> {
        let file = File::open(archive_path).map_err(io_error(archive_path))?;
        let mut archive = ZipArchive::new(file).map_err(|source| ProvisionError::Archive {
            url: group.url.clone(),
            source,
        })?;

        let mut staged = Vec::with_capacity(group.entries.len());
        for entry in &group.entries {
            let destination = self.fonts_dir.join(&entry.file_name);
            let mut source = match archive.by_name(&entry.archive_path) {
                Ok(source) => source,
                Err(ZipError::FileNotFound) => {
                    return Err(ProvisionError::Extraction {
                        entry: entry.archive_path.clone(),
                        url: group.url.clone(),
                    });
                }
                Err(source) => {
                    return Err(ProvisionError::Archive {
                        url: group.url.clone(),
                        source,
                    });
                }
            };

            let mut target = tempfile::Builder::new()
                .prefix(".staged-")
                .tempfile_in(&self.fonts_dir)
                .map_err(io_error(&self.fonts_dir))?;
            io::copy(&mut source, &mut target).map_err(io_error(&destination))?;
            staged.push((target, destination));
        }
        Ok(staged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn static_groups_match_task_surface() {
        let tasks: Vec<_> = FONT_GROUPS.iter().map(|group| group.task.as_str()).collect();
        assert_eq!(
            tasks,
            vec!["downloadCjkFonts", "downloadDefaultFonts", "downloadMonoFonts"]
        );
        let sizes: Vec<_> = FONT_GROUPS.iter().map(|group| group.entries.len()).collect();
        assert_eq!(sizes, vec![1, 4, 4]);
    }

    #[test]
    fn lookup_by_name() {
        let mono = font_group("mono").unwrap();
        assert_eq!(mono.entries[3].file_name, "Mono-BI.ttf");
        assert!(font_group("emoji").is_none());
    }

    #[test]
    fn provisioned_only_when_every_destination_exists() {
        let temp = TempDir::new().unwrap();
        let group = FontAssetGroup::new("test", "downloadTestFonts", "http://unused")
            .entry("a.ttf", "A.ttf")
            .entry("b.ttf", "B.ttf");
        assert!(!group.is_provisioned(temp.path()));
        fs::write(temp.path().join("A.ttf"), b"a").unwrap();
        assert!(!group.is_provisioned(temp.path()));
        fs::write(temp.path().join("B.ttf"), b"b").unwrap();
        assert!(group.is_provisioned(temp.path()));
    }

    #[test]
    fn present_group_skips_network() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("A.ttf"), b"a").unwrap();
        // Unroutable URL: any request attempt would fail the test.
        let group = FontAssetGroup::new("test", "downloadTestFonts", "http://127.0.0.1:9/none.zip")
            .entry("a.ttf", "A.ttf");
        let provisioner = FontProvisioner::new(temp.path(), Duration::from_secs(1)).unwrap();
        assert_eq!(provisioner.ensure(&group).unwrap(), Provisioned::AlreadyPresent);
    }
}
