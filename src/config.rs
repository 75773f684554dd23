//! Launcher properties (`local.properties`) loaded once at startup.
//!
//! Every recognized key is optional. A missing file or a missing key is a
//! valid state and resolves to `None`; an explicitly empty value is `Some("")`
//! and counts as present.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use thiserror::Error;
use tracing::debug;

pub const PROPERTIES_FILE: &str = "local.properties";

pub const IDEA_PATH: &str = "projectorLauncher.ideaPath";
pub const TARGET_CLASS_PATH: &str = "projectorLauncher.targetClassPath";
pub const CLASS_TO_LAUNCH: &str = "projectorLauncher.classToLaunch";
pub const RELAY_URL: &str = "ORG_JETBRAINS_PROJECTOR_SERVER_RELAY_URL";
pub const RELAY_SERVER_ID: &str = "ORG_JETBRAINS_PROJECTOR_SERVER_RELAY_SERVER_ID";

pub const RECOGNIZED_KEYS: [&str; 5] = [
    IDEA_PATH,
    TARGET_CLASS_PATH,
    CLASS_TO_LAUNCH,
    RELAY_URL,
    RELAY_SERVER_ID,
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    Read(PathBuf, #[source] io::Error),
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: PropertiesError,
    },
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("line {line}: {message}")]
pub struct PropertiesError {
    pub line: usize,
    pub message: String,
}

impl PropertiesError {
    fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// Immutable key/value view over the launcher properties.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Configuration {
    entries: IndexMap<String, String>,
}

impl Configuration {
    /// Reads `path`. A file that does not exist yields an empty configuration.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no launcher properties, all keys unset");
                return Ok(Self::default());
            }
            Err(err) => return Err(ConfigError::Read(path.to_path_buf(), err)),
        };

        // Properties files are traditionally ISO-8859-1.
        let raw = String::from_utf8(bytes).unwrap_or_else(|err| {
            debug!(path = %path.display(), "properties are not UTF-8, reading as ISO-8859-1");
            err.into_bytes().into_iter().map(char::from).collect()
        });

        let config = Self::parse(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), keys = config.len(), "loaded launcher properties");
        Ok(config)
    }

    pub fn parse(raw: &str) -> Result<Self, PropertiesError> {
        let mut entries = IndexMap::new();
        for (line, logical) in logical_lines(raw) {
            let (key, value) = split_key_value(&logical);
            let key = unescape(key).map_err(|message| PropertiesError::new(line, message))?;
            let value = unescape(value).map_err(|message| PropertiesError::new(line, message))?;
            entries.insert(key, value);
        }
        Ok(Self { entries })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn is_set(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn relay_args(&self) -> Option<RelayArgs> {
        let url = self.get(RELAY_URL)?;
        let server_id = self.get(RELAY_SERVER_ID)?;
        Some(RelayArgs {
            url: url.to_string(),
            server_id: server_id.to_string(),
        })
    }
}

impl<K, V> FromIterator<(K, V)> for Configuration
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

/// Relay endpoint forwarded to launched servers; only exists when both halves are set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayArgs {
    pub url: String,
    pub server_id: String,
}

impl RelayArgs {
    pub fn jvm_args(&self) -> [String; 2] {
        [
            format!("-D{RELAY_URL}={}", self.url),
            format!("-D{RELAY_SERVER_ID}={}", self.server_id),
        ]
    }
}

fn is_blank(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\u{c}')
}

/// Joins continuation lines and drops comments. Yields the 1-based line number
/// where each logical line starts.
fn logical_lines(raw: &str) -> Vec<(usize, String)> {
    let mut out = Vec::new();
    let mut current: Option<(usize, String)> = None;

    for (idx, line) in raw.lines().enumerate() {
        let piece = line.trim_start_matches(is_blank);
        if current.is_none()
            && (piece.is_empty() || piece.starts_with('#') || piece.starts_with('!'))
        {
            continue;
        }

        let trailing = piece.chars().rev().take_while(|ch| *ch == '\\').count();
        let continues = trailing % 2 == 1;
        let body = if continues {
            &piece[..piece.len() - 1]
        } else {
            piece
        };

        match current.as_mut() {
            Some((_, buffer)) => buffer.push_str(body),
            None => current = Some((idx + 1, body.to_string())),
        }
        if !continues {
            out.extend(current.take());
        }
    }

    out.extend(current.take());
    out
}

fn split_key_value(line: &str) -> (&str, &str) {
    let mut key_end = line.len();
    let mut chars = line.char_indices();
    while let Some((idx, ch)) = chars.next() {
        match ch {
            '\\' => {
                chars.next();
            }
            '=' | ':' => {
                key_end = idx;
                break;
            }
            ch if is_blank(ch) => {
                key_end = idx;
                break;
            }
            _ => {}
        }
    }

    let key = &line[..key_end];
    let mut value = line[key_end..].trim_start_matches(is_blank);
    if let Some(rest) = value.strip_prefix(['=', ':']) {
        value = rest.trim_start_matches(is_blank);
    }
    (key, value)
}

fn unescape(raw: &str) -> Result<String, String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{c}'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                if hex.chars().count() != 4 {
                    return Err(format!("truncated unicode escape `\\u{hex}`"));
                }
                let code = u32::from_str_radix(&hex, 16)
                    .map_err(|_| format!("malformed unicode escape `\\u{hex}`"))?;
                let decoded = char::from_u32(code)
                    .ok_or_else(|| format!("unicode escape `\\u{hex}` is not a scalar value"))?;
                out.push(decoded);
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    Ok(out)
}
