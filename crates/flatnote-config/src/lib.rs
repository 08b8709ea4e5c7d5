use flatnote_engine::{ConvertOptions, EditorOptions, NavigationSettings, TriggerSettings};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Location of the settings file, before tilde expansion
const CONFIG_DIR: &str = "~/.config/flatnote";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read flatnote settings from {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Settings file {path} is not valid TOML: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Settings file {path} rejected: {reason}")]
    Invalid { path: PathBuf, reason: String },
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Config {
    /// Folder that relative document paths are resolved against
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documents_path: Option<PathBuf>,
    #[serde(default)]
    pub editor: EditorSettings,
}

/// Editor tunables. Every field falls back to its default when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    pub mention_trigger: char,
    pub command_trigger: char,
    pub max_mention_results: usize,
    pub single_line_factor: f64,
    pub edge_padding_factor: f64,
    pub long_block_chars: usize,
    pub legacy_cell_delimiter: char,
}

impl Default for EditorSettings {
    fn default() -> Self {
        let triggers = TriggerSettings::default();
        let navigation = NavigationSettings::default();
        Self {
            mention_trigger: triggers.mention_trigger,
            command_trigger: triggers.command_trigger,
            max_mention_results: triggers.max_mention_results,
            single_line_factor: navigation.single_line_factor,
            edge_padding_factor: navigation.edge_padding_factor,
            long_block_chars: navigation.long_block_chars,
            legacy_cell_delimiter: ConvertOptions::default().legacy_cell_delimiter,
        }
    }
}

impl EditorSettings {
    pub fn editor_options(&self) -> EditorOptions {
        EditorOptions {
            navigation: NavigationSettings {
                single_line_factor: self.single_line_factor,
                edge_padding_factor: self.edge_padding_factor,
                long_block_chars: self.long_block_chars,
            },
            triggers: TriggerSettings {
                mention_trigger: self.mention_trigger,
                command_trigger: self.command_trigger,
                max_mention_results: self.max_mention_results,
            },
            convert: ConvertOptions {
                legacy_cell_delimiter: self.legacy_cell_delimiter,
            },
        }
    }

    fn validate(&self) -> Result<(), String> {
        if self.mention_trigger == self.command_trigger {
            return Err(format!(
                "mention_trigger and command_trigger are both {:?}",
                self.mention_trigger
            ));
        }
        if self.mention_trigger.is_whitespace() || self.command_trigger.is_whitespace() {
            return Err("trigger characters cannot be whitespace".to_string());
        }
        if self.single_line_factor <= 0.0 || self.edge_padding_factor < 0.0 {
            return Err("line factors must be positive".to_string());
        }
        Ok(())
    }
}

impl Config {
    /// Read settings from `path`. A missing file is `Ok(None)`, so callers
    /// can fall back to [`Config::default`].
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Option<Self>, ConfigError> {
        let path = path.as_ref();
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        Self::parse(path, &text).map(Some)
    }

    fn parse(path: &Path, text: &str) -> Result<Self, ConfigError> {
        let mut config: Config = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.editor.validate().map_err(|reason| ConfigError::Invalid {
            path: path.to_path_buf(),
            reason,
        })?;
        if let Some(docs) = config.documents_path.take() {
            config.documents_path = Some(expand_path(&docs).unwrap_or(docs));
        }
        Ok(config)
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        Self::load_from_path(Self::config_path())
    }

    /// Write settings as TOML, creating missing parent folders.
    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let path = path.as_ref();
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Cannot create settings folder {}", dir.display()))?;
        }
        let text = toml::to_string_pretty(self).context("Cannot encode flatnote settings")?;
        std::fs::write(path, text)
            .with_context(|| format!("Cannot write flatnote settings to {}", path.display()))
    }

    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to_path(Self::config_path())
    }

    /// `~/.config/flatnote/config.toml` with the home folder filled in
    pub fn config_path() -> PathBuf {
        PathBuf::from(shellexpand::tilde(CONFIG_DIR).into_owned()).join(CONFIG_FILE)
    }

    /// Resolve a document path given on the command line. Relative paths
    /// that do not exist as given are looked up in `documents_path`.
    pub fn resolve_document(&self, path: &Path) -> PathBuf {
        match &self.documents_path {
            Some(root) if path.is_relative() && !path.exists() => root.join(path),
            _ => path.to_path_buf(),
        }
    }
}

/// Expand `~` and `$VAR` references. `None` when a variable is unset.
fn expand_path(path: &Path) -> Option<PathBuf> {
    shellexpand::full(&path.to_string_lossy())
        .ok()
        .map(|expanded| PathBuf::from(expanded.into_owned()))
}
