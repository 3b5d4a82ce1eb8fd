use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use sootview::source::ClassLoadingOptions;

/// Optional JSON settings merged with the command line.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct Config {
    pub(crate) java_version: Option<u32>,
    pub(crate) classpath: Vec<PathBuf>,
    /// Loading options keyed by location path, spelled as on the command line.
    pub(crate) location_options: BTreeMap<String, ClassLoadingOptions>,
}

impl Config {
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let text =
            fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("failed to parse {}", path.display()))
    }

    pub(crate) fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub(crate) fn options_for(&self, location_name: &str) -> Option<ClassLoadingOptions> {
        self.location_options.get(location_name).cloned()
    }
}
