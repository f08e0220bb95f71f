use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{Error, Result};
use crate::models::sort::{BrowseOptions, Order, SortKey};

/// Settings of an autoindex context. Every field has a default, so a config
/// file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoIndexConfig {
    pub browse_root: PathBuf,
    pub show_hidden: bool,
    pub sort_by: SortKey,
    pub order: Order,
    /// Prefix that icon names are joined onto.
    pub icon_base: String,
    /// Prefix of the file rendered under a listing.
    pub readme: String,
    /// Used when no icon can be guessed. Without it the guess error surfaces.
    pub fallback_icon: Option<String>,
}

impl Default for AutoIndexConfig {
    fn default() -> Self {
        Self {
            browse_root: PathBuf::from("."),
            show_hidden: false,
            sort_by: SortKey::Name,
            order: Order::Asc,
            icon_base: "/__icons__/".to_string(),
            readme: "README".to_string(),
            fallback_icon: None,
        }
    }
}

impl AutoIndexConfig {
    pub fn new(browse_root: impl Into<PathBuf>) -> Self {
        Self {
            browse_root: browse_root.into(),
            ..Self::default()
        }
    }

    /// Loads a JSON config file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        serde_json::from_str(&raw)
            .map_err(|e| Error::Config(format!("invalid {}: {e}", path.display())))
    }

    pub fn browse_options(&self) -> BrowseOptions {
        BrowseOptions::new(self.sort_by, self.order, self.show_hidden)
    }
}
