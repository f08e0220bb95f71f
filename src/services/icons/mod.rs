//! Icon rules.
//!
//! A rule pairs an icon with an optional predicate; rule lists are evaluated
//! in registration order and the first match wins. Each [`Variant`] owns a
//! list in the process-wide [`IconRegistry`], and an autoindex context may
//! put an overlay list in front of it. Register rules at startup, before
//! any lookups run.

pub mod url;

use std::fmt;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

use globset::Glob;

use crate::core::errors::{Error, Result};
use crate::models::entry::{Entry, Variant};

pub type Predicate = Arc<dyn Fn(&Entry) -> bool + Send + Sync>;
pub type IconFn = Arc<dyn Fn(&Entry) -> Option<String> + Send + Sync>;

#[derive(Clone)]
pub enum Icon {
    Named(String),
    /// Computes the icon from the entry; `None` means no match.
    Dynamic(IconFn),
}

impl fmt::Debug for Icon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Icon::Named(name) => f.debug_tuple("Named").field(name).finish(),
            Icon::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

#[derive(Clone)]
pub struct IconRule {
    icon: Icon,
    predicate: Option<Predicate>,
}

impl IconRule {
    pub fn new<P>(icon: impl Into<String>, predicate: P) -> Self
    where
        P: Fn(&Entry) -> bool + Send + Sync + 'static,
    {
        Self {
            icon: Icon::Named(icon.into()),
            predicate: Some(Arc::new(predicate)),
        }
    }

    /// Matches every entry.
    pub fn always(icon: impl Into<String>) -> Self {
        Self {
            icon: Icon::Named(icon.into()),
            predicate: None,
        }
    }

    pub fn dynamic<F>(icon: F) -> Self
    where
        F: Fn(&Entry) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            icon: Icon::Dynamic(Arc::new(icon)),
            predicate: None,
        }
    }

    pub fn icon(&self) -> &Icon {
        &self.icon
    }

    pub fn evaluate(&self, entry: &Entry) -> Option<String> {
        if let Some(predicate) = &self.predicate {
            if !predicate(entry) {
                return None;
            }
        }
        match &self.icon {
            Icon::Named(name) => Some(name.clone()),
            Icon::Dynamic(compute) => compute(entry),
        }
    }
}

impl fmt::Debug for IconRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IconRule")
            .field("icon", &self.icon)
            .field("predicate", &self.predicate.is_some())
            .finish()
    }
}

/// An ordered, append-only rule list. Duplicates are kept.
#[derive(Debug, Clone, Default)]
pub struct IconRules {
    rules: Vec<IconRule>,
}

impl IconRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &IconRule> {
        self.rules.iter()
    }

    pub fn push(&mut self, rule: IconRule) -> &mut Self {
        self.rules.push(rule);
        self
    }

    pub fn add<P>(&mut self, icon: impl Into<String>, predicate: P) -> &mut Self
    where
        P: Fn(&Entry) -> bool + Send + Sync + 'static,
    {
        self.push(IconRule::new(icon, predicate))
    }

    pub fn add_dynamic<F>(&mut self, icon: F) -> &mut Self
    where
        F: Fn(&Entry) -> Option<String> + Send + Sync + 'static,
    {
        self.push(IconRule::dynamic(icon))
    }

    pub fn add_by_name(&mut self, icon: impl Into<String>, name: impl Into<String>) -> &mut Self {
        let name = name.into();
        self.add(icon, move |entry| entry.name() == name)
    }

    /// Name match restricted to files.
    pub fn add_by_file_name(
        &mut self,
        icon: impl Into<String>,
        name: impl Into<String>,
    ) -> &mut Self {
        let name = name.into();
        self.add(icon, move |entry| entry.is_file() && entry.name() == name)
    }

    /// Name match restricted to the folder family.
    pub fn add_by_dir_name(
        &mut self,
        icon: impl Into<String>,
        name: impl Into<String>,
    ) -> &mut Self {
        let name = name.into();
        self.add(icon, move |entry| entry.is_folder() && entry.name() == name)
    }

    pub fn add_by_variant(&mut self, icon: impl Into<String>, variant: Variant) -> &mut Self {
        self.add(icon, move |entry| entry.variant() == variant)
    }

    /// `ext` is compared case-insensitively; a leading dot is ignored.
    pub fn add_by_ext(&mut self, icon: impl Into<String>, ext: &str) -> &mut Self {
        let ext = ext.trim_start_matches('.').to_lowercase();
        self.add(icon, move |entry| {
            entry.as_file().and_then(|file| file.ext()) == Some(ext.as_str())
        })
    }

    /// Shell-style glob over the guessed mimetype, e.g. `image/*`.
    ///
    /// Files with no known mimetype are matched against the empty string.
    pub fn add_by_mimetype(&mut self, icon: impl Into<String>, pattern: &str) -> Result<&mut Self> {
        let matcher = Glob::new(pattern)?.compile_matcher();
        Ok(self.add(icon, move |entry| match entry.as_file() {
            Some(file) => matcher.is_match(file.mimetype().unwrap_or("")),
            None => false,
        }))
    }

    /// The icon of the first matching rule.
    pub fn find(&self, entry: &Entry) -> Option<String> {
        self.rules.iter().find_map(|rule| rule.evaluate(entry))
    }
}

/// Per-variant rule lists and default icons.
#[derive(Debug, Clone)]
pub struct IconRegistry {
    rules: [IconRules; 4],
    defaults: [Option<String>; 4],
}

impl IconRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            rules: Default::default(),
            defaults: Default::default(),
        };
        for variant in Variant::ALL {
            registry.defaults[variant.index()] = Some(standard_icon(variant).to_string());
        }
        registry
    }

    pub fn rules(&self, variant: Variant) -> &IconRules {
        &self.rules[variant.index()]
    }

    pub fn rules_mut(&mut self, variant: Variant) -> &mut IconRules {
        &mut self.rules[variant.index()]
    }

    pub fn default_icon(&self, variant: Variant) -> Option<&str> {
        self.defaults[variant.index()].as_deref()
    }

    pub fn set_default_icon(&mut self, variant: Variant, icon: Option<String>) {
        self.defaults[variant.index()] = icon;
    }

    /// Raw icon for `entry`: overlay rules, then the variant's rules, then
    /// the variant's default.
    pub fn guess(&self, entry: &Entry) -> Result<String> {
        let variant = entry.variant();
        entry
            .overlay()
            .and_then(|overlay| overlay.find(entry))
            .or_else(|| self.rules(variant).find(entry))
            .or_else(|| self.default_icon(variant).map(str::to_string))
            .ok_or_else(|| Error::Guess(entry.name().to_string()))
    }
}

impl Default for IconRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn standard_icon(variant: Variant) -> &'static str {
    match variant {
        Variant::File => "page_white.png",
        Variant::Folder => "folder.png",
        Variant::RootFolder => "server.png",
        Variant::ParentFolder => "arrow_turn_up.png",
    }
}

static REGISTRY: LazyLock<RwLock<IconRegistry>> =
    LazyLock::new(|| RwLock::new(IconRegistry::new()));

/// Reads the process-wide registry.
pub fn with_registry<R>(f: impl FnOnce(&IconRegistry) -> R) -> R {
    let registry = REGISTRY.read().unwrap_or_else(PoisonError::into_inner);
    f(&registry)
}

/// Mutates the process-wide registry under the write lock.
pub fn register<R>(f: impl FnOnce(&mut IconRegistry) -> R) -> R {
    let mut registry = REGISTRY.write().unwrap_or_else(PoisonError::into_inner);
    f(&mut registry)
}
