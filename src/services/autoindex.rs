//! The autoindex context: a browse root plus everything a serving layer
//! needs to turn a request path into a listing.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use crate::core::config::AutoIndexConfig;
use crate::core::errors::{Error, Result};
use crate::models::entry::{classify, Entry};
use crate::models::folder::Folder;
use crate::models::sort::BrowseOptions;
use crate::services::fs::listing::{list_folder, Listing};
use crate::services::icons::url::{IconBase, IconUrlResolver};
use crate::services::icons::IconRules;
use crate::services::markdown::{default_renderer, MarkdownRenderer};

/// What a request path resolved to.
#[derive(Debug)]
pub enum Page {
    Listing(Listing),
    File {
        abspath: PathBuf,
        mimetype: Option<String>,
    },
}

pub struct AutoIndex {
    root: Arc<Path>,
    config: AutoIndexConfig,
    icon_rules: Arc<IconRules>,
    icons: Arc<dyn IconUrlResolver>,
    markdown: Option<Arc<dyn MarkdownRenderer>>,
}

impl AutoIndex {
    pub fn new(config: AutoIndexConfig) -> Result<Self> {
        let root = config.browse_root.clone();
        let metadata = match fs::metadata(&root) {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(Error::not_found(root));
            }
            Err(err) => return Err(err.into()),
        };
        if !metadata.is_dir() {
            return Err(Error::NotFound(format!(
                "browse root '{}' is not a folder",
                root.display()
            )));
        }
        tracing::debug!(root = %root.display(), "autoindex context created");

        Ok(Self {
            root: Arc::from(root.as_path()),
            icons: Arc::new(IconBase::new(config.icon_base.clone())),
            icon_rules: Arc::default(),
            markdown: default_renderer(),
            config,
        })
    }

    pub fn with_icon_resolver(mut self, icons: impl IconUrlResolver + 'static) -> Self {
        self.icons = Arc::new(icons);
        self
    }

    /// Replaces the markdown renderer; `None` renders readmes as `<pre>`.
    pub fn with_markdown(mut self, renderer: Option<Arc<dyn MarkdownRenderer>>) -> Self {
        self.markdown = renderer;
        self
    }

    pub fn root(&self) -> &Arc<Path> {
        &self.root
    }

    pub fn config(&self) -> &AutoIndexConfig {
        &self.config
    }

    pub fn markdown(&self) -> Option<&dyn MarkdownRenderer> {
        self.markdown.as_deref()
    }

    /// Overlay rules, tried before the per-variant ones.
    pub fn icon_rules(&self) -> &IconRules {
        &self.icon_rules
    }

    /// Entries created afterwards see the change; existing ones keep their snapshot.
    pub fn icon_rules_mut(&mut self) -> &mut IconRules {
        Arc::make_mut(&mut self.icon_rules)
    }

    pub fn root_folder(&self) -> Result<Folder> {
        match self.entry("")? {
            Entry::Folder(folder) => Ok(folder),
            Entry::File(file) => Err(Error::NotFound(format!(
                "browse root '{}' is not a folder",
                file.abspath().display()
            ))),
        }
    }

    /// Classifies a request path. Paths leaving the root are [`Error::Forbidden`].
    pub fn entry(&self, requested: &str) -> Result<Entry> {
        let path = self.relative_path(requested)?;
        classify(path, &self.root, Some(&self.icon_rules))
    }

    pub fn browse_options(&self, sort_by: Option<&str>, order: Option<&str>) -> BrowseOptions {
        BrowseOptions::parse(sort_by, order, self.config.browse_options())
    }

    pub fn resolve(&self, requested: &str, options: &BrowseOptions) -> Result<Page> {
        match self.entry(requested)? {
            Entry::Folder(folder) => Ok(Page::Listing(list_folder(self, &folder, options)?)),
            Entry::File(file) => Ok(Page::File {
                abspath: file.abspath().to_path_buf(),
                mimetype: file.mimetype().map(str::to_string),
            }),
        }
    }

    /// Icon URL for `entry`, using the configured fallback when guessing fails.
    pub fn icon_url(&self, entry: &Entry) -> Result<String> {
        match entry.guess_icon(self.icons.as_ref()) {
            Ok(url) => Ok(url),
            Err(err @ Error::Guess(_)) => match &self.config.fallback_icon {
                Some(icon) => {
                    tracing::warn!("{err}, using {icon}");
                    Ok(self.icons.icon_url(icon))
                }
                None => Err(err),
            },
            Err(err) => Err(err),
        }
    }

    fn relative_path(&self, requested: &str) -> Result<PathBuf> {
        let candidate = Path::new(requested.trim_end_matches('/'));
        let mut clean = PathBuf::new();
        for component in candidate.components() {
            match component {
                Component::Normal(part) => clean.push(part),
                Component::CurDir => {}
                Component::ParentDir => {
                    if !clean.pop() {
                        return Err(Error::Forbidden(self.root.join(candidate)));
                    }
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Err(Error::Forbidden(candidate.to_path_buf()));
                }
            }
        }
        Ok(clean)
    }
}

impl fmt::Debug for AutoIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutoIndex")
            .field("root", &self.root)
            .field("config", &self.config)
            .field("icon_rules", &self.icon_rules)
            .field("markdown", &self.markdown.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::entry::Variant;
    use crate::models::sort::{Order, SortKey};
    use tempfile::TempDir;

    fn site() -> Result<(TempDir, AutoIndex)> {
        let dir = TempDir::new()?;
        fs::write(dir.path().join("README.md"), "# Docs\n\nWelcome.")?;
        fs::write(dir.path().join("logo.png"), "png")?;
        fs::create_dir_all(dir.path().join("notes").join("2024"))?;
        fs::write(dir.path().join("notes").join("todo.txt"), "milk")?;
        let index = AutoIndex::new(AutoIndexConfig::new(dir.path()))?;
        Ok((dir, index))
    }

    #[test]
    fn rejects_missing_or_file_roots() -> Result<()> {
        let dir = TempDir::new()?;
        fs::write(dir.path().join("plain.txt"), "x")?;

        let missing = AutoIndex::new(AutoIndexConfig::new(dir.path().join("nope")));
        assert!(missing.unwrap_err().is_not_found());
        let file = AutoIndex::new(AutoIndexConfig::new(dir.path().join("plain.txt")));
        assert!(file.unwrap_err().is_not_found());
        Ok(())
    }

    #[test]
    fn request_paths_are_normalised() -> Result<()> {
        let (_dir, index) = site()?;

        assert_eq!(index.entry("")?.variant(), Variant::RootFolder);
        assert_eq!(index.entry(".")?.variant(), Variant::RootFolder);
        assert_eq!(index.entry("notes/")?.name(), "notes");
        assert_eq!(index.entry("notes/2024/..")?.name(), "notes");
        assert_eq!(index.entry("notes/./todo.txt")?.variant(), Variant::File);
        Ok(())
    }

    #[test]
    fn paths_escaping_the_root_are_forbidden() -> Result<()> {
        let (_dir, index) = site()?;

        for path in ["..", "../etc/passwd", "notes/../../x", "/etc"] {
            assert!(
                matches!(index.entry(path), Err(Error::Forbidden(_))),
                "{path} should be forbidden"
            );
        }
        Ok(())
    }

    #[test]
    fn resolve_lists_folders_and_describes_files() -> Result<()> {
        let (_dir, index) = site()?;
        let options = index.browse_options(Some("-name"), None);
        assert_eq!(options.order, Order::Desc);

        let Page::Listing(listing) = index.resolve("notes", &options)? else {
            panic!("notes is a folder");
        };
        let names: Vec<&str> = listing.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["..", "2024", "todo.txt"]);
        assert_eq!(listing.sort_by, SortKey::Name);
        assert!(listing.readme.is_none());

        let Page::File { abspath, mimetype } = index.resolve("logo.png", &options)? else {
            panic!("logo.png is a file");
        };
        assert_eq!(abspath, index.root().join("logo.png"));
        assert_eq!(mimetype.as_deref(), Some("image/png"));

        assert!(index.resolve("missing", &options).unwrap_err().is_not_found());
        Ok(())
    }

    #[test]
    fn overlay_rules_reach_new_entries() -> Result<()> {
        let (_dir, mut index) = site()?;
        let before = index.entry("logo.png")?;
        index.icon_rules_mut().add_by_ext("picture.png", "png");

        assert_eq!(index.icon_rules().len(), 1);
        assert_eq!(index.icon_url(&index.entry("logo.png")?)?, "/__icons__/picture.png");
        assert_eq!(index.icon_url(&before)?, "/__icons__/page_white.png");
        Ok(())
    }

    #[test]
    fn custom_icon_resolver_is_used() -> Result<()> {
        let (_dir, index) = site()?;
        let index = index.with_icon_resolver(IconBase::new("https://cdn.example.com/silk"));

        let notes = index.entry("notes")?;
        assert_eq!(index.icon_url(&notes)?, "https://cdn.example.com/silk/folder.png");
        Ok(())
    }
}
