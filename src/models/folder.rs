use std::fs;
use std::ops::Deref;
use std::path::Path;
use std::sync::Arc;
use std::vec;

use crate::core::errors::{Error, Result};
use crate::models::entry::{classify, Entry, EntryInfo, Variant};
use crate::models::file_entry::File;
use crate::models::sort::{sort_entries, BrowseOptions};
use crate::services::icons::IconRules;

/// A directory: a plain folder, the browse root, or the synthetic parent link.
#[derive(Debug, Clone)]
pub struct Folder {
    info: EntryInfo,
    variant: Variant,
}

impl Folder {
    pub(crate) fn new(info: EntryInfo) -> Self {
        Self {
            info,
            variant: Variant::Folder,
        }
    }

    pub(crate) fn new_root(root: Arc<Path>, overlay: Option<Arc<IconRules>>) -> Self {
        Self {
            info: EntryInfo::new(Default::default(), root, overlay),
            variant: Variant::RootFolder,
        }
    }

    /// The "go up" entry for `child`.
    ///
    /// `child.path/..` goes through classification like any real path, so it
    /// must land on a folder inside the root. The root itself has no parent.
    pub fn parent_of(child: &Folder) -> Result<Folder> {
        if child.is_root() {
            return Err(Error::Forbidden(child.abspath().join("..")));
        }
        let path = child.path().join("..");
        match classify(&path, child.root(), child.overlay())? {
            Entry::Folder(_) => Ok(Folder {
                info: EntryInfo::new(path, child.root().clone(), child.overlay().cloned()),
                variant: Variant::ParentFolder,
            }),
            Entry::File(file) => Err(Error::NotFound(format!(
                "'{}' is not a folder",
                file.abspath().display()
            ))),
        }
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn is_root(&self) -> bool {
        self.variant == Variant::RootFolder || self.info.resolves_to_root()
    }

    /// Lists the folder: the parent link first (unless at the root), then
    /// the sorted children, hidden ones only when asked for.
    pub fn browse(&self, options: &BrowseOptions) -> Result<Browse> {
        let parent = if self.is_root() {
            None
        } else {
            Some(Entry::Folder(Folder::parent_of(self)?))
        };
        let children = sort_entries(self.children()?, options.sort_by, options.order);
        Ok(Browse {
            parent,
            children: children.into_iter(),
            show_hidden: options.show_hidden,
        })
    }

    /// Classifies every immediate child, in filesystem order.
    ///
    /// Children that stop existing between listing and classification, and
    /// nodes that are neither files nor folders, are skipped.
    pub fn children(&self) -> Result<Vec<Entry>> {
        let mut entries = Vec::new();
        for dirent in fs::read_dir(self.abspath())? {
            let dirent = dirent?;
            let path = self.path().join(dirent.file_name());
            match classify(&path, self.root(), self.overlay()) {
                Ok(entry) => entries.push(entry),
                Err(err) if err.is_not_found() => {
                    tracing::debug!(path = %path.display(), "skipping child: {err}");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(entries)
    }

    /// First file whose name starts with `prefix`, in lexicographic order.
    pub fn get_readme(&self, prefix: &str) -> Result<File> {
        let mut candidates: Vec<String> = fs::read_dir(self.abspath())?
            .filter_map(|dirent| dirent.ok())
            .filter_map(|dirent| dirent.file_name().into_string().ok())
            .filter(|name| name.starts_with(prefix))
            .collect();
        candidates.sort();

        for name in candidates {
            match self.get_file(&name) {
                Ok(file) => return Ok(file),
                Err(err) if err.is_not_found() => continue,
                Err(err) => return Err(err),
            }
        }
        Err(Error::NotFound(format!(
            "{} folder has no readme file",
            self.name()
        )))
    }

    /// The regular file `name` directly inside this folder.
    pub fn get_file(&self, name: &str) -> Result<File> {
        let path = self.path().join(name);
        match classify(&path, self.root(), self.overlay())? {
            Entry::File(file) => Ok(file),
            Entry::Folder(folder) => Err(Error::NotFound(format!(
                "'{}' is not a file",
                folder.abspath().display()
            ))),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        fs::symlink_metadata(self.abspath().join(name)).is_ok()
    }
}

impl Deref for Folder {
    type Target = EntryInfo;

    fn deref(&self) -> &EntryInfo {
        &self.info
    }
}

/// Entries produced by [`Folder::browse`]. Consumed once.
#[derive(Debug)]
pub struct Browse {
    parent: Option<Entry>,
    children: vec::IntoIter<Entry>,
    show_hidden: bool,
}

impl Iterator for Browse {
    type Item = Entry;

    fn next(&mut self) -> Option<Entry> {
        if let Some(parent) = self.parent.take() {
            return Some(parent);
        }
        let show_hidden = self.show_hidden;
        self.children
            .find(|entry| show_hidden || !entry.is_hidden())
    }
}
