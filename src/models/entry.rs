//! Filesystem entries and the classification entry point.
//!
//! An [`Entry`] is either a [`File`] or a [`Folder`]; folders further carry a
//! [`Variant`] telling plain folders apart from the browse root and from the
//! synthetic "go up" entry injected into listings. Entries are snapshots: the
//! filesystem is consulted once at construction and never re-validated.

use std::fmt;
use std::fs;
use std::io;
use std::ops::Deref;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use time::OffsetDateTime;

use crate::core::errors::{Error, Result};
use crate::models::file_entry::File;
use crate::models::folder::Folder;
use crate::services::icons::{self, IconRegistry, IconRules};
use crate::services::icons::url::IconUrlResolver;

/// Concrete kind of an entry. Fixed for the lifetime of the entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    File,
    Folder,
    RootFolder,
    ParentFolder,
}

impl Variant {
    pub const ALL: [Variant; 4] = [
        Variant::File,
        Variant::Folder,
        Variant::RootFolder,
        Variant::ParentFolder,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::File => "file",
            Variant::Folder => "folder",
            Variant::RootFolder => "root",
            Variant::ParentFolder => "parent",
        }
    }

    /// Folder family: everything that can be browsed.
    pub fn is_folder(&self) -> bool {
        !matches!(self, Variant::File)
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            Variant::File => 0,
            Variant::Folder => 1,
            Variant::RootFolder => 2,
            Variant::ParentFolder => 3,
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity and metadata shared by every variant.
#[derive(Debug, Clone)]
pub struct EntryInfo {
    path: PathBuf,
    root: Arc<Path>,
    abspath: PathBuf,
    name: String,
    hidden: bool,
    overlay: Option<Arc<IconRules>>,
}

impl EntryInfo {
    pub(crate) fn new(path: PathBuf, root: Arc<Path>, overlay: Option<Arc<IconRules>>) -> Self {
        let abspath = root.join(&path);
        let name = final_segment(&abspath);
        let hidden = name.starts_with('.');
        Self {
            path,
            root,
            abspath,
            name,
            hidden,
            overlay,
        }
    }

    /// Path relative to the root. Empty for the root folder.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn root(&self) -> &Arc<Path> {
        &self.root
    }

    pub fn abspath(&self) -> &Path {
        &self.abspath
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Icon rules supplied by the owning autoindex context, consulted first.
    pub fn overlay(&self) -> Option<&Arc<IconRules>> {
        self.overlay.as_ref()
    }

    /// Last modification time, read from the filesystem on every call.
    pub fn modified(&self) -> Result<OffsetDateTime> {
        let modified = fs::metadata(&self.abspath)?.modified()?;
        Ok(OffsetDateTime::from(modified))
    }

    pub(crate) fn resolves_to_root(&self) -> bool {
        same_file(&self.abspath, &self.root).unwrap_or(false)
    }
}

/// A classified filesystem node.
#[derive(Debug, Clone)]
pub enum Entry {
    File(File),
    Folder(Folder),
}

impl Entry {
    pub fn variant(&self) -> Variant {
        match self {
            Entry::File(_) => Variant::File,
            Entry::Folder(folder) => folder.variant(),
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self, Entry::File(_))
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, Entry::Folder(_))
    }

    pub fn as_file(&self) -> Option<&File> {
        match self {
            Entry::File(file) => Some(file),
            Entry::Folder(_) => None,
        }
    }

    pub fn as_folder(&self) -> Option<&Folder> {
        match self {
            Entry::Folder(folder) => Some(folder),
            Entry::File(_) => None,
        }
    }

    pub fn into_folder(self) -> Option<Folder> {
        match self {
            Entry::Folder(folder) => Some(folder),
            Entry::File(_) => None,
        }
    }

    pub fn into_file(self) -> Option<File> {
        match self {
            Entry::File(file) => Some(file),
            Entry::Folder(_) => None,
        }
    }

    pub fn is_root(&self) -> bool {
        match self {
            Entry::File(_) => false,
            Entry::Folder(folder) => folder.is_root(),
        }
    }

    /// The folder containing this entry, or `None` at the root.
    pub fn parent(&self) -> Result<Option<Entry>> {
        if self.is_root() {
            return Ok(None);
        }
        let path = fold_dots(self.path());
        let dir = path.parent().unwrap_or_else(|| Path::new(""));
        classify(dir, self.root(), self.overlay()).map(Some)
    }

    /// Resolves the icon URL through the process-wide registry.
    pub fn guess_icon(&self, urls: &dyn IconUrlResolver) -> Result<String> {
        icons::with_registry(|registry| self.guess_icon_with(registry, urls))
    }

    /// Same as [`Entry::guess_icon`] with an explicit registry.
    pub fn guess_icon_with(
        &self,
        registry: &IconRegistry,
        urls: &dyn IconUrlResolver,
    ) -> Result<String> {
        let icon = registry.guess(self)?;
        Ok(urls.icon_url(&icon))
    }
}

impl Deref for Entry {
    type Target = EntryInfo;

    fn deref(&self) -> &EntryInfo {
        match self {
            Entry::File(file) => &**file,
            Entry::Folder(folder) => &**folder,
        }
    }
}

impl From<File> for Entry {
    fn from(file: File) -> Self {
        Entry::File(file)
    }
}

impl From<Folder> for Entry {
    fn from(folder: Folder) -> Self {
        Entry::Folder(folder)
    }
}

/// Classifies `root/path` and builds the matching entry.
///
/// Directories become folders, except the one that is filesystem-identical
/// to `root`, which becomes the root folder. Regular files become files.
/// Anything else, including dangling symlinks, is [`Error::NotFound`].
pub fn classify(
    path: impl AsRef<Path>,
    root: &Arc<Path>,
    overlay: Option<&Arc<IconRules>>,
) -> Result<Entry> {
    let path = path.as_ref();
    let abspath = root.join(path);
    let metadata = match fs::metadata(&abspath) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(Error::not_found(abspath));
        }
        Err(err) => return Err(err.into()),
    };

    if metadata.is_dir() {
        if same_file(&abspath, root)? {
            return Ok(Entry::Folder(Folder::new_root(root.clone(), overlay.cloned())));
        }
        let info = EntryInfo::new(path.to_path_buf(), root.clone(), overlay.cloned());
        Ok(Entry::Folder(Folder::new(info)))
    } else if metadata.is_file() {
        let info = EntryInfo::new(path.to_path_buf(), root.clone(), overlay.cloned());
        Ok(Entry::File(File::new(info, &metadata)))
    } else {
        Err(Error::NotFound(format!(
            "'{}' is neither a file nor a folder",
            abspath.display()
        )))
    }
}

/// Filesystem identity, so that a symlinked root still matches itself.
pub(crate) fn same_file(a: &Path, b: &Path) -> io::Result<bool> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        let (ma, mb) = (fs::metadata(a)?, fs::metadata(b)?);
        Ok(ma.dev() == mb.dev() && ma.ino() == mb.ino())
    }
    #[cfg(not(unix))]
    {
        Ok(fs::canonicalize(a)? == fs::canonicalize(b)?)
    }
}

/// `path` with `.` and `..` folded away lexically. `..` at the top stays at
/// the top.
fn fold_dots(path: &Path) -> PathBuf {
    let mut folded = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                folded.pop();
            }
            other => folded.push(other),
        }
    }
    folded
}

fn final_segment(path: &Path) -> String {
    match path.components().next_back() {
        Some(Component::Normal(part)) => part.to_string_lossy().into_owned(),
        Some(Component::ParentDir) => "..".to_string(),
        Some(Component::CurDir) => ".".to_string(),
        _ => path.to_string_lossy().into_owned(),
    }
}
