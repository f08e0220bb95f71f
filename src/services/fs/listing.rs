use std::sync::Arc;

use serde::Serialize;
use time::format_description::well_known::Rfc3339;
use tokio::task;

use crate::core::errors::{Error, Result};
use crate::models::entry::Entry;
use crate::models::file_entry::File;
use crate::models::folder::Folder;
use crate::models::sort::{BrowseOptions, Order, SortKey};
use crate::services::autoindex::AutoIndex;

/// One row of a listing, ready for a template or a JSON response.
#[derive(Debug, Serialize, Clone)]
pub struct EntrySummary {
    pub name: String,
    pub path: String,
    pub kind: String,
    pub size: Option<u64>,
    pub modified: Option<String>,
    pub hidden: bool,
    pub icon: String,
    pub mimetype: Option<String>,
}

#[derive(Debug, Serialize, Clone)]
pub struct Listing {
    pub folder: EntrySummary,
    pub entries: Vec<EntrySummary>,
    pub sort_by: SortKey,
    pub order: Order,
    pub show_hidden: bool,
    /// Rendered readme of the folder, when it has one.
    pub readme: Option<String>,
}

pub async fn list_dir(index: Arc<AutoIndex>, path: String, options: BrowseOptions) -> Result<Listing> {
    // Listing is blocking filesystem work; keep it off the async executor.
    task::spawn_blocking(move || list_dir_sync(&index, &path, &options))
        .await
        .map_err(|e| Error::Other(format!("listing task failed: {e}")))?
}

/// Synchronous variant for callers without an async runtime.
pub fn list_dir_sync(index: &AutoIndex, path: &str, options: &BrowseOptions) -> Result<Listing> {
    match index.entry(path)? {
        Entry::Folder(folder) => list_folder(index, &folder, options),
        Entry::File(file) => Err(Error::NotFound(format!(
            "'{}' is not a folder",
            file.abspath().display()
        ))),
    }
}

pub fn list_folder(index: &AutoIndex, folder: &Folder, options: &BrowseOptions) -> Result<Listing> {
    let entries = folder
        .browse(options)?
        .map(|entry| summarize(index, &entry))
        .collect::<Result<Vec<_>>>()?;

    Ok(Listing {
        folder: summarize(index, &Entry::Folder(folder.clone()))?,
        entries,
        sort_by: options.sort_by,
        order: options.order,
        show_hidden: options.show_hidden,
        readme: readme_html(index, folder)?,
    })
}

pub fn summarize(index: &AutoIndex, entry: &Entry) -> Result<EntrySummary> {
    let file = entry.as_file();
    Ok(EntrySummary {
        name: entry.name().to_string(),
        path: entry.path().to_string_lossy().into_owned(),
        kind: entry.variant().as_str().to_string(),
        size: file.map(File::size),
        modified: entry
            .modified()
            .ok()
            .and_then(|modified| modified.format(&Rfc3339).ok()),
        hidden: entry.is_hidden(),
        icon: index.icon_url(entry)?,
        mimetype: file.and_then(File::mimetype).map(str::to_string),
    })
}

fn readme_html(index: &AutoIndex, folder: &Folder) -> Result<Option<String>> {
    let prefix = &index.config().readme;
    if prefix.is_empty() {
        return Ok(None);
    }
    let readme = match folder.get_readme(prefix) {
        Ok(readme) => readme,
        Err(err) if err.is_not_found() => return Ok(None),
        Err(err) => return Err(err),
    };
    match readme.to_html(index.markdown()) {
        Ok(html) => Ok(Some(html)),
        Err(err @ Error::Decode { .. }) => {
            tracing::warn!("skipping readme: {err}");
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::AutoIndexConfig;
    use std::fs;
    use tempfile::TempDir;

    fn docs() -> Result<(TempDir, AutoIndex)> {
        let dir = TempDir::new()?;
        fs::write(dir.path().join("README.md"), vec![b'x'; 120])?;
        fs::create_dir(dir.path().join(".git"))?;
        fs::create_dir(dir.path().join("notes"))?;
        let index = AutoIndex::new(AutoIndexConfig::new(dir.path()))?.with_markdown(None);
        Ok((dir, index))
    }

    #[test]
    fn root_listing_summarises_entries() -> Result<()> {
        let (_dir, index) = docs()?;

        let listing = list_dir_sync(&index, "", &BrowseOptions::default())?;
        assert_eq!(listing.folder.kind, "root");
        assert_eq!(listing.folder.icon, "/__icons__/server.png");

        let names: Vec<&str> = listing.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["notes", "README.md"]);

        let readme = &listing.entries[1];
        assert_eq!(readme.kind, "file");
        assert_eq!(readme.size, Some(120));
        assert_eq!(readme.path, "README.md");
        assert_eq!(readme.mimetype.as_deref(), Some("text/markdown"));
        assert_eq!(readme.icon, "/__icons__/page_white.png");
        assert!(readme.modified.is_some());
        assert_eq!(listing.entries[0].size, None);
        Ok(())
    }

    #[test]
    fn readme_is_rendered_under_the_listing() -> Result<()> {
        let (_dir, index) = docs()?;

        let listing = list_dir_sync(&index, "", &BrowseOptions::default())?;
        assert_eq!(listing.readme, Some(format!("<pre>{}</pre>", "x".repeat(120))));

        let listing = list_dir_sync(&index, "notes", &BrowseOptions::default())?;
        assert!(listing.readme.is_none());
        assert_eq!(listing.entries[0].kind, "parent");
        assert_eq!(listing.entries[0].icon, "/__icons__/arrow_turn_up.png");
        Ok(())
    }

    #[test]
    fn undecodable_readme_is_skipped() -> Result<()> {
        let (dir, index) = docs()?;
        fs::write(dir.path().join("notes").join("README"), [0xffu8, 0xfe])?;

        let listing = list_dir_sync(&index, "notes", &BrowseOptions::default())?;
        assert!(listing.readme.is_none());
        Ok(())
    }

    #[test]
    fn listing_a_file_is_not_found() -> Result<()> {
        let (_dir, index) = docs()?;

        let err = list_dir_sync(&index, "README.md", &BrowseOptions::default()).unwrap_err();
        assert!(err.is_not_found());
        Ok(())
    }

    #[test]
    fn listing_serialises_to_json() -> Result<()> {
        let (_dir, index) = docs()?;
        let options = BrowseOptions::new(SortKey::Size, Order::Desc, true);

        let listing = list_dir_sync(&index, "", &options)?;
        let json = serde_json::to_value(&listing).map_err(|e| Error::Other(e.to_string()))?;
        assert_eq!(json["sort_by"], "size");
        assert_eq!(json["order"], "desc");
        assert_eq!(json["entries"].as_array().map(Vec::len), Some(3));
        Ok(())
    }

    #[tokio::test]
    async fn list_dir_runs_off_the_executor() -> Result<()> {
        let (_dir, index) = docs()?;

        let listing = list_dir(Arc::new(index), "notes".to_string(), BrowseOptions::default()).await?;
        assert_eq!(listing.folder.name, "notes");
        assert_eq!(listing.entries.len(), 1);
        Ok(())
    }
}
