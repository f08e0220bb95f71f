//! autoindex: the filesystem side of a directory-listing page.
//!
//! Paths under a browse root are classified into [`Entry`] values (files,
//! folders, the root folder and the synthetic parent link). Folders can be
//! browsed into a sorted, filtered sequence of entries, every entry resolves
//! a display icon through ordered icon rules, and files render their content
//! as markup.
//!
//! ```no_run
//! use autoindex::{AutoIndex, AutoIndexConfig, BrowseOptions};
//!
//! # fn main() -> autoindex::Result<()> {
//! let mut index = AutoIndex::new(AutoIndexConfig::new("/srv/www"))?;
//! index.icon_rules_mut().add_by_ext("page_white_code.png", "rs");
//!
//! let folder = index.root_folder()?;
//! for entry in folder.browse(&BrowseOptions::default())? {
//!     println!("{} {}", index.icon_url(&entry)?, entry.name());
//! }
//! # Ok(())
//! # }
//! ```

pub mod core {
    pub mod config;
    pub mod errors;
    pub mod telemetry {
        pub mod logging;
    }
}

pub mod models {
    pub mod entry;
    pub mod file_entry;
    pub mod folder;
    pub mod sort;
}

pub mod services {
    pub mod autoindex;
    pub mod fs {
        pub mod listing;
    }
    pub mod icons;
    pub mod markdown;
}

pub use crate::core::config::AutoIndexConfig;
pub use crate::core::errors::{Error, Result};
pub use crate::models::entry::{classify, Entry, EntryInfo, Variant};
pub use crate::models::file_entry::File;
pub use crate::models::folder::{Browse, Folder};
pub use crate::models::sort::{sort_entries, BrowseOptions, Order, SortKey};
pub use crate::services::autoindex::{AutoIndex, Page};
pub use crate::services::fs::listing::{list_dir, list_dir_sync, EntrySummary, Listing};
pub use crate::services::icons::url::{IconBase, IconUrlResolver};
pub use crate::services::icons::{IconRegistry, IconRule, IconRules};
pub use crate::services::markdown::MarkdownRenderer;
