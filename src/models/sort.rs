//! Listing order.
//!
//! Children are ordered by a precomputed key with this precedence:
//!
//! | step | compares                                   | flipped by `Order` |
//! |------|--------------------------------------------|--------------------|
//! | 1    | folder family before files (not `modified`) | no                 |
//! | 2    | the requested attribute, absent values first | yes                |
//! | 3    | name                                       | yes                |

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::core::errors::Error;
use crate::models::entry::Entry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Name,
    Size,
    Modified,
    Ext,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Name => "name",
            SortKey::Size => "size",
            SortKey::Modified => "modified",
            SortKey::Ext => "ext",
        }
    }
}

impl FromStr for SortKey {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Error> {
        match value {
            "name" => Ok(SortKey::Name),
            "size" => Ok(SortKey::Size),
            "modified" => Ok(SortKey::Modified),
            "ext" => Ok(SortKey::Ext),
            other => Err(Error::Other(format!("unknown sort attribute '{other}'"))),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

impl Order {
    fn apply(&self, ordering: Ordering) -> Ordering {
        match self {
            Order::Asc => ordering,
            Order::Desc => ordering.reverse(),
        }
    }
}

impl FromStr for Order {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Error> {
        match value {
            "asc" | "+" | "1" => Ok(Order::Asc),
            "desc" | "-" | "-1" => Ok(Order::Desc),
            other => Err(Error::Other(format!("unknown order '{other}'"))),
        }
    }
}

/// How a folder is browsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct BrowseOptions {
    pub sort_by: SortKey,
    pub order: Order,
    pub show_hidden: bool,
}

impl BrowseOptions {
    pub fn new(sort_by: SortKey, order: Order, show_hidden: bool) -> Self {
        Self {
            sort_by,
            order,
            show_hidden,
        }
    }

    /// Reads query-string style values on top of `defaults`.
    ///
    /// A leading `+` or `-` on `sort_by` sets the order and wins over
    /// `order`. Unknown values keep the defaults.
    pub fn parse(sort_by: Option<&str>, order: Option<&str>, defaults: BrowseOptions) -> Self {
        let mut options = defaults;

        if let Some(order) = order {
            match order.parse() {
                Ok(order) => options.order = order,
                Err(err) => tracing::debug!("{err}, keeping {:?}", options.order),
            }
        }

        if let Some(raw) = sort_by {
            let attribute = match raw.chars().next() {
                Some(sign @ ('+' | '-')) => {
                    options.order = if sign == '+' { Order::Asc } else { Order::Desc };
                    &raw[1..]
                }
                _ => raw,
            };
            options.sort_by = match attribute.parse() {
                Ok(key) => key,
                Err(err) => {
                    tracing::debug!("{err}, sorting by name");
                    SortKey::Name
                }
            };
        }

        options
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum SortValue {
    Text(String),
    Bytes(u64),
    Time(OffsetDateTime),
}

struct SortRecord {
    rank: u8,
    value: Option<SortValue>,
    name: String,
}

impl SortRecord {
    fn of(entry: &Entry, key: SortKey) -> Self {
        let rank = match key {
            SortKey::Modified => 0,
            _ if entry.is_file() => 1,
            _ => 0,
        };
        Self {
            rank,
            value: sort_value(entry, key),
            name: entry.name().to_string(),
        }
    }

    fn compare(&self, other: &Self, order: Order) -> Ordering {
        self.rank.cmp(&other.rank).then_with(|| {
            order.apply(
                self.value
                    .cmp(&other.value)
                    .then_with(|| self.name.cmp(&other.name)),
            )
        })
    }
}

fn sort_value(entry: &Entry, key: SortKey) -> Option<SortValue> {
    match key {
        SortKey::Name => Some(SortValue::Text(entry.name().to_string())),
        SortKey::Size => entry.as_file().map(|file| SortValue::Bytes(file.size())),
        SortKey::Modified => entry.modified().ok().map(SortValue::Time),
        SortKey::Ext => entry
            .as_file()
            .and_then(|file| file.ext())
            .map(|ext| SortValue::Text(ext.to_string())),
    }
}

/// Sorts entries; every key is extracted once, so `modified` stats each entry a single time.
pub fn sort_entries(entries: Vec<Entry>, key: SortKey, order: Order) -> Vec<Entry> {
    let mut keyed: Vec<(SortRecord, Entry)> = entries
        .into_iter()
        .map(|entry| (SortRecord::of(&entry, key), entry))
        .collect();
    keyed.sort_by(|(a, _), (b, _)| a.compare(b, order));
    keyed.into_iter().map(|(_, entry)| entry).collect()
}
