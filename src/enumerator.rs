//! Paginated enumeration of the remote library into a filename set.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::client::MediaItemSource;

/// Filenames reported by the remote library. Duplicate names collapse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteFilenameSet {
    names: HashSet<String>,
}

impl RemoteFilenameSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, filename: impl Into<String>) -> bool {
        self.names.insert(filename.into())
    }

    /// Exact, case-sensitive membership test.
    pub fn contains(&self, filename: &str) -> bool {
        self.names.contains(filename)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for RemoteFilenameSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Outcome of walking every page of the remote listing.
#[derive(Debug)]
pub enum Enumeration {
    /// Every page was fetched.
    Complete {
        filenames: RemoteFilenameSet,
        pages: usize,
    },
    /// A page fetch failed; `filenames` holds the union of the `pages` that succeeded.
    Truncated {
        filenames: RemoteFilenameSet,
        pages: usize,
        error: String,
    },
}

impl Enumeration {
    pub fn filenames(&self) -> &RemoteFilenameSet {
        match self {
            Enumeration::Complete { filenames, .. } | Enumeration::Truncated { filenames, .. } => {
                filenames
            }
        }
    }

    pub fn into_filenames(self) -> RemoteFilenameSet {
        match self {
            Enumeration::Complete { filenames, .. } | Enumeration::Truncated { filenames, .. } => {
                filenames
            }
        }
    }

    pub fn pages(&self) -> usize {
        match self {
            Enumeration::Complete { pages, .. } | Enumeration::Truncated { pages, .. } => *pages,
        }
    }

    pub fn is_truncated(&self) -> bool {
        matches!(self, Enumeration::Truncated { .. })
    }
}

/// Collect the filename of every remote media item.
///
/// Pages are requested one after another until the service stops returning a
/// next-page token. The first failed page ends the walk without retry; the
/// items from earlier pages are kept and the result is marked truncated.
pub async fn enumerate_filenames<S>(source: &S, page_size: u32) -> Enumeration
where
    S: MediaItemSource + ?Sized,
{
    let mut filenames = RemoteFilenameSet::new();
    let mut page_token: Option<String> = None;
    let mut pages = 0;

    loop {
        let page = match source.list_page(page_size, page_token.as_deref()).await {
            Ok(page) => page,
            Err(e) => {
                warn!(pages_fetched = pages, "remote enumeration stopped early: {}", e);
                return Enumeration::Truncated {
                    filenames,
                    pages,
                    error: e.to_string(),
                };
            }
        };

        pages += 1;
        debug!(page = pages, items = page.media_items.len(), "fetched media items page");

        page_token = page.next_token().map(str::to_string);
        for item in page.media_items {
            filenames.insert(item.filename);
        }

        if page_token.is_none() {
            break;
        }
    }

    info!(pages, filenames = filenames.len(), "remote enumeration complete");
    Enumeration::Complete { filenames, pages }
}
