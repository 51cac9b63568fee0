use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use crate::graph::{FileEntry, GraphClient, GraphError};

/// What a listing window is scoped to. Part of the cursor key so a
/// continuation token can never leak across contexts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ListingScope {
    RootChildren,
    PathChildren(String),
    Search(String),
}

impl ListingScope {
    pub fn from_request(path: &str, search: &str) -> Self {
        if !search.is_empty() {
            ListingScope::Search(search.to_string())
        } else if path.is_empty() || path == "/" {
            ListingScope::RootChildren
        } else {
            ListingScope::PathChildren(path.to_string())
        }
    }

    /// Stable key identifying the logical view this scope belongs to,
    /// used for request sequencing.
    pub fn view_key(&self) -> String {
        match self {
            ListingScope::RootChildren => "list:/".to_string(),
            ListingScope::PathChildren(path) => format!("list:{path}"),
            ListingScope::Search(query) => format!("search:{query}"),
        }
    }
}

/// Full context a continuation cursor was issued under. A cursor is only
/// valid for the exact scope, ordering, and page size it came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CursorKey {
    pub scope: ListingScope,
    pub order_by: String,
    pub page_size: u32,
}

/// Keyed store of continuation cursors, one slot per listing context.
#[derive(Default)]
pub struct CursorCache {
    cursors: DashMap<CursorKey, String>,
}

impl CursorCache {
    pub fn new() -> Self {
        Self {
            cursors: DashMap::new(),
        }
    }

    pub fn get(&self, key: &CursorKey) -> Option<String> {
        self.cursors.get(key).map(|c| c.clone())
    }

    pub fn store(&self, key: CursorKey, cursor: String) {
        self.cursors.insert(key, cursor);
    }

    pub fn clear(&self, key: &CursorKey) {
        self.cursors.remove(key);
    }
}

/// Monotonically increasing request sequence per logical view. The number
/// is echoed in listing responses so a client can discard any response
/// that is not the latest issued for its view.
#[derive(Default)]
pub struct ViewSequence {
    latest: DashMap<String, u64>,
}

impl ViewSequence {
    pub fn new() -> Self {
        Self {
            latest: DashMap::new(),
        }
    }

    /// Issues the next sequence number for a view.
    pub fn next(&self, view: &str) -> u64 {
        let mut entry = self.latest.entry(view.to_string()).or_insert(0);
        *entry += 1;
        *entry
    }

    pub fn is_latest(&self, view: &str, seq: u64) -> bool {
        self.latest.get(view).map(|latest| *latest == seq).unwrap_or(false)
    }
}

/// One page of normalized listing results.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileListing {
    pub files: Vec<FileEntry>,
    pub total: usize,
    pub has_more: bool,
    pub seq: u64,
}

/// Translates (path, search, page, page size) requests into remote drive
/// calls, threading continuation cursors through the keyed cache.
pub struct ListingGateway {
    graph: Arc<GraphClient>,
    cursors: CursorCache,
    views: ViewSequence,
}

const ORDER_BY: &str = "name";

impl ListingGateway {
    pub fn new(graph: Arc<GraphClient>) -> Self {
        Self {
            graph,
            cursors: CursorCache::new(),
            views: ViewSequence::new(),
        }
    }

    pub async fn list(
        &self,
        access_token: &str,
        path: &str,
        search: &str,
        page: u32,
        page_size: u32,
    ) -> Result<FileListing, GraphError> {
        let scope = ListingScope::from_request(path, search);
        let key = CursorKey {
            scope: scope.clone(),
            order_by: ORDER_BY.to_string(),
            page_size,
        };

        // Page 1 always starts a fresh window for its own context.
        if page <= 1 {
            self.cursors.clear(&key);
        }
        let cursor = self.cursors.get(&key);

        let window = match &scope {
            ListingScope::Search(query) => {
                self.graph
                    .search(access_token, query, Some(page_size), cursor.as_deref())
                    .await?
            }
            ListingScope::RootChildren | ListingScope::PathChildren(_) => {
                self.graph
                    .list_children(access_token, path, page_size, cursor.as_deref())
                    .await?
            }
        };

        let has_more = window.next_link.is_some();
        match window.next_link.as_deref().and_then(skiptoken_from_next_link) {
            Some(token) => {
                debug!(view = %scope.view_key(), "stored continuation cursor");
                self.cursors.store(key, token);
            }
            None => self.cursors.clear(&key),
        }

        let seq = self.views.next(&scope.view_key());
        let files: Vec<FileEntry> = window.value.into_iter().map(FileEntry::from).collect();

        Ok(FileListing {
            total: files.len(),
            has_more,
            files,
            seq,
        })
    }

    pub fn is_latest(&self, path: &str, search: &str, seq: u64) -> bool {
        self.views
            .is_latest(&ListingScope::from_request(path, search).view_key(), seq)
    }
}

/// Pulls the opaque `$skiptoken` out of a remote `@odata.nextLink` URL.
fn skiptoken_from_next_link(link: &str) -> Option<String> {
    let (_, rest) = link.split_once("$skiptoken=")?;
    let token = rest.split('&').next()?;
    (!token.is_empty()).then(|| token.to_string())
}
