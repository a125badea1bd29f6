//! Lazy page sequence implementation

use super::types::{PageCursor, Termination};
use crate::error::{Error, Result};
use crate::http::{RequestOptions, RestClient};
use crate::types::{JsonValue, StringMap};
use futures::Stream;
use tracing::warn;

/// Query parameter carrying the page size
const LIMIT_PARAM: &str = "limit";

/// Query parameter carrying the cursor token
const CURSOR_PARAM: &str = "cursor";

/// Forward-only lazy sequence of JSON pages
///
/// Each `next_page` call issues one GET through the owning client's
/// full recovery loop and yields the raw page object. The sequence is
/// not restartable mid-flight; build a new one to start over.
pub struct Pager<'a> {
    client: &'a RestClient,
    path: String,
    params: StringMap,
    max_pages: Option<u32>,
    cursor: PageCursor,
    termination: Option<Termination>,
    pending_error: Option<Error>,
    failed: bool,
}

impl<'a> Pager<'a> {
    pub(crate) fn new(
        client: &'a RestClient,
        path: &str,
        mut params: StringMap,
        page_size: u32,
        max_pages: Option<u32>,
    ) -> Self {
        params.insert(LIMIT_PARAM.to_string(), page_size.to_string());

        Self {
            client,
            path: path.to_string(),
            params,
            max_pages,
            cursor: PageCursor::default(),
            termination: None,
            pending_error: None,
            failed: false,
        }
    }

    /// The cursor state of this sequence
    pub fn cursor(&self) -> &PageCursor {
        &self.cursor
    }

    /// Pages yielded so far
    pub fn pages_fetched(&self) -> u32 {
        self.cursor.pages_fetched
    }

    /// How the sequence ended, once it has
    ///
    /// `None` while pages remain or after a failure;
    /// `Truncated` marks a deliberate page-cap cut-off the caller can
    /// tell apart from natural exhaustion.
    pub fn termination(&self) -> Option<Termination> {
        self.termination
    }

    /// Fetch and yield the next page
    ///
    /// Returns `None` once the sequence has terminated or failed. An
    /// empty 2xx page does not end the sequence; only a missing cursor
    /// combined with a false `has_more` flag (or the page cap) does.
    pub async fn next_page(&mut self) -> Option<Result<JsonValue>> {
        if self.failed || self.termination.is_some() {
            return None;
        }

        if let Some(err) = self.pending_error.take() {
            self.failed = true;
            return Some(Err(err));
        }

        let mut params = self.params.clone();
        if let Some(token) = &self.cursor.cursor {
            params.insert(CURSOR_PARAM.to_string(), token.clone());
        }

        let options = RequestOptions::new().query_map(params);
        let page = match self.client.get_with(&self.path, options).await {
            Ok(page) => page,
            Err(e) => {
                self.failed = true;
                return Some(Err(e));
            }
        };

        self.cursor.pages_fetched += 1;

        let next_cursor = page
            .get("next_cursor")
            .and_then(JsonValue::as_str)
            .map(String::from);
        let has_more = page
            .get("has_more")
            .and_then(JsonValue::as_bool)
            .unwrap_or(false);

        if next_cursor.is_none() && !has_more {
            self.termination = Some(Termination::Exhausted);
        } else if let Some(cap) = self.max_pages.filter(|cap| self.cursor.pages_fetched >= *cap) {
            warn!("reached page cap {cap} for {}", self.path);
            self.termination = Some(Termination::Truncated { max_pages: cap });
        } else if next_cursor.is_some() && next_cursor == self.cursor.cursor {
            // The current page is still yielded; the sequence fails on
            // the following pull instead of refetching forever.
            self.pending_error = Some(Error::pagination(format!(
                "cursor did not advance after page {}",
                self.cursor.pages_fetched
            )));
        } else if let Some(token) = next_cursor {
            self.cursor.cursor = Some(token);
        }
        // No new cursor but has_more=true: keep the held cursor and let
        // the source advance on its side.

        self.cursor.has_more = has_more;

        Some(Ok(page))
    }

    /// Adapt the sequence into a `futures::Stream` of pages
    pub fn into_stream(self) -> impl Stream<Item = Result<JsonValue>> + 'a {
        futures::stream::unfold(self, |mut pager| async move {
            pager.next_page().await.map(|item| (item, pager))
        })
    }
}

impl std::fmt::Debug for Pager<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pager")
            .field("path", &self.path)
            .field("cursor", &self.cursor)
            .field("max_pages", &self.max_pages)
            .field("termination", &self.termination)
            .finish_non_exhaustive()
    }
}
