//! Listing walkers.
//!
//! Two pagination styles are in play: the source collection API links pages
//! through a `next` cursor URL, the document API pages by offset/count with a
//! `total`. Both walkers share the same failure rules:
//!
//! - a transport/status/decode error on any page aborts the walk and no
//!   partial result is returned;
//! - a well-formed page that lacks the items key is a soft stop: the walk
//!   logs a warning and returns what it has accumulated so far;
//! - a `next` cursor pointing at an already fetched URL is also a soft stop.

use std::collections::HashSet;

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::transport::JsonTransport;

/// Items key of the cursor-paged source listings.
pub const CURSOR_ITEMS_KEY: &str = "values";
/// Items key of the offset-paged document listings.
pub const OFFSET_ITEMS_KEY: &str = "data";
/// Batch size requested per offset page.
pub const OFFSET_BATCH: usize = 100;

/// Follow `next` cursors from `start_url` and concatenate every page's items,
/// in response order.
pub async fn collect_cursor_pages<T>(
    transport: &T,
    start_url: &str,
    items_key: &str,
) -> Result<Vec<Value>, ApiError>
where
    T: JsonTransport + ?Sized,
{
    let mut items = Vec::new();
    let mut visited = HashSet::new();
    let mut next_url = Some(start_url.to_string());

    while let Some(url) = next_url.take() {
        if !visited.insert(url.clone()) {
            warn!(url = %url, "Listing cursor repeats an already fetched page, stopping pagination");
            break;
        }
        let page = transport.get_json(&url).await?;

        let batch = match page.get(items_key).and_then(Value::as_array) {
            Some(batch) => batch,
            None => {
                warn!(url = %url, items_key, "Unexpected listing shape, stopping pagination");
                break;
            }
        };
        debug!(url = %url, batch = batch.len(), "Fetched listing page");
        items.extend(batch.iter().cloned());

        next_url = page
            .get("next")
            .and_then(Value::as_str)
            .filter(|next| !next.is_empty())
            .map(str::to_string);
    }

    Ok(items)
}

/// Walk an offset-paged listing and return the first item `matches` accepts.
///
/// Stops on an empty batch, or once `offset + batch` reaches the reported
/// `total` (a missing total counts as zero, i.e. a single page).
pub async fn find_in_offset_pages<T, F>(
    transport: &T,
    base_url: &str,
    mut matches: F,
) -> Result<Option<Value>, ApiError>
where
    T: JsonTransport + ?Sized,
    F: FnMut(&Value) -> bool + Send,
{
    let separator = if base_url.contains('?') { '&' } else { '?' };
    let mut offset = 0usize;

    loop {
        let url = format!("{base_url}{separator}count={OFFSET_BATCH}&offset={offset}");
        let page = transport.get_json(&url).await?;

        let batch = match page.get(OFFSET_ITEMS_KEY).and_then(Value::as_array) {
            Some(batch) => batch,
            None => {
                warn!(url = %url, "Could not parse listing data, stopping pagination");
                return Ok(None);
            }
        };
        if batch.is_empty() {
            return Ok(None);
        }
        if let Some(found) = batch.iter().find(|item| matches(item)) {
            return Ok(Some(found.clone()));
        }

        let total = page.get("total").and_then(Value::as_u64).unwrap_or(0) as usize;
        if total <= offset + batch.len() {
            return Ok(None);
        }
        offset += batch.len();
    }
}
