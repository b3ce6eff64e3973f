use serde_json::Value;
use tracing::{debug, instrument};

use super::{ApiError, FetchCache, Transport};

/// Number of items GitHub returns on a full page when `per_page` is not set.
pub const PAGE_SIZE: usize = 30;

/// Upper bound on pages requested for a single collection.
pub const MAX_PAGES: u32 = 9;

/// Fetch every page of the collection at `base_path` through the cache.
///
/// Stops on the first short page, on a 404 (treated as "no more data"), or
/// after `MAX_PAGES` pages. Items are returned in request order.
#[instrument(skip(cache))]
pub async fn list_all_pages<T: Transport>(
    cache: &FetchCache<T>,
    base_path: &str,
) -> Result<Vec<Value>, ApiError> {
    let mut items = Vec::new();

    for page in 1..=MAX_PAGES {
        let path = page_path(base_path, page);
        let body = match cache.get(&path, true).await {
            Ok(body) => body,
            Err(e) if e.is_not_found() => {
                debug!(page, "page not found, stopping");
                break;
            }
            Err(e) => return Err(e),
        };

        let Value::Array(page_items) = body else {
            return Err(ApiError::UnexpectedShape {
                path,
                expected: "a JSON array",
            });
        };

        let count = page_items.len();
        items.extend(page_items);
        debug!(page, count, "fetched page");

        if count < PAGE_SIZE {
            break;
        }
    }

    Ok(items)
}

/// Path for `page`; the first page is requested without a page parameter.
fn page_path(base_path: &str, page: u32) -> String {
    if page == 1 {
        return base_path.to_string();
    }
    let separator = if base_path.contains('?') { '&' } else { '?' };
    format!("{base_path}{separator}page={page}")
}
