//! Paginated retrieval of the statistics-table listing

use futures::stream::{self, Stream};
use govstats_core::state::validate_page_size;
use govstats_core::{decode_listing, FetchState, Page};
use log::{debug, info};

use crate::client::StatsClient;
use crate::diagnostics::decode_or_dump;
use crate::prelude::*;

/// Default number of records requested per page
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// `startPosition` of the page at `index` (0-based); the API counts from 1
pub fn start_position(index: usize, page_size: usize) -> usize {
    1 + index * page_size
}

/// Lazily fetch listing pages until an empty page or cancellation
///
/// The cancel flag is checked before every request. A set flag ends the
/// stream without an error; a zero page size, or a transport, status or
/// decode failure ends it with one. Yielded pages are never empty.
pub fn fetch_pages(
    client: StatsClient,
    state: FetchState,
    page_size: usize,
) -> impl Stream<Item = Result<Page>> {
    stream::try_unfold(0usize, move |index| {
        fetch_page(client.clone(), state.clone(), index, page_size)
    })
}

async fn fetch_page(
    client: StatsClient,
    state: FetchState,
    index: usize,
    page_size: usize,
) -> Result<Option<(Page, usize)>> {
    validate_page_size(page_size)?;

    if state.cancel.is_cancelled() {
        info!("Listing fetch cancelled before page {}", index + 1);
        return Ok(None);
    }

    let start = start_position(index, page_size);
    debug!("Requesting listing page {} (startPosition={})", index + 1, start);

    let body = client
        .get_text(
            state.format.listing_endpoint(),
            &[
                ("appId", state.app_id.clone()),
                ("limit", page_size.to_string()),
                ("startPosition", start.to_string()),
            ],
        )
        .await?;

    let (page, count) = decode_or_dump(client.dump_dir(), state.format, &body, |b| {
        decode_listing(state.format, b)
    })?;

    if count == 0 || page.is_empty() {
        info!("Listing exhausted after {} page(s)", index);
        return Ok(None);
    }

    debug!("Page {} carried {} record(s)", index + 1, count);
    Ok(Some((page, index + 1)))
}
