//! # Paginator
//!
//! Fixed-size, order-preserving chunking for listing renderers.

use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;

/// One page of a listing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    /// 1-based page number.
    pub number: usize,
    /// Total pages in the listing.
    pub total: usize,
    /// Items on this page.
    pub items: Vec<T>,
}

/// Split `items` into chunks of `size`. The last chunk may be shorter.
///
/// Empty input yields no chunks; callers render their own empty state.
pub fn chunk<T: Clone>(items: &[T], size: NonZeroUsize) -> Vec<Vec<T>> {
    items.chunks(size.get()).map(|c| c.to_vec()).collect()
}

/// [`chunk`] with page numbers attached.
pub fn paginate<T: Clone>(items: &[T], size: NonZeroUsize) -> Vec<Page<T>> {
    let chunks = chunk(items, size);
    let total = chunks.len();
    chunks
        .into_iter()
        .enumerate()
        .map(|(i, items)| Page {
            number: i + 1,
            total,
            items,
        })
        .collect()
}
