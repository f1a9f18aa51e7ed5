//! Pagination
//!
//! The KPA list endpoints paginate with a 1-based `page` body parameter and
//! report the total page count as `paging.last_page` in every response.
//! A token of `None` means "first page requested, no prior token"; the
//! server treats a missing `page` as page 1.
//!
//! Pages are fetched strictly in increasing order: the caller never asks
//! for page N+1 before page N's response has been consumed.

use crate::types::JsonValue;
use tracing::debug;

/// 1-based page number
pub type PageToken = u64;

/// Pagination mode for a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pagination {
    /// Repeated fetches driven by `paging.last_page`
    #[default]
    LastPage,
    /// Single-shot fetch, never a second page
    None,
}

impl Pagination {
    /// Compute the next page token from the previous token and the response
    /// body, or `None` when the sequence is complete.
    ///
    /// A previous token of `None` counts as page 1.
    pub fn next_token(&self, previous: Option<PageToken>, body: &JsonValue) -> Option<PageToken> {
        match self {
            Pagination::None => None,
            Pagination::LastPage => {
                let previous = previous.unwrap_or(1);
                let next = previous + 1;
                let last_page = body
                    .pointer("/paging/last_page")
                    .and_then(JsonValue::as_u64)
                    .unwrap_or(0);
                debug!(
                    "Got paging last_page={last_page}, prev_page={previous}, next_page={next}"
                );
                (last_page >= next).then_some(next)
            }
        }
    }
}

#[cfg(test)]
mod tests;
