use anyhow::Result;
use tracing::{debug, warn};

use crate::api::JobPage;
use crate::filter::JobFilter;
use crate::store::Store;

pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Handle for one outstanding page fetch. The sequence number fences the
/// response: anything that resets pagination while the fetch is out makes
/// the ticket stale, and a stale completion is dropped instead of
/// overwriting newer state.
#[derive(Debug)]
pub struct FetchTicket {
    seq: u64,
    pub page: u32,
    pub append: bool,
    pub filter: JobFilter,
}

/// Pagination state for the main feed. One fetch may be outstanding at a
/// time; `begin_fetch` while in flight is a no-op.
#[derive(Debug)]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
    pub total: u32,
    pub has_more: bool,
    in_flight: bool,
    seq: u64,
    current_filter: JobFilter,
}

impl Pagination {
    pub fn new(page_size: u32) -> Self {
        Self {
            page: 1,
            page_size,
            total: 0,
            has_more: false,
            in_flight: false,
            seq: 0,
            current_filter: JobFilter::default(),
        }
    }

    #[allow(dead_code)]
    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn current_filter(&self) -> &JobFilter {
        &self.current_filter
    }

    /// Page to request for "load more", if allowed right now.
    pub fn next_page(&self) -> Option<u32> {
        if self.has_more && !self.in_flight {
            Some(self.page + 1)
        } else {
            None
        }
    }

    /// A new filter always restarts at page 1 with a replace fetch.
    /// Bumping the sequence here also invalidates any fetch still out.
    pub fn reset(&mut self) {
        self.page = 1;
        self.total = 0;
        self.has_more = false;
        self.in_flight = false;
        self.seq += 1;
    }

    pub fn begin_fetch(&mut self, page: u32, filter: JobFilter, append: bool) -> Option<FetchTicket> {
        if self.in_flight {
            debug!(page, "fetch already in flight, ignoring");
            return None;
        }
        self.in_flight = true;
        self.seq += 1;
        Some(FetchTicket {
            seq: self.seq,
            page,
            append,
            filter,
        })
    }

    pub fn complete_fetch(&mut self, store: &mut Store, ticket: FetchTicket, result: Result<JobPage>) {
        if ticket.seq != self.seq {
            debug!(page = ticket.page, "dropping stale fetch response");
            return;
        }
        // The flag clears on every non-stale path, success or failure.
        self.in_flight = false;

        match result {
            Ok(page) => {
                debug!(
                    page = page.pagination.page,
                    total = page.pagination.total,
                    jobs = page.jobs.len(),
                    "page fetched"
                );
                self.page = ticket.page;
                self.total = page.pagination.total;
                // From the server's page count, never from result
                // emptiness: an empty page 1 of a 3-page result still has
                // more.
                self.has_more = ticket.page < page.pagination.pages;
                if ticket.append {
                    store.append_feed(page.jobs);
                } else {
                    store.replace_feed(page.jobs);
                }
                self.current_filter = ticket.filter;
            }
            Err(err) => {
                warn!(page = ticket.page, error = %err, "page fetch failed");
                self.has_more = false;
                if !ticket.append {
                    store.clear_feed();
                }
            }
        }
    }
}
