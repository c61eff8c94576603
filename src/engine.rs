use std::collections::VecDeque;

use anyhow::{Context, Result};
use tracing::debug;

use crate::api::{JobMatch, JobsApi};
use crate::comments::CommentCache;
use crate::feed::{DEFAULT_PAGE_SIZE, Pagination};
use crate::filter::{self, JobFilter, SearchInput};
use crate::geo;
use crate::models::{CommentOwner, JobListing, Reaction, SkillCount, TrackKind, ViewerProfile};
use crate::rank;
use crate::reactions;
use crate::store::Store;

/// Everything the surface can ask the engine to do. Commands are queued
/// and consumed one at a time by a single-threaded reducer, so per-entity
/// mutations never overlap and the views always observe one mutation at a
/// time.
#[derive(Debug)]
pub enum Action {
    Search(SearchInput),
    FetchPage { page: u32 },
    LoadMore,
    OpenJob { id: String },
    ToggleLike { id: String },
    ToggleDislike { id: String },
    ToggleFavorite { id: String },
    LoadComments { owner: CommentOwner },
    AddComment {
        owner: CommentOwner,
        text: String,
        reply_to: Option<String>,
    },
    EditComment {
        owner: CommentOwner,
        comment_id: String,
        text: String,
    },
    DeleteComment {
        owner: CommentOwner,
        comment_id: String,
    },
    TrackView { id: String },
    TrackApply { id: String },
}

/// The feed engine: normalized store, pagination, comment cache and the
/// injected backend client, driven by dispatched actions.
pub struct Engine {
    api: Box<dyn JobsApi>,
    pub store: Store,
    pub pagination: Pagination,
    pub comments: CommentCache,
    profile: ViewerProfile,
    fingerprint: String,
    queue: VecDeque<Action>,
}

impl Engine {
    pub fn new(api: Box<dyn JobsApi>, profile: ViewerProfile, fingerprint: String) -> Self {
        Self {
            api,
            store: Store::new(),
            pagination: Pagination::new(DEFAULT_PAGE_SIZE),
            comments: CommentCache::new(),
            profile,
            fingerprint,
            queue: VecDeque::new(),
        }
    }

    /// Queue an action and drain the queue. Handlers may enqueue
    /// follow-up actions; they run after the current one finishes, never
    /// inside it.
    pub fn dispatch(&mut self, action: Action) -> Result<()> {
        self.queue.push_back(action);
        while let Some(next) = self.queue.pop_front() {
            self.handle(next)?;
        }
        Ok(())
    }

    fn handle(&mut self, action: Action) -> Result<()> {
        debug!(?action, "handling action");
        match action {
            Action::Search(input) => {
                let filter = filter::compose(&input, &self.profile);
                self.pagination.reset();
                self.fetch_page(1, filter, false)
            }
            Action::FetchPage { page } => {
                let filter = self.pagination.current_filter().clone();
                self.fetch_page(page, filter, false)
            }
            Action::LoadMore => {
                if let Some(page) = self.pagination.next_page() {
                    let filter = self.pagination.current_filter().clone();
                    self.fetch_page(page, filter, true)
                } else {
                    Ok(())
                }
            }
            Action::OpenJob { id } => {
                let job = self
                    .api
                    .fetch_job(&id)
                    .with_context(|| format!("Failed to open job {}", id))?;
                self.store.set_detail(job);
                self.queue.push_back(Action::TrackView { id });
                Ok(())
            }
            Action::ToggleLike { id } => {
                reactions::toggle_reaction(&mut self.store, self.api.as_ref(), &id, Reaction::Like)
            }
            Action::ToggleDislike { id } => reactions::toggle_reaction(
                &mut self.store,
                self.api.as_ref(),
                &id,
                Reaction::Dislike,
            ),
            Action::ToggleFavorite { id } => {
                reactions::toggle_favorite(&mut self.store, self.api.as_ref(), &id)
            }
            Action::LoadComments { owner } => self.comments.load(self.api.as_ref(), &owner),
            Action::AddComment {
                owner,
                text,
                reply_to,
            } => self.comments.add(
                &mut self.store,
                self.api.as_ref(),
                &owner,
                &text,
                reply_to.as_deref(),
            ),
            Action::EditComment {
                owner,
                comment_id,
                text,
            } => self
                .comments
                .edit(self.api.as_ref(), &owner, &comment_id, &text),
            Action::DeleteComment { owner, comment_id } => {
                self.comments
                    .delete(&mut self.store, self.api.as_ref(), &owner, &comment_id)
            }
            Action::TrackView { id } => self.track(&id, TrackKind::View),
            Action::TrackApply { id } => self.track(&id, TrackKind::Apply),
        }
    }

    fn fetch_page(&mut self, page: u32, filter: JobFilter, append: bool) -> Result<()> {
        let Some(ticket) = self.pagination.begin_fetch(page, filter, append) else {
            return Ok(());
        };
        let mut params = ticket.filter.to_query();
        params.push(("page".to_string(), ticket.page.to_string()));
        params.push(("limit".to_string(), self.pagination.page_size.to_string()));
        let result = self.api.fetch_jobs(&params);
        self.pagination
            .complete_fetch(&mut self.store, ticket, result);
        Ok(())
    }

    // Tracking is fire and forget; a lost beacon is not worth a warning.
    fn track(&mut self, id: &str, kind: TrackKind) -> Result<()> {
        if let Err(err) = self.api.track(id, kind, &self.fingerprint) {
            debug!(id, error = %err, "track event failed");
        }
        Ok(())
    }

    /// Current feed re-filtered and re-ordered by the viewer profile
    /// (the client-side fallback path; the primary feed comes from the
    /// backend pre-filtered with the same semantics). The active geo
    /// constraint is re-applied locally; jobs without coordinates are
    /// conservatively kept.
    pub fn personalized_feed(&self) -> Vec<JobListing> {
        let filter = self.pagination.current_filter();
        let jobs: Vec<JobListing> = self
            .store
            .feed_jobs()
            .into_iter()
            .filter(|job| match (filter.center, filter.radius_km) {
                (Some(center), Some(radius)) => job
                    .geo
                    .is_none_or(|point| geo::within_radius(center, point, radius)),
                _ => true,
            })
            .cloned()
            .collect();
        rank::personalize(jobs, &self.profile)
    }

    pub fn skill_stats(&self) -> Result<Vec<SkillCount>> {
        self.api.skill_stats()
    }

    pub fn match_score_for(&self, job_id: &str) -> Result<f64> {
        Ok(self.api.match_score(job_id)?.score)
    }

    pub fn match_scores_for_feed(&self) -> Result<Vec<JobMatch>> {
        let ids: Vec<String> = self.store.feed_ids().to_vec();
        self.api.match_batch(&ids)
    }
}
