use std::collections::HashMap;

use crate::models::JobListing;

/// Normalized job state. Every listing lives exactly once in `jobs`; the
/// feed, favorites and detail views are ordered id lists into it. A
/// mutation on the canonical record is visible to every view by
/// construction, so there is no "find all copies" step anywhere.
#[derive(Debug, Default)]
pub struct Store {
    jobs: HashMap<String, JobListing>,
    feed: Vec<String>,
    favorites: Vec<String>,
    detail: Option<String>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&JobListing> {
        self.jobs.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut JobListing> {
        self.jobs.get_mut(id)
    }

    /// Insert or overwrite a record without touching any view.
    pub fn upsert(&mut self, job: JobListing) {
        self.jobs.insert(job.id.clone(), job);
    }

    // --- Feed view ---

    pub fn replace_feed(&mut self, jobs: Vec<JobListing>) {
        self.feed.clear();
        for job in jobs {
            self.feed.push(job.id.clone());
            self.jobs.insert(job.id.clone(), job);
        }
        self.prune();
    }

    pub fn append_feed(&mut self, jobs: Vec<JobListing>) {
        for job in jobs {
            // A page boundary shifting under us can resend a listing.
            if !self.feed.contains(&job.id) {
                self.feed.push(job.id.clone());
            }
            self.jobs.insert(job.id.clone(), job);
        }
    }

    pub fn clear_feed(&mut self) {
        self.feed.clear();
        self.prune();
    }

    pub fn feed_ids(&self) -> &[String] {
        &self.feed
    }

    pub fn feed_jobs(&self) -> Vec<&JobListing> {
        self.feed.iter().filter_map(|id| self.jobs.get(id)).collect()
    }

    // --- Favorites view (derived, deduplicated) ---

    pub fn favorite_ids(&self) -> &[String] {
        &self.favorites
    }

    pub fn favorite_jobs(&self) -> Vec<&JobListing> {
        self.favorites
            .iter()
            .filter_map(|id| self.jobs.get(id))
            .collect()
    }

    pub fn add_favorite_id(&mut self, id: &str) {
        if !self.favorites.iter().any(|f| f == id) {
            self.favorites.push(id.to_string());
        }
    }

    pub fn remove_favorite_id(&mut self, id: &str) {
        self.favorites.retain(|f| f != id);
    }

    // --- Detail view ---

    pub fn set_detail(&mut self, job: JobListing) {
        self.detail = Some(job.id.clone());
        self.jobs.insert(job.id.clone(), job);
    }

    pub fn detail_job(&self) -> Option<&JobListing> {
        self.detail.as_deref().and_then(|id| self.jobs.get(id))
    }

    /// Drop records no view references anymore. Old references are dead
    /// after a feed replace; they are never migrated.
    fn prune(&mut self) {
        let feed = &self.feed;
        let favorites = &self.favorites;
        let detail = &self.detail;
        self.jobs.retain(|id, _| {
            feed.contains(id) || favorites.contains(id) || detail.as_deref() == Some(id.as_str())
        });
    }
}
