use anyhow::{Result, anyhow};
use tracing::warn;

use crate::api::JobsApi;
use crate::models::{JobListing, Reaction};
use crate::store::Store;

// Bayesian priors for the company trust score: 8 phantom likes out of 10
// phantom ratings. A company nobody has rated sits at 80, not 0 or 100.
// Existing scores depend on these exact constants.
const PRIOR_LIKES: f64 = 8.0;
const PRIOR_TOTAL: f64 = 10.0;

pub fn trust_score(company_likes: u32, company_dislikes: u32) -> f64 {
    let likes = company_likes as f64;
    let total = (company_likes + company_dislikes) as f64;
    (likes + PRIOR_LIKES) / (total + PRIOR_TOTAL) * 100.0
}

/// What the optimistic transition decided to tell the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SyncOp {
    Add(Reaction),
    Remove(Reaction),
}

/// Everything a rollback needs to restore.
#[derive(Debug, Clone, Copy)]
struct ReactionSnapshot {
    likes: u32,
    dislikes: u32,
    user_reaction: Option<Reaction>,
    company_likes: u32,
    company_dislikes: u32,
    company_score: f64,
}

impl ReactionSnapshot {
    fn take(job: &JobListing) -> Self {
        Self {
            likes: job.likes,
            dislikes: job.dislikes,
            user_reaction: job.user_reaction,
            company_likes: job.company_likes,
            company_dislikes: job.company_dislikes,
            company_score: job.company_score,
        }
    }

    fn restore(&self, job: &mut JobListing) {
        job.likes = self.likes;
        job.dislikes = self.dislikes;
        job.user_reaction = self.user_reaction;
        job.company_likes = self.company_likes;
        job.company_dislikes = self.company_dislikes;
        job.company_score = self.company_score;
    }
}

fn bump(job: &mut JobListing, reaction: Reaction, up: bool) {
    let (count, company) = match reaction {
        Reaction::Like => (&mut job.likes, &mut job.company_likes),
        Reaction::Dislike => (&mut job.dislikes, &mut job.company_dislikes),
    };
    if up {
        *count += 1;
        *company += 1;
    } else {
        // Counts never go negative, whatever the server sent us.
        *count = count.saturating_sub(1);
        *company = company.saturating_sub(1);
    }
}

/// One toggle transition, applied in place. Returns the network op that
/// mirrors it.
fn apply_toggle(job: &mut JobListing, target: Reaction) -> SyncOp {
    let op = if job.user_reaction == Some(target) {
        // Active reaction toggled off.
        job.user_reaction = None;
        bump(job, target, false);
        SyncOp::Remove(target)
    } else {
        let previous = job.user_reaction;
        job.user_reaction = Some(target);
        bump(job, target, true);
        if let Some(prev) = previous {
            // Switching sides undoes the old reaction in the same step.
            bump(job, prev, false);
        }
        SyncOp::Add(target)
    };
    job.company_score = trust_score(job.company_likes, job.company_dislikes);
    op
}

/// Toggle like/dislike on a job: optimistic local transition first, then
/// the network mutation. Without a token the transition is silently
/// reverted and nothing is sent. A failed request also reverts, so local
/// counts never drift from the server (same policy as favorites).
pub fn toggle_reaction(
    store: &mut Store,
    api: &dyn JobsApi,
    job_id: &str,
    target: Reaction,
) -> Result<()> {
    let job = store
        .get_mut(job_id)
        .ok_or_else(|| anyhow!("Job {} is not held locally", job_id))?;

    let snapshot = ReactionSnapshot::take(job);
    let op = apply_toggle(job, target);

    if !api.has_token() {
        snapshot.restore(job);
        return Ok(());
    }

    let sent = match op {
        SyncOp::Add(reaction) => api.add_reaction(job_id, reaction),
        SyncOp::Remove(reaction) => api.remove_reaction(job_id, reaction),
    };
    if let Err(err) = sent {
        warn!(job_id, error = %err, "reaction sync failed, rolling back");
        if let Some(job) = store.get_mut(job_id) {
            snapshot.restore(job);
        }
    }
    Ok(())
}

/// Toggle the favorite flag and keep the favorites view in sync. The
/// flag flips optimistically; no token or a failed request flips it back
/// and restores the favorites list entry.
pub fn toggle_favorite(store: &mut Store, api: &dyn JobsApi, job_id: &str) -> Result<()> {
    let job = store
        .get_mut(job_id)
        .ok_or_else(|| anyhow!("Job {} is not held locally", job_id))?;

    let was_favorite = job.favorite;
    job.favorite = !was_favorite;
    if was_favorite {
        store.remove_favorite_id(job_id);
    } else {
        store.add_favorite_id(job_id);
    }

    let revert = |store: &mut Store| {
        if let Some(job) = store.get_mut(job_id) {
            job.favorite = was_favorite;
        }
        if was_favorite {
            store.add_favorite_id(job_id);
        } else {
            store.remove_favorite_id(job_id);
        }
    };

    if !api.has_token() {
        revert(store);
        return Ok(());
    }

    let sent = if was_favorite {
        api.remove_favorite(job_id)
    } else {
        api.add_favorite(job_id)
    };
    if let Err(err) = sent {
        warn!(job_id, error = %err, "favorite sync failed, rolling back");
        revert(store);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::MockApi;
    use crate::models::sample_job;

    fn store_with(job: crate::models::JobListing) -> Store {
        let mut store = Store::new();
        store.replace_feed(vec![job]);
        store
    }

    #[test]
    fn test_trust_score_prior_only_is_80() {
        assert_eq!(trust_score(0, 0), 80.0);
    }

    #[test]
    fn test_trust_score_moves_with_ratings() {
        // All dislikes drags the score below the prior.
        assert!(trust_score(0, 20) < 30.0);
        // All likes pushes it above.
        assert!(trust_score(20, 0) > 90.0);
        assert!(trust_score(1000, 0) <= 100.0);
    }

    #[test]
    fn test_like_from_neutral() {
        let api = MockApi::with_token();
        let mut store = store_with(sample_job("j1"));
        toggle_reaction(&mut store, &api, "j1", Reaction::Like).unwrap();

        let job = store.get("j1").unwrap();
        assert_eq!(job.user_reaction, Some(Reaction::Like));
        assert_eq!(job.likes, 1);
        assert_eq!(job.company_likes, 1);
        assert_eq!(api.call_log(), ["POST /likes j1 LIKE"]);
    }

    #[test]
    fn test_like_while_dislike_active_switches_in_one_transition() {
        let api = MockApi::with_token();
        let mut job = sample_job("j1");
        job.user_reaction = Some(Reaction::Dislike);
        job.dislikes = 4;
        job.company_dislikes = 4;
        job.company_score = trust_score(0, 4);
        let mut store = store_with(job);

        toggle_reaction(&mut store, &api, "j1", Reaction::Like).unwrap();

        let job = store.get("j1").unwrap();
        assert_eq!(job.user_reaction, Some(Reaction::Like));
        assert_eq!(job.likes, 1);
        assert_eq!(job.dislikes, 3);
        assert_eq!(job.company_likes, 1);
        assert_eq!(job.company_dislikes, 3);
        assert_eq!(job.company_score, trust_score(1, 3));
        // One logical transition, one request.
        assert_eq!(api.call_log(), ["POST /likes j1 LIKE"]);
    }

    #[test]
    fn test_double_toggle_returns_to_original_counts() {
        let api = MockApi::with_token();
        let mut job = sample_job("j1");
        job.likes = 10;
        job.company_likes = 10;
        let mut store = store_with(job);

        toggle_reaction(&mut store, &api, "j1", Reaction::Like).unwrap();
        toggle_reaction(&mut store, &api, "j1", Reaction::Like).unwrap();

        let job = store.get("j1").unwrap();
        assert_eq!(job.user_reaction, None);
        assert_eq!(job.likes, 10);
        assert_eq!(job.company_likes, 10);
        assert_eq!(
            api.call_log(),
            ["POST /likes j1 LIKE", "DELETE /likes j1 LIKE"]
        );
    }

    #[test]
    fn test_counts_floor_at_zero() {
        let api = MockApi::with_token();
        // Server sent zero counts but claims we already liked it.
        let mut job = sample_job("j1");
        job.user_reaction = Some(Reaction::Like);
        let mut store = store_with(job);

        toggle_reaction(&mut store, &api, "j1", Reaction::Like).unwrap();

        let job = store.get("j1").unwrap();
        assert_eq!(job.likes, 0);
        assert_eq!(job.company_likes, 0);
    }

    #[test]
    fn test_no_token_reverts_without_network() {
        let api = MockApi::default();
        let mut store = store_with(sample_job("j1"));

        toggle_reaction(&mut store, &api, "j1", Reaction::Like).unwrap();

        let job = store.get("j1").unwrap();
        assert_eq!(job.user_reaction, None);
        assert_eq!(job.likes, 0);
        assert!(api.call_log().is_empty());
    }

    #[test]
    fn test_failed_reaction_rolls_back() {
        let api = MockApi::failing();
        let mut job = sample_job("j1");
        job.likes = 3;
        job.company_likes = 3;
        job.company_score = trust_score(3, 0);
        let mut store = store_with(job);

        toggle_reaction(&mut store, &api, "j1", Reaction::Like).unwrap();

        let job = store.get("j1").unwrap();
        assert_eq!(job.user_reaction, None);
        assert_eq!(job.likes, 3);
        assert_eq!(job.company_score, trust_score(3, 0));
    }

    #[test]
    fn test_favorite_visible_in_both_views() {
        let api = MockApi::with_token();
        let mut store = store_with(sample_job("j1"));

        toggle_favorite(&mut store, &api, "j1").unwrap();
        assert!(store.get("j1").unwrap().favorite);
        assert_eq!(store.favorite_ids(), ["j1"]);
        // The feed sees the same record.
        assert!(store.feed_jobs()[0].favorite);

        toggle_favorite(&mut store, &api, "j1").unwrap();
        assert!(!store.get("j1").unwrap().favorite);
        assert!(store.favorite_ids().is_empty());
        assert_eq!(
            api.call_log(),
            ["POST /favorites j1", "DELETE /favorites j1"]
        );
    }

    #[test]
    fn test_repeated_favorite_never_duplicates() {
        let api = MockApi::with_token();
        let mut store = store_with(sample_job("j1"));
        for _ in 0..3 {
            toggle_favorite(&mut store, &api, "j1").unwrap();
        }
        assert_eq!(store.favorite_ids(), ["j1"]);
    }

    #[test]
    fn test_failed_favorite_rolls_back_flag_and_list() {
        let api = MockApi::failing();
        let mut store = store_with(sample_job("j1"));

        toggle_favorite(&mut store, &api, "j1").unwrap();

        assert!(!store.get("j1").unwrap().favorite);
        assert!(store.favorite_ids().is_empty());
    }

    #[test]
    fn test_favorite_without_token_is_local_noop() {
        let api = MockApi::default();
        let mut store = store_with(sample_job("j1"));

        toggle_favorite(&mut store, &api, "j1").unwrap();

        assert!(!store.get("j1").unwrap().favorite);
        assert!(store.favorite_ids().is_empty());
        assert!(api.call_log().is_empty());
    }
}
