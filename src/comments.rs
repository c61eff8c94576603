use std::collections::HashMap;

use anyhow::{Context, Result, anyhow};
use tracing::warn;

use crate::api::JobsApi;
use crate::models::{Comment, CommentOwner};
use crate::store::Store;

/// Per-owner comment threads (jobs and news articles), mutated
/// optimistically and rolled back on failure. Unlike reactions, a failed
/// comment mutation is surfaced to the caller so the UI can tell the user.
#[derive(Debug, Default)]
pub struct CommentCache {
    threads: HashMap<CommentOwner, Vec<Comment>>,
}

fn find_mut<'a>(list: &'a mut [Comment], id: &str) -> Option<&'a mut Comment> {
    for comment in list {
        if comment.id == id {
            return Some(comment);
        }
        if let Some(found) = find_mut(&mut comment.replies, id) {
            return Some(found);
        }
    }
    None
}

/// Filter the id out of every level of the tree, then recurse into what
/// remains. Returns whether anything was removed.
fn remove_recursive(list: &mut Vec<Comment>, id: &str) -> bool {
    let before = list.len();
    list.retain(|c| c.id != id);
    let mut removed = list.len() != before;
    for comment in list.iter_mut() {
        removed |= remove_recursive(&mut comment.replies, id);
    }
    removed
}

fn bump_comment_count(store: &mut Store, owner: &CommentOwner, up: bool) {
    if let CommentOwner::Job(job_id) = owner {
        if let Some(job) = store.get_mut(job_id) {
            job.comment_count = if up {
                job.comment_count + 1
            } else {
                job.comment_count.saturating_sub(1)
            };
        }
    }
}

impl CommentCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&mut self, api: &dyn JobsApi, owner: &CommentOwner) -> Result<()> {
        let comments = api
            .fetch_comments(owner)
            .with_context(|| format!("Failed to load comments for {}", owner.id()))?;
        self.threads.insert(owner.clone(), comments);
        Ok(())
    }

    /// Thread for display: most recent first.
    pub fn thread(&self, owner: &CommentOwner) -> Vec<Comment> {
        let mut comments = self.threads.get(owner).cloned().unwrap_or_default();
        comments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        comments
    }

    /// Post a comment. The owning job's counter moves eagerly; the list
    /// itself only grows once the server has handed back the created
    /// comment (id and timestamp are server-assigned).
    pub fn add(
        &mut self,
        store: &mut Store,
        api: &dyn JobsApi,
        owner: &CommentOwner,
        text: &str,
        reply_to: Option<&str>,
    ) -> Result<()> {
        if !api.has_token() {
            return Ok(());
        }

        bump_comment_count(store, owner, true);

        match api.create_comment(owner, text, reply_to) {
            Ok(comment) => {
                let thread = self.threads.entry(owner.clone()).or_default();
                match reply_to {
                    Some(parent_id) => match find_mut(thread, parent_id) {
                        Some(parent) => parent.replies.push(comment),
                        // Parent vanished locally; the server accepted it,
                        // so a reload will pick it up.
                        None => thread.push(comment),
                    },
                    None => thread.push(comment),
                }
                Ok(())
            }
            Err(err) => {
                warn!(owner = owner.id(), error = %err, "comment post failed");
                bump_comment_count(store, owner, false);
                Err(err)
            }
        }
    }

    /// Optimistic text swap; the stored original comes back on failure.
    pub fn edit(
        &mut self,
        api: &dyn JobsApi,
        owner: &CommentOwner,
        comment_id: &str,
        text: &str,
    ) -> Result<()> {
        if !api.has_token() {
            return Ok(());
        }

        let thread = self
            .threads
            .get_mut(owner)
            .ok_or_else(|| anyhow!("No comments loaded for {}", owner.id()))?;
        let comment = find_mut(thread, comment_id)
            .ok_or_else(|| anyhow!("Comment {} not found", comment_id))?;

        let original = std::mem::replace(&mut comment.text, text.to_string());

        if let Err(err) = api.update_comment(comment_id, text) {
            warn!(comment_id, error = %err, "comment edit failed");
            if let Some(thread) = self.threads.get_mut(owner) {
                if let Some(comment) = find_mut(thread, comment_id) {
                    comment.text = original;
                }
            }
            return Err(err);
        }
        Ok(())
    }

    /// Optimistic removal over the whole reply tree plus an eager counter
    /// decrement; everything comes back on failure.
    pub fn delete(
        &mut self,
        store: &mut Store,
        api: &dyn JobsApi,
        owner: &CommentOwner,
        comment_id: &str,
    ) -> Result<()> {
        if !api.has_token() {
            return Ok(());
        }

        let thread = self
            .threads
            .get_mut(owner)
            .ok_or_else(|| anyhow!("No comments loaded for {}", owner.id()))?;
        let snapshot = thread.clone();

        if !remove_recursive(thread, comment_id) {
            return Err(anyhow!("Comment {} not found", comment_id));
        }
        bump_comment_count(store, owner, false);

        if let Err(err) = api.delete_comment(comment_id) {
            warn!(comment_id, error = %err, "comment delete failed");
            self.threads.insert(owner.clone(), snapshot);
            bump_comment_count(store, owner, true);
            return Err(err);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::MockApi;
    use crate::models::sample_job;
    use chrono::{Duration, Utc};

    fn comment(id: &str, text: &str, age_minutes: i64, replies: Vec<Comment>) -> Comment {
        Comment {
            id: id.to_string(),
            job_id: "j1".to_string(),
            user_id: "u1".to_string(),
            user_name: "Alice".to_string(),
            user_avatar: None,
            text: text.to_string(),
            created_at: Utc::now() - Duration::minutes(age_minutes),
            replies,
        }
    }

    fn owner() -> CommentOwner {
        CommentOwner::Job("j1".to_string())
    }

    fn seeded_cache(thread: Vec<Comment>) -> CommentCache {
        let mut cache = CommentCache::new();
        cache.threads.insert(owner(), thread);
        cache
    }

    fn store_with_count(count: u32) -> Store {
        let mut store = Store::new();
        let mut job = sample_job("j1");
        job.comment_count = count;
        store.replace_feed(vec![job]);
        store
    }

    #[test]
    fn test_thread_sorted_most_recent_first() {
        let cache = seeded_cache(vec![
            comment("old", "old", 60, vec![]),
            comment("new", "new", 1, vec![]),
            comment("mid", "mid", 30, vec![]),
        ]);
        let ids: Vec<String> = cache.thread(&owner()).into_iter().map(|c| c.id).collect();
        assert_eq!(ids, ["new", "mid", "old"]);
    }

    #[test]
    fn test_add_appends_server_comment_and_bumps_counter() {
        let api = MockApi::with_token();
        let mut store = store_with_count(2);
        let mut cache = seeded_cache(vec![]);

        cache.add(&mut store, &api, &owner(), "hello", None).unwrap();

        assert_eq!(store.get("j1").unwrap().comment_count, 3);
        let thread = cache.thread(&owner());
        assert_eq!(thread.len(), 1);
        // Server-assigned id, not a client placeholder.
        assert!(thread[0].id.starts_with("srv-"));
    }

    #[test]
    fn test_add_reply_lands_under_parent() {
        let api = MockApi::with_token();
        let mut store = store_with_count(1);
        let mut cache = seeded_cache(vec![comment("c1", "root", 10, vec![])]);

        cache
            .add(&mut store, &api, &owner(), "reply", Some("c1"))
            .unwrap();

        let thread = cache.thread(&owner());
        assert_eq!(thread.len(), 1);
        assert_eq!(thread[0].replies.len(), 1);
        assert_eq!(thread[0].replies[0].text, "reply");
    }

    #[test]
    fn test_failed_add_reverts_counter_and_errors() {
        let api = MockApi::failing();
        let mut store = store_with_count(2);
        let mut cache = seeded_cache(vec![]);

        let result = cache.add(&mut store, &api, &owner(), "hello", None);

        assert!(result.is_err());
        assert_eq!(store.get("j1").unwrap().comment_count, 2);
        assert!(cache.thread(&owner()).is_empty());
    }

    #[test]
    fn test_add_without_token_is_noop() {
        let api = MockApi::default();
        let mut store = store_with_count(2);
        let mut cache = seeded_cache(vec![]);

        cache.add(&mut store, &api, &owner(), "hello", None).unwrap();

        assert_eq!(store.get("j1").unwrap().comment_count, 2);
        assert!(api.call_log().is_empty());
    }

    #[test]
    fn test_edit_swaps_text_and_reverts_on_failure() {
        let api = MockApi::with_token();
        let mut cache = seeded_cache(vec![comment("c1", "original", 10, vec![])]);
        cache.edit(&api, &owner(), "c1", "edited").unwrap();
        assert_eq!(cache.thread(&owner())[0].text, "edited");

        let failing = MockApi::failing();
        assert!(cache.edit(&failing, &owner(), "c1", "worse").is_err());
        assert_eq!(cache.thread(&owner())[0].text, "edited");
    }

    #[test]
    fn test_delete_nested_reply_leaves_siblings() {
        let api = MockApi::with_token();
        let mut store = store_with_count(5);
        // c1 -> (c2 -> (c3, c4), c5)
        let mut cache = seeded_cache(vec![comment(
            "c1",
            "root",
            60,
            vec![
                comment(
                    "c2",
                    "branch",
                    50,
                    vec![
                        comment("c3", "deep", 40, vec![]),
                        comment("c4", "deep sibling", 39, vec![]),
                    ],
                ),
                comment("c5", "other branch", 45, vec![]),
            ],
        )]);

        cache.delete(&mut store, &api, &owner(), "c3").unwrap();

        assert_eq!(store.get("j1").unwrap().comment_count, 4);
        let thread = cache.thread(&owner());
        let branch = &thread[0].replies[0];
        assert_eq!(branch.id, "c2");
        assert_eq!(branch.replies.len(), 1);
        assert_eq!(branch.replies[0].id, "c4");
        assert_eq!(thread[0].replies[1].id, "c5");
    }

    #[test]
    fn test_failed_delete_restores_tree_and_counter() {
        let api = MockApi::failing();
        let mut store = store_with_count(2);
        let mut cache = seeded_cache(vec![
            comment("c1", "a", 10, vec![comment("c2", "b", 5, vec![])]),
        ]);

        let result = cache.delete(&mut store, &api, &owner(), "c2");

        assert!(result.is_err());
        assert_eq!(store.get("j1").unwrap().comment_count, 2);
        assert_eq!(cache.thread(&owner())[0].replies.len(), 1);
    }

    #[test]
    fn test_delete_unknown_id_errors_without_network() {
        let api = MockApi::with_token();
        let mut store = store_with_count(1);
        let mut cache = seeded_cache(vec![comment("c1", "a", 10, vec![])]);

        assert!(cache.delete(&mut store, &api, &owner(), "nope").is_err());
        assert_eq!(store.get("j1").unwrap().comment_count, 1);
        assert!(api.call_log().is_empty());
    }
}
