use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::models::{Comment, CommentOwner, JobListing, MatchScore, PageMeta, Reaction, SkillCount, TrackKind};

/// One page of listings as returned by GET /jobs.
#[derive(Debug, Clone, Deserialize)]
pub struct JobPage {
    pub jobs: Vec<JobListing>,
    pub pagination: PageMeta,
}

/// Backend seam. The engine only ever talks to this trait, so tests swap
/// in a scripted implementation and the CLI injects the HTTP one.
pub trait JobsApi {
    fn has_token(&self) -> bool;

    fn fetch_jobs(&self, params: &[(String, String)]) -> Result<JobPage>;
    fn fetch_job(&self, id: &str) -> Result<JobListing>;

    fn add_reaction(&self, job_id: &str, reaction: Reaction) -> Result<()>;
    fn remove_reaction(&self, job_id: &str, reaction: Reaction) -> Result<()>;

    fn add_favorite(&self, job_id: &str) -> Result<()>;
    fn remove_favorite(&self, job_id: &str) -> Result<()>;

    fn fetch_comments(&self, owner: &CommentOwner) -> Result<Vec<Comment>>;
    fn create_comment(
        &self,
        owner: &CommentOwner,
        text: &str,
        reply_to: Option<&str>,
    ) -> Result<Comment>;
    fn update_comment(&self, comment_id: &str, text: &str) -> Result<()>;
    fn delete_comment(&self, comment_id: &str) -> Result<()>;

    fn skill_stats(&self) -> Result<Vec<SkillCount>>;
    fn track(&self, job_id: &str, kind: TrackKind, fingerprint: &str) -> Result<()>;
    fn match_score(&self, job_id: &str) -> Result<MatchScore>;
    fn match_batch(&self, job_ids: &[String]) -> Result<Vec<JobMatch>>;
}

// --- Wire types ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReactionBody<'a> {
    job_id: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FavoriteBody<'a> {
    job_id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CommentBody<'a> {
    job_id: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_id: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct CommentUpdateBody<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct TrackBody<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    fingerprint: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MatchBatchBody<'a> {
    job_ids: &'a [String],
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobMatch {
    pub job_id: String,
    pub score: f64,
}

#[derive(Debug, Deserialize)]
struct MatchBatchResponse {
    scores: Vec<JobMatch>,
}

// --- HTTP client ---

pub struct HttpJobsApi {
    base_url: String,
    token: Option<String>,
    client: reqwest::blocking::Client,
}

impl HttpJobsApi {
    pub fn new(base_url: &str, token: Option<String>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            client: reqwest::blocking::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authed(&self, req: reqwest::blocking::RequestBuilder) -> reqwest::blocking::RequestBuilder {
        match &self.token {
            Some(token) => req.header("Authorization", format!("Bearer {}", token)),
            None => req,
        }
    }

    fn check(response: reqwest::blocking::Response) -> Result<reqwest::blocking::Response> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            return Err(anyhow!("Request failed with status {}: {}", status, body));
        }
        Ok(response)
    }

    fn owner_path(owner: &CommentOwner) -> String {
        match owner {
            CommentOwner::Job(id) => format!("/comments/job/{}", id),
            CommentOwner::News(id) => format!("/comments/news/{}", id),
        }
    }
}

impl JobsApi for HttpJobsApi {
    fn has_token(&self) -> bool {
        self.token.is_some()
    }

    fn fetch_jobs(&self, params: &[(String, String)]) -> Result<JobPage> {
        let response = self
            .authed(self.client.get(self.url("/jobs")).query(params))
            .send()
            .context("Failed to fetch jobs")?;
        Self::check(response)?
            .json()
            .context("Failed to parse jobs response")
    }

    fn fetch_job(&self, id: &str) -> Result<JobListing> {
        let response = self
            .authed(self.client.get(self.url(&format!("/jobs/{}", id))))
            .send()
            .with_context(|| format!("Failed to fetch job {}", id))?;
        Self::check(response)?
            .json()
            .context("Failed to parse job response")
    }

    fn add_reaction(&self, job_id: &str, reaction: Reaction) -> Result<()> {
        let body = ReactionBody {
            job_id,
            kind: reaction.as_str(),
        };
        let response = self
            .authed(self.client.post(self.url("/likes")).json(&body))
            .send()
            .context("Failed to send reaction")?;
        Self::check(response)?;
        Ok(())
    }

    fn remove_reaction(&self, job_id: &str, reaction: Reaction) -> Result<()> {
        let response = self
            .authed(
                self.client
                    .delete(self.url("/likes"))
                    .query(&[("jobId", job_id), ("type", reaction.as_str())]),
            )
            .send()
            .context("Failed to remove reaction")?;
        Self::check(response)?;
        Ok(())
    }

    fn add_favorite(&self, job_id: &str) -> Result<()> {
        let response = self
            .authed(
                self.client
                    .post(self.url("/favorites"))
                    .json(&FavoriteBody { job_id }),
            )
            .send()
            .context("Failed to add favorite")?;
        Self::check(response)?;
        Ok(())
    }

    fn remove_favorite(&self, job_id: &str) -> Result<()> {
        let response = self
            .authed(
                self.client
                    .delete(self.url("/favorites"))
                    .query(&[("jobId", job_id)]),
            )
            .send()
            .context("Failed to remove favorite")?;
        Self::check(response)?;
        Ok(())
    }

    fn fetch_comments(&self, owner: &CommentOwner) -> Result<Vec<Comment>> {
        let response = self
            .authed(self.client.get(self.url(&Self::owner_path(owner))))
            .send()
            .context("Failed to fetch comments")?;
        Self::check(response)?
            .json()
            .context("Failed to parse comments response")
    }

    fn create_comment(
        &self,
        owner: &CommentOwner,
        text: &str,
        reply_to: Option<&str>,
    ) -> Result<Comment> {
        let body = CommentBody {
            job_id: owner.id(),
            text,
            parent_id: reply_to,
        };
        let response = self
            .authed(self.client.post(self.url("/comments")).json(&body))
            .send()
            .context("Failed to post comment")?;
        Self::check(response)?
            .json()
            .context("Failed to parse created comment")
    }

    fn update_comment(&self, comment_id: &str, text: &str) -> Result<()> {
        let response = self
            .authed(
                self.client
                    .put(self.url(&format!("/comments/{}", comment_id)))
                    .json(&CommentUpdateBody { text }),
            )
            .send()
            .context("Failed to update comment")?;
        Self::check(response)?;
        Ok(())
    }

    fn delete_comment(&self, comment_id: &str) -> Result<()> {
        let response = self
            .authed(
                self.client
                    .delete(self.url(&format!("/comments/{}", comment_id))),
            )
            .send()
            .context("Failed to delete comment")?;
        Self::check(response)?;
        Ok(())
    }

    fn skill_stats(&self) -> Result<Vec<SkillCount>> {
        let response = self
            .client
            .get(self.url("/jobs/stats/skills"))
            .send()
            .context("Failed to fetch skill stats")?;
        Self::check(response)?
            .json()
            .context("Failed to parse skill stats")
    }

    fn track(&self, job_id: &str, kind: TrackKind, fingerprint: &str) -> Result<()> {
        let body = TrackBody {
            kind: kind.as_str(),
            fingerprint,
        };
        let response = self
            .client
            .post(self.url(&format!("/jobs/{}/track", job_id)))
            .json(&body)
            .send()
            .context("Failed to track event")?;
        Self::check(response)?;
        Ok(())
    }

    fn match_score(&self, job_id: &str) -> Result<MatchScore> {
        let response = self
            .authed(self.client.get(self.url(&format!("/jobs/{}/match", job_id))))
            .send()
            .context("Failed to fetch match score")?;
        Self::check(response)?
            .json()
            .context("Failed to parse match score")
    }

    fn match_batch(&self, job_ids: &[String]) -> Result<Vec<JobMatch>> {
        let response = self
            .authed(
                self.client
                    .post(self.url("/jobs/match/batch"))
                    .json(&MatchBatchBody { job_ids }),
            )
            .send()
            .context("Failed to fetch batch match scores")?;
        let parsed: MatchBatchResponse = Self::check(response)?
            .json()
            .context("Failed to parse batch match scores")?;
        Ok(parsed.scores)
    }
}
