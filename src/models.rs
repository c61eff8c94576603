use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Seniority {
    Junior,
    Mid,
    Senior,
    #[serde(other)]
    Unknown,
}

impl Seniority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Seniority::Junior => "junior",
            Seniority::Mid => "mid",
            Seniority::Senior => "senior",
            Seniority::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    FullTime,
    PartTime,
    Hybrid,
    Contract,
    Freelance,
    #[serde(other)]
    NotSpecified,
}

impl Availability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Availability::FullTime => "full_time",
            Availability::PartTime => "part_time",
            Availability::Hybrid => "hybrid",
            Availability::Contract => "contract",
            Availability::Freelance => "freelance",
            Availability::NotSpecified => "not_specified",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reaction {
    #[serde(rename = "LIKE")]
    Like,
    #[serde(rename = "DISLIKE")]
    Dislike,
}

impl Reaction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Reaction::Like => "LIKE",
            Reaction::Dislike => "DISLIKE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobListing {
    pub id: String,
    pub title: String,
    pub company: String,
    #[serde(default)]
    pub description: String,
    // Ordered as delivered by the source feed; duplicates are kept.
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default = "default_seniority")]
    pub seniority: Seniority,
    #[serde(default = "default_availability")]
    pub availability: Availability,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub geo: Option<GeoPoint>,
    #[serde(default)]
    pub remote: bool,
    #[serde(default)]
    pub salary: Option<String>,
    #[serde(default)]
    pub apply_url: String,
    // Declared language of the posting, if any ("de", "German", ...).
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub likes: u32,
    #[serde(default)]
    pub dislikes: u32,
    // Viewer-specific; only present when the request carried a token.
    #[serde(default)]
    pub user_reaction: Option<Reaction>,
    #[serde(default)]
    pub favorite: bool,
    #[serde(default)]
    pub comment_count: u32,
    pub published_at: DateTime<Utc>,
    #[serde(default)]
    pub company_logo: Option<String>,
    // Company aggregates, denormalized onto each listing at fetch time.
    #[serde(default)]
    pub company_likes: u32,
    #[serde(default)]
    pub company_dislikes: u32,
    #[serde(default)]
    pub company_score: f64,
    #[serde(default)]
    pub views: u32,
    #[serde(default)]
    pub clicks: u32,
}

fn default_seniority() -> Seniority {
    Seniority::Unknown
}

fn default_availability() -> Availability {
    Availability::NotSpecified
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub job_id: String,
    pub user_id: String,
    pub user_name: String,
    #[serde(default)]
    pub user_avatar: Option<String>,
    pub text: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub replies: Vec<Comment>,
}

/// Cache key for a comment thread: jobs and news articles both carry one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CommentOwner {
    Job(String),
    News(String),
}

impl CommentOwner {
    pub fn id(&self) -> &str {
        match self {
            CommentOwner::Job(id) | CommentOwner::News(id) => id,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageMeta {
    pub page: u32,
    pub total: u32,
    pub pages: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SkillCount {
    pub skill: String,
    pub count: u32,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct MatchScore {
    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    View,
    Apply,
}

impl TrackKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackKind::View => "VIEW",
            TrackKind::Apply => "APPLY",
        }
    }
}

/// Viewer preferences that feed the filter composer and the fallback
/// ranker. Mirrors the profile the backend keeps for logged-in users.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ViewerProfile {
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub seniority: Option<Seniority>,
    #[serde(default)]
    pub fallback_language: Option<String>,
}

#[cfg(test)]
pub fn sample_job(id: &str) -> JobListing {
    JobListing {
        id: id.to_string(),
        title: format!("Job {}", id),
        company: "Acme".to_string(),
        description: String::new(),
        skills: vec![],
        seniority: Seniority::Unknown,
        availability: Availability::NotSpecified,
        location: None,
        geo: None,
        remote: false,
        salary: None,
        apply_url: String::new(),
        language: None,
        likes: 0,
        dislikes: 0,
        user_reaction: None,
        favorite: false,
        comment_count: 0,
        published_at: Utc::now(),
        company_logo: None,
        company_likes: 0,
        company_dislikes: 0,
        company_score: 80.0,
        views: 0,
        clicks: 0,
    }
}
