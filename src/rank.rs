use chrono::Utc;

use crate::models::{JobListing, Seniority, ViewerProfile};

const SKILL_POINTS: f64 = 50.0;
const SENIORITY_BONUS: f64 = 30.0;
const RECENCY_WINDOW_DAYS: i64 = 10;

// Names and ISO-ish codes are both admitted; everything else passes
// through lowercased so exact code matches still work.
const LANGUAGE_CODES: &[(&str, &str)] = &[
    ("english", "en"),
    ("german", "de"),
    ("french", "fr"),
    ("spanish", "es"),
    ("italian", "it"),
    ("portuguese", "pt"),
    ("dutch", "nl"),
    ("polish", "pl"),
    ("czech", "cs"),
    ("swedish", "sv"),
    ("danish", "da"),
    ("norwegian", "no"),
    ("finnish", "fi"),
    ("greek", "el"),
    ("russian", "ru"),
    ("ukrainian", "uk"),
    ("turkish", "tr"),
    ("arabic", "ar"),
    ("hebrew", "he"),
    ("hindi", "hi"),
    ("chinese", "zh"),
    ("japanese", "ja"),
    ("korean", "ko"),
];

fn canonical_language(s: &str) -> String {
    let lower = s.trim().to_lowercase();
    for (name, code) in LANGUAGE_CODES {
        if lower == *name || lower == *code {
            return (*code).to_string();
        }
    }
    lower
}

fn skill_matches(job_skill: &str, targets: &[String]) -> bool {
    let haystack = job_skill.to_lowercase();
    targets.iter().any(|t| haystack.contains(&t.to_lowercase()))
}

fn matched_target_count(job: &JobListing, targets: &[String]) -> usize {
    targets
        .iter()
        .filter(|target| {
            let needle = target.to_lowercase();
            job.skills.iter().any(|s| s.to_lowercase().contains(&needle))
        })
        .count()
}

/// Client-side fallback personalization over an already-fetched job set.
/// Filters by language, seniority and skills, then scores and sorts when
/// skills or a seniority preference were given. The semantics mirror the
/// backend's filters so the two presentation paths agree.
pub fn personalize(jobs: Vec<JobListing>, profile: &ViewerProfile) -> Vec<JobListing> {
    let mut language_targets: Vec<String> = profile
        .languages
        .iter()
        .map(|l| canonical_language(l))
        .collect();
    if let Some(fallback) = &profile.fallback_language {
        language_targets.push(canonical_language(fallback));
    }

    let mut kept: Vec<JobListing> = jobs
        .into_iter()
        .filter(|job| {
            // No language preference at all: everything passes. A job
            // that declares no language is never excluded either.
            if !language_targets.is_empty() {
                if let Some(lang) = &job.language {
                    if !language_targets.contains(&canonical_language(lang)) {
                        return false;
                    }
                }
            }
            // Unknown seniority is conservatively kept.
            if let Some(wanted) = profile.seniority {
                if job.seniority != wanted && job.seniority != Seniority::Unknown {
                    return false;
                }
            }
            if !profile.skills.is_empty()
                && !job.skills.iter().any(|s| skill_matches(s, &profile.skills))
            {
                return false;
            }
            true
        })
        .collect();

    // Nothing to rank on: keep the input order.
    if profile.skills.is_empty() && profile.seniority.is_none() {
        return kept;
    }

    let now = Utc::now();
    let mut scored: Vec<(JobListing, f64)> = kept
        .drain(..)
        .map(|job| {
            let mut score = 0.0;
            if !profile.skills.is_empty() {
                let matched = matched_target_count(&job, &profile.skills);
                score += SKILL_POINTS * matched as f64 / profile.skills.len() as f64;
            }
            if profile.seniority == Some(job.seniority) {
                score += SENIORITY_BONUS;
            }
            let days = (now - job.published_at).num_days().max(0);
            score += (RECENCY_WINDOW_DAYS - days).max(0) as f64;
            (job, score)
        })
        .collect();

    scored.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.0.published_at.cmp(&a.0.published_at))
    });
    scored.into_iter().map(|(job, _)| job).collect()
}
