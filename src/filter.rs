use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::models::{Availability, GeoPoint, Seniority, ViewerProfile};

pub const DEFAULT_RADIUS_KM: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateRange {
    Today,
    Week,
    Month,
    ThreeMonths,
}

impl DateRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            DateRange::Today => "today",
            DateRange::Week => "week",
            DateRange::Month => "month",
            DateRange::ThreeMonths => "3months",
        }
    }
}

pub fn parse_date_range(s: &str) -> Result<DateRange> {
    match s {
        "today" => Ok(DateRange::Today),
        "week" => Ok(DateRange::Week),
        "month" => Ok(DateRange::Month),
        "3months" => Ok(DateRange::ThreeMonths),
        _ => Err(anyhow!(
            "Unknown date range '{}'. Available: today, week, month, 3months",
            s
        )),
    }
}

pub fn parse_seniority(s: &str) -> Result<Seniority> {
    match s {
        "junior" => Ok(Seniority::Junior),
        "mid" => Ok(Seniority::Mid),
        "senior" => Ok(Seniority::Senior),
        "unknown" => Ok(Seniority::Unknown),
        _ => Err(anyhow!(
            "Unknown seniority '{}'. Available: junior, mid, senior, unknown",
            s
        )),
    }
}

pub fn parse_availability(s: &str) -> Result<Availability> {
    match s {
        "full_time" | "full-time" => Ok(Availability::FullTime),
        "part_time" | "part-time" => Ok(Availability::PartTime),
        "hybrid" => Ok(Availability::Hybrid),
        "contract" => Ok(Availability::Contract),
        "freelance" => Ok(Availability::Freelance),
        _ => Err(anyhow!(
            "Unknown availability '{}'. Available: full_time, part_time, hybrid, contract, freelance",
            s
        )),
    }
}

/// Raw fields as they come off the search surface, before normalization.
#[derive(Debug, Clone, Default)]
pub struct SearchInput {
    pub query: Option<String>,
    pub skills: Vec<String>,
    pub seniority: Option<Seniority>,
    pub availability: Option<Availability>,
    /// Tri-state workplace toggle: "remote", "office" or "hybrid".
    pub workplace: Option<String>,
    pub date_range: Option<DateRange>,
    pub center: Option<GeoPoint>,
    pub radius_km: Option<f64>,
    pub languages: Vec<String>,
    pub loose_seniority: bool,
}

/// Normalized filter record. Immutable once composed: a new filter always
/// means a page-1 replace fetch, never an append.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobFilter {
    pub query: Option<String>,
    pub skills: Vec<String>,
    pub seniority: Option<Seniority>,
    pub availability: Option<Availability>,
    pub remote: Option<bool>,
    pub date_range: Option<DateRange>,
    pub center: Option<GeoPoint>,
    pub radius_km: Option<f64>,
    pub languages: Vec<String>,
    pub loose_seniority: bool,
}

/// Build the filter the backend query understands from the raw search
/// fields plus the viewer profile.
pub fn compose(input: &SearchInput, profile: &ViewerProfile) -> JobFilter {
    let mut filter = JobFilter {
        query: input.query.clone().filter(|q| !q.trim().is_empty()),
        skills: input.skills.clone(),
        seniority: input.seniority,
        availability: input.availability,
        remote: None,
        date_range: input.date_range,
        center: input.center,
        radius_km: input.radius_km,
        languages: input.languages.clone(),
        loose_seniority: input.loose_seniority,
    };

    // Workplace is a tri-state in the UI but not on the wire: "hybrid" is
    // an availability, not a remote flag.
    match input.workplace.as_deref() {
        Some("remote") => filter.remote = Some(true),
        Some("office") => filter.remote = Some(false),
        Some("hybrid") => filter.availability = Some(Availability::Hybrid),
        _ => {}
    }

    if filter.center.is_some() && filter.radius_km.is_none() {
        filter.radius_km = Some(DEFAULT_RADIUS_KM);
    }

    // Declared spoken languages are sticky: every search is language
    // filtered until the profile itself changes.
    if !profile.languages.is_empty() {
        filter.languages = profile.languages.clone();
    }

    filter
}

impl JobFilter {
    /// Query params for GET /jobs, without page/limit (the pagination
    /// controller appends those).
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if let Some(q) = &self.query {
            params.push(("q".to_string(), q.clone()));
        }
        if let Some(s) = self.seniority {
            params.push(("seniority".to_string(), s.as_str().to_string()));
        }
        if let Some(a) = self.availability {
            params.push(("employment_type".to_string(), a.as_str().to_string()));
        }
        if let Some(r) = self.date_range {
            params.push(("dateRange".to_string(), r.as_str().to_string()));
        }
        if let Some(remote) = self.remote {
            params.push(("remote".to_string(), remote.to_string()));
        }
        if !self.languages.is_empty() {
            params.push(("languages".to_string(), self.languages.join(",")));
        }
        if !self.skills.is_empty() {
            params.push(("skills".to_string(), self.skills.join(",")));
        }
        if let Some(center) = self.center {
            params.push(("lat".to_string(), center.lat.to_string()));
            params.push(("lng".to_string(), center.lng.to_string()));
            params.push((
                "radius_km".to_string(),
                self.radius_km.unwrap_or(DEFAULT_RADIUS_KM).to_string(),
            ));
        }
        if self.loose_seniority {
            params.push(("looseSeniority".to_string(), "true".to_string()));
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_remote_tristate_mapping() {
        let profile = ViewerProfile::default();

        let remote = compose(
            &SearchInput {
                workplace: Some("remote".to_string()),
                ..Default::default()
            },
            &profile,
        );
        assert_eq!(remote.remote, Some(true));
        assert_eq!(remote.availability, None);

        let office = compose(
            &SearchInput {
                workplace: Some("office".to_string()),
                ..Default::default()
            },
            &profile,
        );
        assert_eq!(office.remote, Some(false));

        let hybrid = compose(
            &SearchInput {
                workplace: Some("hybrid".to_string()),
                ..Default::default()
            },
            &profile,
        );
        assert_eq!(hybrid.remote, None);
        assert_eq!(hybrid.availability, Some(Availability::Hybrid));
    }

    #[test]
    fn test_default_radius_applied_when_center_given() {
        let filter = compose(
            &SearchInput {
                center: Some(GeoPoint {
                    lat: 52.52,
                    lng: 13.405,
                }),
                ..Default::default()
            },
            &ViewerProfile::default(),
        );
        assert_eq!(filter.radius_km, Some(DEFAULT_RADIUS_KM));

        let explicit = compose(
            &SearchInput {
                center: Some(GeoPoint {
                    lat: 52.52,
                    lng: 13.405,
                }),
                radius_km: Some(10.0),
                ..Default::default()
            },
            &ViewerProfile::default(),
        );
        assert_eq!(explicit.radius_km, Some(10.0));
    }

    #[test]
    fn test_profile_languages_are_sticky() {
        let profile = ViewerProfile {
            languages: vec!["de".to_string(), "en".to_string()],
            ..Default::default()
        };
        // Even an input that tries to set its own languages gets the
        // profile's set.
        let filter = compose(
            &SearchInput {
                languages: vec!["fr".to_string()],
                ..Default::default()
            },
            &profile,
        );
        assert_eq!(filter.languages, vec!["de", "en"]);
    }

    #[test]
    fn test_query_serialization() {
        let filter = JobFilter {
            query: Some("rust".to_string()),
            skills: vec!["Rust".to_string(), "Tokio".to_string()],
            seniority: Some(Seniority::Senior),
            availability: Some(Availability::FullTime),
            remote: Some(true),
            date_range: Some(DateRange::ThreeMonths),
            center: Some(GeoPoint {
                lat: 48.1,
                lng: 11.5,
            }),
            radius_km: None,
            languages: vec!["en".to_string()],
            loose_seniority: true,
        };
        let params = filter.to_query();
        assert_eq!(param(&params, "q"), Some("rust"));
        assert_eq!(param(&params, "skills"), Some("Rust,Tokio"));
        assert_eq!(param(&params, "seniority"), Some("senior"));
        assert_eq!(param(&params, "employment_type"), Some("full_time"));
        assert_eq!(param(&params, "dateRange"), Some("3months"));
        assert_eq!(param(&params, "remote"), Some("true"));
        assert_eq!(param(&params, "languages"), Some("en"));
        assert_eq!(param(&params, "radius_km"), Some("50"));
        assert_eq!(param(&params, "looseSeniority"), Some("true"));
    }

    #[test]
    fn test_blank_query_is_dropped() {
        let filter = compose(
            &SearchInput {
                query: Some("   ".to_string()),
                ..Default::default()
            },
            &ViewerProfile::default(),
        );
        assert_eq!(filter.query, None);
    }
}
