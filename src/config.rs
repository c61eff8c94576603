use anyhow::{Context, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::models::ViewerProfile;

const DEFAULT_BASE_URL: &str = "http://localhost:4000/api";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub base_url: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub profile: ViewerProfile,
    // Anonymous visitor id for view/apply tracking; generated once and
    // kept so the backend can dedupe repeat views.
    #[serde(default)]
    pub fingerprint: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: None,
            profile: ViewerProfile::default(),
            fingerprint: String::new(),
        }
    }
}

impl Config {
    pub fn default_path() -> PathBuf {
        if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "jobdeck") {
            proj_dirs.config_dir().join("config.json")
        } else {
            // Fallback to current directory
            PathBuf::from("jobdeck.json")
        }
    }

    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config at {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("Failed to parse config at {}", path.display()))?
        } else {
            Config::default()
        };

        // Env vars override the file, and a missing fingerprint is minted
        // on first use.
        if let Ok(url) = std::env::var("JOBDECK_API") {
            config.base_url = url;
        }
        if let Ok(token) = std::env::var("JOBDECK_TOKEN") {
            config.token = Some(token);
        }
        if config.fingerprint.is_empty() {
            config.fingerprint = new_fingerprint();
            let _ = config.save();
        }
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::default_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, raw)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        Ok(())
    }
}

fn new_fingerprint() -> String {
    let mut rng = rand::thread_rng();
    (0..16)
        .map(|_| format!("{:02x}", rng.r#gen::<u8>()))
        .collect()
}
