// src/config.rs

use super::registry::Subject;
use std::env;
use std::path::{Path, PathBuf};

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_MODEL_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/models");

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub chemistry_model_path: PathBuf,
    pub biology_model_path: PathBuf,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let model_dir = lookup("MODEL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_DIR));
        let model_path = |var: &str, subject: Subject| {
            lookup(var)
                .map(PathBuf::from)
                .unwrap_or_else(|| model_dir.join(format!("{subject}.json")))
        };

        Self {
            host: lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            chemistry_model_path: model_path("CHEMISTRY_MODEL_PATH", Subject::Chemistry),
            biology_model_path: model_path("BIOLOGY_MODEL_PATH", Subject::Biology),
        }
    }

    pub fn model_path(&self, subject: Subject) -> &Path {
        match subject {
            Subject::Chemistry => &self.chemistry_model_path,
            Subject::Biology => &self.biology_model_path,
        }
    }
}
