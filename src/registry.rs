// src/registry.rs

use super::config::Config;
use super::model::{NaiveBayesClassifier, TextClassifier};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Subject {
    Chemistry,
    Biology,
}

impl Subject {
    pub const ALL: [Subject; 2] = [Subject::Chemistry, Subject::Biology];

    pub fn as_str(&self) -> &'static str {
        match self {
            Subject::Chemistry => "chemistry",
            Subject::Biology => "biology",
        }
    }
}

impl std::fmt::Display for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A subject name outside the supported set; carries the name as given.
#[derive(Error, Debug, PartialEq, Eq)]
#[error("Unknown subject: {0}")]
pub struct UnknownSubject(pub String);

impl FromStr for Subject {
    type Err = UnknownSubject;

    // Exact match only: "Chemistry" is not a key.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Subject::ALL
            .into_iter()
            .find(|subject| subject.as_str() == s)
            .ok_or_else(|| UnknownSubject(s.to_string()))
    }
}

pub type ModelHandle = Arc<dyn TextClassifier>;

/// Subject → model mapping, built once before serving and never mutated.
#[derive(Clone, Default)]
pub struct ModelRegistry {
    chemistry: Option<ModelHandle>,
    biology: Option<ModelHandle>,
}

impl ModelRegistry {
    pub fn new(chemistry: Option<ModelHandle>, biology: Option<ModelHandle>) -> Self {
        Self { chemistry, biology }
    }

    /// Loads every subject's artifact independently. A failed load leaves
    /// that subject empty and does not affect the others.
    pub fn load(config: &Config) -> Self {
        Self::new(
            load_subject(Subject::Chemistry, config.model_path(Subject::Chemistry)),
            load_subject(Subject::Biology, config.model_path(Subject::Biology)),
        )
    }

    pub fn get(&self, subject: Subject) -> Option<&ModelHandle> {
        match subject {
            Subject::Chemistry => self.chemistry.as_ref(),
            Subject::Biology => self.biology.as_ref(),
        }
    }

    pub fn is_loaded(&self, subject: Subject) -> bool {
        self.get(subject).is_some()
    }
}

fn load_subject(subject: Subject, path: &Path) -> Option<ModelHandle> {
    match NaiveBayesClassifier::from_path(path) {
        Ok(model) => {
            tracing::info!(
                %subject,
                path = %path.display(),
                classes = model.classes().len(),
                "Model loaded"
            );
            Some(Arc::new(model))
        }
        Err(e) => {
            tracing::error!(%subject, path = %path.display(), error = %e, "Failed to load model");
            None
        }
    }
}
