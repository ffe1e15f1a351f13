// src/model.rs

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use thiserror::Error;

/// Tokens of two or more word characters.
const DEFAULT_TOKEN_PATTERN: &str = r"(?u)\b\w\w+\b";

/// A class label as stored in a model artifact.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum Label {
    Text(String),
    Integer(i64),
    Float(f64),
}

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read model artifact: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to decode model artifact: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid token pattern: {0}")]
    Pattern(#[from] regex::Error),
}

#[derive(Error, Debug, PartialEq)]
pub enum PredictError {
    #[error("Model returned no output")]
    EmptyOutput,

    #[error("Model tables are inconsistent: {0}")]
    Shape(String),

    #[error("Probability {0} is outside [0, 1]")]
    InvalidProbability(f64),
}

/// An opaque, externally trained text classifier.
///
/// Both operations take a batch of texts and return one entry per text, in order.
pub trait TextClassifier: Send + Sync {
    fn predict(&self, texts: &[&str]) -> Result<Vec<Label>, PredictError>;

    /// Per-class probabilities, ordered like the model's classes.
    fn predict_proba(&self, texts: &[&str]) -> Result<Vec<Vec<f64>>, PredictError>;
}

/* ---------- On-disk artifact ---------- */

#[derive(Deserialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Artifact {
    MultinomialNb(NaiveBayesArtifact),
}

#[derive(Deserialize, Debug)]
struct NaiveBayesArtifact {
    #[serde(default = "default_lowercase")]
    lowercase: bool,
    #[serde(default = "default_token_pattern")]
    token_pattern: String,
    vocabulary: HashMap<String, usize>,
    #[serde(default)]
    idf: Option<Vec<f64>>,
    classes: Vec<Label>,
    class_log_prior: Vec<f64>,
    feature_log_prob: Vec<Vec<f64>>,
}

fn default_lowercase() -> bool {
    true
}

fn default_token_pattern() -> String {
    DEFAULT_TOKEN_PATTERN.to_string()
}

/// Bag-of-words multinomial naive Bayes, optionally over tf-idf weights.
///
/// Loading only decodes the artifact; the tables are checked against each
/// other when a prediction is made.
#[derive(Debug)]
pub struct NaiveBayesClassifier {
    lowercase: bool,
    token_pattern: Regex,
    vocabulary: HashMap<String, usize>,
    idf: Option<Vec<f64>>,
    classes: Vec<Label>,
    class_log_prior: Vec<f64>,
    feature_log_prob: Vec<Vec<f64>>,
}

impl NaiveBayesClassifier {
    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, LoadError> {
        let Artifact::MultinomialNb(artifact) = serde_json::from_reader(reader)?;
        Ok(Self {
            lowercase: artifact.lowercase,
            token_pattern: Regex::new(&artifact.token_pattern)?,
            vocabulary: artifact.vocabulary,
            idf: artifact.idf,
            classes: artifact.classes,
            class_log_prior: artifact.class_log_prior,
            feature_log_prob: artifact.feature_log_prob,
        })
    }

    pub fn classes(&self) -> &[Label] {
        &self.classes
    }

    /// Sparse term weights keyed by feature index.
    fn term_weights(&self, text: &str) -> Result<BTreeMap<usize, f64>, PredictError> {
        let text = if self.lowercase {
            text.to_lowercase()
        } else {
            text.to_owned()
        };

        let mut weights = BTreeMap::new();
        for token in self.token_pattern.find_iter(&text) {
            if let Some(&index) = self.vocabulary.get(token.as_str()) {
                *weights.entry(index).or_insert(0.0) += 1.0;
            }
        }

        if let Some(idf) = &self.idf {
            for (index, weight) in weights.iter_mut() {
                let factor = idf.get(*index).ok_or_else(|| {
                    PredictError::Shape(format!("idf has no entry for feature {index}"))
                })?;
                *weight *= factor;
            }
            let norm = weights.values().map(|w| w * w).sum::<f64>().sqrt();
            if norm > 0.0 {
                for weight in weights.values_mut() {
                    *weight /= norm;
                }
            }
        }

        Ok(weights)
    }

    fn joint_log_likelihood(&self, text: &str) -> Result<Vec<f64>, PredictError> {
        let n_classes = self.classes.len();
        if n_classes == 0 {
            return Err(PredictError::Shape("artifact declares no classes".to_string()));
        }
        if self.class_log_prior.len() != n_classes || self.feature_log_prob.len() != n_classes {
            return Err(PredictError::Shape(format!(
                "{n_classes} classes, {} priors, {} feature rows",
                self.class_log_prior.len(),
                self.feature_log_prob.len()
            )));
        }

        let weights = self.term_weights(text)?;
        self.class_log_prior
            .iter()
            .zip(&self.feature_log_prob)
            .map(|(prior, row)| {
                weights.iter().try_fold(*prior, |acc, (&index, weight)| {
                    row.get(index).map(|log_prob| acc + weight * log_prob).ok_or_else(|| {
                        PredictError::Shape(format!(
                            "feature {index} is out of range for a row of {} features",
                            row.len()
                        ))
                    })
                })
            })
            .collect()
    }
}

/// Index of the largest value; the first one wins ties.
fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, value) in values.iter().enumerate().skip(1) {
        if *value > values[best] {
            best = i;
        }
    }
    best
}

fn softmax(jll: &[f64]) -> Vec<f64> {
    let max = jll.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let sum: f64 = jll.iter().map(|v| (v - max).exp()).sum();
    let log_norm = max + sum.ln();
    jll.iter().map(|v| (v - log_norm).exp()).collect()
}

impl TextClassifier for NaiveBayesClassifier {
    fn predict(&self, texts: &[&str]) -> Result<Vec<Label>, PredictError> {
        texts
            .iter()
            .map(|text| {
                let jll = self.joint_log_likelihood(text)?;
                Ok(self.classes[argmax(&jll)].clone())
            })
            .collect()
    }

    fn predict_proba(&self, texts: &[&str]) -> Result<Vec<Vec<f64>>, PredictError> {
        texts
            .iter()
            .map(|text| Ok(softmax(&self.joint_log_likelihood(text)?)))
            .collect()
    }
}
