// src/api.rs

use super::model::Label;
use super::registry::Subject;
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Debug)]
pub struct ChatRequest {
    pub message: Option<String>,
    /// Defaults to chemistry when absent or null.
    pub subject: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct ChatResponse {
    pub response: Label,
    pub confidence: f64,
    pub subject: Subject,
}

#[derive(Serialize, Debug)]
pub struct HealthResponse {
    pub status: &'static str,
    pub models: ModelStatus,
}

#[derive(Serialize, Debug)]
pub struct ModelStatus {
    pub chemistry: bool,
    pub biology: bool,
}
