//! Classification service types shared by every backend

use serde::{Deserialize, Serialize};

use crate::models::Category;

/// Backend status for health endpoints and `ai-status`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub backend: String,
    pub model: String,
    pub host: String,
    pub healthy: bool,
}

/// What a raw service reply amounts to once cleaned up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceReply {
    /// One of the five real labels
    Label(Category),
    /// Nothing usable came back
    Empty,
    /// Text that is not an accepted label (lower-cased, trimmed)
    Invalid(String),
}
