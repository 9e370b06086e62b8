//! Run DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::domain::run::{ModelModule, RunInfo, RunStatus};

/// Request to submit a new analysis run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitRun {
    pub module: ModelModule,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Model input parameters collected by the input wizard
    pub parameters: HashMap<String, serde_json::Value>,
}

/// Lightweight run summary for listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub id: Uuid,
    pub module: ModelModule,
    pub status: RunStatus,
    #[serde(default)]
    pub name: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

impl From<RunInfo> for RunSummary {
    fn from(run: RunInfo) -> Self {
        Self {
            id: run.id,
            module: run.module,
            status: run.status,
            name: run.name,
            submitted_at: run.submitted_at,
        }
    }
}
