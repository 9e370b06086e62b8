//! Analysis run domain model
//!
//! A run is one submission of model inputs (AERSCREEN, AERSURFACE or AERMOD)
//! to the analysis API. The API executes it asynchronously; clients poll the
//! run until its status is terminal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An analysis run as reported by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunInfo {
    /// Unique identifier for the run
    pub id: Uuid,

    /// Model that processes the run
    pub module: ModelModule,

    /// Current status
    pub status: RunStatus,

    /// Optional human-readable label given at submission
    #[serde(default)]
    pub name: Option<String>,

    /// When the run was submitted
    pub submitted_at: DateTime<Utc>,

    /// When the backend picked the run up
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,

    /// When the run reached a terminal status
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,

    /// Completion percentage reported by the backend
    #[serde(default)]
    pub progress: Option<u8>,

    /// Status detail, usually the failure reason
    #[serde(default)]
    pub message: Option<String>,

    /// Result artifacts, available once the run has finished
    #[serde(default)]
    pub outputs: Vec<RunOutput>,
}

impl RunInfo {
    /// Whether the run will not change any more
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Wall-clock time between start and finish
    pub fn duration(&self) -> Option<chrono::Duration> {
        match (self.started_at, self.finished_at) {
            (Some(started), Some(finished)) => Some(finished.signed_duration_since(started)),
            _ => None,
        }
    }
}

/// Status of an analysis run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    /// Accepted, waiting for the backend
    Pending,

    /// Being processed
    Running,

    /// Completed successfully
    Finished,

    /// Completed with an error
    Fail,
}

impl RunStatus {
    /// `Finished` and `Fail` are final
    pub fn is_terminal(self) -> bool {
        matches!(self, RunStatus::Finished | RunStatus::Fail)
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Pending => write!(f, "PENDING"),
            RunStatus::Running => write!(f, "RUNNING"),
            RunStatus::Finished => write!(f, "FINISHED"),
            RunStatus::Fail => write!(f, "FAIL"),
        }
    }
}

/// The environmental model a run targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelModule {
    /// Screening-level dispersion model
    Aerscreen,

    /// Surface characteristics processor
    Aersurface,

    /// Refined dispersion model
    Aermod,
}

impl ModelModule {
    /// Path segment used by the analysis API
    pub fn api_segment(self) -> &'static str {
        match self {
            ModelModule::Aerscreen => "aerscreen",
            ModelModule::Aersurface => "aersurface",
            ModelModule::Aermod => "aermod",
        }
    }
}

impl std::fmt::Display for ModelModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelModule::Aerscreen => write!(f, "AERSCREEN"),
            ModelModule::Aersurface => write!(f, "AERSURFACE"),
            ModelModule::Aermod => write!(f, "AERMOD"),
        }
    }
}

impl std::str::FromStr for ModelModule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "aerscreen" => Ok(ModelModule::Aerscreen),
            "aersurface" => Ok(ModelModule::Aersurface),
            "aermod" => Ok(ModelModule::Aermod),
            other => Err(format!(
                "unknown module '{}' (expected aerscreen, aersurface or aermod)",
                other
            )),
        }
    }
}

/// A result artifact produced by a finished run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutput {
    /// Display name, also used as the download file name
    pub name: String,

    /// How the artifact is meant to be presented
    pub kind: OutputKind,

    /// Absolute or API-relative download location
    pub url: String,
}

/// Kind of result artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    Chart,
    Map,
    File,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_run(status: RunStatus) -> RunInfo {
        RunInfo {
            id: Uuid::new_v4(),
            module: ModelModule::Aerscreen,
            status,
            name: None,
            submitted_at: Utc::now(),
            started_at: None,
            finished_at: None,
            progress: None,
            message: None,
            outputs: Vec::new(),
        }
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!RunStatus::Pending.is_terminal());
        assert!(!RunStatus::Running.is_terminal());
        assert!(RunStatus::Finished.is_terminal());
        assert!(RunStatus::Fail.is_terminal());
        assert!(sample_run(RunStatus::Fail).is_terminal());
    }

    #[test]
    fn test_status_wire_format() {
        assert_eq!(
            serde_json::to_string(&RunStatus::Finished).unwrap(),
            "\"FINISHED\""
        );
        let status: RunStatus = serde_json::from_str("\"FAIL\"").unwrap();
        assert_eq!(status, RunStatus::Fail);
    }

    #[test]
    fn test_run_deserializes_with_missing_optionals() {
        let json = r#"{
            "id": "6f1c1a34-2d53-4c55-9a0c-8a5f4d9b1e21",
            "module": "aermod",
            "status": "RUNNING",
            "submitted_at": "2024-05-01T12:00:00Z"
        }"#;

        let run: RunInfo = serde_json::from_str(json).unwrap();
        assert_eq!(run.module, ModelModule::Aermod);
        assert_eq!(run.status, RunStatus::Running);
        assert!(run.outputs.is_empty());
        assert!(run.duration().is_none());
    }

    #[test]
    fn test_duration() {
        let mut run = sample_run(RunStatus::Finished);
        run.started_at = Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());
        run.finished_at = Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, 1, 30).unwrap());
        assert_eq!(run.duration().map(|d| d.num_seconds()), Some(90));
    }

    #[test]
    fn test_module_parsing() {
        assert_eq!("AERSCREEN".parse::<ModelModule>(), Ok(ModelModule::Aerscreen));
        assert_eq!("aersurface".parse::<ModelModule>(), Ok(ModelModule::Aersurface));
        assert!("calpuff".parse::<ModelModule>().is_err());
        assert_eq!(ModelModule::Aermod.api_segment(), "aermod");
    }
}
