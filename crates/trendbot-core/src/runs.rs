//! Audit types for orchestrator runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Platform;

/// Terminal and in-flight states of one orchestrator invocation.
///
/// Runs never end failed: a source that fails outright downgrades the run to
/// [`ScrapeRunStatus::CompleteWithErrors`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrapeRunStatus {
    Running,
    Complete,
    CompleteWithErrors,
}

impl ScrapeRunStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ScrapeRunStatus::Running => "running",
            ScrapeRunStatus::Complete => "complete",
            ScrapeRunStatus::CompleteWithErrors => "complete_with_errors",
        }
    }
}

impl std::fmt::Display for ScrapeRunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceRunStatus {
    /// Every item scraped, normalized and persisted.
    Succeeded,
    /// Navigation finished but some items or writes failed.
    Partial,
    /// Navigation failed; any items are whatever was collected before it.
    Failed,
}

impl SourceRunStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SourceRunStatus::Succeeded => "succeeded",
            SourceRunStatus::Partial => "partial",
            SourceRunStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for SourceRunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audit record of one source's pass within an orchestrator run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRun {
    pub platform: Platform,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Records persisted.
    pub item_count: u32,
    /// Extraction, persistence and navigation failures combined.
    pub error_count: u32,
    pub status: SourceRunStatus,
    pub error_message: Option<String>,
}

impl SourceRun {
    #[must_use]
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}
