use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::TimerState;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SessionStatus {
    Brewing,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub id: String,
    pub method_id: String,
    pub method_name: String,
    pub cup_count: u32,
    pub step_index: usize,
    pub step_count: usize,
    pub timer: TimerState,
    pub status: SessionStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Everything a front end needs to render the current step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StepView {
    /// 1-based position of the step.
    pub number: usize,
    pub total: usize,
    pub title: String,
    pub description: Option<String>,
    /// Per-cup water multiplied by the session's cup count.
    pub water_ml: Option<u32>,
    /// Step image, falling back to the method image.
    pub image_url: Option<String>,
    pub time_seconds: u32,
    /// Seconds left while the countdown runs, otherwise the full step time.
    pub display_seconds: u32,
    pub progress: f32,
    pub is_last: bool,
}

/// Result of [`crate::session::BrewSession::complete_or_advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Advanced(usize),
    Finished,
}
