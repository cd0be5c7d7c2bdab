use serde::{Deserialize, Serialize};

/// Countdown state for the step currently on screen.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", tag = "status")]
pub enum TimerState {
    Idle,
    #[serde(rename_all = "camelCase")]
    Running {
        seconds_remaining: u32,
    },
    Finished,
}

impl Default for TimerState {
    fn default() -> Self {
        TimerState::Idle
    }
}

impl TimerState {
    pub fn seconds_remaining(&self) -> u32 {
        match self {
            TimerState::Running { seconds_remaining } => *seconds_remaining,
            TimerState::Idle | TimerState::Finished => 0,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, TimerState::Running { .. })
    }
}

/// How a single countdown run ended.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TimerOutcome {
    Completed,
    Cancelled,
}
