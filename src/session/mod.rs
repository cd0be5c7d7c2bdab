pub mod error;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::info;
use tokio::sync::watch;
use uuid::Uuid;

use crate::{
    catalog::{BrewStep, BrewingMethod},
    models::{SessionSnapshot, SessionStatus, StepOutcome, StepView},
    timer::{CountdownTimer, TimerHandle, TimerState},
};

pub use error::SessionError;

/// One guided walkthrough of a brewing method for a fixed cup count.
///
/// The step index is always within `0..step_count`. Moving to another step
/// cancels whatever countdown is running, so a stale timer never outlives its
/// step. Intended for use from a single context (one UI loop); the only
/// background activity is the countdown ticker.
pub struct BrewSession {
    id: Uuid,
    method: Arc<BrewingMethod>,
    steps: Vec<BrewStep>,
    cup_count: u32,
    step_index: watch::Sender<usize>,
    timer: CountdownTimer,
    status: SessionStatus,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl BrewSession {
    /// Fails for a method without steps or a cup count outside
    /// `1..=max_cups`. Timers spawn tokio tasks, so start them from inside a
    /// runtime.
    pub fn new(method: Arc<BrewingMethod>, cup_count: u32) -> Result<Self, SessionError> {
        if method.steps.is_empty() {
            return Err(SessionError::NoSteps(method.id.clone()));
        }
        if cup_count == 0 || cup_count > method.max_cups {
            return Err(SessionError::InvalidCupCount {
                method_id: method.id.clone(),
                cups: cup_count,
                max_cups: method.max_cups,
            });
        }

        let id = Uuid::new_v4();
        let steps = method.sorted_steps();
        let (step_index, _) = watch::channel(0);
        let label = format!("brew {}", &id.to_string()[..8]);

        info!(
            "Starting brew session {} for '{}' ({} cups, {} steps)",
            id,
            method.name,
            cup_count,
            steps.len()
        );

        Ok(Self {
            id,
            method,
            steps,
            cup_count,
            step_index,
            timer: CountdownTimer::new(label),
            status: SessionStatus::Brewing,
            started_at: Utc::now(),
            completed_at: None,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn method(&self) -> &BrewingMethod {
        &self.method
    }

    pub fn cup_count(&self) -> u32 {
        self.cup_count
    }

    pub fn steps(&self) -> &[BrewStep] {
        &self.steps
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn step_index(&self) -> usize {
        *self.step_index.borrow()
    }

    pub fn current_step(&self) -> &BrewStep {
        &self.steps[self.step_index()]
    }

    pub fn is_last_step(&self) -> bool {
        self.step_index() + 1 == self.steps.len()
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn timer_state(&self) -> TimerState {
        self.timer.state()
    }

    pub fn seconds_remaining(&self) -> u32 {
        self.timer.state().seconds_remaining()
    }

    pub fn subscribe_step(&self) -> watch::Receiver<usize> {
        self.step_index.subscribe()
    }

    pub fn subscribe_timer(&self) -> watch::Receiver<TimerState> {
        self.timer.subscribe()
    }

    pub fn advance_step(&mut self) {
        let last = self.steps.len() - 1;
        self.move_to((self.step_index() + 1).min(last));
    }

    pub fn retreat_step(&mut self) {
        self.move_to(self.step_index().saturating_sub(1));
    }

    /// A clamped move that lands on the current step is not navigation and
    /// leaves its countdown alone.
    fn move_to(&mut self, index: usize) {
        if index == self.step_index() {
            return;
        }
        self.timer.cancel();
        self.step_index.send_replace(index);
    }

    /// Starts a countdown, replacing any countdown already running.
    pub fn start_timer(&mut self, seconds: u32) -> TimerHandle {
        self.timer.start(seconds, None)
    }

    /// Like [`start_timer`](Self::start_timer), also running `on_complete`
    /// exactly once when the countdown reaches zero. It never runs after
    /// [`cancel_timer`](Self::cancel_timer) has returned. Keep it short: it
    /// runs on the ticker task.
    pub fn start_timer_with<F>(&mut self, seconds: u32, on_complete: F) -> TimerHandle
    where
        F: FnOnce() + Send + 'static,
    {
        self.timer.start(seconds, Some(Box::new(on_complete)))
    }

    /// Starts the current step's own countdown; `None` for untimed steps.
    pub fn start_step_timer<F>(&mut self, on_complete: F) -> Option<TimerHandle>
    where
        F: FnOnce() + Send + 'static,
    {
        let seconds = self.current_step().time_seconds;
        (seconds > 0).then(|| self.start_timer_with(seconds, on_complete))
    }

    pub fn cancel_timer(&mut self) {
        self.timer.cancel();
    }

    /// Finishes the session on the last step, otherwise advances.
    pub fn complete_or_advance(&mut self) -> StepOutcome {
        if !self.is_last_step() {
            self.advance_step();
            return StepOutcome::Advanced(self.step_index());
        }

        self.timer.cancel();
        if self.status != SessionStatus::Completed {
            self.status = SessionStatus::Completed;
            self.completed_at = Some(Utc::now());
            info!("Brew session {} completed '{}'", self.id, self.method.name);
        }
        StepOutcome::Finished
    }

    pub fn scaled_water_ml(&self, step: &BrewStep) -> Option<u32> {
        step.water_ml
            .map(|per_cup| per_cup.saturating_mul(self.cup_count))
    }

    /// How far the current step's countdown has progressed, from 0.0 to 1.0.
    pub fn timer_progress(&self) -> f32 {
        let total = self.current_step().time_seconds;
        if total == 0 {
            return 0.0;
        }
        match self.timer.state() {
            TimerState::Idle => 0.0,
            TimerState::Running { seconds_remaining } => {
                1.0 - seconds_remaining as f32 / total as f32
            }
            TimerState::Finished => 1.0,
        }
    }

    pub fn current_step_view(&self) -> StepView {
        let index = self.step_index();
        let step = &self.steps[index];
        let total = self.steps.len();
        let remaining = self.seconds_remaining();

        StepView {
            number: index + 1,
            total,
            title: step.title.clone(),
            description: step.description.clone(),
            water_ml: self.scaled_water_ml(step),
            image_url: step
                .image_url
                .clone()
                .or_else(|| self.method.image_url.clone()),
            time_seconds: step.time_seconds,
            display_seconds: if remaining > 0 {
                remaining
            } else {
                step.time_seconds
            },
            progress: (index + 1) as f32 / total as f32,
            is_last: index + 1 == total,
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id.to_string(),
            method_id: self.method.id.clone(),
            method_name: self.method.name.clone(),
            cup_count: self.cup_count,
            step_index: self.step_index(),
            step_count: self.steps.len(),
            timer: self.timer.state(),
            status: self.status,
            started_at: self.started_at,
            completed_at: self.completed_at,
        }
    }
}
