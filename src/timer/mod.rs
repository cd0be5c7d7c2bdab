pub mod controller;
pub mod state;

pub use controller::{CompletionCallback, CountdownTimer, TimerHandle};
pub use state::{TimerOutcome, TimerState};
