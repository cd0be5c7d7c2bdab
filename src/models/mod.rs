pub mod session;

pub use session::{SessionSnapshot, SessionStatus, StepOutcome, StepView};
