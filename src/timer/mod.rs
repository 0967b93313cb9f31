pub mod clock;
pub mod controller;
pub mod state;

pub use clock::{Clock, ManualClock, SystemClock};
pub use controller::{TimerController, TimerSnapshot};
pub use state::{TimerState, TimerStatus};
