//! Stopwatch core.
//!
//! - `stopwatch`: the idle/running/paused state machine and its listeners
//! - `engine`: async driver owning the periodic display refresh
//! - `clock`: injectable source of "now"
//! - `format`: `MM:SS.d` / `HH:MM:SS.d` rendering

pub mod clock;
pub mod engine;
pub mod format;
pub mod stopwatch;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::TimerEngine;
pub use format::format_time;
pub use stopwatch::{Stopwatch, TimerChange, TimerEvent, TimerListener};
