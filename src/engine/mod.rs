pub mod candidates;
pub mod scheduler;

pub use candidates::{DisplaySplit, Suggestions, suggest};
pub use scheduler::{SchedulerState, Step, advance_to_next_trial, next_keyboard_order};
