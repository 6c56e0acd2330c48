pub mod debounce;
pub mod timers;

pub use debounce::Debouncer;
pub use timers::{TimerId, TimerQueue, Timers};
