//! The half of the bridge that lives inside the host page.

pub mod detection;
pub mod highlight;
pub mod injection;
pub mod session;
pub mod targeting;
pub mod watcher;

pub use detection::{DetectedRegions, HeuristicDetector, ManualOnly, RegionDetector};
pub use highlight::HighlightTracker;
pub use injection::InjectionWriter;
pub use session::ContentSession;
pub use targeting::{SelectionState, Target, TargetingSession};
pub use watcher::RegionWatcher;
