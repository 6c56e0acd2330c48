pub mod history;
pub mod message;
pub mod outcome;
pub mod role;

pub use history::{HistoryEntry, SessionHistory};
pub use message::{ChannelMessage, Decoded, decode, encode};
pub use outcome::{ActionOutcome, Failure, SkipReason};
pub use role::ElementRole;
