//! Host-independent building blocks shared by both halves of chat-bridge.
//!
//! Nothing in this crate touches a host tree, a transport or a clock source directly:
//! text diffing works on plain strings, timers are driven through the [`timing::Timers`]
//! trait and the language catalog is static data.

pub mod lang;
pub mod text;
pub mod timing;
