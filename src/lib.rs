//! Live chat translation bridge.
//!
//! The embedded side ([`embedded::ContentSession`]) watches a chat region of a host page
//! it does not own, reports newly appended partner text and writes replies into the
//! page's input. The presenting side ([`panel::SidePanel`]) translates in both
//! directions. The two talk over a [`channel::Channel`].

pub mod bridge;
pub mod channel;
pub mod config;
pub mod domain;
pub mod embedded;
pub mod errors;
pub mod host;
pub mod panel;
pub mod utils;

#[cfg(test)]
mod tests;
