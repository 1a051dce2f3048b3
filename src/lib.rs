//! Client library for the Learning Roadmap Tracker service.
//!
//! [`client::ApiClient`] is the only component that talks to the network.
//! View controllers in [`views`] receive it through a
//! [`session::SessionContext`] and stay independent of how they are drawn;
//! [`render`] draws them for a terminal.

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
mod macros;
pub mod render;
pub mod session;
pub mod storage;
pub mod transport;
pub mod types;
pub mod views;

#[cfg(test)]
pub(crate) mod testing;
