//! Chitty-Chat client library.
//!
//! The core is the clocked receive loop: every delivered message advances the
//! client's own Lamport clock via the merge rule before it is rendered.

mod api;
mod error;
mod formatter;
mod receiver;
mod runner;
mod session;
mod ui;

pub use error::ClientError;
pub use runner::run_client;
