//! Chitty-Chat server library.
//!
//! The core is the connection registry, the broadcast fan-out, and the
//! shared Lamport clock; the axum router around them is transport plumbing.

mod broadcast;
mod handler;
mod lifecycle;
mod registry;
mod runner;
mod signal;
mod state;

pub use runner::run_server;
