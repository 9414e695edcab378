//! Shared library for the Chitty-Chat workspace.
//!
//! Holds everything the server and client packages both need: the Lamport
//! clock, the wire message types, logging setup, and wall-clock helpers for
//! connection metadata.

pub mod clock;
pub mod logger;
pub mod time;
pub mod wire;
