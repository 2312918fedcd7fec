#![cfg_attr(not(test), deny(clippy::panic))]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

//! # Letter Rally Server
//!
//! Authoritative real-time backend for letter-round party word games.
//!
//! One participant hosts a room, others request to join, and the server
//! owns everything from admission through scoring: clients are never
//! trusted to advance state. Rooms live entirely in memory, with no
//! database and no cloud services.

/// Server configuration and environment variables
pub mod config;

/// Tagged failures and their HTTP mapping
pub mod error;

/// The per-room state machine: state, transitions, scoring, projection
pub mod game;

/// Structured logging configuration
pub mod logging;

/// Wire types: snapshots, push events, ids, validation
pub mod protocol;

/// Room actors, subscriber fan-out, and the registry
pub mod server;

/// HTTP control surface and WebSocket push surface
pub mod web;
