//! # habeats
//!
//! The Habeats gating service: an axum HTTP API and a clap CLI over
//! `habeats-core`, configured from TOML plus environment overrides.

pub mod api;
pub mod cli;
pub mod config;
