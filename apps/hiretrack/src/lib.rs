//! # hiretrack - THE BINARY (library half)
//!
//! HTTP API, CLI and configuration for the hiretrack interview tracker.
//! Exposed as a library so integration tests can build the router
//! without binding a socket.

pub mod api;
pub mod cli;
pub mod config;
