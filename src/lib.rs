//! Construction cost estimation.
//!
//! The [`estimation`] module is the pure engine: rate resolution and the
//! fixed calculation pipeline. [`service`] wraps it in an authoritative HTTP
//! API and a client that falls back to the same engine locally.

pub mod cli;
pub mod config;
pub mod error;
pub mod estimation;
pub mod service;
