//! # Warm hand-off library
//!
//! This library implements a warm hand-off for a stateless request-serving
//! process running on a scale-to-zero platform: when the instance receives a
//! termination notice it resolves its own public URL and performs an
//! authenticated self call, so a warm replacement instance is already serving
//! when this one disappears.

pub mod cli;
pub mod config;
pub mod control_plane;
pub mod credentials;
pub mod event;
pub mod handoff;
pub mod http;
pub mod instrumentation;
pub mod metadata;
pub mod server;
pub mod utils;
