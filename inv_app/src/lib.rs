//! # inv_app
//!
//! Venue configuration, logging setup and the binaries built on the invoker crates

pub mod cli;
pub mod config_loader;
pub mod tracing_setup;
pub mod venue;
