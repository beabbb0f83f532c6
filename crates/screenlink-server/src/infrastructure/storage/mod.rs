//! Storage infrastructure: configuration file loading.
//!
//! The `config` sub-module reads the TOML configuration from the
//! platform-appropriate directory, fills in defaults for anything missing,
//! and converts the on-disk settings into the runtime types the application
//! layer consumes (`PollerConfig`, `HarnessConfig`, `ProtocolVersion`).

pub mod config;
