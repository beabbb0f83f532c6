//! Application layer for the server.
//!
//! # What is the "application" layer? (for beginners)
//!
//! In Clean Architecture the *application* layer sits between the domain
//! (pure state in `screenlink-core`) and the infrastructure (sockets, files,
//! the console).
//!
//! Code in this layer:
//!
//! - **Orchestrates** domain objects: look up the cursor cache, notify the
//!   bridge, build the message for the negotiated protocol revision.
//! - **Depends on abstractions** (`MessageStream`, `AutomationHooks`) rather
//!   than concrete implementations, so every use case is testable with
//!   recording doubles.
//!
//! # Sub-modules
//!
//! - **`context`** – The shared `ProxyContext`: stream handle, cursor cache
//!   and bridge registration, passed by `Arc` to everything below.
//! - **`bridge`** – The optional automation hook set and its set-once registry.
//! - **`poller`** – The per-proxy background thread that drives poll ticks.
//! - **`client_proxy`** – `VersionedClientProxy`, the production emitter.
//! - **`harness`** – Instrumentation entry points with dedupe semantics.

pub mod bridge;
pub mod client_proxy;
pub mod context;
pub mod harness;
pub mod poller;
