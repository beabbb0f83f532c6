//! Infrastructure layer for the server.
//!
//! Contains the adapters that touch the outside world: the framed socket
//! writer, the concrete automation hooks, TOML storage, and the stdin
//! command console.  The `mock` sub-modules hold the recording doubles the
//! tests use in place of a real socket or consumer.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `screenlink_core`, but MUST NOT be imported by the `application` layer.

pub mod automation;
pub mod console;
pub mod storage;
pub mod stream;
