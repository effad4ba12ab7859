//! KOUKKU - hook sidecar discovery for virtual machine domains
//!
//! Discovers externally-running sidecar processes that implement optional
//! domain-lifecycle hooks, asks each one which hook points it subscribes to
//! and at what priority, and assembles a deterministic, priority-ordered
//! callback registry for the hook invocation layer.
//!
//! # Architecture
//!
//! ```text
//! Scanner ──► Probe (fan-out, one task per socket) ──► CallbackRegistry
//!    ▲                                                      │
//!    └──────────── Manager::collect poll loop ◄─────────────┘
//! ```
//!
//! Sidecars start asynchronously relative to this process, so [`Manager`]
//! polls the socket directory until a caller-supplied number of distinct
//! sidecars has answered or an overall deadline elapses. Per-endpoint
//! failures are absorbed and retried; only the aggregate deadline miss is
//! surfaced.
//!
//! # Example
//!
//! ```ignore
//! use koukku_manager::Manager;
//! use std::time::Duration;
//!
//! let mut manager = Manager::new("/var/run/koukku-hooks");
//! manager.collect(2, Duration::from_secs(10)).await?;
//!
//! for callback in manager.callbacks(koukku_core::hook_points::ON_DEFINE_DOMAIN) {
//!     // highest priority first
//! }
//! ```

#![deny(unsafe_code)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::panic)]

pub mod config;
pub mod error;
pub mod manager;
pub mod probe;
pub mod registry;
pub mod scanner;

pub use config::{Config, LogFormat};
pub use error::{ManagerError, Result};
pub use manager::Manager;
pub use probe::{DiscoveredSidecar, GrpcProbe, Probe, SidecarHandle};
pub use registry::{Callback, CallbackRegistry};
