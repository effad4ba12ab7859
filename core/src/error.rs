//! Error types for probing KOUKKU sidecars

use thiserror::Error;

/// Error type for a single sidecar probe
///
/// Every variant is transient from the manager's point of view: the probe is
/// retried on the next poll iteration, and a sidecar that never produces a
/// valid descriptor before the deadline is simply absent from the registry.
/// None of these errors is surfaced to callers of `collect` individually.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SidecarError {
    /// Connection error
    ///
    /// The endpoint is not accepting connections yet, is not a socket, or
    /// the connect attempt timed out. Expected during sidecar startup races.
    #[error("connection error: {0}")]
    Connection(String),

    /// Describe failed
    ///
    /// The Info call returned an error status or exceeded the per-call
    /// timeout.
    #[error("describe failed: {0}")]
    Describe(String),

    /// No mutually supported protocol version
    ///
    /// The descriptor was well-formed but none of the offered version
    /// strings is recognized by this manager.
    #[error("sidecar '{sidecar}' offers no supported protocol version (offered: {offered:?})")]
    IncompatibleVersion {
        /// Display name from the descriptor
        sidecar: String,
        /// Version strings the sidecar offered
        offered: Vec<String>,
    },

    /// Malformed descriptor
    ///
    /// The descriptor failed validation, e.g. an empty sidecar name or an
    /// empty version list.
    #[error("malformed descriptor: {0}")]
    Malformed(String),
}
