//! koukku-core - Core types for KOUKKU hook sidecar discovery
//!
//! This crate provides the types shared between the KOUKKU manager and the
//! sidecar processes it discovers:
//!
//! - [`proto`] - the generated `koukku.info.v1` wire types: the `Info`
//!   self-description service, [`InfoParams`], [`InfoResult`] and
//!   [`HookPoint`]
//! - [`version`] - protocol version constants and compatibility selection
//! - [`hook_points`] - well-known hook point name constants
//! - [`SidecarError`] - error type for probing a single sidecar
//!
//! # Why this crate exists
//!
//! Sidecars implement the server side of the `Info` service and need the
//! proto types and version constants. Without `koukku-core` they would have
//! to depend on `koukku-manager`, pulling the whole discovery engine into
//! every sidecar build. Extracting the shared surface here keeps sidecars
//! thin:
//!
//! ```text
//! koukku-core ◄── koukku-manager
//!     ▲
//!     └────────── sidecars (announcer, user-provided hooks)
//! ```

#![deny(unsafe_code)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::panic)]
#![warn(missing_docs)]

mod error;
/// Well-known hook point name constants
pub mod hook_points;
/// Protocol version constants and compatibility selection
pub mod version;

// Proto types generated from koukku/info/v1/info.proto
pub mod proto {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]
    #![allow(clippy::panic)]
    #![allow(clippy::derive_partial_eq_without_eq)]
    #![allow(missing_docs)]

    include!("proto/koukku.info.v1.rs");
}

pub use error::SidecarError;
pub use proto::{HookPoint, InfoParams, InfoResult};

#[cfg(test)]
mod tests {
    use super::*;

    // ==========================================================================
    // SidecarError Tests
    // ==========================================================================

    #[test]
    fn test_sidecar_error_connection_display() {
        let err = SidecarError::Connection("connection refused".to_string());
        assert_eq!(err.to_string(), "connection error: connection refused");
    }

    #[test]
    fn test_sidecar_error_describe_display() {
        let err = SidecarError::Describe("info call timed out".to_string());
        assert_eq!(err.to_string(), "describe failed: info call timed out");
    }

    #[test]
    fn test_sidecar_error_incompatible_version_display() {
        let err = SidecarError::IncompatibleVersion {
            sidecar: "smbios".to_string(),
            offered: vec!["v0alpha9".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "sidecar 'smbios' offers no supported protocol version (offered: [\"v0alpha9\"])"
        );
    }

    #[test]
    fn test_sidecar_error_malformed_display() {
        let err = SidecarError::Malformed("empty sidecar name".to_string());
        assert_eq!(err.to_string(), "malformed descriptor: empty sidecar name");
    }

    #[test]
    fn test_sidecar_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SidecarError>();
    }

    // ==========================================================================
    // Proto Type Tests
    // ==========================================================================

    #[test]
    fn test_info_result_default() {
        let result = InfoResult::default();
        assert!(result.name.is_empty());
        assert!(result.versions.is_empty());
        assert!(result.hook_points.is_empty());
    }

    #[test]
    fn test_hook_point_fields() {
        let hook_point = HookPoint {
            name: hook_points::ON_DEFINE_DOMAIN.to_string(),
            priority: 3,
        };
        assert_eq!(hook_point.name, "OnDefineDomain");
        assert_eq!(hook_point.priority, 3);
    }

    #[test]
    fn test_info_result_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<InfoResult>();
    }
}
