//! Protocol versions spoken between the manager and sidecars
//!
//! A sidecar announces every version it supports in its descriptor; the
//! manager picks the newest one it also understands. There is no deeper
//! negotiation - a sidecar sharing no version with the manager is skipped.

/// First protocol revision.
pub const V1ALPHA1: &str = "v1alpha1";
/// Adds structured hook results.
pub const V1ALPHA2: &str = "v1alpha2";
/// Adds per-hook-point priorities.
pub const V1ALPHA3: &str = "v1alpha3";

/// Versions this manager understands, newest first. Selection order matters:
/// [`select`] returns the first entry the sidecar also offers.
pub const SUPPORTED: &[&str] = &[V1ALPHA3, V1ALPHA2, V1ALPHA1];

/// Pick the newest mutually supported version, or `None` if the sidecar
/// offers nothing this manager understands.
pub fn select(offered: &[String]) -> Option<&'static str> {
    SUPPORTED
        .iter()
        .find(|supported| offered.iter().any(|o| o == **supported))
        .copied()
}
