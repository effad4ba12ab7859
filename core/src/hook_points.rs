//! Well-known hook point names
//!
//! The registry accepts arbitrary hook point names; these constants exist so
//! the manager, sidecars and tests agree on spelling for the hook points the
//! domain lifecycle actually invokes.

/// Invoked after the domain XML is built but before it is defined, letting
/// sidecars patch the domain configuration.
pub const ON_DEFINE_DOMAIN: &str = "OnDefineDomain";

/// Invoked before the cloud-init ISO is generated, letting sidecars adjust
/// the cloud-init payload.
pub const PRE_CLOUD_INIT_ISO: &str = "PreCloudInitIso";
