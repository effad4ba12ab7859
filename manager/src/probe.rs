//! Sidecar probe - asks one endpoint to describe itself
//!
//! A probe is one connect plus one `Info` call, both bounded by a per-call
//! timeout so a wedged endpoint costs at most two timeout windows and never
//! stalls the collection loop. The channel opened for the `Info` call is
//! kept and handed to the resulting callbacks; sidecars are not re-dialed
//! at hook invocation time.
//!
//! tonic only dials TCP natively, so the Unix transport is supplied through
//! a `tower::service_fn` connector wrapping `tokio::net::UnixStream`.

use async_trait::async_trait;
use hyper_util::rt::TokioIo;
use koukku_core::proto::info_client::InfoClient;
use koukku_core::{version, HookPoint, InfoParams, SidecarError};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::net::UnixStream;
use tonic::transport::{Channel, Endpoint, Uri};
use tracing::warn;

/// Default bound on the connect attempt and on the Info call, each
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(1);

/// Identity of a probed sidecar plus the open channel to invoke it on.
///
/// Shared by every callback the sidecar registered; cloning is cheap
/// (`Channel` is a handle, not a connection).
#[derive(Debug, Clone)]
pub struct SidecarHandle {
    /// Display name announced by the sidecar
    pub name: String,
    /// The socket the sidecar was reached at
    pub socket: PathBuf,
    /// Newest protocol version both sides support
    pub version: &'static str,
    /// Open channel from the successful probe
    pub channel: Channel,
}

/// A validated probe result: the sidecar's handle plus the hook points it
/// subscribed to. Hook points with empty names have already been dropped.
#[derive(Debug, Clone)]
pub struct DiscoveredSidecar {
    /// Handle shared by all of this sidecar's callbacks
    pub handle: SidecarHandle,
    /// Declared hook point subscriptions, in descriptor order
    pub hook_points: Vec<HookPoint>,
}

/// The probing seam of the collection loop.
///
/// The loop only needs "socket path in, validated descriptor or transient
/// error out", so tests drive it with scripted impls instead of real
/// endpoints.
#[async_trait]
pub trait Probe: Send + Sync {
    /// Probe a single endpoint. Every error is transient from the caller's
    /// view; the collection loop absorbs failures and retries the socket on
    /// a later pass.
    async fn probe(&self, socket: &Path) -> Result<DiscoveredSidecar, SidecarError>;
}

/// Production probe: gRPC `Info` over a Unix socket.
#[derive(Debug, Clone)]
pub struct GrpcProbe {
    call_timeout: Duration,
}

impl Default for GrpcProbe {
    fn default() -> Self {
        Self {
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }
}

impl GrpcProbe {
    /// Probe with the default per-call timeout
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the per-call timeout (applied separately to the connect and
    /// to the Info call)
    pub fn with_call_timeout(call_timeout: Duration) -> Self {
        Self { call_timeout }
    }

    async fn connect(&self, socket: &Path) -> Result<Channel, SidecarError> {
        let path = socket.to_path_buf();
        // The URI is required by the HTTP/2 layer but never resolved; the
        // connector below ignores it and dials the Unix socket instead.
        let endpoint = Endpoint::from_static("http://[::]:50051");
        let connecting = endpoint.connect_with_connector(tower::service_fn(move |_: Uri| {
            let path = path.clone();
            async move { Ok::<_, std::io::Error>(TokioIo::new(UnixStream::connect(path).await?)) }
        }));

        tokio::time::timeout(self.call_timeout, connecting)
            .await
            .map_err(|_| SidecarError::Connection("connect timed out".to_string()))?
            .map_err(|err| SidecarError::Connection(err.to_string()))
    }
}

#[async_trait]
impl Probe for GrpcProbe {
    async fn probe(&self, socket: &Path) -> Result<DiscoveredSidecar, SidecarError> {
        let channel = self.connect(socket).await?;

        let mut client = InfoClient::new(channel.clone());
        let descriptor = tokio::time::timeout(self.call_timeout, client.info(InfoParams {}))
            .await
            .map_err(|_| SidecarError::Describe("info call timed out".to_string()))?
            .map_err(|status| SidecarError::Describe(status.to_string()))?
            .into_inner();

        if descriptor.name.is_empty() {
            return Err(SidecarError::Malformed("empty sidecar name".to_string()));
        }
        if descriptor.versions.is_empty() {
            return Err(SidecarError::Malformed(format!(
                "sidecar '{}' announced no versions",
                descriptor.name
            )));
        }

        let version = version::select(&descriptor.versions).ok_or_else(|| {
            SidecarError::IncompatibleVersion {
                sidecar: descriptor.name.clone(),
                offered: descriptor.versions.clone(),
            }
        })?;

        // A nameless hook point is unroutable; keep the rest of the
        // descriptor usable instead of failing the whole sidecar.
        let mut hook_points = Vec::with_capacity(descriptor.hook_points.len());
        for hook_point in descriptor.hook_points {
            if hook_point.name.is_empty() {
                warn!(
                    sidecar = %descriptor.name,
                    priority = hook_point.priority,
                    "Dropping hook point with empty name"
                );
                continue;
            }
            hook_points.push(hook_point);
        }

        Ok(DiscoveredSidecar {
            handle: SidecarHandle {
                name: descriptor.name,
                socket: socket.to_path_buf(),
                version,
                channel,
            },
            hook_points,
        })
    }
}

// ==========================================================================
// Tests
// ==========================================================================
