//! Announcer - a configurable KOUKKU hook sidecar
//!
//! Serves the `Info` service on a Unix socket, announcing whatever name,
//! versions and hook point subscriptions the environment asks for. Used for
//! black-box testing of the manager and for demoing discovery by hand:
//!
//! ```text
//! KOUKKU_ANNOUNCER_SOCKET=/var/run/koukku-hooks/smbios.sock \
//! KOUKKU_ANNOUNCER_NAME=smbios \
//! KOUKKU_ANNOUNCER_HOOK_POINTS=OnDefineDomain:3,PreCloudInitIso:1 \
//! koukku-announcer
//! ```
//!
//! The announcer implements no hook methods; it only describes itself.

use anyhow::Context;
use koukku_core::proto::info_server::{Info, InfoServer};
use koukku_core::{version, HookPoint, InfoParams, InfoResult};
use std::path::{Path, PathBuf};
use tokio::net::UnixListener;
use tokio_stream::wrappers::UnixListenerStream;
use tonic::transport::Server;
use tonic::{Request, Response, Status};
use tracing::info;

/// Info service answering with a fixed descriptor.
struct Announcer {
    descriptor: InfoResult,
}

#[tonic::async_trait]
impl Info for Announcer {
    async fn info(&self, _request: Request<InfoParams>) -> Result<Response<InfoResult>, Status> {
        info!(sidecar = %self.descriptor.name, "Answering Info probe");
        Ok(Response::new(self.descriptor.clone()))
    }
}

/// Parse `Name:priority` pairs from a comma-separated list.
fn parse_hook_points(raw: &str) -> anyhow::Result<Vec<HookPoint>> {
    let mut hook_points = Vec::new();
    for pair in raw.split(',').filter(|p| !p.trim().is_empty()) {
        let (name, priority) = pair
            .split_once(':')
            .with_context(|| format!("hook point '{pair}' is not in Name:priority form"))?;
        let priority: i32 = priority
            .trim()
            .parse()
            .with_context(|| format!("hook point '{pair}' has a non-numeric priority"))?;
        hook_points.push(HookPoint {
            name: name.trim().to_string(),
            priority,
        });
    }
    Ok(hook_points)
}

fn parse_versions(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
        .collect()
}

fn descriptor_from_env() -> anyhow::Result<InfoResult> {
    let name =
        std::env::var("KOUKKU_ANNOUNCER_NAME").unwrap_or_else(|_| "announcer".to_string());
    let versions = std::env::var("KOUKKU_ANNOUNCER_VERSIONS")
        .map(|raw| parse_versions(&raw))
        .unwrap_or_else(|_| version::SUPPORTED.iter().map(|v| v.to_string()).collect());
    let hook_points = std::env::var("KOUKKU_ANNOUNCER_HOOK_POINTS")
        .map(|raw| parse_hook_points(&raw))
        .unwrap_or_else(|_| Ok(vec![HookPoint {
            name: koukku_core::hook_points::ON_DEFINE_DOMAIN.to_string(),
            priority: 0,
        }]))?;

    Ok(InfoResult {
        name,
        versions,
        hook_points,
    })
}

/// Bind the socket, clearing a stale path left by a previous run.
fn bind(socket: &Path) -> anyhow::Result<UnixListener> {
    if socket.exists() {
        std::fs::remove_file(socket)
            .with_context(|| format!("failed to remove stale socket {}", socket.display()))?;
    }
    UnixListener::bind(socket)
        .with_context(|| format!("failed to bind {}", socket.display()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let socket = PathBuf::from(
        std::env::var("KOUKKU_ANNOUNCER_SOCKET")
            .unwrap_or_else(|_| "/var/run/koukku-hooks/announcer.sock".to_string()),
    );
    let descriptor = descriptor_from_env()?;

    info!(
        socket = %socket.display(),
        sidecar = %descriptor.name,
        hook_points = descriptor.hook_points.len(),
        "Announcer listening"
    );

    let listener = bind(&socket)?;
    Server::builder()
        .add_service(InfoServer::new(Announcer { descriptor }))
        .serve_with_incoming_shutdown(UnixListenerStream::new(listener), async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = ?e, "Failed to install Ctrl+C handler");
            }
            info!("Shutting down");
        })
        .await?;

    Ok(())
}
