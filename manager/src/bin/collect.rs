//! koukku-collect - run one discovery cycle and print the registry
//!
//! Debug tool for inspecting a socket directory by hand:
//!
//! ```text
//! KOUKKU_SOCKET_DIR=/var/run/koukku-hooks \
//! KOUKKU_EXPECTED_SIDECARS=2 \
//! koukku-collect
//! ```

use koukku_manager::{Config, LogFormat, Manager};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.log_level.clone().into());
    let registry = tracing_subscriber::registry().with(filter);

    match config.log_format {
        LogFormat::Json => {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        LogFormat::Pretty => {
            registry.with(tracing_subscriber::fmt::layer()).init();
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_tracing(&config);

    info!(
        dir = %config.socket_dir.display(),
        expected = config.expected_sidecars,
        "Starting KOUKKU discovery"
    );

    let mut manager = Manager::from_config(&config);
    manager
        .collect(config.expected_sidecars, config.collect_timeout)
        .await?;

    let registry = manager.registry();
    let mut hook_points: Vec<&str> = registry.hook_points().collect();
    hook_points.sort_unstable();

    for hook_point in hook_points {
        for callback in registry.get(hook_point) {
            info!(
                hook_point,
                sidecar = %callback.handle.name,
                priority = callback.hook_point.priority,
                version = callback.handle.version,
                socket = %callback.handle.socket.display(),
                "Registered callback"
            );
        }
    }

    info!(callbacks = registry.len(), "Registry assembled");
    Ok(())
}
