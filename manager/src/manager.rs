//! Collection loop - polls the socket directory until enough sidecars answer
//!
//! Sidecar processes start asynchronously relative to the manager, so a
//! single scan is not enough: a socket may not exist yet, may exist with
//! nothing listening, or may belong to a sidecar still initialising its
//! gRPC server. The loop re-scans and re-probes failed endpoints until a
//! caller-supplied number of distinct sidecars has answered or the overall
//! deadline elapses. Successfully probed sockets are never probed again
//! within one collection cycle.

use crate::error::{ManagerError, Result};
use crate::probe::{DiscoveredSidecar, GrpcProbe, Probe};
use crate::registry::{Callback, CallbackRegistry};
use crate::{config::Config, scanner};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Default pause between directory scans
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Discovers hook sidecars and owns the resulting callback registry.
pub struct Manager {
    socket_dir: PathBuf,
    probe: Arc<dyn Probe>,
    poll_interval: Duration,
    registry: CallbackRegistry,
}

impl Manager {
    /// Manager probing over gRPC with default timeouts
    pub fn new(socket_dir: impl Into<PathBuf>) -> Self {
        Self::with_probe(socket_dir, Arc::new(GrpcProbe::new()))
    }

    /// Manager with an explicit probe implementation
    pub fn with_probe(socket_dir: impl Into<PathBuf>, probe: Arc<dyn Probe>) -> Self {
        Self {
            socket_dir: socket_dir.into(),
            probe,
            poll_interval: DEFAULT_POLL_INTERVAL,
            registry: CallbackRegistry::new(),
        }
    }

    /// Manager configured from the environment-derived [`Config`]
    pub fn from_config(config: &Config) -> Self {
        Self::with_probe(
            config.socket_dir.clone(),
            Arc::new(GrpcProbe::with_call_timeout(config.probe_timeout)),
        )
        .poll_interval(config.poll_interval)
    }

    /// Override the pause between directory scans
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Run one discovery cycle.
    ///
    /// Succeeds once `expected` distinct sidecars have been probed; extra
    /// responsive sidecars found along the way are kept. `expected == 0`
    /// succeeds immediately with an empty registry. On deadline miss the
    /// registry built so far stays inspectable, but it must not be treated
    /// as complete.
    pub async fn collect(&mut self, expected: usize, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        // Fresh cycle: stale callbacks from a previous collect would alias
        // sockets that may since have been reassigned.
        self.registry = CallbackRegistry::new();
        let mut probed: HashSet<PathBuf> = HashSet::new();

        info!(
            dir = %self.socket_dir.display(),
            expected,
            timeout_ms = timeout.as_millis() as u64,
            "Collecting hook sidecars"
        );

        loop {
            if probed.len() >= expected {
                info!(
                    found = probed.len(),
                    callbacks = self.registry.len(),
                    "Hook sidecar discovery complete"
                );
                return Ok(());
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                warn!(
                    found = probed.len(),
                    expected,
                    "Hook sidecar discovery timed out"
                );
                return Err(ManagerError::CollectTimeout {
                    found: probed.len(),
                    expected,
                });
            }

            let sockets = scanner::scan(&self.socket_dir)?;

            let mut pending = JoinSet::new();
            for socket in sockets {
                if probed.contains(&socket) {
                    continue;
                }
                let probe = Arc::clone(&self.probe);
                pending.spawn(async move {
                    let outcome = probe.probe(&socket).await;
                    (socket, outcome)
                });
            }

            // Drain every probe spawned this pass, bounded by the overall
            // deadline. Probes still pending at the deadline are abandoned;
            // their sockets stay unprobed and count as missing.
            while !pending.is_empty() {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    break;
                }
                match tokio::time::timeout(remaining, pending.join_next()).await {
                    Ok(Some(Ok((socket, Ok(sidecar))))) => {
                        info!(
                            sidecar = %sidecar.handle.name,
                            socket = %socket.display(),
                            version = sidecar.handle.version,
                            hook_points = sidecar.hook_points.len(),
                            "Discovered hook sidecar"
                        );
                        self.merge(sidecar);
                        probed.insert(socket);
                    }
                    Ok(Some(Ok((socket, Err(err))))) => {
                        debug!(
                            socket = %socket.display(),
                            error = %err,
                            "Sidecar probe failed, will retry"
                        );
                    }
                    Ok(Some(Err(join_err))) => {
                        warn!(error = %join_err, "Sidecar probe task failed");
                    }
                    Ok(None) => break,
                    Err(_) => break,
                }
            }
            pending.abort_all();

            if probed.len() >= expected {
                continue;
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            tokio::time::sleep(self.poll_interval.min(remaining)).await;
        }
    }

    /// Callbacks for a hook point, highest priority first
    pub fn callbacks(&self, hook_point: &str) -> &[Callback] {
        self.registry.get(hook_point)
    }

    /// The registry built by the last `collect` call
    pub fn registry(&self) -> &CallbackRegistry {
        &self.registry
    }

    fn merge(&mut self, sidecar: DiscoveredSidecar) {
        let DiscoveredSidecar {
            handle,
            hook_points,
        } = sidecar;
        for hook_point in hook_points {
            self.registry.insert(Callback {
                handle: handle.clone(),
                hook_point,
            });
        }
    }
}

// ==========================================================================
// Tests
// ==========================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use koukku_core::{hook_points, version, HookPoint, SidecarError};
    use std::collections::{HashMap, VecDeque};
    use std::path::Path;
    use std::sync::Mutex;
    use tonic::transport::Endpoint;

    #[derive(Clone)]
    enum Outcome {
        Announce(&'static str, Vec<(&'static str, i32)>),
        Fail(SidecarError),
        Hang,
    }

    /// Scripted probe: per-socket outcome queues, last entry repeats.
    struct MockProbe {
        outcomes: Mutex<HashMap<PathBuf, VecDeque<Outcome>>>,
    }

    impl MockProbe {
        fn new(scripts: Vec<(&Path, Vec<Outcome>)>) -> Arc<Self> {
            let outcomes = scripts
                .into_iter()
                .map(|(socket, queue)| (socket.to_path_buf(), queue.into_iter().collect()))
                .collect();
            Arc::new(Self {
                outcomes: Mutex::new(outcomes),
            })
        }

        fn next_outcome(&self, socket: &Path) -> Outcome {
            let mut outcomes = self.outcomes.lock().unwrap();
            let queue = outcomes
                .get_mut(socket)
                .unwrap_or_else(|| panic!("unscripted socket {}", socket.display()));
            if queue.len() > 1 {
                queue.pop_front().unwrap()
            } else {
                queue.front().cloned().unwrap()
            }
        }
    }

    #[async_trait]
    impl Probe for MockProbe {
        async fn probe(&self, socket: &Path) -> std::result::Result<DiscoveredSidecar, SidecarError> {
            match self.next_outcome(socket) {
                Outcome::Announce(name, hooks) => Ok(DiscoveredSidecar {
                    handle: crate::probe::SidecarHandle {
                        name: name.to_string(),
                        socket: socket.to_path_buf(),
                        version: version::V1ALPHA3,
                        channel: Endpoint::from_static("http://[::]:50051").connect_lazy(),
                    },
                    hook_points: hooks
                        .into_iter()
                        .map(|(name, priority)| HookPoint {
                            name: name.to_string(),
                            priority,
                        })
                        .collect(),
                }),
                Outcome::Fail(err) => Err(err),
                Outcome::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Err(SidecarError::Connection("unreachable".to_string()))
                }
            }
        }
    }

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, b"").unwrap();
        path
    }

    fn announce(name: &'static str, hooks: &[(&'static str, i32)]) -> Vec<Outcome> {
        vec![Outcome::Announce(name, hooks.to_vec())]
    }

    #[tokio::test]
    async fn test_collect_zero_expected_succeeds_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = Manager::with_probe(dir.path(), MockProbe::new(vec![]));

        manager.collect(0, Duration::from_secs(1)).await.unwrap();
        assert!(manager.registry().is_empty());
    }

    #[tokio::test]
    async fn test_collect_finds_all_and_orders_callbacks() {
        let dir = tempfile::tempdir().unwrap();
        let a = touch(dir.path(), "a.sock");
        let b = touch(dir.path(), "b.sock");
        let c = touch(dir.path(), "c.sock");

        let probe = MockProbe::new(vec![
            (&a, announce("low", &[(hook_points::ON_DEFINE_DOMAIN, 1)])),
            (&b, announce("high", &[(hook_points::ON_DEFINE_DOMAIN, 3)])),
            (&c, announce("mid", &[(hook_points::ON_DEFINE_DOMAIN, 2)])),
        ]);

        let mut manager = Manager::with_probe(dir.path(), probe);
        manager.collect(3, Duration::from_secs(5)).await.unwrap();

        let names: Vec<&str> = manager
            .callbacks(hook_points::ON_DEFINE_DOMAIN)
            .iter()
            .map(|cb| cb.handle.name.as_str())
            .collect();
        assert_eq!(names, ["high", "mid", "low"]);
    }

    #[tokio::test]
    async fn test_collect_keeps_extra_sidecars() {
        // expected is a minimum gate; every sidecar that answered in the
        // same pass lands in the registry.
        let dir = tempfile::tempdir().unwrap();
        let a = touch(dir.path(), "a.sock");
        let b = touch(dir.path(), "b.sock");
        let c = touch(dir.path(), "c.sock");

        let probe = MockProbe::new(vec![
            (&a, announce("a", &[(hook_points::ON_DEFINE_DOMAIN, 1)])),
            (&b, announce("b", &[(hook_points::ON_DEFINE_DOMAIN, 2)])),
            (&c, announce("c", &[(hook_points::PRE_CLOUD_INIT_ISO, 1)])),
        ]);

        let mut manager = Manager::with_probe(dir.path(), probe);
        manager.collect(2, Duration::from_secs(5)).await.unwrap();

        assert_eq!(manager.registry().len(), 3);
        assert_eq!(manager.callbacks(hook_points::ON_DEFINE_DOMAIN).len(), 2);
        assert_eq!(manager.callbacks(hook_points::PRE_CLOUD_INIT_ISO).len(), 1);
    }

    #[tokio::test]
    async fn test_collect_timeout_reports_counts_and_keeps_partial_registry() {
        let dir = tempfile::tempdir().unwrap();
        let good = touch(dir.path(), "good.sock");
        let dead = touch(dir.path(), "dead.sock");

        let probe = MockProbe::new(vec![
            (&good, announce("good", &[(hook_points::ON_DEFINE_DOMAIN, 1)])),
            (
                &dead,
                vec![Outcome::Fail(SidecarError::Connection(
                    "connection refused".to_string(),
                ))],
            ),
        ]);

        let mut manager =
            Manager::with_probe(dir.path(), probe).poll_interval(Duration::from_millis(10));

        let started = Instant::now();
        let err = manager
            .collect(2, Duration::from_millis(200))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ManagerError::CollectTimeout {
                found: 1,
                expected: 2
            }
        ));
        // Must not overshoot the deadline by more than scheduling noise
        assert!(started.elapsed() < Duration::from_secs(2));
        // Partial registry stays inspectable
        assert_eq!(manager.callbacks(hook_points::ON_DEFINE_DOMAIN).len(), 1);
    }

    #[tokio::test]
    async fn test_collect_retries_transient_failures() {
        let dir = tempfile::tempdir().unwrap();
        let flaky = touch(dir.path(), "flaky.sock");

        let probe = MockProbe::new(vec![(
            &flaky,
            vec![
                Outcome::Fail(SidecarError::Connection("not yet listening".to_string())),
                Outcome::Fail(SidecarError::Describe("server warming up".to_string())),
                Outcome::Announce("flaky", vec![(hook_points::ON_DEFINE_DOMAIN, 1)]),
            ],
        )]);

        let mut manager =
            Manager::with_probe(dir.path(), probe).poll_interval(Duration::from_millis(10));
        manager.collect(1, Duration::from_secs(5)).await.unwrap();

        assert_eq!(manager.callbacks(hook_points::ON_DEFINE_DOMAIN).len(), 1);
    }

    #[tokio::test]
    async fn test_collect_abandons_hung_probe_at_deadline() {
        let dir = tempfile::tempdir().unwrap();
        let stuck = touch(dir.path(), "stuck.sock");
        let probe = MockProbe::new(vec![(&stuck, vec![Outcome::Hang])]);

        let mut manager = Manager::with_probe(dir.path(), probe);
        let started = Instant::now();
        let err = manager
            .collect(1, Duration::from_millis(200))
            .await
            .unwrap_err();

        assert!(matches!(err, ManagerError::CollectTimeout { found: 0, .. }));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_collect_discovers_late_socket() {
        let dir = tempfile::tempdir().unwrap();
        let late = dir.path().join("late.sock");

        let probe = MockProbe::new(vec![(
            &late,
            announce("late", &[(hook_points::PRE_CLOUD_INIT_ISO, 2)]),
        )]);

        let socket_dir = dir.path().to_path_buf();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            std::fs::write(socket_dir.join("late.sock"), b"").unwrap();
        });

        let mut manager =
            Manager::with_probe(dir.path(), probe).poll_interval(Duration::from_millis(10));
        manager.collect(1, Duration::from_secs(5)).await.unwrap();

        assert_eq!(manager.callbacks(hook_points::PRE_CLOUD_INIT_ISO).len(), 1);
    }

    #[tokio::test]
    async fn test_collect_starts_from_a_fresh_registry() {
        let dir = tempfile::tempdir().unwrap();
        let a = touch(dir.path(), "a.sock");
        let probe = MockProbe::new(vec![(
            &a,
            announce("a", &[(hook_points::ON_DEFINE_DOMAIN, 1)]),
        )]);

        let mut manager = Manager::with_probe(dir.path(), probe);
        manager.collect(1, Duration::from_secs(5)).await.unwrap();
        assert_eq!(manager.registry().len(), 1);

        manager.collect(0, Duration::from_secs(1)).await.unwrap();
        assert!(manager.registry().is_empty());
    }

    #[tokio::test]
    async fn test_collect_missing_socket_dir_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone");
        let mut manager = Manager::with_probe(&missing, MockProbe::new(vec![]));

        let err = manager.collect(1, Duration::from_secs(1)).await.unwrap_err();
        assert!(matches!(err, ManagerError::SocketDir { .. }));
    }
}
