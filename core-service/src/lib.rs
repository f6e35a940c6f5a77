//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (HTTP, file store,
//! output handoff, lifecycle) into the download core. Desktop apps enable
//! the `desktop-shims` feature and call [`bootstrap_desktop`]; mobile hosts
//! inject their own adapters through `CoreConfig` and call
//! [`CoreService::bootstrap`].
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use core_download::orchestrator::DownloadConfig;
//! use core_service::bootstrap_desktop;
//!
//! let config = CoreConfig::builder()
//!     .downloads_dir(bridge_desktop::default_downloads_dir())
//!     .build()?;
//! let core = bootstrap_desktop(config, DownloadConfig::default())?;
//!
//! core.orchestrator().request_download(&song).await?;
//! ```

pub mod error;

pub use error::{CoreError, Result};

use std::sync::Arc;

use bridge_traits::lifecycle::{LifecycleObserver, LifecycleState};
use core_download::orchestrator::{DownloadConfig, DownloadOrchestrator};
use core_download::store::DownloadStore;
use core_runtime::config::CoreConfig;
use core_runtime::events::EventBus;
use provider_drive::DriveExportConnector;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct CoreService {
    orchestrator: Arc<DownloadOrchestrator>,
    events: EventBus,
}

impl std::fmt::Debug for CoreService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreService").finish_non_exhaustive()
    }
}

impl CoreService {
    /// Wire a service from explicit parts. Mainly for tests and hosts with
    /// bespoke providers.
    pub fn from_parts(orchestrator: DownloadOrchestrator, events: EventBus) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            events,
        }
    }

    /// Build the service from a validated configuration.
    ///
    /// Must run inside a tokio runtime: a lifecycle pump task is spawned
    /// when the configuration carries an observer.
    ///
    /// # Errors
    ///
    /// Fails fast with `CapabilityMissing` when a required bridge was
    /// neither provided nor injected by a shim feature.
    pub fn bootstrap(config: CoreConfig, download: DownloadConfig) -> Result<Self> {
        let http = config.require_http_client()?;
        let files = config.require_file_store()?;
        let handoff = config.require_handoff()?;

        let provider = Arc::new(DriveExportConnector::new(http, config.drive.clone()));
        let events = EventBus::default();
        let store = DownloadStore::new(files, config.downloads_dir.clone());
        let orchestrator =
            DownloadOrchestrator::new(provider, store, handoff, events.clone(), download);

        let service = Self::from_parts(orchestrator, events);
        if let Some(observer) = config.lifecycle_observer.clone() {
            service.attach_lifecycle(observer);
        }

        info!(downloads_dir = %config.downloads_dir.display(), "Core service ready");
        Ok(service)
    }

    /// The download orchestrator.
    pub fn orchestrator(&self) -> Arc<DownloadOrchestrator> {
        Arc::clone(&self.orchestrator)
    }

    /// The event bus host UIs subscribe to.
    pub fn events(&self) -> EventBus {
        self.events.clone()
    }

    /// Pump lifecycle transitions into the orchestrator: every foreground
    /// transition re-arms the handoff gate and clears stale entries.
    pub fn attach_lifecycle(&self, observer: Arc<dyn LifecycleObserver>) -> JoinHandle<()> {
        let orchestrator = Arc::clone(&self.orchestrator);
        tokio::spawn(async move {
            let mut stream = match observer.subscribe_changes().await {
                Ok(stream) => stream,
                Err(error) => {
                    warn!(error = %error, "Lifecycle subscription failed");
                    return;
                }
            };

            while let Some(state) = stream.next().await {
                if state == LifecycleState::Foreground {
                    orchestrator.on_app_foregrounded();
                }
            }
        })
    }
}

/// Bootstrap with desktop adapters filling any missing bridge.
#[cfg(feature = "desktop-shims")]
pub fn bootstrap_desktop(mut config: CoreConfig, download: DownloadConfig) -> Result<CoreService> {
    use bridge_desktop::{CommandHandoff, NativeFileStore, ReqwestHttpClient};
    use bridge_traits::handoff::GatedHandoff;

    if config.http_client.is_none() {
        config.http_client = Some(Arc::new(ReqwestHttpClient::new()));
    }
    if config.file_store.is_none() {
        config.file_store = Some(Arc::new(NativeFileStore::new()));
    }
    if config.handoff.is_none() {
        config.handoff = Some(Arc::new(GatedHandoff::new(CommandHandoff::new())));
    }

    CoreService::bootstrap(config, download)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use bridge_traits::export::{ExportProvider, ExportSnapshot, RemoteArchive};
    use bridge_traits::files::FileStore;
    use bridge_traits::handoff::{GatedHandoff, HandoffOutcome, OutputHandoff};
    use bridge_traits::lifecycle::LifecycleEvents;
    use bytes::Bytes;
    use std::path::Path;
    use std::time::Duration;
    use tokio::sync::{mpsc, Mutex};

    struct NoopProvider;

    #[async_trait]
    impl ExportProvider for NoopProvider {
        async fn resolve_display_name(&self, _folder_key: &str) -> BridgeResult<String> {
            Err(BridgeError::NotAvailable("test provider".into()))
        }
        async fn create_export(
            &self,
            _folder_key: &str,
            _archive_prefix: &str,
        ) -> BridgeResult<ExportSnapshot> {
            Err(BridgeError::NotAvailable("test provider".into()))
        }
        async fn poll_export(&self, _job_id: &str) -> BridgeResult<ExportSnapshot> {
            Err(BridgeError::NotAvailable("test provider".into()))
        }
        async fn fetch_archive(&self, _archive: &RemoteArchive) -> BridgeResult<Bytes> {
            Err(BridgeError::NotAvailable("test provider".into()))
        }
    }

    struct NoopFiles;

    #[async_trait]
    impl FileStore for NoopFiles {
        async fn create_dir_all(&self, _dir: &Path) -> BridgeResult<()> {
            Ok(())
        }
        async fn exists(&self, _path: &Path) -> BridgeResult<bool> {
            Ok(false)
        }
        async fn write(&self, _path: &Path, _contents: &Bytes) -> BridgeResult<()> {
            Ok(())
        }
        async fn read(&self, _path: &Path) -> BridgeResult<Bytes> {
            Ok(Bytes::new())
        }
    }

    struct NoopHandoff;

    #[async_trait]
    impl OutputHandoff for NoopHandoff {
        async fn deliver(&self, _archive: &Path, _title: &str) -> BridgeResult<HandoffOutcome> {
            Ok(HandoffOutcome::Delivered)
        }
        async fn share(&self, _archive: &Path, _title: &str) -> BridgeResult<()> {
            Ok(())
        }
    }

    struct ChannelLifecycle {
        rx: Mutex<Option<mpsc::UnboundedReceiver<LifecycleState>>>,
    }

    struct ChannelEvents {
        rx: mpsc::UnboundedReceiver<LifecycleState>,
    }

    #[async_trait]
    impl LifecycleEvents for ChannelEvents {
        async fn next(&mut self) -> Option<LifecycleState> {
            self.rx.recv().await
        }
    }

    #[async_trait]
    impl LifecycleObserver for ChannelLifecycle {
        async fn get_state(&self) -> BridgeResult<LifecycleState> {
            Ok(LifecycleState::Foreground)
        }

        async fn subscribe_changes(&self) -> BridgeResult<Box<dyn LifecycleEvents>> {
            let rx = self
                .rx
                .lock()
                .await
                .take()
                .ok_or_else(|| BridgeError::OperationFailed("already subscribed".into()))?;
            Ok(Box::new(ChannelEvents { rx }))
        }
    }

    fn service_with_gate() -> (CoreService, std::sync::Arc<bridge_traits::handoff::HandoffGate>) {
        let gated = GatedHandoff::new(NoopHandoff);
        let gate = gated.gate();
        let events = EventBus::new(16);
        let orchestrator = DownloadOrchestrator::new(
            Arc::new(NoopProvider),
            DownloadStore::new(Arc::new(NoopFiles), "/downloads"),
            Arc::new(gated),
            events.clone(),
            DownloadConfig::default(),
        );
        (CoreService::from_parts(orchestrator, events), gate)
    }

    #[test]
    fn test_bootstrap_without_bridges_fails_fast() {
        let config = CoreConfig::builder()
            .downloads_dir("/tmp/adx-downloads")
            .build()
            .unwrap();

        let err = CoreService::bootstrap(config, DownloadConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Runtime(core_runtime::error::Error::CapabilityMissing { .. })
        ));
    }

    #[tokio::test]
    async fn test_foreground_transition_releases_the_gate() {
        let (service, gate) = service_with_gate();
        let (tx, rx) = mpsc::unbounded_channel();
        let observer = Arc::new(ChannelLifecycle {
            rx: Mutex::new(Some(rx)),
        });

        let pump = service.attach_lifecycle(observer);

        assert!(gate.try_acquire());
        assert!(gate.is_active());

        tx.send(LifecycleState::Background).unwrap();
        tx.send(LifecycleState::Foreground).unwrap();

        // Give the pump a moment to drain the channel.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!gate.is_active());

        drop(tx);
        pump.await.unwrap();
    }
}
