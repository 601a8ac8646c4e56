//! Command handlers for package registration and unregistration
//!
//! Register persists the identifier, constructs a tracking entity, hands it
//! to the host, and triggers an initial refresh off the command path.
//! Unregister persists the removal and asks the host to drop the entity by
//! its derived handle. Store mutations run under a mutex; the binary
//! additionally funnels all commands through a single worker task.

use crate::domain::parcel::TrackedParcel;
use crate::domain::types::TrackingId;
use crate::infra::metrics::Metrics;
use crate::io::carrier::CarrierClient;
use crate::io::registrations::RegistrationStore;
use crate::services::registry::EntityHost;
use parking_lot::Mutex;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// A command from the host's service-invocation surface.
///
/// Wire form: `register <PACKAGE_ID>` / `unregister <PACKAGE_ID>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackingCommand {
    Register { package_id: String },
    Unregister { package_id: String },
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CommandParseError {
    #[error("empty command")]
    Empty,

    #[error("unknown command verb: {0}")]
    UnknownVerb(String),

    #[error("expected exactly one package id")]
    BadArguments,
}

impl FromStr for TrackingCommand {
    type Err = CommandParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut tokens = s.split_whitespace();
        let verb = tokens.next().ok_or(CommandParseError::Empty)?;
        let package_id = tokens.next().ok_or(CommandParseError::BadArguments)?;
        if tokens.next().is_some() {
            return Err(CommandParseError::BadArguments);
        }

        match verb.to_ascii_lowercase().as_str() {
            "register" => Ok(TrackingCommand::Register { package_id: package_id.to_string() }),
            "unregister" => {
                Ok(TrackingCommand::Unregister { package_id: package_id.to_string() })
            }
            other => Err(CommandParseError::UnknownVerb(other.to_string())),
        }
    }
}

impl std::fmt::Display for TrackingCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackingCommand::Register { package_id } => write!(f, "register {}", package_id),
            TrackingCommand::Unregister { package_id } => write!(f, "unregister {}", package_id),
        }
    }
}

/// Executes register/unregister commands against the store and the host
pub struct CommandHandler {
    /// Store mutations are a critical section; read-modify-persist runs
    /// under this lock
    store: Mutex<RegistrationStore>,
    host: Arc<dyn EntityHost>,
    client: Arc<CarrierClient>,
    metrics: Arc<Metrics>,
}

impl CommandHandler {
    pub fn new(
        store: RegistrationStore,
        host: Arc<dyn EntityHost>,
        client: Arc<CarrierClient>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self { store: Mutex::new(store), host, client, metrics }
    }

    /// Construct one entity per stored identifier and hand the batch to the
    /// host. Called once at startup; the poll engine's first tick performs
    /// the initial refresh.
    pub async fn restore_registered(&self) -> usize {
        let parcels: Vec<Arc<TrackedParcel>> = {
            let store = self.store.lock();
            store.ids().iter().cloned().map(|id| Arc::new(TrackedParcel::new(id))).collect()
        };

        let count = parcels.len();
        if count > 0 {
            self.host.add_parcels(parcels).await;
        }
        info!(count = count, "registered_packages_restored");
        count
    }

    pub async fn handle(&self, command: TrackingCommand) {
        self.metrics.record_command();
        match command {
            TrackingCommand::Register { package_id } => self.register(&package_id).await,
            TrackingCommand::Unregister { package_id } => self.unregister(&package_id).await,
        }
    }

    async fn register(&self, raw: &str) {
        let id = TrackingId::new(raw);
        {
            let mut store = self.store.lock();
            if let Err(e) = store.register(id.clone()) {
                warn!(package_id = %id, error = %e, "register_ignored");
                return;
            }
        }

        let parcel = Arc::new(TrackedParcel::new(id.clone()));
        self.host.add_parcels(vec![parcel.clone()]).await;
        info!(package_id = %id, handle = %parcel.handle(), "package_registered");

        // Initial refresh off the command path; retries stay on the poll cadence
        let client = self.client.clone();
        let metrics = self.metrics.clone();
        tokio::spawn(async move {
            let outcome = parcel.refresh(&client).await;
            metrics.record_refresh(outcome);
        });
    }

    async fn unregister(&self, raw: &str) {
        // Same normalization as register: a lowercase request must remove
        // the uppercase store entry
        let id = TrackingId::new(raw);
        {
            let mut store = self.store.lock();
            if store.unregister(&id).is_err() {
                debug!(package_id = %id, "unregister_ignored: not tracked");
                return;
            }
        }

        let handle = id.handle();
        let removed = self.host.remove_by_handle(&handle).await;
        info!(package_id = %id, handle = %handle, removed = removed, "package_unregistered");
    }

    /// Whether an identifier is currently registered (normalized compare)
    pub fn is_registered(&self, raw: &str) -> bool {
        self.store.lock().contains(&TrackingId::new(raw))
    }

    pub fn registered_count(&self) -> usize {
        self.store.lock().len()
    }
}

/// Drain the command channel, executing commands one at a time.
///
/// The single consumer serializes register/unregister against each other
/// regardless of how many listener connections feed the channel.
pub async fn run_command_worker(
    handler: Arc<CommandHandler>,
    mut command_rx: mpsc::Receiver<TrackingCommand>,
) {
    info!("command_worker_started");

    while let Some(command) = command_rx.recv().await {
        handler.handle(command).await;
    }

    info!("command_worker_stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::carrier::tests::spawn_canned_server;
    use crate::services::registry::ParcelRegistry;
    use std::time::Duration;
    use tempfile::tempdir;

    struct Fixture {
        handler: CommandHandler,
        registry: Arc<ParcelRegistry>,
        #[allow(dead_code)]
        dir: tempfile::TempDir,
    }

    fn fixture_with_endpoint(endpoint: String) -> Fixture {
        let dir = tempdir().unwrap();
        let store = RegistrationStore::load(dir.path().join("dhl_tracking.json"));
        let registry = Arc::new(ParcelRegistry::new());
        let client = Arc::new(
            CarrierClient::with_endpoint(endpoint, "test-key".to_string(), Duration::from_secs(1))
                .unwrap(),
        );
        let handler = CommandHandler::new(
            store,
            registry.clone(),
            client,
            Arc::new(Metrics::new()),
        );
        Fixture { handler, registry, dir }
    }

    fn fixture() -> Fixture {
        // Endpoint that refuses connections: initial refresh fails, which
        // registration absorbs
        fixture_with_endpoint("http://127.0.0.1:9".to_string())
    }

    #[test]
    fn test_command_parsing() {
        assert_eq!(
            "register abc123".parse::<TrackingCommand>().unwrap(),
            TrackingCommand::Register { package_id: "abc123".to_string() }
        );
        assert_eq!(
            "UNREGISTER ABC123".parse::<TrackingCommand>().unwrap(),
            TrackingCommand::Unregister { package_id: "ABC123".to_string() }
        );
        assert_eq!("".parse::<TrackingCommand>(), Err(CommandParseError::Empty));
        assert_eq!("register".parse::<TrackingCommand>(), Err(CommandParseError::BadArguments));
        assert_eq!(
            "register a b".parse::<TrackingCommand>(),
            Err(CommandParseError::BadArguments)
        );
        assert_eq!(
            "track abc123".parse::<TrackingCommand>(),
            Err(CommandParseError::UnknownVerb("track".to_string()))
        );
    }

    #[tokio::test]
    async fn test_register_creates_entity_with_unknown_status() {
        let f = fixture();

        f.handler.handle(TrackingCommand::Register { package_id: "abc123".to_string() }).await;

        assert!(f.handler.is_registered("ABC123"));
        let parcel = f.registry.get("sensor.dhl_abc123").unwrap();
        assert_eq!(parcel.status(), "unknown");
        assert_eq!(parcel.name(), "DHL Package ABC123");
    }

    #[tokio::test]
    async fn test_duplicate_register_is_noop() {
        let f = fixture();

        f.handler.handle(TrackingCommand::Register { package_id: "abc123".to_string() }).await;
        f.handler.handle(TrackingCommand::Register { package_id: "ABC123".to_string() }).await;

        assert_eq!(f.handler.registered_count(), 1);
        assert_eq!(f.registry.len(), 1);
    }

    #[tokio::test]
    async fn test_unregister_removes_entity_and_store_entry() {
        let f = fixture();
        f.handler.handle(TrackingCommand::Register { package_id: "abc123".to_string() }).await;

        // Lowercase request removes the normalized entry
        f.handler.handle(TrackingCommand::Unregister { package_id: "abc123".to_string() }).await;

        assert!(!f.handler.is_registered("ABC123"));
        assert!(f.registry.is_empty());
    }

    #[tokio::test]
    async fn test_unregister_unknown_is_silent_noop() {
        let f = fixture();

        f.handler.handle(TrackingCommand::Unregister { package_id: "zzz999".to_string() }).await;

        assert_eq!(f.handler.registered_count(), 0);
        assert!(f.registry.is_empty());
    }

    #[tokio::test]
    async fn test_register_triggers_initial_refresh() {
        let url = spawn_canned_server(
            "200 OK",
            r#"{"shipments":[{"status":{"statusCode":"transit"}}]}"#,
        )
        .await;
        let f = fixture_with_endpoint(url);

        f.handler.handle(TrackingCommand::Register { package_id: "abc123".to_string() }).await;

        // The spawned initial refresh lands shortly after the handler returns
        let parcel = f.registry.get("sensor.dhl_abc123").unwrap();
        for _ in 0..50 {
            if parcel.status() != "unknown" {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(parcel.status(), "transit");
    }

    #[tokio::test]
    async fn test_restore_registered_builds_batch() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dhl_tracking.json");
        {
            let mut store = RegistrationStore::load(&path);
            store.register(TrackingId::new("abc123")).unwrap();
            store.register(TrackingId::new("def456")).unwrap();
        }

        let store = RegistrationStore::load(&path);
        let registry = Arc::new(ParcelRegistry::new());
        let client = Arc::new(
            CarrierClient::with_endpoint(
                "http://127.0.0.1:9".to_string(),
                "test-key".to_string(),
                Duration::from_secs(1),
            )
            .unwrap(),
        );
        let handler =
            CommandHandler::new(store, registry.clone(), client, Arc::new(Metrics::new()));

        let count = handler.restore_registered().await;

        assert_eq!(count, 2);
        assert_eq!(registry.len(), 2);
        assert!(registry.get("sensor.dhl_abc123").is_some());
        assert!(registry.get("sensor.dhl_def456").is_some());
    }
}
