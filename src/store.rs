//! Async home of the controller
//!
//! One task owns the [`Controller`] and drains a queue of commands, so
//! there is exactly one writer. [`MapStore`] handles are cheap to clone and
//! talk to that task. Every visible change is broadcast as view-model JSON.
//!
//! The dataset fetch runs in its own task and only holds a weak sender:
//! once every handle is gone the completion is discarded instead of being
//! applied to a controller nobody is looking at.

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::controller::{Controller, MapEvent, SearchOutcome, ViewModel};
use crate::error::StoreClosed;
use crate::models::Coordinates;
use crate::parser;
use crate::source::DatasetSource;

const COMMAND_QUEUE: usize = 64;
const UPDATE_CHANNEL: usize = 100;

enum Command {
    Mount(oneshot::Sender<bool>),
    Apply(MapEvent, Option<oneshot::Sender<ViewModel>>),
    Search {
        query: Option<String>,
        reply: oneshot::Sender<(SearchOutcome, ViewModel)>,
    },
    Snapshot(oneshot::Sender<ViewModel>),
}

/// What happened to a finished dataset fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadDelivery {
    Delivered,
    /// The store was torn down before the fetch completed
    Discarded,
}

#[derive(Clone)]
pub struct MapStore {
    tx: mpsc::Sender<Command>,
    updates: broadcast::Sender<String>,
}

impl MapStore {
    /// Start the store task. Must be called inside a tokio runtime.
    pub fn spawn(controller: Controller) -> Self {
        let (tx, rx) = mpsc::channel(COMMAND_QUEUE);
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL);
        tokio::spawn(run(controller, rx, updates.clone()));
        Self { tx, updates }
    }

    /// Start the one dataset fetch for this store's lifetime.
    ///
    /// Returns `None` if a fetch was already started earlier.
    pub async fn mount<S: DatasetSource>(
        &self,
        source: S,
    ) -> Result<Option<JoinHandle<LoadDelivery>>, StoreClosed> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Mount(reply)).await?;
        if !rx.await.map_err(|_| StoreClosed)? {
            return Ok(None);
        }

        let weak = self.tx.downgrade();
        Ok(Some(tokio::spawn(async move {
            info!("Loading service area dataset from {}", source.describe());
            let event = match source.fetch().await {
                Ok(text) => {
                    let report = parser::parse_with_report(&text);
                    if report.dropped > 0 {
                        warn!("Dropped {} malformed dataset rows", report.dropped);
                    }
                    MapEvent::LoadSucceeded(report.records)
                }
                Err(e) => MapEvent::LoadFailed(e),
            };

            let delivered = match weak.upgrade() {
                Some(tx) => tx.send(Command::Apply(event, None)).await.is_ok(),
                None => false,
            };
            if delivered {
                LoadDelivery::Delivered
            } else {
                debug!("Map store gone, discarding dataset load result");
                LoadDelivery::Discarded
            }
        })))
    }

    pub async fn set_query(&self, query: &str) -> Result<ViewModel, StoreClosed> {
        self.apply(MapEvent::QueryChanged(query.to_string())).await
    }

    /// Invoke a search, optionally replacing the query text first.
    pub async fn search(
        &self,
        query: Option<String>,
    ) -> Result<(SearchOutcome, ViewModel), StoreClosed> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Search { query, reply }).await?;
        rx.await.map_err(|_| StoreClosed)
    }

    pub async fn reset_view(&self) -> Result<ViewModel, StoreClosed> {
        self.apply(MapEvent::ResetView).await
    }

    /// Pan/zoom reported by the rendering surface
    pub async fn update_view(&self, center: Coordinates, zoom: u8) -> Result<ViewModel, StoreClosed> {
        self.apply(MapEvent::ViewChanged { center, zoom }).await
    }

    pub async fn snapshot(&self) -> Result<ViewModel, StoreClosed> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Snapshot(reply)).await?;
        rx.await.map_err(|_| StoreClosed)
    }

    /// Stream of view-model JSON, one message per visible change
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.updates.subscribe()
    }

    async fn apply(&self, event: MapEvent) -> Result<ViewModel, StoreClosed> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Apply(event, Some(reply))).await?;
        rx.await.map_err(|_| StoreClosed)
    }

    async fn send(&self, command: Command) -> Result<(), StoreClosed> {
        self.tx.send(command).await.map_err(|_| StoreClosed)
    }
}

async fn run(
    mut controller: Controller,
    mut rx: mpsc::Receiver<Command>,
    updates: broadcast::Sender<String>,
) {
    debug!("Map store started");
    while let Some(command) = rx.recv().await {
        match command {
            Command::Mount(reply) => {
                let _ = reply.send(controller.mount());
            }
            Command::Apply(event, reply) => {
                if controller.apply(event) {
                    publish(&controller, &updates);
                }
                if let Some(reply) = reply {
                    let _ = reply.send(controller.view_model());
                }
            }
            Command::Search { query, reply } => {
                if let Some(query) = query {
                    controller.apply(MapEvent::QueryChanged(query));
                }
                let outcome = controller.search();
                publish(&controller, &updates);
                let _ = reply.send((outcome, controller.view_model()));
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(controller.view_model());
            }
        }
    }
    debug!("Map store stopped");
}

fn publish(controller: &Controller, updates: &broadcast::Sender<String>) {
    if updates.receiver_count() == 0 {
        return;
    }
    match serde_json::to_string(&controller.view_model()) {
        Ok(json) => {
            let _ = updates.send(json);
        }
        Err(e) => warn!("Failed to serialize view model: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::{LoadStatus, LOAD_FAILED_MESSAGE};
    use crate::error::LoadError;
    use crate::source::StaticSource;
    use std::sync::Arc;
    use tokio::sync::Notify;

    const CSV: &str = "ZipCode,City,Lat,Lon\n02134,Boston,42.35,-71.06\n\n04330,Augusta,44.31,-69.78\n";

    /// Source that blocks until released
    struct GatedSource {
        gate: Arc<Notify>,
    }

    impl DatasetSource for GatedSource {
        async fn fetch(&self) -> Result<String, LoadError> {
            self.gate.notified().await;
            Ok(CSV.to_string())
        }

        fn describe(&self) -> String {
            "gated".to_string()
        }
    }

    async fn loaded_store() -> MapStore {
        let store = MapStore::spawn(Controller::new());
        let load = store.mount(StaticSource::csv(CSV)).await.unwrap().unwrap();
        assert_eq!(load.await.unwrap(), LoadDelivery::Delivered);
        store
    }

    #[tokio::test]
    async fn test_mount_loads_dataset() {
        let store = loaded_store().await;
        let view = store.snapshot().await.unwrap();
        assert_eq!(view.status, LoadStatus::Ready);
        assert_eq!(view.record_count, 2);
    }

    #[tokio::test]
    async fn test_mount_only_once() {
        let store = loaded_store().await;
        assert!(store.mount(StaticSource::csv("")).await.unwrap().is_none());
        assert_eq!(store.snapshot().await.unwrap().record_count, 2);
    }

    #[tokio::test]
    async fn test_search_roundtrip() {
        let store = loaded_store().await;

        let (outcome, view) = store.search(Some("4330".to_string())).await.unwrap();
        assert!(matches!(outcome, SearchOutcome::Found(ref s) if s.city == "Augusta"));
        assert_eq!(view.query, "4330");
        assert_eq!(view.selected.unwrap().label, "Augusta");

        store.set_query("99999").await.unwrap();
        let (outcome, view) = store.search(None).await.unwrap();
        assert_eq!(outcome, SearchOutcome::NotFound);
        assert_eq!(view.error, "The 99999 is out of our service area");
        assert!(view.selected.is_none());
    }

    #[tokio::test]
    async fn test_load_failure() {
        let store = MapStore::spawn(Controller::new());
        let load = store.mount(StaticSource::HttpStatus(500)).await.unwrap().unwrap();
        load.await.unwrap();

        let view = store.snapshot().await.unwrap();
        assert_eq!(view.status, LoadStatus::LoadFailed);
        assert_eq!(view.error, LOAD_FAILED_MESSAGE);
        assert_eq!(view.reference_points.len(), 4);

        let (outcome, view) = store.search(Some("02134".to_string())).await.unwrap();
        assert_eq!(outcome, SearchOutcome::Unavailable);
        assert_eq!(view.error, LOAD_FAILED_MESSAGE);
    }

    #[tokio::test]
    async fn test_searches_while_loading() {
        let gate = Arc::new(Notify::new());
        let store = MapStore::spawn(Controller::new());
        let load = store
            .mount(GatedSource { gate: gate.clone() })
            .await
            .unwrap()
            .unwrap();

        let view = store.snapshot().await.unwrap();
        assert_eq!(view.status, LoadStatus::Loading);
        assert_eq!(view.reference_points.len(), 4);
        let (outcome, _) = store.search(Some("02134".to_string())).await.unwrap();
        assert_eq!(outcome, SearchOutcome::NotFound);

        gate.notify_one();
        assert_eq!(load.await.unwrap(), LoadDelivery::Delivered);
        let view = store.snapshot().await.unwrap();
        assert_eq!(view.status, LoadStatus::Ready);
        assert_eq!(view.error, "");
        let (outcome, _) = store.search(None).await.unwrap();
        assert!(matches!(outcome, SearchOutcome::Found(_)));
    }

    #[tokio::test]
    async fn test_completion_after_teardown_is_discarded() {
        let gate = Arc::new(Notify::new());
        let store = MapStore::spawn(Controller::new());
        let load = store
            .mount(GatedSource { gate: gate.clone() })
            .await
            .unwrap()
            .unwrap();

        drop(store);
        gate.notify_one();
        assert_eq!(load.await.unwrap(), LoadDelivery::Discarded);
    }

    #[tokio::test]
    async fn test_reset_keeps_search_state() {
        let store = loaded_store().await;
        store.search(Some("02134".to_string())).await.unwrap();
        store
            .update_view(Coordinates::new(42.0, -71.0), 10)
            .await
            .unwrap();

        let view = store.reset_view().await.unwrap();
        assert_eq!(view.viewport.zoom, 7);
        assert_eq!(view.selected.unwrap().label, "Boston");
        assert_eq!(view.error, "");
    }

    #[tokio::test]
    async fn test_updates_broadcast() {
        let store = MapStore::spawn(Controller::new());
        let mut updates = store.subscribe();

        let load = store.mount(StaticSource::csv(CSV)).await.unwrap().unwrap();
        load.await.unwrap();
        let json: serde_json::Value = serde_json::from_str(&updates.recv().await.unwrap()).unwrap();
        assert_eq!(json["status"], "ready");

        store.search(Some("02134".to_string())).await.unwrap();
        let json: serde_json::Value = serde_json::from_str(&updates.recv().await.unwrap()).unwrap();
        assert_eq!(json["selected"]["label"], "Boston");
    }
}
