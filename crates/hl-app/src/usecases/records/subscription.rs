use std::sync::Arc;

use hl_core::ids::OwnerId;
use hl_core::ports::{RecordStorePort, SnapshotEvent, SnapshotReceiver, StoreError};
use hl_core::record::Snapshot;
use thiserror::Error;
use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::observable::Observable;

const ISSUE_CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Error)]
pub enum SubscriptionError {
    #[error("failed to open record subscription: {0}")]
    Open(#[from] StoreError),
}

/// A store failure that did not replace the snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncIssue {
    pub owner: OwnerId,
    pub epoch: u64,
    pub error: StoreError,
}

#[derive(Default)]
struct SubscriptionState {
    epoch: u64,
    owner: Option<OwnerId>,
    pump: Option<JoinHandle<()>>,
}

impl SubscriptionState {
    /// Retires the current epoch; anything still in flight for it is dropped on arrival.
    fn retire(&mut self) {
        self.epoch += 1;
        self.owner = None;
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
    }
}

struct Shared {
    state: Mutex<SubscriptionState>,
    snapshot: Observable<Option<Snapshot>>,
    loading: Observable<bool>,
    issues: broadcast::Sender<SyncIssue>,
}

impl Shared {
    /// Applies one store notification if it belongs to the live epoch.
    ///
    /// This is the only writer of a non-empty snapshot.
    async fn deliver(&self, epoch: u64, event: SnapshotEvent) -> bool {
        let state = self.state.lock().await;
        if state.epoch != epoch {
            debug!(epoch, live_epoch = state.epoch, "discarding stale snapshot event");
            return false;
        }

        match event {
            Ok(records) => {
                let snapshot = Snapshot::new(records);
                debug!(epoch, records = snapshot.len(), "snapshot replaced");
                self.snapshot.emit(Some(snapshot));
                self.loading.publish(false);
                true
            }
            Err(error) => {
                warn!(epoch, error = %error, "record listener failed, keeping last snapshot");
                self.loading.publish(false);
                if let Some(owner) = state.owner.clone() {
                    let _ = self.issues.send(SyncIssue {
                        owner,
                        epoch,
                        error,
                    });
                }
                false
            }
        }
    }
}

/// Owns the single live subscription to one owner's record stream.
pub struct RecordSubscription {
    store: Arc<dyn RecordStorePort>,
    shared: Arc<Shared>,
}

impl RecordSubscription {
    pub fn new(store: Arc<dyn RecordStorePort>) -> Self {
        let (issues, _) = broadcast::channel(ISSUE_CHANNEL_CAPACITY);
        Self {
            store,
            shared: Arc::new(Shared {
                state: Mutex::new(SubscriptionState::default()),
                snapshot: Observable::new(None),
                loading: Observable::new(false),
                issues,
            }),
        }
    }

    /// Replaces any existing subscription with one for `owner`.
    #[tracing::instrument(name = "usecase.record_subscription.start", skip(self, owner), fields(owner = %owner))]
    pub async fn start(&self, owner: OwnerId) -> Result<(), SubscriptionError> {
        let mut state = self.shared.state.lock().await;
        state.retire();
        let epoch = state.epoch;

        self.shared.snapshot.publish(None);
        self.shared.loading.publish(true);

        let receiver = match self.store.subscribe(&owner).await {
            Ok(receiver) => receiver,
            Err(err) => {
                self.shared.loading.publish(false);
                return Err(err.into());
            }
        };

        state.owner = Some(owner);
        state.pump = Some(tokio::spawn(pump(
            Arc::clone(&self.shared),
            epoch,
            receiver,
        )));
        info!(epoch, "record subscription started");
        Ok(())
    }

    /// Cancels the subscription and discards the snapshot.
    #[tracing::instrument(name = "usecase.record_subscription.stop", skip(self))]
    pub async fn stop(&self) {
        let mut state = self.shared.state.lock().await;
        let was_active = state.owner.is_some();
        state.retire();
        self.shared.snapshot.publish(None);
        self.shared.loading.publish(false);
        if was_active {
            info!(epoch = state.epoch, "record subscription stopped");
        }
    }

    pub async fn owner(&self) -> Option<OwnerId> {
        self.shared.state.lock().await.owner.clone()
    }

    pub async fn epoch(&self) -> u64 {
        self.shared.state.lock().await.epoch
    }

    pub fn snapshot(&self) -> Option<Snapshot> {
        self.shared.snapshot.get()
    }

    pub fn subscribe_snapshot(&self) -> watch::Receiver<Option<Snapshot>> {
        self.shared.snapshot.subscribe()
    }

    /// `true` between `start` and the first notification of that subscription.
    pub fn subscribe_loading(&self) -> watch::Receiver<bool> {
        self.shared.loading.subscribe()
    }

    pub fn subscribe_issues(&self) -> broadcast::Receiver<SyncIssue> {
        self.shared.issues.subscribe()
    }

    #[cfg(test)]
    async fn deliver(&self, epoch: u64, event: SnapshotEvent) -> bool {
        self.shared.deliver(epoch, event).await
    }
}

impl Drop for RecordSubscription {
    fn drop(&mut self) {
        if let Ok(mut state) = self.shared.state.try_lock() {
            state.retire();
        }
    }
}

async fn pump(shared: Arc<Shared>, epoch: u64, mut receiver: SnapshotReceiver) {
    while let Some(event) = receiver.recv().await {
        shared.deliver(epoch, event).await;
    }
    debug!(epoch, "record stream closed");
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use hl_core::ids::RecordId;
    use hl_core::record::{Category, NewRecord, Record};
    use tokio::sync::mpsc;

    use super::*;

    /// Hands out channels whose senders the test keeps.
    #[derive(Default)]
    struct ChannelStore {
        senders: std::sync::Mutex<Vec<(OwnerId, mpsc::Sender<SnapshotEvent>)>>,
        fail_subscribe: bool,
    }

    impl ChannelStore {
        fn sender(&self, index: usize) -> mpsc::Sender<SnapshotEvent> {
            self.senders.lock().unwrap()[index].1.clone()
        }
    }

    #[async_trait]
    impl RecordStorePort for ChannelStore {
        async fn subscribe(&self, owner: &OwnerId) -> Result<SnapshotReceiver, StoreError> {
            if self.fail_subscribe {
                return Err(StoreError::Unavailable("offline".to_string()));
            }
            let (tx, rx) = mpsc::channel(8);
            self.senders.lock().unwrap().push((owner.clone(), tx));
            Ok(rx)
        }

        async fn add(&self, _record: NewRecord) -> Result<RecordId, StoreError> {
            unimplemented!("not used by subscription tests")
        }

        async fn delete(&self, _id: &RecordId) -> Result<(), StoreError> {
            unimplemented!("not used by subscription tests")
        }
    }

    fn record(id: &str) -> Record {
        Record {
            id: Some(RecordId::from(id)),
            owner_id: OwnerId::from("u1"),
            category: Category::Dinner,
            magnitude: 500,
            label: id.to_string(),
            note: String::new(),
            media_ref: None,
            created_at: DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap(),
        }
    }

    async fn wait_for_snapshot(
        rx: &mut watch::Receiver<Option<Snapshot>>,
        pred: impl FnMut(&Option<Snapshot>) -> bool,
    ) {
        tokio::time::timeout(Duration::from_secs(1), rx.wait_for(pred))
            .await
            .expect("snapshot not published in time")
            .expect("snapshot channel closed");
    }

    fn setup() -> (Arc<ChannelStore>, RecordSubscription) {
        let store = Arc::new(ChannelStore::default());
        let subscription = RecordSubscription::new(store.clone());
        (store, subscription)
    }

    #[tokio::test]
    async fn applies_full_snapshot_replacements() {
        let (store, subscription) = setup();
        let mut rx = subscription.subscribe_snapshot();
        subscription.start(OwnerId::from("u1")).await.unwrap();

        let tx = store.sender(0);
        tx.send(Ok(vec![record("a"), record("b")])).await.unwrap();
        wait_for_snapshot(&mut rx, |s| s.as_ref().is_some_and(|s| s.len() == 2)).await;

        tx.send(Ok(vec![record("c")])).await.unwrap();
        wait_for_snapshot(&mut rx, |s| s.as_ref().is_some_and(|s| s.len() == 1)).await;
        assert!(subscription
            .snapshot()
            .unwrap()
            .contains(&RecordId::from("c")));
    }

    #[tokio::test]
    async fn listener_error_keeps_last_snapshot_and_reports_issue() {
        let (store, subscription) = setup();
        let mut rx = subscription.subscribe_snapshot();
        let mut issues = subscription.subscribe_issues();
        subscription.start(OwnerId::from("u1")).await.unwrap();

        let tx = store.sender(0);
        tx.send(Ok(vec![record("a")])).await.unwrap();
        wait_for_snapshot(&mut rx, |s| s.is_some()).await;

        tx.send(Err(StoreError::Unavailable("flaky".to_string())))
            .await
            .unwrap();
        let issue = tokio::time::timeout(Duration::from_secs(1), issues.recv())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(issue.owner, OwnerId::from("u1"));
        assert_eq!(issue.error, StoreError::Unavailable("flaky".to_string()));
        assert_eq!(subscription.snapshot().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn stale_epoch_events_are_discarded_after_stop() {
        let (_store, subscription) = setup();
        subscription.start(OwnerId::from("u1")).await.unwrap();
        let old_epoch = subscription.epoch().await;

        subscription.stop().await;
        let applied = subscription
            .deliver(old_epoch, Ok(vec![record("late")]))
            .await;

        assert!(!applied);
        assert!(subscription.snapshot().is_none());
        assert!(subscription.owner().await.is_none());
    }

    #[tokio::test]
    async fn restart_supersedes_previous_epoch() {
        let (store, subscription) = setup();
        subscription.start(OwnerId::from("u1")).await.unwrap();
        let first_epoch = subscription.epoch().await;
        subscription.start(OwnerId::from("u2")).await.unwrap();
        let second_epoch = subscription.epoch().await;
        assert!(second_epoch > first_epoch);

        assert!(
            !subscription
                .deliver(first_epoch, Ok(vec![record("from-u1")]))
                .await
        );
        assert!(subscription.snapshot().is_none());

        let mut rx = subscription.subscribe_snapshot();
        store.sender(1).send(Ok(vec![record("from-u2")])).await.unwrap();
        wait_for_snapshot(&mut rx, |s| s.is_some()).await;
        assert!(subscription
            .snapshot()
            .unwrap()
            .contains(&RecordId::from("from-u2")));
        assert_eq!(subscription.owner().await, Some(OwnerId::from("u2")));
    }

    #[tokio::test]
    async fn loading_clears_on_first_notification() {
        let (store, subscription) = setup();
        let mut loading = subscription.subscribe_loading();
        subscription.start(OwnerId::from("u1")).await.unwrap();
        assert!(*loading.borrow_and_update());

        store.sender(0).send(Ok(Vec::new())).await.unwrap();
        tokio::time::timeout(Duration::from_secs(1), loading.wait_for(|l| !*l))
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn failed_open_reports_error() {
        let store = Arc::new(ChannelStore {
            fail_subscribe: true,
            ..Default::default()
        });
        let subscription = RecordSubscription::new(store);

        let err = subscription.start(OwnerId::from("u1")).await.unwrap_err();
        assert!(matches!(err, SubscriptionError::Open(StoreError::Unavailable(_))));
        assert!(subscription.owner().await.is_none());
        assert!(!*subscription.subscribe_loading().borrow());
    }
}
