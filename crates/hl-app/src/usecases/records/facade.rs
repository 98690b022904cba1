use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::time::Duration;

use hl_core::ids::{OwnerId, RecordId};
use hl_core::ports::{ClockPort, RecordStorePort};
use hl_core::record::RecordDraft;
use hl_core::view::{derive_view, group_history, DerivedView, HistoryGroup};
use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::debug;

use super::add_record::{AddRecord, AddRecordError};
use super::delete_record::{DeleteRecord, DeleteRecordError};
use super::overlay::OptimisticOverlay;
use super::subscription::{RecordSubscription, SubscriptionError, SyncIssue};
use crate::observable::Observable;

/// Recomputes the derived views from the latest snapshot and overlay.
struct ViewEngine {
    subscription: Arc<RecordSubscription>,
    overlay: Arc<OptimisticOverlay>,
    clock: Arc<dyn ClockPort>,
    view: Observable<Option<DerivedView>>,
    history: Observable<Vec<HistoryGroup>>,
    /// Held from the snapshot read through publication.
    publishing: StdMutex<()>,
}

impl ViewEngine {
    fn recompute(&self) {
        let _publishing = self.publishing.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(snapshot) = self.subscription.snapshot() else {
            self.view.publish(None);
            self.history.publish(Vec::new());
            return;
        };

        self.overlay.sweep();
        let now = self.clock.now_local();
        let (view, history) = self.overlay.read(|pending| {
            (
                derive_view(&snapshot, pending, &now),
                group_history(&snapshot, pending, &now),
            )
        });

        if self.view.publish(Some(view)) {
            debug!("derived view updated");
        }
        self.history.publish(history);
    }
}

/// Record-side surface for UI callers: start/stop the mirror, add and delete
/// records, observe the derived views.
pub struct RecordsFacade {
    subscription: Arc<RecordSubscription>,
    overlay: Arc<OptimisticOverlay>,
    engine: Arc<ViewEngine>,
    add_record: AddRecord,
    delete_record: DeleteRecord,
    sweep_interval: Duration,
    refresher: Mutex<Option<JoinHandle<()>>>,
}

impl RecordsFacade {
    pub fn new(
        store: Arc<dyn RecordStorePort>,
        clock: Arc<dyn ClockPort>,
        overlay_ttl: Duration,
        sweep_interval: Duration,
    ) -> Self {
        let subscription = Arc::new(RecordSubscription::new(Arc::clone(&store)));
        let overlay = Arc::new(OptimisticOverlay::new(Arc::clone(&clock), overlay_ttl));
        let engine = Arc::new(ViewEngine {
            subscription: Arc::clone(&subscription),
            overlay: Arc::clone(&overlay),
            clock: Arc::clone(&clock),
            view: Observable::new(None),
            history: Observable::new(Vec::new()),
            publishing: StdMutex::new(()),
        });

        Self {
            add_record: AddRecord::from_ports(Arc::clone(&store), clock),
            delete_record: DeleteRecord::from_ports(store, Arc::clone(&overlay)),
            subscription,
            overlay,
            engine,
            sweep_interval,
            refresher: Mutex::new(None),
        }
    }

    /// Mirrors `owner`'s records, replacing any previous owner.
    pub async fn start_records(&self, owner: OwnerId) -> Result<(), SubscriptionError> {
        let mut refresher = self.refresher.lock().await;
        if let Some(handle) = refresher.take() {
            handle.abort();
        }
        self.overlay.clear();

        let started = self.subscription.start(owner).await;
        self.engine.recompute();
        started?;
        *refresher = Some(tokio::spawn(refresh_loop(
            Arc::clone(&self.engine),
            self.sweep_interval,
        )));
        Ok(())
    }

    /// Stops mirroring and discards the snapshot and views.
    pub async fn stop_records(&self) {
        let mut refresher = self.refresher.lock().await;
        if let Some(handle) = refresher.take() {
            handle.abort();
        }
        self.subscription.stop().await;
        self.overlay.clear();
        self.engine.recompute();
    }

    /// Validates and persists a record for the active owner.
    pub async fn add_record(&self, draft: RecordDraft) -> Result<RecordId, AddRecordError> {
        let owner = self
            .subscription
            .owner()
            .await
            .ok_or(AddRecordError::NotStarted)?;
        self.add_record.execute(owner, draft).await
    }

    /// Hides the record immediately and deletes it remotely.
    pub async fn delete_record(&self, id: &RecordId) -> Result<(), DeleteRecordError> {
        let result = self.delete_record.execute(id).await;
        self.engine.recompute();
        result
    }

    /// Recomputes the views now instead of waiting for the next trigger.
    pub fn refresh(&self) {
        self.engine.recompute();
    }

    /// `None` until the first snapshot arrives and after `stop_records`.
    pub fn current_view(&self) -> Option<DerivedView> {
        self.engine.view.get()
    }

    pub fn subscribe_view(&self) -> watch::Receiver<Option<DerivedView>> {
        self.engine.view.subscribe()
    }

    pub fn history(&self) -> Vec<HistoryGroup> {
        self.engine.history.get()
    }

    pub fn subscribe_history(&self) -> watch::Receiver<Vec<HistoryGroup>> {
        self.engine.history.subscribe()
    }

    pub fn subscribe_loading(&self) -> watch::Receiver<bool> {
        self.subscription.subscribe_loading()
    }

    pub fn subscribe_issues(&self) -> broadcast::Receiver<SyncIssue> {
        self.subscription.subscribe_issues()
    }

    pub fn overlay(&self) -> &OptimisticOverlay {
        &self.overlay
    }
}

impl Drop for RecordsFacade {
    fn drop(&mut self) {
        if let Ok(mut refresher) = self.refresher.try_lock() {
            if let Some(handle) = refresher.take() {
                handle.abort();
            }
        }
    }
}

async fn refresh_loop(engine: Arc<ViewEngine>, sweep_interval: Duration) {
    let mut snapshots = engine.subscription.subscribe_snapshot();
    let mut revisions = engine.overlay.subscribe_revision();
    let mut ticker = tokio::time::interval(sweep_interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                if let Some(snapshot) = snapshot {
                    engine.overlay.reconcile(&snapshot);
                }
            }
            changed = revisions.changed() => {
                if changed.is_err() {
                    break;
                }
                revisions.borrow_and_update();
            }
            _ = ticker.tick() => {}
        }
        engine.recompute();
    }
}
