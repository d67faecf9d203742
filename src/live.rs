//! Live dashboard - periodic refresh in a background task.
//!
//! The dashboard is kept fresh by polling: a spawned task reloads the snapshot on a
//! fixed interval and publishes it on a `watch` channel. The task owns its cancellation
//! signal, so once [`LiveDashboard::cancel`] is called (or the handle is dropped) a load
//! that was still in flight is thrown away instead of published.

use crate::core::{
    access::Role,
    dashboard::{DashboardSnapshot, load_dashboard},
};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use std::time::Duration;
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tracing::{debug, info, warn};

/// Handle to the refresh task.
#[derive(Debug)]
pub struct LiveDashboard {
    snapshots: watch::Receiver<Option<DashboardSnapshot>>,
    cancel: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl LiveDashboard {
    /// Starts polling immediately and then every `every`.
    ///
    /// Must be called from inside a tokio runtime.
    #[must_use]
    pub fn spawn(
        db: DatabaseConnection,
        role: Role,
        featured: Option<String>,
        every: Duration,
    ) -> Self {
        let (publish, snapshots) = watch::channel(None);
        let (cancel, cancelled) = watch::channel(false);
        let task = tokio::spawn(poll(db, role, featured, every, publish, cancelled));
        info!(every_secs = every.as_secs_f64(), "Live dashboard started");

        Self {
            snapshots,
            cancel,
            task: Some(task),
        }
    }

    /// A receiver that sees every published snapshot.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<DashboardSnapshot>> {
        self.snapshots.clone()
    }

    /// The most recently published snapshot, if any load has succeeded yet.
    #[must_use]
    pub fn latest(&self) -> Option<DashboardSnapshot> {
        self.snapshots.borrow().clone()
    }

    /// Stops polling. Results of a load that is still running are discarded.
    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    /// Whether [`cancel`](Self::cancel) has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    /// Cancels and waits for the task to finish.
    pub async fn stop(mut self) {
        self.cancel();
        let Some(task) = self.task.take() else {
            return;
        };
        if let Err(e) = task.await {
            warn!("Live dashboard task ended abnormally: {}", e);
        }
    }
}

impl Drop for LiveDashboard {
    fn drop(&mut self) {
        self.cancel.send_replace(true);
    }
}

async fn poll(
    db: DatabaseConnection,
    role: Role,
    featured: Option<String>,
    every: Duration,
    publish: watch::Sender<Option<DashboardSnapshot>>,
    mut cancelled: watch::Receiver<bool>,
) {
    let mut ticker = time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = cancelled.changed() => {}
        }
        if *cancelled.borrow() {
            break;
        }

        let result = tokio::select! {
            result = load_dashboard(&db, &role, featured.as_deref(), Utc::now()) => result,
            _ = cancelled.changed() => {
                debug!("Refresh interrupted by cancellation");
                break;
            }
        };

        // the handle may have been cancelled while the load finished
        if *cancelled.borrow() {
            debug!("Discarding refresh that completed after cancellation");
            break;
        }

        match result {
            Ok(snapshot) => {
                publish.send_replace(Some(snapshot));
            }
            Err(e) => warn!("Dashboard refresh failed, keeping previous snapshot: {}", e),
        }
    }

    info!("Live dashboard stopped");
}
