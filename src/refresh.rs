//! Idle-triggered auto refresh.
//!
//! The timer only runs while no fetch or mutation is in flight, and any
//! user activity on an open page restarts it. When it fires, every cached
//! device query is invalidated and fetched again.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use crate::services::DeviceService;

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

pub struct AutoRefresh {
    service: DeviceService,
    interval: Duration,
    activity: Notify,
    shutdown: CancellationToken,
}

impl AutoRefresh {
    pub fn new(service: DeviceService, interval: Duration) -> Self {
        let interval = if interval.is_zero() {
            DEFAULT_REFRESH_INTERVAL
        } else {
            interval
        };
        Self {
            service,
            interval,
            activity: Notify::new(),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// User did something; start the idle timer over.
    pub fn touch(&self) {
        self.activity.notify_one();
    }

    pub fn stop(&self) {
        self.shutdown.cancel();
        tracing::info!("Auto refresh stopped");
    }

    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tracing::info!(interval_secs = self.interval.as_secs(), "Auto refresh started");
        tokio::spawn(async move { self.run().await })
    }

    async fn run(&self) {
        let mut activity = self.service.cache().subscribe_activity();

        loop {
            // Hold the timer while requests are pending.
            while !activity.borrow_and_update().is_idle() {
                tokio::select! {
                    _ = self.shutdown.cancelled() => return,
                    changed = activity.changed() => {
                        if changed.is_err() {
                            return;
                        }
                    }
                }
            }

            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    tracing::debug!("Auto refresh shutdown requested");
                    return;
                }
                _ = self.activity.notified() => {
                    tracing::trace!("User activity, idle timer restarted");
                }
                changed = activity.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
                _ = tokio::time::sleep(self.interval) => {
                    tracing::debug!("Idle timeout reached, refreshing devices");
                    // Failures are published on the bus by the service.
                    let _ = self.service.refresh().await;
                }
            }
        }
    }
}

impl Drop for AutoRefresh {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
