use super::teardown::{ActiveStoreSlot, spawn_detached_delete};
use ragchat_core::RagService;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Best-effort store teardown for abnormal process exit.
///
/// Keep the guard alive for as long as the host runs: dropping it deletes
/// whichever store is active at that moment. Teardown never blocks and never
/// reports failures, it only logs them.
#[must_use = "dropping an UnloadGuard deletes the active store"]
pub struct UnloadGuard {
    service: Arc<dyn RagService>,
    active: ActiveStoreSlot,
}

impl UnloadGuard {
    pub fn new(service: Arc<dyn RagService>, active: ActiveStoreSlot) -> Self {
        Self { service, active }
    }

    /// Fires a detached delete for the active store, if any.
    ///
    /// Returns whether a delete was scheduled. The slot is emptied, so a
    /// second trigger is a no-op.
    pub fn trigger(&self) -> bool {
        match self.active.take() {
            Some(store) => {
                spawn_detached_delete(self.service.clone(), store);
                true
            }
            None => false,
        }
    }

    /// Moves the guard into a task that triggers teardown on Ctrl-C.
    ///
    /// The guard lives as long as the task, so aborting the returned handle
    /// also tears the active store down.
    pub fn watch_ctrl_c(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    tracing::info!("Interrupt received, tearing down active store");
                    self.trigger();
                }
                Err(err) => {
                    tracing::warn!(error = %err, "Unable to listen for Ctrl-C");
                    std::future::pending::<()>().await;
                }
            }
        })
    }
}

impl Drop for UnloadGuard {
    fn drop(&mut self) {
        self.trigger();
    }
}
