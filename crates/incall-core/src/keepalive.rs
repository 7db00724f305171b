//! Background keep-alive task
//!
//! Keeps the process eligible for background audio while a tone plays. The
//! task starts in playback mode and, after a configurable delay, widens to
//! playback plus recording so the call audio survives backgrounding.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::platform::BackgroundTaskService;
use crate::types::BackgroundMode;

const PLAYBACK_MODES: &[BackgroundMode] = &[BackgroundMode::AudioPlayback];
const CALL_MODES: &[BackgroundMode] = &[BackgroundMode::AudioPlayback, BackgroundMode::AudioRecording];

/// Background keep-alive task shared by the tone operations
pub struct BackgroundKeepAlive {
    /// Background-task service
    service: Arc<dyn BackgroundTaskService>,
    /// Delay before widening the running modes
    update_delay: Duration,
    /// Pending mode widening
    pending_update: Mutex<Option<JoinHandle<()>>>,
}

impl BackgroundKeepAlive {
    /// Create a keep-alive bound to a background-task service
    pub fn new(service: Arc<dyn BackgroundTaskService>, update_delay: Duration) -> Self {
        Self {
            service,
            update_delay,
            pending_update: Mutex::new(None),
        }
    }

    /// Start background running and schedule the mode widening
    pub async fn start(&self) {
        if let Err(e) = self.service.start_running(PLAYBACK_MODES).await {
            error!(code = e.code(), "startBackgroundRunning failed: {}", e);
            return;
        }
        info!("startBackgroundRunning succeeded");

        let service = self.service.clone();
        let delay = self.update_delay;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match service.update_running(CALL_MODES).await {
                Ok(()) => info!("updateBackgroundRunning succeeded"),
                Err(e) => info!(code = e.code(), "updateBackgroundRunning failed: {}", e),
            }
        });

        if let Some(previous) = self.pending_update.lock().replace(handle) {
            previous.abort();
        }
    }

    /// Cancel a pending widening and stop background running
    pub async fn stop(&self) {
        if let Some(pending) = self.pending_update.lock().take() {
            pending.abort();
        }
        match self.service.stop_running().await {
            Ok(()) => info!("stopBackgroundRunning succeeded"),
            Err(e) => info!(code = e.code(), "stopBackgroundRunning failed: {}", e),
        }
    }
}

impl Drop for BackgroundKeepAlive {
    fn drop(&mut self) {
        if let Some(pending) = self.pending_update.get_mut().take() {
            pending.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::mock::MockBackground;

    #[tokio::test]
    async fn test_start_widens_modes_after_delay() {
        let background = Arc::new(MockBackground::default());
        let keep_alive = BackgroundKeepAlive::new(background.clone(), Duration::from_millis(20));

        keep_alive.start().await;
        assert!(background.is_running());
        assert_eq!(background.modes(), vec![BackgroundMode::AudioPlayback]);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(background.update_count(), 1);
        assert_eq!(
            background.modes(),
            vec![BackgroundMode::AudioPlayback, BackgroundMode::AudioRecording]
        );
    }

    #[tokio::test]
    async fn test_stop_cancels_pending_update() {
        let background = Arc::new(MockBackground::default());
        let keep_alive = BackgroundKeepAlive::new(background.clone(), Duration::from_millis(50));

        keep_alive.start().await;
        keep_alive.stop().await;
        tokio::time::sleep(Duration::from_millis(150)).await;

        assert!(!background.is_running());
        assert_eq!(background.update_count(), 0);
        assert_eq!(background.stop_count(), 1);
    }
}
