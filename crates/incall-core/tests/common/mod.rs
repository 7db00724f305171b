#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use incall_core::events::EventIterator;
use incall_core::platform::mock::{MockMediaPlayer, MockPlatform, MOCK_RESOURCE_DIR};
use incall_core::platform::MediaPlayer;
use incall_core::types::{PlayerState, ToneSource};
use incall_core::{InCallConfig, InCallEvent, InCallManager, ManagerStatus};

pub const WAIT_TIMEOUT: Duration = Duration::from_secs(2);

/// Manager over a fresh mock platform with a short keep-alive delay
pub fn setup() -> (MockPlatform, Arc<InCallManager>) {
    let platform = MockPlatform::new();
    let manager = setup_with(&platform);
    (platform, manager)
}

pub fn setup_with(platform: &MockPlatform) -> Arc<InCallManager> {
    let config = InCallConfig::default().with_keep_alive_update_delay_ms(20);
    InCallManager::new(config, platform.services()).expect("manager should build")
}

/// Poll `condition` until it holds or the timeout expires
pub async fn wait_until<F: FnMut() -> bool>(mut condition: F) {
    let deadline = Instant::now() + WAIT_TIMEOUT;
    while !condition() {
        assert!(Instant::now() < deadline, "condition not reached in time");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Poll the manager status until `condition` holds
pub async fn wait_for_status<F: Fn(&ManagerStatus) -> bool>(
    manager: &InCallManager,
    condition: F,
) -> ManagerStatus {
    let deadline = Instant::now() + WAIT_TIMEOUT;
    loop {
        let status = manager.status().await;
        if condition(&status) {
            return status;
        }
        assert!(Instant::now() < deadline, "status not reached in time: {:?}", status);
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Wait for the call-audio session to be created and activated
pub async fn wait_for_session(platform: &MockPlatform) {
    wait_until(|| platform.sessions.last().map_or(false, |s| s.is_active())).await;
}

pub async fn next_event(events: &mut EventIterator) -> InCallEvent {
    tokio::time::timeout(WAIT_TIMEOUT, events.next())
        .await
        .expect("timed out waiting for event")
        .expect("event channel closed")
}

pub fn ringback_path() -> String {
    format!("{}/incallmanager_ringback.mp3", MOCK_RESOURCE_DIR)
}

pub fn busytone_path() -> String {
    format!("{}/incallmanager_busytone.mp3", MOCK_RESOURCE_DIR)
}

pub fn ringtone_path() -> String {
    "incallmanager_ringtone.mp3".to_string()
}

pub fn source(platform: &MockPlatform, path: &str) -> ToneSource {
    platform
        .resources
        .source_for(path)
        .expect("tone file should be registered")
}

/// Wait until a player for `path` exists and reaches `playing`
pub async fn wait_for_playing(platform: &MockPlatform, path: &str) -> Arc<MockMediaPlayer> {
    let source = source(platform, path);
    wait_until(|| {
        platform
            .media
            .player_for(&source)
            .map_or(false, |p| p.state() == PlayerState::Playing)
    })
    .await;
    platform.media.player_for(&source).expect("player exists")
}
