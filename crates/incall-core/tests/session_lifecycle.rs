mod common;

use std::time::Duration;

use common::*;
use incall_core::platform::mock::MockPlatform;
use incall_core::platform::CallAudioSession;
use incall_core::types::{AudioDeviceDescriptor, DeviceChangeAction, DeviceChangeType, DeviceType};
use incall_core::{InCallEvent, MediaType, PlatformError, RemoteCommand, SessionType};

#[tokio::test]
async fn test_start_twice_is_noop() {
    let (platform, manager) = setup();

    manager.start(MediaType::Audio, true, "").await;
    wait_for_session(&platform).await;
    let first = manager.status().await;
    assert!(first.session_initialized);
    assert!(first.session_active);

    manager.start(MediaType::Audio, true, "").await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(manager.status().await, first);
    assert_eq!(platform.sessions.created().len(), 1);
    assert_eq!(platform.sessions.last().unwrap().activation_count(), 1);
    assert_eq!(platform.proximity.subscription_count(), 1);
}

#[tokio::test]
async fn test_stop_without_session_has_no_side_effects() {
    let (platform, manager) = setup();

    manager.stop("").await;
    manager.stop("_DEFAULT_").await;

    let status = manager.status().await;
    assert!(!status.session_initialized);
    assert_eq!(platform.background.stop_count(), 0);
    assert!(platform.window.history().is_empty());
    assert!(platform.routing.speaker_requests().is_empty());
    assert_eq!(platform.media.created_count(), 0);
}

#[tokio::test]
async fn test_busytone_defers_teardown_until_it_finishes() {
    let (platform, manager) = setup();
    platform.routing.force_speakerphone(true);

    manager.start(MediaType::Audio, true, "").await;
    wait_for_session(&platform).await;
    let session = platform.sessions.last().unwrap();

    // Simulate an in-call change that the snapshot should undo
    manager.set_speakerphone_on(false);
    assert!(!platform.routing.speakerphone_on());

    manager.stop("_DEFAULT_").await;
    let status = manager.status().await;
    assert!(status.session_initialized);
    assert!(status.route_snapshot_stored);
    assert!(session.is_active());

    let busytone = wait_for_playing(&platform, &busytone_path()).await;
    assert!(!busytone.is_looping());
    assert!(session.is_active());

    busytone.finish();

    let status = wait_for_status(&manager, |s| !s.session_initialized).await;
    assert!(!status.route_snapshot_stored);
    assert!(!status.session_active);
    wait_until(|| session.is_destroyed()).await;
    assert!(platform.routing.speakerphone_on());
}

#[tokio::test]
async fn test_stop_restores_pre_call_route() {
    let (platform, manager) = setup();
    platform.routing.force_speakerphone(true);
    platform.volume.force_muted(true);

    manager.start(MediaType::Audio, true, "_DEFAULT_").await;
    wait_for_playing(&platform, &ringback_path()).await;
    // Ringback never plays on the speaker
    assert!(!platform.routing.speakerphone_on());

    manager.set_microphone_mute(false);
    assert!(!platform.volume.muted());

    manager.stop("").await;

    assert!(platform.routing.speakerphone_on());
    assert!(platform.volume.muted());
    let status = manager.status().await;
    assert!(!status.session_initialized);
    assert!(!status.ringback_playing);
    assert_eq!(status.force_speaker_on, 0);
}

#[tokio::test]
async fn test_video_call_without_tones() {
    let (platform, manager) = setup();

    manager.start(MediaType::Video, true, "").await;
    wait_for_session(&platform).await;

    let status = manager.status().await;
    assert!(status.session_initialized);
    assert_eq!(status.session_type, SessionType::VideoCall);
    assert_eq!(platform.sessions.last().unwrap().session_type(), SessionType::VideoCall);
    assert_eq!(platform.media.created_count(), 0);

    manager.stop("").await;

    let status = manager.status().await;
    assert!(!status.session_initialized);
    assert!(!status.session_active);
    assert_eq!(platform.media.created_count(), 0);
    assert!(platform.sessions.last().unwrap().is_destroyed());
}

#[tokio::test]
async fn test_session_created_after_stop_is_released() {
    let platform = MockPlatform::new();
    platform.sessions.set_delay(Duration::from_millis(100));
    let manager = setup_with(&platform);

    manager.start(MediaType::Audio, true, "").await;
    manager.stop("").await;
    assert!(!manager.status().await.session_initialized);

    wait_until(|| platform.sessions.created().len() == 1).await;
    let late = platform.sessions.last().unwrap();
    wait_until(|| late.is_destroyed()).await;
    assert_eq!(late.activation_count(), 0);
    assert!(!manager.status().await.session_active);
}

#[tokio::test]
async fn test_session_failure_degrades_silently() {
    let platform = MockPlatform::new();
    platform
        .sessions
        .fail_with(PlatformError::call("createAVSession", 6600101, "service error"));
    let manager = setup_with(&platform);

    manager.start(MediaType::Audio, true, "_DEFAULT_").await;
    wait_for_playing(&platform, &ringback_path()).await;

    let status = manager.status().await;
    assert!(status.session_initialized);
    assert!(!status.session_active);
    assert!(status.proximity_registered);
    assert!(platform.window.keep_screen_on());

    manager.stop("").await;
    assert!(!platform.window.keep_screen_on());
    assert!(!manager.status().await.proximity_registered);
}

#[tokio::test]
async fn test_remote_commands_become_media_buttons() {
    let (platform, manager) = setup();
    let mut events = manager.subscribe_simple();

    manager.start(MediaType::Audio, true, "").await;
    wait_for_session(&platform).await;
    let session = platform.sessions.last().unwrap();
    assert!(session.has_command_subscription());

    assert!(session.send_command(RemoteCommand::HangUp));
    assert_eq!(
        next_event(&mut events).await,
        InCallEvent::MediaButton {
            event_text: "HAND_UP".into(),
            event_code: 2087
        }
    );

    assert!(session.send_command(RemoteCommand::KeyEvent(2086)));
    assert_eq!(
        next_event(&mut events).await,
        InCallEvent::MediaButton {
            event_text: "KEYCODE_MEDIA_PAUSE".into(),
            event_code: 2086
        }
    );

    manager.stop("").await;
    assert!(!session.has_command_subscription());
}

#[tokio::test]
async fn test_headset_changes_while_in_call() {
    let (platform, manager) = setup();
    let mut events = manager.subscribe_simple();

    manager.start(MediaType::Audio, true, "").await;
    assert!(platform.routing.is_subscribed());
    assert!(manager.status().await.route_change_registered);

    platform.routing.push_device_change(DeviceChangeAction {
        change_type: DeviceChangeType::Connect,
        devices: vec![AudioDeviceDescriptor::new(DeviceType::WiredHeadset, "USB-C")],
    });
    assert_eq!(
        next_event(&mut events).await,
        InCallEvent::WiredHeadset {
            is_plugged: true,
            has_mic: true,
            device_name: "USB-C".into()
        }
    );

    platform.routing.push_device_change(DeviceChangeAction {
        change_type: DeviceChangeType::Disconnect,
        devices: vec![AudioDeviceDescriptor::new(DeviceType::WiredHeadset, "USB-C")],
    });
    assert!(matches!(
        next_event(&mut events).await,
        InCallEvent::WiredHeadset { is_plugged: false, .. }
    ));
    assert_eq!(next_event(&mut events).await, InCallEvent::NoisyAudio);

    manager.stop("").await;
    assert!(!platform.routing.is_subscribed());
    assert!(!platform.routing.push_device_change(DeviceChangeAction {
        change_type: DeviceChangeType::Connect,
        devices: Vec::new(),
    }));
}

#[tokio::test]
async fn test_shutdown_tears_down_active_call() {
    let (platform, manager) = setup();

    manager.start(MediaType::Audio, true, "_DEFAULT_").await;
    wait_for_session(&platform).await;
    manager.shutdown().await;

    let status = manager.status().await;
    assert!(!status.session_initialized);
    assert!(!status.proximity_registered);
    assert!(platform.sessions.last().unwrap().is_destroyed());
}
