//! Null capability used for services a host binding does not provide

use std::sync::Arc;

use super::{
    AudioSessionService, BackgroundTaskService, CallAudioSession, MediaEngine, MediaPlayer,
    PlatformEventSender, PlayerEventReceiver, ProximitySensor, RoutingCapability, ScreenLock,
    ToneSourceProvider, TorchControl, VolumeCapability, WindowControl,
};
use crate::error::{PlatformError, PlatformResult};
use crate::types::{AudioDeviceDescriptor, BackgroundMode, RingerMode, SessionType, ToneSource, TorchMode};

/// Answers every query with a neutral value and every action with
/// [`PlatformError::Unsupported`]
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedPlatform;

#[async_trait::async_trait]
impl AudioSessionService for UnsupportedPlatform {
    async fn create_session(&self, _session_type: SessionType) -> PlatformResult<Arc<dyn CallAudioSession>> {
        Err(PlatformError::unsupported("createAVSession"))
    }
}

impl RoutingCapability for UnsupportedPlatform {
    fn is_speakerphone_on(&self) -> PlatformResult<bool> {
        Ok(false)
    }

    fn set_speakerphone_on(&self, _enable: bool) -> PlatformResult<()> {
        Err(PlatformError::unsupported("setCommunicationDevice"))
    }

    fn preferred_output_devices(&self) -> PlatformResult<Vec<AudioDeviceDescriptor>> {
        Ok(Vec::new())
    }

    fn preferred_input_devices(&self) -> PlatformResult<Vec<AudioDeviceDescriptor>> {
        Ok(Vec::new())
    }

    fn subscribe_device_changes(&self, _sender: PlatformEventSender) -> PlatformResult<()> {
        Err(PlatformError::unsupported("on deviceChange"))
    }

    fn unsubscribe_device_changes(&self) {}
}

impl VolumeCapability for UnsupportedPlatform {
    fn ringer_mode(&self) -> PlatformResult<RingerMode> {
        Ok(RingerMode::Normal)
    }

    fn is_microphone_muted(&self) -> PlatformResult<bool> {
        Ok(false)
    }

    fn set_microphone_mute(&self, _mute: bool) -> PlatformResult<()> {
        Err(PlatformError::unsupported("setMicrophoneMute"))
    }
}

impl ProximitySensor for UnsupportedPlatform {
    fn subscribe(&self, _sender: PlatformEventSender) -> PlatformResult<()> {
        Err(PlatformError::unsupported("sensor.on(PROXIMITY)"))
    }

    fn unsubscribe(&self) -> PlatformResult<()> {
        Ok(())
    }
}

impl ScreenLock for UnsupportedPlatform {
    fn is_supported(&self) -> bool {
        false
    }

    fn is_holding(&self) -> bool {
        false
    }

    fn hold(&self, _timeout_ms: u64) -> PlatformResult<()> {
        Err(PlatformError::unsupported("runningLock.hold"))
    }

    fn unhold(&self) -> PlatformResult<()> {
        Ok(())
    }
}

impl WindowControl for UnsupportedPlatform {
    fn set_keep_screen_on(&self, _enable: bool) -> PlatformResult<()> {
        Err(PlatformError::unsupported("setWindowKeepScreenOn"))
    }
}

impl TorchControl for UnsupportedPlatform {
    fn is_torch_mode_supported(&self, _mode: TorchMode) -> PlatformResult<bool> {
        Ok(false)
    }

    fn set_torch_mode(&self, _mode: TorchMode) -> PlatformResult<()> {
        Err(PlatformError::unsupported("setTorchMode"))
    }
}

#[async_trait::async_trait]
impl BackgroundTaskService for UnsupportedPlatform {
    async fn start_running(&self, _modes: &[BackgroundMode]) -> PlatformResult<()> {
        Err(PlatformError::unsupported("startBackgroundRunning"))
    }

    async fn update_running(&self, _modes: &[BackgroundMode]) -> PlatformResult<()> {
        Err(PlatformError::unsupported("updateBackgroundRunning"))
    }

    async fn stop_running(&self) -> PlatformResult<()> {
        Ok(())
    }
}

impl ToneSourceProvider for UnsupportedPlatform {
    fn open_raw(&self, path: &str) -> PlatformResult<ToneSource> {
        Ok(ToneSource::new(0, 0, 0, path))
    }

    fn resource_dir(&self) -> String {
        String::new()
    }
}

#[async_trait::async_trait]
impl MediaEngine for UnsupportedPlatform {
    async fn create_player(&self) -> PlatformResult<(Arc<dyn MediaPlayer>, PlayerEventReceiver)> {
        Err(PlatformError::unsupported("createAVPlayer"))
    }
}
