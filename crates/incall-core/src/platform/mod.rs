//! Platform collaborator interfaces
//!
//! Every OS service the manager talks to sits behind one trait here. The
//! manager never calls an OS API directly; a host binding implements these
//! traits and hands them over once through [`PlatformServicesBuilder`].
//!
//! ```text
//! ┌─────────────────────┐    ┌──────────────────────┐    ┌─────────────────────┐
//! │   InCallManager     │    │  PlatformServices    │    │   OS services       │
//! │                     │    │                      │    │                     │
//! │ start()/stop()      │───▶│ AudioSessionService  │───▶│ session manager     │
//! │ start_ringback()    │    │ MediaEngine          │    │ media player        │
//! │ proximity / screen  │    │ RoutingCapability    │    │ routing manager     │
//! │                     │◀───│ PlatformEvent (mpsc) │◀───│ sensors, key events │
//! └─────────────────────┘    └──────────────────────┘    └─────────────────────┘
//! ```
//!
//! Capabilities that are not supplied at composition time are filled in with
//! [`UnsupportedPlatform`], which answers with neutral values or
//! [`PlatformError::Unsupported`](crate::error::PlatformError::Unsupported).
//! The manager therefore never checks for a missing service at call time.

use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::error::PlatformResult;
use crate::media_keys::RemoteCommand;
use crate::types::{
    AudioDeviceDescriptor, BackgroundMode, DeviceChangeAction, InterruptEvent, InterruptMode,
    PlayerState, ProximityReading, RenderInfo, RingerMode, SessionType, ToneSource, TorchMode,
};

pub mod mock;
pub mod unsupported;

pub use unsupported::UnsupportedPlatform;

/// Asynchronous notification from an OS service
#[derive(Debug, Clone, PartialEq)]
pub enum PlatformEvent {
    /// Proximity sensor sample
    Proximity(ProximityReading),
    /// Audio device connected or disconnected
    DeviceChange(DeviceChangeAction),
    /// Remote-control command from the call-audio session
    RemoteCommand(RemoteCommand),
}

/// Channel the services push [`PlatformEvent`]s into
pub type PlatformEventSender = mpsc::UnboundedSender<PlatformEvent>;

/// Notification from a media player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerEvent {
    StateChange(PlayerState),
    Interrupt(InterruptEvent),
}

pub type PlayerEventSender = mpsc::UnboundedSender<PlayerEvent>;
pub type PlayerEventReceiver = mpsc::UnboundedReceiver<PlayerEvent>;

/// Creates OS call-audio sessions
#[async_trait::async_trait]
pub trait AudioSessionService: Send + Sync {
    /// Create a session of the given type; resolves asynchronously
    async fn create_session(&self, session_type: SessionType) -> PlatformResult<Arc<dyn CallAudioSession>>;
}

/// OS call-audio session handle
#[async_trait::async_trait]
pub trait CallAudioSession: Send + Sync + fmt::Debug {
    fn session_type(&self) -> SessionType;

    async fn activate(&self) -> PlatformResult<()>;

    async fn deactivate(&self) -> PlatformResult<()>;

    /// Release the OS handle; the session is unusable afterwards
    async fn destroy(&self) -> PlatformResult<()>;

    /// Forward every remote-control command to `sender`
    fn subscribe_commands(&self, sender: PlatformEventSender) -> PlatformResult<()>;

    fn unsubscribe_commands(&self);
}

/// Audio routing manager
pub trait RoutingCapability: Send + Sync {
    fn is_speakerphone_on(&self) -> PlatformResult<bool>;

    fn set_speakerphone_on(&self, enable: bool) -> PlatformResult<()>;

    /// Preferred output devices for voice-communication rendering
    fn preferred_output_devices(&self) -> PlatformResult<Vec<AudioDeviceDescriptor>>;

    /// Preferred input devices for voice-communication capture
    fn preferred_input_devices(&self) -> PlatformResult<Vec<AudioDeviceDescriptor>>;

    fn subscribe_device_changes(&self, sender: PlatformEventSender) -> PlatformResult<()>;

    fn unsubscribe_device_changes(&self);
}

/// Volume group manager
pub trait VolumeCapability: Send + Sync {
    fn ringer_mode(&self) -> PlatformResult<RingerMode>;

    fn is_microphone_muted(&self) -> PlatformResult<bool>;

    fn set_microphone_mute(&self, mute: bool) -> PlatformResult<()>;
}

/// Proximity sensor subscription
pub trait ProximitySensor: Send + Sync {
    fn subscribe(&self, sender: PlatformEventSender) -> PlatformResult<()>;

    fn unsubscribe(&self) -> PlatformResult<()>;
}

/// Proximity screen-control running lock
pub trait ScreenLock: Send + Sync {
    fn is_supported(&self) -> bool;

    fn is_holding(&self) -> bool;

    /// Hold the lock; `0` holds until [`ScreenLock::unhold`]
    fn hold(&self, timeout_ms: u64) -> PlatformResult<()>;

    fn unhold(&self) -> PlatformResult<()>;
}

/// Application window control
pub trait WindowControl: Send + Sync {
    fn set_keep_screen_on(&self, enable: bool) -> PlatformResult<()>;
}

/// Camera flash control
pub trait TorchControl: Send + Sync {
    fn is_torch_mode_supported(&self, mode: TorchMode) -> PlatformResult<bool>;

    fn set_torch_mode(&self, mode: TorchMode) -> PlatformResult<()>;
}

/// Background-task keep-alive service
#[async_trait::async_trait]
pub trait BackgroundTaskService: Send + Sync {
    async fn start_running(&self, modes: &[BackgroundMode]) -> PlatformResult<()>;

    async fn update_running(&self, modes: &[BackgroundMode]) -> PlatformResult<()>;

    async fn stop_running(&self) -> PlatformResult<()>;
}

/// Raw-file lookup in the application resources
pub trait ToneSourceProvider: Send + Sync {
    /// Open a raw file; an invalid descriptor (fd <= 0) means not found
    fn open_raw(&self, path: &str) -> PlatformResult<ToneSource>;

    /// Directory holding the application resources
    fn resource_dir(&self) -> String;
}

/// Factory for media players
#[async_trait::async_trait]
pub trait MediaEngine: Send + Sync {
    /// Create a player together with its state/interruption event channel
    async fn create_player(&self) -> PlatformResult<(Arc<dyn MediaPlayer>, PlayerEventReceiver)>;
}

/// One media player instance
///
/// State changes are reported through the [`PlayerEventReceiver`] returned by
/// [`MediaEngine::create_player`], not by the return values of these calls.
#[async_trait::async_trait]
pub trait MediaPlayer: Send + Sync + fmt::Debug {
    fn state(&self) -> PlayerState;

    /// Assign the source; the engine answers with `Initialized`
    fn set_source(&self, source: ToneSource) -> PlatformResult<()>;

    fn set_render_info(&self, info: RenderInfo) -> PlatformResult<()>;

    fn set_loop(&self, looping: bool) -> PlatformResult<()>;

    fn set_interrupt_mode(&self, mode: InterruptMode) -> PlatformResult<()>;

    async fn prepare(&self) -> PlatformResult<()>;

    async fn play(&self) -> PlatformResult<()>;

    async fn pause(&self) -> PlatformResult<()>;

    async fn stop(&self) -> PlatformResult<()>;

    async fn release(&self) -> PlatformResult<()>;
}

/// All collaborators the manager needs, assembled once
#[derive(Clone)]
pub struct PlatformServices {
    pub sessions: Arc<dyn AudioSessionService>,
    pub routing: Arc<dyn RoutingCapability>,
    pub volume: Arc<dyn VolumeCapability>,
    pub proximity: Arc<dyn ProximitySensor>,
    pub screen_lock: Arc<dyn ScreenLock>,
    pub window: Arc<dyn WindowControl>,
    pub torch: Arc<dyn TorchControl>,
    pub background: Arc<dyn BackgroundTaskService>,
    pub resources: Arc<dyn ToneSourceProvider>,
    pub media: Arc<dyn MediaEngine>,
    missing: Vec<&'static str>,
}

impl PlatformServices {
    pub fn builder() -> PlatformServicesBuilder {
        PlatformServicesBuilder::default()
    }

    /// Capabilities that were not supplied and run on [`UnsupportedPlatform`]
    pub fn missing_capabilities(&self) -> &[&'static str] {
        &self.missing
    }
}

impl fmt::Debug for PlatformServices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlatformServices")
            .field("missing", &self.missing)
            .finish()
    }
}

/// Builder for [`PlatformServices`]
#[derive(Default)]
pub struct PlatformServicesBuilder {
    sessions: Option<Arc<dyn AudioSessionService>>,
    routing: Option<Arc<dyn RoutingCapability>>,
    volume: Option<Arc<dyn VolumeCapability>>,
    proximity: Option<Arc<dyn ProximitySensor>>,
    screen_lock: Option<Arc<dyn ScreenLock>>,
    window: Option<Arc<dyn WindowControl>>,
    torch: Option<Arc<dyn TorchControl>>,
    background: Option<Arc<dyn BackgroundTaskService>>,
    resources: Option<Arc<dyn ToneSourceProvider>>,
    media: Option<Arc<dyn MediaEngine>>,
}

impl PlatformServicesBuilder {
    pub fn sessions(mut self, sessions: Arc<dyn AudioSessionService>) -> Self {
        self.sessions = Some(sessions);
        self
    }

    pub fn routing(mut self, routing: Arc<dyn RoutingCapability>) -> Self {
        self.routing = Some(routing);
        self
    }

    pub fn volume(mut self, volume: Arc<dyn VolumeCapability>) -> Self {
        self.volume = Some(volume);
        self
    }

    pub fn proximity(mut self, proximity: Arc<dyn ProximitySensor>) -> Self {
        self.proximity = Some(proximity);
        self
    }

    pub fn screen_lock(mut self, screen_lock: Arc<dyn ScreenLock>) -> Self {
        self.screen_lock = Some(screen_lock);
        self
    }

    pub fn window(mut self, window: Arc<dyn WindowControl>) -> Self {
        self.window = Some(window);
        self
    }

    pub fn torch(mut self, torch: Arc<dyn TorchControl>) -> Self {
        self.torch = Some(torch);
        self
    }

    pub fn background(mut self, background: Arc<dyn BackgroundTaskService>) -> Self {
        self.background = Some(background);
        self
    }

    pub fn resources(mut self, resources: Arc<dyn ToneSourceProvider>) -> Self {
        self.resources = Some(resources);
        self
    }

    pub fn media(mut self, media: Arc<dyn MediaEngine>) -> Self {
        self.media = Some(media);
        self
    }

    /// Fill every missing capability with [`UnsupportedPlatform`]
    pub fn build(self) -> PlatformServices {
        let fallback = Arc::new(UnsupportedPlatform);
        let mut missing = Vec::new();

        macro_rules! resolve {
            ($field:expr, $name:literal) => {
                match $field {
                    Some(service) => service,
                    None => {
                        missing.push($name);
                        fallback.clone()
                    }
                }
            };
        }

        let services = PlatformServices {
            sessions: resolve!(self.sessions, "sessions"),
            routing: resolve!(self.routing, "routing"),
            volume: resolve!(self.volume, "volume"),
            proximity: resolve!(self.proximity, "proximity"),
            screen_lock: resolve!(self.screen_lock, "screen_lock"),
            window: resolve!(self.window, "window"),
            torch: resolve!(self.torch, "torch"),
            background: resolve!(self.background, "background"),
            resources: resolve!(self.resources, "resources"),
            media: resolve!(self.media, "media"),
            missing,
        };

        if !services.missing.is_empty() {
            tracing::info!(
                missing = ?services.missing,
                "platform capabilities not supplied, running without them"
            );
        }
        services
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_builder_marks_everything_missing() {
        let services = PlatformServices::builder().build();
        assert_eq!(services.missing_capabilities().len(), 10);
        assert!(services.missing_capabilities().contains(&"routing"));
        assert!(!services.screen_lock.is_supported());
    }

    #[test]
    fn test_supplied_capability_is_not_missing() {
        let platform = mock::MockPlatform::new();
        let services = PlatformServices::builder()
            .routing(platform.routing.clone())
            .build();
        assert!(!services.missing_capabilities().contains(&"routing"));
        assert!(services.missing_capabilities().contains(&"volume"));
    }
}
