//! Core value types shared by the manager, the tone players and the platform traits

use serde::{Deserialize, Serialize};
use std::fmt;

/// Media kind requested by the application when a call starts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    /// Voice-only call
    Audio,
    /// Call with a video stream
    Video,
}

impl MediaType {
    /// Parse the bridge string; anything but `"video"` is an audio call
    pub fn parse(value: &str) -> Self {
        if value == "video" {
            MediaType::Video
        } else {
            MediaType::Audio
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Audio => "audio",
            MediaType::Video => "video",
        }
    }
}

impl Default for MediaType {
    fn default() -> Self {
        MediaType::Audio
    }
}

/// Classification of the OS call-audio session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
    VoiceCall,
    VideoCall,
}

impl SessionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionType::VoiceCall => "voice_call",
            SessionType::VideoCall => "video_call",
        }
    }
}

impl From<MediaType> for SessionType {
    fn from(media: MediaType) -> Self {
        match media {
            MediaType::Video => SessionType::VideoCall,
            MediaType::Audio => SessionType::VoiceCall,
        }
    }
}

impl Default for SessionType {
    fn default() -> Self {
        SessionType::VoiceCall
    }
}

/// The three tone streams the manager owns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToneKind {
    Ringtone,
    Ringback,
    Busytone,
}

impl ToneKind {
    /// Parse the audio-type string used by `getAudioUriJS`
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ringtone" => Some(ToneKind::Ringtone),
            "ringback" => Some(ToneKind::Ringback),
            "busytone" => Some(ToneKind::Busytone),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ToneKind::Ringtone => "ringtone",
            ToneKind::Ringback => "ringback",
            ToneKind::Busytone => "busytone",
        }
    }
}

impl fmt::Display for ToneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a tone should be loaded from
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ToneSelector {
    /// Packaged default file for the tone kind
    Default,
    /// App-bundled override, falling back to the default
    Bundle,
    /// DTMF source; never used for ringback or busytone
    Dtmf,
    /// Anything else: system file at the conventional location
    System(String),
}

impl ToneSelector {
    pub const DEFAULT: &'static str = "_DEFAULT_";
    pub const BUNDLE: &'static str = "_BUNDLE_";
    pub const DTMF: &'static str = "_DTMF_";

    /// Parse a selector; the empty string selects the default source
    pub fn parse(value: &str) -> Self {
        match value {
            "" | Self::DEFAULT => ToneSelector::Default,
            Self::BUNDLE => ToneSelector::Bundle,
            Self::DTMF => ToneSelector::Dtmf,
            other => ToneSelector::System(other.to_string()),
        }
    }

    /// Map the DTMF source onto the default one
    pub fn without_dtmf(self) -> Self {
        match self {
            ToneSelector::Dtmf => ToneSelector::Default,
            other => other,
        }
    }
}

impl fmt::Display for ToneSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToneSelector::Default => f.write_str(Self::DEFAULT),
            ToneSelector::Bundle => f.write_str(Self::BUNDLE),
            ToneSelector::Dtmf => f.write_str(Self::DTMF),
            ToneSelector::System(value) => f.write_str(value),
        }
    }
}

/// Ringtone playback category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayCategory {
    /// Keep playing when the app is backgrounded
    Playback,
    Default,
}

impl PlayCategory {
    pub fn parse(value: &str) -> Self {
        if value == "playback" {
            PlayCategory::Playback
        } else {
            PlayCategory::Default
        }
    }
}

/// Device ringer mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RingerMode {
    Silent,
    Vibrate,
    Normal,
}

/// Audio device classes the manager cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceType {
    Earpiece,
    Speaker,
    WiredHeadset,
    WiredHeadphones,
    BluetoothSco,
    BluetoothA2dp,
    Mic,
    UsbHeadset,
    Unknown,
}

/// One routed audio device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioDeviceDescriptor {
    pub device_type: DeviceType,
    pub name: String,
}

impl AudioDeviceDescriptor {
    pub fn new(device_type: DeviceType, name: impl Into<String>) -> Self {
        Self {
            device_type,
            name: name.into(),
        }
    }
}

/// Direction of a device-change notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceChangeType {
    Connect,
    Disconnect,
}

/// Device-change notification from the routing manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceChangeAction {
    pub change_type: DeviceChangeType,
    pub devices: Vec<AudioDeviceDescriptor>,
}

/// Content type hint passed to the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Unknown,
    Speech,
    Music,
    Movie,
    Sonification,
}

/// Stream usage passed to the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamUsage {
    Unknown,
    Media,
    VoiceCommunication,
    Ringtone,
}

/// Renderer configuration applied when a player becomes initialized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderInfo {
    pub content: ContentType,
    pub usage: StreamUsage,
    pub renderer_flags: u32,
}

impl RenderInfo {
    pub fn new(content: ContentType, usage: StreamUsage) -> Self {
        Self {
            content,
            usage,
            renderer_flags: 0,
        }
    }

    /// Ringtone rendering: music content, ringtone usage
    pub fn ringtone() -> Self {
        Self::new(ContentType::Music, StreamUsage::Ringtone)
    }

    /// Busytone rendering: sonification content, voice-communication usage
    pub fn busytone() -> Self {
        Self::new(ContentType::Sonification, StreamUsage::VoiceCommunication)
    }
}

/// How a player shares audio focus with other streams
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptMode {
    Share,
    Independent,
}

/// Whether the focus system already applied the interruption
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptForceType {
    Force,
    Share,
}

/// Interruption hint from the audio-focus arbitration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterruptHint {
    None,
    Resume,
    Pause,
    Stop,
    Duck,
    Unduck,
}

impl InterruptHint {
    /// Numeric hint code relayed to the application
    pub fn code(&self) -> i32 {
        match self {
            InterruptHint::None => 0,
            InterruptHint::Resume => 1,
            InterruptHint::Pause => 2,
            InterruptHint::Stop => 3,
            InterruptHint::Duck => 4,
            InterruptHint::Unduck => 5,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InterruptHint::None => "INTERRUPT_HINT_NONE",
            InterruptHint::Resume => "INTERRUPT_HINT_RESUME",
            InterruptHint::Pause => "INTERRUPT_HINT_PAUSE",
            InterruptHint::Stop => "INTERRUPT_HINT_STOP",
            InterruptHint::Duck => "INTERRUPT_HINT_DUCK",
            InterruptHint::Unduck => "INTERRUPT_HINT_UNDUCK",
        }
    }
}

/// Interruption delivered by the media engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterruptEvent {
    pub force_type: InterruptForceType,
    pub hint: InterruptHint,
}

/// Media player lifecycle state as reported by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerState {
    Idle,
    Initialized,
    Prepared,
    Playing,
    Paused,
    Completed,
    Stopped,
    Released,
    Error,
}

impl PlayerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerState::Idle => "idle",
            PlayerState::Initialized => "initialized",
            PlayerState::Prepared => "prepared",
            PlayerState::Playing => "playing",
            PlayerState::Paused => "paused",
            PlayerState::Completed => "completed",
            PlayerState::Stopped => "stopped",
            PlayerState::Released => "released",
            PlayerState::Error => "error",
        }
    }

    /// States from which the engine accepts `stop()`
    pub fn is_stoppable(&self) -> bool {
        matches!(
            self,
            PlayerState::Prepared | PlayerState::Playing | PlayerState::Paused | PlayerState::Completed
        )
    }
}

impl fmt::Display for PlayerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Camera torch mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TorchMode {
    Off,
    On,
}

/// Background running modes requested by the keep-alive task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackgroundMode {
    AudioPlayback,
    AudioRecording,
}

impl BackgroundMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackgroundMode::AudioPlayback => "audioPlayback",
            BackgroundMode::AudioRecording => "audioRecording",
        }
    }
}

/// Proximity sensor sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProximityReading {
    /// Distance reported by the sensor; `0` means an object is near
    pub distance: f32,
}

impl ProximityReading {
    pub fn is_near(&self) -> bool {
        self.distance == 0.0
    }
}

/// Raw file descriptor of a playable tone file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToneSource {
    pub fd: i32,
    pub offset: i64,
    pub length: i64,
    /// Filesystem location backing the descriptor, empty when unknown
    pub path: String,
}

impl ToneSource {
    pub fn new(fd: i32, offset: i64, length: i64, path: impl Into<String>) -> Self {
        Self {
            fd,
            offset,
            length,
            path: path.into(),
        }
    }

    /// A descriptor is only usable when the resource manager handed out a real fd
    pub fn is_valid(&self) -> bool {
        self.fd > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_parsing() {
        assert_eq!(ToneSelector::parse(""), ToneSelector::Default);
        assert_eq!(ToneSelector::parse("_DEFAULT_"), ToneSelector::Default);
        assert_eq!(ToneSelector::parse("_BUNDLE_"), ToneSelector::Bundle);
        assert_eq!(ToneSelector::parse("_DTMF_"), ToneSelector::Dtmf);
        assert_eq!(
            ToneSelector::parse("ringback_custom"),
            ToneSelector::System("ringback_custom".to_string())
        );
        assert_eq!(ToneSelector::Dtmf.without_dtmf(), ToneSelector::Default);
        assert_eq!(ToneSelector::Bundle.without_dtmf(), ToneSelector::Bundle);
    }

    #[test]
    fn test_media_type_maps_to_session_type() {
        assert_eq!(SessionType::from(MediaType::parse("video")), SessionType::VideoCall);
        assert_eq!(SessionType::from(MediaType::parse("audio")), SessionType::VoiceCall);
        assert_eq!(SessionType::from(MediaType::parse("anything")), SessionType::VoiceCall);
    }

    #[test]
    fn test_tone_kind_parse() {
        assert_eq!(ToneKind::parse("busytone"), Some(ToneKind::Busytone));
        assert_eq!(ToneKind::parse("dialtone"), None);
    }

    #[test]
    fn test_stoppable_states() {
        assert!(PlayerState::Playing.is_stoppable());
        assert!(PlayerState::Completed.is_stoppable());
        assert!(!PlayerState::Initialized.is_stoppable());
        assert!(!PlayerState::Stopped.is_stoppable());
    }

    #[test]
    fn test_proximity_near_only_at_zero() {
        assert!(ProximityReading { distance: 0.0 }.is_near());
        assert!(!ProximityReading { distance: 5.0 }.is_near());
    }
}
