//! Device controls, route queries and the operations this platform rejects

use tracing::{debug, error, warn};

use super::InCallManager;
use crate::error::{InCallError, InCallResult};
use crate::types::{ToneKind, ToneSelector, TorchMode};

impl InCallManager {
    pub fn is_wired_headset_plugged_in(&self) -> bool {
        self.route.is_wired_headset_plugged_in()
    }

    /// Switch the camera torch
    pub fn set_flash_on(&self, enable: bool) {
        let mode = if enable { TorchMode::On } else { TorchMode::Off };
        let torch = &self.services.torch;
        match torch.is_torch_mode_supported(mode) {
            Ok(true) => {
                if let Err(e) = torch.set_torch_mode(mode) {
                    error!(code = e.code(), "setFlashOn failed: {}", e);
                }
            }
            Ok(false) => error!("setFlashOn is not supported on this device"),
            Err(e) => error!(code = e.code(), "setFlashOn failed: {}", e),
        }
    }

    pub fn set_keep_screen_on(&self, enable: bool) {
        if let Err(e) = self.services.window.set_keep_screen_on(enable) {
            error!(code = e.code(), "setKeepScreenOn failed: {}", e);
        }
    }

    pub fn set_speakerphone_on(&self, enable: bool) {
        self.apply_speakerphone(enable);
    }

    /// Pin the route: 1 speaker, -1 earpiece, 0 default
    ///
    /// Values outside that range are ignored.
    pub async fn set_force_speakerphone_on(&self, flag: i32) {
        if !(-1..=1).contains(&flag) {
            warn!(flag, "setForceSpeakerphoneOn ignored, flag out of range");
            return;
        }
        let mut state = self.state.lock().await;
        state.force_speaker_on = flag;
        self.apply_speakerphone(flag == 1);
    }

    pub fn set_microphone_mute(&self, enable: bool) {
        self.apply_microphone_mute(enable);
    }

    /// Location of a tone file, `None` when it cannot be resolved
    ///
    /// Resolved locations are cached per audio type and file type.
    pub fn get_audio_uri(&self, audio_type: &str, file_type: &str) -> Option<String> {
        let kind = ToneKind::parse(audio_type)?;
        let key = (kind, file_type.to_string());
        if let Some(cached) = self.uri_cache.get(&key) {
            return Some(cached.value().clone());
        }

        let files = self.config.tones.for_kind(kind);
        let file = if file_type == ToneSelector::BUNDLE {
            &files.bundle
        } else {
            &files.default
        };
        let file_path = format!("{}{}", self.config.rawfile_prefix, file.file_name());

        let source = self.resolver.resolve(kind, &ToneSelector::parse(file_type))?;
        if source.path.is_empty() {
            debug!(audio_type, file_type, "tone descriptor has no location");
            return None;
        }
        let uri = format!("{}{}", source.path, file_path);
        self.uri_cache.insert(key, uri.clone());
        Some(uri)
    }

    pub fn choose_audio_route(&self, route: &str) -> InCallResult<String> {
        error!(route, "not support chooseAudioRoute");
        Err(InCallError::unsupported("chooseAudioRoute"))
    }

    pub fn request_audio_focus(&self) -> InCallResult<String> {
        Err(InCallError::unsupported("requestAudioFocus"))
    }

    pub fn abandon_audio_focus(&self) -> InCallResult<String> {
        Err(InCallError::unsupported("abandonAudioFocus"))
    }

    /// Switch the speaker only when it differs from the current state
    pub(super) fn apply_speakerphone(&self, enable: bool) {
        let routing = &self.services.routing;
        match routing.is_speakerphone_on() {
            Ok(current) if current == enable => return,
            Ok(_) => {}
            Err(e) => {
                error!(code = e.code(), "isSpeakerphoneOn failed: {}", e);
                return;
            }
        }
        if let Err(e) = routing.set_speakerphone_on(enable) {
            error!(code = e.code(), enable, "setSpeakerphoneOn failed: {}", e);
        }
    }

    /// Toggle microphone mute only when it differs from the current state
    pub(super) fn apply_microphone_mute(&self, mute: bool) {
        let volume = &self.services.volume;
        match volume.is_microphone_muted() {
            Ok(current) if current == mute => return,
            Ok(_) => {}
            Err(e) => {
                error!(code = e.code(), "isMicrophoneMute failed: {}", e);
                return;
            }
        }
        if let Err(e) = volume.set_microphone_mute(mute) {
            error!(code = e.code(), mute, "setMicrophoneMute failed: {}", e);
        }
    }
}
