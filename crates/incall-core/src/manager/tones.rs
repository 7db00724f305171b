//! Ringtone, ringback and busytone operations

use tracing::{debug, error, info};

use super::{tone_playing, InCallManager, ManagerState};
use crate::types::{
    ContentType, PlayCategory, RenderInfo, RingerMode, SessionType, StreamUsage, ToneKind,
    ToneSelector,
};

impl InCallManager {
    /// Play the incoming-call ringtone, looped
    ///
    /// Skipped while the ringer is silent. The `playback` category also keeps
    /// the process alive in the background.
    pub async fn start_ringtone(&self, selector: &str, category: &str) {
        let mut state = self.state.lock().await;
        if let Some(ringtone) = &state.ringtone {
            if ringtone.is_playing() {
                info!("startRingtone is already playing");
                return;
            }
            self.stop_ringtone_locked(&mut state).await;
        }

        match self.services.volume.ringer_mode() {
            Ok(RingerMode::Silent) => {
                debug!("startRingtone: ringer is silent, leave without play");
                return;
            }
            Ok(_) => {}
            Err(e) => error!(code = e.code(), "get ringer mode failed: {}", e),
        }

        let selector = ToneSelector::parse(selector);
        let Some(source) = self.resolver.resolve(ToneKind::Ringtone, &selector) else {
            info!(%selector, "startRingtone: no available media");
            return;
        };

        let ringtone = self.new_tone(ToneKind::Ringtone, false);
        ringtone.prepare(source, RenderInfo::ringtone(), true).await;
        state.ringtone = Some(ringtone);

        if PlayCategory::parse(category) == PlayCategory::Playback {
            self.keep_alive.start().await;
        }
    }

    pub async fn stop_ringtone(&self) {
        let mut state = self.state.lock().await;
        self.stop_ringtone_locked(&mut state).await;
    }

    pub(super) async fn stop_ringtone_locked(&self, state: &mut ManagerState) {
        self.keep_alive.stop().await;
        if let Some(ringtone) = state.ringtone.take() {
            ringtone.release().await;
        }
    }

    /// Play the ringback tone to the caller, looped, never on the speaker
    pub async fn start_ringback(&self, selector: &str) {
        let mut state = self.state.lock().await;
        self.start_ringback_locked(&mut state, selector).await;
    }

    pub(super) async fn start_ringback_locked(&self, state: &mut ManagerState, selector: &str) {
        if let Some(ringback) = &state.ringback {
            if ringback.is_playing() {
                info!("startRingback is already playing");
                return;
            }
            self.stop_ringback_locked(state).await;
        }

        let selector = ToneSelector::parse(selector).without_dtmf();
        let Some(source) = self.resolver.resolve(ToneKind::Ringback, &selector) else {
            info!(%selector, "startRingback: no available media");
            return;
        };

        let speech = self.route.is_earpiece() || state.session_type != SessionType::VideoCall;
        let content = if speech { ContentType::Speech } else { ContentType::Music };
        let render = RenderInfo::new(content, StreamUsage::VoiceCommunication);

        let ringback = self.new_tone(ToneKind::Ringback, false);
        ringback.prepare(source, render, true).await;
        state.ringback = Some(ringback);

        self.keep_alive.start().await;
        self.apply_speakerphone(false);
    }

    pub async fn stop_ringback(&self) {
        let mut state = self.state.lock().await;
        self.stop_ringback_locked(&mut state).await;
    }

    pub(super) async fn stop_ringback_locked(&self, state: &mut ManagerState) {
        self.keep_alive.stop().await;
        if let Some(ringback) = state.ringback.take() {
            ringback.release().await;
        }
    }

    /// Start a one-shot busytone; true only when a new one was set up
    pub(super) async fn start_busytone_locked(&self, state: &mut ManagerState, selector: &str) -> bool {
        if state.busytone.is_some() {
            if tone_playing(&state.busytone) {
                return false;
            }
            self.stop_busytone_locked(state).await;
        }

        let selector = ToneSelector::parse(selector).without_dtmf();
        let Some(source) = self.resolver.resolve(ToneKind::Busytone, &selector) else {
            info!(%selector, "startBusytone: no available media");
            return false;
        };

        let busytone = self.new_tone(ToneKind::Busytone, true);
        if !busytone.prepare(source, RenderInfo::busytone(), false).await {
            return false;
        }
        state.busytone = Some(busytone);
        true
    }

    pub(super) async fn stop_busytone_locked(&self, state: &mut ManagerState) {
        if let Some(busytone) = state.busytone.take() {
            busytone.release().await;
        }
    }
}
