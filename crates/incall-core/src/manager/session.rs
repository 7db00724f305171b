//! Session lifecycle: start, two-phase stop, session notifications

use std::sync::Arc;
use tracing::{debug, error, info};

use super::{InCallManager, InternalEvent, ManagerState};
use crate::error::PlatformResult;
use crate::events::InCallEvent;
use crate::media_keys::RemoteCommand;
use crate::platform::CallAudioSession;
use crate::route::headset_events;
use crate::types::{DeviceChangeAction, MediaType, SessionType};

impl InCallManager {
    /// Begin a call
    ///
    /// No-op when a session is already initialized. Session creation runs in
    /// the background; its failure is logged and everything that does not
    /// need the session keeps working. A non-empty `ringback` selector starts
    /// the ringback tone.
    pub async fn start(&self, media: MediaType, auto: bool, ringback: &str) {
        let mut state = self.state.lock().await;
        if state.initialized {
            debug!("start ignored, session already initialized");
            return;
        }

        if super::tone_playing(&state.ringtone) {
            info!("stop ringtone");
            self.stop_ringtone_locked(&mut state).await;
        }

        state.media = media;
        state.session_type = SessionType::from(media);
        if state.session.is_none() {
            self.request_session(&mut state);
        }

        state
            .snapshot
            .capture(self.services.routing.as_ref(), self.services.volume.as_ref());
        state.force_speaker_on = 0;
        self.start_session_notifications(&mut state);

        if !ringback.is_empty() {
            self.start_ringback_locked(&mut state, ringback).await;
        }
        state.initialized = true;
        info!(media = media.as_str(), auto, ringback, "call audio session started");
    }

    /// End a call
    ///
    /// No-op when no session is initialized. Ringback always stops. When
    /// `busytone` is non-empty and a busytone starts, teardown is deferred
    /// until that tone finishes, which calls `stop("")` again. Otherwise
    /// the route snapshot is restored and the session released.
    pub async fn stop(&self, busytone: &str) {
        let mut state = self.state.lock().await;
        self.stop_locked(&mut state, busytone).await;
    }

    pub(super) async fn stop_locked(&self, state: &mut ManagerState, busytone: &str) {
        if !state.initialized {
            debug!("stop ignored, no session initialized");
            return;
        }

        self.stop_ringback_locked(state).await;
        if !busytone.is_empty() && self.start_busytone_locked(state, busytone).await {
            info!(busytone, "busytone playing, teardown deferred");
            return;
        }

        // Force off first so the restored pre-call values are what remains
        self.apply_speakerphone(false);
        self.apply_microphone_mute(false);
        if let Some((speaker, muted)) = state.snapshot.take() {
            self.apply_speakerphone(speaker);
            self.apply_microphone_mute(muted);
        }

        self.stop_busytone_locked(state).await;
        self.stop_session_notifications(state);

        state.pending_session = None;
        if let Some(session) = state.session.take() {
            release_session(session).await;
        }
        state.force_speaker_on = 0;
        state.initialized = false;
        info!("call audio session stopped");
    }

    fn request_session(&self, state: &mut ManagerState) {
        let generation = self.next_id();
        state.pending_session = Some(generation);

        let sessions = self.services.sessions.clone();
        let session_type = state.session_type;
        let internal_tx = self.internal_tx.clone();
        tokio::spawn(async move {
            let result = sessions.create_session(session_type).await;
            let _ = internal_tx.send(InternalEvent::SessionCreated { generation, result });
        });
        debug!(session_type = session_type.as_str(), generation, "requested call audio session");
    }

    pub(super) async fn on_session_created(
        &self,
        generation: u64,
        result: PlatformResult<Arc<dyn CallAudioSession>>,
    ) {
        let mut state = self.state.lock().await;
        let wanted = state.initialized
            && state.session.is_none()
            && state.pending_session == Some(generation);

        let session = match result {
            Ok(session) => session,
            Err(e) => {
                if state.pending_session == Some(generation) {
                    state.pending_session = None;
                }
                error!(code = e.code(), "create call audio session failed: {}", e);
                return;
            }
        };

        if !wanted {
            info!(generation, "discarding call audio session created after stop");
            release_session(session).await;
            return;
        }

        state.pending_session = None;
        if let Err(e) = session.subscribe_commands(self.platform_tx.clone()) {
            error!(code = e.code(), "subscribe session commands failed: {}", e);
        }
        if let Err(e) = session.activate().await {
            error!(code = e.code(), "activate call audio session failed: {}", e);
        }
        info!(session_type = session.session_type().as_str(), "call audio session active");
        state.session = Some(session);
    }

    fn start_session_notifications(&self, state: &mut ManagerState) {
        self.start_route_change_notification(state);
        self.start_proximity_sensor_locked(state);
        self.set_keep_screen_on(true);
    }

    fn stop_session_notifications(&self, state: &mut ManagerState) {
        if let Some(session) = &state.session {
            session.unsubscribe_commands();
        }
        self.stop_route_change_notification(state);
        self.stop_proximity_sensor_locked(state);
        self.set_keep_screen_on(false);
        self.turn_screen_on();
    }

    fn start_route_change_notification(&self, state: &mut ManagerState) {
        if state.route_change_registered {
            return;
        }
        match self
            .services
            .routing
            .subscribe_device_changes(self.platform_tx.clone())
        {
            Ok(()) => state.route_change_registered = true,
            Err(e) => error!(code = e.code(), "subscribe device changes failed: {}", e),
        }
    }

    fn stop_route_change_notification(&self, state: &mut ManagerState) {
        if !state.route_change_registered {
            return;
        }
        self.services.routing.unsubscribe_device_changes();
        state.route_change_registered = false;
    }

    pub(super) async fn on_device_change(&self, action: DeviceChangeAction) {
        let state = self.state.lock().await;
        if !state.route_change_registered {
            debug!("device change after unsubscribe ignored");
            return;
        }
        for event in headset_events(&action) {
            self.events.emit(event);
        }
    }

    pub(super) fn on_remote_command(&self, command: RemoteCommand) {
        let key = command.to_media_key();
        debug!(?command, text = key.text, code = key.code, "media button");
        self.events.emit(InCallEvent::MediaButton {
            event_text: key.text.to_string(),
            event_code: key.code,
        });
    }
}

/// Deactivate then destroy; failures are logged
async fn release_session(session: Arc<dyn CallAudioSession>) {
    session.unsubscribe_commands();
    if let Err(e) = session.deactivate().await {
        error!(code = e.code(), "deactivate call audio session failed: {}", e);
    }
    if let Err(e) = session.destroy().await {
        error!(code = e.code(), "destroy call audio session failed: {}", e);
    }
}
