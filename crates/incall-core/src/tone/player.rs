//! One tone stream on top of a media player
//!
//! A [`TonePlayer`] owns at most one underlying [`MediaPlayer`]. After
//! [`TonePlayer::prepare`] assigns a source, a driver task follows the
//! engine's state changes:
//!
//! ```text
//! initialized ──▶ set render info, prepare()
//! prepared    ──▶ set loop + share mode, play()
//! completed   ──▶ notify completion, replay when looping
//! paused      ──▶ re-apply interrupt mode
//! stopped     ──▶ notify completion, release
//! error       ──▶ notify completion, release
//! ```
//!
//! Interruption hints drive pause/resume/stop and are relayed to the
//! application as `onAudioFocusChange`. Engine failures are logged and never
//! returned.

use parking_lot::Mutex;
use std::ops::ControlFlow;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::events::{EventEmitter, InCallEvent};
use crate::platform::{MediaEngine, MediaPlayer, PlayerEvent, PlayerEventReceiver};
use crate::types::{
    InterruptEvent, InterruptForceType, InterruptHint, InterruptMode, PlayerState, RenderInfo,
    ToneKind, ToneSource,
};

/// A tone reached its end, stopped or failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToneCompleted {
    pub kind: ToneKind,
    /// Identity of the [`TonePlayer`] that finished
    pub id: u64,
}

pub type ToneCompletedSender = mpsc::UnboundedSender<ToneCompleted>;

/// Player handle and driver task, shared with the driver for self-release
#[derive(Default)]
struct PlayerSlot {
    player: Mutex<Option<Arc<dyn MediaPlayer>>>,
    driver: Mutex<Option<JoinHandle<()>>>,
}

impl PlayerSlot {
    /// Stop if needed, then release; failures are logged
    async fn release_player(kind: ToneKind, player: Arc<dyn MediaPlayer>) {
        if player.state().is_stoppable() {
            if let Err(e) = player.stop().await {
                error!(%kind, code = e.code(), "stop player failed: {}", e);
            }
        }
        if let Err(e) = player.release().await {
            error!(%kind, code = e.code(), "release player failed: {}", e);
        }
    }
}

/// Playback of one tone kind
pub struct TonePlayer {
    kind: ToneKind,
    id: u64,
    media: Arc<dyn MediaEngine>,
    events: EventEmitter,
    on_complete: Option<ToneCompletedSender>,
    slot: Arc<PlayerSlot>,
}

impl TonePlayer {
    pub fn new(
        kind: ToneKind,
        id: u64,
        media: Arc<dyn MediaEngine>,
        events: EventEmitter,
        on_complete: Option<ToneCompletedSender>,
    ) -> Self {
        Self {
            kind,
            id,
            media,
            events,
            on_complete,
            slot: Arc::new(PlayerSlot::default()),
        }
    }

    pub fn kind(&self) -> ToneKind {
        self.kind
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Replace any current player with a fresh one playing `source`
    ///
    /// Returns false when no player could be set up; playback itself
    /// continues asynchronously.
    pub async fn prepare(&self, source: ToneSource, render: RenderInfo, looping: bool) -> bool {
        info!(kind = %self.kind, fd = source.fd, "create player");
        self.release().await;

        let (player, receiver) = match self.media.create_player().await {
            Ok(created) => created,
            Err(e) => {
                error!(kind = %self.kind, code = e.code(), "create player failed: {}", e);
                return false;
            }
        };

        *self.slot.player.lock() = Some(player.clone());
        let driver = PlayerDriver {
            kind: self.kind,
            id: self.id,
            player: player.clone(),
            render,
            looping,
            events: self.events.clone(),
            on_complete: self.on_complete.clone(),
            slot: self.slot.clone(),
        };
        *self.slot.driver.lock() = Some(tokio::spawn(driver.run(receiver)));

        if let Err(e) = player.set_source(source) {
            error!(kind = %self.kind, code = e.code(), "assign source failed: {}", e);
            self.release().await;
            return false;
        }
        true
    }

    /// True only while the engine reports `playing`
    pub fn is_playing(&self) -> bool {
        self.state() == Some(PlayerState::Playing)
    }

    /// Engine state, `None` once released
    pub fn state(&self) -> Option<PlayerState> {
        self.slot.player.lock().as_ref().map(|player| player.state())
    }

    /// Stop and release the player; no-op when there is none
    pub async fn release(&self) {
        let player = self.slot.player.lock().take();
        let driver = self.slot.driver.lock().take();
        let Some(player) = player else {
            // The driver owns an in-flight self-release, let it finish
            return;
        };
        if let Some(driver) = driver {
            driver.abort();
        }
        debug!(kind = %self.kind, "release player");
        PlayerSlot::release_player(self.kind, player).await;
    }
}

impl Drop for TonePlayer {
    fn drop(&mut self) {
        if let Some(driver) = self.slot.driver.lock().take() {
            driver.abort();
        }
    }
}

/// Task reacting to one player's state changes and interruptions
struct PlayerDriver {
    kind: ToneKind,
    id: u64,
    player: Arc<dyn MediaPlayer>,
    render: RenderInfo,
    looping: bool,
    events: EventEmitter,
    on_complete: Option<ToneCompletedSender>,
    slot: Arc<PlayerSlot>,
}

impl PlayerDriver {
    async fn run(self, mut receiver: PlayerEventReceiver) {
        while let Some(event) = receiver.recv().await {
            match event {
                PlayerEvent::StateChange(state) => {
                    if self.on_state_change(state).await.is_break() {
                        break;
                    }
                }
                PlayerEvent::Interrupt(interrupt) => self.on_interrupt(interrupt).await,
            }
        }
        debug!(kind = %self.kind, "player driver finished");
    }

    async fn on_state_change(&self, state: PlayerState) -> ControlFlow<()> {
        info!(kind = %self.kind, %state, "player state change");
        match state {
            PlayerState::Initialized => {
                self.log_failure("set render info", self.player.set_render_info(self.render));
                self.log_failure("prepare", self.player.prepare().await);
            }
            PlayerState::Prepared => {
                self.log_failure("set loop", self.player.set_loop(self.looping));
                self.log_failure("set interrupt mode", self.player.set_interrupt_mode(InterruptMode::Share));
                self.log_failure("play", self.player.play().await);
            }
            PlayerState::Completed => {
                self.notify_complete();
                self.log_failure("set interrupt mode", self.player.set_interrupt_mode(InterruptMode::Share));
                if self.looping {
                    self.log_failure("play", self.player.play().await);
                }
            }
            PlayerState::Paused => {
                self.log_failure("set interrupt mode", self.player.set_interrupt_mode(InterruptMode::Share));
            }
            PlayerState::Stopped | PlayerState::Error => {
                self.notify_complete();
                self.release_self().await;
                return ControlFlow::Break(());
            }
            PlayerState::Released => return ControlFlow::Break(()),
            PlayerState::Idle | PlayerState::Playing => {}
        }
        ControlFlow::Continue(())
    }

    async fn on_interrupt(&self, interrupt: InterruptEvent) {
        use InterruptForceType::{Force, Share};

        let hint = interrupt.hint;
        let text = match (interrupt.force_type, hint) {
            (_, InterruptHint::Pause) => {
                self.pause().await;
                hint.as_str()
            }
            (_, InterruptHint::Resume) => {
                self.resume().await;
                hint.as_str()
            }
            (Force, InterruptHint::Stop) => {
                self.stop().await;
                hint.as_str()
            }
            (Force, _) | (Share, InterruptHint::None) => hint.as_str(),
            (Share, _) => "",
        };

        self.events.emit(InCallEvent::AudioFocusChange {
            event_text: text.to_string(),
            event_code: hint.code(),
        });
    }

    async fn pause(&self) {
        if self.player.state() == PlayerState::Playing {
            self.log_failure("pause", self.player.pause().await);
        } else {
            debug!(kind = %self.kind, "ignore pause");
        }
    }

    async fn resume(&self) {
        match self.player.state() {
            PlayerState::Stopped | PlayerState::Initialized => {
                self.log_failure("prepare", self.player.prepare().await);
            }
            PlayerState::Paused | PlayerState::Completed | PlayerState::Prepared => {
                self.log_failure("play", self.player.play().await);
            }
            _ => debug!(kind = %self.kind, "ignore resume"),
        }
    }

    async fn stop(&self) {
        if self.player.state().is_stoppable() {
            self.log_failure("stop", self.player.stop().await);
        } else {
            debug!(kind = %self.kind, "ignore stop");
        }
    }

    fn notify_complete(&self) {
        if let Some(on_complete) = &self.on_complete {
            let _ = on_complete.send(ToneCompleted {
                kind: self.kind,
                id: self.id,
            });
        }
    }

    async fn release_self(&self) {
        let player = self.slot.player.lock().take();
        // Detach our own handle instead of aborting ourselves
        drop(self.slot.driver.lock().take());
        if let Some(player) = player {
            PlayerSlot::release_player(self.kind, player).await;
        }
    }

    fn log_failure(&self, operation: &str, result: crate::error::PlatformResult<()>) {
        if let Err(e) = result {
            error!(kind = %self.kind, code = e.code(), "{} failed: {}", operation, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::mock::MockMediaEngine;
    use crate::types::{ContentType, StreamUsage};
    use std::time::Duration;

    async fn settle<F: Fn() -> bool>(condition: F) {
        for _ in 0..100 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not reached");
    }

    fn source() -> ToneSource {
        ToneSource::new(42, 0, 1024, "/proc/self/fd/42")
    }

    #[tokio::test]
    async fn test_prepare_drives_player_to_playing() {
        let engine = Arc::new(MockMediaEngine::default());
        let tone = TonePlayer::new(ToneKind::Ringback, 1, engine.clone(), EventEmitter::default(), None);

        let render = RenderInfo::new(ContentType::Speech, StreamUsage::VoiceCommunication);
        assert!(tone.prepare(source(), render, true).await);
        settle(|| tone.is_playing()).await;

        let player = engine.last_player().unwrap();
        assert_eq!(player.render_info(), Some(render));
        assert!(player.is_looping());
        assert_eq!(player.interrupt_mode(), Some(InterruptMode::Share));

        tone.release().await;
        assert_eq!(tone.state(), None);
        assert_eq!(player.state(), PlayerState::Released);
    }

    #[tokio::test]
    async fn test_completion_notifies_and_loops() {
        let engine = Arc::new(MockMediaEngine::default());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let tone = TonePlayer::new(ToneKind::Ringtone, 7, engine.clone(), EventEmitter::default(), Some(tx));

        tone.prepare(source(), RenderInfo::ringtone(), true).await;
        settle(|| tone.is_playing()).await;

        let player = engine.last_player().unwrap();
        player.finish();
        let completed = rx.recv().await.unwrap();
        assert_eq!(completed, ToneCompleted { kind: ToneKind::Ringtone, id: 7 });
        settle(|| player.play_count() == 2).await;
        assert!(tone.is_playing());
    }

    #[tokio::test]
    async fn test_engine_error_releases_player() {
        let engine = Arc::new(MockMediaEngine::default());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let tone = TonePlayer::new(ToneKind::Busytone, 3, engine.clone(), EventEmitter::default(), Some(tx));

        tone.prepare(source(), RenderInfo::busytone(), false).await;
        settle(|| tone.is_playing()).await;

        engine.last_player().unwrap().fail();
        assert_eq!(rx.recv().await.map(|c| c.id), Some(3));
        settle(|| tone.state().is_none()).await;
        assert!(!tone.is_playing());
    }

    #[tokio::test]
    async fn test_interrupt_pause_resume_relayed() {
        let engine = Arc::new(MockMediaEngine::default());
        let emitter = EventEmitter::default();
        let mut events = emitter.subscribe_simple();
        let tone = TonePlayer::new(ToneKind::Ringback, 1, engine.clone(), emitter, None);

        tone.prepare(source(), RenderInfo::ringtone(), true).await;
        settle(|| tone.is_playing()).await;
        let player = engine.last_player().unwrap();

        player.interrupt(InterruptForceType::Force, InterruptHint::Pause);
        assert_eq!(
            events.next().await,
            Some(InCallEvent::AudioFocusChange {
                event_text: "INTERRUPT_HINT_PAUSE".into(),
                event_code: 2
            })
        );
        assert_eq!(player.state(), PlayerState::Paused);

        player.interrupt(InterruptForceType::Share, InterruptHint::Resume);
        events.next().await;
        settle(|| tone.is_playing()).await;

        player.interrupt(InterruptForceType::Share, InterruptHint::Duck);
        assert_eq!(
            events.next().await,
            Some(InCallEvent::AudioFocusChange {
                event_text: String::new(),
                event_code: 4
            })
        );
        assert!(tone.is_playing());
    }

    #[tokio::test]
    async fn test_create_failure_reports_false() {
        let engine = Arc::new(MockMediaEngine::default());
        engine.set_fail_create(true);
        let tone = TonePlayer::new(ToneKind::Ringtone, 1, engine, EventEmitter::default(), None);

        assert!(!tone.prepare(source(), RenderInfo::ringtone(), true).await);
        assert!(!tone.is_playing());
        tone.release().await;
    }
}
