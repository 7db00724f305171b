//! In-call manager
//!
//! [`InCallManager`] coordinates the call-audio session lifecycle, the three
//! tone streams, proximity-driven screen control and the pre-call route
//! snapshot. It owns a single event loop task:
//!
//! ```text
//!   platform services ──PlatformEvent──┐
//!   tone players ──────ToneCompleted───┼──▶ event loop ──▶ state (Mutex) ──▶ InCallEvent
//!   session creation ──InternalEvent───┘
//! ```
//!
//! Public operations and the event loop take the same state lock, so all
//! state transitions run one at a time. Completion order between independent
//! asynchronous operations (session creation, tone preparation) is not
//! assumed.
//!
//! ```rust,no_run
//! use incall_core::{InCallConfig, InCallManager, MediaType};
//! use incall_core::platform::mock::MockPlatform;
//!
//! # async fn example() -> incall_core::InCallResult<()> {
//! let platform = MockPlatform::new();
//! let manager = InCallManager::new(InCallConfig::default(), platform.services())?;
//!
//! let mut events = manager.subscribe_simple();
//! manager.start(MediaType::Audio, true, "_DEFAULT_").await;
//! // ... call is up, ringback is playing
//! manager.stop("_BUNDLE_").await;
//!
//! while let Some(event) = events.next().await {
//!     println!("{} {}", event.name(), event.payload());
//! }
//! # Ok(())
//! # }
//! ```

mod device;
mod proximity;
mod session;
mod tones;

use dashmap::DashMap;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info};

use crate::config::InCallConfig;
use crate::error::{InCallResult, PlatformResult};
use crate::events::{EventEmitter, EventIterator, EventStream};
use crate::keepalive::BackgroundKeepAlive;
use crate::platform::{CallAudioSession, PlatformEvent, PlatformEventSender, PlatformServices};
use crate::route::{AudioRouteSnapshot, RouteInspector};
use crate::tone::{ToneCompleted, ToneCompletedSender, TonePlayer, ToneResolver};
use crate::types::{MediaType, SessionType, ToneKind};

/// Notifications produced by the manager's own tasks
enum InternalEvent {
    SessionCreated {
        generation: u64,
        result: PlatformResult<Arc<dyn CallAudioSession>>,
    },
    Shutdown,
}

/// Proximity sensor registration
#[derive(Debug, Default, Clone, Copy)]
struct ProximityState {
    registered: bool,
    is_near: bool,
    /// Screen lock taken by `start_proximity_sensor`, released by its stop
    lock_engaged: bool,
}

/// Mutable controller state, guarded by one lock
struct ManagerState {
    initialized: bool,
    media: MediaType,
    session_type: SessionType,
    session: Option<Arc<dyn CallAudioSession>>,
    /// Generation of the session creation still in flight
    pending_session: Option<u64>,
    force_speaker_on: i32,
    snapshot: AudioRouteSnapshot,
    ringtone: Option<TonePlayer>,
    ringback: Option<TonePlayer>,
    busytone: Option<TonePlayer>,
    proximity: ProximityState,
    route_change_registered: bool,
}

impl Default for ManagerState {
    fn default() -> Self {
        Self {
            initialized: false,
            media: MediaType::Audio,
            session_type: SessionType::VoiceCall,
            session: None,
            pending_session: None,
            force_speaker_on: 0,
            snapshot: AudioRouteSnapshot::default(),
            ringtone: None,
            ringback: None,
            busytone: None,
            proximity: ProximityState::default(),
            route_change_registered: false,
        }
    }
}

fn tone_playing(tone: &Option<TonePlayer>) -> bool {
    tone.as_ref().map_or(false, |t| t.is_playing())
}

/// Observable manager state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManagerStatus {
    pub session_initialized: bool,
    pub media: MediaType,
    pub session_type: SessionType,
    /// An OS session handle is held
    pub session_active: bool,
    pub force_speaker_on: i32,
    pub route_snapshot_stored: bool,
    pub proximity_registered: bool,
    pub proximity_near: bool,
    pub route_change_registered: bool,
    pub ringtone_playing: bool,
    pub ringback_playing: bool,
    pub busytone_playing: bool,
}

/// Call-audio session controller
pub struct InCallManager {
    config: InCallConfig,
    services: PlatformServices,
    route: RouteInspector,
    resolver: ToneResolver,
    keep_alive: BackgroundKeepAlive,
    events: EventEmitter,
    state: Mutex<ManagerState>,
    platform_tx: PlatformEventSender,
    internal_tx: mpsc::UnboundedSender<InternalEvent>,
    completion_tx: ToneCompletedSender,
    next_id: AtomicU64,
    uri_cache: DashMap<(ToneKind, String), String>,
}

impl InCallManager {
    /// Create the manager and spawn its event loop
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(config: InCallConfig, services: PlatformServices) -> InCallResult<Arc<Self>> {
        config.validate()?;

        let (platform_tx, platform_rx) = mpsc::unbounded_channel();
        let (internal_tx, internal_rx) = mpsc::unbounded_channel();
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();

        let manager = Arc::new(Self {
            route: RouteInspector::new(services.routing.clone()),
            resolver: ToneResolver::new(services.resources.clone(), config.tones.clone()),
            keep_alive: BackgroundKeepAlive::new(
                services.background.clone(),
                config.keep_alive_update_delay(),
            ),
            events: EventEmitter::new(config.event_channel_capacity),
            state: Mutex::new(ManagerState::default()),
            platform_tx,
            internal_tx,
            completion_tx,
            next_id: AtomicU64::new(1),
            uri_cache: DashMap::new(),
            config,
            services,
        });

        tokio::spawn(run_event_loop(
            Arc::downgrade(&manager),
            platform_rx,
            internal_rx,
            completion_rx,
        ));

        info!("in-call manager created");
        Ok(manager)
    }

    /// Subscribe to application events
    pub fn subscribe(&self) -> EventStream {
        self.events.subscribe()
    }

    /// Subscribe without needing `StreamExt`
    pub fn subscribe_simple(&self) -> EventIterator {
        self.events.subscribe_simple()
    }

    pub fn config(&self) -> &InCallConfig {
        &self.config
    }

    pub async fn status(&self) -> ManagerStatus {
        let state = self.state.lock().await;
        ManagerStatus {
            session_initialized: state.initialized,
            media: state.media,
            session_type: state.session_type,
            session_active: state.session.is_some(),
            force_speaker_on: state.force_speaker_on,
            route_snapshot_stored: state.snapshot.captured,
            proximity_registered: state.proximity.registered,
            proximity_near: state.proximity.is_near,
            route_change_registered: state.route_change_registered,
            ringtone_playing: tone_playing(&state.ringtone),
            ringback_playing: tone_playing(&state.ringback),
            busytone_playing: tone_playing(&state.busytone),
        }
    }

    /// Tear everything down and end the event loop
    pub async fn shutdown(&self) {
        {
            let mut state = self.state.lock().await;
            self.stop_locked(&mut state, "").await;
            self.stop_ringtone_locked(&mut state).await;
            self.stop_proximity_sensor_locked(&mut state);
        }
        let _ = self.internal_tx.send(InternalEvent::Shutdown);
        info!("in-call manager shut down");
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    fn new_tone(&self, kind: ToneKind, notify_completion: bool) -> TonePlayer {
        let on_complete = notify_completion.then(|| self.completion_tx.clone());
        TonePlayer::new(
            kind,
            self.next_id(),
            self.services.media.clone(),
            self.events.clone(),
            on_complete,
        )
    }

    async fn handle_platform_event(&self, event: PlatformEvent) {
        match event {
            PlatformEvent::Proximity(reading) => self.on_proximity(reading).await,
            PlatformEvent::DeviceChange(action) => self.on_device_change(action).await,
            PlatformEvent::RemoteCommand(command) => self.on_remote_command(command),
        }
    }

    async fn on_tone_completed(&self, completed: ToneCompleted) {
        let mut state = self.state.lock().await;
        let current = state.busytone.as_ref().map(|tone| tone.id());
        if completed.kind == ToneKind::Busytone && current == Some(completed.id) {
            info!("busytone finished, completing teardown");
            self.stop_locked(&mut state, "").await;
        } else {
            debug!(kind = %completed.kind, id = completed.id, "ignore stale tone completion");
        }
    }
}

impl Drop for InCallManager {
    fn drop(&mut self) {
        let _ = self.internal_tx.send(InternalEvent::Shutdown);
    }
}

async fn run_event_loop(
    manager: Weak<InCallManager>,
    mut platform_rx: mpsc::UnboundedReceiver<PlatformEvent>,
    mut internal_rx: mpsc::UnboundedReceiver<InternalEvent>,
    mut completion_rx: mpsc::UnboundedReceiver<ToneCompleted>,
) {
    debug!("event loop started");
    loop {
        tokio::select! {
            Some(event) = platform_rx.recv() => {
                let Some(manager) = manager.upgrade() else { break };
                manager.handle_platform_event(event).await;
            }
            Some(completed) = completion_rx.recv() => {
                let Some(manager) = manager.upgrade() else { break };
                manager.on_tone_completed(completed).await;
            }
            Some(internal) = internal_rx.recv() => match internal {
                InternalEvent::SessionCreated { generation, result } => {
                    let Some(manager) = manager.upgrade() else { break };
                    manager.on_session_created(generation, result).await;
                }
                InternalEvent::Shutdown => break,
            },
            else => break,
        }
    }
    debug!("event loop finished");
}
