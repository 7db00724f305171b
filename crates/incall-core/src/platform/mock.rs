//! In-memory platform for tests and simulation
//!
//! Every trait in [`crate::platform`] has a mock here that records what the
//! manager asked for and lets the caller inject OS-side behaviour: sensor
//! samples, device changes, remote commands, playback completion, focus
//! interruptions and failures.
//!
//! ```rust
//! use incall_core::platform::mock::MockPlatform;
//!
//! let platform = MockPlatform::new();
//! let services = platform.services();
//! assert!(services.missing_capabilities().is_empty());
//! ```

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use super::{
    AudioSessionService, BackgroundTaskService, CallAudioSession, MediaEngine, MediaPlayer,
    PlatformEvent, PlatformEventSender, PlatformServices, PlayerEvent, PlayerEventReceiver,
    PlayerEventSender, ProximitySensor, RoutingCapability, ScreenLock, ToneSourceProvider,
    TorchControl, VolumeCapability, WindowControl,
};
use crate::error::{PlatformError, PlatformResult};
use crate::media_keys::RemoteCommand;
use crate::types::{
    AudioDeviceDescriptor, BackgroundMode, DeviceChangeAction, DeviceType, InterruptEvent,
    InterruptForceType, InterruptHint, InterruptMode, PlayerState, ProximityReading, RenderInfo,
    RingerMode, SessionType, ToneSource, TorchMode,
};

/// Resource directory reported by [`MockResources`]
pub const MOCK_RESOURCE_DIR: &str = "/data/app/resources";

/// Complete mock platform
#[derive(Clone)]
pub struct MockPlatform {
    pub sessions: Arc<MockSessionService>,
    pub routing: Arc<MockRouting>,
    pub volume: Arc<MockVolume>,
    pub proximity: Arc<MockProximity>,
    pub screen_lock: Arc<MockScreenLock>,
    pub window: Arc<MockWindow>,
    pub torch: Arc<MockTorch>,
    pub background: Arc<MockBackground>,
    pub resources: Arc<MockResources>,
    pub media: Arc<MockMediaEngine>,
}

impl MockPlatform {
    /// Mock platform with the packaged default tones present
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(MockSessionService::default()),
            routing: Arc::new(MockRouting::new()),
            volume: Arc::new(MockVolume::new()),
            proximity: Arc::new(MockProximity::default()),
            screen_lock: Arc::new(MockScreenLock::new()),
            window: Arc::new(MockWindow::default()),
            torch: Arc::new(MockTorch::new()),
            background: Arc::new(MockBackground::default()),
            resources: Arc::new(MockResources::with_default_tones()),
            media: Arc::new(MockMediaEngine::default()),
        }
    }

    /// Assemble the services with every capability supplied
    pub fn services(&self) -> PlatformServices {
        PlatformServices::builder()
            .sessions(self.sessions.clone())
            .routing(self.routing.clone())
            .volume(self.volume.clone())
            .proximity(self.proximity.clone())
            .screen_lock(self.screen_lock.clone())
            .window(self.window.clone())
            .torch(self.torch.clone())
            .background(self.background.clone())
            .resources(self.resources.clone())
            .media(self.media.clone())
            .build()
    }
}

impl Default for MockPlatform {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Call-audio sessions
// ---------------------------------------------------------------------------

/// Session service that hands out [`MockCallSession`]s
#[derive(Default)]
pub struct MockSessionService {
    sessions: Mutex<Vec<Arc<MockCallSession>>>,
    failure: Mutex<Option<PlatformError>>,
    delay: Mutex<Option<Duration>>,
}

impl MockSessionService {
    /// Make every following creation fail with `error`
    pub fn fail_with(&self, error: PlatformError) {
        *self.failure.lock() = Some(error);
    }

    /// Delay creation completion, to reorder it against other callbacks
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }

    pub fn created(&self) -> Vec<Arc<MockCallSession>> {
        self.sessions.lock().clone()
    }

    pub fn last(&self) -> Option<Arc<MockCallSession>> {
        self.sessions.lock().last().cloned()
    }
}

#[async_trait::async_trait]
impl AudioSessionService for MockSessionService {
    async fn create_session(&self, session_type: SessionType) -> PlatformResult<Arc<dyn CallAudioSession>> {
        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = self.failure.lock().clone() {
            return Err(error);
        }
        let session = Arc::new(MockCallSession::new(session_type));
        self.sessions.lock().push(session.clone());
        Ok(session)
    }
}

/// Recorded call-audio session
#[derive(Debug)]
pub struct MockCallSession {
    session_type: SessionType,
    active: AtomicBool,
    destroyed: AtomicBool,
    activations: AtomicUsize,
    commands: Mutex<Option<PlatformEventSender>>,
}

impl MockCallSession {
    fn new(session_type: SessionType) -> Self {
        Self {
            session_type,
            active: AtomicBool::new(false),
            destroyed: AtomicBool::new(false),
            activations: AtomicUsize::new(0),
            commands: Mutex::new(None),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }

    pub fn activation_count(&self) -> usize {
        self.activations.load(Ordering::SeqCst)
    }

    pub fn has_command_subscription(&self) -> bool {
        self.commands.lock().is_some()
    }

    /// Deliver a remote-control command; false when nobody is subscribed
    pub fn send_command(&self, command: RemoteCommand) -> bool {
        match self.commands.lock().as_ref() {
            Some(sender) => sender.send(PlatformEvent::RemoteCommand(command)).is_ok(),
            None => false,
        }
    }
}

#[async_trait::async_trait]
impl CallAudioSession for MockCallSession {
    fn session_type(&self) -> SessionType {
        self.session_type
    }

    async fn activate(&self) -> PlatformResult<()> {
        if self.is_destroyed() {
            return Err(PlatformError::call("activate", 6600102, "session destroyed"));
        }
        self.active.store(true, Ordering::SeqCst);
        self.activations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn deactivate(&self) -> PlatformResult<()> {
        self.active.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn destroy(&self) -> PlatformResult<()> {
        self.active.store(false, Ordering::SeqCst);
        self.destroyed.store(true, Ordering::SeqCst);
        *self.commands.lock() = None;
        Ok(())
    }

    fn subscribe_commands(&self, sender: PlatformEventSender) -> PlatformResult<()> {
        *self.commands.lock() = Some(sender);
        Ok(())
    }

    fn unsubscribe_commands(&self) {
        *self.commands.lock() = None;
    }
}

// ---------------------------------------------------------------------------
// Routing and volume
// ---------------------------------------------------------------------------

/// Routing manager with a settable device list
pub struct MockRouting {
    speakerphone_on: AtomicBool,
    speaker_switch_supported: AtomicBool,
    outputs: Mutex<Vec<AudioDeviceDescriptor>>,
    inputs: Mutex<Vec<AudioDeviceDescriptor>>,
    device_changes: Mutex<Option<PlatformEventSender>>,
    speaker_requests: Mutex<Vec<bool>>,
    query_failure: Mutex<Option<PlatformError>>,
}

impl MockRouting {
    /// Routed to the earpiece with the built-in mic
    pub fn new() -> Self {
        Self {
            speakerphone_on: AtomicBool::new(false),
            speaker_switch_supported: AtomicBool::new(true),
            outputs: Mutex::new(vec![AudioDeviceDescriptor::new(DeviceType::Earpiece, "earpiece")]),
            inputs: Mutex::new(vec![AudioDeviceDescriptor::new(DeviceType::Mic, "mic")]),
            device_changes: Mutex::new(None),
            speaker_requests: Mutex::new(Vec::new()),
            query_failure: Mutex::new(None),
        }
    }

    pub fn set_outputs(&self, devices: Vec<AudioDeviceDescriptor>) {
        *self.outputs.lock() = devices;
    }

    pub fn set_inputs(&self, devices: Vec<AudioDeviceDescriptor>) {
        *self.inputs.lock() = devices;
    }

    /// Make device queries fail until cleared with `None`
    pub fn fail_queries(&self, error: Option<PlatformError>) {
        *self.query_failure.lock() = error;
    }

    pub fn set_speaker_switch_supported(&self, supported: bool) {
        self.speaker_switch_supported.store(supported, Ordering::SeqCst);
    }

    /// Set the speaker state without recording a request
    pub fn force_speakerphone(&self, on: bool) {
        self.speakerphone_on.store(on, Ordering::SeqCst);
    }

    pub fn speakerphone_on(&self) -> bool {
        self.speakerphone_on.load(Ordering::SeqCst)
    }

    /// Every effective speaker switch the manager requested
    pub fn speaker_requests(&self) -> Vec<bool> {
        self.speaker_requests.lock().clone()
    }

    pub fn is_subscribed(&self) -> bool {
        self.device_changes.lock().is_some()
    }

    /// Deliver a device change; false when nobody is subscribed
    pub fn push_device_change(&self, action: DeviceChangeAction) -> bool {
        match self.device_changes.lock().as_ref() {
            Some(sender) => sender.send(PlatformEvent::DeviceChange(action)).is_ok(),
            None => false,
        }
    }

    fn check_queries(&self) -> PlatformResult<()> {
        match self.query_failure.lock().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl Default for MockRouting {
    fn default() -> Self {
        Self::new()
    }
}

impl RoutingCapability for MockRouting {
    fn is_speakerphone_on(&self) -> PlatformResult<bool> {
        Ok(self.speakerphone_on())
    }

    fn set_speakerphone_on(&self, enable: bool) -> PlatformResult<()> {
        if !self.speaker_switch_supported.load(Ordering::SeqCst) {
            return Err(PlatformError::unsupported("setCommunicationDevice"));
        }
        self.speaker_requests.lock().push(enable);
        self.speakerphone_on.store(enable, Ordering::SeqCst);
        Ok(())
    }

    fn preferred_output_devices(&self) -> PlatformResult<Vec<AudioDeviceDescriptor>> {
        self.check_queries()?;
        Ok(self.outputs.lock().clone())
    }

    fn preferred_input_devices(&self) -> PlatformResult<Vec<AudioDeviceDescriptor>> {
        self.check_queries()?;
        Ok(self.inputs.lock().clone())
    }

    fn subscribe_device_changes(&self, sender: PlatformEventSender) -> PlatformResult<()> {
        *self.device_changes.lock() = Some(sender);
        Ok(())
    }

    fn unsubscribe_device_changes(&self) {
        *self.device_changes.lock() = None;
    }
}

/// Volume group manager
pub struct MockVolume {
    ringer: Mutex<RingerMode>,
    muted: AtomicBool,
    mute_supported: AtomicBool,
}

impl MockVolume {
    pub fn new() -> Self {
        Self {
            ringer: Mutex::new(RingerMode::Normal),
            muted: AtomicBool::new(false),
            mute_supported: AtomicBool::new(true),
        }
    }

    pub fn set_ringer_mode(&self, mode: RingerMode) {
        *self.ringer.lock() = mode;
    }

    pub fn set_mute_supported(&self, supported: bool) {
        self.mute_supported.store(supported, Ordering::SeqCst);
    }

    /// Set the mute state directly, as the user would
    pub fn force_muted(&self, muted: bool) {
        self.muted.store(muted, Ordering::SeqCst);
    }

    pub fn muted(&self) -> bool {
        self.muted.load(Ordering::SeqCst)
    }
}

impl Default for MockVolume {
    fn default() -> Self {
        Self::new()
    }
}

impl VolumeCapability for MockVolume {
    fn ringer_mode(&self) -> PlatformResult<RingerMode> {
        Ok(*self.ringer.lock())
    }

    fn is_microphone_muted(&self) -> PlatformResult<bool> {
        Ok(self.muted())
    }

    fn set_microphone_mute(&self, mute: bool) -> PlatformResult<()> {
        if !self.mute_supported.load(Ordering::SeqCst) {
            return Err(PlatformError::unsupported("setMicrophoneMute"));
        }
        self.muted.store(mute, Ordering::SeqCst);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Sensor, screen, window, torch
// ---------------------------------------------------------------------------

/// Proximity sensor
#[derive(Default)]
pub struct MockProximity {
    sender: Mutex<Option<PlatformEventSender>>,
    subscribe_failure: Mutex<Option<PlatformError>>,
    subscriptions: AtomicUsize,
}

impl MockProximity {
    pub fn fail_subscribe(&self, error: Option<PlatformError>) {
        *self.subscribe_failure.lock() = error;
    }

    pub fn is_subscribed(&self) -> bool {
        self.sender.lock().is_some()
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.load(Ordering::SeqCst)
    }

    /// Deliver a sample; false when nobody is subscribed
    pub fn send_distance(&self, distance: f32) -> bool {
        match self.sender.lock().as_ref() {
            Some(sender) => sender
                .send(PlatformEvent::Proximity(ProximityReading { distance }))
                .is_ok(),
            None => false,
        }
    }
}

impl ProximitySensor for MockProximity {
    fn subscribe(&self, sender: PlatformEventSender) -> PlatformResult<()> {
        if let Some(error) = self.subscribe_failure.lock().clone() {
            return Err(error);
        }
        self.subscriptions.fetch_add(1, Ordering::SeqCst);
        *self.sender.lock() = Some(sender);
        Ok(())
    }

    fn unsubscribe(&self) -> PlatformResult<()> {
        *self.sender.lock() = None;
        Ok(())
    }
}

/// Proximity running lock
pub struct MockScreenLock {
    supported: AtomicBool,
    holding: AtomicBool,
    holds: AtomicUsize,
}

impl MockScreenLock {
    pub fn new() -> Self {
        Self {
            supported: AtomicBool::new(true),
            holding: AtomicBool::new(false),
            holds: AtomicUsize::new(0),
        }
    }

    pub fn set_supported(&self, supported: bool) {
        self.supported.store(supported, Ordering::SeqCst);
    }

    pub fn hold_count(&self) -> usize {
        self.holds.load(Ordering::SeqCst)
    }
}

impl Default for MockScreenLock {
    fn default() -> Self {
        Self::new()
    }
}

impl ScreenLock for MockScreenLock {
    fn is_supported(&self) -> bool {
        self.supported.load(Ordering::SeqCst)
    }

    fn is_holding(&self) -> bool {
        self.holding.load(Ordering::SeqCst)
    }

    fn hold(&self, _timeout_ms: u64) -> PlatformResult<()> {
        if self.is_holding() {
            return Err(PlatformError::call("hold", 4900101, "lock already held"));
        }
        self.holding.store(true, Ordering::SeqCst);
        self.holds.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn unhold(&self) -> PlatformResult<()> {
        self.holding.store(false, Ordering::SeqCst);
        Ok(())
    }
}

/// Application window
#[derive(Default)]
pub struct MockWindow {
    keep_screen_on: AtomicBool,
    history: Mutex<Vec<bool>>,
}

impl MockWindow {
    pub fn keep_screen_on(&self) -> bool {
        self.keep_screen_on.load(Ordering::SeqCst)
    }

    pub fn history(&self) -> Vec<bool> {
        self.history.lock().clone()
    }
}

impl WindowControl for MockWindow {
    fn set_keep_screen_on(&self, enable: bool) -> PlatformResult<()> {
        self.keep_screen_on.store(enable, Ordering::SeqCst);
        self.history.lock().push(enable);
        Ok(())
    }
}

/// Camera torch
pub struct MockTorch {
    supported: AtomicBool,
    mode: Mutex<TorchMode>,
}

impl MockTorch {
    pub fn new() -> Self {
        Self {
            supported: AtomicBool::new(true),
            mode: Mutex::new(TorchMode::Off),
        }
    }

    pub fn set_supported(&self, supported: bool) {
        self.supported.store(supported, Ordering::SeqCst);
    }

    pub fn mode(&self) -> TorchMode {
        *self.mode.lock()
    }
}

impl Default for MockTorch {
    fn default() -> Self {
        Self::new()
    }
}

impl TorchControl for MockTorch {
    fn is_torch_mode_supported(&self, _mode: TorchMode) -> PlatformResult<bool> {
        Ok(self.supported.load(Ordering::SeqCst))
    }

    fn set_torch_mode(&self, mode: TorchMode) -> PlatformResult<()> {
        *self.mode.lock() = mode;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Background tasks and resources
// ---------------------------------------------------------------------------

/// Background-task manager
#[derive(Default)]
pub struct MockBackground {
    running: AtomicBool,
    modes: Mutex<Vec<BackgroundMode>>,
    starts: AtomicUsize,
    updates: AtomicUsize,
    stops: AtomicUsize,
}

impl MockBackground {
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn modes(&self) -> Vec<BackgroundMode> {
        self.modes.lock().clone()
    }

    pub fn start_count(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl BackgroundTaskService for MockBackground {
    async fn start_running(&self, modes: &[BackgroundMode]) -> PlatformResult<()> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        self.running.store(true, Ordering::SeqCst);
        *self.modes.lock() = modes.to_vec();
        Ok(())
    }

    async fn update_running(&self, modes: &[BackgroundMode]) -> PlatformResult<()> {
        if !self.is_running() {
            return Err(PlatformError::call("updateBackgroundRunning", 9800005, "not running"));
        }
        self.updates.fetch_add(1, Ordering::SeqCst);
        *self.modes.lock() = modes.to_vec();
        Ok(())
    }

    async fn stop_running(&self) -> PlatformResult<()> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        self.running.store(false, Ordering::SeqCst);
        self.modes.lock().clear();
        Ok(())
    }
}

/// Raw-file resources keyed by path
pub struct MockResources {
    files: Mutex<HashMap<String, ToneSource>>,
    next_fd: AtomicI32,
}

impl MockResources {
    pub fn empty() -> Self {
        Self {
            files: Mutex::new(HashMap::new()),
            next_fd: AtomicI32::new(100),
        }
    }

    /// Resources holding the packaged default tones at their lookup paths
    pub fn with_default_tones() -> Self {
        let resources = Self::empty();
        resources.add_file("incallmanager_ringtone.mp3");
        resources.add_file(&format!("{}/incallmanager_ringback.mp3", MOCK_RESOURCE_DIR));
        resources.add_file(&format!("{}/incallmanager_busytone.mp3", MOCK_RESOURCE_DIR));
        resources
    }

    /// Register a file and return the descriptor it will open with
    pub fn add_file(&self, path: &str) -> ToneSource {
        let fd = self.next_fd.fetch_add(1, Ordering::SeqCst);
        let source = ToneSource::new(fd, 0, 4096, format!("/proc/self/fd/{}", fd));
        self.files.lock().insert(path.to_string(), source.clone());
        source
    }

    pub fn remove_file(&self, path: &str) {
        self.files.lock().remove(path);
    }

    pub fn clear(&self) {
        self.files.lock().clear();
    }

    /// Descriptor registered for `path`, if any
    pub fn source_for(&self, path: &str) -> Option<ToneSource> {
        self.files.lock().get(path).cloned()
    }
}

impl ToneSourceProvider for MockResources {
    fn open_raw(&self, path: &str) -> PlatformResult<ToneSource> {
        match self.files.lock().get(path) {
            Some(source) => Ok(source.clone()),
            None => Err(PlatformError::call("getRawFdSync", 9001005, format!("{} not found", path))),
        }
    }

    fn resource_dir(&self) -> String {
        MOCK_RESOURCE_DIR.to_string()
    }
}

// ---------------------------------------------------------------------------
// Media engine
// ---------------------------------------------------------------------------

/// Media engine creating [`MockMediaPlayer`]s
#[derive(Default)]
pub struct MockMediaEngine {
    players: Mutex<Vec<Arc<MockMediaPlayer>>>,
    fail_create: AtomicBool,
}

impl MockMediaEngine {
    pub fn set_fail_create(&self, fail: bool) {
        self.fail_create.store(fail, Ordering::SeqCst);
    }

    pub fn created_count(&self) -> usize {
        self.players.lock().len()
    }

    pub fn players(&self) -> Vec<Arc<MockMediaPlayer>> {
        self.players.lock().clone()
    }

    pub fn last_player(&self) -> Option<Arc<MockMediaPlayer>> {
        self.players.lock().last().cloned()
    }

    /// Most recent player whose source is `source`
    pub fn player_for(&self, source: &ToneSource) -> Option<Arc<MockMediaPlayer>> {
        self.players
            .lock()
            .iter()
            .rev()
            .find(|player| player.source().as_ref() == Some(source))
            .cloned()
    }
}

#[async_trait::async_trait]
impl MediaEngine for MockMediaEngine {
    async fn create_player(&self) -> PlatformResult<(Arc<dyn MediaPlayer>, PlayerEventReceiver)> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(PlatformError::call("createAVPlayer", 5400101, "no memory"));
        }
        let (tx, rx) = mpsc::unbounded_channel();
        let player = Arc::new(MockMediaPlayer::new(self.created_count(), tx));
        self.players.lock().push(player.clone());
        Ok((player, rx))
    }
}

/// Media player following the engine's state machine
#[derive(Debug)]
pub struct MockMediaPlayer {
    id: usize,
    state: Mutex<PlayerState>,
    events: PlayerEventSender,
    source: Mutex<Option<ToneSource>>,
    render_info: Mutex<Option<RenderInfo>>,
    looping: AtomicBool,
    interrupt_mode: Mutex<Option<InterruptMode>>,
    plays: AtomicUsize,
    pauses: AtomicUsize,
}

impl MockMediaPlayer {
    fn new(id: usize, events: PlayerEventSender) -> Self {
        Self {
            id,
            state: Mutex::new(PlayerState::Idle),
            events,
            source: Mutex::new(None),
            render_info: Mutex::new(None),
            looping: AtomicBool::new(false),
            interrupt_mode: Mutex::new(None),
            plays: AtomicUsize::new(0),
            pauses: AtomicUsize::new(0),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn source(&self) -> Option<ToneSource> {
        self.source.lock().clone()
    }

    pub fn render_info(&self) -> Option<RenderInfo> {
        *self.render_info.lock()
    }

    pub fn is_looping(&self) -> bool {
        self.looping.load(Ordering::SeqCst)
    }

    pub fn interrupt_mode(&self) -> Option<InterruptMode> {
        *self.interrupt_mode.lock()
    }

    pub fn play_count(&self) -> usize {
        self.plays.load(Ordering::SeqCst)
    }

    pub fn pause_count(&self) -> usize {
        self.pauses.load(Ordering::SeqCst)
    }

    /// Reach the end of the file
    pub fn finish(&self) {
        if self.state() == PlayerState::Playing {
            self.transition(PlayerState::Completed);
        }
    }

    /// Report an engine error
    pub fn fail(&self) {
        self.transition(PlayerState::Error);
    }

    /// Deliver an audio-focus interruption
    pub fn interrupt(&self, force_type: InterruptForceType, hint: InterruptHint) {
        let _ = self
            .events
            .send(PlayerEvent::Interrupt(InterruptEvent { force_type, hint }));
    }

    fn transition(&self, next: PlayerState) {
        *self.state.lock() = next;
        let _ = self.events.send(PlayerEvent::StateChange(next));
    }

    fn invalid(&self, operation: &str) -> PlatformError {
        PlatformError::call(
            operation,
            5400102,
            format!("operation not allowed in state {}", self.state()),
        )
    }
}

#[async_trait::async_trait]
impl MediaPlayer for MockMediaPlayer {
    fn state(&self) -> PlayerState {
        *self.state.lock()
    }

    fn set_source(&self, source: ToneSource) -> PlatformResult<()> {
        if self.state() != PlayerState::Idle {
            return Err(self.invalid("fdSrc"));
        }
        *self.source.lock() = Some(source);
        self.transition(PlayerState::Initialized);
        Ok(())
    }

    fn set_render_info(&self, info: RenderInfo) -> PlatformResult<()> {
        *self.render_info.lock() = Some(info);
        Ok(())
    }

    fn set_loop(&self, looping: bool) -> PlatformResult<()> {
        self.looping.store(looping, Ordering::SeqCst);
        Ok(())
    }

    fn set_interrupt_mode(&self, mode: InterruptMode) -> PlatformResult<()> {
        *self.interrupt_mode.lock() = Some(mode);
        Ok(())
    }

    async fn prepare(&self) -> PlatformResult<()> {
        match self.state() {
            PlayerState::Initialized | PlayerState::Stopped => {
                self.transition(PlayerState::Prepared);
                Ok(())
            }
            _ => Err(self.invalid("prepare")),
        }
    }

    async fn play(&self) -> PlatformResult<()> {
        match self.state() {
            PlayerState::Prepared | PlayerState::Paused | PlayerState::Completed => {
                self.plays.fetch_add(1, Ordering::SeqCst);
                self.transition(PlayerState::Playing);
                Ok(())
            }
            _ => Err(self.invalid("play")),
        }
    }

    async fn pause(&self) -> PlatformResult<()> {
        match self.state() {
            PlayerState::Playing => {
                self.pauses.fetch_add(1, Ordering::SeqCst);
                self.transition(PlayerState::Paused);
                Ok(())
            }
            _ => Err(self.invalid("pause")),
        }
    }

    async fn stop(&self) -> PlatformResult<()> {
        if self.state().is_stoppable() {
            self.transition(PlayerState::Stopped);
            Ok(())
        } else {
            Err(self.invalid("stop"))
        }
    }

    async fn release(&self) -> PlatformResult<()> {
        self.transition(PlayerState::Released);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_creation_failure_is_sticky() {
        let sessions = MockSessionService::default();
        sessions.fail_with(PlatformError::call("createAVSession", 6600101, "service error"));

        let result = tokio_test::block_on(sessions.create_session(SessionType::VoiceCall));
        assert_eq!(result.unwrap_err().code(), 6600101);
        assert!(sessions.created().is_empty());
    }

    #[test]
    fn test_player_rejects_play_before_prepare() {
        let engine = MockMediaEngine::default();
        let (player, mut events) = tokio_test::block_on(engine.create_player()).unwrap();

        assert!(tokio_test::block_on(player.play()).is_err());
        player.set_source(ToneSource::new(7, 0, 10, "")).unwrap();
        assert_eq!(
            events.try_recv().unwrap(),
            PlayerEvent::StateChange(PlayerState::Initialized)
        );
        tokio_test::block_on(player.prepare()).unwrap();
        tokio_test::block_on(player.play()).unwrap();
        assert_eq!(player.state(), PlayerState::Playing);
    }

    #[test]
    fn test_screen_lock_double_hold_fails() {
        let lock = MockScreenLock::new();
        lock.hold(0).unwrap();
        assert!(lock.hold(0).is_err());
        lock.unhold().unwrap();
        assert!(!lock.is_holding());
        assert_eq!(lock.hold_count(), 1);
    }
}
