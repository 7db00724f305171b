//! Proximity sensor and screen lock

use tracing::{debug, error};

use super::{InCallManager, ManagerState};
use crate::events::InCallEvent;
use crate::types::ProximityReading;

impl InCallManager {
    /// Subscribe to the proximity sensor; no-op when already registered
    ///
    /// On the earpiece route the screen lock engages right away.
    pub async fn start_proximity_sensor(&self) {
        let mut state = self.state.lock().await;
        self.start_proximity_sensor_locked(&mut state);
    }

    pub async fn stop_proximity_sensor(&self) {
        let mut state = self.state.lock().await;
        self.stop_proximity_sensor_locked(&mut state);
    }

    pub(super) fn start_proximity_sensor_locked(&self, state: &mut ManagerState) {
        if state.proximity.registered {
            return;
        }
        if self.route.is_earpiece() {
            state.proximity.lock_engaged = self.turn_screen_off();
        }
        match self.services.proximity.subscribe(self.platform_tx.clone()) {
            Ok(()) => state.proximity.registered = true,
            Err(e) => {
                error!(code = e.code(), "startProximitySensor failed: {}", e);
                self.release_proximity_lock(state);
            }
        }
    }

    pub(super) fn stop_proximity_sensor_locked(&self, state: &mut ManagerState) {
        if !state.proximity.registered {
            return;
        }
        // The route may have left the earpiece since the lock was taken
        self.release_proximity_lock(state);
        if let Err(e) = self.services.proximity.unsubscribe() {
            error!(code = e.code(), "stopProximitySensor failed: {}", e);
        }
        state.proximity.registered = false;
    }

    fn release_proximity_lock(&self, state: &mut ManagerState) {
        if state.proximity.lock_engaged {
            self.turn_screen_on();
            state.proximity.lock_engaged = false;
        }
    }

    pub(super) async fn on_proximity(&self, reading: ProximityReading) {
        let mut state = self.state.lock().await;
        if !state.proximity.registered {
            return;
        }
        let is_near = reading.is_near();
        if is_near != state.proximity.is_near {
            state.proximity.is_near = is_near;
            self.events.emit(InCallEvent::Proximity { is_near });
        }
    }

    /// Engage the proximity screen lock, re-arming it when already held
    ///
    /// Returns whether the lock is now held.
    pub fn turn_screen_off(&self) -> bool {
        let lock = &self.services.screen_lock;
        if !lock.is_supported() {
            error!("turnScreenOff is not supported on this device");
            return false;
        }
        if lock.is_holding() {
            if let Err(e) = lock.unhold() {
                error!(code = e.code(), "turnScreenOff failed: {}", e);
                return false;
            }
        }
        match lock.hold(self.config.proximity_lock_timeout_ms) {
            Ok(()) => true,
            Err(e) => {
                error!(code = e.code(), "turnScreenOff failed: {}", e);
                false
            }
        }
    }

    /// Release the proximity screen lock if held
    pub fn turn_screen_on(&self) {
        let lock = &self.services.screen_lock;
        if !lock.is_supported() {
            error!("turnScreenOn is not supported on this device");
            return;
        }
        if lock.is_holding() {
            if let Err(e) = lock.unhold() {
                error!(code = e.code(), "turnScreenOn failed: {}", e);
            }
        }
    }

    /// Not available on this platform; logs only
    pub fn poke_screen(&self, timeout_ms: u64) {
        debug!(timeout_ms, "pokeScreen");
        error!("pokeScreen is not supported on this device");
    }
}
