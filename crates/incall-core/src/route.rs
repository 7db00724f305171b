//! Audio route inspection and the pre-call route snapshot

use std::sync::Arc;
use tracing::{debug, error};

use crate::events::InCallEvent;
use crate::platform::{RoutingCapability, VolumeCapability};
use crate::types::{AudioDeviceDescriptor, DeviceChangeAction, DeviceChangeType, DeviceType};

/// Which preferred-device list to inspect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDirection {
    Output,
    Input,
}

/// Read-only queries over the current voice-communication route
#[derive(Clone)]
pub struct RouteInspector {
    routing: Arc<dyn RoutingCapability>,
}

impl RouteInspector {
    pub fn new(routing: Arc<dyn RoutingCapability>) -> Self {
        Self { routing }
    }

    /// True when any preferred device in `direction` has one of `targets`
    ///
    /// Query failures are logged and count as no match.
    pub fn check(&self, targets: &[DeviceType], direction: RouteDirection) -> bool {
        let devices = match direction {
            RouteDirection::Output => self.routing.preferred_output_devices(),
            RouteDirection::Input => self.routing.preferred_input_devices(),
        };
        match devices {
            Ok(devices) => devices.iter().any(|d| targets.contains(&d.device_type)),
            Err(e) => {
                error!(code = e.code(), "checkAudioRoute failed: {}", e);
                false
            }
        }
    }

    pub fn is_earpiece(&self) -> bool {
        self.check(&[DeviceType::Earpiece], RouteDirection::Output)
    }

    pub fn is_wired_headset_plugged_in(&self) -> bool {
        self.check(
            &[DeviceType::WiredHeadphones, DeviceType::BluetoothSco],
            RouteDirection::Output,
        ) || self.check(
            &[DeviceType::WiredHeadset, DeviceType::BluetoothSco],
            RouteDirection::Input,
        )
    }
}

/// Speakerphone and microphone-mute state saved when a call starts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AudioRouteSnapshot {
    pub speakerphone_was_on: bool,
    pub microphone_was_muted: bool,
    pub captured: bool,
}

impl AudioRouteSnapshot {
    /// Record the current state unless already captured this lifecycle
    pub fn capture(&mut self, routing: &dyn RoutingCapability, volume: &dyn VolumeCapability) {
        if self.captured {
            return;
        }
        self.speakerphone_was_on = routing.is_speakerphone_on().unwrap_or_else(|e| {
            error!(code = e.code(), "isSpeakerphoneOn failed: {}", e);
            false
        });
        self.microphone_was_muted = volume.is_microphone_muted().unwrap_or_else(|e| {
            error!(code = e.code(), "isMicrophoneMute failed: {}", e);
            false
        });
        self.captured = true;
        debug!(
            speaker = self.speakerphone_was_on,
            muted = self.microphone_was_muted,
            "stored original audio setup"
        );
    }

    /// Hand back the saved state once and clear the flag
    pub fn take(&mut self) -> Option<(bool, bool)> {
        if !self.captured {
            return None;
        }
        self.captured = false;
        Some((self.speakerphone_was_on, self.microphone_was_muted))
    }
}

/// Translate a device change into the application events it implies
///
/// Wired headsets and SCO links count as headsets with a mic, wired
/// headphones as one without. The last matching device wins. A disconnect
/// additionally reports noisy audio.
pub fn headset_events(action: &DeviceChangeAction) -> Vec<InCallEvent> {
    let is_connect = action.change_type == DeviceChangeType::Connect;

    let matched = action
        .devices
        .iter()
        .filter_map(|device: &AudioDeviceDescriptor| {
            let has_mic = match device.device_type {
                DeviceType::WiredHeadset | DeviceType::BluetoothSco => true,
                DeviceType::WiredHeadphones => false,
                _ => return None,
            };
            Some((has_mic, device.name.clone()))
        })
        .last();

    let Some((has_mic, device_name)) = matched else {
        return Vec::new();
    };

    let mut events = vec![InCallEvent::WiredHeadset {
        is_plugged: is_connect,
        has_mic,
        device_name,
    }];
    if !is_connect {
        events.push(InCallEvent::NoisyAudio);
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlatformError;
    use crate::platform::mock::{MockRouting, MockVolume};

    #[test]
    fn test_snapshot_captures_once() {
        let routing = MockRouting::new();
        let volume = MockVolume::new();
        routing.force_speakerphone(true);

        let mut snapshot = AudioRouteSnapshot::default();
        snapshot.capture(&routing, &volume);
        routing.force_speakerphone(false);
        volume.force_muted(true);
        snapshot.capture(&routing, &volume);

        assert_eq!(snapshot.take(), Some((true, false)));
        assert_eq!(snapshot.take(), None);
    }

    #[test]
    fn test_route_checks() {
        let routing = Arc::new(MockRouting::new());
        let inspector = RouteInspector::new(routing.clone());
        assert!(inspector.is_earpiece());
        assert!(!inspector.is_wired_headset_plugged_in());

        routing.set_inputs(vec![AudioDeviceDescriptor::new(DeviceType::WiredHeadset, "jack")]);
        assert!(inspector.is_wired_headset_plugged_in());

        routing.fail_queries(Some(PlatformError::call("getPreferOutputDevice", 6800101, "busy")));
        assert!(!inspector.is_earpiece());
    }

    #[test]
    fn test_headset_disconnect_reports_noisy_audio() {
        let action = DeviceChangeAction {
            change_type: DeviceChangeType::Disconnect,
            devices: vec![
                AudioDeviceDescriptor::new(DeviceType::WiredHeadset, "headset"),
                AudioDeviceDescriptor::new(DeviceType::WiredHeadphones, "phones"),
            ],
        };
        assert_eq!(
            headset_events(&action),
            vec![
                InCallEvent::WiredHeadset {
                    is_plugged: false,
                    has_mic: false,
                    device_name: "phones".into()
                },
                InCallEvent::NoisyAudio,
            ]
        );
    }

    #[test]
    fn test_unrelated_devices_emit_nothing() {
        let action = DeviceChangeAction {
            change_type: DeviceChangeType::Connect,
            devices: vec![AudioDeviceDescriptor::new(DeviceType::BluetoothA2dp, "car")],
        };
        assert!(headset_events(&action).is_empty());
    }
}
