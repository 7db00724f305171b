//! Events emitted to the application layer
//!
//! The bridge exposes five event names. [`InCallEvent::name`] returns the wire
//! name and [`InCallEvent::payload`] the JSON body the application receives.

use futures::Stream;
use serde::Serialize;
use serde_json::Value;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

/// Event delivered to the application
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum InCallEvent {
    /// Proximity sensor changed between near and far
    #[serde(rename_all = "camelCase")]
    Proximity { is_near: bool },

    /// A wired or SCO headset was plugged or unplugged
    #[serde(rename_all = "camelCase")]
    WiredHeadset {
        is_plugged: bool,
        has_mic: bool,
        device_name: String,
    },

    /// Audio output became noisy (headset disconnected)
    NoisyAudio,

    /// Remote-control command from the call-audio session
    #[serde(rename_all = "camelCase")]
    MediaButton { event_text: String, event_code: i32 },

    /// Interruption hint relayed from a tone player
    #[serde(rename_all = "camelCase")]
    AudioFocusChange { event_text: String, event_code: i32 },
}

impl InCallEvent {
    /// Wire name of the event
    pub fn name(&self) -> &'static str {
        match self {
            InCallEvent::Proximity { .. } => "Proximity",
            InCallEvent::WiredHeadset { .. } => "WiredHeadset",
            InCallEvent::NoisyAudio => "NoisyAudio",
            InCallEvent::MediaButton { .. } => "MediaButton",
            InCallEvent::AudioFocusChange { .. } => "onAudioFocusChange",
        }
    }

    /// JSON payload, `null` for events without one
    pub fn payload(&self) -> Value {
        match self {
            InCallEvent::NoisyAudio => Value::Null,
            other => serde_json::to_value(other).unwrap_or(Value::Null),
        }
    }
}

/// Stream of application events; lagged items are skipped
pub struct EventStream {
    inner: BroadcastStream<InCallEvent>,
}

impl EventStream {
    fn new(receiver: broadcast::Receiver<InCallEvent>) -> Self {
        Self {
            inner: BroadcastStream::new(receiver),
        }
    }
}

impl Stream for EventStream {
    type Item = InCallEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match Pin::new(&mut self.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(event))) => return Poll::Ready(Some(event)),
                Poll::Ready(Some(Err(lagged))) => {
                    tracing::warn!("event subscriber lagged: {}", lagged);
                    continue;
                }
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

/// Simple event iterator that doesn't require StreamExt
pub struct EventIterator {
    stream: EventStream,
}

impl EventIterator {
    pub fn new(stream: EventStream) -> Self {
        Self { stream }
    }

    /// Get the next event (async)
    pub async fn next(&mut self) -> Option<InCallEvent> {
        use tokio_stream::StreamExt;
        self.stream.next().await
    }
}

/// Broadcast emitter shared by the manager and its tone players
#[derive(Clone)]
pub struct EventEmitter {
    sender: broadcast::Sender<InCallEvent>,
}

impl EventEmitter {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn emit(&self, event: InCallEvent) {
        tracing::debug!(event = event.name(), "emit device event");
        // No receivers is not an error
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> EventStream {
        EventStream::new(self.sender.subscribe())
    }

    pub fn subscribe_simple(&self) -> EventIterator {
        EventIterator::new(self.subscribe())
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_names() {
        assert_eq!(InCallEvent::NoisyAudio.name(), "NoisyAudio");
        assert_eq!(
            InCallEvent::AudioFocusChange {
                event_text: "INTERRUPT_HINT_PAUSE".into(),
                event_code: 2
            }
            .name(),
            "onAudioFocusChange"
        );
    }

    #[test]
    fn test_payloads_use_camel_case() {
        let event = InCallEvent::WiredHeadset {
            is_plugged: true,
            has_mic: false,
            device_name: "Headphones".into(),
        };
        assert_eq!(
            event.payload(),
            json!({ "isPlugged": true, "hasMic": false, "deviceName": "Headphones" })
        );

        let event = InCallEvent::MediaButton {
            event_text: "ANSWER".into(),
            event_code: 2085,
        };
        assert_eq!(event.payload(), json!({ "eventText": "ANSWER", "eventCode": 2085 }));

        assert_eq!(InCallEvent::Proximity { is_near: true }.payload(), json!({ "isNear": true }));
        assert_eq!(InCallEvent::NoisyAudio.payload(), Value::Null);
    }

    #[tokio::test]
    async fn test_emitter_delivers_to_subscribers() {
        let emitter = EventEmitter::new(8);
        let mut events = emitter.subscribe_simple();

        emitter.emit(InCallEvent::NoisyAudio);
        assert_eq!(events.next().await, Some(InCallEvent::NoisyAudio));
    }
}
