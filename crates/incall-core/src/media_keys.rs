//! Remote-control command translation
//!
//! The call-audio session delivers remote-control commands (headset buttons,
//! car kits, lock-screen controls). Each one is normalized into the
//! `(eventText, eventCode)` pair the application receives as a
//! `MediaButton` event.

/// Platform key codes for media keys
pub mod key_code {
    pub const MEDIA_PLAY_PAUSE: i32 = 10;
    pub const MEDIA_STOP: i32 = 11;
    pub const MEDIA_NEXT: i32 = 12;
    pub const MEDIA_PREVIOUS: i32 = 13;
    pub const MEDIA_REWIND: i32 = 14;
    pub const MEDIA_FAST_FORWARD: i32 = 15;
    pub const MEDIA_PLAY: i32 = 2085;
    pub const MEDIA_PAUSE: i32 = 2086;
    pub const MEDIA_CLOSE: i32 = 2087;
    pub const MEDIA_EJECT: i32 = 2088;
    pub const MEDIA_RECORD: i32 = 2089;
}

/// Event texts sent to the application
pub mod key_text {
    pub const MEDIA_PLAY: &str = "KEYCODE_MEDIA_PLAY";
    pub const MEDIA_PAUSE: &str = "KEYCODE_MEDIA_PAUSE";
    pub const MEDIA_PLAY_PAUSE: &str = "KEYCODE_MEDIA_PLAY_PAUSE";
    pub const MEDIA_NEXT: &str = "KEYCODE_MEDIA_NEXT";
    pub const MEDIA_PREVIOUS: &str = "KEYCODE_MEDIA_PREVIOUS";
    pub const MEDIA_FAST_FORWARD: &str = "KEYCODE_MEDIA_FAST_FORWARD";
    pub const MEDIA_REWIND: &str = "KEYCODE_MEDIA_REWIND";
    pub const MEDIA_CLOSE: &str = "KEYCODE_MEDIA_CLOSE";
    pub const MEDIA_EJECT: &str = "KEYCODE_MEDIA_EJECT";
    pub const MEDIA_RECORD: &str = "KEYCODE_MEDIA_RECORD";
    pub const MEDIA_STOP: &str = "KEYCODE_MEDIA_STOP";
    pub const UNKNOWN: &str = "KEYCODE_UNKNOW";
    pub const HANG_UP: &str = "HAND_UP";
    pub const ANSWER: &str = "ANSWER";
}

/// Remote-control command delivered by the call-audio session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteCommand {
    Play,
    Pause,
    PlayNext,
    PlayPrevious,
    Stop,
    FastForward,
    Rewind,
    Answer,
    HangUp,
    /// Generic key event carrying a raw key code
    KeyEvent(i32),
}

/// Normalized media-button event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaKeyEvent {
    pub text: &'static str,
    pub code: i32,
}

impl RemoteCommand {
    /// Translate the command into its text/code pair
    pub fn to_media_key(self) -> MediaKeyEvent {
        let (text, code) = match self {
            RemoteCommand::Play => (key_text::MEDIA_PLAY, key_code::MEDIA_PLAY),
            RemoteCommand::Pause => (key_text::MEDIA_PAUSE, key_code::MEDIA_PAUSE),
            RemoteCommand::PlayNext => (key_text::MEDIA_NEXT, key_code::MEDIA_NEXT),
            RemoteCommand::PlayPrevious => (key_text::MEDIA_PREVIOUS, key_code::MEDIA_PREVIOUS),
            RemoteCommand::Stop => (key_text::MEDIA_STOP, key_code::MEDIA_STOP),
            RemoteCommand::FastForward => (key_text::MEDIA_FAST_FORWARD, key_code::MEDIA_FAST_FORWARD),
            RemoteCommand::Rewind => (key_text::MEDIA_REWIND, key_code::MEDIA_REWIND),
            RemoteCommand::Answer => (key_text::ANSWER, key_code::MEDIA_PLAY),
            RemoteCommand::HangUp => (key_text::HANG_UP, key_code::MEDIA_CLOSE),
            RemoteCommand::KeyEvent(code) => (key_code_text(code), code),
        };
        MediaKeyEvent { text, code }
    }
}

/// Decode a raw key code from a generic key event
pub fn key_code_text(code: i32) -> &'static str {
    match code {
        key_code::MEDIA_PLAY => key_text::MEDIA_PLAY,
        key_code::MEDIA_PAUSE => key_text::MEDIA_PAUSE,
        key_code::MEDIA_PLAY_PAUSE => key_text::MEDIA_PLAY_PAUSE,
        key_code::MEDIA_NEXT => key_text::MEDIA_NEXT,
        key_code::MEDIA_PREVIOUS => key_text::MEDIA_PREVIOUS,
        key_code::MEDIA_CLOSE => key_text::MEDIA_CLOSE,
        key_code::MEDIA_EJECT => key_text::MEDIA_EJECT,
        key_code::MEDIA_RECORD => key_text::MEDIA_RECORD,
        key_code::MEDIA_STOP => key_text::MEDIA_STOP,
        _ => key_text::UNKNOWN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_commands_reuse_media_codes() {
        let answer = RemoteCommand::Answer.to_media_key();
        assert_eq!(answer.text, "ANSWER");
        assert_eq!(answer.code, key_code::MEDIA_PLAY);

        let hang_up = RemoteCommand::HangUp.to_media_key();
        assert_eq!(hang_up.text, "HAND_UP");
        assert_eq!(hang_up.code, key_code::MEDIA_CLOSE);
    }

    #[test]
    fn test_generic_key_event_decoding() {
        let event = RemoteCommand::KeyEvent(key_code::MEDIA_PLAY_PAUSE).to_media_key();
        assert_eq!(event.text, "KEYCODE_MEDIA_PLAY_PAUSE");
        assert_eq!(event.code, 10);

        // Fast-forward only has a dedicated command, not a key-event decoding
        let event = RemoteCommand::KeyEvent(key_code::MEDIA_FAST_FORWARD).to_media_key();
        assert_eq!(event.text, key_text::UNKNOWN);
        assert_eq!(event.code, key_code::MEDIA_FAST_FORWARD);

        assert_eq!(key_code_text(9999), "KEYCODE_UNKNOW");
    }

    #[test]
    fn test_transport_commands() {
        assert_eq!(RemoteCommand::Play.to_media_key().text, key_text::MEDIA_PLAY);
        assert_eq!(RemoteCommand::Rewind.to_media_key().code, key_code::MEDIA_REWIND);
        assert_eq!(RemoteCommand::PlayPrevious.to_media_key().code, 13);
    }
}
