//! # In-Call Core - Call Audio Session Coordination
//!
//! This crate coordinates the audio side of a phone call on a mobile OS:
//! - **Session lifecycle**: create/activate the OS call-audio session on
//!   `start`, restore the pre-call route and release it on `stop`
//! - **Tones**: ringtone, ringback and busytone playback with idempotent
//!   start and a busytone that defers teardown until it finishes
//! - **Proximity**: sensor subscription and screen lock while on the earpiece
//! - **Events**: proximity, wired headset, noisy audio, media buttons and
//!   audio-focus changes delivered to the application
//!
//! Every OS service sits behind a trait in [`platform`]; a host binding
//! implements them and [`platform::mock`] provides an in-memory backend.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use incall_core::{InCallConfig, InCallManager, MediaType};
//! use incall_core::platform::mock::MockPlatform;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     incall_core::logging::setup_logging(Default::default())?;
//!
//!     let platform = MockPlatform::new();
//!     let manager = InCallManager::new(InCallConfig::default(), platform.services())?;
//!
//!     // Outgoing call with the default ringback
//!     manager.start(MediaType::Audio, true, "_DEFAULT_").await;
//!
//!     // Callee busy: play the busytone, teardown follows when it ends
//!     manager.stop("_DEFAULT_").await;
//!
//!     manager.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod keepalive;
pub mod logging;
pub mod manager;
pub mod media_keys;
pub mod platform;
pub mod route;
pub mod tone;
pub mod types;

// Re-export main types
pub use config::InCallConfig;
pub use error::{InCallError, InCallResult, PlatformError, PlatformResult};
pub use events::{EventEmitter, EventIterator, EventStream, InCallEvent};
pub use manager::{InCallManager, ManagerStatus};
pub use media_keys::{MediaKeyEvent, RemoteCommand};
pub use platform::{PlatformEvent, PlatformServices, PlatformServicesBuilder};
pub use types::{MediaType, SessionType, ToneKind, ToneSelector};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
