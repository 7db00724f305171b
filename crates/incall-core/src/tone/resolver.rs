//! Tone-source selector resolution

use std::sync::Arc;
use tracing::debug;

use crate::config::ToneFiles;
use crate::platform::ToneSourceProvider;
use crate::types::{ToneKind, ToneSelector, ToneSource};

/// Maps a selector onto an open tone file descriptor
///
/// - default: the packaged file. The ringtone is looked up by file name,
///   ringback and busytone inside the resource directory
/// - bundle: the app-bundled override, else the default
/// - anything else: the system file at its conventional name, else the default
#[derive(Clone)]
pub struct ToneResolver {
    resources: Arc<dyn ToneSourceProvider>,
    tones: ToneFiles,
}

impl ToneResolver {
    pub fn new(resources: Arc<dyn ToneSourceProvider>, tones: ToneFiles) -> Self {
        Self { resources, tones }
    }

    pub fn resolve(&self, kind: ToneKind, selector: &ToneSelector) -> Option<ToneSource> {
        let files = self.tones.for_kind(kind);
        match selector {
            ToneSelector::Default => self.default_source(kind),
            ToneSelector::Bundle => self
                .open(&files.bundle.file_name())
                .or_else(|| self.default_source(kind)),
            ToneSelector::Dtmf | ToneSelector::System(_) => self
                .open(&files.default.file_name())
                .or_else(|| self.default_source(kind)),
        }
    }

    pub fn default_source(&self, kind: ToneKind) -> Option<ToneSource> {
        self.open(&self.default_path(kind))
    }

    fn default_path(&self, kind: ToneKind) -> String {
        let file_name = self.tones.for_kind(kind).default.file_name();
        match kind {
            ToneKind::Ringtone => file_name,
            ToneKind::Ringback | ToneKind::Busytone => {
                format!("{}/{}", self.resources.resource_dir(), file_name)
            }
        }
    }

    fn open(&self, path: &str) -> Option<ToneSource> {
        match self.resources.open_raw(path) {
            Ok(source) if source.is_valid() => Some(source),
            Ok(_) => {
                debug!(path, "raw file descriptor invalid");
                None
            }
            Err(e) => {
                debug!(path, code = e.code(), "raw file lookup failed: {}", e);
                None
            }
        }
    }
}
