use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::alloc::IdPolicy;
use crate::diagnostics::{DiagnosticSink, FileSink, NoopSink, TracingSink};
use crate::error::{StoreError, StoreResult};

/// Construction-time settings for an [`IndexedContainer`](crate::IndexedContainer).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Whether freed ids are handed out again. Fixed for the container's
    /// lifetime.
    pub id_policy: IdPolicy,
    /// Where diagnostic events go.
    pub diagnostics: DiagnosticsTarget,
}

impl StoreConfig {
    /// Monotonic ids, for containers sitting under a rollback layer.
    pub fn no_reuse() -> Self {
        Self {
            id_policy: IdPolicy::NoReuse,
            ..Default::default()
        }
    }

    /// Parse a configuration from TOML. Missing keys take their defaults.
    ///
    /// ```toml
    /// id_policy = "no-reuse"
    ///
    /// [diagnostics]
    /// target = "file"
    /// path = "container_dump.txt"
    /// ```
    pub fn from_toml_str(text: &str) -> StoreResult<Self> {
        toml::from_str(text).map_err(|e| StoreError::Config(e.to_string()))
    }

    /// Render as TOML.
    pub fn to_toml_string(&self) -> StoreResult<String> {
        toml::to_string(self).map_err(|e| StoreError::Config(e.to_string()))
    }
}

/// Destination for diagnostic events.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "target", rename_all = "kebab-case")]
pub enum DiagnosticsTarget {
    /// Drop every event.
    #[default]
    Off,
    /// Emit through `tracing` at DEBUG.
    Tracing,
    /// Append to a file (stdout if it cannot be opened).
    File { path: PathBuf },
}

impl DiagnosticsTarget {
    /// Build the sink this target names.
    pub fn sink(&self) -> Box<dyn DiagnosticSink> {
        match self {
            Self::Off => Box::new(NoopSink),
            Self::Tracing => Box::new(TracingSink),
            Self::File { path } => Box::new(FileSink::open(path)),
        }
    }
}
