use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::remote::{RemoteBackend, RemoteSettings};
use crate::stub::{StubBackend, StubSettings};
use crate::{ConversionError, ConversionOutput, SqlFile};

/// Anything that turns a batch of Sybase files into Oracle output.
#[async_trait::async_trait]
pub trait ConversionBackend: Send + Sync {
    /// Short label used in logs.
    fn name(&self) -> &'static str;

    async fn convert(&self, files: &[SqlFile]) -> Result<ConversionOutput, ConversionError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Stub,
    #[default]
    Remote,
}

/// Backend selection made at configuration time.
#[derive(Debug, Clone)]
pub enum BackendSettings {
    Stub(StubSettings),
    Remote(RemoteSettings),
}

impl BackendSettings {
    pub fn kind(&self) -> BackendKind {
        match self {
            BackendSettings::Stub(_) => BackendKind::Stub,
            BackendSettings::Remote(_) => BackendKind::Remote,
        }
    }

    pub fn into_backend(self) -> Arc<dyn ConversionBackend> {
        match self {
            BackendSettings::Stub(settings) => Arc::new(StubBackend::new(settings)),
            BackendSettings::Remote(settings) => Arc::new(RemoteBackend::new(settings)),
        }
    }
}
