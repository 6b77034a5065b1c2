use std::fmt;

use bytes::Bytes;

pub type AttemptId = u64;

/// A source file queued for conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlFile {
    pub name: String,
    pub contents: Bytes,
}

impl SqlFile {
    pub fn new(name: impl Into<String>, contents: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            contents: contents.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedFile {
    pub name: Option<String>,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionOutput {
    /// Concatenated output for every input.
    Combined(String),
    /// One entry per input, in the order the service returned them.
    Files(Vec<ConvertedFile>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    ProgressTick {
        attempt: AttemptId,
    },
    ElapsedTick {
        attempt: AttemptId,
        delta_secs: f64,
    },
    ConversionCompleted {
        attempt: AttemptId,
        result: Result<ConversionOutput, ConversionError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionError {
    pub kind: FailureKind,
    pub message: String,
}

impl ConversionError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ConversionError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidEndpoint,
    HttpStatus(u16),
    Timeout,
    Network,
    TooLarge { max_bytes: u64 },
    InvalidResponse,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidEndpoint => write!(f, "invalid endpoint"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::TooLarge { max_bytes } => {
                write!(f, "response larger than {max_bytes} bytes")
            }
            FailureKind::InvalidResponse => write!(f, "invalid response body"),
        }
    }
}
