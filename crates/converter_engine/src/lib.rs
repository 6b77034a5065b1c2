//! Converter engine: conversion backends, attempt timers and effect execution.
mod backend;
mod download;
mod engine;
mod remote;
mod stub;
mod timers;
mod types;

pub use backend::{BackendKind, BackendSettings, ConversionBackend};
pub use download::{ensure_output_dir, sanitize_file_name, write_atomic, Downloader, PersistError};
pub use engine::{EngineEvents, EngineHandle};
pub use remote::{RemoteBackend, RemoteSettings};
pub use stub::{placeholder_script, StubBackend, StubSettings};
pub use timers::{AttemptTimers, ChannelEventSink, EventSink, TimerSettings};
pub use types::{
    AttemptId, ConversionError, ConversionOutput, ConvertedFile, EngineEvent, FailureKind,
    SqlFile,
};
