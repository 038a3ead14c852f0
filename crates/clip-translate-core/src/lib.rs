//! Clip Translate Core Library
//!
//! This library provides the core functionality for translating clipboard text:
//! - Translation backends (Google, OpenAI, DeepL, Claude) behind one trait
//! - A translation engine with caching and engine failover
//! - A clipboard poll loop with a language gate
//! - Phonetic readings for Japanese text

pub mod backend;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod monitor;
pub mod reading;
pub mod util;
pub mod worker;

pub use backend::{
    create_backend, get_backend, probe_backend, Backend, BackendFactory, BackendInfo,
    BackendSettings, ConnectionReport, EngineKind, LanguageTable,
};
pub use cache::{CachedTranslation, TranslationCache};
pub use config::{AppConfig, EngineSettings, Lang, ObservedText, DEFAULT_SOURCE_LANG, DEFAULT_TARGET_LANG};
pub use engine::{TranslationEngine, TranslationResult};
pub use error::{Error, Result};
pub use monitor::{
    language_gate, Clipboard, ClipboardMonitor, LoopMode, MonitorEvent, MonitorHandle,
    MonitorOptions, Tick,
};
pub use reading::{KakasiConverter, Reading, ReadingConverter, ReadingMode, ReadingSegment};
pub use worker::{TranslationWorker, WorkRequest, WorkerMessage};
