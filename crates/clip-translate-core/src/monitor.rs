//! Clipboard poll loop.
//!
//! Each tick reads the clipboard and, for new non-empty text, runs
//! detect -> language gate -> translate -> publish. Cancellation is checked
//! between ticks only; a call already in flight always completes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::{AppConfig, Lang, ObservedText};
use crate::engine::{TranslationEngine, TranslationResult};
use crate::error::Result;
use crate::reading::{Reading, ReadingMode};

/// Read/write access to the system clipboard
pub trait Clipboard {
    fn read(&mut self) -> Result<String>;
    fn write(&mut self, text: &str) -> Result<()>;
}

/// Loop controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopMode {
    /// Keep polling until stopped
    Continuous,
    /// Stop after the first cycle that processed new text
    SingleShot,
}

#[derive(Debug, Clone)]
pub struct MonitorOptions {
    /// Expected source language (`auto` disables the gate)
    pub source: Lang,
    pub target: Lang,
    pub mode: LoopMode,
    /// Text remembered after a successful translation
    pub track: ObservedText,
    pub poll_interval: Duration,
    pub use_cache: bool,
    /// Put the translation back on the clipboard
    pub copy_result: bool,
    /// Reading to render for Japanese sources
    pub reading: Option<ReadingMode>,
}

impl MonitorOptions {
    /// Options seeded from the configuration defaults
    pub fn from_config(config: &AppConfig) -> Self {
        let reading = if config.show_romaji {
            Some(ReadingMode::Romaji)
        } else if config.show_hiragana {
            Some(ReadingMode::Hiragana)
        } else {
            None
        };

        Self {
            source: config.default_source.clone(),
            target: config.default_target.clone(),
            mode: LoopMode::Continuous,
            track: config.track_observed,
            poll_interval: config.poll_interval(),
            use_cache: true,
            copy_result: true,
            reading,
        }
    }
}

/// Something the loop wants the front end to show
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorEvent {
    Translated {
        result: TranslationResult,
        /// Language the text was translated from
        source: Lang,
        reading: Option<Reading>,
    },
    /// Detected language did not match the configured source
    Skipped { detected: Lang, expected: Lang },
    /// Detector failed (`Some`) or was inconclusive (`None`)
    DetectionFailed(Option<String>),
    TranslationFailed(String),
    ClipboardFailed(String),
}

/// Cloneable control surface of a running loop
#[derive(Debug, Clone)]
pub struct MonitorHandle {
    running: Arc<AtomicBool>,
    enabled: Arc<AtomicBool>,
}

impl MonitorHandle {
    fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(true)),
            enabled: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Ask the loop to exit before its next clipboard read
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Pause or resume monitoring without leaving the loop
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }
}

/// Whether text detected as `detected` should be translated from `source`
pub fn language_gate(detected: &Lang, source: &Lang) -> bool {
    source.is_auto() || detected.matches(source)
}

fn is_japanese(lang: &Lang) -> bool {
    lang.as_str()
        .split('-')
        .next()
        .is_some_and(|primary| primary.eq_ignore_ascii_case("ja"))
}

/// Result of a single tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Nothing new on the clipboard (or monitoring disabled)
    Idle,
    /// New text went through a full cycle
    Processed,
}

pub struct ClipboardMonitor<C> {
    clipboard: C,
    options: MonitorOptions,
    handle: MonitorHandle,
    previous: Option<String>,
    clipboard_error: bool,
}

impl<C: Clipboard> ClipboardMonitor<C> {
    pub fn new(clipboard: C, options: MonitorOptions) -> Self {
        Self {
            clipboard,
            options,
            handle: MonitorHandle::new(),
            previous: None,
            clipboard_error: false,
        }
    }

    pub fn handle(&self) -> MonitorHandle {
        self.handle.clone()
    }

    pub const fn options(&self) -> &MonitorOptions {
        &self.options
    }

    /// Text remembered from the last processed cycle
    pub fn previous(&self) -> Option<&str> {
        self.previous.as_deref()
    }

    /// Poll until stopped, or until one cycle completes in single-shot mode
    pub async fn run(&mut self, engine: &TranslationEngine, mut sink: impl FnMut(MonitorEvent)) {
        info!(
            "Monitoring clipboard ({} -> {}, {:?})",
            self.options.source, self.options.target, self.options.mode
        );

        while self.handle.is_running() {
            let tick = self.tick(engine, &mut sink).await;
            if tick == Tick::Processed && self.options.mode == LoopMode::SingleShot {
                break;
            }
            tokio::time::sleep(self.options.poll_interval).await;
        }

        info!("Clipboard monitoring stopped");
    }

    /// One read-detect-gate-translate cycle
    pub async fn tick(&mut self, engine: &TranslationEngine, sink: &mut impl FnMut(MonitorEvent)) -> Tick {
        if !self.handle.is_enabled() {
            return Tick::Idle;
        }

        let text = match self.clipboard.read() {
            Ok(text) => {
                self.clipboard_error = false;
                text
            }
            Err(e) => {
                // Report once per run of failures
                if !self.clipboard_error {
                    warn!("Clipboard read failed: {}", e);
                    sink(MonitorEvent::ClipboardFailed(e.to_string()));
                    self.clipboard_error = true;
                }
                return Tick::Idle;
            }
        };

        if text.trim().is_empty() || self.previous.as_deref() == Some(text.as_str()) {
            return Tick::Idle;
        }

        let detected = match engine.detect_language(text.trim()).await {
            Ok(Some(lang)) => lang,
            Ok(None) => {
                debug!("Language detection inconclusive");
                sink(MonitorEvent::DetectionFailed(None));
                self.previous = Some(text);
                return Tick::Processed;
            }
            Err(e) => {
                warn!("Language detection failed: {}", e);
                sink(MonitorEvent::DetectionFailed(Some(e.to_string())));
                self.previous = Some(text);
                return Tick::Processed;
            }
        };

        if !language_gate(&detected, &self.options.source) {
            debug!("Skipping text detected as {}", detected);
            sink(MonitorEvent::Skipped {
                detected,
                expected: self.options.source.clone(),
            });
            self.previous = Some(text);
            return Tick::Processed;
        }

        let source = if self.options.source.is_auto() {
            detected
        } else {
            self.options.source.clone()
        };

        let result = match engine
            .translate_text(&text, &source, &self.options.target, self.options.use_cache)
            .await
        {
            Ok(result) => result,
            Err(e) => {
                warn!("Translation failed: {}", e);
                sink(MonitorEvent::TranslationFailed(e.to_string()));
                self.previous = Some(text);
                return Tick::Processed;
            }
        };

        let reading = self
            .options
            .reading
            .filter(|_| is_japanese(&source))
            .and_then(|mode| {
                engine
                    .japanese_reading(&result.original, mode)
                    .map(|text| Reading { mode, text })
            });

        let mut copied = false;
        if self.options.copy_result {
            match self.clipboard.write(&result.translated) {
                Ok(()) => copied = true,
                Err(e) => {
                    warn!("Clipboard write failed: {}", e);
                    sink(MonitorEvent::ClipboardFailed(e.to_string()));
                }
            }
        }

        // The translation can only reappear on the clipboard if we put it there
        self.previous = match self.options.track {
            ObservedText::Translated if copied => Some(result.translated.clone()),
            _ => Some(text),
        };

        sink(MonitorEvent::Translated {
            result,
            source,
            reading,
        });
        Tick::Processed
    }
}
