//! Background translation for interactive front ends.
//!
//! A front end hands clipboard text to [`TranslationWorker::dispatch`] and
//! reads [`WorkerMessage`]s from the returned channel. Only one request runs
//! at a time.

use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::Lang;
use crate::engine::{TranslationEngine, TranslationResult};
use crate::monitor::language_gate;

/// Tagged result delivered by the worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerMessage {
    LanguageDetected(Lang),
    Ready(TranslationResult),
    Failed(String),
}

/// One unit of work
#[derive(Debug, Clone)]
pub struct WorkRequest {
    pub text: String,
    pub source: Lang,
    pub target: Lang,
    pub use_cache: bool,
}

pub struct TranslationWorker {
    engine: Arc<Mutex<TranslationEngine>>,
    tx: mpsc::UnboundedSender<WorkerMessage>,
    task: Option<JoinHandle<()>>,
}

impl TranslationWorker {
    pub fn new(engine: Arc<Mutex<TranslationEngine>>) -> (Self, mpsc::UnboundedReceiver<WorkerMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = Self {
            engine,
            tx,
            task: None,
        };
        (worker, rx)
    }

    /// Whether the previous request is still running
    pub fn is_busy(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Start a detect -> gate -> translate cycle in the background.
    ///
    /// Returns `false` without doing anything while a previous request is
    /// still running.
    pub fn dispatch(&mut self, request: WorkRequest) -> bool {
        if self.is_busy() {
            debug!("Worker busy, dropping request");
            return false;
        }

        let engine = Arc::clone(&self.engine);
        let tx = self.tx.clone();
        self.task = Some(tokio::spawn(async move {
            let engine = engine.lock().await;
            run_request(&engine, request, &tx).await;
        }));
        true
    }

    /// Wait for the running request, if any, to finish
    pub async fn join(&mut self) {
        if let Some(task) = self.task.take()
            && let Err(e) = task.await
        {
            warn!("Translation worker task failed: {}", e);
        }
    }
}

/// Messages are sent as soon as they are known; a closed receiver is ignored.
async fn run_request(engine: &TranslationEngine, request: WorkRequest, tx: &mpsc::UnboundedSender<WorkerMessage>) {
    let send = |message: WorkerMessage| {
        let _ = tx.send(message);
    };

    let detected = match engine.detect_language(request.text.trim()).await {
        Ok(Some(lang)) => lang,
        Ok(None) => {
            send(WorkerMessage::Failed("Language detection failed".to_string()));
            return;
        }
        Err(e) => {
            send(WorkerMessage::Failed(format!("Language detection failed: {e}")));
            return;
        }
    };

    info!("Detected language: {}, expected: {}", detected, request.source);
    send(WorkerMessage::LanguageDetected(detected.clone()));

    if !language_gate(&detected, &request.source) {
        send(WorkerMessage::Failed(format!(
            "Skipped: Detected '{}', expected '{}'",
            detected, request.source
        )));
        return;
    }

    let source = if request.source.is_auto() {
        detected
    } else {
        request.source
    };

    match engine
        .translate_text(&request.text, &source, &request.target, request.use_cache)
        .await
    {
        Ok(result) => send(WorkerMessage::Ready(result)),
        Err(e) => send(WorkerMessage::Failed(format!("Translation failed: {e}"))),
    }
}
