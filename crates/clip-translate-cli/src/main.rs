//! Clip Translate CLI - Translate clipboard text as you copy it.

mod clipboard;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use clip_translate_core::{
    create_backend, probe_backend, AppConfig, ClipboardMonitor, EngineKind, Lang, LoopMode,
    MonitorEvent, MonitorOptions, ObservedText, ReadingMode, TranslationEngine,
};
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use crate::clipboard::SystemClipboard;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TrackOption {
    /// Remember the copied text
    Original,
    /// Remember the translation
    Translated,
}

impl From<TrackOption> for ObservedText {
    fn from(opt: TrackOption) -> Self {
        match opt {
            TrackOption::Original => Self::Original,
            TrackOption::Translated => Self::Translated,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "clip-translate")]
#[command(author, version, about = "Translate clipboard text as you copy it", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Watch the clipboard and translate new text
    Translate(TranslateArgs),

    /// List the language codes of an engine
    Languages {
        /// Engine to list (default: configured engine)
        #[arg(short, long)]
        engine: Option<String>,
    },

    /// List translation engines and their status
    Engines,

    /// Make an engine the default
    Use {
        /// Engine identifier (google, openai, deepl, claude)
        engine: String,
    },

    /// Store an API key for an engine
    SetKey { engine: String, key: String },

    /// Store the model used by an LLM engine
    SetModel { engine: String, model: String },

    /// Check that an engine can translate
    Test { engine: String },
}

#[derive(clap::Args, Debug)]
struct TranslateArgs {
    /// Source language code, or "auto" (default: from config)
    #[arg(short, long)]
    source: Option<String>,

    /// Target language code (default: from config)
    #[arg(short, long)]
    target: Option<String>,

    /// Engine for this run only (default: from config)
    #[arg(short, long)]
    engine: Option<String>,

    /// Show original text before the translation
    #[arg(short = 'o', long)]
    show_original: bool,

    /// Show romaji reading for Japanese text
    #[arg(short = 'r', long, conflicts_with = "hiragana")]
    romaji: bool,

    /// Show hiragana reading for Japanese text
    #[arg(short = 'H', long)]
    hiragana: bool,

    /// Translate only once instead of continuously
    #[arg(long)]
    once: bool,

    /// Disable caching
    #[arg(long)]
    no_cache: bool,

    /// Leave the clipboard untouched
    #[arg(long)]
    no_copy: bool,

    /// Text remembered after a translation (default: from config)
    #[arg(long, value_enum)]
    track: Option<TrackOption>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (before parsing args so env vars are available)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Setup logging
    let log_level = match args.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    // Logs go to stderr so translations on stdout stay clean
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(args.config.as_deref())?;

    match args.command {
        Command::Translate(translate_args) => translate(config, translate_args).await,
        Command::Languages { engine } => languages(&config, engine.as_deref()),
        Command::Engines => {
            engines(&config);
            Ok(())
        }
        Command::Use { engine } => use_engine(config, &engine),
        Command::SetKey { engine, key } => set_key(config, &engine, &key),
        Command::SetModel { engine, model } => set_model(config, &engine, &model),
        Command::Test { engine } => test_engine(&config, &engine).await,
    }
}

fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    match path {
        Some(path) if path.exists() => AppConfig::from_file(path).context("Failed to load config file"),
        Some(path) => Ok(AppConfig::default().with_path(path)),
        None => Ok(AppConfig::load()),
    }
}

fn parse_engine(name: &str) -> Result<EngineKind> {
    name.parse()
        .with_context(|| format!("Unknown engine '{name}' (expected google, openai, deepl or claude)"))
}

#[allow(clippy::print_stdout, clippy::print_stderr)]
async fn translate(mut config: AppConfig, args: TranslateArgs) -> Result<()> {
    // A one-off engine choice is not persisted
    if let Some(name) = &args.engine {
        let kind = parse_engine(name)?;
        if !config.validate_engine_config(kind) {
            bail!("Engine '{kind}' is not configured - run `clip-translate set-key {kind} <KEY>`");
        }
        config.set_engine(kind);
    }

    let mut options = MonitorOptions::from_config(&config);
    if let Some(source) = &args.source {
        options.source = Lang::new(source.as_str());
    }
    if let Some(target) = &args.target {
        options.target = Lang::new(target.as_str());
    }
    if args.romaji {
        options.reading = Some(ReadingMode::Romaji);
    } else if args.hiragana {
        options.reading = Some(ReadingMode::Hiragana);
    }
    if let Some(track) = args.track {
        options.track = track.into();
    }
    options.use_cache = !args.no_cache;
    options.copy_result = !args.no_copy;
    options.mode = if args.once {
        LoopMode::SingleShot
    } else {
        LoopMode::Continuous
    };

    let mut engine = TranslationEngine::new(config).context("Failed to initialize translation engine")?;
    engine
        .validate_languages(&options.source, &options.target)
        .context("Invalid language selection")?;
    if options.reading.is_some() {
        engine.setup_reading_converter();
    }

    let clipboard = SystemClipboard::new().context("Failed to access the clipboard")?;
    let mut monitor = ClipboardMonitor::new(clipboard, options);

    let handle = monitor.handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, stopping");
            handle.stop();
        }
    });

    let info = engine.backend_info();
    println!(
        "Monitoring clipboard with {} ({} -> {}). Press Ctrl+C to stop.",
        info.name,
        monitor.options().source,
        monitor.options().target
    );

    let show_original = args.show_original;
    monitor
        .run(&engine, |event| print_event(&event, show_original))
        .await;

    Ok(())
}

#[allow(clippy::print_stdout, clippy::print_stderr)]
fn print_event(event: &MonitorEvent, show_original: bool) {
    match event {
        MonitorEvent::Translated {
            result, reading, ..
        } => {
            println!();
            println!("{}", if result.cached { "[cached]" } else { "[new]" });
            if show_original {
                println!("Original:");
                println!("{}", result.original);
            }
            if let Some(reading) = reading {
                println!("{}:", reading.mode.label());
                println!("{}", reading.text);
            }
            if show_original || reading.is_some() {
                println!("Translation:");
            }
            println!("{}", result.translated);
            println!("{}", "-".repeat(50));
        }
        MonitorEvent::Skipped { detected, expected } => {
            println!();
            println!("Skipped: Detected language '{detected}' doesn't match source '{expected}'");
        }
        MonitorEvent::DetectionFailed(Some(e)) => eprintln!("Language detection failed: {e}"),
        MonitorEvent::DetectionFailed(None) => eprintln!("Language detection failed: could not identify language"),
        MonitorEvent::TranslationFailed(e) => eprintln!("Translation failed: {e}"),
        MonitorEvent::ClipboardFailed(e) => eprintln!("Clipboard error: {e}"),
    }
}

#[allow(clippy::print_stdout)]
fn languages(config: &AppConfig, engine: Option<&str>) -> Result<()> {
    let kind = parse_engine(engine.unwrap_or_else(|| config.engine()))?;

    println!("Supported languages for {}:", kind.display_name());
    for (code, name) in kind.languages().sorted() {
        println!("  {code:8} {name}");
    }
    Ok(())
}

#[allow(clippy::print_stdout)]
fn engines(config: &AppConfig) {
    let available = config.available_engines();

    for kind in EngineKind::ALL {
        let active = if config.engine().eq_ignore_ascii_case(kind.as_str()) { "*" } else { " " };
        let status = if available.contains(&kind) {
            "configured"
        } else {
            "missing API key"
        };
        println!("{active} {:8} {:18} {status}", kind.as_str(), kind.display_name());
    }
}

#[allow(clippy::print_stdout)]
fn use_engine(config: AppConfig, name: &str) -> Result<()> {
    let kind = parse_engine(name)?;
    let mut engine = TranslationEngine::new(config).context("Failed to initialize translation engine")?;
    engine
        .switch_engine(kind.as_str())
        .with_context(|| format!("Failed to switch to {}", kind.display_name()))?;

    println!("Now using {}", kind.display_name());
    Ok(())
}

#[allow(clippy::print_stdout)]
fn set_key(mut config: AppConfig, name: &str, key: &str) -> Result<()> {
    let kind = parse_engine(name)?;
    if !kind.requires_api_key() {
        bail!("{} does not use an API key", kind.display_name());
    }

    config.set_api_key(kind, key.trim());
    config.save().context("Failed to save config")?;

    println!("API key saved for {}", kind.display_name());
    Ok(())
}

#[allow(clippy::print_stdout)]
fn set_model(mut config: AppConfig, name: &str, model: &str) -> Result<()> {
    let kind = parse_engine(name)?;
    if !matches!(kind, EngineKind::OpenAi | EngineKind::Claude) {
        bail!("{} does not use a model", kind.display_name());
    }

    config.set_model(kind, model.trim());
    config.save().context("Failed to save config")?;

    println!("Model for {} set to {}", kind.display_name(), model.trim());
    Ok(())
}

#[allow(clippy::print_stdout)]
async fn test_engine(config: &AppConfig, name: &str) -> Result<()> {
    let kind = parse_engine(name)?;
    let backend = create_backend(kind, &config.backend_settings(kind))
        .with_context(|| format!("Failed to create {} backend", kind.display_name()))?;

    println!("Testing {}...", kind.display_name());
    let report = probe_backend(kind, backend.as_ref()).await;
    if !report.success {
        bail!(report.message);
    }

    println!("{}", report.message);
    Ok(())
}
