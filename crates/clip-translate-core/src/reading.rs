//! Phonetic readings for Japanese text.

/// One run of a converted line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadingSegment {
    pub original: String,
    pub hiragana: String,
    pub romaji: String,
}

impl ReadingSegment {
    /// Whether the converter produced anything different from the source script
    pub fn is_converted(&self) -> bool {
        self.original != self.hiragana || self.original != self.romaji
    }
}

/// Which reading to render
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadingMode {
    Romaji,
    Hiragana,
}

impl ReadingMode {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Romaji => "Romaji",
            Self::Hiragana => "Hiragana",
        }
    }
}

/// A rendered reading and the mode it was rendered in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reading {
    pub mode: ReadingMode,
    pub text: String,
}

/// Converts one line of text into reading segments
pub trait ReadingConverter: Send + Sync {
    fn convert(&self, line: &str) -> Vec<ReadingSegment>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Script {
    Hiragana,
    Katakana,
    Kanji,
    Other,
}

fn script_of(ch: char) -> Script {
    match ch as u32 {
        0x3041..=0x309F => Script::Hiragana,
        0x30A0..=0x30FF | 0x31F0..=0x31FF | 0xFF66..=0xFF9F => Script::Katakana,
        0x3400..=0x4DBF | 0x4E00..=0x9FFF | 0xF900..=0xFAFF | 0x3005 => Script::Kanji,
        _ => Script::Other,
    }
}

/// Whether `next` extends a run whose last character is `last`.
///
/// Hiragana after kanji is okurigana and stays with its stem, so the
/// dictionary sees "話します" rather than "話" and "します".
fn continues_run(last: Script, next: Script) -> bool {
    last == next || (last == Script::Kanji && next == Script::Hiragana)
}

/// Dictionary-backed converter built on `kakasi`.
///
/// Lines are split into script runs with okurigana kept on their kanji stem.
/// Japanese runs get hiragana and Hepburn romaji readings, kanji included;
/// everything else passes through unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct KakasiConverter;

impl KakasiConverter {
    pub const fn new() -> Self {
        Self
    }

    fn segment(run: String) -> ReadingSegment {
        if run.chars().all(|ch| script_of(ch) == Script::Other) {
            return ReadingSegment {
                hiragana: run.clone(),
                romaji: run.clone(),
                original: run,
            };
        }

        let converted = kakasi::convert(&run);
        ReadingSegment {
            hiragana: converted.hiragana,
            romaji: converted.romaji,
            original: run,
        }
    }
}

impl ReadingConverter for KakasiConverter {
    fn convert(&self, line: &str) -> Vec<ReadingSegment> {
        let mut segments = Vec::new();
        // Script of the last character pushed, and the run so far
        let mut current: Option<(Script, String)> = None;

        for ch in line.chars() {
            let script = script_of(ch);
            if let Some((last, run)) = current.as_mut()
                && continues_run(*last, script)
            {
                run.push(ch);
                *last = script;
                continue;
            }
            if let Some((_, run)) = current.replace((script, ch.to_string())) {
                segments.push(Self::segment(run));
            }
        }
        if let Some((_, run)) = current {
            segments.push(Self::segment(run));
        }

        segments
    }
}

/// Render the reading of `text` line by line.
///
/// Romaji segments are joined with a space, hiragana segments are
/// concatenated. In hiragana mode a line where no segment was converted is
/// left out. Returns `None` when every line was left out.
pub fn render_reading(converter: &dyn ReadingConverter, text: &str, mode: ReadingMode) -> Option<String> {
    let mut lines = Vec::new();

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let segments = converter.convert(line);
        match mode {
            ReadingMode::Romaji => {
                let parts: Vec<&str> = segments
                    .iter()
                    .map(|s| s.romaji.trim())
                    .filter(|s| !s.is_empty())
                    .collect();
                lines.push(parts.join(" "));
            }
            ReadingMode::Hiragana => {
                if !segments.iter().any(ReadingSegment::is_converted) {
                    continue;
                }
                lines.push(segments.iter().map(|s| s.hiragana.as_str()).collect::<String>());
            }
        }
    }

    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}
